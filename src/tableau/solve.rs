//! The per-phase solve loop, the phase I → II transition, and the
//! interactive command hook that runs between pivots.

use num_traits::Zero;
use tracing::info;

use super::{PivotRule, Tableau};
use crate::error::SolverError;
use crate::frontend::Frontend;

/// Solver phase. Negative phases of the original formulation ("suspended at
/// the iteration cap") are the `Suspended*` variants; 3 is `Unbounded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    One,
    Two,
    Unbounded,
    SuspendedOne,
    SuspendedTwo,
}

impl Phase {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Phase::One | Phase::SuspendedOne => "I",
            Phase::Two | Phase::SuspendedTwo => "II",
            Phase::Unbounded => "?",
        }
    }

    pub(crate) fn suspended(self) -> Phase {
        match self {
            Phase::One => Phase::SuspendedOne,
            Phase::Two => Phase::SuspendedTwo,
            other => other,
        }
    }
}

/// Terminal state of a solve. `Suspended` means the iteration cap was hit;
/// treat it as terminal for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Optimal,
    Infeasible,
    Unbounded,
    Suspended,
}

pub(crate) enum Transfer {
    Infeasible,
    Started,
}

impl Tableau {
    /// Runs phase I (when artificials exist) and phase II to termination.
    /// `maxit` bounds the pivots per phase; -1 means unlimited.
    pub fn solve(&mut self, maxit: i64, ui: &mut dyn Frontend) -> Result<Outcome, SolverError> {
        self.init_base();
        self.show_help(ui);
        let mut optimal = self.phase_solve(maxit, ui);
        if optimal && self.phase == Phase::One {
            match self.transfer_to_phase_ii(ui)? {
                Transfer::Infeasible => return Ok(Outcome::Infeasible),
                Transfer::Started => optimal = self.phase_solve(maxit, ui),
            }
        }
        let outcome = if optimal {
            Outcome::Optimal
        } else if self.phase == Phase::Unbounded {
            Outcome::Unbounded
        } else {
            Outcome::Suspended
        };
        info!(?outcome, "solve finished");
        Ok(outcome)
    }

    /// One phase of the simplex. Returns true when the phase reached its
    /// optimum; otherwise the phase field tells why it stopped.
    pub(crate) fn phase_solve(&mut self, maxit: i64, ui: &mut dyn Frontend) -> bool {
        ui.say(&format!("Start Phase {}.", self.phase.label()));
        self.interact(0, ui);
        let mut left = maxit;
        while left != 0 {
            let (r, c) = self.choose_pivot(ui);
            if c == 0 {
                ui.say(&format!(
                    "Found optimal solution at iteration [{}]!",
                    self.hist.len()
                ));
                if !self.degenerated.is_empty() {
                    self.restore(ui);
                }
                self.hist.push((r, c));
                return true;
            }
            if r == 0 {
                ui.say("Infinite solution!");
                self.phase = Phase::Unbounded;
                self.hist.push((r, c));
                return false;
            }
            self.pivot(r, c);
            self.interact(r, ui);
            if left > 0 {
                left -= 1;
            }
        }
        ui.say("Hit max iteration!");
        self.phase = self.phase.suspended();
        false
    }

    /// Phase-I optimum reached: check feasibility, drive leftover
    /// artificials out of the basis, drop their columns and rebuild σ from
    /// the stored phase-II objective.
    pub(crate) fn transfer_to_phase_ii(
        &mut self,
        ui: &mut dyn Frontend,
    ) -> Result<Transfer, SolverError> {
        if !self.rows[0][0].is_zero() {
            ui.say("Not feasible to start Phase II!");
            return Ok(Transfer::Infeasible);
        }
        ui.say("\n***** Transition to phase II *****\n");

        for r in 1..=self.m {
            if !self.vars[self.base[r]].starts_with('@') {
                continue;
            }
            // The artificial sits at RHS zero, so pivoting on a negative
            // element is still sign-safe here.
            let mut entered = None;
            for c in 1..self.cols {
                if self.base.contains(&c)
                    || self.rows[r][c].is_zero()
                    || self.vars[c].starts_with('@')
                {
                    continue;
                }
                entered = Some(c);
                break;
            }
            match entered {
                Some(c) => self.pivot(r, c),
                None => {
                    ui.say(&self.render(r, None, false));
                    return Err(SolverError::StuckArtificial(
                        self.vars[self.base[r]].clone(),
                    ));
                }
            }
        }

        // Artificial columns are grouped last; dropping them is a matter of
        // shrinking the logical width. Their storage keeps carrying B⁻¹.
        let nvars = self.vars.len();
        let dropped = self.vars[nvars - self.m..]
            .iter()
            .filter(|v| v.starts_with('@'))
            .count();
        self.cols -= dropped;

        let mut sigma = self.fobj.clone();
        for r in 1..=self.m {
            let e = sigma[self.base[r]].clone();
            if e.is_zero() {
                continue;
            }
            for (c, cell) in sigma.iter_mut().enumerate() {
                *cell = &*cell - &(&e * &self.rows[r][c]);
            }
        }
        self.rows[0] = sigma;
        self.phase = Phase::Two;
        self.hist_i = std::mem::take(&mut self.hist);
        info!("transition to phase II");
        Ok(Transfer::Started)
    }

    /// Interactive hook run after every pivot: render the tableau, then
    /// apply the command string. `1`-`4` pick the entering rule, `t` and `w`
    /// toggle the degeneracy heuristics, `go` switches interaction off, and
    /// `undo`/`peek`/`shake` time-travel.
    pub(crate) fn interact(&mut self, pivot_row: usize, ui: &mut dyn Frontend) {
        if !self.interactive {
            return;
        }
        let mut mark = pivot_row;
        loop {
            ui.say(&self.render(mark, None, false));
            let s = ui.ask("1.sigma 2.index 3.objective 4.user: ").to_lowercase();
            if s.is_empty() {
                return;
            }
            if s.contains('t') {
                self.virtual_perturbation = !self.virtual_perturbation;
                ui.say(&format!("virtual perturbation: {}", self.virtual_perturbation));
            }
            if s.contains('w') {
                self.flat_wolf = !self.flat_wolf;
                if self.flat_wolf {
                    self.virtual_perturbation = false;
                }
                ui.say(&format!("flat wolf randomization: {}", self.flat_wolf));
            }
            let picked: Vec<char> = ['1', '2', '3', '4']
                .into_iter()
                .filter(|d| s.contains(*d))
                .collect();
            if picked.len() > 1 {
                ui.say("Can't choose multiple methods at one time.");
            } else if let Some(&d) = picked.first() {
                self.rule = match d {
                    '1' => PivotRule::LargestSigma,
                    '2' => PivotRule::SmallestIndex,
                    '3' => PivotRule::BestObjective,
                    _ => PivotRule::UserChoice,
                };
            }
            if s.contains("go") {
                self.interactive = false;
                ui.say("Turned off interaction.");
            }
            match s.as_str() {
                "undo" => {
                    let r = self.undo();
                    if r == 0 {
                        ui.say("Already at the first tableau.");
                    }
                    mark = r;
                }
                "peek" => mark = self.peek(ui),
                "shake" => mark = self.shake(ui),
                _ => return,
            }
        }
    }

    pub(crate) fn show_help(&self, ui: &mut dyn Frontend) {
        if !self.interactive {
            return;
        }
        ui.say(
            "\n===================|| Interaction Help ||===================\n\n\
             After each tableau, you are given the rule of operation.\n\
             Then you are given four options of pivot method:\n\
             \u{20}   1.sigma: choose entering column by largest sigma\n\
             \u{20}   2.index: choose entering column by smallest index\n\
             \u{20}   3.objective: choose entering column by best improvement\n\
             \u{20}   4.user: input your own entering column and row\n\n\
             If you just hit the 'return' key, nothing will change.\n\
             To choose a method, type the digit. To toggle the perturbation\n\
             status, type 't'. To enable wolf randomization, type 'w'.\n\
             If you just need the final result, type 'go'.\n\
             You may combine a number, a 't', a 'w', and a 'go' together.\n\
             Type 'undo' to undo, type 'peek' to peek at previous tableaux.\n",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Quiet;
    use crate::model::Model;
    use crate::Rational;
    use num_bigint::BigInt;

    fn rational(n: i64, d: i64) -> Rational {
        Rational::new(BigInt::from(n), BigInt::from(d))
    }

    fn solve_text(text: &str) -> (Tableau, Outcome) {
        let model = Model::parse(text).unwrap();
        let mut tab = Tableau::new(&model, false);
        let outcome = tab.solve(-1, &mut Quiet).unwrap();
        (tab, outcome)
    }

    #[test]
    fn all_le_model_solves_in_phase_two_only() {
        let (tab, outcome) =
            solve_text("max 6x + 4y\nst\n6x + 8y <= 12\n10x + 5y <= 10\nend");
        assert_eq!(outcome, Outcome::Optimal);
        assert_eq!(tab.phase, Phase::Two);
        assert!(tab.history_phase_i().is_empty());
        assert_eq!(tab.objective_value(), rational(36, 5));
    }

    #[test]
    fn ge_model_passes_through_phase_one() {
        let (tab, outcome) = solve_text("min x + y\nst\nx + y >= 2\nx <= 3\nend");
        assert_eq!(outcome, Outcome::Optimal);
        assert!(!tab.history_phase_i().is_empty());
        assert_eq!(tab.objective_value(), rational(2, 1));
    }

    #[test]
    fn infeasible_model_stops_after_phase_one() {
        let (tab, outcome) = solve_text("max x\nst\nx <= -1\nend");
        assert_eq!(outcome, Outcome::Infeasible);
        assert_eq!(tab.phase, Phase::One);
        // phase-I optimum keeps sigma_0 at the artificial's value
        assert_eq!(tab.rows[0][0], rational(1, 1));
    }

    #[test]
    fn unbounded_model_sets_phase_three() {
        let (tab, outcome) = solve_text("max x + y\nst\nx <= 1\nend");
        assert_eq!(outcome, Outcome::Unbounded);
        assert_eq!(tab.phase, Phase::Unbounded);
    }

    #[test]
    fn iteration_cap_suspends_the_phase() {
        let model =
            Model::parse("max 6x + 4y\nst\n6x + 8y <= 12\n10x + 5y <= 10\nend").unwrap();
        let mut tab = Tableau::new(&model, false);
        let outcome = tab.solve(1, &mut Quiet).unwrap();
        assert_eq!(outcome, Outcome::Suspended);
        assert_eq!(tab.phase, Phase::SuspendedTwo);
    }

    #[test]
    fn transition_drops_artificial_columns() {
        let (tab, outcome) = solve_text("min 2x + y\nst\nx + y = 3\nx <= 2\nend");
        assert_eq!(outcome, Outcome::Optimal);
        // one artificial column dropped from the logical width
        assert_eq!(tab.cols, tab.vars.len() - 1);
        assert!(tab.vars[tab.cols..].iter().all(|v| v.starts_with('@')));
        assert_eq!(tab.objective_value(), rational(3, 1));
    }

    #[test]
    fn equality_model_with_redundant_row_reports_stuck_artificial() {
        // Two copies of the same equality: one artificial can never leave.
        let model = Model::parse("max x\nst\nx + y = 2\nx + y = 2\nend").unwrap();
        let mut tab = Tableau::new(&model, false);
        let result = tab.solve(-1, &mut Quiet);
        match result {
            Err(SolverError::StuckArtificial(v)) => assert!(v.starts_with('@')),
            other => panic!("expected StuckArtificial, got {:?}", other),
        }
    }

    #[test]
    fn optimum_records_a_history_sentinel() {
        let (tab, _) = solve_text("max x\nst\nx <= 2\nend");
        assert_eq!(tab.history().last(), Some(&(0, 0)));
    }

    #[test]
    fn sigma_is_nonpositive_at_a_maximization_optimum() {
        let (tab, _) = solve_text("max 6x + 4y\nst\n6x + 8y <= 12\n10x + 5y <= 10\nend");
        for c in 1..tab.cols {
            assert!(tab.rows[0][c] <= rational(0, 1));
        }
    }
}
