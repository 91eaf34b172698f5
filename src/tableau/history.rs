//! Time travel over the pivot history: interactive peeking, the shake
//! diagnostic, and the suppressed-pivot replay that rebuilds a finished
//! solve for the formula dump.

use num_bigint::BigInt;
use rand::Rng;
use tracing::debug;

use super::solve::{Phase, Transfer};
use super::Tableau;
use crate::error::SolverError;
use crate::frontend::Frontend;
use crate::{report, Rational};

impl Tableau {
    fn basic_row_of(&self, col: usize) -> usize {
        self.base
            .iter()
            .position(|&b| b == col)
            .expect("history names a basic column")
    }

    /// Index of the last entry that records an actual pivot. Terminal
    /// entries (entering column 0 for an optimum, row 0 for unboundedness)
    /// mark phase ends and must not be replayed as pivots.
    fn last_real_pivot(&self) -> isize {
        self.hist
            .iter()
            .take_while(|(vout, vin)| *vout != 0 && *vin != 0)
            .count() as isize
            - 1
    }

    /// Walks backward and forward through the recorded pivots without
    /// touching the history, so the user can inspect earlier tableaux.
    /// Aborting fast-forwards back to the newest state.
    pub(crate) fn peek(&mut self, ui: &mut dyn Frontend) -> usize {
        let last = self.last_real_pivot();
        let mut current = last;
        loop {
            let s = ui.ask("Peek menu: 1.prev 2.next 3.abort: ");
            let s = if s.is_empty() { "3".to_string() } else { s };
            if s.contains('1') {
                if current < 0 {
                    ui.say("Already at beginning.");
                    continue;
                }
                let (vout, vin) = self.hist[current as usize];
                let r = self.basic_row_of(vin);
                self.apply_pivot(r, vout, false);
                ui.say(&self.render(r, Some(current as usize), false));
                current -= 1;
            } else if s.contains('2') {
                if current >= last {
                    ui.say("Already at last, choose 3 to abort.");
                    continue;
                }
                current += 1;
                let (vout, vin) = self.hist[current as usize];
                let r = self.basic_row_of(vout);
                self.apply_pivot(r, vin, false);
                ui.say(&self.render(r, Some(current as usize + 1), false));
            } else if s.contains('3') {
                let mut mark = 0;
                while current < last {
                    current += 1;
                    let (vout, vin) = self.hist[current as usize];
                    let r = self.basic_row_of(vout);
                    self.apply_pivot(r, vin, false);
                    mark = r;
                }
                return mark;
            } else {
                ui.say("Bad choice!");
            }
        }
    }

    /// Educational diagnostic: bump every constraint RHS by a small random
    /// integer, replay the pivot chain backwards watching for a negative
    /// RHS, then replay forward and put the true RHS back.
    pub(crate) fn shake(&mut self, ui: &mut dyn Frontend) -> usize {
        let saved: Vec<Rational> = (0..=self.m).map(|r| self.rows[r][0].clone()).collect();
        let mut rng = rand::thread_rng();
        for r in 1..=self.m {
            let bump: i64 = rng.gen_range(1..=20);
            self.rows[r][0] = &self.rows[r][0] + Rational::from_integer(BigInt::from(bump));
        }
        debug!("shake: rhs perturbed, replaying history backwards");

        let last = self.last_real_pivot();
        let mut current = last;
        let mut infeasible = false;
        let mut mark = 0;
        while current >= 0 {
            let (vout, vin) = self.hist[current as usize];
            let r = self.basic_row_of(vin);
            self.apply_pivot(r, vout, false);
            mark = r;
            current -= 1;
            if (1..=self.m).any(|t| self.rows[t][0] < Rational::from_integer(BigInt::from(0))) {
                ui.say("SHAKER found infeasibility!");
                ui.say(&self.render(r, Some((current + 1) as usize), false));
                infeasible = true;
                break;
            }
        }
        while current < last {
            current += 1;
            let (vout, vin) = self.hist[current as usize];
            let r = self.basic_row_of(vout);
            self.apply_pivot(r, vin, false);
            mark = r;
        }
        if infeasible {
            let rhs: Vec<String> = (0..=self.m).map(|r| self.rows[r][0].to_string()).collect();
            ui.say(&format!("[{}]", rhs.join(", ")));
        }
        for r in 1..=self.m {
            self.rows[r][0] = saved[r].clone();
        }
        mark
    }

    /// Re-applies a frozen pivot sequence against the current state,
    /// rendering every tableau in formula mode. The sequence's sentinel
    /// entries reproduce the original optimum/unbounded endings.
    pub(crate) fn phase_follow(&mut self, hist: &[(usize, usize)], ui: &mut dyn Frontend) -> bool {
        ui.say(&format!("Start Phase {}.", self.phase.label()));
        ui.say(&self.render(0, Some(0), true));
        for (itn, &(vout, c)) in hist.iter().enumerate() {
            let r = self.basic_row_of(vout);
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
            ui.say(&self.render(r, Some(itn + 1), true));
        }
        self.phase = self.phase.suspended();
        false
    }

    /// Replays the whole finished solve from a fresh canonical tableau —
    /// phase I history, transition, phase II history — in formula mode,
    /// then emits the four report tables. Leaves the tableau in exactly the
    /// state the solve ended in.
    pub fn auto_replay(&mut self, ui: &mut dyn Frontend) -> Result<(), SolverError> {
        self.init_base();
        let first = if self.hist_i.is_empty() {
            self.hist.clone()
        } else {
            self.hist_i.clone()
        };
        let saved = std::mem::take(&mut self.hist);

        let mut optimal = self.phase_follow(&first, ui);
        if optimal && self.phase == Phase::One {
            match self.transfer_to_phase_ii(ui)? {
                Transfer::Infeasible => optimal = false,
                Transfer::Started => optimal = self.phase_follow(&saved, ui),
            }
        }
        debug_assert_eq!(self.hist, saved, "replayed history diverged");

        if !optimal || self.phase != Phase::Two {
            return Ok(());
        }
        let sens = self.sensitivity();
        report::print_solution(self, ui, true);
        report::print_constraints(self, &sens, ui, true);
        report::print_coef_ranges(self, ui, true);
        report::print_rhs_ranges(self, &sens, ui, true);
        Ok(())
    }
}
