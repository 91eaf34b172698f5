//! Entering-column rules, the leaving-row rule and the degeneracy policy.
//!
//! Column index 0 is the "optimal reached" sentinel: a rule returning 0
//! means no column has a positive reduced cost. Row index 0 from the
//! leaving-row rule signals an unbounded direction.

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use rand::Rng;
use tracing::debug;

use super::Tableau;
use crate::frontend::{check_ask, Frontend};
use crate::Rational;

/// How the entering column is chosen. Dispatched by `match` at the
/// selection site; `UserChoice` consults the interaction handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PivotRule {
    /// Largest positive σ, ties to the smaller column.
    #[default]
    LargestSigma,
    /// First positive σ (Bland's rule; cycle-safe together with the
    /// smallest-index row tie-break).
    SmallestIndex,
    /// Largest `minRatio(c) · σ[c]` improvement; an unbounded column wins
    /// immediately.
    BestObjective,
    /// Ask the user; an answer of 0 falls back to `SmallestIndex`.
    UserChoice,
}

impl PivotRule {
    pub fn label(self) -> &'static str {
        match self {
            PivotRule::LargestSigma => "largest_sigma",
            PivotRule::SmallestIndex => "smallest_index",
            PivotRule::BestObjective => "best_objective",
            PivotRule::UserChoice => "user_choice",
        }
    }
}

impl Tableau {
    /// Picks the pivot `(row, col)` under the current rule. `col == 0`
    /// means optimal, `row == 0` (with `col != 0`) means unbounded.
    pub(crate) fn choose_pivot(&mut self, ui: &mut dyn Frontend) -> (usize, usize) {
        let c = match self.rule {
            PivotRule::UserChoice => {
                if self.interactive {
                    return self.user_choice(ui);
                }
                self.entering_smallest_index()
            }
            PivotRule::LargestSigma => self.entering_largest_sigma(),
            PivotRule::SmallestIndex => self.entering_smallest_index(),
            PivotRule::BestObjective => self.entering_best_objective(),
        };
        let r = if c == 0 { 0 } else { self.pivot_row(c, ui) };
        (r, c)
    }

    fn entering_largest_sigma(&self) -> usize {
        let sigma = &self.rows[0];
        let mut best = Rational::zero();
        let mut idx = 0;
        for i in 1..self.cols {
            if sigma[i] > best {
                best = sigma[i].clone();
                idx = i;
            }
        }
        idx
    }

    fn entering_smallest_index(&self) -> usize {
        let sigma = &self.rows[0];
        (1..self.cols).find(|&i| sigma[i].is_positive()).unwrap_or(0)
    }

    fn entering_best_objective(&self) -> usize {
        let mut best = -Rational::one();
        let mut idx = 0;
        for i in 1..self.cols {
            if !self.rows[0][i].is_positive() {
                continue;
            }
            match self.improvement(i) {
                // No blocking row: the column is an unbounded direction.
                None => return i,
                Some(imp) => {
                    if imp > best {
                        best = imp;
                        idx = i;
                    }
                }
            }
        }
        idx
    }

    /// Objective gain of entering column `c`: `minRatio(c) · σ[c]`, or
    /// `None` when no row blocks the column.
    fn improvement(&self, c: usize) -> Option<Rational> {
        let mut min_ratio: Option<Rational> = None;
        for r in 1..=self.m {
            let a = &self.rows[r][c];
            if !a.is_positive() {
                continue;
            }
            let ratio = &self.rows[r][0] / a;
            if min_ratio.as_ref().is_none_or(|m| ratio < *m) {
                min_ratio = Some(ratio);
            }
        }
        min_ratio.map(|m| m * &self.rows[0][c])
    }

    fn user_choice(&mut self, ui: &mut dyn Frontend) -> (usize, usize) {
        let ub = self.cols - 1;
        let choices: Vec<String> = (0..=ub).map(|i| i.to_string()).collect();
        let answer = check_ask(ui, &format!("Which column? 1-{} [auto]:", ub), "0", &choices);
        let mut c: usize = answer.parse().expect("validated numeric choice");
        if c == 0 {
            c = self.entering_smallest_index();
            ui.say(&format!("Auto column: {}", c));
            if c == 0 {
                return (0, 0);
            }
        }
        let choices: Vec<String> = (0..=self.m).map(|i| i.to_string()).collect();
        let answer = check_ask(ui, &format!("Which row? 1-{} [auto]:", self.m), "0", &choices);
        let mut r: usize = answer.parse().expect("validated numeric choice");
        if r != 0 && self.rows[r][c].is_zero() {
            ui.say("Bad choice.");
            r = 0;
        }
        if r == 0 {
            r = self.pivot_row(c, ui);
            ui.say(&format!("Auto row: {}", r));
        }
        (r, c)
    }

    /// Minimum-ratio leaving row for entering column `col`, with the
    /// smallest-index tie-break. A degenerate tie (minimum ratio 0 shared by
    /// several rows) engages the selected heuristic instead. Returns 0 when
    /// no row blocks the column outside of perturbation.
    pub(crate) fn pivot_row(&mut self, col: usize, ui: &mut dyn Frontend) -> usize {
        let candidates: Vec<usize> = if self.degenerated.is_empty() {
            (1..=self.m).collect()
        } else {
            ui.say(&format!("degenerated rows: {:?}", self.degenerated));
            self.degenerated.clone()
        };

        let mut ratios: Vec<Rational> = Vec::new();
        for &i in &candidates {
            let l = &self.rows[i][col];
            if l.is_positive() {
                ratios.push(&self.rows[i][0] / l);
            }
        }
        if ratios.is_empty() {
            if self.degenerated.is_empty() {
                return 0; // infinite solution
            }
            // The perturbation revealed a way out of degeneracy.
            self.restore(ui);
            return self.pivot_row(col, ui);
        }

        let mrat = ratios.iter().min().cloned().expect("ratio set is non-empty");
        let nrat = ratios.iter().filter(|r| **r == mrat).count();
        let degenerate_tie = mrat.is_zero() && nrat > 1;

        if degenerate_tie && self.virtual_perturbation {
            // Lexicographic stand-in: among zero-RHS rows, the smallest
            // positive entry of the entering column.
            let mut lmin: Option<Rational> = None;
            let mut idx = 0;
            for &i in &candidates {
                let l = &self.rows[i][col];
                if self.rows[i][0].is_zero()
                    && l.is_positive()
                    && lmin.as_ref().is_none_or(|m| l < m)
                {
                    lmin = Some(l.clone());
                    idx = i;
                }
            }
            debug!(row = idx, "virtual perturbation tie-break");
            return idx;
        }

        if degenerate_tie && self.flat_wolf {
            if self.degenerated.is_empty() {
                self.vobj = self.rows[0][0].clone();
                self.degenerated = candidates
                    .iter()
                    .copied()
                    .filter(|&i| self.rows[i][0].is_zero())
                    .collect();
            }
            // Flat (non-recursive) wolf: give every degenerate row a small
            // random positive RHS and run the ratio test again.
            let perturbed = self.degenerated.clone();
            let mut rng = rand::thread_rng();
            for i in perturbed {
                if !self.rows[i][0].is_zero() {
                    continue;
                }
                let k: i64 = rng.gen_range(2..=10);
                self.rows[i][0] = Rational::new(BigInt::one(), BigInt::from(k));
                debug!(row = i, denom = k, "flat wolf perturbation");
            }
            return self.pivot_row(col, ui);
        }

        let mut smallest = self.vars.len() + 1;
        let mut ri: Option<usize> = None;
        for &i in &candidates {
            let l = &self.rows[i][col];
            if !l.is_positive() {
                continue;
            }
            // Exact tie check without recomputing the ratio.
            if self.rows[i][0] == &mrat * l && self.base[i] < smallest {
                smallest = self.base[i];
                ri = Some(i);
            }
        }
        ri.expect("a minimum-ratio row exists")
    }

    /// Leaves wolf perturbation: recompute every RHS as `B⁻¹·b` from the
    /// preserved original `b` via the columns that carry B⁻¹, restore the
    /// saved objective value and clear the degenerate set.
    pub(crate) fn restore(&mut self, ui: &mut dyn Frontend) {
        for i in 1..=self.m {
            let mut acc = Rational::zero();
            for (bj, &cj) in self.b.iter().zip(self.init_basis.iter()) {
                acc = acc + bj * &self.rows[i][cj];
            }
            self.rows[i][0] = acc;
        }
        self.rows[0][0] = self.vobj.clone();
        self.degenerated.clear();
        debug!("out of degeneracy, tableau restored");
        if !self.interactive {
            return;
        }
        ui.say("Out of degeneracy! Restored tableau:");
        ui.say(&self.render(0, None, false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Quiet;
    use crate::model::Model;
    use num_bigint::BigInt;

    fn rational(n: i64, d: i64) -> Rational {
        Rational::new(BigInt::from(n), BigInt::from(d))
    }

    fn two_var_tableau() -> Tableau {
        let model =
            Model::parse("max 6x + 4y\nst\n6x + 8y <= 12\n10x + 5y <= 10\nend").unwrap();
        Tableau::new(&model, false)
    }

    #[test]
    fn largest_sigma_prefers_the_biggest_reduced_cost() {
        let tab = two_var_tableau();
        assert_eq!(tab.entering_largest_sigma(), 1); // sigma = (6, 4, 0, 0)
    }

    #[test]
    fn smallest_index_takes_the_first_positive_column() {
        let mut tab = two_var_tableau();
        assert_eq!(tab.entering_smallest_index(), 1);
        tab.rows[0][1] = rational(-1, 1);
        assert_eq!(tab.entering_smallest_index(), 2);
    }

    #[test]
    fn rules_report_optimality_with_zero() {
        let mut tab = two_var_tableau();
        tab.rows[0][1] = rational(0, 1);
        tab.rows[0][2] = rational(-2, 1);
        assert_eq!(tab.entering_largest_sigma(), 0);
        assert_eq!(tab.entering_smallest_index(), 0);
        assert_eq!(tab.entering_best_objective(), 0);
    }

    #[test]
    fn best_objective_weighs_ratio_times_sigma() {
        // x improves by min(12/6, 10/10)*6 = 6; y by min(12/8, 10/5)*4 = 6.
        // Equal improvement keeps the first column.
        let tab = two_var_tableau();
        assert_eq!(tab.entering_best_objective(), 1);
    }

    #[test]
    fn best_objective_jumps_at_unbounded_columns() {
        let model = Model::parse("max x + 9y\nst\nx <= 1\nend").unwrap();
        let tab = Tableau::new(&model, false);
        // y has no positive entry anywhere: unbounded direction wins.
        assert_eq!(tab.entering_best_objective(), 2);
    }

    #[test]
    fn leaving_row_takes_the_minimum_ratio() {
        let mut tab = two_var_tableau();
        // ratios 12/6 = 2 vs 10/10 = 1
        assert_eq!(tab.pivot_row(1, &mut Quiet), 2);
    }

    #[test]
    fn leaving_row_returns_zero_when_unblocked() {
        let model = Model::parse("max x + y\nst\nx <= 1\nend").unwrap();
        let mut tab = Tableau::new(&model, false);
        assert_eq!(tab.pivot_row(2, &mut Quiet), 0);
    }

    #[test]
    fn degenerate_tie_resolves_by_smallest_basic_index() {
        let model =
            Model::parse("max x\nst\nx + y <= 0\nx + 2y <= 0\nend").unwrap();
        let mut tab = Tableau::new(&model, false);
        tab.flat_wolf = false;
        // both rows tie at ratio 0; $1 has the smaller column index
        assert_eq!(tab.pivot_row(1, &mut Quiet), 1);
    }

    #[test]
    fn virtual_perturbation_picks_the_smallest_positive_entry() {
        let model =
            Model::parse("max x\nst\n3x + y <= 0\n2x + 2y <= 0\nend").unwrap();
        let mut tab = Tableau::new(&model, false);
        tab.flat_wolf = false;
        tab.virtual_perturbation = true;
        // entries in column x are 3 and 2; the smaller one wins
        assert_eq!(tab.pivot_row(1, &mut Quiet), 2);
    }

    #[test]
    fn wolf_perturbs_then_restores_the_true_rhs() {
        let model =
            Model::parse("max x\nst\nx + y <= 0\nx + 2y <= 0\nend").unwrap();
        let mut tab = Tableau::new(&model, false);
        tab.flat_wolf = true;
        let r = tab.pivot_row(1, &mut Quiet);
        assert!(r == 1 || r == 2);
        assert_eq!(tab.degenerated, vec![1, 2]);
        for &i in &[1usize, 2] {
            assert!(tab.rows[i][0].is_positive());
            assert!(tab.rows[i][0] <= rational(1, 2));
        }
        tab.restore(&mut Quiet);
        assert!(tab.degenerated.is_empty());
        assert_eq!(tab.rows[1][0], rational(0, 1));
        assert_eq!(tab.rows[2][0], rational(0, 1));
    }
}
