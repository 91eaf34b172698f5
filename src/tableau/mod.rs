//! The two-phase simplex engine.
//!
//! A [`Tableau`] is built once per LP instance from a [`Model`], mutated only
//! by pivoting (and the explicit perturbation-restore path), and discarded
//! after reporting. Row 0 is the reduced-cost row σ; rows 1..=m are the
//! constraints; column 0 is the right-hand side.

pub mod display;
pub mod history;
pub mod rules;
pub mod sensitivity;
pub mod solve;

use std::collections::HashMap;

use num_traits::{One, Signed, Zero};
use tracing::debug;

use crate::model::{Goal, Model, Relation};
use crate::Rational;

pub use rules::PivotRule;
pub use sensitivity::{Bound, Sensitivity};
pub use solve::{Outcome, Phase};

#[derive(Debug, Clone)]
pub struct Tableau {
    /// Canonical text of the model, kept for the replay header.
    pub(crate) text: String,
    /// Column labels; position 0 is the `(RHS)` sentinel, then structural
    /// columns, surplus `#i`, slack `$i` and artificial `@i` columns.
    pub(crate) vars: Vec<String>,
    /// Display names per model row; index 0 is the objective's name.
    pub(crate) row_names: Vec<String>,
    /// Row 0 is σ, rows 1..=m the constraints. Rows keep their full width
    /// even after artificial columns are logically dropped.
    pub(crate) rows: Vec<Vec<Rational>>,
    /// Basic column per row; `base[0] = 0` stands for the σ row itself.
    pub(crate) base: Vec<usize>,
    /// Column of row i's starting basic variable (its slack or artificial).
    /// These columns carry B⁻¹ for the lifetime of the tableau.
    pub(crate) init_basis: Vec<usize>,
    /// Canonicalized phase-II objective over the full column layout.
    pub(crate) fobj: Vec<Rational>,
    /// Constraint rows as canonicalized, for re-solving and replay.
    pub(crate) origrows: Vec<Vec<Rational>>,
    /// Original RHS after sign normalization.
    pub(crate) b: Vec<Rational>,
    pub(crate) goal: Goal,
    pub phase: Phase,
    pub(crate) m: usize,
    /// Logical column count including the RHS slot; shrinks when artificial
    /// columns are dropped at the phase transition.
    pub(crate) cols: usize,
    /// (leaving column, entering column) pairs of the current phase.
    pub(crate) hist: Vec<(usize, usize)>,
    /// Frozen phase-I history after the transition.
    pub(crate) hist_i: Vec<(usize, usize)>,
    /// Rows carrying a perturbed RHS while flat wolf is active.
    pub(crate) degenerated: Vec<usize>,
    /// True objective value saved while the RHS is perturbed.
    pub(crate) vobj: Rational,
    pub rule: PivotRule,
    pub virtual_perturbation: bool,
    pub flat_wolf: bool,
    pub interactive: bool,
}

impl Tableau {
    /// Canonicalizes a model into the initial tableau: maximization form,
    /// non-negative RHS, shadow columns for free variables, and one slack or
    /// artificial basis column per row.
    pub fn new(prob: &Model, interactive: bool) -> Tableau {
        let text = prob.to_string();

        let mut obj: HashMap<String, Rational> = prob
            .objective
            .0
            .iter()
            .map(|(v, c)| (v.clone(), c.clone()))
            .collect();
        if prob.goal == Goal::Min {
            for c in obj.values_mut() {
                *c = -c.clone();
            }
        }

        let mut cons: Vec<(HashMap<String, Rational>, Relation, Rational)> = prob
            .constraints
            .iter()
            .map(|row| {
                let mut t: HashMap<String, Rational> = row
                    .terms
                    .0
                    .iter()
                    .map(|(v, c)| (v.clone(), c.clone()))
                    .collect();
                let mut rel = row.relation;
                let mut rhs = row.rhs.clone();
                if rhs.is_negative() {
                    for c in t.values_mut() {
                        *c = -c.clone();
                    }
                    rel = rel.flipped();
                    rhs = -rhs;
                }
                (t, rel, rhs)
            })
            .collect();

        // A free variable v is split as x(v) - x(!v), both non-negative.
        for v in &prob.free_vars {
            let shadow = format!("!{}", v);
            if let Some(c) = obj.get(v).cloned() {
                obj.insert(shadow.clone(), -c);
            }
            for (t, _, _) in cons.iter_mut() {
                if let Some(c) = t.get(v).cloned() {
                    t.insert(shadow.clone(), -c);
                }
            }
        }

        let mut names: Vec<String> = Vec::new();
        for v in obj.keys().chain(cons.iter().flat_map(|(t, _, _)| t.keys())) {
            if !names.iter().any(|n| n == v) {
                names.push(v.clone());
            }
        }
        let mut vars = Model::sort_vars(names);
        vars.insert(0, "(RHS)".to_string());

        // Synthetic columns, grouped surplus / slack / artificial; row
        // numbering is 1-based to match tableau rows.
        let mut row_basis: Vec<String> = vec![String::new(); cons.len()];
        for (idx, (t, rel, _)) in cons.iter_mut().enumerate() {
            if *rel == Relation::GreaterEqual {
                let v = format!("#{}", idx + 1);
                t.insert(v.clone(), -Rational::one());
                vars.push(v);
            }
        }
        for (idx, (t, rel, _)) in cons.iter_mut().enumerate() {
            if *rel == Relation::LessEqual {
                let v = format!("${}", idx + 1);
                t.insert(v.clone(), Rational::one());
                vars.push(v.clone());
                row_basis[idx] = v;
            }
        }
        for (idx, (t, rel, _)) in cons.iter_mut().enumerate() {
            if *rel != Relation::LessEqual {
                let v = format!("@{}", idx + 1);
                t.insert(v.clone(), Rational::one());
                vars.push(v.clone());
                row_basis[idx] = v;
            }
        }

        let fobj: Vec<Rational> = vars
            .iter()
            .map(|v| obj.get(v).cloned().unwrap_or_else(Rational::zero))
            .collect();
        let origrows: Vec<Vec<Rational>> = cons
            .iter()
            .map(|(t, _, rhs)| {
                let mut row: Vec<Rational> = vars
                    .iter()
                    .map(|v| t.get(v).cloned().unwrap_or_else(Rational::zero))
                    .collect();
                row[0] = rhs.clone();
                row
            })
            .collect();
        let init_basis: Vec<usize> = row_basis
            .iter()
            .map(|name| {
                vars.iter()
                    .position(|v| v == name)
                    .expect("synthetic basis column exists")
            })
            .collect();
        let row_names: Vec<String> = std::iter::once(prob.objective_name.clone())
            .chain(prob.constraints.iter().map(|r| r.name.clone()))
            .collect();

        let m = cons.len();
        let mut tab = Tableau {
            text,
            vars,
            row_names,
            rows: Vec::new(),
            base: Vec::new(),
            init_basis,
            fobj,
            origrows,
            b: Vec::new(),
            goal: prob.goal,
            phase: Phase::Two,
            m,
            cols: 0,
            hist: Vec::new(),
            hist_i: Vec::new(),
            degenerated: Vec::new(),
            vobj: Rational::zero(),
            rule: PivotRule::LargestSigma,
            virtual_perturbation: false,
            // Wolf randomization is the default escape hatch when nobody is
            // watching; interactive users toggle it themselves.
            flat_wolf: !interactive,
            interactive,
        };
        tab.init_base();
        tab
    }

    /// Resets rows, basis and σ to the freshly canonicalized state and
    /// detects the starting phase. History is left untouched so a finished
    /// solve can be replayed.
    pub(crate) fn init_base(&mut self) {
        let nvars = self.vars.len();
        self.m = self.origrows.len();
        self.rows = Vec::with_capacity(self.m + 1);
        self.rows.push(vec![Rational::zero(); nvars]);
        self.rows.extend(self.origrows.iter().cloned());
        self.b = self.origrows.iter().map(|r| r[0].clone()).collect();
        self.base = std::iter::once(0)
            .chain(self.init_basis.iter().copied())
            .collect();
        self.cols = nvars;

        if !self.vars.iter().any(|v| v.starts_with('@')) {
            self.rows[0] = self.fobj.clone();
            self.phase = Phase::Two;
            return;
        }

        // Phase I: σ expresses "maximize the negated sum of artificials",
        // reduced by the rows whose starting basis is an artificial.
        self.phase = Phase::One;
        let mut sigma: Vec<Rational> = self
            .vars
            .iter()
            .map(|v| {
                if v.starts_with('@') {
                    -Rational::one()
                } else {
                    Rational::zero()
                }
            })
            .collect();
        for r in 1..=self.m {
            if !self.vars[self.base[r]].starts_with('@') {
                continue;
            }
            for c in 0..nvars {
                sigma[c] = &sigma[c] + &self.rows[r][c];
            }
        }
        self.rows[0] = sigma;
    }

    /// Pivots on `(row, col)` and records the (leaving, entering) pair.
    pub fn pivot(&mut self, row: usize, col: usize) {
        self.apply_pivot(row, col, true);
    }

    /// Pivot with optional history recording; undo, peek and shake replay
    /// pivots with recording suppressed.
    pub(crate) fn apply_pivot(&mut self, row: usize, col: usize, record: bool) {
        let e = self.rows[row][col].clone();
        debug_assert!(!e.is_zero(), "pivot element must be nonzero");
        for cell in self.rows[row].iter_mut() {
            *cell = &*cell / &e;
        }
        let prow = self.rows[row].clone();
        for (r, other) in self.rows.iter_mut().enumerate() {
            if r == row {
                continue;
            }
            let f = other[col].clone();
            if f.is_zero() {
                continue;
            }
            for (d, s) in other.iter_mut().zip(prow.iter()) {
                *d = &*d - &(&f * s);
            }
        }
        if record {
            self.hist.push((self.base[row], col));
        }
        debug!(row, col, "pivot");
        // The history entry wants the old basic column, so this goes last.
        self.base[row] = col;
    }

    /// Reverts the most recent recorded pivot. Returns the affected row, or
    /// 0 when there is nothing to undo (terminal history entries record a
    /// phase end, not a pivot).
    pub fn undo(&mut self) -> usize {
        match self.hist.last() {
            None => return 0,
            Some(&(vout, vin)) if vout == 0 || vin == 0 => return 0,
            Some(_) => {}
        }
        let Some((vout, vin)) = self.hist.pop() else {
            return 0;
        };
        let r = self
            .base
            .iter()
            .position(|&b| b == vin)
            .expect("history names a basic column");
        self.apply_pivot(r, vout, false);
        r
    }

    /// Objective value in the user's orientation.
    pub fn objective_value(&self) -> Rational {
        let v = -self.rows[0][0].clone();
        if self.goal == Goal::Min {
            -v
        } else {
            v
        }
    }

    fn basic_value(&self, col: usize) -> Rational {
        self.base
            .iter()
            .position(|&b| b == col)
            .map(|r| self.rows[r][0].clone())
            .unwrap_or_else(Rational::zero)
    }

    /// The solution as `(name, value)` pairs, led by `("(Obj)", value)`.
    /// A free variable's value is `x(v) - x(!v)` over its column pair.
    pub fn solution(&self) -> Vec<(String, Rational)> {
        let mut out = vec![("(Obj)".to_string(), self.objective_value())];
        for (i, v) in self.vars.iter().enumerate().skip(1) {
            if v.starts_with(['#', '@', '$', '!']) {
                continue;
            }
            let mut val = self.basic_value(i);
            if self
                .vars
                .get(i + 1)
                .is_some_and(|next| next.strip_prefix('!') == Some(v.as_str()))
            {
                val = val - self.basic_value(i + 1);
            }
            out.push((v.clone(), val));
        }
        out
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn vars(&self) -> &[String] {
        &self.vars
    }

    pub fn basis(&self) -> &[usize] {
        &self.base
    }

    pub fn row(&self, r: usize) -> &[Rational] {
        &self.rows[r]
    }

    /// Logical column count, including the RHS slot at index 0.
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn num_constraints(&self) -> usize {
        self.m
    }

    pub fn history(&self) -> &[(usize, usize)] {
        &self.hist
    }

    /// Display names per model row; index 0 is the objective's.
    pub fn row_names(&self) -> &[String] {
        &self.row_names
    }

    /// The RHS vector as canonicalized (after sign normalization).
    pub fn original_rhs(&self) -> &[Rational] {
        &self.b
    }

    pub fn history_phase_i(&self) -> &[(usize, usize)] {
        &self.hist_i
    }
}
