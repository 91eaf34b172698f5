//! Post-optimal sensitivity analysis.
//!
//! The columns that started as the basis (one slack or artificial per row)
//! carry B⁻¹ for the lifetime of the tableau, so shadow prices and ranges
//! come straight out of the final rows without refactorizing anything.

use std::fmt;

use num_traits::{Signed, Zero};

use super::Tableau;
use crate::model::Goal;
use crate::Rational;

/// One end of a sensitivity range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound {
    Finite(Rational),
    PosInf,
    NegInf,
}

impl Bound {
    pub fn negated(self) -> Bound {
        match self {
            Bound::Finite(v) => Bound::Finite(-v),
            Bound::PosInf => Bound::NegInf,
            Bound::NegInf => Bound::PosInf,
        }
    }

    /// Cell text for the report tables. The replay file references cell B1,
    /// which its header line resolves to the text `Infty`.
    pub(crate) fn cell(&self, formula: bool) -> String {
        match self {
            Bound::Finite(v) => {
                if formula {
                    format!("={}", v)
                } else {
                    v.to_string()
                }
            }
            Bound::PosInf | Bound::NegInf => {
                if formula {
                    "=B1".to_string()
                } else {
                    "Infty".to_string()
                }
            }
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Finite(v) => write!(f, "{}", v),
            Bound::PosInf | Bound::NegInf => write!(f, "Infty"),
        }
    }
}

/// Shadow prices and RHS ranges at a phase-II optimum.
#[derive(Debug, Clone)]
pub struct Sensitivity {
    /// Per-constraint rate of optimal-objective change per unit of RHS.
    pub shadow: Vec<Rational>,
    pub rhs_lower: Vec<Bound>,
    pub rhs_upper: Vec<Bound>,
}

impl Tableau {
    /// B⁻¹ entry at row `j`, column `i` (both zero-based over constraints).
    fn binv(&self, j: usize, i: usize) -> &Rational {
        &self.rows[j + 1][self.init_basis[i]]
    }

    /// Shadow prices and RHS ranges. Call at a phase-II optimum.
    pub fn sensitivity(&self) -> Sensitivity {
        let m = self.m;
        let cb: Vec<&Rational> = self.base[1..].iter().map(|&b| &self.fobj[b]).collect();

        let shadow: Vec<Rational> = (0..m)
            .map(|i| {
                let mut acc = Rational::zero();
                for (j, c) in cb.iter().enumerate() {
                    acc = acc + *c * self.binv(j, i);
                }
                if self.goal == Goal::Min {
                    -acc
                } else {
                    acc
                }
            })
            .collect();

        // How far b_i can move before some basic value sig_j goes negative:
        // sig_j + inc * binv(j, i) >= 0 for every j.
        let sig: Vec<&Rational> = (1..=m).map(|r| &self.rows[r][0]).collect();
        let mut rhs_lower = Vec::with_capacity(m);
        let mut rhs_upper = Vec::with_capacity(m);
        for i in 0..m {
            let dec: Vec<Rational> = (0..m)
                .filter(|&j| self.binv(j, i).is_negative())
                .map(|j| sig[j] / self.binv(j, i))
                .collect();
            rhs_upper.push(match dec.iter().max() {
                Some(v) => Bound::Finite(&self.b[i] - v),
                None => Bound::PosInf,
            });
            let inc: Vec<Rational> = (0..m)
                .filter(|&j| self.binv(j, i).is_positive())
                .map(|j| sig[j] / self.binv(j, i))
                .collect();
            rhs_lower.push(match inc.iter().min() {
                Some(v) => Bound::Finite(&self.b[i] - v),
                None => Bound::NegInf,
            });
        }

        Sensitivity {
            shadow,
            rhs_lower,
            rhs_upper,
        }
    }

    /// Range the objective coefficient of column `i` can move over while
    /// the current basis stays optimal: `(lower, coefficient, upper)` in
    /// the user's orientation.
    pub fn coef_range(&self, i: usize) -> (Bound, Rational, Bound) {
        let a = self.fobj[i].clone();
        let (lower, upper) = match self.base.iter().position(|&b| b == i) {
            Some(r) => {
                let sig = &self.rows[0];
                let row = &self.rows[r];
                // sig[c] - row[c] * inc <= 0 bounds the increase ...
                let ubs: Vec<Rational> = (1..self.cols)
                    .filter(|&c| row[c].is_negative())
                    .map(|c| &sig[c] / &row[c])
                    .collect();
                let upper = match ubs.iter().min() {
                    Some(v) => Bound::Finite(&a + v),
                    None => Bound::PosInf,
                };
                // ... and sig[c] + row[c] * dec <= 0 the decrease.
                let lbs: Vec<Rational> = (1..self.cols)
                    .filter(|&c| c != i && row[c].is_positive())
                    .map(|c| &sig[c] / &row[c])
                    .collect();
                let lower = match lbs.iter().max() {
                    Some(v) => Bound::Finite(&a + v),
                    None => Bound::NegInf,
                };
                (lower, upper)
            }
            None => (Bound::NegInf, Bound::Finite(&a - &self.rows[0][i])),
        };
        if self.goal == Goal::Min {
            (upper.negated(), -a, lower.negated())
        } else {
            (lower, a, upper)
        }
    }
}
