//! Educational linear- and integer-programming solver built around the
//! two-phase simplex method over exact rational arithmetic.
//!
//! The crate walks a model from text to optimum: [`model::Model`] holds the
//! parsed program, [`tableau::Tableau`] runs the two-phase simplex with
//! selectable pivot rules and degeneracy heuristics, [`report`] derives the
//! solution and sensitivity tables, [`bnb::BnbSolver`] drives branch and
//! bound for integer models, and [`replay`] dumps a finished solve in a
//! spreadsheet-recomputable formula form.
//!
//! Every tableau cell is a [`Rational`], so pivoting is exact: degenerate
//! and cycling examples behave the way the textbook says they do instead of
//! drowning in floating-point noise.

pub mod bnb;
pub mod error;
pub mod frontend;
pub mod model;
pub mod replay;
pub mod report;
pub mod tableau;

/// Exact rational scalar used for every coefficient, RHS and tableau cell.
///
/// Unbounded numerator and denominator: pivoting can never overflow.
pub type Rational = num_rational::BigRational;

pub use error::SolverError;
pub use frontend::{Frontend, LineSink, Quiet};
pub use model::{Goal, Model, Relation};
pub use tableau::{Outcome, Phase, PivotRule, Tableau};
