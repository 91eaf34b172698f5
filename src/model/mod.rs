pub mod displays;
pub mod parser;

use crate::Rational;

pub use parser::{ModelParser, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    Min,
    Max,
}

impl Goal {
    /// Optimization direction: `+1` for maximization, `-1` for minimization.
    pub fn dir(self) -> i32 {
        match self {
            Goal::Max => 1,
            Goal::Min => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    LessEqual,
    GreaterEqual,
    Equal,
}

impl Relation {
    /// The relation after both sides of the row are negated.
    pub fn flipped(self) -> Self {
        match self {
            Relation::LessEqual => Relation::GreaterEqual,
            Relation::GreaterEqual => Relation::LessEqual,
            Relation::Equal => Relation::Equal,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Relation::LessEqual => "<=",
            Relation::GreaterEqual => ">=",
            Relation::Equal => "==",
        }
    }
}

/// A signed sum of `coefficient * variable` terms. Each variable appears at
/// most once; the parser rejects duplicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr(pub Vec<(String, Rational)>);

impl LinExpr {
    pub fn coeff(&self, var: &str) -> Option<&Rational> {
        self.0
            .iter()
            .find(|(name, _)| name == var)
            .map(|(_, c)| c)
    }

    pub fn vars(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }
}

/// One constraint row: terms, relation, right-hand constant and an optional
/// display name like `labor)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRow {
    pub terms: LinExpr,
    pub relation: Relation,
    pub rhs: Rational,
    pub name: String,
}

/// A normalized LP/IP after parsing: the objective, the constraint rows in
/// input order, and the free- and integer-variable declarations.
#[derive(Debug, Clone)]
pub struct Model {
    pub goal: Goal,
    pub objective: LinExpr,
    pub objective_name: String,
    pub constraints: Vec<ModelRow>,
    pub free_vars: Vec<String>,
    pub int_vars: Vec<String>,
}

impl Model {
    /// Parses the textual grammar (see the crate-level CLI help for the
    /// format). Case-insensitive; `#` starts a comment; `end` terminates.
    pub fn parse(text: &str) -> Result<Model, ParseError> {
        let mut parser = ModelParser::new();
        for line in text.lines() {
            if parser.feed(line)? {
                break;
            }
        }
        parser.finish()
    }

    /// Every variable appearing in the objective or any constraint, in order
    /// of first appearance. Not sorted; see [`Model::sort_vars`].
    pub fn var_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let rows = std::iter::once(&self.objective).chain(self.constraints.iter().map(|r| &r.terms));
        for terms in rows {
            for v in terms.vars() {
                if !names.iter().any(|n| n == v) {
                    names.push(v.to_string());
                }
            }
        }
        names
    }

    /// Deterministic column order: variables are compared by their
    /// index-stripped stem, then by their trailing numeric index (`X2`
    /// before `X10`), names without an index first. A shadow column `!V`
    /// shares the key of `V` and sorts directly after it.
    pub fn sort_vars(mut names: Vec<String>) -> Vec<String> {
        names.sort_by(|a, b| {
            let (stem_a, idx_a) = sort_key(a);
            let (stem_b, idx_b) = sort_key(b);
            stem_a
                .cmp(stem_b)
                .then(idx_a.cmp(&idx_b))
                .then(b.as_str().cmp(a.as_str()))
        });
        names
    }

    /// Appends one constraint parsed from a single line such as `X1 <= 3`.
    /// Used by the branch-and-bound driver to install node bounds.
    pub fn add_constraint_line(&mut self, line: &str) -> Result<(), ParseError> {
        let row = parser::parse_constraint(line)?;
        self.constraints.push(row);
        Ok(())
    }

    /// Drops every constraint after the first `keep` rows. Used by the
    /// branch-and-bound driver to remove the bounds of the previous node.
    pub fn truncate_constraints(&mut self, keep: usize) {
        self.constraints.truncate(keep);
    }

    pub fn is_integer_program(&self) -> bool {
        !self.int_vars.is_empty()
    }
}

/// Sort key of one variable name: the `!`-stripped stem without its trailing
/// digits, and the numeric value of those digits (`-1` when absent).
fn sort_key(name: &str) -> (&str, i64) {
    let stripped = name.strip_prefix('!').unwrap_or(name);
    let digits_at = stripped
        .rfind(|c: char| !c.is_ascii_digit())
        .map(|i| i + 1)
        .unwrap_or(0);
    if digits_at < stripped.len() {
        let idx = stripped[digits_at..]
            .trim_start_matches('0')
            .parse()
            .unwrap_or(0);
        (&stripped[..digits_at], idx)
    } else {
        (stripped, -1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn rational(n: i64) -> Rational {
        Rational::from_integer(BigInt::from(n))
    }

    #[test]
    fn sort_is_stem_then_index() {
        let names: Vec<String> = ["X10", "Y", "X2", "A1", "X"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let sorted = Model::sort_vars(names);
        assert_eq!(sorted, vec!["A1", "X", "X2", "X10", "Y"]);
    }

    #[test]
    fn shadow_sorts_directly_after_its_variable() {
        let names: Vec<String> = ["!Z1", "Z2", "Z1", "!Z2"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let sorted = Model::sort_vars(names);
        assert_eq!(sorted, vec!["Z1", "!Z1", "Z2", "!Z2"]);
    }

    #[test]
    fn leading_zeros_in_index_are_ignored() {
        let names: Vec<String> = ["X010", "X2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(Model::sort_vars(names), vec!["X2", "X010"]);
    }

    #[test]
    fn var_names_cover_all_rows() {
        let model = Model::parse("max x + y\nst\nx + z <= 4\nend").unwrap();
        let mut names = model.var_names();
        names.sort();
        assert_eq!(names, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn bound_rows_append_and_truncate() {
        let mut model = Model::parse("max x\nst\nx <= 9\nend").unwrap();
        assert_eq!(model.constraints.len(), 1);
        model.add_constraint_line("X <= 3").unwrap();
        assert_eq!(model.constraints.len(), 2);
        assert_eq!(model.constraints[1].relation, Relation::LessEqual);
        assert_eq!(model.constraints[1].rhs, rational(3));
        model.truncate_constraints(1);
        assert_eq!(model.constraints.len(), 1);
    }
}
