use std::fmt;

use num_traits::{One, Signed};

use super::{Goal, LinExpr, Model};
use crate::Rational;

/// Formats a linear expression in sorted-variable order with unit
/// coefficients elided, e.g. ` 6 X +4 Y - Z`.
fn format_terms(terms: &LinExpr) -> String {
    let names = Model::sort_vars(terms.vars().map(str::to_string).collect());
    let mut out = String::new();
    for (i, v) in names.iter().enumerate() {
        let c = terms.coeff(v).expect("sorted name came from these terms");
        let cstr = if *c == Rational::one() {
            String::new()
        } else if *c == -Rational::one() {
            "-".to_string()
        } else {
            c.to_string()
        };
        if i == 0 || c.is_negative() {
            out.push_str(&format!(" {} {}", cstr, v));
        } else {
            out.push_str(&format!(" +{} {}", cstr, v));
        }
    }
    out
}

/// Canonical text form of the model. Coefficients are printed as exact
/// rationals, so the output parses back to the same model.
impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let goal = match self.goal {
            Goal::Max => "Max",
            Goal::Min => "Min",
        };
        writeln!(
            f,
            "{}{}{}",
            self.objective_name,
            goal,
            format_terms(&self.objective)
        )?;
        writeln!(f, "Subject To")?;
        for row in &self.constraints {
            writeln!(
                f,
                "{}{} {} {}",
                row.name,
                format_terms(&row.terms),
                row.relation.symbol(),
                row.rhs
            )?;
        }
        if !self.free_vars.is_empty() {
            writeln!(f, "free: {}", self.free_vars.join(", "))?;
        }
        if !self.int_vars.is_empty() {
            writeln!(f, "int: {}", self.int_vars.join(", "))?;
        }
        write!(f, "End")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_through_the_parser() {
        let model = Model::parse(
            "max 6x + 4y - z\n\
             st\n\
             labor) 6x + 8y <= 12\n\
             10x + 5y >= 10\n\
             x - y = 0\n\
             free: z\n\
             end",
        )
        .unwrap();
        let text = model.to_string();
        let again = Model::parse(&text).unwrap();
        assert_eq!(again.constraints.len(), model.constraints.len());
        for (a, b) in again.constraints.iter().zip(model.constraints.iter()) {
            assert_eq!(a.relation, b.relation);
            assert_eq!(a.rhs, b.rhs);
        }
        assert_eq!(again.free_vars, model.free_vars);
        assert_eq!(again.objective.coeff("X"), model.objective.coeff("X"));
    }

    #[test]
    fn unit_coefficients_are_elided() {
        let model = Model::parse("max x - y\nst\nx <= 1\nend").unwrap();
        let text = model.to_string();
        let first = text.lines().next().unwrap();
        assert_eq!(first, "Max  X - Y");
    }
}
