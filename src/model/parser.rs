//! Line-based parser for the textual model grammar.
//!
//! The grammar is case-insensitive. `#` starts a comment that runs to the
//! end of the line and `##` comments out a whole line. The first meaningful
//! line is the objective (`max`/`min` plus a linear expression), then a
//! `st`-style separator, then constraints and `free:`/`int:`/`bin:`
//! declarations, then `end`. A constraint may carry a name ending in `)`.

use num_bigint::BigInt;
use num_traits::One;
use thiserror::Error;
use tracing::warn;

use super::{Goal, LinExpr, Model, ModelRow, Relation};
use crate::Rational;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("objective must start with MAX or MIN")]
    MissingObjective,
    #[error("expected 'ST', 'S.T.', 'SUBJECT TO', or 'SUCH THAT'")]
    ExpectedSubjectTo,
    #[error("illegal number: {0}")]
    BadNumber(String),
    #[error("illegal variable name: {0}")]
    BadVariable(String),
    #[error("repeated variable {0} in one expression")]
    DuplicateVariable(String),
    #[error("variable {0} declared both FREE and INT")]
    FreeIntConflict(String),
    #[error("variable {0} is already integral")]
    AlreadyInteger(String),
    #[error("a constraint must have exactly one comparison")]
    BadComparison,
    #[error("term '{0}' has no variable")]
    MissingVariable(String),
    #[error("expression ends with a dangling sign")]
    TrailingSign,
    #[error("there are no terms")]
    EmptyExpression,
}

/// Incremental parser; feed one line at a time until `feed` returns `true`
/// (the `END` line), then call [`ModelParser::finish`].
#[derive(Default)]
pub struct ModelParser {
    objective: Option<(Goal, LinExpr, String)>,
    constraints: Vec<ModelRow>,
    free_vars: Vec<String>,
    int_vars: Vec<String>,
    seen_st: bool,
    done: bool,
}

impl ModelParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one line. Returns `true` once the `END` line is seen.
    pub fn feed(&mut self, line: &str) -> Result<bool, ParseError> {
        if self.done {
            return Ok(true);
        }
        let (name, body) = preprocess(line);
        if body.is_empty() {
            return Ok(false);
        }

        if self.objective.is_none() {
            let goal = if body.starts_with("MAX ") {
                Goal::Max
            } else if body.starts_with("MIN ") {
                Goal::Min
            } else {
                return Err(ParseError::MissingObjective);
            };
            let terms = parse_terms(&body[4..])?;
            self.objective = Some((goal, terms, name));
        } else if !self.seen_st {
            let squeezed = body.split_whitespace().collect::<Vec<_>>().join(" ");
            match squeezed.as_str() {
                "ST" | "S.T." | "SUBJECT TO" | "SUCH THAT" => self.seen_st = true,
                _ => return Err(ParseError::ExpectedSubjectTo),
            }
        } else if body == "END" {
            self.done = true;
            return Ok(true);
        } else if let Some(rest) = body.strip_prefix("FREE:") {
            for raw in rest.split(',') {
                let v = raw.trim();
                check_var(v)?;
                if self.int_vars.iter().any(|n| n == v) {
                    return Err(ParseError::FreeIntConflict(v.to_string()));
                }
                if !self.free_vars.iter().any(|n| n == v) {
                    self.free_vars.push(v.to_string());
                }
            }
        } else if let Some(rest) = body.strip_prefix("INT:") {
            for raw in rest.split(',') {
                let v = raw.trim();
                check_var(v)?;
                if self.free_vars.iter().any(|n| n == v) {
                    return Err(ParseError::FreeIntConflict(v.to_string()));
                }
                if !self.int_vars.iter().any(|n| n == v) {
                    self.int_vars.push(v.to_string());
                }
            }
        } else if let Some(rest) = body.strip_prefix("BIN:") {
            for raw in rest.split(',') {
                let v = raw.trim();
                check_var(v)?;
                if self.free_vars.iter().any(|n| n == v) {
                    return Err(ParseError::FreeIntConflict(v.to_string()));
                }
                if self.int_vars.iter().any(|n| n == v) {
                    return Err(ParseError::AlreadyInteger(v.to_string()));
                }
                self.int_vars.push(v.to_string());
                // A binary variable is an integer variable with v <= 1.
                self.constraints.push(ModelRow {
                    terms: LinExpr(vec![(v.to_string(), Rational::one())]),
                    relation: Relation::LessEqual,
                    rhs: Rational::one(),
                    name: format!("{}]", v),
                });
            }
        } else {
            self.constraints.push(constraint_from_body(&body, name)?);
        }
        Ok(false)
    }

    pub fn finish(self) -> Result<Model, ParseError> {
        if !self.done {
            warn!("model text ended without an END line");
        }
        let (goal, objective, objective_name) =
            self.objective.ok_or(ParseError::MissingObjective)?;
        Ok(Model {
            goal,
            objective,
            objective_name,
            constraints: self.constraints,
            free_vars: self.free_vars,
            int_vars: self.int_vars,
        })
    }
}

/// Parses a single standalone constraint line such as `X1 <= 3`.
pub fn parse_constraint(line: &str) -> Result<ModelRow, ParseError> {
    let (name, body) = preprocess(line);
    if body.is_empty() {
        return Err(ParseError::EmptyExpression);
    }
    constraint_from_body(&body, name)
}

/// Strips comments, extracts an optional `name)` prefix, and uppercases.
fn preprocess(line: &str) -> (String, String) {
    let line = if line.trim_start().starts_with("##") {
        ""
    } else {
        line
    };
    let line = match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    };
    match line.find(')') {
        Some(i) => (
            line[..=i].trim_start().to_string(),
            line[i + 1..].trim().to_uppercase(),
        ),
        None => (String::new(), line.trim().to_uppercase()),
    }
}

fn constraint_from_body(body: &str, name: String) -> Result<ModelRow, ParseError> {
    let (pos, len, relation) = find_relation(body).ok_or(ParseError::BadComparison)?;
    let lhs = &body[..pos];
    let rhs_str = body[pos + len..].trim();
    if find_relation(rhs_str).is_some() {
        return Err(ParseError::BadComparison);
    }
    let rhs = parse_number(rhs_str)?;
    let terms = parse_terms(lhs)?;
    Ok(ModelRow {
        terms,
        relation,
        rhs,
        name,
    })
}

/// Leftmost comparison operator, longest match first at each position.
fn find_relation(s: &str) -> Option<(usize, usize, Relation)> {
    for (i, _) in s.char_indices() {
        let rest = &s[i..];
        for (tok, rel) in [
            (">=", Relation::GreaterEqual),
            ("<=", Relation::LessEqual),
            ("==", Relation::Equal),
            ("=", Relation::Equal),
            ("<", Relation::LessEqual),
            (">", Relation::GreaterEqual),
        ] {
            if rest.starts_with(tok) {
                return Some((i, tok.len(), rel));
            }
        }
    }
    None
}

/// Parses a signed sum of `[coef]var` terms.
pub(crate) fn parse_terms(s: &str) -> Result<LinExpr, ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseError::EmptyExpression);
    }

    let mut pieces: Vec<&str> = Vec::new();
    let mut signs: Vec<char> = Vec::new();
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        if ch == '+' || ch == '-' {
            pieces.push(&s[start..i]);
            signs.push(ch);
            start = i + 1;
        }
    }
    pieces.push(&s[start..]);

    if pieces.last().is_some_and(|p| p.trim().is_empty()) {
        return Err(ParseError::TrailingSign);
    }
    if pieces[0].trim().is_empty() {
        pieces.remove(0);
    } else {
        signs.insert(0, '+');
    }

    let mut terms = LinExpr::default();
    for (piece, sign) in pieces.iter().zip(signs.iter()) {
        let piece = piece.trim();
        let at = split_term(piece).ok_or_else(|| ParseError::MissingVariable(piece.to_string()))?;
        let var = &piece[at..];
        let coeff_str = piece[..at].trim();
        let mut coeff = if coeff_str.is_empty() {
            Rational::one()
        } else {
            parse_number(coeff_str)?
        };
        if *sign == '-' {
            coeff = -coeff;
        }
        if terms.coeff(var).is_some() {
            return Err(ParseError::DuplicateVariable(var.to_string()));
        }
        terms.0.push((var.to_string(), coeff));
    }
    Ok(terms)
}

/// First position where a variable name starts and runs to the end of the
/// term, so `12.5Z10` splits into coefficient `12.5` and variable `Z10`.
fn split_term(piece: &str) -> Option<usize> {
    for (i, ch) in piece.char_indices() {
        if ch.is_ascii_alphabetic() && piece[i..].chars().all(|c| c.is_ascii_alphanumeric()) {
            return Some(i);
        }
    }
    None
}

/// Accepts integers, decimals (`12.5`, `.5`, `5.`) and fractions `p/q`.
pub(crate) fn parse_number(s: &str) -> Result<Rational, ParseError> {
    let bad = || ParseError::BadNumber(s.to_string());
    let t = s.trim();
    let (negative, body) = match t.strip_prefix('-') {
        Some(b) => (true, b),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    if body.is_empty() {
        return Err(bad());
    }

    let value = if let Some((p, q)) = body.split_once('/') {
        if !all_digits(p) || !all_digits(q) {
            return Err(bad());
        }
        let numer: BigInt = p.parse().map_err(|_| bad())?;
        let denom: BigInt = q.parse().map_err(|_| bad())?;
        if denom == BigInt::from(0) {
            return Err(bad());
        }
        Rational::new(numer, denom)
    } else if let Some((int_part, frac_part)) = body.split_once('.') {
        if !(int_part.is_empty() || all_digits(int_part))
            || !(frac_part.is_empty() || all_digits(frac_part))
        {
            return Err(bad());
        }
        let digits = format!("{}{}", int_part, frac_part);
        if digits.is_empty() {
            return Err(bad());
        }
        let numer: BigInt = digits.parse().map_err(|_| bad())?;
        let denom = num_traits::pow(BigInt::from(10), frac_part.len());
        Rational::new(numer, denom)
    } else {
        if !all_digits(body) {
            return Err(bad());
        }
        Rational::from_integer(body.parse().map_err(|_| bad())?)
    };

    Ok(if negative { -value } else { value })
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn check_var(name: &str) -> Result<(), ParseError> {
    let mut chars = name.chars();
    let ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric());
    if ok {
        Ok(())
    } else {
        Err(ParseError::BadVariable(name.to_string()))
    }
}
