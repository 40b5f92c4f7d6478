//! The boolean expression language used by `if` and friends.
//!
//! An expression is a chain of clauses joined by `and` / `or`, folded strictly
//! from left to right with no precedence between the two. A clause is one of
//!
//! * a boolean literal: `true`, `no`, `1`, ...
//! * a function: `isempty X`, `not (EXPR)`, `isbound NAME`
//! * a comparison: `A op B [as string|number|date] [with FLAG]`
//!
//! `@name` operands read a field of the current item, `@@name` an attribute.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::constants::{GROUP_CLOSE, GROUP_OPEN};
use crate::context::Context;
use crate::error::ExpressionError;
use crate::lexer::{parse_boolean, parse_first_level_groups};
use crate::registry::CommandRegistry;
use crate::substitution::perform_substitution;

/// Date layouts tried, in order, after RFC 3339.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y%m%dT%H%M%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Evaluates `expression` against the current position of `ctx`.
pub fn evaluate_expression(
    registry: &CommandRegistry,
    ctx: &dyn Context,
    expression: &str,
) -> Result<bool, ExpressionError> {
    ExpressionEvaluator::new(registry, ctx).evaluate(expression)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Equal,
    Less,
    Greater,
    NotEqual,
    LessOrEqual,
    GreaterOrEqual,
    StartsWith,
    EndsWith,
    Contains,
    NotContains,
}

impl FromStr for Operator {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "=" => Operator::Equal,
            "<" => Operator::Less,
            ">" => Operator::Greater,
            "!=" => Operator::NotEqual,
            "<=" => Operator::LessOrEqual,
            ">=" => Operator::GreaterOrEqual,
            "[" => Operator::StartsWith,
            "]" => Operator::EndsWith,
            "?" => Operator::Contains,
            "!?" => Operator::NotContains,
            other => return Err(ExpressionError::InvalidOperator(other.to_string())),
        })
    }
}

impl Operator {
    /// Applies a relational operator to an ordering. `None` for text operators.
    fn relate(self, ordering: Ordering) -> Option<bool> {
        Some(match self {
            Operator::Equal => ordering == Ordering::Equal,
            Operator::Less => ordering == Ordering::Less,
            Operator::Greater => ordering == Ordering::Greater,
            Operator::NotEqual => ordering != Ordering::Equal,
            Operator::LessOrEqual => ordering != Ordering::Greater,
            Operator::GreaterOrEqual => ordering != Ordering::Less,
            _ => return None,
        })
    }

    fn match_text(self, a: &str, b: &str) -> bool {
        match self {
            Operator::StartsWith => a.starts_with(b),
            Operator::EndsWith => a.ends_with(b),
            Operator::Contains => a.contains(b),
            Operator::NotContains => !a.contains(b),
            relational => relational.relate(a.cmp(b)).unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cast {
    Text,
    Number,
    Date,
}

#[derive(Debug, Clone, Copy, Default)]
struct Modifiers {
    ignore_case: bool,
    ignore_decimal: bool,
    round: bool,
    ceiling: bool,
    floor: bool,
}

impl Modifiers {
    fn set(&mut self, flag: &str) -> Result<(), ExpressionError> {
        match flag {
            "ignorecase" => self.ignore_case = true,
            "ignoredecimal" => self.ignore_decimal = true,
            "round" => self.round = true,
            "ceiling" => self.ceiling = true,
            "floor" => self.floor = true,
            other => return Err(ExpressionError::UnknownFlag(other.to_string())),
        }
        Ok(())
    }

    fn transform(&self, mut n: f64) -> f64 {
        if self.ignore_decimal {
            n = n.trunc();
        }
        if self.ceiling {
            n = n.ceil();
        }
        if self.floor {
            n = n.floor();
        }
        if self.round {
            n = n.round_ties_even();
        }
        n
    }
}

pub struct ExpressionEvaluator<'a> {
    registry: &'a CommandRegistry,
    ctx: &'a dyn Context,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(registry: &'a CommandRegistry, ctx: &'a dyn Context) -> Self {
        Self { registry, ctx }
    }

    pub fn evaluate(&self, expression: &str) -> Result<bool, ExpressionError> {
        let mut clauses = split_clauses(expression).into_iter();
        let first = match clauses.next() {
            Some((_, clause)) if !clause.trim().is_empty() => clause,
            _ => return Err(ExpressionError::Malformed(expression.trim().to_string())),
        };

        let mut result = self.evaluate_clause(first)?;
        for (combinator, clause) in clauses {
            if clause.trim().is_empty() {
                let keyword = match combinator {
                    Combinator::And => "and",
                    Combinator::Or => "or",
                };
                return Err(ExpressionError::MissingOperand(keyword.to_string()));
            }
            // Every clause is evaluated so malformed input is always reported.
            let current = self.evaluate_clause(clause)?;
            result = match combinator {
                Combinator::And => result & current,
                Combinator::Or => result | current,
            };
        }
        Ok(result)
    }

    fn evaluate_clause(&self, clause: &str) -> Result<bool, ExpressionError> {
        let substituted = perform_substitution(self.ctx.env(), clause.trim());
        let elements = parse_first_level_groups(&substituted, GROUP_OPEN, GROUP_CLOSE);

        match elements.len() {
            1 => parse_boolean(&elements[0])
                .ok_or_else(|| ExpressionError::InvalidBoolean(elements[0].clone())),
            2 => self.evaluate_function(&elements[0], &elements[1]),
            3 | 5 | 7 => self.evaluate_comparison(&elements),
            _ => Err(ExpressionError::Malformed(clause.trim().to_string())),
        }
    }

    fn evaluate_function(&self, name: &str, argument: &str) -> Result<bool, ExpressionError> {
        match name {
            "isempty" => Ok(self.resolve_operand(argument)?.is_empty()),
            "not" => Ok(!self.evaluate(argument)?),
            "isbound" => Ok(self.registry.is_bound(argument)),
            other => Err(ExpressionError::UnknownFunction(other.to_string())),
        }
    }

    fn evaluate_comparison(&self, elements: &[String]) -> Result<bool, ExpressionError> {
        let op: Operator = elements[1].parse()?;

        let mut cast = Cast::Text;
        let mut modifiers = Modifiers::default();
        for pair in elements[3..].chunks(2) {
            match pair[0].as_str() {
                "as" => {
                    let name = pair.get(1).ok_or(ExpressionError::MissingCastType)?;
                    cast = match name.as_str() {
                        "string" => Cast::Text,
                        "number" => Cast::Number,
                        "date" => Cast::Date,
                        other => return Err(ExpressionError::UnknownCastType(other.to_string())),
                    };
                }
                "with" => modifiers.set(pair.get(1).ok_or(ExpressionError::MissingFlag)?)?,
                _ => return Err(ExpressionError::Malformed(elements.join(" "))),
            }
        }

        let left = self.resolve_operand(&elements[0])?;
        let right = self.resolve_operand(&elements[2])?;

        match cast {
            Cast::Text => Ok(compare_text(&left, &right, op, &modifiers)),
            Cast::Number => compare_numbers(&left, &right, op, &modifiers),
            Cast::Date => compare_dates(&left, &right, op),
        }
    }

    fn resolve_operand(&self, token: &str) -> Result<String, ExpressionError> {
        if let Some(attribute) = token.strip_prefix("@@") {
            return self
                .ctx
                .attribute(attribute)
                .ok_or_else(|| ExpressionError::UnknownAttribute(token.to_string()));
        }
        if let Some(field) = token.strip_prefix('@').filter(|name| !name.is_empty()) {
            return Ok(self.ctx.field(field).unwrap_or_default());
        }
        Ok(token.to_string())
    }
}

fn compare_text(left: &str, right: &str, op: Operator, modifiers: &Modifiers) -> bool {
    if modifiers.ignore_case {
        op.match_text(&left.to_lowercase(), &right.to_lowercase())
    } else {
        op.match_text(left, right)
    }
}

fn compare_numbers(left: &str, right: &str, op: Operator, modifiers: &Modifiers) -> Result<bool, ExpressionError> {
    if left.is_empty() || right.is_empty() {
        return Ok(false);
    }
    let a = parse_number(left)?;
    let b = parse_number(right)?;
    let a = modifiers.transform(a);
    let b = modifiers.transform(b);

    match a.partial_cmp(&b) {
        Some(ordering) => Ok(op
            .relate(ordering)
            .unwrap_or_else(|| op.match_text(&a.to_string(), &b.to_string()))),
        None => Ok(op == Operator::NotEqual),
    }
}

fn parse_number(value: &str) -> Result<f64, ExpressionError> {
    value
        .trim()
        .parse()
        .map_err(|_| ExpressionError::NotANumber(value.to_string()))
}

// Text operators have no meaning for dates and evaluate to false.
fn compare_dates(left: &str, right: &str, op: Operator) -> Result<bool, ExpressionError> {
    if left.is_empty() || right.is_empty() {
        return Ok(false);
    }
    let a = parse_date(left).ok_or_else(|| ExpressionError::NotADate(left.to_string()))?;
    let b = parse_date(right).ok_or_else(|| ExpressionError::NotADate(right.to_string()))?;
    Ok(op.relate(a.cmp(&b)).unwrap_or(false))
}

pub(crate) fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Splits on top-level `and` / `or` words, keeping each clause's original text.
///
/// Keywords inside parenthesised groups belong to the group.
fn split_clauses(expression: &str) -> Vec<(Combinator, &str)> {
    let mut clauses = Vec::new();
    let mut combinator = Combinator::And;
    let mut clause_start = 0;
    let mut depth = 0usize;

    for (start, word) in words(expression) {
        if depth == 0 {
            let keyword = match word {
                "and" => Some(Combinator::And),
                "or" => Some(Combinator::Or),
                _ => None,
            };
            if let Some(next) = keyword {
                clauses.push((combinator, &expression[clause_start..start]));
                combinator = next;
                clause_start = start + word.len();
                continue;
            }
        }
        for ch in word.chars() {
            if ch == GROUP_OPEN {
                depth += 1;
            } else if ch == GROUP_CLOSE {
                depth = depth.saturating_sub(1);
            }
        }
    }
    clauses.push((combinator, &expression[clause_start..]));
    clauses
}

/// Whitespace separated words with their byte offsets.
fn words(input: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = None;
    for (idx, ch) in input.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(s)) => {
                out.push((s, &input[s..idx]));
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, &input[s..]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MemoryContext;

    fn ctx() -> MemoryContext {
        let mut ctx = MemoryContext::new();
        ctx.add_item("/home", "page")
            .unwrap()
            .set_field("title", "Bananas")
            .set_field("price", "69.6")
            .set_field("created", "2007-12-01");
        ctx.set_current_path("/home").unwrap();
        ctx
    }

    fn eval(expression: &str) -> Result<bool, ExpressionError> {
        let registry = CommandRegistry::new();
        let ctx = ctx();
        evaluate_expression(&registry, &ctx, expression)
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval("true"), Ok(true));
        assert_eq!(eval("no"), Ok(false));
        assert_eq!(
            eval("perhaps"),
            Err(ExpressionError::InvalidBoolean("perhaps".to_string()))
        );
    }

    #[test]
    fn test_numeric_comparisons() {
        assert_eq!(eval("5 > 3 as number"), Ok(true));
        assert_eq!(eval("5.5 > 3 as number with floor"), Ok(true));
        assert_eq!(eval("5.5 = 5 as number with floor"), Ok(true));
        assert_eq!(eval("5.9 = 5 as number with ignoredecimal"), Ok(true));
        assert_eq!(eval("4.1 = 5 as number with ceiling"), Ok(true));
        assert_eq!(eval("2.5 = 2 as number with round"), Ok(true));
        assert_eq!(eval("10 > 9"), Ok(false));
        assert_eq!(eval("10 > 9 as number"), Ok(true));
        assert_eq!(eval("125 [ 12 as number"), Ok(true));
        assert_eq!(
            eval("five > 3 as number"),
            Err(ExpressionError::NotANumber("five".to_string()))
        );
        assert_eq!(eval("() > 3 as number"), Ok(false));
    }

    #[test]
    fn test_string_comparisons() {
        assert_eq!(eval("abc = ABC with ignorecase"), Ok(true));
        assert_eq!(eval("abc = ABC"), Ok(false));
        assert_eq!(eval("abc < abd"), Ok(true));
        assert_eq!(eval("hello [ he"), Ok(true));
        assert_eq!(eval("hello ] lo"), Ok(true));
        assert_eq!(eval("hello ? ell"), Ok(true));
        assert_eq!(eval("hello !? ell"), Ok(false));
        assert_eq!(eval("(hello world) ? (o w)"), Ok(true));
    }

    #[test]
    fn test_date_comparisons() {
        assert_eq!(eval("2020-01-02 > 2020-01-01 as date"), Ok(true));
        assert_eq!(eval("12/01/2007 = 2007-12-01 as date"), Ok(true));
        assert_eq!(eval("20200101T101500 < 2020-01-01T10:16:00 as date"), Ok(true));
        assert_eq!(eval("2020-01-02 ? 2020-01-02 as date"), Ok(false));
        assert_eq!(eval("2020-01-02 [ 2020-01-02 as date"), Ok(false));
        assert_eq!(
            eval("yesterday < 2020-01-01 as date"),
            Err(ExpressionError::NotADate("yesterday".to_string()))
        );
    }

    #[test]
    fn test_fields_and_attributes() {
        assert_eq!(eval("@title = bananas with ignorecase"), Ok(true));
        assert_eq!(eval("@price >= 70 as number with round"), Ok(true));
        assert_eq!(eval("@@name = home with ignorecase"), Ok(true));
        assert_eq!(eval("@missing = ()"), Ok(true));
        assert_eq!(eval("@created = 12/01/2007 as date"), Ok(true));
        assert_eq!(
            eval("@@bogus = x"),
            Err(ExpressionError::UnknownAttribute("@@bogus".to_string()))
        );
    }

    #[test]
    fn test_combinators_fold_left_to_right() {
        assert_eq!(eval("a = b and b = b or 3 = 3 as number"), Ok(true));
        assert_eq!(eval("a = b or b = b and 3 = 3 as number"), Ok(true));
        // ((true or x) and false) is false under a strict left fold.
        assert_eq!(eval("true or false and false"), Ok(false));
        assert_eq!(eval("  a   =  a   and   b = b  "), Ok(true));
    }

    #[test]
    fn test_decided_result_still_checks_later_clauses() {
        assert_eq!(
            eval("false and perhaps"),
            Err(ExpressionError::InvalidBoolean("perhaps".to_string()))
        );
        assert_eq!(
            eval("true or 5 > x as number"),
            Err(ExpressionError::NotANumber("x".to_string()))
        );
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("isempty ()"), Ok(true));
        assert_eq!(eval("isempty @title"), Ok(false));
        assert_eq!(eval("not (a = b)"), Ok(true));
        assert_eq!(eval("not (a = a and b = c)"), Ok(true));
        assert_eq!(eval("isbound echo"), Ok(false));
        assert_eq!(
            eval("frobnicate x"),
            Err(ExpressionError::UnknownFunction("frobnicate".to_string()))
        );
    }

    #[test]
    fn test_malformed_expressions() {
        assert!(matches!(eval("a = b c"), Err(ExpressionError::Malformed(_))));
        assert!(matches!(eval("a = b as"), Err(ExpressionError::Malformed(_))));
        assert_eq!(
            eval("a ~ b"),
            Err(ExpressionError::InvalidOperator("~".to_string()))
        );
        assert_eq!(
            eval("a = b with shouting"),
            Err(ExpressionError::UnknownFlag("shouting".to_string()))
        );
        assert_eq!(
            eval("a = b and"),
            Err(ExpressionError::MissingOperand("and".to_string()))
        );
        assert!(matches!(eval(""), Err(ExpressionError::Malformed(_))));
    }

    #[test]
    fn test_variables_are_substituted() {
        let registry = CommandRegistry::new();
        let mut ctx = ctx();
        ctx.env_mut().set_var("~", "alpha beta");
        assert_eq!(
            evaluate_expression(&registry, &ctx, "($~$) ? beta"),
            Ok(true)
        );
    }
}
