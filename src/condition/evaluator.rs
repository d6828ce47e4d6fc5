//! Rule evaluator

use crate::condition::ast::{AstNode, Comparator, Condition, Connective, Literal};
use crate::error::{Result, RuleError};
use crate::record::{Record, Value};

/// Evaluate an AST against a record.
///
/// `AND` stops at the first false branch and `OR` at the first true one, so
/// the right subtree is only visited when it can change the outcome.
pub fn evaluate(ast: &AstNode, record: &Record) -> Result<bool> {
    match ast {
        AstNode::Operand(cond) => check_condition(cond, record),
        AstNode::Operator {
            connective: Connective::And,
            left,
            right,
        } => Ok(evaluate(left, record)? && evaluate(right, record)?),
        AstNode::Operator {
            connective: Connective::Or,
            left,
            right,
        } => Ok(evaluate(left, record)? || evaluate(right, record)?),
    }
}

/// Evaluate a single condition against a record
pub fn check_condition(cond: &Condition, record: &Record) -> Result<bool> {
    let value = record
        .get(&cond.field)
        .ok_or_else(|| RuleError::UnknownField(cond.field.clone()))?;

    if let (Literal::Number(expected), Some(actual)) = (&cond.literal, value.as_number()) {
        return Ok(compare_numbers(cond.comparator, actual, *expected));
    }

    compare_text(cond, value)
}

fn compare_numbers(comparator: Comparator, actual: f64, expected: f64) -> bool {
    match comparator {
        Comparator::Greater => actual > expected,
        Comparator::Less => actual < expected,
        Comparator::GreaterEqual => actual >= expected,
        Comparator::LessEqual => actual <= expected,
        Comparator::Equal => actual == expected,
        Comparator::NotEqual => actual != expected,
    }
}

fn compare_text(cond: &Condition, value: &Value) -> Result<bool> {
    if cond.comparator.is_ordering() {
        return Err(RuleError::TypeMismatch(format!(
            "`{}` needs numbers on both sides, but {} is {}",
            cond, cond.field, value
        )));
    }

    let actual = value.as_text();
    let equal = match &cond.literal {
        Literal::Text(expected) => actual == expected.as_str(),
        Literal::Number(expected) => actual == expected.to_string(),
    };

    Ok(match cond.comparator {
        Comparator::NotEqual => !equal,
        _ => equal,
    })
}
