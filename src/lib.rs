//! Rule Engine Core - boolean rule compiler and evaluator
//!
//! Turns condition strings such as
//! `age > 30 AND (status = 'active' OR tier = 'gold')` into binary ASTs,
//! folds several ASTs into one, and evaluates them against records.
//! Optional Python bindings are available via the `python` feature.

pub mod condition;
pub mod config;
pub mod engine;
pub mod error;
pub mod record;

#[cfg(feature = "python")]
mod python;

pub use crate::condition::{AstNode, Comparator, Condition, Connective, Literal};
pub use crate::config::EngineConfig;
pub use crate::engine::RuleEngine;
pub use crate::error::{Result, RuleError};
pub use crate::record::{Record, Value};

/// Build an AST from a rule string, under the default [`EngineConfig`] limits
///
/// # Errors
/// `ParseError` for empty or unbalanced input, `InvalidCondition` for a leaf
/// that is not `field <comparator> literal`, `LimitExceeded` for a rule that
/// is too long or nests too deep.
pub fn build_rule(rule: &str) -> Result<AstNode> {
    let ast = EngineConfig::default().parse_rule(rule)?;
    log::debug!("built rule with {} condition(s): {}", ast.leaf_count(), rule.trim());
    Ok(ast)
}

/// Fold rule ASTs into one right-leaning tree joined by `connective`
///
/// # Errors
/// `EmptyInput` when `rules` is empty, `LimitExceeded` when the combined tree
/// would nest deeper than the default depth limit.
pub fn combine_rules(rules: Vec<AstNode>, connective: Connective) -> Result<AstNode> {
    condition::combine(rules, connective)
}

/// Evaluate an AST against a record
///
/// # Errors
/// `UnknownField` when a visited condition names a field missing from the
/// record, `TypeMismatch` for an ordering comparison on non-numeric values.
pub fn evaluate_rule(ast: &AstNode, record: &Record) -> Result<bool> {
    condition::evaluate(ast, record)
}
