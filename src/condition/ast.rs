//! Abstract Syntax Tree for rule expressions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::condition::parser;
use crate::condition::stored::StoredNode;
use crate::error::{Result, RuleError};

/// AST node for rule expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "StoredNode", try_from = "StoredNode")]
pub enum AstNode {
    /// Single comparison like "age > 30"
    Operand(Condition),
    /// Two subtrees joined by a connective
    Operator {
        connective: Connective,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
}

impl AstNode {
    /// Join two subtrees under a new operator node
    pub fn operator(connective: Connective, left: AstNode, right: AstNode) -> Self {
        AstNode::Operator {
            connective,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Number of operand leaves in the tree
    pub fn leaf_count(&self) -> usize {
        match self {
            AstNode::Operand(_) => 1,
            AstNode::Operator { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    /// Height of the tree; a single operand has depth 1
    pub fn depth(&self) -> usize {
        match self {
            AstNode::Operand(_) => 1,
            AstNode::Operator { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// Field names referenced by the leaves, left to right (duplicates kept)
    pub fn fields(&self) -> SmallVec<[&str; 8]> {
        let mut fields = SmallVec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, out: &mut SmallVec<[&'a str; 8]>) {
        match self {
            AstNode::Operand(cond) => out.push(cond.field.as_str()),
            AstNode::Operator { left, right, .. } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
        }
    }
}

/// Boolean connectives joining two subtrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    /// Keyword as written in rule strings
    pub fn keyword(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Connective {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AND" => Ok(Connective::And),
            "OR" => Ok(Connective::Or),
            other => Err(RuleError::UnknownOperator(other.to_string())),
        }
    }
}

/// Single comparison `field comparator literal`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub comparator: Comparator,
    pub literal: Literal,
    pub(crate) raw: String,
}

impl Condition {
    /// The trimmed source text this condition was parsed from
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for Condition {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        parser::parse_condition(s)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// Greater than (>)
    Greater,
    /// Less than (<)
    Less,
    /// Greater than or equal (>=)
    GreaterEqual,
    /// Less than or equal (<=)
    LessEqual,
    /// Equal (=)
    Equal,
    /// Not equal (!=)
    NotEqual,
}

impl Comparator {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Greater => ">",
            Comparator::Less => "<",
            Comparator::GreaterEqual => ">=",
            Comparator::LessEqual => "<=",
            Comparator::Equal => "=",
            Comparator::NotEqual => "!=",
        }
    }

    /// Whether the comparator needs an ordering rather than plain equality
    pub fn is_ordering(self) -> bool {
        !matches!(self, Comparator::Equal | Comparator::NotEqual)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            ">" => Ok(Comparator::Greater),
            "<" => Ok(Comparator::Less),
            ">=" => Ok(Comparator::GreaterEqual),
            "<=" => Ok(Comparator::LessEqual),
            "=" => Ok(Comparator::Equal),
            "!=" => Ok(Comparator::NotEqual),
            other => Err(RuleError::InvalidCondition(format!(
                "Unknown comparator: {}",
                other
            ))),
        }
    }
}

/// Right-hand side of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
}
