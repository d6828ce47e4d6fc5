//! Persisted AST shape
//!
//! Rules are stored as a JSON tagged union:
//!
//! ```json
//! {"type": "operator", "value": "AND",
//!  "left": {"type": "operand", "value": "age > 30"},
//!  "right": {"type": "operand", "value": "status = 'active'"}}
//! ```
//!
//! Decoding goes back through the parser, so a stored tree is validated the
//! same way a freshly built one is.

use serde::{Deserialize, Serialize};

use crate::condition::ast::{AstNode, Connective};
use crate::condition::parser::parse_condition;
use crate::error::{Result, RuleError};

/// Wire form of an [`AstNode`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoredNode {
    Operand {
        value: String,
    },
    Operator {
        value: String,
        left: Box<StoredNode>,
        right: Box<StoredNode>,
    },
}

impl From<&AstNode> for StoredNode {
    fn from(node: &AstNode) -> Self {
        match node {
            AstNode::Operand(cond) => StoredNode::Operand {
                value: cond.as_str().to_string(),
            },
            AstNode::Operator {
                connective,
                left,
                right,
            } => StoredNode::Operator {
                value: connective.keyword().to_string(),
                left: Box::new(StoredNode::from(left.as_ref())),
                right: Box::new(StoredNode::from(right.as_ref())),
            },
        }
    }
}

impl From<AstNode> for StoredNode {
    fn from(node: AstNode) -> Self {
        StoredNode::from(&node)
    }
}

impl TryFrom<StoredNode> for AstNode {
    type Error = RuleError;

    fn try_from(node: StoredNode) -> Result<Self> {
        match node {
            StoredNode::Operand { value } => Ok(AstNode::Operand(parse_condition(&value)?)),
            StoredNode::Operator { value, left, right } => {
                let connective: Connective = value.parse()?;
                Ok(AstNode::operator(
                    connective,
                    AstNode::try_from(*left)?,
                    AstNode::try_from(*right)?,
                ))
            }
        }
    }
}

impl AstNode {
    /// Decode a stored tree, keeping the precise error for bad leaves or connectives
    pub fn from_json(json: &str) -> Result<Self> {
        let stored: StoredNode = serde_json::from_str(json)?;
        AstNode::try_from(stored)
    }

    /// Decode a stored tree from an already parsed JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let stored: StoredNode = serde_json::from_value(value)?;
        AstNode::try_from(stored)
    }

    /// Serialize to the stored JSON shape.
    ///
    /// # Panics
    /// Never in practice: every node is a string-keyed map of strings and
    /// nested nodes, which `serde_json` cannot fail to write.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&StoredNode::from(self))
            .expect("rule tree of strings always serializes to JSON")
    }
}
