//! Folding several rule trees into one

use crate::condition::ast::{AstNode, Connective};
use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::{Result, RuleError};

/// Combine trees into a single right-leaning tree joined by `connective`.
///
/// `[A, B, C]` becomes `A op (B op C)`, so the outermost left child is always
/// the first tree. A single tree is returned unchanged. The result is held to
/// the default depth limit.
pub fn combine(trees: Vec<AstNode>, connective: Connective) -> Result<AstNode> {
    combine_with_depth(trees, connective, DEFAULT_MAX_DEPTH)
}

/// [`combine`] with an explicit cap on the combined tree's height.
///
/// The height is worked out from the inputs before any node is allocated.
pub fn combine_with_depth(
    trees: Vec<AstNode>,
    connective: Connective,
    max_depth: usize,
) -> Result<AstNode> {
    let count = trees.len();
    let depth = combined_depth(&trees);
    if depth > max_depth {
        return Err(RuleError::LimitExceeded(format!(
            "Combining {} rule(s) nests {} levels deep, limit is {}",
            count, depth, max_depth
        )));
    }
    let combined = trees
        .into_iter()
        .rev()
        .reduce(|right, left| AstNode::operator(connective, left, right))
        .ok_or(RuleError::EmptyInput)?;

    log::debug!("combined {} rule(s) with {}", count, connective);
    Ok(combined)
}

/// Height of the right-leaning fold: tree `i` hangs below `i + 1` operators,
/// except the last, which shares the deepest operator with its neighbour.
fn combined_depth(trees: &[AstNode]) -> usize {
    let last = trees.len().saturating_sub(1);
    trees
        .iter()
        .enumerate()
        .map(|(i, tree)| tree.depth() + if i == last { i } else { i + 1 })
        .max()
        .unwrap_or(0)
}
