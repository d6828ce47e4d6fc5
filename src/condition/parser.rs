//! Rule string parser

use once_cell::sync::Lazy;
use regex::Regex;

use crate::condition::ast::{AstNode, Comparator, Condition, Connective, Literal};
use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::{Result, RuleError};

/// `field comparator literal`, where the literal is quoted or a bare token
static CONDITION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([A-Za-z_]\w*)\s*(>=|<=|!=|>|<|=)\s*('[^']+'|"[^"]+"|[^\s'"()<>=!]+)$"#)
        .expect("condition pattern is a valid regex")
});

/// Parse a rule string into an AST no taller than the default depth limit
pub fn parse(rule: &str) -> Result<AstNode> {
    parse_with_depth(rule, DEFAULT_MAX_DEPTH)
}

/// Parse a rule string into an AST no taller than `max_depth`.
///
/// Recursion stops as soon as the limit is crossed, so arbitrarily long
/// chains fail with `LimitExceeded` instead of exhausting the stack.
pub fn parse_with_depth(rule: &str, max_depth: usize) -> Result<AstNode> {
    let rule = rule.trim();
    if rule.is_empty() {
        return Err(RuleError::ParseError("Empty rule".to_string()));
    }

    check_balanced(rule)?;
    parse_expression(rule, 1, max_depth)
}

/// Parse a single comparison such as `age > 30`
pub fn parse_condition(raw: &str) -> Result<Condition> {
    let raw = raw.trim();
    let caps = CONDITION_PATTERN.captures(raw).ok_or_else(|| {
        RuleError::InvalidCondition(format!("Expected `field <comparator> literal`, got: {}", raw))
    })?;

    let comparator: Comparator = caps[2].parse()?;
    let literal = parse_literal(&caps[3]);

    Ok(Condition {
        field: caps[1].to_string(),
        comparator,
        literal,
        raw: raw.to_string(),
    })
}

fn parse_literal(token: &str) -> Literal {
    if token.starts_with('\'') || token.starts_with('"') {
        return Literal::Text(token[1..token.len() - 1].to_string());
    }

    match token.parse::<f64>() {
        Ok(n) if !n.is_nan() => Literal::Number(n),
        _ => Literal::Text(token.to_string()),
    }
}

fn parse_expression(expr: &str, depth: usize, max_depth: usize) -> Result<AstNode> {
    if depth > max_depth {
        return Err(RuleError::LimitExceeded(format!(
            "Rule nests deeper than {} levels",
            max_depth
        )));
    }

    let expr = strip_outer_parens(expr.trim());
    if expr.is_empty() {
        return Err(RuleError::ParseError("Empty group".to_string()));
    }

    if let Some(split) = find_split(expr) {
        let left = expr[..split.start].trim();
        let right = expr[split.end..].trim();
        if left.is_empty() || right.is_empty() {
            return Err(RuleError::ParseError(format!(
                "Missing operand for {} in: {}",
                split.connective, expr
            )));
        }

        log::trace!("splitting on {} at byte {}: {}", split.connective, split.start, expr);
        return Ok(AstNode::operator(
            split.connective,
            parse_expression(left, depth + 1, max_depth)?,
            parse_expression(right, depth + 1, max_depth)?,
        ));
    }

    Ok(AstNode::Operand(parse_condition(expr)?))
}

/// Tracks grouping depth and quoted text while walking a rule byte by byte.
///
/// Keywords and grouping symbols are ASCII, so walking bytes never lands
/// inside a multi-byte character at a position that matters.
#[derive(Debug, Default)]
struct Scanner {
    depth: i32,
    quote: Option<u8>,
}

impl Scanner {
    /// Feed one byte; returns true if it lies outside quoted text
    fn step(&mut self, b: u8) -> bool {
        if let Some(q) = self.quote {
            if b == q {
                self.quote = None;
            }
            return false;
        }

        match b {
            b'\'' | b'"' => {
                self.quote = Some(b);
                return false;
            }
            b'(' => self.depth += 1,
            b')' => self.depth -= 1,
            _ => {}
        }
        true
    }
}

fn check_balanced(expr: &str) -> Result<()> {
    let mut scanner = Scanner::default();
    for (i, b) in expr.bytes().enumerate() {
        scanner.step(b);
        if scanner.depth < 0 {
            return Err(RuleError::ParseError(format!(
                "Unmatched ')' at byte {} in: {}",
                i, expr
            )));
        }
    }

    if scanner.quote.is_some() {
        return Err(RuleError::ParseError(format!("Unterminated quote in: {}", expr)));
    }
    if scanner.depth != 0 {
        return Err(RuleError::ParseError(format!(
            "Unbalanced parentheses: {} unclosed in: {}",
            scanner.depth, expr
        )));
    }
    Ok(())
}

/// Peel redundant outer parentheses, e.g. `((a > 1))` -> `a > 1`.
/// `(a > 1) AND (b > 2)` is left alone since its interior is not balanced.
fn strip_outer_parens(mut expr: &str) -> &str {
    while expr.len() >= 2 && expr.starts_with('(') && expr.ends_with(')') {
        let inner = &expr[1..expr.len() - 1];
        if check_balanced(inner).is_err() {
            break;
        }
        expr = inner.trim();
    }
    expr
}

struct Split {
    connective: Connective,
    start: usize,
    end: usize,
}

/// Locate the split point: the first depth-0 AND, otherwise the first depth-0 OR
fn find_split(expr: &str) -> Option<Split> {
    let bytes = expr.as_bytes();
    let mut scanner = Scanner::default();
    let mut first_or = None;

    for (i, &b) in bytes.iter().enumerate() {
        if !scanner.step(b) || scanner.depth != 0 || !is_boundary_before(bytes, i) {
            continue;
        }

        for connective in [Connective::And, Connective::Or] {
            let keyword = connective.keyword().as_bytes();
            let end = i + keyword.len();
            if !bytes[i..].starts_with(keyword) || !is_boundary_at(bytes, end) {
                continue;
            }

            let split = Split {
                connective,
                start: i,
                end,
            };
            match connective {
                Connective::And => return Some(split),
                Connective::Or => {
                    if first_or.is_none() {
                        first_or = Some(split);
                    }
                }
            }
        }
    }

    first_or
}

fn is_boundary_before(bytes: &[u8], i: usize) -> bool {
    i == 0 || is_delimiter(bytes[i - 1])
}

fn is_boundary_at(bytes: &[u8], i: usize) -> bool {
    i == bytes.len() || is_delimiter(bytes[i])
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'(' || b == b')'
}
