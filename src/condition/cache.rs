//! Parsed rule cache - keyed by the raw rule string, bounded in size

use crate::condition::ast::AstNode;
use crate::condition::parser;
use crate::config::DEFAULT_CACHE_CAPACITY;
use crate::error::Result;
use crate::record::Record;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

/// A bounded map from rule text to its parsed tree.
///
/// Once `capacity` entries are held, inserting a new rule evicts an existing
/// one, so the cache never grows past its capacity however many distinct
/// rules pass through it.
#[derive(Debug)]
pub struct RuleCache {
    capacity: usize,
    entries: RwLock<AHashMap<String, AstNode>>,
}

impl RuleCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: RwLock::new(AHashMap::with_capacity(capacity.min(256))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains(&self, rule: &str) -> bool {
        self.entries.read().contains_key(rule)
    }

    pub fn get(&self, rule: &str) -> Option<AstNode> {
        self.entries.read().get(rule).cloned()
    }

    /// Store a parsed tree, evicting an arbitrary entry when full.
    pub fn insert(&self, rule: &str, ast: AstNode) {
        let mut entries = self.entries.write();
        if entries.len() >= self.capacity && !entries.contains_key(rule) {
            if let Some(victim) = entries.keys().next().cloned() {
                log::trace!("rule cache full, evicting: {}", victim);
                entries.remove(&victim);
            }
        }
        entries.insert(rule.to_string(), ast);
    }

    /// Look `rule` up, parsing it with `parse` on a miss. Failures are never cached.
    #[inline]
    pub fn get_or_parse_with<F>(&self, rule: &str, parse: F) -> Result<AstNode>
    where
        F: FnOnce(&str) -> Result<AstNode>,
    {
        // Fast path: read lock only
        if let Some(ast) = self.get(rule) {
            log::trace!("rule cache hit: {}", rule);
            return Ok(ast);
        }

        let ast = parse(rule)?;
        self.insert(rule, ast.clone());
        Ok(ast)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

/// Global rule cache with fast hashing (ahash)
static RULE_CACHE: Lazy<RuleCache> = Lazy::new(|| RuleCache::new(DEFAULT_CACHE_CAPACITY));

/// Get or parse a rule string, using cache for repeated rules
#[inline]
pub fn get_or_parse(rule: &str) -> Result<AstNode> {
    RULE_CACHE.get_or_parse_with(rule, parser::parse)
}

/// Check a rule string against a record, using cached AST
#[inline]
pub fn check_rule(rule: &str, record: &Record) -> Result<bool> {
    let ast = get_or_parse(rule)?;
    crate::condition::evaluator::evaluate(&ast, record)
}

/// Clear the rule cache
pub fn clear_cache() {
    RULE_CACHE.clear();
}

/// Get cache statistics
pub fn cache_size() -> usize {
    RULE_CACHE.len()
}
