//! In-memory rule engine
//!
//! Holds named rules built from rule strings (or supplied as stored trees)
//! and exposes the build / combine / evaluate operations over them.
//! Durable storage is left to the caller.

use ahash::AHashMap;

use crate::condition::{combine_with_depth, evaluate, parse_with_depth, AstNode, Connective, RuleCache};
use crate::config::EngineConfig;
use crate::error::{Result, RuleError};
use crate::record::Record;

/// Rule engine with a registry of named rules
#[derive(Debug)]
pub struct RuleEngine {
    config: EngineConfig,
    rules: AHashMap<String, AstNode>,
    /// Parsed rule strings, present when `cache_rules` is on
    cache: Option<RuleCache>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl RuleEngine {
    pub fn new(config: EngineConfig) -> Self {
        let cache = config
            .cache_rules
            .then(|| RuleCache::new(config.cache_capacity));
        Self {
            config,
            rules: AHashMap::new(),
            cache,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build an AST from a rule string, applying the configured limits
    pub fn build_rule(&self, rule: &str) -> Result<AstNode> {
        let max_depth = self.config.max_depth;
        match &self.cache {
            Some(cache) => {
                self.config.check_length(rule)?;
                cache.get_or_parse_with(rule, |rule| parse_with_depth(rule, max_depth))
            }
            None => self.config.parse_rule(rule),
        }
    }

    /// Number of parsed rule strings currently cached
    pub fn cache_size(&self) -> usize {
        self.cache.as_ref().map_or(0, RuleCache::len)
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Build a rule and store it under `rule_id`, replacing any previous rule
    pub fn register_rule(&mut self, rule_id: impl Into<String>, rule: &str) -> Result<AstNode> {
        let rule_id = rule_id.into();
        let ast = self.build_rule(rule)?;

        log::debug!(
            "registered rule {} ({} condition(s)): {}",
            rule_id,
            ast.leaf_count(),
            rule
        );
        self.rules.insert(rule_id, ast.clone());
        Ok(ast)
    }

    /// Store an already built tree, e.g. one loaded from persistent storage
    pub fn insert_rule(&mut self, rule_id: impl Into<String>, ast: AstNode) -> Result<Option<AstNode>> {
        self.config.check_depth(ast.depth())?;
        Ok(self.rules.insert(rule_id.into(), ast))
    }

    pub fn rule(&self, rule_id: &str) -> Option<&AstNode> {
        self.rules.get(rule_id)
    }

    pub fn remove_rule(&mut self, rule_id: &str) -> Option<AstNode> {
        self.rules.remove(rule_id)
    }

    /// Registered rule ids, sorted
    pub fn rule_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Combine registered rules, in the order given, into one tree.
    ///
    /// Uses the configured default connective when `connective` is `None`.
    /// The combined tree is held to `max_depth` like any built rule.
    pub fn combine_rules<S: AsRef<str>>(
        &self,
        rule_ids: &[S],
        connective: Option<Connective>,
    ) -> Result<AstNode> {
        let trees = rule_ids
            .iter()
            .map(|id| {
                let id = id.as_ref();
                self.rules
                    .get(id)
                    .cloned()
                    .ok_or_else(|| RuleError::RuleNotFound(id.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        combine_with_depth(
            trees,
            connective.unwrap_or(self.config.default_connective),
            self.config.max_depth,
        )
    }

    /// Evaluate a registered rule against a record
    pub fn evaluate_rule(&self, rule_id: &str, record: &Record) -> Result<bool> {
        let ast = self
            .rules
            .get(rule_id)
            .ok_or_else(|| RuleError::RuleNotFound(rule_id.to_string()))?;
        evaluate(ast, record)
    }

    /// Evaluate an ad-hoc tree against a record
    pub fn evaluate(&self, ast: &AstNode, record: &Record) -> Result<bool> {
        evaluate(ast, record)
    }
}
