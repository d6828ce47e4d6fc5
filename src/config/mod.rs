//! Engine configuration
//!
//! Limits applied when building rules and defaults used when combining them.
//! Loaded from JSON or, with the `python` feature, from a Python dict.

use serde::{Deserialize, Serialize};

use crate::condition::{parse_with_depth, AstNode, Connective};
use crate::error::{Result, RuleError};

/// Default cap on rule string length, in bytes
pub const DEFAULT_MAX_RULE_LENGTH: usize = 4096;
/// Default cap on tree height
pub const DEFAULT_MAX_DEPTH: usize = 64;
/// Default number of parsed rules kept per cache
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Configuration for a [`crate::engine::RuleEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Longest accepted rule string, in bytes
    pub max_rule_length: usize,
    /// Tallest accepted tree; a single condition has depth 1
    pub max_depth: usize,
    /// Connective used by `combine_rules` when the caller gives none
    pub default_connective: Connective,
    /// Route `build_rule` through the engine's parsed-rule cache
    pub cache_rules: bool,
    /// Most parsed rules the cache holds before evicting
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rule_length: DEFAULT_MAX_RULE_LENGTH,
            max_depth: DEFAULT_MAX_DEPTH,
            default_connective: Connective::And,
            cache_rules: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rule_length == 0 {
            return Err(RuleError::InvalidConfig(
                "max_rule_length must be positive".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(RuleError::InvalidConfig(
                "max_depth must be positive".to_string(),
            ));
        }
        if self.cache_rules && self.cache_capacity == 0 {
            return Err(RuleError::InvalidConfig(
                "cache_capacity must be positive when cache_rules is set".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a rule string under this config's length and depth limits
    pub fn parse_rule(&self, rule: &str) -> Result<AstNode> {
        self.check_length(rule)?;
        parse_with_depth(rule, self.max_depth)
    }

    /// Reject rule strings over the length limit before parsing them
    pub(crate) fn check_length(&self, rule: &str) -> Result<()> {
        if rule.len() > self.max_rule_length {
            return Err(RuleError::LimitExceeded(format!(
                "Rule is {} bytes, limit is {}",
                rule.len(),
                self.max_rule_length
            )));
        }
        Ok(())
    }

    pub(crate) fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(RuleError::LimitExceeded(format!(
                "Rule nests {} levels deep, limit is {}",
                depth, self.max_depth
            )));
        }
        Ok(())
    }
}

#[cfg(feature = "python")]
mod python {
    use super::EngineConfig;
    use crate::condition::Connective;
    use pyo3::types::{PyAnyMethods, PyDict, PyDictMethods};
    use pyo3::Bound;

    /// Helper to get optional key from a config dict
    fn get_opt<'py>(dict: &Bound<'py, PyDict>, name: &str) -> Option<Bound<'py, pyo3::PyAny>> {
        dict.get_item(name).ok().flatten()
    }

    /// Deserialize engine config from a Python dict; absent keys take defaults
    /// Expected format: {"max_rule_length": 4096, "max_depth": 64, "default_connective": "AND", "cache_rules": True, "cache_capacity": 1024}
    pub fn deserialize_engine_config(dict: &Bound<'_, PyDict>) -> pyo3::PyResult<EngineConfig> {
        let defaults = EngineConfig::default();

        let max_rule_length = match get_opt(dict, "max_rule_length") {
            Some(v) => v.extract()?,
            None => defaults.max_rule_length,
        };
        let max_depth = match get_opt(dict, "max_depth") {
            Some(v) => v.extract()?,
            None => defaults.max_depth,
        };
        let default_connective = match get_opt(dict, "default_connective") {
            Some(v) => v.extract::<String>()?.parse::<Connective>()?,
            None => defaults.default_connective,
        };
        let cache_rules = match get_opt(dict, "cache_rules") {
            Some(v) => v.extract()?,
            None => defaults.cache_rules,
        };
        let cache_capacity = match get_opt(dict, "cache_capacity") {
            Some(v) => v.extract()?,
            None => defaults.cache_capacity,
        };

        let config = EngineConfig {
            max_rule_length,
            max_depth,
            default_connective,
            cache_rules,
            cache_capacity,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "python")]
pub use python::deserialize_engine_config;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = EngineConfig::from_json(r#"{"max_depth": 8}"#).unwrap();
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.max_rule_length, DEFAULT_MAX_RULE_LENGTH);
        assert_eq!(config.default_connective, Connective::And);
        assert!(config.cache_rules);
    }

    #[test]
    fn test_connective_from_json() {
        let config = EngineConfig::from_json(r#"{"default_connective": "OR"}"#).unwrap();
        assert_eq!(config.default_connective, Connective::Or);

        assert!(matches!(
            EngineConfig::from_json(r#"{"default_connective": "XOR"}"#),
            Err(RuleError::DeserializationError(_))
        ));
    }

    #[test]
    fn test_zero_limits_are_invalid() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"max_rule_length": 0}"#),
            Err(RuleError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"max_depth": 0}"#),
            Err(RuleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_limits() {
        let config = EngineConfig {
            max_rule_length: 10,
            max_depth: 2,
            ..Default::default()
        };

        assert!(config.check_length("a > 1").is_ok());
        assert!(matches!(
            config.check_length("a > 1 AND b > 2"),
            Err(RuleError::LimitExceeded(_))
        ));
        assert!(config.check_depth(2).is_ok());
        assert!(matches!(config.check_depth(3), Err(RuleError::LimitExceeded(_))));
    }

    #[test]
    fn test_parse_rule_applies_limits() {
        let config = EngineConfig {
            max_depth: 2,
            ..Default::default()
        };
        assert_eq!(config.parse_rule("a > 1 OR b > 2").unwrap().leaf_count(), 2);
        assert!(matches!(
            config.parse_rule("a > 1 OR b > 2 OR c > 3"),
            Err(RuleError::LimitExceeded(_))
        ));

        let long_chain = vec!["a = 1"; 20_000].join(" AND ");
        assert!(matches!(
            EngineConfig::default().parse_rule(&long_chain),
            Err(RuleError::LimitExceeded(_))
        ));
    }

    #[test]
    fn test_cache_capacity() {
        let config = EngineConfig::from_json(r#"{"cache_capacity": 8}"#).unwrap();
        assert_eq!(config.cache_capacity, 8);
        assert_eq!(EngineConfig::default().cache_capacity, DEFAULT_CACHE_CAPACITY);

        assert!(matches!(
            EngineConfig::from_json(r#"{"cache_capacity": 0}"#),
            Err(RuleError::InvalidConfig(_))
        ));
        assert!(EngineConfig::from_json(r#"{"cache_capacity": 0, "cache_rules": false}"#).is_ok());
    }
}
