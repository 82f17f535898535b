//! Query engine configuration
//!
//! Deserialized from JSON; every field has a default so an empty object is a
//! valid configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// What an IN_TREE traversal does when the index fails part-way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeFailurePolicy {
    /// Fail the whole query with a backend error
    FailQuery,
    /// Use the folders collected before the failure
    ReturnPartial,
}

/// Query engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Page size when the caller gives no maxItems (default: 50)
    #[serde(default = "default_max_items")]
    pub default_max_items: usize,

    /// Offset when the caller gives no skipCount (default: 0)
    #[serde(default)]
    pub default_skip_count: usize,

    /// Levels below the root an IN_TREE traversal descends (default: 10)
    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: usize,

    /// Behaviour on index failure during IN_TREE traversal (default: fail_query)
    #[serde(default = "default_tree_failure_policy")]
    pub tree_failure_policy: TreeFailurePolicy,

    /// Function name selecting the relevance score (default: "SCORE")
    #[serde(default = "default_relevance_function")]
    pub relevance_function: String,

    /// Deadline for each index call in milliseconds, none when absent
    #[serde(default)]
    pub backend_timeout_ms: Option<u64>,
}

fn default_max_items() -> usize {
    50
}

fn default_max_tree_depth() -> usize {
    10
}

fn default_tree_failure_policy() -> TreeFailurePolicy {
    TreeFailurePolicy::FailQuery
}

fn default_relevance_function() -> String {
    "SCORE".to_string()
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_max_items: default_max_items(),
            default_skip_count: 0,
            max_tree_depth: default_max_tree_depth(),
            tree_failure_policy: default_tree_failure_policy(),
            relevance_function: default_relevance_function(),
            backend_timeout_ms: None,
        }
    }
}

impl QueryConfig {
    /// Parses and validates a JSON configuration
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: QueryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Rejects values the engine cannot work with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_max_items == 0 {
            return Err(ConfigError::Invalid {
                field: "default_max_items",
                reason: "must be greater than zero".into(),
            });
        }
        if self.max_tree_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_tree_depth",
                reason: "must be greater than zero".into(),
            });
        }
        if self.relevance_function.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "relevance_function",
                reason: "must not be blank".into(),
            });
        }
        Ok(())
    }

    pub fn with_max_tree_depth(mut self, depth: usize) -> Self {
        self.max_tree_depth = depth;
        self
    }

    pub fn with_tree_failure_policy(mut self, policy: TreeFailurePolicy) -> Self {
        self.tree_failure_policy = policy;
        self
    }

    pub fn with_default_max_items(mut self, max_items: usize) -> Self {
        self.default_max_items = max_items;
        self
    }

    /// Deadline for index calls
    pub fn backend_timeout(&self) -> Option<Duration> {
        self.backend_timeout_ms.map(Duration::from_millis)
    }

    /// Whether `function` names the relevance pseudo-column
    pub fn is_relevance_function(&self, function: &str) -> bool {
        let name = function.trim_end_matches("()");
        name.eq_ignore_ascii_case(&self.relevance_function)
    }
}
