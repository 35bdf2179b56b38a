//! Bridge configuration model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SCRIPT_LOG_CAPACITY: usize = 1000;
pub const DEFAULT_ARCHIVE_CAPACITY: usize = 256;

/// Tunables for one execution supervisor. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    /// Script log entries kept per step by the buffered sink.
    pub script_log_capacity: usize,
    /// Archived step records kept before the oldest is evicted.
    pub archive_capacity: usize,
    /// Whether a scheduler constant beats a published value of the same name.
    pub constants_override_published: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            script_log_capacity: DEFAULT_SCRIPT_LOG_CAPACITY,
            archive_capacity: DEFAULT_ARCHIVE_CAPACITY,
            constants_override_published: true,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let config: BridgeConfig = serde_yaml::from_str("archiveCapacity: 8\n").unwrap();
        assert_eq!(config.archive_capacity, 8);
        assert_eq!(config.script_log_capacity, DEFAULT_SCRIPT_LOG_CAPACITY);
        assert!(config.constants_override_published);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(BridgeConfig::default()).unwrap();
        assert_eq!(json["scriptLogCapacity"], 1000);
        assert_eq!(json["constantsOverridePublished"], true);
    }
}
