use tracing::debug;

use crate::config::{BridgeConfig, ConfigError};

/// Rejects settings the supervisor cannot run with.
pub fn validate_config(config: &BridgeConfig) -> Result<(), ConfigError> {
    if config.script_log_capacity == 0 {
        return Err(ConfigError::invalid_field("scriptLogCapacity", "must be greater than zero"));
    }
    if config.archive_capacity == 0 {
        return Err(ConfigError::invalid_field("archiveCapacity", "must be greater than zero"));
    }
    debug!(
        script_log_capacity = config.script_log_capacity,
        archive_capacity = config.archive_capacity,
        "Validated bridge configuration"
    );
    Ok(())
}
