//! Bridge configuration.
//! Read from `~/.config/stepwire/bridge.yaml` unless `STEPWIRE_CONFIG_PATH` points elsewhere.

mod io;
mod model;
mod validation;

pub use io::{CONFIG_PATH_ENV, default_config_path, load_config, load_config_from_path};
pub use model::{BridgeConfig, ConfigError, DEFAULT_ARCHIVE_CAPACITY, DEFAULT_SCRIPT_LOG_CAPACITY};
pub use validation::validate_config;
