//! Loading bridge configuration from disk.

use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::config_dir;
use stepwire_util::path_from_env;

use crate::config::{BridgeConfig, validate_config};

pub const CONFIG_PATH_ENV: &str = "STEPWIRE_CONFIG_PATH";

/// Returns the default path for the bridge configuration file.
pub fn default_config_path() -> PathBuf {
    if let Some(path) = path_from_env(CONFIG_PATH_ENV) {
        return path;
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stepwire")
        .join("bridge.yaml")
}

/// Loads configuration from the default path.
pub fn load_config() -> anyhow::Result<BridgeConfig> {
    let path = default_config_path();
    load_config_from_path(&path)
}

/// Loads configuration from `path`. A missing file yields the defaults.
pub fn load_config_from_path(path: &Path) -> anyhow::Result<BridgeConfig> {
    if !path.exists() {
        return Ok(BridgeConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
    let config: BridgeConfig = if is_json {
        serde_json::from_str(&content)?
    } else if content.trim().is_empty() {
        BridgeConfig::default()
    } else {
        serde_yaml::from_str(&content)?
    };
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use stepwire_util::expand_tilde;

    use super::*;

    #[test]
    fn default_path_honors_environment_override() {
        let override_path = "~/custom/stepwire/bridge.yaml";
        temp_env::with_var(CONFIG_PATH_ENV, Some(override_path), || {
            assert_eq!(default_config_path(), expand_tilde(override_path));
        });
    }

    #[test]
    fn default_path_falls_back_to_config_dir() {
        temp_env::with_var_unset(CONFIG_PATH_ENV, || {
            let path = default_config_path();
            assert!(path.ends_with("stepwire/bridge.yaml"));
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from_path(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn loads_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("bridge.yaml");
        fs::write(&yaml_path, "scriptLogCapacity: 5\nconstantsOverridePublished: false\n").unwrap();
        let config = load_config_from_path(&yaml_path).unwrap();
        assert_eq!(config.script_log_capacity, 5);
        assert!(!config.constants_override_published);

        let json_path = dir.path().join("bridge.json");
        fs::write(&json_path, r#"{"archiveCapacity": 3}"#).unwrap();
        let config = load_config_from_path(&json_path).unwrap();
        assert_eq!(config.archive_capacity, 3);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "archiveCapacity: 0").unwrap();
        let error = load_config_from_path(file.path()).unwrap_err();
        assert!(error.to_string().contains("archiveCapacity"));
    }

    #[test]
    fn load_config_reads_the_overridden_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.yaml");
        fs::write(&path, "archiveCapacity: 2\n").unwrap();
        let path_text = path.to_string_lossy().into_owned();

        temp_env::with_var(CONFIG_PATH_ENV, Some(path_text.as_str()), || {
            assert_eq!(load_config().unwrap().archive_capacity, 2);
        });
    }
}
