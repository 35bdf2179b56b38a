use std::path::PathBuf;

use dirs_next::home_dir;

/// Expands a leading `~` to the user's home directory. Other paths are returned trimmed.
pub fn expand_tilde(path: &str) -> PathBuf {
    let p = path.trim();
    if p == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = p.strip_prefix("~/") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    if let Some(rest) = p.strip_prefix("~\\") {
        // Windows-style
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(p)
}

/// Reads a path from `env_var`, expanding `~`. Empty or unset variables yield `None`.
pub fn path_from_env(env_var: &str) -> Option<PathBuf> {
    let raw = std::env::var(env_var).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(expand_tilde(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_are_untouched() {
        assert_eq!(expand_tilde(" /etc/stepwire.yaml "), PathBuf::from("/etc/stepwire.yaml"));
    }

    #[test]
    fn tilde_prefix_resolves_under_home() {
        if let Some(home) = home_dir() {
            assert_eq!(expand_tilde("~/bridge.yaml"), home.join("bridge.yaml"));
        }
    }

    #[test]
    fn env_paths_ignore_blank_values() {
        temp_env::with_var("STEPWIRE_TEST_PATH", Some("   "), || {
            assert!(path_from_env("STEPWIRE_TEST_PATH").is_none());
        });
        temp_env::with_var("STEPWIRE_TEST_PATH", Some("/tmp/bridge.json"), || {
            assert_eq!(path_from_env("STEPWIRE_TEST_PATH"), Some(PathBuf::from("/tmp/bridge.json")));
        });
        temp_env::with_var_unset("STEPWIRE_TEST_PATH", || {
            assert!(path_from_env("STEPWIRE_TEST_PATH").is_none());
        });
    }
}
