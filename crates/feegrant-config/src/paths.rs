//! Default config location
//!
//! - `$FEEGRANT_CONFIG` when set
//! - `$XDG_CONFIG_HOME/feegrant/grants.toml`
//! - `~/.config/feegrant/grants.toml`

use std::path::PathBuf;

/// Environment variable for overriding the config path
pub const FEEGRANT_CONFIG_ENV: &str = "FEEGRANT_CONFIG";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "grants.toml";

/// Application subdirectory name
const APP_DIR: &str = "feegrant";

/// Get the default config path, checking `$FEEGRANT_CONFIG` first
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(FEEGRANT_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_path_without_env()
}

/// Get the config path without checking the FEEGRANT_CONFIG env var.
pub fn config_path_without_env() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home)
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    // Last resort
    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_ends_with_filename() {
        let path = config_path_without_env();
        assert!(path.ends_with("feegrant/grants.toml"));
    }
}
