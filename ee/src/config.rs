//! Emitter configuration and the process-wide listener threshold

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

static DEFAULT_MAX_LISTENERS: AtomicI64 = AtomicI64::new(crate::DEFAULT_MAX_LISTENERS);

/// Process-wide fallback threshold used by emitters without an override
///
/// Read on every `max_listeners()` call, so changing it affects existing
/// emitters that have no instance override.
pub fn default_max_listeners() -> i64 {
    DEFAULT_MAX_LISTENERS.load(Ordering::Relaxed)
}

/// Replace the process-wide fallback threshold. Values <= 0 disable the warning.
pub fn set_default_max_listeners(n: i64) {
    debug!(n, "set_default_max_listeners");
    DEFAULT_MAX_LISTENERS.store(n, Ordering::Relaxed);
}

/// Emitter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitterConfig {
    /// Process-wide default installed by [`EmitterConfig::apply`]
    #[serde(default = "default_default_max_listeners")]
    pub default_max_listeners: i64,

    /// Instance override applied by [`crate::Emitter::with_config`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_listeners: Option<i64>,
}

fn default_default_max_listeners() -> i64 {
    crate::DEFAULT_MAX_LISTENERS
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            default_max_listeners: default_default_max_listeners(),
            max_listeners: None,
        }
    }
}

impl EmitterConfig {
    /// Load configuration with fallback chain
    ///
    /// Explicit path, then `./eventemitter.yml`, then
    /// `<config_dir>/eventemitter/config.yml`, then defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let default_paths = [
            Some(PathBuf::from("eventemitter.yml")),
            dirs::config_dir().map(|p| p.join("eventemitter").join("config.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::load_from_file(path);
            }
        }

        debug!("EmitterConfig::load: no config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: EmitterConfig = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        debug!(path = %path.display(), ?config, "EmitterConfig::load_from_file");
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Install `default_max_listeners` as the process-wide default
    pub fn apply(&self) {
        set_default_max_listeners(self.default_max_listeners);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmitterConfig::default();
        assert_eq!(config.default_max_listeners, 10);
        assert_eq!(config.max_listeners, None);
    }

    #[test]
    fn test_parse_partial_yaml() {
        let config: EmitterConfig = serde_yaml::from_str("max_listeners: 3\n").unwrap();
        assert_eq!(config.default_max_listeners, 10);
        assert_eq!(config.max_listeners, Some(3));
    }

    #[test]
    fn test_parse_negative_threshold() {
        let config: EmitterConfig = serde_yaml::from_str("default_max_listeners: -1\n").unwrap();
        assert_eq!(config.default_max_listeners, -1);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        let config = EmitterConfig {
            default_max_listeners: 25,
            max_listeners: Some(2),
        };

        config.save(&path).unwrap();
        let loaded = EmitterConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nope.yml");
        let err = EmitterConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }
}
