//! Configuration for the soudan widget.
//!
//! Settings come from an optional JSON file; the credential is only ever
//! read from the environment and is never written back to disk.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the conversation service credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Main configuration for soudan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model identifier passed to the conversation service.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the conversation service API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Delay before the follow-up prompt, counted from the first user message.
    #[serde(default = "default_follow_up_delay_ms")]
    pub follow_up_delay_ms: u64,

    /// Color theme name.
    #[serde(default = "default_theme")]
    pub theme: String,

    /// Service credential (environment only).
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_model() -> String {
    "gemini-2.0-flash".into()
}

fn default_base_url() -> String {
    crate::gemini::DEFAULT_BASE_URL.into()
}

fn default_follow_up_delay_ms() -> u64 {
    3 * 60 * 1000
}

fn default_theme() -> String {
    "mocha".into()
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Load configuration from a file, falling back to defaults if it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// Default config file location (`<config_dir>/soudan/config.json`).
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("soudan").join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Read the credential from [`API_KEY_ENV`].
    #[must_use]
    pub fn with_env_credential(mut self) -> Self {
        self.api_key = std::env::var(API_KEY_ENV).ok();
        self
    }

    /// The credential, if one is set and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Follow-up delay as a [`Duration`].
    pub fn follow_up_delay(&self) -> Duration {
        Duration::from_millis(self.follow_up_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            follow_up_delay_ms: default_follow_up_delay_ms(),
            theme: default_theme(),
            api_key: None,
        }
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The platform has no user config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.follow_up_delay(), Duration::from_secs(180));
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"model":"gemini-1.5-pro"}"#).unwrap();
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.theme, "mocha");
        assert_eq!(config.follow_up_delay_ms, 180_000);
    }

    #[test]
    fn test_blank_credential_is_absent() {
        let config = Config {
            api_key: Some("   ".into()),
            ..Config::default()
        };
        assert!(config.api_key().is_none());

        let config = Config {
            api_key: Some(" key-123 ".into()),
            ..Config::default()
        };
        assert_eq!(config.api_key(), Some("key-123"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            follow_up_delay_ms: 5_000,
            api_key: Some("secret".into()),
            ..Config::default()
        };
        config.save(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("secret"));

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.follow_up_delay_ms, 5_000);
        assert!(loaded.api_key.is_none());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.model, Config::default().model);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }
}
