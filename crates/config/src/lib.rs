//! Configuration loading, validation, and management for Rolecast.
//!
//! Loads configuration from `~/.rolecast/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.rolecast/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Role storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Injection engine timing
    #[serde(default)]
    pub engine: EngineConfig,

    /// Log output configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "file" or "memory"
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Storage file path (defaults to `~/.rolecast/storage.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// The well-known key the role sequence lives under
    #[serde(default = "default_storage_key")]
    pub key: String,
}

fn default_storage_backend() -> String {
    "file".into()
}
fn default_storage_key() -> String {
    "roles".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: None,
            key: default_storage_key(),
        }
    }
}

impl StorageConfig {
    /// Resolved storage file path.
    pub fn file_path(&self) -> PathBuf {
        match &self.path {
            Some(p) => PathBuf::from(p),
            None => AppConfig::config_dir().join("storage.json"),
        }
    }
}

/// Timing knobs for the injection engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How often to look for the prompt input while searching
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up searching after this long
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,

    /// How often to check for client-side navigation
    #[serde(default = "default_navigation_interval_ms")]
    pub navigation_interval_ms: u64,

    /// Wait after navigation before searching the new page
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    1_000
}
fn default_search_timeout_ms() -> u64 {
    30_000
}
fn default_navigation_interval_ms() -> u64 {
    500
}
fn default_settle_delay_ms() -> u64 {
    1_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            search_timeout_ms: default_search_timeout_ms(),
            navigation_interval_ms: default_navigation_interval_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }

    pub fn navigation_interval(&self) -> Duration {
        Duration::from_millis(self.navigation_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.rolecast/config.toml).
    ///
    /// Environment variables override the file:
    /// - `ROLECAST_STORAGE_PATH`
    /// - `ROLECAST_STORAGE_BACKEND`
    /// - `ROLECAST_LOG`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("ROLECAST_STORAGE_PATH") {
            self.storage.path = Some(path);
        }
        if let Some(backend) = lookup("ROLECAST_STORAGE_BACKEND") {
            self.storage.backend = backend;
        }
        if let Some(level) = lookup("ROLECAST_LOG") {
            self.logging.level = level;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".rolecast")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.storage.backend.as_str(), "file" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "unknown storage backend '{}' (expected \"file\" or \"memory\")",
                self.storage.backend
            )));
        }

        if self.storage.key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "storage.key must not be empty".into(),
            ));
        }

        let engine = &self.engine;
        if engine.poll_interval_ms == 0 || engine.navigation_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "engine intervals must be greater than zero".into(),
            ));
        }

        if engine.search_timeout_ms < engine.poll_interval_ms {
            return Err(ConfigError::ValidationError(
                "engine.search_timeout_ms must be at least engine.poll_interval_ms".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.backend, "file");
        assert_eq!(config.storage.key, "roles");
        assert_eq!(config.engine.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.engine.search_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.storage.key, config.storage.key);
        assert_eq!(parsed.engine.settle_delay_ms, config.engine.settle_delay_ms);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "[engine]\npoll_interval_ms = 250\n").unwrap();
        let config = AppConfig::load_from(tmp.path()).unwrap();
        assert_eq!(config.engine.poll_interval_ms, 250);
        assert_eq!(config.engine.search_timeout_ms, 30_000);
        assert_eq!(config.storage.backend, "file");
    }

    #[test]
    fn unparsable_file_reports_path() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "this is = = not toml").unwrap();
        let err = AppConfig::load_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains(&tmp.path().display().to_string()));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.storage.key, "roles");
    }

    #[test]
    fn zero_interval_rejected() {
        let mut config = AppConfig::default();
        config.engine.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn timeout_shorter_than_poll_rejected() {
        let mut config = AppConfig::default();
        config.engine.search_timeout_ms = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_backend_rejected() {
        let mut config = AppConfig::default();
        config.storage.backend = "sqlite".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sqlite"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| match name {
            "ROLECAST_STORAGE_PATH" => Some("/tmp/roles.json".into()),
            "ROLECAST_LOG" => Some("debug".into()),
            _ => None,
        });
        assert_eq!(config.storage.file_path(), PathBuf::from("/tmp/roles.json"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.storage.backend, "file");
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("poll_interval_ms = 1000"));
        assert!(toml_str.contains("key = \"roles\""));
    }
}
