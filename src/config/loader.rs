use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::buffer::BUFFER_CAPACITY;
use crate::config::types::Config;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/chatcast/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("chatcast").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - If the file exists, parses it as TOML and validates.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The destination port is non-zero
    /// - The OSC address starts with '/'
    /// - The send interval is non-zero
    /// - The placeholder fits in the message buffer
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.destination.port == 0 {
            return Err(ConfigError::ValidationError {
                message: "destination.port must be non-zero".to_string(),
            });
        }

        if !self.destination.address.starts_with('/') {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "destination.address '{}' must start with '/'",
                    self.destination.address
                ),
            });
        }

        if self.broadcast.interval_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "broadcast.interval_ms must be non-zero".to_string(),
            });
        }

        let placeholder_len = self.broadcast.placeholder.len();
        if placeholder_len > BUFFER_CAPACITY {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "broadcast.placeholder is {} bytes, the buffer holds {}",
                    placeholder_len, BUFFER_CAPACITY
                ),
            });
        }

        Ok(())
    }
}
