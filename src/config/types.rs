use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub destination: DestinationConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where rendered messages are sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Receiver host (default: 127.0.0.1).
    #[serde(default = "default_host")]
    pub host: String,
    /// Receiver UDP port (default: 9000).
    #[serde(default = "default_port")]
    pub port: u16,
    /// OSC address the message is posted to (default: /chatbox/input).
    #[serde(default = "default_address")]
    pub address: String,
    /// Flag sent alongside every message (default: true).
    #[serde(default = "default_open")]
    pub open: bool,
}

/// Send loop timing and initial buffer content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Delay between two sends in milliseconds (default: 5000).
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Buffer content at startup.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    /// How long `kill` waits for the worker before aborting it (default: 1000).
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Append-only record of worker failures.
    #[serde(default = "default_error_log")]
    pub error_log: PathBuf,
}

impl BroadcastConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9000
}

fn default_address() -> String {
    "/chatbox/input".to_string()
}

fn default_open() -> bool {
    true
}

fn default_interval_ms() -> u64 {
    5000
}

fn default_placeholder() -> String {
    crate::buffer::DEFAULT_PLACEHOLDER.to_string()
}

fn default_stop_timeout_ms() -> u64 {
    1000
}

fn default_error_log() -> PathBuf {
    PathBuf::from("output.log")
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            address: default_address(),
            open: default_open(),
        }
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            placeholder: default_placeholder(),
            stop_timeout_ms: default_stop_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            error_log: default_error_log(),
        }
    }
}
