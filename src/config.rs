//! Monitor configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Monitor settings.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Reserved name of the monitor channel. The default deliberately omits
    /// the `#` sigil so the name cannot collide with a real network channel.
    #[serde(default = "default_channel_name")]
    pub channel_name: String,

    /// Topic set when the monitor channel is first created.
    #[serde(default = "default_channel_topic")]
    pub channel_topic: String,

    /// Seconds an admitted event's fingerprint suppresses repeats.
    #[serde(default = "default_dedup_window_secs")]
    pub dedup_window_secs: u64,

    /// Whether monitoring starts enabled for new connections.
    #[serde(default)]
    pub start_enabled: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            channel_name: default_channel_name(),
            channel_topic: default_channel_topic(),
            dedup_window_secs: default_dedup_window_secs(),
            start_enabled: false,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: MonitorConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic checks beyond what the parser enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_name.is_empty() {
            return Err(ConfigError::Invalid("channel_name must not be empty".into()));
        }
        if self.channel_name.contains(' ') || self.channel_name.contains(',') {
            return Err(ConfigError::Invalid(format!(
                "channel_name {:?} contains characters not allowed in channel names",
                self.channel_name
            )));
        }
        if self.dedup_window_secs == 0 {
            return Err(ConfigError::Invalid("dedup_window_secs must be at least 1".into()));
        }
        Ok(())
    }

    /// The dedup window as a [`Duration`].
    pub fn dedup_window(&self) -> Duration {
        Duration::from_secs(self.dedup_window_secs)
    }
}

fn default_channel_name() -> String {
    "chanmon".to_string()
}

fn default_channel_topic() -> String {
    "Channel Monitor - Real-time stream of all channel activity".to_string()
}

fn default_dedup_window_secs() -> u64 {
    5
}
