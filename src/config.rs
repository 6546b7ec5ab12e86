//! Configuration for the oximeter bot.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the oximeter sensor API
    pub sensor_base_url: String,

    /// Base URL of the chart rendering service
    pub chart_base_url: String,

    /// Telegram bot token; the `BOT_TOKEN` environment variable overrides it
    pub bot_token: Option<String>,

    /// Interval between live-monitoring polls
    #[serde(with = "duration_serde")]
    pub poll_interval: Duration,

    /// Maximum sample age still reported as a live reading
    #[serde(with = "duration_serde")]
    pub max_sample_age: Duration,

    /// Timeout for outbound HTTP requests
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sensor_base_url: "https://oximeter-api.herokuapp.com".to_string(),
            chart_base_url: "https://quickchart.io".to_string(),
            bot_token: None,
            poll_interval: Duration::from_secs(1),
            // Matches the sensor's own sampling cadence.
            max_sample_age: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("oximeter-bot")
            .join("config.json")
    }

    /// Resolve the bot token: environment variable first, then config file.
    pub fn resolve_token(&self) -> Option<String> {
        std::env::var("BOT_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.bot_token.clone())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
