use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::feed::{is_valid_timestamp_format, DEFAULT_FEED_CAPACITY, DEFAULT_TIMESTAMP_FORMAT};
use crate::poll::countdown::DEFAULT_PERIOD_SECS;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8001";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Optional colour overrides, as `#RRGGBB` or `#RGB`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ThemeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dog: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_dim: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Backend base URL; `/next-image/` is appended
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Seconds between normal fetch attempts
    #[serde(default = "default_period_secs")]
    pub period_secs: u32,

    /// Images kept per category
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,

    /// Whole-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// strftime format for capture timestamps
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    #[serde(default)]
    pub theme: ThemeConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_period_secs() -> u32 {
    DEFAULT_PERIOD_SECS
}

fn default_feed_capacity() -> usize {
    DEFAULT_FEED_CAPACITY
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            period_secs: default_period_secs(),
            feed_capacity: default_feed_capacity(),
            request_timeout_secs: default_request_timeout_secs(),
            timestamp_format: default_timestamp_format(),
            theme: ThemeConfig::default(),
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("pawpoll");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match Self::parse(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
            return Ok(AppConfig::default());
        }

        let config = AppConfig::default();
        if let Err(e) = config.save() {
            tracing::warn!("Could not write default config: {}", e);
        }
        Ok(config)
    }

    /// Parse TOML content and clamp out-of-range values
    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config.sanitized())
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let content = toml::to_string_pretty(&self.clone().sanitized())?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Clamp numbers to usable minimums and fill blank strings with defaults
    pub fn sanitized(mut self) -> Self {
        if self.period_secs == 0 {
            tracing::warn!("period_secs must be at least 1, using 1");
            self.period_secs = 1;
        }
        if self.feed_capacity == 0 {
            tracing::warn!("feed_capacity must be at least 1, using 1");
            self.feed_capacity = 1;
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
        if self.base_url.trim().is_empty() {
            self.base_url = default_base_url();
        }
        if self.timestamp_format.trim().is_empty() {
            self.timestamp_format = default_timestamp_format();
        } else if !is_valid_timestamp_format(&self.timestamp_format) {
            tracing::warn!(
                "Invalid timestamp_format {:?}, using {:?}",
                self.timestamp_format,
                DEFAULT_TIMESTAMP_FORMAT
            );
            self.timestamp_format = default_timestamp_format();
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig {
            base_url: "http://classifier.local:8001".to_string(),
            period_secs: 30,
            feed_capacity: 5,
            request_timeout_secs: 20,
            timestamp_format: "%I:%M:%S %p".to_string(),
            theme: ThemeConfig {
                cat: Some("#FFC107".to_string()),
                ..ThemeConfig::default()
            },
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = AppConfig::parse("base_url = \"http://example.test\"\n").unwrap();
        assert_eq!(config.base_url, "http://example.test");
        assert_eq!(config.period_secs, 60);
        assert_eq!(config.feed_capacity, 10);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.theme, ThemeConfig::default());
    }

    #[test]
    fn test_zero_values_clamped() {
        let config = AppConfig::parse("period_secs = 0\nfeed_capacity = 0\nbase_url = \"  \"\n").unwrap();
        assert_eq!(config.period_secs, 1);
        assert_eq!(config.feed_capacity, 1);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_invalid_timestamp_format_replaced() {
        let config = AppConfig::parse("timestamp_format = \"%Q\"\n").unwrap();
        assert_eq!(config.timestamp_format, DEFAULT_TIMESTAMP_FORMAT);

        let config = AppConfig::parse("timestamp_format = \"%\"\n").unwrap();
        assert_eq!(config.timestamp_format, DEFAULT_TIMESTAMP_FORMAT);

        let config = AppConfig::parse("timestamp_format = \"%I:%M %p\"\n").unwrap();
        assert_eq!(config.timestamp_format, "%I:%M %p");
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(AppConfig::parse("period_secs = \"soon\"").is_err());
    }
}
