//! Configuration for the catalog console client

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data source configuration
    #[serde(default)]
    pub source: SourceConfig,

    /// Directory for persisted client state (token, language)
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// How often the session watcher revalidates the stored token.
    /// Human-readable duration, e.g. "1m", "30s", "2m 30s".
    #[serde(default = "default_revalidate_interval")]
    pub revalidate_interval: String,

    /// Timeout applied to every HTTP request.
    #[serde(default = "default_http_timeout")]
    pub http_timeout: String,

    /// Log level filter string.
    /// Set via config file or CATCON_LOG_LEVEL env var. Overridden by RUST_LOG.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Where catalog data comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Live backend over HTTP
    Network {
        /// Base URL of the API, e.g. "https://api.example.com"
        base_url: String,
    },

    /// Built-in seeded fixture for development and demos
    Fixture,
}

// Default value functions for serde
fn default_state_dir() -> PathBuf {
    PathBuf::from("./.catalog_console")
}

fn default_revalidate_interval() -> String {
    "1m".to_string()
}

fn default_http_timeout() -> String {
    "30s".to_string()
}

fn default_log_level() -> String {
    "catalog_console=info".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Fixture
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            state_dir: default_state_dir(),
            revalidate_interval: default_revalidate_interval(),
            http_timeout: default_http_timeout(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // CATCON_SOURCE=fixture forces the fixture even when a base URL
        // is also set; otherwise a base URL selects the network source.
        let force_fixture = std::env::var("CATCON_SOURCE")
            .map(|v| v.eq_ignore_ascii_case("fixture"))
            .unwrap_or(false);
        if !force_fixture {
            if let Ok(url) = std::env::var("CATCON_BASE_URL") {
                config.source = SourceConfig::Network { base_url: url };
            }
        }

        if let Ok(dir) = std::env::var("CATCON_STATE_DIR") {
            config.state_dir = PathBuf::from(dir);
        }

        if let Ok(interval) = std::env::var("CATCON_REVALIDATE_INTERVAL") {
            config.revalidate_interval = interval;
        }

        if let Ok(timeout) = std::env::var("CATCON_HTTP_TIMEOUT") {
            config.http_timeout = timeout;
        }

        // Log level (runtime operational)
        if let Ok(level) = std::env::var("CATCON_LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Load configuration from file if it exists, otherwise from environment
    pub fn load() -> Self {
        // Try config file first
        if let Ok(path) = std::env::var("CATCON_CONFIG") {
            if let Ok(config) = Self::from_file(&path) {
                return config;
            }
        }

        // Try default config file locations
        for path in &["catalog_console.toml", "/etc/catalog_console/config.toml"] {
            if std::path::Path::new(path).exists() {
                if let Ok(config) = Self::from_file(path) {
                    return config;
                }
            }
        }

        // Fall back to environment variables
        Self::from_env()
    }

    /// Parsed revalidation interval. Falls back to the default on an
    /// unparseable value rather than refusing to start.
    pub fn revalidate_interval(&self) -> Duration {
        parse_duration_or(&self.revalidate_interval, Duration::from_secs(60))
    }

    /// Parsed HTTP request timeout.
    pub fn http_timeout(&self) -> Duration {
        parse_duration_or(&self.http_timeout, Duration::from_secs(30))
    }

    /// Base URL of the network source, if one is configured.
    pub fn base_url(&self) -> Option<&str> {
        match &self.source {
            SourceConfig::Network { base_url } => Some(base_url.as_str()),
            SourceConfig::Fixture => None,
        }
    }

    /// Serialize config to TOML string
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Persist the current config to a TOML file.
    pub fn persist_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

fn parse_duration_or(value: &str, fallback: Duration) -> Duration {
    match humantime::parse_duration(value) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(value, error = %e, "unparseable duration in config, using default");
            fallback
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
