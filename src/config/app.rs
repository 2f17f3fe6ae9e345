//! Application configuration structures.

use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::collector::{GithubFeedConfig, Schedule};

use super::validation::ConfigError;

// =============================================================================
// Constants
// =============================================================================

/// Default connection pool size.
pub const DEFAULT_POOL_SIZE: u32 = 4;

/// Default writer channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Query API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 8080).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

// =============================================================================
// Database Configuration
// =============================================================================

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path.
    pub path: String,

    /// Connection pool size for read operations (default: 4).
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// MPSC channel capacity for write commands (default: 1024).
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "octowatch.db".to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

// =============================================================================
// Feeds Configuration
// =============================================================================

/// Feed poller configurations grouped by upstream type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedsConfig {
    /// GitHub events feed pollers.
    #[serde(default)]
    pub github: Vec<GithubFeedConfig>,
}

impl FeedsConfig {
    /// Validate feed configurations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for feed in &self.github {
            if feed.name.is_empty() {
                return Err(ConfigError::Validation(
                    "feed name must not be empty".to_string(),
                ));
            }
            if !names.insert(feed.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate feed name: '{}'",
                    feed.name
                )));
            }
            if !feed.url.starts_with("http://") && !feed.url.starts_with("https://") {
                return Err(ConfigError::Validation(format!(
                    "feed '{}': url must be http(s), got '{}'",
                    feed.name, feed.url
                )));
            }
            if feed.event_types.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "feed '{}': event_types must not be empty",
                    feed.name
                )));
            }
            if feed.interval.is_some() && feed.cron.is_some() {
                return Err(ConfigError::Validation(format!(
                    "feed '{}': interval and cron are mutually exclusive",
                    feed.name
                )));
            }
            // Reject bad cron expressions here rather than at scheduler
            // registration, where the failure is opaque.
            if let Some(expr) = &feed.cron {
                Schedule::cron(expr).map_err(|e| {
                    ConfigError::Validation(format!("feed '{}': {}", feed.name, e))
                })?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Query API server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Feed poller configurations.
    #[serde(default)]
    pub feeds: FeedsConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::Validation(format!(
                "invalid server bind address: '{}'",
                self.server.bind
            ))
        })?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server port must be non-zero".to_string(),
            ));
        }

        if self.database.pool_size == 0 {
            return Err(ConfigError::Validation(
                "database pool_size must be positive".to_string(),
            ));
        }

        if self.database.channel_capacity == 0 {
            return Err(ConfigError::Validation(
                "database channel_capacity must be positive".to_string(),
            ));
        }

        self.feeds.validate()?;

        Ok(())
    }
}
