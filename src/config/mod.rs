//! Configuration module.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Server settings (port, bind address)
//! - Database settings (path, pool size, channel capacity)
//! - Feed poller definitions

mod app;
mod validation;

pub use app::{AppConfig, DatabaseConfig, FeedsConfig, ServerConfig};
pub use validation::{expand_env_vars, ConfigError};

// Re-export constants
pub use app::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_POOL_SIZE};
