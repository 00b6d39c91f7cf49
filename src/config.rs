//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - rpcpipe.toml (default configuration)
//! - rpcpipe.local.toml (git-ignored local overrides)
//! - Environment variables (RPCPIPE_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # rpcpipe.toml
//! [dispatch]
//! max_request_size = 1048576
//! max_reply_size = 4280
//!
//! [registry]
//! max_interfaces = 64
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! RPCPIPE_DISPATCH__MAX_REPLY_SIZE=65536
//! RPCPIPE_LOGGING__FORMAT=json
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dispatcher limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Largest request stub data accepted, in bytes. 0 = no limit.
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,

    /// Largest reply stub data produced, in bytes. 0 = no limit.
    #[serde(default = "default_max_reply_size")]
    pub max_reply_size: usize,
}

/// Interface registry settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Maximum number of registered interfaces (0 = unlimited)
    #[serde(default)]
    pub max_interfaces: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or env-filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log file path. Logs go to stderr when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

// Default value functions
fn default_max_request_size() -> usize {
    16 * 1024 * 1024 // 16 MB
}
fn default_max_reply_size() -> usize {
    16 * 1024 * 1024
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Merges in order:
    /// 1. rpcpipe.toml (base configuration)
    /// 2. rpcpipe.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (RPCPIPE_* prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("rpcpipe.toml"))
            .merge(Toml::file("rpcpipe.local.toml"))
            .merge(Env::prefixed("RPCPIPE_").split("__"))
            .extract()
    }

    /// Load configuration from specific file path
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("RPCPIPE_").split("__"))
            .extract()
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            max_request_size: default_max_request_size(),
            max_reply_size: default_max_reply_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.dispatch.max_request_size, 16 * 1024 * 1024);
        assert_eq!(config.dispatch.max_reply_size, 16 * 1024 * 1024);
        assert_eq!(config.registry.max_interfaces, 0);
    }

    #[test]
    fn test_default_logging_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();

        assert!(toml_str.contains("[dispatch]"));
        assert!(toml_str.contains("[registry]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let mut config = Config::default();
        config.dispatch.max_reply_size = 4280;
        config.registry.max_interfaces = 8;
        let toml_str = toml::to_string(&config).unwrap();
        let back: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.dispatch.max_reply_size, 4280);
        assert_eq!(back.registry.max_interfaces, 8);
        assert_eq!(back.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let back: Config = toml::from_str("[dispatch]\nmax_reply_size = 100\n").unwrap();
        assert_eq!(back.dispatch.max_reply_size, 100);
        assert_eq!(back.dispatch.max_request_size, 16 * 1024 * 1024);
        assert_eq!(back.registry.max_interfaces, 0);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let back: Config = toml::from_str("").unwrap();
        assert_eq!(back.logging.format, "text");
        assert_eq!(back.registry.max_interfaces, 0);
    }
}
