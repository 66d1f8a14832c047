//! Subscriber setup for embedders.
//!
//! The engine only emits `tracing` events; installing a subscriber is left to
//! the application. This module offers the usual setup so embedders do not
//! have to repeat it.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{EnvError, EnvParser};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("failed to install tracing subscriber: {0}")]
    Init(String),
}

/// How log output should look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `cputopo=debug`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    pub ansi: bool,
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            json: false,
            ansi: true,
        }
    }

    /// Read `CPUTOPO_LOG_LEVEL` and `CPUTOPO_LOG_JSON`, returning the config
    /// together with any values that had to fall back to defaults.
    pub fn from_env(default_level: &str) -> (Self, Vec<EnvError>) {
        let mut parser = EnvParser::new();
        let level = parser.get_log_level("LOG_LEVEL", default_level);
        let config = Self::new(level).with_json(parser.get_bool("LOG_JSON", false));
        (config, parser.take_errors())
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        if json {
            self.ansi = false;
        }
        self
    }

    /// Build the filter, preferring `RUST_LOG` when it is set.
    pub fn filter(&self) -> Result<EnvFilter, LoggingError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.level).map_err(|e| LoggingError::InvalidFilter {
            filter: self.level.clone(),
            reason: e.to_string(),
        })
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

/// Install a global subscriber writing to stderr.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let filter = config.filter()?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(config.ansi)
                    .with_target(true)
                    .compact(),
            )
            .try_init()
    };

    result.map_err(|e| LoggingError::Init(e.to_string()))
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use crate::config::env_test_lock;
    use std::env;

    #[test]
    fn test_log_config_from_env() {
        let _guard = env_test_lock();
        // SAFETY: Tests are serialized via env_test_lock
        unsafe {
            env::set_var("CPUTOPO_LOG_LEVEL", "warn");
            env::set_var("CPUTOPO_LOG_JSON", "yes");
        }

        let (config, errors) = LogConfig::from_env("info");

        assert_eq!(config.level, "warn");
        assert!(config.json);
        assert!(errors.is_empty());

        // SAFETY: Tests are serialized via env_test_lock
        unsafe {
            env::remove_var("CPUTOPO_LOG_LEVEL");
            env::remove_var("CPUTOPO_LOG_JSON");
        }
    }

    #[test]
    fn test_with_json_disables_ansi() {
        let config = LogConfig::new("debug").with_json(true);
        assert!(config.json);
        assert!(!config.ansi);
        assert_eq!(config.clone().with_level("trace").level, "trace");
    }

    #[test]
    fn test_invalid_filter_is_reported() {
        let _guard = env_test_lock();
        if env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LogConfig::new("cputopo=loudest");
        assert!(matches!(
            config.filter(),
            Err(LoggingError::InvalidFilter { .. })
        ));
    }
}
