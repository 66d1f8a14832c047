//! Engine configuration from environment variables.
//!
//! Values are read with a `CPUTOPO_` prefix. Malformed values fall back to
//! their defaults and are recorded, so an embedder can report every problem
//! at once instead of failing on the first.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Default expiration for memoized frequency and counter queries.
pub const DEFAULT_MEMO_EXPIRATION: Duration = Duration::from_millis(300);

/// Errors that can occur during environment variable parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// Invalid value for a variable.
    #[error("Invalid value for {var}: expected {expected}, got '{value}'")]
    InvalidValue {
        var: String,
        expected: String,
        value: String,
    },

    /// Invalid duration format.
    #[error("Invalid duration for {var}: {value}")]
    InvalidDuration { var: String, value: String },

    /// Invalid log level.
    #[error("Invalid log level for {var}: {value}")]
    InvalidLogLevel { var: String, value: String },
}

/// Type-safe environment variable parser.
///
/// Collects errors during parsing so all issues can be reported at once.
pub struct EnvParser {
    prefix: &'static str,
    errors: Vec<EnvError>,
}

impl EnvParser {
    /// Create a new parser with the CPUTOPO_ prefix.
    pub fn new() -> Self {
        Self {
            prefix: "CPUTOPO_",
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[EnvError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Take ownership of errors.
    pub fn take_errors(&mut self) -> Vec<EnvError> {
        std::mem::take(&mut self.errors)
    }

    fn var_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Get a boolean value with default.
    ///
    /// Accepts: 1, true, yes, on (for true)
    ///          0, false, no, off, "" (for false)
    pub fn get_bool(&mut self, name: &str, default: bool) -> bool {
        let var_name = self.var_name(name);
        let Ok(value) = env::var(&var_name) else {
            return default;
        };
        match value.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" | "" => false,
            _ => {
                self.errors.push(EnvError::InvalidValue {
                    var: var_name,
                    expected: "boolean (true/false/1/0/yes/no)".to_string(),
                    value,
                });
                default
            }
        }
    }

    /// Get a log level value with validation.
    pub fn get_log_level(&mut self, name: &str, default: &str) -> String {
        let var_name = self.var_name(name);
        let Ok(value) = env::var(&var_name) else {
            return default.to_string();
        };
        let lower = value.to_lowercase();
        match lower.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" | "off" => lower,
            _ => {
                self.errors.push(EnvError::InvalidLogLevel {
                    var: var_name,
                    value,
                });
                default.to_string()
            }
        }
    }

    /// Get an optional duration such as `300ms` or `2s`.
    ///
    /// `never` (or `none`) yields `None`, meaning no expiration.
    pub fn get_expiration(&mut self, name: &str, default: Option<Duration>) -> Option<Duration> {
        let var_name = self.var_name(name);
        let Ok(value) = env::var(&var_name) else {
            return default;
        };
        match value.trim().to_lowercase().as_str() {
            "never" | "none" => None,
            trimmed => match humantime::parse_duration(trimmed) {
                Ok(duration) => Some(duration),
                Err(_) => {
                    self.errors.push(EnvError::InvalidDuration {
                        var: var_name,
                        value,
                    });
                    default
                }
            },
        }
    }
}

impl Default for EnvParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings for a [`CentralProcessor`](crate::CentralProcessor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long memoized frequency and counter values stay valid.
    /// `None` caches them for the lifetime of the engine.
    pub memo_expiration: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            memo_expiration: Some(DEFAULT_MEMO_EXPIRATION),
        }
    }
}

impl EngineConfig {
    /// Read `CPUTOPO_MEMO_EXPIRATION`, returning the config together with
    /// any values that had to fall back to defaults.
    pub fn from_env() -> (Self, Vec<EnvError>) {
        let mut parser = EnvParser::new();
        let config = Self {
            memo_expiration: parser
                .get_expiration("MEMO_EXPIRATION", Some(DEFAULT_MEMO_EXPIRATION)),
        };
        (config, parser.take_errors())
    }

    pub fn with_memo_expiration(mut self, memo_expiration: Option<Duration>) -> Self {
        self.memo_expiration = memo_expiration;
        self
    }
}

#[cfg(test)]
pub(crate) fn env_test_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock, PoisonError};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}
