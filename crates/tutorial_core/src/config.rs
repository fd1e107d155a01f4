//! Store configuration loaded from the process environment.
//!
//! # Invariants
//! - Missing variables fall back to defaults; malformed ones are errors.
//! - `db_path == None` selects an in-memory database.

use crate::db::DEFAULT_BUSY_TIMEOUT;
use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "TUTORIAL_DB_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "TUTORIAL_BUSY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "TUTORIAL_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TUTORIAL_LOG_DIR";

/// Largest busy timeout SQLite accepts: its handler counts milliseconds in a
/// C `int`.
pub const MAX_BUSY_TIMEOUT_MS: u64 = i32::MAX as u64;

/// Configuration error for one environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub message: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} value `{}`: {}", self.key, self.value, self.message)
    }
}

impl Error for ConfigError {}

/// Settings needed to open the tutorial store and start logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite file path. `None` opens an in-memory database.
    pub db_path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
    pub log_level: String,
    /// Log directory. Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT.as_millis() as u64,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl StoreConfig {
    /// Loads configuration from `TUTORIAL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = non_blank(lookup(ENV_DB_PATH)) {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(raw) = non_blank(lookup(ENV_BUSY_TIMEOUT_MS)) {
            let millis = raw.parse::<u64>().map_err(|err| ConfigError {
                key: ENV_BUSY_TIMEOUT_MS,
                value: raw.clone(),
                message: err.to_string(),
            })?;
            if millis > MAX_BUSY_TIMEOUT_MS {
                return Err(ConfigError {
                    key: ENV_BUSY_TIMEOUT_MS,
                    value: raw,
                    message: format!("must be at most {MAX_BUSY_TIMEOUT_MS} milliseconds"),
                });
            }
            config.busy_timeout_ms = millis;
        }

        if let Some(level) = non_blank(lookup(ENV_LOG_LEVEL)) {
            config.log_level = level;
        }

        if let Some(dir) = non_blank(lookup(ENV_LOG_DIR)) {
            config.log_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    /// Busy timeout, capped at [`MAX_BUSY_TIMEOUT_MS`] for values that came
    /// in through deserialization rather than `from_lookup`.
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms.min(MAX_BUSY_TIMEOUT_MS))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}
