//! Runtime configuration resolved from the environment.
//!
//! | Variable                | Default                          |
//! |-------------------------|----------------------------------|
//! | `STUDYTRACK_DB_PATH`    | `<temp dir>/studytrack.sqlite3`  |
//! | `STUDYTRACK_LOG_LEVEL`  | `default_log_level()`            |
//! | `STUDYTRACK_LOG_DIR`    | unset: file logging disabled     |
//! | `STUDYTRACK_DAILY_GOAL` | `DEFAULT_DAILY_GOAL`             |
//!
//! Blank values count as unset.

use crate::logging::default_log_level;
use crate::service::dashboard_service::DEFAULT_DAILY_GOAL;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "STUDYTRACK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "STUDYTRACK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "STUDYTRACK_LOG_DIR";
pub const ENV_DAILY_GOAL: &str = "STUDYTRACK_DAILY_GOAL";

const DEFAULT_DB_FILE_NAME: &str = "studytrack.sqlite3";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber { key, value } => {
                write!(f, "{key} must be a non-negative integer, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings shared by every front end of the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging is off when `None`.
    pub log_dir: Option<PathBuf>,
    pub daily_goal: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            daily_goal: DEFAULT_DAILY_GOAL,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config.log_dir = read(ENV_LOG_DIR).map(PathBuf::from);
        if let Some(goal) = read(ENV_DAILY_GOAL) {
            config.daily_goal = goal.parse().map_err(|_| ConfigError::InvalidNumber {
                key: ENV_DAILY_GOAL,
                value: goal.clone(),
            })?;
        }
        Ok(config)
    }
}
