//! Engine configuration loaded from environment variables.
//!
//! Invalid values fall back to defaults. Each fallback is kept as a warning so
//! callers can log it once logging is running.

use crate::logging::LogLevel;
use std::path::{Path, PathBuf};

pub const DB_PATH_VAR: &str = "LABSTOCK_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "LABSTOCK_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "LABSTOCK_LOG_DIR";

const DEFAULT_DB_PATH: &str = "labstock.sqlite3";

/// Runtime settings for the engine and its callers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub db_path: PathBuf,
    pub log_level: LogLevel,
    /// File logging is disabled when unset.
    pub log_dir: Option<PathBuf>,
    /// Fallbacks applied while loading.
    pub warnings: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: LogLevel::build_default(),
            log_dir: None,
            warnings: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Reads the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, treating blank values as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value_of = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = value_of(DB_PATH_VAR) {
            config.db_path = PathBuf::from(path);
        }

        if let Some(raw) = value_of(LOG_LEVEL_VAR) {
            match raw.parse::<LogLevel>() {
                Ok(level) => config.log_level = level,
                Err(err) => config.warnings.push(format!(
                    "{LOG_LEVEL_VAR}: {err}; using {}",
                    config.log_level
                )),
            }
        }

        if let Some(raw) = value_of(LOG_DIR_VAR) {
            if Path::new(&raw).is_absolute() {
                config.log_dir = Some(PathBuf::from(raw));
            } else {
                config.warnings.push(format!(
                    "{LOG_DIR_VAR} must be an absolute path, got `{raw}`; file logging disabled"
                ));
            }
        }

        config
    }
}
