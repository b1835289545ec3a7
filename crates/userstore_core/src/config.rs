//! Runtime configuration for store hosts.
//!
//! # Responsibility
//! - Resolve database location and logging settings from the environment.
//! - Open the configured database with the standard bootstrap.
//!
//! # Invariants
//! - Missing `db_path` selects an in-memory database.
//! - Blank environment values are treated as unset.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::default_log_level;
use rusqlite::Connection;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "USERSTORE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "USERSTORE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "USERSTORE_LOG_DIR";

/// Resolved settings for one store process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// SQLite file path; `None` means in-memory.
    pub db_path: Option<PathBuf>,
    /// Log level passed to `init_logging`.
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logs.
    pub log_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl StoreConfig {
    /// Reads `USERSTORE_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            db_path: read(ENV_DB_PATH).map(PathBuf::from),
            log_level: read(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
        }
    }

    /// Opens the configured database and applies migrations.
    pub fn open_connection(&self) -> DbResult<Connection> {
        match &self.db_path {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }
}
