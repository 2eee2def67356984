//! Runtime configuration
//!
//! Resolution order for each setting:
//!
//! 1. Environment variable (`CASHBOOK_DB`, `CASHBOOK_UPLOAD_DIR`)
//! 2. Built-in default (`cashbook.db`, `tmp/`)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DB_ENV: &str = "CASHBOOK_DB";
pub const UPLOAD_DIR_ENV: &str = "CASHBOOK_UPLOAD_DIR";

const DEFAULT_DB_PATH: &str = "cashbook.db";
const DEFAULT_UPLOAD_DIR: &str = "tmp";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Directory uploaded CSV files are stored in before import
    pub upload_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
        }
    }
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create a config with explicit paths (useful for testing)
    pub fn with_paths(database_path: impl Into<PathBuf>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            upload_dir: upload_dir.into(),
        }
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            database_path: non_empty(DB_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            upload_dir: non_empty(UPLOAD_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
        }
    }
}
