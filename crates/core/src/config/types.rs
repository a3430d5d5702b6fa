use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::WordPressCatalogConfig;
use crate::scanner::ScannerConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub catalog: WordPressCatalogConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("wpaudit.db")
}
