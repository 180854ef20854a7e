//! On-disk state: data directory, TOML config and the SQLite backend.

mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, EngineConfig, LoggingConfig, ProgressConfig};
pub use database::Database;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `HOMEFLOW_DATA_DIR` wins when set. Otherwise `~/.config/homeflow/`, or
/// `~/.config/homeflow-dev/` when `HOMEFLOW_ENV=dev`.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("HOMEFLOW_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("HOMEFLOW_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("homeflow-dev")
            } else {
                base_dir.join("homeflow")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
