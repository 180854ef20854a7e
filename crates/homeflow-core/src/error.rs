//! Core error types for homeflow-core.
//!
//! This module defines the error hierarchy using thiserror. Collaborator
//! failures surface as [`StoreError`] and are propagated unchanged through
//! the engine; domain failures (unknown activity log, unknown task) get
//! their own [`CoreError`] variants.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for homeflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Collaborator (store) errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Closing an activity log that does not exist (or belongs to another user)
    #[error("activity log not found: {0}")]
    ActivityLogNotFound(String),

    /// An activity log can only be closed once
    #[error("activity log already completed: {0}")]
    LogAlreadyCompleted(String),

    /// Task id missing from the catalog
    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// Custom task edited or deleted by someone other than its owner
    #[error("user '{user_id}' is not allowed to modify task '{task_id}'")]
    NotAuthorized { user_id: String, task_id: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the collaborator stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// A stored record could not be decoded
    #[error("Corrupt record in {table}: {message}")]
    CorruptRecord { table: &'static str, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// The record changed since it was read
    #[error("Concurrent update of {0}")]
    Conflict(String),

    /// Backend refused the operation (used by test doubles and remote backends)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Mood outside the 1..=5 scale
    #[error("Mood value {0} is outside the 1-5 scale")]
    MoodOutOfRange(i64),

    /// Empty required field
    #[error("Field '{0}' must not be empty")]
    EmptyField(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy
                ) =>
            {
                StoreError::Locked
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Store(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
