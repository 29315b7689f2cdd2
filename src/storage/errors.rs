//! Storage error types for the index database.

use thiserror::Error;

/// Result type for index database operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by the SQLite index database
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying SQLite failure
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A transaction could not be committed or rolled back cleanly
    #[error("transaction failed: {0}")]
    Transaction(String),

    /// A SQL fragment was built with mismatched placeholders and parameters
    #[error("malformed SQL parts: {0}")]
    MalformedParts(String),
}
