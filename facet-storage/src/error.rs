//! Error types for the storage layer.

use facet_types::EntityId;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
///
/// Absence of an entity on the read path is not an error; readers return
/// `Ok(None)`. [`StorageError::NotFound`] is reserved for mutations
/// addressed to an entity that does not exist.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A single statement of a mutation plan failed.
    #[error("{operation} on {table} failed: {source}")]
    Statement {
        table: String,
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// An update was addressed to an entity with no main-table row.
    #[error("entity not found: {0}")]
    NotFound(EntityId),

    /// Invalid data.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl StorageError {
    pub(crate) fn stmt(table: &str, operation: &'static str, source: rusqlite::Error) -> Self {
        Self::Statement {
            table: table.to_string(),
            operation,
            source,
        }
    }
}
