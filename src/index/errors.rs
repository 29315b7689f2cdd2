//! Index error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors raised while creating, listing, updating, or deleting indexes
#[derive(Debug, Error)]
pub enum IndexError {
    /// Field name failed validation
    #[error("invalid field name: '{0}'")]
    InvalidFieldName(String),

    /// Field list entry was neither a name nor a single-key direction map
    #[error("invalid field entry: {0}")]
    InvalidFieldEntry(String),

    /// The same field appeared twice in one index definition
    #[error("duplicate field in index definition: '{0}'")]
    DuplicateField(String),

    /// An index must cover at least one field
    #[error("index definition has no fields")]
    EmptyFieldList,

    /// Index name failed validation
    #[error("invalid index name: '{0}'")]
    InvalidIndexName(String),

    /// An index of this name exists with a different field list
    #[error("index '{name}' already exists with a different definition")]
    NameCollision {
        /// The colliding index name
        name: String,
    },

    /// The named index does not exist
    #[error("no index named '{0}'")]
    UnknownIndex(String),

    /// Index database failure; the enclosing transaction is rolled back
    #[error(transparent)]
    Storage(#[from] StorageError),
}
