//! Query error types.

use thiserror::Error;

use crate::index::IndexError;
use crate::storage::StorageError;

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while parsing, planning, or executing a query
#[derive(Debug, Error)]
pub enum QueryError {
    /// Malformed query document
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Operator not recognized; never silently ignored
    #[error("unknown operator: '{0}'")]
    UnknownOperator(String),

    /// No existing index covers the constrained fields; the query is
    /// unservable, never downgraded to a full scan
    #[error("no index covers the queried fields: {0}")]
    NoCoveringIndex(String),

    /// Sort field missing from the chosen index; the engine never performs
    /// an in-memory sort pass
    #[error("sort field '{field}' is not covered by index '{index}'")]
    SortFieldNotCovered {
        /// The offending sort field
        field: String,
        /// The chosen index
        index: String,
    },

    /// Malformed sort document
    #[error("invalid sort document: {0}")]
    InvalidSort(String),

    /// A result set was built without a datastore to fetch from
    #[error("result set requires a datastore")]
    MissingDatastore,

    /// Index catalog failure
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Index database failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}
