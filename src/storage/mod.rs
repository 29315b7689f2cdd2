//! Index database subsystem.
//!
//! Owns the SQLite connection holding index tables plus metadata, and the
//! `SqlParts` value type the statement builders compose.
//!
//! All index-table mutation runs inside `Database::transaction`; reads run
//! against the same serialized connection, so a query sees a consistent
//! pre- or post-mutation state, never a partial one.

mod database;
mod errors;
mod sql;

pub use database::Database;
pub use errors::{StorageError, StorageResult};
pub use sql::SqlParts;
