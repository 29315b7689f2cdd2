//! quarrydb - a covering-index query engine for opaque document stores
//!
//! Documents live in an external store addressable only by id. quarrydb
//! maintains SQLite-backed compound indexes over declared document fields
//! and answers MongoDB-style conjunctive queries by selecting a covering
//! index, compiling the query to parameterized SQL, and materializing the
//! matching documents lazily.

pub mod datastore;
pub mod document;
pub mod engine;
pub mod index;
pub mod observability;
pub mod query;
pub mod storage;

pub use datastore::{DocumentRevision, DocumentStore, MemoryDatastore};
pub use engine::{EngineConfig, QueryEngine};
pub use query::{FindOptions, QueryError, QueryResult, ResultSet, SortField};
pub use storage::{Database, SqlParts};
