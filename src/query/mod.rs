//! Query subsystem.
//!
//! Parses MongoDB-style conjunctive query documents, selects a covering
//! index, compiles to parameterized SQL over the index tables, and
//! materializes results lazily from the document store.

mod ast;
mod errors;
mod executor;
mod planner;
mod result;
mod sql;

pub use ast::{
    parse_sort_document, Constraint, FieldClause, FindOptions, ParsedQuery, SortDirection,
    SortField,
};
pub use errors::{QueryError, QueryResult};
pub use executor::QueryExecutor;
pub use planner::choose_index_for_query;
pub use result::{Documents, ResultSet, ResultSetBuilder};
pub use sql::{select_statement_for_query, where_parts_for_query};
