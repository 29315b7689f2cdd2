//! Index lifecycle subsystem.
//!
//! Defines, persists, and maintains compound field indexes: one metadata row
//! per field, one relational table per index, one SQL index over that
//! table's field columns. Population scans the datastore and writes one row
//! per document, so absent fields stay matchable.

mod creator;
mod errors;
mod metadata;

pub use creator::{
    create_index_index_statement, create_index_table_statement, derived_index_name,
    insert_metadata_statements, insert_statement_for_document, remove_directions_from_fields,
    valid_field_name, IndexCreator, IndexType,
};
pub use errors::{IndexError, IndexResult};
pub use metadata::{
    delete_index, ensure_metadata_table, index_index_name, index_table_name, list_indexes,
    METADATA_TABLE,
};

pub(crate) use metadata::quoted;
