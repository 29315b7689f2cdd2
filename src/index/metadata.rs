//! Index metadata table and catalog.
//!
//! One metadata row per (index, field) pair; the table is the sole source of
//! truth for which indexes exist. The catalog is re-derived on every read so
//! it always reflects concurrent index creation and deletion.

use std::collections::BTreeMap;

use crate::storage::{Database, SqlParts};

use super::errors::{IndexError, IndexResult};

/// Name of the metadata table
pub const METADATA_TABLE: &str = "_t_quarry_index_metadata";

const INDEX_TABLE_PREFIX: &str = "_t_quarry_index_";

/// Returns the relational table name backing an index.
pub fn index_table_name(index_name: &str) -> String {
    format!("{INDEX_TABLE_PREFIX}{index_name}")
}

/// Returns the name of the SQL index over an index table's field columns.
pub fn index_index_name(index_name: &str) -> String {
    format!("{INDEX_TABLE_PREFIX}{index_name}_index")
}

/// Double-quotes an identifier for use in SQL text.
///
/// Field names are validated at index creation, so quoting never needs to
/// escape embedded quotes; it exists because nested paths contain dots.
pub(crate) fn quoted(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

/// Creates the metadata table when it does not exist yet.
pub fn ensure_metadata_table(database: &Database) -> IndexResult<()> {
    database.execute(&SqlParts::statement(format!(
        "CREATE TABLE IF NOT EXISTS {METADATA_TABLE} ( \
         index_name TEXT NOT NULL, \
         index_type TEXT NOT NULL, \
         field_name TEXT NOT NULL )"
    )))?;
    Ok(())
}

/// Reads the catalog: index name to ordered field list.
///
/// Always re-reads the metadata table; nothing is cached across calls.
pub fn list_indexes(database: &Database) -> IndexResult<BTreeMap<String, Vec<String>>> {
    ensure_metadata_table(database)?;
    let rows = database.query_rows(
        &SqlParts::statement(format!(
            "SELECT index_name, field_name FROM {METADATA_TABLE} ORDER BY rowid"
        )),
        |row| {
            let name: String = row.get(0)?;
            let field: String = row.get(1)?;
            Ok((name, field))
        },
    )?;

    let mut catalog: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, field) in rows {
        catalog.entry(name).or_default().push(field);
    }
    Ok(catalog)
}

/// Deletes an index: its metadata rows and its table, in one transaction.
pub fn delete_index(database: &Database, index_name: &str) -> IndexResult<()> {
    let catalog = list_indexes(database)?;
    if !catalog.contains_key(index_name) {
        return Err(IndexError::UnknownIndex(index_name.to_string()));
    }

    database.transaction(|db| {
        db.execute(&SqlParts::parts(
            format!("DELETE FROM {METADATA_TABLE} WHERE index_name = ?"),
            vec![serde_json::Value::String(index_name.to_string())],
        ))?;
        db.execute(&SqlParts::statement(format!(
            "DROP TABLE IF EXISTS {}",
            quoted(&index_table_name(index_name))
        )))?;
        Ok::<_, IndexError>(())
    })
}
