//! Index creation and population.
//!
//! `ensure_indexed` validates the field list, derives a name when none is
//! given, and materializes the index in a single transaction: metadata rows,
//! index table, SQL index over the field columns, then one row per current
//! document. The statement builders are pure functions so the generated DDL
//! and DML are testable without a database.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::datastore::{DocumentRevision, DocumentStore};
use crate::document::extract_value;
use crate::observability::{Logger, Severity};
use crate::storage::{Database, SqlParts};

use super::errors::{IndexError, IndexResult};
use super::metadata::{
    ensure_metadata_table, index_index_name, index_table_name, list_indexes, quoted,
    METADATA_TABLE,
};

/// Kind of index. Only JSON field indexes exist today; the type is persisted
/// with the metadata so other kinds can be introduced without a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexType {
    /// Compound index over extracted JSON field values
    #[default]
    Json,
}

impl IndexType {
    /// Returns the string persisted in the metadata table
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexType::Json => "json",
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[a-zA-Z_][a-zA-Z0-9_]*$").expect("static pattern"))
}

fn index_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[a-zA-Z][a-zA-Z0-9_]*$").expect("static pattern"))
}

/// Validates a field name: every dot-separated segment must be a plain
/// identifier, so empty segments and `$`-prefixed names are rejected.
/// Pure predicate, no side effects.
pub fn valid_field_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(|segment| segment_pattern().is_match(segment))
}

/// Normalizes a field list to bare names, preserving order.
///
/// Accepts entries that are either field-name strings or single-key maps of
/// field name to sort direction; direction is irrelevant to index structure
/// and is discarded.
pub fn remove_directions_from_fields(fields: &[Value]) -> IndexResult<Vec<String>> {
    let mut names = Vec::with_capacity(fields.len());
    for entry in fields {
        match entry {
            Value::String(name) => names.push(name.clone()),
            Value::Object(map) if map.len() == 1 => {
                let name = map.keys().next().expect("len checked");
                names.push(name.clone());
            }
            other => {
                return Err(IndexError::InvalidFieldEntry(other.to_string()));
            }
        }
    }
    Ok(names)
}

/// Derives a deterministic index name from a normalized field list, so
/// repeated `ensure_indexed` calls without an explicit name are idempotent.
pub fn derived_index_name(field_names: &[String]) -> String {
    let joined = field_names.join("_").replace('.', "_");
    format!("idx_{joined}")
}

/// Returns the metadata insert statements for an index, one per field.
pub fn insert_metadata_statements(
    index_name: &str,
    index_type: IndexType,
    field_names: &[String],
) -> Vec<SqlParts> {
    field_names
        .iter()
        .map(|field| {
            SqlParts::parts(
                format!(
                    "INSERT INTO {METADATA_TABLE} \
                     (index_name, index_type, field_name) VALUES (?, ?, ?)"
                ),
                vec![json!(index_name), json!(index_type.as_str()), json!(field)],
            )
        })
        .collect()
}

/// Returns the statement creating an index table: document id and revision
/// marker columns plus one untyped column per field.
pub fn create_index_table_statement(index_name: &str, field_names: &[String]) -> SqlParts {
    let mut columns = vec![
        "\"_id\" NOT NULL".to_string(),
        "\"_rev\" NOT NULL".to_string(),
    ];
    columns.extend(field_names.iter().map(|field| quoted(field)));
    SqlParts::statement(format!(
        "CREATE TABLE {} ( {} )",
        quoted(&index_table_name(index_name)),
        columns.join(", ")
    ))
}

/// Returns the statement creating the SQL index over the field columns of an
/// index table, for lookup performance.
pub fn create_index_index_statement(index_name: &str, field_names: &[String]) -> SqlParts {
    let columns: Vec<String> = field_names.iter().map(|field| quoted(field)).collect();
    SqlParts::statement(format!(
        "CREATE INDEX {} ON {} ( {} )",
        quoted(&index_index_name(index_name)),
        quoted(&index_table_name(index_name)),
        columns.join(", ")
    ))
}

/// Returns the insert statement for one document's index row.
///
/// A row is written even when every field is absent, so "field missing" is a
/// matchable condition for existence queries. Absent fields and non-scalar
/// values land as SQL NULL.
pub fn insert_statement_for_document(
    index_name: &str,
    field_names: &[String],
    document: &DocumentRevision,
) -> SqlParts {
    let mut columns = vec![quoted("_id"), quoted("_rev")];
    let mut parameters = vec![json!(document.id), json!(document.rev)];
    for field in field_names {
        columns.push(quoted(field));
        parameters.push(indexable_value(extract_value(field, &document.body)));
    }
    let placeholders: Vec<&str> = parameters.iter().map(|_| "?").collect();
    SqlParts::parts(
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quoted(&index_table_name(index_name)),
            columns.join(", "),
            placeholders.join(", ")
        ),
        parameters,
    )
}

/// Maps an extracted value to its index-column representation: scalars are
/// stored as-is, absence and non-scalar values as SQL NULL.
fn indexable_value(extracted: Option<&Value>) -> Value {
    match extracted {
        Some(value @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => value.clone(),
        _ => Value::Null,
    }
}

/// Creates and maintains indexes for one datastore / index database pair.
pub struct IndexCreator<'a, S: DocumentStore> {
    database: &'a Database,
    datastore: &'a S,
    logger: Logger,
}

impl<'a, S: DocumentStore> IndexCreator<'a, S> {
    /// Creates a new index creator
    pub fn new(database: &'a Database, datastore: &'a S, logger: Logger) -> Self {
        Self {
            database,
            datastore,
            logger,
        }
    }

    /// Adds a single, possibly compound, index for the given field names.
    ///
    /// `fields` entries may be bare names or `{field: direction}` maps in the
    /// sort format; directions are stripped. With no `index_name` the name is
    /// derived from the field list. Returns the name of the created (or
    /// already existing, identical) index.
    ///
    /// Metadata insertion, table creation, SQL index creation, and population
    /// from the datastore run in one transaction; on any failure the index is
    /// not created.
    pub fn ensure_indexed(
        &self,
        fields: &[Value],
        index_name: Option<&str>,
        index_type: IndexType,
    ) -> IndexResult<String> {
        if fields.is_empty() {
            return Err(IndexError::EmptyFieldList);
        }

        let field_names = remove_directions_from_fields(fields)?;
        let mut seen = HashSet::new();
        for name in &field_names {
            if !valid_field_name(name) {
                return Err(IndexError::InvalidFieldName(name.clone()));
            }
            if !seen.insert(name.clone()) {
                return Err(IndexError::DuplicateField(name.clone()));
            }
        }

        let index_name = match index_name {
            Some(name) => {
                if !index_name_pattern().is_match(name) {
                    return Err(IndexError::InvalidIndexName(name.to_string()));
                }
                name.to_string()
            }
            None => derived_index_name(&field_names),
        };

        ensure_metadata_table(self.database)?;
        let catalog = list_indexes(self.database)?;
        if let Some(existing_fields) = catalog.get(&index_name) {
            if *existing_fields == field_names {
                return Ok(index_name);
            }
            return Err(IndexError::NameCollision { name: index_name });
        }

        self.database.transaction(|db| {
            for statement in insert_metadata_statements(&index_name, index_type, &field_names) {
                db.execute(&statement)?;
            }
            db.execute(&create_index_table_statement(&index_name, &field_names))?;
            db.execute(&create_index_index_statement(&index_name, &field_names))?;
            self.populate_index_table(db, &index_name, &field_names)
        })?;

        self.logger.log(
            Severity::Info,
            "index_created",
            &[
                ("index", &index_name),
                ("fields", &field_names.join(",")),
                ("type", index_type.as_str()),
            ],
        );
        Ok(index_name)
    }

    /// Re-derives every index from the current documents.
    ///
    /// Each index is truncated and repopulated inside its own transaction, so
    /// the operation is idempotent and never duplicates rows.
    pub fn update_all_indexes(&self) -> IndexResult<()> {
        let catalog = list_indexes(self.database)?;
        for (index_name, field_names) in &catalog {
            self.database.transaction(|db| {
                db.execute(&SqlParts::statement(format!(
                    "DELETE FROM {}",
                    quoted(&index_table_name(index_name))
                )))?;
                self.populate_index_table(db, index_name, field_names)
            })?;
            self.logger.log(
                Severity::Trace,
                "index_updated",
                &[("index", index_name.as_str())],
            );
        }
        Ok(())
    }

    /// Inserts one index row per current document.
    fn populate_index_table(
        &self,
        database: &Database,
        index_name: &str,
        field_names: &[String],
    ) -> IndexResult<()> {
        let mut failure: Option<IndexError> = None;
        self.datastore.for_each_document(&mut |document| {
            if failure.is_some() {
                return;
            }
            let statement = insert_statement_for_document(index_name, field_names, document);
            if let Err(e) = database.execute(&statement) {
                failure = Some(e.into());
            }
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_field_names() {
        assert!(valid_field_name("name"));
        assert!(valid_field_name("pet.species"));
        assert!(valid_field_name("_id"));
        assert!(valid_field_name("_rev"));
        assert!(valid_field_name("a_b.c_d"));
    }

    #[test]
    fn test_invalid_field_names() {
        assert!(!valid_field_name(""));
        assert!(!valid_field_name("$type"));
        assert!(!valid_field_name("pet..species"));
        assert!(!valid_field_name(".species"));
        assert!(!valid_field_name("species."));
        assert!(!valid_field_name("na me"));
        assert!(!valid_field_name("1name"));
    }

    #[test]
    fn test_remove_directions() {
        let fields = vec![json!({"name": "asc"}), json!("age"), json!({"pet": "desc"})];
        let names = remove_directions_from_fields(&fields).unwrap();
        assert_eq!(names, vec!["name", "age", "pet"]);
    }

    #[test]
    fn test_remove_directions_rejects_malformed_entries() {
        let fields = vec![json!({"name": "asc", "age": "desc"})];
        assert!(matches!(
            remove_directions_from_fields(&fields),
            Err(IndexError::InvalidFieldEntry(_))
        ));

        let fields = vec![json!(42)];
        assert!(matches!(
            remove_directions_from_fields(&fields),
            Err(IndexError::InvalidFieldEntry(_))
        ));
    }

    #[test]
    fn test_derived_name_deterministic() {
        let fields = vec!["name".to_string(), "pet.species".to_string()];
        assert_eq!(derived_index_name(&fields), "idx_name_pet_species");
        assert_eq!(derived_index_name(&fields), derived_index_name(&fields));
    }

    #[test]
    fn test_metadata_statements() {
        let statements = insert_metadata_statements(
            "basic",
            IndexType::Json,
            &["name".to_string(), "age".to_string()],
        );
        assert_eq!(statements.len(), 2);
        for statement in &statements {
            assert!(statement.is_balanced());
            assert!(statement.sql().contains(METADATA_TABLE));
        }
        assert_eq!(
            statements[0].parameters(),
            &[json!("basic"), json!("json"), json!("name")]
        );
    }

    #[test]
    fn test_create_table_statement() {
        let statement =
            create_index_table_statement("basic", &["name".to_string(), "age".to_string()]);
        assert_eq!(
            statement.sql(),
            "CREATE TABLE \"_t_quarry_index_basic\" \
             ( \"_id\" NOT NULL, \"_rev\" NOT NULL, \"name\", \"age\" )"
        );
        assert!(statement.parameters().is_empty());
    }

    #[test]
    fn test_create_index_statement() {
        let statement =
            create_index_index_statement("basic", &["name".to_string(), "age".to_string()]);
        assert_eq!(
            statement.sql(),
            "CREATE INDEX \"_t_quarry_index_basic_index\" \
             ON \"_t_quarry_index_basic\" ( \"name\", \"age\" )"
        );
    }

    #[test]
    fn test_insert_statement_null_for_absent_and_non_scalar() {
        let document = DocumentRevision::new(
            "mike12",
            "1",
            json!({"name": "mike", "tags": ["a", "b"]}),
        );
        let statement = insert_statement_for_document(
            "basic",
            &["name".to_string(), "tags".to_string(), "age".to_string()],
            &document,
        );
        assert!(statement.is_balanced());
        assert_eq!(
            statement.parameters(),
            &[
                json!("mike12"),
                json!("1"),
                json!("mike"),
                Value::Null, // arrays are not indexable
                Value::Null, // absent
            ]
        );
    }
}
