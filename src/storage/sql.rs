//! Parameterized SQL fragments.
//!
//! A `SqlParts` pairs a fragment of SQL text with its ordered bind
//! parameters. Fragments compose by concatenating text and parameter lists;
//! caller-supplied values are never interpolated into the text itself, so
//! the fragment stays injection-safe and values keep their SQLite types.

use std::fmt;

use serde_json::Value;

/// An immutable SQL fragment plus its ordered bind parameters.
///
/// Placeholder count must equal parameter count; `is_balanced` checks the
/// invariant and the statement builders are tested against it.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlParts {
    sql: String,
    parameters: Vec<Value>,
}

impl SqlParts {
    /// Creates a fragment from SQL text and its bind parameters.
    pub fn parts(sql: impl Into<String>, parameters: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            parameters,
        }
    }

    /// Creates a fragment with no bind parameters.
    pub fn statement(sql: impl Into<String>) -> Self {
        Self::parts(sql, Vec::new())
    }

    /// Returns the SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the bind parameters in placeholder order.
    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    /// Returns the number of `?` placeholders in the SQL text.
    pub fn placeholder_count(&self) -> usize {
        self.sql.chars().filter(|c| *c == '?').count()
    }

    /// Returns true when placeholder count equals parameter count.
    pub fn is_balanced(&self) -> bool {
        self.placeholder_count() == self.parameters.len()
    }

    /// Joins fragments with a separator, concatenating parameter lists in
    /// fragment order.
    pub fn join(fragments: Vec<SqlParts>, separator: &str) -> SqlParts {
        let mut sql = String::new();
        let mut parameters = Vec::new();
        for (i, fragment) in fragments.into_iter().enumerate() {
            if i > 0 {
                sql.push_str(separator);
            }
            sql.push_str(&fragment.sql);
            parameters.extend(fragment.parameters);
        }
        SqlParts { sql, parameters }
    }

    /// Appends a fragment to this one, consuming both.
    pub fn concat(mut self, other: SqlParts) -> SqlParts {
        self.sql.push_str(&other.sql);
        self.parameters.extend(other.parameters);
        self
    }
}

impl fmt::Display for SqlParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sql: {} params: {:?}", self.sql, self.parameters)
    }
}

/// Converts a JSON parameter to the SQLite value bound at execution time.
///
/// Booleans map to integers 0/1 so range comparisons behave; arrays and
/// objects are serialized to their JSON text (they never reach index
/// columns, but may appear in parameter lists handed to the engine).
pub(crate) fn value_to_sql(v: &Value) -> rusqlite::types::Value {
    match v {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                rusqlite::types::Value::Integer(i)
            } else {
                rusqlite::types::Value::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        other => rusqlite::types::Value::Text(other.to_string()),
    }
}
