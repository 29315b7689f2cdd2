//! Query-to-SQL compilation.
//!
//! Compiles the conjunction of parsed selectors into a parameterized WHERE
//! clause, then wraps it into the SELECT over the chosen index table that
//! yields matching document ids. Values travel as bind parameters, never as
//! interpolated text.

use serde_json::Value;

use crate::index::{index_table_name, quoted};
use crate::storage::SqlParts;

use super::ast::{Constraint, ParsedQuery, SortField};
use super::errors::QueryResult;

/// Returns the SQL WHERE clause for a query.
///
/// An empty query compiles to an empty fragment (no WHERE clause). Multiple
/// operators on one field AND together, as do the field clauses themselves.
pub fn where_parts_for_query(query: &ParsedQuery) -> QueryResult<SqlParts> {
    let mut fragments = Vec::new();
    for clause in &query.clauses {
        for constraint in &clause.constraints {
            fragments.push(constraint_parts(&clause.field, constraint));
        }
    }
    Ok(SqlParts::join(fragments, " AND "))
}

fn constraint_parts(field: &str, constraint: &Constraint) -> SqlParts {
    let column = quoted(field);
    match constraint {
        // Index rows store SQL NULL for both absent fields and explicit
        // nulls, so null equality is an IS NULL check rather than `= ?`.
        Constraint::Eq(Value::Null) => SqlParts::statement(format!("{column} IS NULL")),
        Constraint::Eq(value) => SqlParts::parts(format!("{column} = ?"), vec![value.clone()]),
        Constraint::Gt(value) => SqlParts::parts(format!("{column} > ?"), vec![value.clone()]),
        Constraint::Gte(value) => SqlParts::parts(format!("{column} >= ?"), vec![value.clone()]),
        Constraint::Lt(value) => SqlParts::parts(format!("{column} < ?"), vec![value.clone()]),
        Constraint::Lte(value) => SqlParts::parts(format!("{column} <= ?"), vec![value.clone()]),
        Constraint::In(values) if values.is_empty() => {
            // Membership in the empty set matches nothing.
            SqlParts::statement("1 = 0")
        }
        Constraint::In(values) => {
            let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
            SqlParts::parts(
                format!("{column} IN ({})", placeholders.join(", ")),
                values.clone(),
            )
        }
        Constraint::Exists(true) => SqlParts::statement(format!("{column} IS NOT NULL")),
        Constraint::Exists(false) => SqlParts::statement(format!("{column} IS NULL")),
    }
}

/// Returns the SQL statement to find document ids matching a query,
/// using the index table named by `index_name`.
///
/// Sort fields must already be validated against the chosen index; sorting
/// happens entirely in SQL.
pub fn select_statement_for_query(
    query: &ParsedQuery,
    index_name: &str,
    sort: Option<&[SortField]>,
) -> QueryResult<SqlParts> {
    let mut statement = SqlParts::statement(format!(
        "SELECT \"_id\" FROM {}",
        quoted(&index_table_name(index_name))
    ));

    let where_parts = where_parts_for_query(query)?;
    if !where_parts.sql().is_empty() {
        statement = statement
            .concat(SqlParts::statement(" WHERE "))
            .concat(where_parts);
    }

    if let Some(sort_fields) = sort {
        if !sort_fields.is_empty() {
            let order: Vec<String> = sort_fields
                .iter()
                .map(|s| format!("{} {}", quoted(&s.field), s.direction.sql_keyword()))
                .collect();
            statement = statement.concat(SqlParts::statement(format!(
                " ORDER BY {}",
                order.join(", ")
            )));
        }
    }

    Ok(statement)
}
