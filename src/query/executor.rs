//! Query execution.
//!
//! Orchestrates a `find` call: parse the query, choose a covering index from
//! the current catalog, compile to SQL, run it for the ordered document ids,
//! and hand those to a lazy `ResultSet`. A call moves through three states,
//! unplanned, planned, executed; any failure is terminal for that call and
//! there is no retry or partial result.

use serde_json::Value;

use crate::datastore::DocumentStore;
use crate::index::list_indexes;
use crate::observability::{Logger, Severity};
use crate::storage::{Database, SqlParts};

use super::ast::{FindOptions, ParsedQuery};
use super::errors::{QueryError, QueryResult};
use super::planner::choose_index_for_query;
use super::result::ResultSet;
use super::sql::select_statement_for_query;

/// Handles querying indexes for a given datastore.
pub struct QueryExecutor<'a, S: DocumentStore> {
    database: &'a Database,
    datastore: &'a S,
    logger: Logger,
}

impl<'a, S: DocumentStore> QueryExecutor<'a, S> {
    /// Creates an executor using the indexes in `database` to find documents
    /// from `datastore`.
    pub fn new(database: &'a Database, datastore: &'a S, logger: Logger) -> Self {
        Self {
            database,
            datastore,
            logger,
        }
    }

    /// Executes a query against the currently known indexes.
    ///
    /// The catalog is re-read for every call so concurrent index creation
    /// and deletion are observed.
    pub fn find(&self, query: &Value, options: &FindOptions) -> QueryResult<ResultSet<'a, S>> {
        let catalog = list_indexes(self.database)?;

        // Unplanned -> Planned
        let parsed = ParsedQuery::parse(query)?;
        let index_name = choose_index_for_query(&parsed, &catalog).ok_or_else(|| {
            let fields = parsed.constrained_fields().join(", ");
            self.logger
                .log(Severity::Warn, "query_unservable", &[("fields", &fields)]);
            QueryError::NoCoveringIndex(fields)
        })?;

        let index_fields = &catalog[&index_name];
        if let Some(sort_fields) = &options.sort {
            for sort_field in sort_fields {
                if !index_fields.contains(&sort_field.field) {
                    return Err(QueryError::SortFieldNotCovered {
                        field: sort_field.field.clone(),
                        index: index_name,
                    });
                }
            }
        }

        let mut statement =
            select_statement_for_query(&parsed, &index_name, options.sort.as_deref())?;
        statement = apply_skip_limit(statement, options);

        // Planned -> Executed
        let document_ids = self.database.query_ids(&statement)?;
        self.logger.log(
            Severity::Trace,
            "query_executed",
            &[
                ("index", &index_name),
                ("matches", &document_ids.len().to_string()),
            ],
        );

        ResultSet::builder()
            .document_ids(document_ids)
            .datastore(self.datastore)
            .projection(options.fields.clone())
            .build()
    }

    /// Static form of `find`: scopes its own executor (and a default
    /// logger) to the single call.
    pub fn find_in(
        database: &'a Database,
        datastore: &'a S,
        query: &Value,
        options: &FindOptions,
    ) -> QueryResult<ResultSet<'a, S>> {
        QueryExecutor::new(database, datastore, Logger::default()).find(query, options)
    }
}

/// Applies skip/limit as SQL-level LIMIT/OFFSET.
///
/// SQLite requires a LIMIT clause before OFFSET, hence `LIMIT -1` when only
/// skip is requested.
fn apply_skip_limit(statement: SqlParts, options: &FindOptions) -> SqlParts {
    let mut statement = statement;
    if let Some(limit) = options.limit {
        statement = statement.concat(SqlParts::parts(" LIMIT ?", vec![limit.into()]));
    } else if options.skip > 0 {
        statement = statement.concat(SqlParts::statement(" LIMIT -1"));
    }
    if options.skip > 0 {
        statement = statement.concat(SqlParts::parts(" OFFSET ?", vec![options.skip.into()]));
    }
    statement
}
