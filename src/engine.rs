//! Query façade.
//!
//! `QueryEngine` binds one document store to one index database and exposes
//! the whole query surface: index lifecycle, catalog listing, and `find`.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::datastore::DocumentStore;
use crate::index::{self, IndexCreator, IndexResult, IndexType};
use crate::observability::{Logger, Severity};
use crate::query::{FindOptions, QueryExecutor, QueryResult, ResultSet};
use crate::storage::Database;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Log severity threshold
    pub log_threshold: Severity,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_threshold: Severity::Warn,
        }
    }
}

/// The public query surface bound to a document store instance.
pub struct QueryEngine<'a, S: DocumentStore> {
    database: Database,
    datastore: &'a S,
    logger: Logger,
}

impl<'a, S: DocumentStore> QueryEngine<'a, S> {
    /// Creates an engine with default configuration.
    pub fn new(datastore: &'a S, database: Database) -> QueryResult<Self> {
        Self::with_config(datastore, database, EngineConfig::default())
    }

    /// Creates an engine, ensuring the metadata table exists.
    pub fn with_config(
        datastore: &'a S,
        database: Database,
        config: EngineConfig,
    ) -> QueryResult<Self> {
        index::ensure_metadata_table(&database)?;
        Ok(Self {
            database,
            datastore,
            logger: Logger::new(config.log_threshold),
        })
    }

    /// Lists existing indexes: name to ordered field list.
    ///
    /// Re-read from the metadata table on every call.
    pub fn list_indexes(&self) -> IndexResult<BTreeMap<String, Vec<String>>> {
        index::list_indexes(&self.database)
    }

    /// Ensures an index over `fields` exists, deriving its name from the
    /// field list. Returns the index name.
    pub fn ensure_indexed(&self, fields: &[Value]) -> IndexResult<String> {
        self.creator().ensure_indexed(fields, None, IndexType::Json)
    }

    /// Ensures an index named `index_name` over `fields` exists.
    pub fn ensure_indexed_named(&self, fields: &[Value], index_name: &str) -> IndexResult<String> {
        self.creator()
            .ensure_indexed(fields, Some(index_name), IndexType::Json)
    }

    /// Deletes an index: metadata rows and table, in one transaction.
    pub fn delete_index(&self, index_name: &str) -> IndexResult<()> {
        index::delete_index(&self.database, index_name)?;
        self.logger
            .log(Severity::Info, "index_deleted", &[("index", index_name)]);
        Ok(())
    }

    /// Repopulates every index from the current documents.
    ///
    /// For use after bulk document mutation outside the index-maintenance
    /// path; idempotent, never duplicates rows.
    pub fn update_all_indexes(&self) -> IndexResult<()> {
        self.creator().update_all_indexes()
    }

    /// Executes a query with default options: no skip, no limit, full
    /// documents, index-table order.
    pub fn find(&self, query: &Value) -> QueryResult<ResultSet<'_, S>> {
        self.find_with_options(query, FindOptions::new())
    }

    /// Executes a query with explicit skip/limit/fields/sort.
    pub fn find_with_options(
        &self,
        query: &Value,
        options: FindOptions,
    ) -> QueryResult<ResultSet<'_, S>> {
        QueryExecutor::new(&self.database, self.datastore, self.logger.clone())
            .find(query, &options)
    }

    fn creator(&self) -> IndexCreator<'_, S> {
        IndexCreator::new(&self.database, self.datastore, self.logger.clone())
    }
}
