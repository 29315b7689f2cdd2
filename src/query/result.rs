//! Lazy result materialization.
//!
//! A `ResultSet` is an immutable view over the ordered document ids a query
//! matched. Documents are fetched from the datastore one at a time during
//! iteration, never at construction, and nothing is cached: re-iterating
//! re-fetches, so a consumer that only wants a prefix never pays for the
//! rest.

use crate::datastore::{DocumentRevision, DocumentStore};
use crate::document::project_fields;

use super::errors::{QueryError, QueryResult};

/// An iterable set of query results.
///
/// Iteration order follows `document_ids` exactly, which already reflects
/// the query's requested sort. Ids whose document can no longer be fetched
/// (deleted since the query ran) are skipped, not errors.
pub struct ResultSet<'a, S: DocumentStore> {
    document_ids: Vec<String>,
    datastore: &'a S,
    projection: Option<Vec<String>>,
}

impl<'a, S: DocumentStore> ResultSet<'a, S> {
    /// Starts building a result set
    pub fn builder() -> ResultSetBuilder<'a, S> {
        ResultSetBuilder::new()
    }

    /// Returns the matched document ids, in result order.
    pub fn document_ids(&self) -> &[String] {
        &self.document_ids
    }

    /// Returns a fresh pass over the documents.
    ///
    /// Each call restarts iteration from the first id.
    pub fn documents(&self) -> Documents<'_, 'a, S> {
        Documents {
            result_set: self,
            position: 0,
        }
    }
}

impl<'s, 'a, S: DocumentStore> IntoIterator for &'s ResultSet<'a, S> {
    type Item = DocumentRevision;
    type IntoIter = Documents<'s, 'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents()
    }
}

/// One lazy pass over a result set's documents.
pub struct Documents<'s, 'a, S: DocumentStore> {
    result_set: &'s ResultSet<'a, S>,
    position: usize,
}

impl<S: DocumentStore> Iterator for Documents<'_, '_, S> {
    type Item = DocumentRevision;

    fn next(&mut self) -> Option<DocumentRevision> {
        while self.position < self.result_set.document_ids.len() {
            let id = &self.result_set.document_ids[self.position];
            self.position += 1;

            let Some(document) = self.result_set.datastore.fetch_document(id) else {
                // Stale miss: deleted between query and fetch.
                continue;
            };

            let document = match &self.result_set.projection {
                Some(fields) => DocumentRevision::new(
                    document.id,
                    document.rev,
                    project_fields(fields, &document.body),
                ),
                None => document,
            };
            return Some(document);
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // Stale misses can only shrink the result.
        let remaining = self.result_set.document_ids.len() - self.position;
        (0, Some(remaining))
    }
}

/// Builder for `ResultSet`, validated at construction.
///
/// Document ids default to empty (a valid empty result); the datastore is
/// required.
pub struct ResultSetBuilder<'a, S: DocumentStore> {
    document_ids: Vec<String>,
    datastore: Option<&'a S>,
    projection: Option<Vec<String>>,
}

impl<'a, S: DocumentStore> ResultSetBuilder<'a, S> {
    fn new() -> Self {
        Self {
            document_ids: Vec::new(),
            datastore: None,
            projection: None,
        }
    }

    /// Sets the ordered document ids
    pub fn document_ids(mut self, ids: Vec<String>) -> Self {
        self.document_ids = ids;
        self
    }

    /// Sets the datastore documents are fetched from
    pub fn datastore(mut self, datastore: &'a S) -> Self {
        self.datastore = Some(datastore);
        self
    }

    /// Sets the projection field paths; `None` keeps full documents
    pub fn projection(mut self, fields: Option<Vec<String>>) -> Self {
        self.projection = fields;
        self
    }

    /// Builds the immutable result set.
    pub fn build(self) -> QueryResult<ResultSet<'a, S>> {
        let datastore = self.datastore.ok_or(QueryError::MissingDatastore)?;
        Ok(ResultSet {
            document_ids: self.document_ids,
            datastore,
            projection: self.projection,
        })
    }
}
