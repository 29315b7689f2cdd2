//! Document store seam.
//!
//! The engine never owns documents; it consumes a `DocumentStore` that can
//! fetch a document by its opaque id and scan every current document. Index
//! population and result materialization are built entirely on these two
//! operations.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde_json::Value;

/// A document at a specific revision.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRevision {
    /// Opaque document id
    pub id: String,
    /// Opaque revision marker
    pub rev: String,
    /// Document body
    pub body: Value,
}

impl DocumentRevision {
    /// Creates a new document revision
    pub fn new(id: impl Into<String>, rev: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            rev: rev.into(),
            body,
        }
    }
}

/// Read access to the document store backing an engine instance.
pub trait DocumentStore {
    /// Fetches the current revision of a document, or `None` if the id no
    /// longer resolves (deleted, purged, or never existed).
    fn fetch_document(&self, id: &str) -> Option<DocumentRevision>;

    /// Visits every current document once, in stable id order.
    fn for_each_document(&self, visitor: &mut dyn FnMut(&DocumentRevision));
}

/// In-process document store.
///
/// The reference `DocumentStore` implementation used by tests and demos.
/// Writes go through a lock so documents can keep changing while an engine
/// holds the store; revision markers are bump-on-write generation counters.
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    documents: RwLock<BTreeMap<String, DocumentRevision>>,
}

impl MemoryDatastore {
    /// Creates an empty datastore
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves a document body under `id`, bumping its revision marker.
    pub fn save_document(&self, id: impl Into<String>, body: Value) -> String {
        let id = id.into();
        let mut documents = self.documents.write();
        let generation = documents
            .get(&id)
            .and_then(|doc| doc.rev.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        let rev = generation.to_string();
        documents.insert(id.clone(), DocumentRevision::new(id, rev.clone(), body));
        rev
    }

    /// Deletes a document; returns whether it existed.
    pub fn delete_document(&self, id: &str) -> bool {
        self.documents.write().remove(id).is_some()
    }

    /// Returns the number of stored documents
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Returns true when no documents are stored
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl DocumentStore for MemoryDatastore {
    fn fetch_document(&self, id: &str) -> Option<DocumentRevision> {
        self.documents.read().get(id).cloned()
    }

    fn for_each_document(&self, visitor: &mut dyn FnMut(&DocumentRevision)) {
        for doc in self.documents.read().values() {
            visitor(doc);
        }
    }
}
