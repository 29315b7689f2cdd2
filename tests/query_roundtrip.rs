//! Query Round-Trip Tests
//!
//! Tests for query invariants:
//! - Covering-index selection and rejection
//! - Operator semantics against populated indexes
//! - Sorted, paginated retrieval
//! - Lazy projection and stale-miss tolerance

use quarrydb::index::{IndexCreator, IndexType};
use quarrydb::observability::Logger;
use quarrydb::query::{parse_sort_document, QueryExecutor};
use quarrydb::{
    Database, FindOptions, MemoryDatastore, QueryEngine, QueryError, SortField,
};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

/// A small pet-owner corpus with one document missing the indexed field.
fn seeded_store() -> MemoryDatastore {
    let store = MemoryDatastore::new();
    store.save_document(
        "mike12",
        json!({"name": "mike", "age": 12, "pet": {"species": "cat"}}),
    );
    store.save_document(
        "mike34",
        json!({"name": "mike", "age": 34, "pet": {"species": "dog"}}),
    );
    store.save_document("fred43", json!({"name": "fred", "age": 43}));
    store.save_document("fred12", json!({"name": "fred", "age": 12}));
    store.save_document("ageless", json!({"name": "john"}));
    store
}

fn engine(store: &MemoryDatastore) -> QueryEngine<'_, MemoryDatastore> {
    let engine = QueryEngine::new(store, Database::open_in_memory().unwrap()).unwrap();
    engine
        .ensure_indexed_named(
            &[json!("name"), json!("age"), json!("pet.species")],
            "basic",
        )
        .unwrap();
    engine
}

fn sorted_ids(ids: &[String]) -> Vec<String> {
    let mut ids = ids.to_vec();
    ids.sort();
    ids
}

// =============================================================================
// Covering Index Tests
// =============================================================================

/// Queries over unindexed fields are unservable, never a full scan.
#[test]
fn test_unindexed_field_rejected() {
    let store = seeded_store();
    let engine = engine(&store);

    let result = engine.find(&json!({"town": "bristol"}));
    assert!(matches!(result.err(), Some(QueryError::NoCoveringIndex(_))));
}

/// A trailing index field without its prefix cannot use the index.
#[test]
fn test_prefix_rule_enforced() {
    let store = seeded_store();
    let engine = engine(&store);

    // age is second in [name, age, pet.species].
    let result = engine.find(&json!({"age": 12}));
    assert!(matches!(result.err(), Some(QueryError::NoCoveringIndex(_))));

    // With the leading field constrained too, the index covers.
    let set = engine.find(&json!({"name": "mike", "age": 12})).unwrap();
    assert_eq!(set.document_ids(), ["mike12"]);
}

// =============================================================================
// Operator Tests
// =============================================================================

/// Equality returns exactly the matching ids, including zero matches.
#[test]
fn test_equality_round_trip() {
    let store = seeded_store();
    let engine = engine(&store);

    let set = engine.find(&json!({"name": "mike"})).unwrap();
    assert_eq!(sorted_ids(set.document_ids()), ["mike12", "mike34"]);

    let set = engine.find(&json!({"name": "nobody"})).unwrap();
    assert!(set.document_ids().is_empty());
}

/// Range operators constrain within the covered prefix.
#[test]
fn test_range_operators() {
    let store = seeded_store();
    let engine = engine(&store);

    let set = engine
        .find(&json!({"name": "fred", "age": {"$gt": 12}}))
        .unwrap();
    assert_eq!(set.document_ids(), ["fred43"]);

    let set = engine
        .find(&json!({"name": "fred", "age": {"$gte": 12, "$lte": 43}}))
        .unwrap();
    assert_eq!(sorted_ids(set.document_ids()), ["fred12", "fred43"]);

    let set = engine
        .find(&json!({"name": "fred", "age": {"$lt": 12}}))
        .unwrap();
    assert!(set.document_ids().is_empty());
}

/// $in matches any member; the empty set matches nothing.
#[test]
fn test_in_operator() {
    let store = seeded_store();
    let engine = engine(&store);

    let set = engine
        .find(&json!({"name": {"$in": ["fred", "john"]}}))
        .unwrap();
    assert_eq!(sorted_ids(set.document_ids()), ["ageless", "fred12", "fred43"]);

    let set = engine.find(&json!({"name": {"$in": []}})).unwrap();
    assert!(set.document_ids().is_empty());
}

/// Documents with the field absent are matchable through $exists.
#[test]
fn test_exists_operator() {
    let store = seeded_store();
    let engine = engine(&store);

    let set = engine
        .find(&json!({"name": "john", "age": {"$exists": false}}))
        .unwrap();
    assert_eq!(set.document_ids(), ["ageless"]);

    let set = engine
        .find(&json!({"name": "fred", "age": {"$exists": true}}))
        .unwrap();
    assert_eq!(sorted_ids(set.document_ids()), ["fred12", "fred43"]);

    let set = engine
        .find(&json!({"name": "john", "age": {"$not": {"$exists": true}}}))
        .unwrap();
    assert_eq!(set.document_ids(), ["ageless"]);
}

/// Nested paths behave as ordinary index columns.
#[test]
fn test_nested_field_round_trip() {
    let store = seeded_store();
    let engine = engine(&store);

    let set = engine
        .find(&json!({"name": "mike", "age": 12, "pet.species": "cat"}))
        .unwrap();
    assert_eq!(set.document_ids(), ["mike12"]);
}

/// The empty query matches every document.
#[test]
fn test_empty_query_matches_all() {
    let store = seeded_store();
    let engine = engine(&store);

    let set = engine.find(&json!({})).unwrap();
    assert_eq!(set.document_ids().len(), 5);
}

// =============================================================================
// Sort / Skip / Limit Tests
// =============================================================================

/// Sort follows the requested field/direction pairs, parsed from the wire
/// shape.
#[test]
fn test_sorted_retrieval() {
    let store = seeded_store();
    let engine = engine(&store);

    let sort = parse_sort_document(&json!([{"age": "asc"}])).unwrap();
    let set = engine
        .find_with_options(&json!({"name": "fred"}), FindOptions::new().with_sort(sort))
        .unwrap();
    assert_eq!(set.document_ids(), ["fred12", "fred43"]);

    let sort = parse_sort_document(&json!([{"age": "desc"}])).unwrap();
    let set = engine
        .find_with_options(&json!({"name": "fred"}), FindOptions::new().with_sort(sort))
        .unwrap();
    assert_eq!(set.document_ids(), ["fred43", "fred12"]);
}

/// Sorting on a field outside the chosen index is rejected; there is no
/// in-memory sort pass.
#[test]
fn test_sort_outside_index_rejected() {
    let store = seeded_store();
    let engine = engine(&store);

    let options = FindOptions::new().with_sort(vec![SortField::asc("town")]);
    let result = engine.find_with_options(&json!({"name": "fred"}), options);
    assert!(matches!(
        result.err(),
        Some(QueryError::SortFieldNotCovered { .. })
    ));
}

/// skip/limit windows the sorted ids; skip beyond the result is empty.
#[test]
fn test_skip_limit_windows() {
    let store = seeded_store();
    let engine = engine(&store);

    let query = json!({});
    let sort = vec![SortField::asc("name"), SortField::asc("age")];
    // Full order by (name, age): fred12, fred43, ageless (john), mike12, mike34

    let options = FindOptions::new().with_sort(sort.clone()).with_skip(1).with_limit(2);
    let set = engine.find_with_options(&query, options).unwrap();
    assert_eq!(set.document_ids(), ["fred43", "ageless"]);

    let options = FindOptions::new().with_sort(sort.clone()).with_limit(2);
    let set = engine.find_with_options(&query, options).unwrap();
    assert_eq!(set.document_ids(), ["fred12", "fred43"]);

    let options = FindOptions::new().with_sort(sort.clone()).with_skip(4);
    let set = engine.find_with_options(&query, options).unwrap();
    assert_eq!(set.document_ids(), ["mike34"]);

    let options = FindOptions::new().with_sort(sort).with_skip(10);
    let set = engine.find_with_options(&query, options).unwrap();
    assert!(set.document_ids().is_empty());
}

// =============================================================================
// Materialization Tests
// =============================================================================

/// Documents come back whole and in id-list order.
#[test]
fn test_document_materialization() {
    let store = seeded_store();
    let engine = engine(&store);

    let options = FindOptions::new().with_sort(vec![SortField::asc("age")]);
    let set = engine
        .find_with_options(&json!({"name": "mike"}), options)
        .unwrap();

    let ages: Vec<_> = set.documents().map(|doc| doc.body["age"].clone()).collect();
    assert_eq!(ages, vec![json!(12), json!(34)]);
}

/// Projection keeps only the requested fields and omits absent ones.
#[test]
fn test_projection() {
    let store = seeded_store();
    let engine = engine(&store);

    let options = FindOptions::new()
        .with_fields(vec!["name".into(), "pet.species".into()])
        .with_sort(vec![SortField::asc("age")]);
    let set = engine
        .find_with_options(&json!({"name": "mike"}), options)
        .unwrap();

    let bodies: Vec<_> = set.documents().map(|doc| doc.body).collect();
    assert_eq!(
        bodies,
        vec![
            json!({"name": "mike", "pet": {"species": "cat"}}),
            json!({"name": "mike", "pet": {"species": "dog"}}),
        ]
    );

    // A field absent in the document is absent in the projection too.
    let options = FindOptions::new().with_fields(vec!["name".into(), "age".into()]);
    let set = engine
        .find_with_options(&json!({"name": "john"}), options)
        .unwrap();
    let doc = set.documents().next().unwrap();
    assert_eq!(doc.body, json!({"name": "john"}));
}

/// Ids deleted between query and fetch are skipped, not errors.
#[test]
fn test_stale_ids_skipped_during_iteration() {
    let store = seeded_store();
    let engine = engine(&store);

    let set = engine.find(&json!({"name": "fred"})).unwrap();
    assert_eq!(set.document_ids().len(), 2);

    store.delete_document("fred43");

    let fetched: Vec<_> = set.documents().map(|doc| doc.id).collect();
    assert_eq!(fetched, vec!["fred12"]);
}

/// The component-level path works without the façade: create an index with
/// an `IndexCreator`, query through the static `find_in` form.
#[test]
fn test_static_find_form() {
    let store = seeded_store();
    let database = Database::open_in_memory().unwrap();

    let creator = IndexCreator::new(&database, &store, Logger::default());
    creator
        .ensure_indexed(&[json!("name")], Some("names"), IndexType::Json)
        .unwrap();

    let set = QueryExecutor::find_in(
        &database,
        &store,
        &json!({"name": "mike"}),
        &FindOptions::new(),
    )
    .unwrap();
    assert_eq!(sorted_ids(set.document_ids()), ["mike12", "mike34"]);
}

/// Iteration re-fetches on every pass, observing current store state.
#[test]
fn test_iteration_restart_refetches() {
    let store = seeded_store();
    let engine = engine(&store);

    let set = engine.find(&json!({"name": "mike"})).unwrap();
    assert_eq!(set.documents().count(), 2);

    store.delete_document("mike34");
    assert_eq!(set.documents().count(), 1);
}
