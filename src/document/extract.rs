//! Nested field value extraction.
//!
//! Resolves dotted field paths against document bodies. Absence is a
//! first-class result: `None` means the path does not resolve, which is
//! distinct from the path resolving to an explicit JSON null.

use serde_json::{Map, Value};

/// Resolves a dot-separated field path against a nested document body.
///
/// Each segment is a key lookup in the current object. Returns `None` when a
/// key is missing or an intermediate value is not an object; never panics on
/// malformed paths (those are rejected at index-creation time instead).
pub fn extract_value<'a>(field_path: &str, body: &'a Value) -> Option<&'a Value> {
    let mut current = body;
    for segment in field_path.split('.') {
        match current {
            Value::Object(map) => current = map.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Reduces a document body to only the listed field paths.
///
/// Fields absent in the body are omitted from the projected output, never
/// defaulted to null. Nested paths are re-nested in the projection.
pub fn project_fields(fields: &[String], body: &Value) -> Value {
    let mut projected = Map::new();
    for field in fields {
        if let Some(value) = extract_value(field, body) {
            insert_at_path(&mut projected, field, value.clone());
        }
    }
    Value::Object(projected)
}

fn insert_at_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(map) = entry {
                insert_at_path(map, rest, value);
            }
        }
    }
}
