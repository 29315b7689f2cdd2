//! Covering-index selection.
//!
//! A compound index can serve a query only when the constrained fields form
//! a prefix of the index's field list, so every preceding column is pinned
//! and the relational index is walked left to right. There is no fallback:
//! a query with no covering index is unservable.

use std::collections::{BTreeMap, HashSet};

use super::ast::ParsedQuery;

/// Selects an index to use for a given query from the catalog provided.
///
/// Among indexes whose leading fields are exactly the query's constrained
/// set, the narrowest wins: fewest unused trailing fields, then shortest
/// field list, then lexically smallest name. Returns `None` when no index
/// qualifies.
///
/// This function is deterministic: same query + same catalog = same choice.
pub fn choose_index_for_query(
    query: &ParsedQuery,
    indexes: &BTreeMap<String, Vec<String>>,
) -> Option<String> {
    let constrained: HashSet<&str> = query.constrained_fields().into_iter().collect();
    let prefix_len = constrained.len();

    let mut chosen: Option<(&String, usize)> = None;
    for (name, fields) in indexes {
        if fields.len() < prefix_len {
            continue;
        }
        let prefix_covers = fields[..prefix_len]
            .iter()
            .all(|field| constrained.contains(field.as_str()));
        if !prefix_covers {
            continue;
        }

        let unused = fields.len() - prefix_len;
        // BTreeMap iterates names ascending, so a strict improvement check
        // leaves the lexically smallest name in place on ties.
        match chosen {
            Some((_, best_unused)) if best_unused <= unused => {}
            _ => chosen = Some((name, unused)),
        }
    }

    chosen.map(|(name, _)| name.clone())
}
