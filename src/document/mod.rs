//! Document value access.
//!
//! Documents are nested `serde_json::Value` trees. This module resolves
//! dotted field paths for both index population and result projection.

mod extract;

pub use extract::{extract_value, project_fields};
