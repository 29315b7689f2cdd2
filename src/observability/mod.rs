//! Observability subsystem.

mod logger;

pub use logger::{Logger, Severity};
