//! Diagnostics
//!
//! Structured, synchronous logging for recoverable traversal events such
//! as absorbed facet handler failures. Strictly read-only: nothing here
//! influences traversal results, and a logging failure is never an error.

mod logger;

pub use logger::{Logger, Severity};
