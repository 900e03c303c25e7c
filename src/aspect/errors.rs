//! Aspect errors
//!
//! Aspect configuration problems are fatal at call time. Facet handlers
//! additionally distinguish absorbable value errors from fatal ones: only
//! the value category is swallowed by the engine, everything else aborts
//! the whole traversal.

use thiserror::Error;

/// Fatal errors raised when resolving or running an aspect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AspectError {
    #[error("no built-in aspect matches key '{0}'")]
    UnknownKey(String),

    #[error("custom aspect is malformed: {0}")]
    Malformed(String),

    #[error("aspect handler failed: {0}")]
    Handler(String),
}

/// Error returned by a facet handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FacetError {
    /// Absorbed by the engine: logged, attribute processing continues.
    #[error("{0}")]
    Value(String),

    /// Propagates and aborts the whole traversal.
    #[error("{0}")]
    Fatal(String),
}
