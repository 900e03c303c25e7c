//! Scheme configuration errors
//!
//! Configuration problems are fatal and surface at construction time; data
//! problems never appear here (they are collected as validation records).

use thiserror::Error;

/// Result type for scheme configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Fatal errors raised while building a scheme registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("scheme description collection is empty")]
    EmptyCollection,

    #[error("scheme description at position {0} has an empty scheme key")]
    MissingSchemeKey(usize),

    #[error("duplicate scheme key: {0}")]
    DuplicateSchemeKey(String),
}
