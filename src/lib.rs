//! datamold - schema-driven validation and normalization of nested data
//!
//! Heterogeneous input objects (DTOs) are checked against declarative scheme
//! descriptions and either reported on (validation) or rebuilt into entities
//! of a known shape (adjustment), with defaults filled in and scalar types
//! coerced along the way.

pub mod aspect;
pub mod engine;
pub mod observability;
pub mod scheme;
pub mod types;
