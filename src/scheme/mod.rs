//! Scheme descriptions and the scheme registry
//!
//! A scheme describes one expected data shape attribute by attribute;
//! multiple schemes form a flat registry and may reference each other by
//! key, giving a possibly cyclic description graph (the data being traversed
//! must stay acyclic).
//!
//! # Design Principles
//!
//! - Descriptions are immutable configuration, supplied once and read-only
//!   during traversal
//! - Registry construction rejects empty collections, empty keys and
//!   duplicate keys
//! - Lookups are linear scans in declaration order

mod descriptor;
mod errors;
mod registry;

pub use descriptor::{
    AttributeDescriptor, AttributeHook, DefaultProducer, DefaultValue, HookState,
    LifecycleHook, Restrictions, RestrictionHandler,
};
pub use errors::{ConfigError, ConfigResult};
pub use registry::{SchemeDescription, SchemeRegistry};
