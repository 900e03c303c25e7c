//! Type system for scheme attributes
//!
//! A closed set of type tags with three per-tag capabilities:
//! - matching a raw value against the tag (strict or lenient)
//! - coercing a raw value to the tag's canonical representation
//! - synthesizing the tag's zero value for absent attributes
//!
//! Caller-supplied predicates plug in through [`CustomType`] instead of
//! extending the tag set.

mod coerce;
mod tags;

pub use coerce::{coerce, coerce_spec, matches, matches_spec, zero_value, Coercion};
pub(crate) use coerce::to_number;
pub use tags::{CustomType, TypeMatcher, TypeProducer, TypeSpec, TypeTag};
