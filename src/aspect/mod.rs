//! Aspect pipeline: attribute-facet dispatch
//!
//! An aspect is one traversal strategy expressed as an ordered list of
//! attribute facets plus a handler per facet. For each attribute the engine
//! walks the declared facet order, runs the handler of every facet the
//! descriptor declares, and dispatches on the returned [`FacetOutcome`]:
//! the value written by the last facet that neither skips nor aborts wins.

mod adjusting;
mod errors;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::engine::AdjustOptions;
use crate::scheme::{AttributeDescriptor, SchemeDescription};

pub use errors::{AspectError, FacetError};

/// One named concern of an attribute descriptor, processed by a dedicated
/// handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Pass,
    Required,
    Default,
    Type,
}

impl Facet {
    pub fn name(&self) -> &'static str {
        match self {
            Facet::Pass => "pass",
            Facet::Required => "required",
            Facet::Default => "default",
            Facet::Type => "type",
        }
    }

    /// Whether a descriptor declares this facet. Handlers only run for
    /// declared facets.
    pub fn declared_by(&self, descriptor: &AttributeDescriptor) -> bool {
        match self {
            Facet::Pass => descriptor.pass.is_some(),
            Facet::Required => descriptor.required,
            Facet::Default => descriptor.default.is_some(),
            Facet::Type => descriptor.type_spec.is_some(),
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Result of one facet handler invocation.
///
/// A control outcome (`Skip`, `Continue`) is never stored as an attribute
/// value; it only directs the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum FacetOutcome {
    /// Write this value into the result element; later facets may still
    /// overwrite it.
    Write(Value),
    /// Remove any value written so far: the attribute ends up unset.
    Unset,
    /// This facet deliberately produced nothing; keep what is there.
    Skip,
    /// Abort processing of this attribute entirely.
    Continue,
}

/// Read-only view handed to a facet handler.
pub struct FacetScope<'a> {
    /// Raw source element.
    pub data: &'a Value,
    /// Result element assembled so far.
    pub result: &'a Map<String, Value>,
    /// Attribute under processing.
    pub attribute: &'a str,
    /// Facet being dispatched.
    pub facet: Facet,
    /// Descriptor of the attribute.
    pub descriptor: &'a AttributeDescriptor,
    /// Scheme owning the attribute.
    pub scheme: &'a SchemeDescription,
    /// Options of the running call.
    pub options: &'a AdjustOptions,
}

/// A facet handler: a pure function of its scope.
pub type FacetHandler =
    Arc<dyn Fn(&FacetScope<'_>) -> Result<FacetOutcome, FacetError> + Send + Sync>;

/// A named, ordered set of facet handlers defining one traversal strategy.
#[derive(Clone)]
pub struct Aspect {
    pub aspect_key: String,
    pub facet_order: Vec<Facet>,
    pub handlers: HashMap<Facet, FacetHandler>,
}

impl Aspect {
    pub fn new(
        aspect_key: impl Into<String>,
        facet_order: Vec<Facet>,
        handlers: HashMap<Facet, FacetHandler>,
    ) -> Self {
        Self {
            aspect_key: aspect_key.into(),
            facet_order,
            handlers,
        }
    }

    /// Resolves the handler for a facet; facets without a handler are
    /// skipped by the engine.
    pub fn handler(&self, facet: Facet) -> Option<&FacetHandler> {
        self.handlers.get(&facet)
    }

    fn ensure_valid(&self) -> Result<(), AspectError> {
        if self.aspect_key.is_empty() {
            return Err(AspectError::Malformed("empty aspect key".into()));
        }
        if self.facet_order.is_empty() {
            return Err(AspectError::Malformed("empty facet order".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aspect")
            .field("aspect_key", &self.aspect_key)
            .field("facet_order", &self.facet_order)
            .field("handlers", &self.facet_order.len())
            .finish()
    }
}

/// An aspect argument: a reserved key or a fully specified aspect.
#[derive(Debug, Clone)]
pub enum AspectSpec {
    Key(String),
    Custom(Aspect),
}

impl From<&str> for AspectSpec {
    fn from(key: &str) -> Self {
        AspectSpec::Key(key.to_string())
    }
}

impl From<String> for AspectSpec {
    fn from(key: String) -> Self {
        AspectSpec::Key(key)
    }
}

impl From<Aspect> for AspectSpec {
    fn from(aspect: Aspect) -> Self {
        AspectSpec::Custom(aspect)
    }
}

/// Resolves an aspect argument to a runnable aspect.
///
/// Reserved keys are `adjust`, `validation` and `transformation`; the
/// latter two currently alias the adjusting behavior.
///
/// # Errors
///
/// `AspectError::UnknownKey` for an unreserved key,
/// `AspectError::Malformed` for a custom aspect with an empty key or facet
/// order.
pub fn resolve(spec: AspectSpec) -> Result<Aspect, AspectError> {
    match spec {
        AspectSpec::Custom(aspect) => {
            aspect.ensure_valid()?;
            Ok(aspect)
        }
        AspectSpec::Key(key) => match key.as_str() {
            "adjust" => Ok(adjusting::aspect("adjust")),
            "validation" => Ok(adjusting::aspect("validation")),
            "transformation" => Ok(adjusting::aspect("transformation")),
            _ => Err(AspectError::UnknownKey(key)),
        },
    }
}
