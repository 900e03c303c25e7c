//! Traversal engine
//!
//! The engine walks raw data against scheme descriptions resolved from a
//! [`SchemeRegistry`] and exposes the traversal modes: collect-all
//! validation, recursive adjustment, aspect-driven processing and a lazy
//! bottom-up adjustment stepper.
//!
//! Design principles:
//! - One context per call: no state survives a traversal, calls on a
//!   shared registry never interfere.
//! - Inputs are read-only; every mode builds fresh result elements.
//! - Validation collects, adjustment repairs: data-level problems never
//!   abort a traversal.

mod adjust;
mod attrs;
mod context;
mod process;
mod report;
mod stepper;
mod validate;

pub use context::{AdjustOptions, PathFrame, ValidateOptions};
pub use report::{RestrictionKind, ValidationRecord, ValidationReport};
pub use stepper::{AdjustStep, AdjustStepper};

use serde_json::{Map, Value};

use crate::aspect::{self, AspectError, AspectSpec};
use crate::scheme::SchemeRegistry;

/// Facade over the traversal modes, borrowing the registry it resolves
/// scheme keys from.
#[derive(Debug, Clone, Copy)]
pub struct SchemeEngine<'a> {
    registry: &'a SchemeRegistry,
}

impl<'a> SchemeEngine<'a> {
    pub fn new(registry: &'a SchemeRegistry) -> Self {
        Self { registry }
    }

    /// Validates `data` against the scheme under `root_key` and returns
    /// every violation found, grouped by root scheme key. Arrays are
    /// validated element by element.
    pub fn validate(&self, data: &Value, root_key: &str, options: ValidateOptions) -> ValidationReport {
        validate::run(self.registry, data, root_key, &options)
    }

    /// Rebuilds `data` to conform to the scheme under `root_key`: one
    /// result element per input element, in input order.
    pub fn adjust(&self, data: &Value, root_key: &str, options: AdjustOptions) -> Vec<Value> {
        adjust::run(self.registry, data, root_key, &options)
    }

    /// Runs an aspect over `data`. Accepts a reserved aspect key
    /// (`"adjust"`, `"validation"`, `"transformation"`) or a custom
    /// [`Aspect`](crate::aspect::Aspect).
    ///
    /// # Errors
    ///
    /// `AspectError` when the aspect key is unknown, the custom aspect is
    /// malformed, or a facet handler fails fatally.
    pub fn process(
        &self,
        data: &Value,
        root_key: &str,
        aspect_spec: impl Into<AspectSpec>,
        options: AdjustOptions,
    ) -> Result<Vec<Value>, AspectError> {
        let aspect = aspect::resolve(aspect_spec.into())?;
        process::run(self.registry, data, root_key, &aspect, &options)
    }

    /// Returns a lazy stepper that adjusts `data` element by element,
    /// yielding nested elements before the elements containing them.
    pub fn adjust_steps(
        &self,
        data: &Value,
        root_key: &str,
        options: AdjustOptions,
    ) -> AdjustStepper<'a> {
        AdjustStepper::new(self.registry, data, root_key, options)
    }

    /// Builds one fully populated entity from (possibly partial) input:
    /// adjustment with missing-attribute filling and coercion forced on.
    pub fn create_entity(&self, data: &Value, root_key: &str) -> Value {
        let options = AdjustOptions {
            include_missing_attributes: true,
            adjust_types: true,
            ..AdjustOptions::default()
        };
        self.adjust(data, root_key, options)
            .into_iter()
            .next()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }
}
