//! Per-call traversal state
//!
//! Every top-level call owns one freshly created context, threaded
//! explicitly through the recursion. Nothing in here is shared across
//! calls, so concurrent or nested calls on the same registry stay safe.

use serde_json::{Map, Value};

use super::report::{CheckFailure, ValidationReport};

/// Options for validation calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Run type checks at all.
    pub validation_type: bool,
    /// Strict type matching instead of lenient parseability.
    pub strict_validation_type: bool,
    /// Do not report attributes the data is missing.
    pub ignore_missing_attribute: bool,
    /// Skip all per-attribute validation; only structural errors remain.
    pub ignore_validation_attribute: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            validation_type: true,
            strict_validation_type: false,
            ignore_missing_attribute: false,
            ignore_validation_attribute: false,
        }
    }
}

/// Options for adjustment and aspect-processing calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjustOptions {
    /// Drop input attributes the scheme does not declare.
    pub exclude_unnecessary_attributes: bool,
    /// Fill attributes the scheme declares but the data is missing.
    pub include_missing_attributes: bool,
    /// Coerce scalar values to their declared types.
    pub adjust_types: bool,
}

impl Default for AdjustOptions {
    fn default() -> Self {
        Self {
            exclude_unnecessary_attributes: true,
            include_missing_attributes: true,
            adjust_types: true,
        }
    }
}

/// One ancestor entry of the traversal path.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PathFrame {
    /// Scheme the element was visited under.
    pub scheme_key: String,
    /// The element's `id` attribute if it has one, the element itself for
    /// scalars, `null` otherwise.
    pub element: Value,
    /// Index within the containing array, if any.
    pub index: Option<usize>,
}

impl PathFrame {
    pub(crate) fn new(scheme_key: &str, data: &Value, index: Option<usize>) -> Self {
        let element = match data {
            Value::Object(map) => map.get("id").cloned().unwrap_or(Value::Null),
            scalar => scalar.clone(),
        };
        Self {
            scheme_key: scheme_key.to_string(),
            element,
            index,
        }
    }
}

/// Mutable traversal state owned by one top-level call.
#[derive(Debug, Default)]
pub(crate) struct TraversalContext {
    pub root_key: String,
    pub path: Vec<PathFrame>,
    pub report: ValidationReport,
    pub cache: Map<String, Value>,
}

impl TraversalContext {
    pub fn new(root_key: &str) -> Self {
        Self {
            root_key: root_key.to_string(),
            ..Self::default()
        }
    }

    /// Records a failure under the root scheme bucket, snapshotting the
    /// current path.
    pub fn record(
        &mut self,
        scheme_attribute: Option<&str>,
        data_attribute: Option<&Value>,
        failure: CheckFailure,
    ) {
        let bucket = self.root_key.clone();
        self.report
            .append(&bucket, &self.path, scheme_attribute, data_attribute, failure);
    }
}

/// Treats the argument as an element list: arrays contribute their items,
/// anything else is a single element.
pub(crate) fn elements(data: &Value) -> &[Value] {
    match data {
        Value::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}
