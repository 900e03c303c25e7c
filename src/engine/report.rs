//! Validation records and the per-scheme error accumulator
//!
//! Data-level problems are collected, never thrown, so one call reports all
//! violations found in a single pass. Records snapshot the traversal path
//! at the moment of the error; later path mutation cannot corrupt them.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::context::PathFrame;

/// The restriction a record was produced by, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RestrictionKind {
    OneOf,
    Min,
    Max,
    Handler,
}

/// Normalized failure fed into the accumulator: either a bare message or a
/// structured type/restriction violation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CheckFailure {
    pub message: String,
    pub restriction: Option<RestrictionKind>,
    pub type_error: bool,
}

impl CheckFailure {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            restriction: None,
            type_error: false,
        }
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            restriction: None,
            type_error: true,
        }
    }

    pub fn restriction(kind: RestrictionKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            restriction: Some(kind),
            type_error: false,
        }
    }
}

/// One recorded validation failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationRecord {
    /// Snapshot of the ancestor chain at the time of the error.
    pub path: Vec<PathFrame>,
    /// Human-readable description.
    pub message: String,
    /// Violated restriction, if the failure came from one.
    pub restriction: Option<RestrictionKind>,
    /// Offending data value, if any.
    pub data_attribute: Option<Value>,
    /// Scheme attribute the failure belongs to, if any.
    pub scheme_attribute: Option<String>,
    /// Whether the failure was a type mismatch.
    pub type_error: bool,
}

/// Validation failures grouped by root scheme key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    buckets: BTreeMap<String, Vec<ValidationRecord>>,
}

impl ValidationReport {
    pub(crate) fn append(
        &mut self,
        bucket: &str,
        path: &[PathFrame],
        scheme_attribute: Option<&str>,
        data_attribute: Option<&Value>,
        failure: CheckFailure,
    ) {
        self.buckets
            .entry(bucket.to_string())
            .or_default()
            .push(ValidationRecord {
                path: path.to_vec(),
                message: failure.message,
                restriction: failure.restriction,
                data_attribute: data_attribute.cloned(),
                scheme_attribute: scheme_attribute.map(str::to_string),
                type_error: failure.type_error,
            });
    }

    /// Records for one scheme bucket.
    pub fn records(&self, scheme_key: &str) -> &[ValidationRecord] {
        self.buckets
            .get(scheme_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterates over (scheme key, records) buckets.
    pub fn buckets(&self) -> impl Iterator<Item = (&str, &[ValidationRecord])> {
        self.buckets
            .iter()
            .map(|(key, records)| (key.as_str(), records.as_slice()))
    }

    /// Total number of records across all buckets.
    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }
}
