//! Type matching and coercion
//!
//! Matching honors a strict/lenient split for numeric tags: lenient mode
//! accepts any value parseable as the numeric subtype, strict mode requires
//! the runtime value to already be that subtype (integer vs float decided by
//! the fractional part). Structural tags (array, object, null, undefined)
//! ignore the mode entirely.

use serde_json::{json, Value};

use super::tags::{TypeSpec, TypeTag};

/// Outcome of coercing a value to a declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum Coercion {
    /// The converted (or already canonical) value.
    Value(Value),
    /// The target has no representation; the attribute stays unset.
    Omit,
    /// Coercion is refused for composite tags; the caller keeps the raw
    /// value or routes it through nested-scheme recursion.
    Refuse,
}

/// Tests whether a value satisfies a type tag.
pub fn matches(tag: TypeTag, value: &Value, strict: bool) -> bool {
    match tag {
        TypeTag::Array => value.is_array(),
        TypeTag::Null => value.is_null(),
        TypeTag::Undefined => false,
        TypeTag::Object | TypeTag::AssociatedArray => value.is_object(),
        TypeTag::String => value.is_string(),
        TypeTag::Boolean => value.is_boolean(),
        TypeTag::Number => {
            if strict {
                value.is_number()
            } else {
                lenient_number(value)
            }
        }
        TypeTag::Integer => {
            if strict {
                strict_integer(value)
            } else {
                parse_integer(value).is_some()
            }
        }
        TypeTag::Float => {
            if strict {
                strict_float(value)
            } else {
                parse_float(value).is_some()
            }
        }
    }
}

/// Tests whether a value satisfies a type spec. For candidate lists the
/// first satisfied tag wins.
pub fn matches_spec(spec: &TypeSpec, value: &Value, strict: bool) -> bool {
    match spec {
        TypeSpec::Tag(tag) => matches(*tag, value, strict),
        TypeSpec::OneOf(tags) => tags.iter().any(|tag| matches(*tag, value, strict)),
        TypeSpec::Custom(custom) => (custom.matcher)(value),
    }
}

/// Coerces a raw value to the canonical representation of a tag.
///
/// Composite tags refuse coercion; `undefined` and unparseable numerics
/// coerce to omission.
pub fn coerce(tag: TypeTag, value: &Value) -> Coercion {
    match tag {
        TypeTag::Array | TypeTag::Object | TypeTag::AssociatedArray => Coercion::Refuse,
        TypeTag::String => Coercion::Value(Value::String(stringify(value))),
        TypeTag::Boolean => Coercion::Value(Value::Bool(truthy(value))),
        TypeTag::Number => match to_number(value) {
            Some(n) => Coercion::Value(number_value(n)),
            None => Coercion::Omit,
        },
        TypeTag::Float => match parse_float(value) {
            Some(n) => Coercion::Value(number_value(n)),
            None => Coercion::Omit,
        },
        TypeTag::Integer => match parse_integer(value) {
            Some(n) => Coercion::Value(Value::from(n)),
            None => Coercion::Omit,
        },
        TypeTag::Null => Coercion::Value(Value::Null),
        TypeTag::Undefined => Coercion::Omit,
    }
}

/// Coerces a value according to a full type spec.
///
/// Values already strictly satisfying a single tag pass unchanged. Candidate
/// lists coerce to the first numeric candidate the value does not already
/// strictly satisfy; when no numeric candidate applies the value passes
/// unchanged. Custom types keep matching values and omit the rest.
pub fn coerce_spec(spec: &TypeSpec, value: &Value) -> Coercion {
    match spec {
        TypeSpec::Tag(tag) => {
            if matches(*tag, value, true) {
                Coercion::Value(value.clone())
            } else {
                coerce(*tag, value)
            }
        }
        TypeSpec::OneOf(tags) => {
            for tag in tags {
                if tag.is_numeric() && !matches(*tag, value, true) {
                    return coerce(*tag, value);
                }
            }
            Coercion::Value(value.clone())
        }
        TypeSpec::Custom(custom) => {
            if (custom.matcher)(value) {
                Coercion::Value(value.clone())
            } else {
                Coercion::Omit
            }
        }
    }
}

/// Returns the zero value synthesized for an absent attribute of the given
/// tag, or `None` when the attribute stays unset.
pub fn zero_value(tag: TypeTag) -> Option<Value> {
    match tag {
        TypeTag::String => Some(json!("")),
        TypeTag::Number | TypeTag::Integer | TypeTag::Float => Some(json!(0)),
        TypeTag::Boolean => Some(json!(false)),
        TypeTag::Array => Some(json!([])),
        TypeTag::Object | TypeTag::AssociatedArray => Some(json!({})),
        TypeTag::Null => Some(Value::Null),
        TypeTag::Undefined => None,
    }
}

/// ECMAScript-style truthiness: empty strings, zero and null are falsy,
/// every array and object is truthy.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        composite => serde_json::to_string(composite).unwrap_or_default(),
    }
}

/// Full numeric conversion: empty strings count as zero, booleans as 0/1,
/// partially-numeric strings fail.
pub(crate) fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
            }
        }
        _ => None,
    }
}

/// Parses the longest numeric prefix of a string, e.g. "10.1abc" -> 10.1.
fn float_prefix(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    let mut best = None;
    let ends = trimmed
        .char_indices()
        .map(|(i, _)| i)
        .skip(1)
        .chain(std::iter::once(trimmed.len()));
    for end in ends {
        if let Ok(f) = trimmed[..end].parse::<f64>() {
            if f.is_finite() {
                best = Some(f);
            }
        }
    }
    best
}

fn parse_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => float_prefix(s),
        _ => None,
    }
}

fn parse_integer(value: &Value) -> Option<i64> {
    parse_float(value).map(|f| f.trunc() as i64)
}

fn lenient_number(value: &Value) -> bool {
    match value {
        Value::Number(_) | Value::Bool(_) => true,
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.is_empty() || trimmed.parse::<f64>().map_or(false, |f| f.is_finite())
        }
        _ => false,
    }
}

fn strict_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64().map_or(false, |f| f.fract() == 0.0),
        _ => false,
    }
}

fn strict_float(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64().map_or(false, |f| f.fract() != 0.0),
        _ => false,
    }
}

/// Normalizes whole floats to integer numbers so coerced output compares
/// equal to literal JSON integers.
fn number_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < (i64::MAX as f64) {
        Value::from(f as i64)
    } else {
        serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}
