//! Shared per-attribute adjustment helpers
//!
//! Used by all three adjustment traversals (inline, aspect pipeline and
//! work-stack stepper) so their outputs agree.

use serde_json::{Map, Value};

use crate::scheme::{AttributeDescriptor, DefaultValue};
use crate::types::{coerce, coerce_spec, zero_value, Coercion, TypeSpec, TypeTag};

/// Value filled in for an attribute absent from the input: the declared
/// default when present, otherwise the declared type's zero value (or a
/// custom producer's output). `None` leaves the attribute unset.
pub(super) fn missing_value(
    descriptor: &AttributeDescriptor,
    result: &Map<String, Value>,
    key: &str,
    data: &Value,
) -> Option<Value> {
    if let Some(default) = &descriptor.default {
        return Some(match default {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Producer(producer) => producer(result, key, data),
        });
    }

    match descriptor.type_spec.as_ref()? {
        TypeSpec::Tag(tag) => zero_value(*tag),
        TypeSpec::Custom(custom) => custom
            .producer
            .as_ref()
            .map(|producer| producer(data, result, key)),
        TypeSpec::OneOf(_) => None,
    }
}

/// Adjusts a present scalar attribute. `None` drops the attribute
/// (coercion to omission, or a typeless attribute under coercion).
pub(super) fn adjust_scalar(
    spec: Option<&TypeSpec>,
    value: &Value,
    adjust_types: bool,
) -> Option<Value> {
    if !adjust_types {
        return Some(value.clone());
    }
    let spec = spec?;
    match coerce_spec(spec, value) {
        Coercion::Value(adjusted) => Some(adjusted),
        Coercion::Omit => None,
        Coercion::Refuse => Some(value.clone()),
    }
}

/// Rebuilds a map-shaped attribute, coercing entry keys and values to their
/// declared tags when enabled. Entries whose value coerces to omission are
/// dropped.
pub(super) fn adjust_map(
    descriptor: &AttributeDescriptor,
    value: &Value,
    adjust_types: bool,
) -> Value {
    let mut out = Map::new();
    if let Some(entries) = value.as_object() {
        for (entry_key, entry_value) in entries {
            if !adjust_types {
                out.insert(entry_key.clone(), entry_value.clone());
                continue;
            }
            let adjusted_key = entry_key_to(descriptor.key_type, entry_key);
            if let Some(adjusted) = entry_value_to(descriptor.value_type, entry_value) {
                out.insert(adjusted_key, adjusted);
            }
        }
    }
    Value::Object(out)
}

fn entry_key_to(tag: Option<TypeTag>, key: &str) -> String {
    let Some(tag) = tag else {
        return key.to_string();
    };
    match coerce(tag, &Value::String(key.to_string())) {
        Coercion::Value(Value::String(s)) => s,
        Coercion::Value(Value::Number(n)) => n.to_string(),
        Coercion::Value(Value::Bool(b)) => b.to_string(),
        Coercion::Value(Value::Null) => "null".to_string(),
        _ => key.to_string(),
    }
}

fn entry_value_to(tag: Option<TypeTag>, value: &Value) -> Option<Value> {
    let Some(tag) = tag else {
        return Some(value.clone());
    };
    match coerce_spec(&TypeSpec::Tag(tag), value) {
        Coercion::Value(adjusted) => Some(adjusted),
        Coercion::Omit => None,
        Coercion::Refuse => Some(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_value_prefers_default() {
        let descriptor = AttributeDescriptor::typed(TypeTag::String).default_value(json!("d"));
        let value = missing_value(&descriptor, &Map::new(), "a", &json!({}));
        assert_eq!(value, Some(json!("d")));
    }

    #[test]
    fn test_missing_value_zero_fills() {
        let descriptor = AttributeDescriptor::typed(TypeTag::Number);
        assert_eq!(
            missing_value(&descriptor, &Map::new(), "a", &json!({})),
            Some(json!(0))
        );

        let untyped = AttributeDescriptor::default();
        assert_eq!(missing_value(&untyped, &Map::new(), "a", &json!({})), None);
    }

    #[test]
    fn test_adjust_scalar_passthrough_without_coercion() {
        let spec = TypeSpec::Tag(TypeTag::Integer);
        assert_eq!(
            adjust_scalar(Some(&spec), &json!("5"), false),
            Some(json!("5"))
        );
        assert_eq!(adjust_scalar(Some(&spec), &json!("5"), true), Some(json!(5)));
        assert_eq!(adjust_scalar(None, &json!("5"), true), None);
    }

    #[test]
    fn test_adjust_map_coerces_entries() {
        let descriptor = AttributeDescriptor::map_of(TypeTag::String, TypeTag::Number);
        let adjusted = adjust_map(&descriptor, &json!({"a": "10", "b": 2}), true);
        assert_eq!(adjusted, json!({"a": 10, "b": 2}));
    }

    #[test]
    fn test_adjust_map_key_coercion() {
        let descriptor = AttributeDescriptor::map_of(TypeTag::Integer, TypeTag::String);
        let adjusted = adjust_map(&descriptor, &json!({"10.5": 3}), true);
        assert_eq!(adjusted, json!({"10": "3"}));
    }

    #[test]
    fn test_adjust_map_ignores_non_object_values() {
        let descriptor = AttributeDescriptor::map_of(TypeTag::String, TypeTag::Number);
        assert_eq!(adjust_map(&descriptor, &json!(5), true), json!({}));
    }
}
