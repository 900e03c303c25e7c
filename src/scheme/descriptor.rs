//! Attribute descriptors
//!
//! One descriptor per scheme attribute: declared type, presence rules,
//! defaults, nested scheme references, map entry typing, value restrictions
//! and post-processing hooks.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::types::{TypeSpec, TypeTag};

/// Deferred default producer. Receives the in-progress result element, the
/// attribute key and the raw source element.
pub type DefaultProducer =
    Arc<dyn Fn(&Map<String, Value>, &str, &Value) -> Value + Send + Sync>;

/// Default for an absent attribute: a literal or a deferred producer.
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    Producer(DefaultProducer),
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultValue::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// Custom restriction predicate; a returned message is the violation.
pub type RestrictionHandler = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Value-level constraints, checked during validation after the type check
/// passed.
#[derive(Clone, Default)]
pub struct Restrictions {
    /// Membership test with strict equality.
    pub one_of: Option<Vec<Value>>,
    /// Lower bound: numeric compare, or length compare for string-typed
    /// attributes.
    pub min: Option<f64>,
    /// Upper bound, same comparison rules as `min`.
    pub max: Option<f64>,
    /// Custom predicate.
    pub handler: Option<RestrictionHandler>,
}

impl Restrictions {
    pub fn one_of(mut self, values: Vec<Value>) -> Self {
        self.one_of = Some(values);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn handler(
        mut self,
        handler: impl Fn(&Value) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }
}

impl fmt::Debug for Restrictions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Restrictions")
            .field("one_of", &self.one_of)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// Post-attribute hook, invoked once per element visit after the attribute
/// was processed. Receives the traversal mode, the result element under
/// construction (absent in validation), the attribute key and the raw
/// element.
pub type AttributeHook =
    Arc<dyn Fn(&str, Option<&mut Map<String, Value>>, &str, &Value) + Send + Sync>;

/// Mutable slice of per-call traversal state exposed to lifecycle hooks.
pub struct HookState<'a> {
    /// Scratch cache shared across the whole call.
    pub cache: &'a mut Map<String, Value>,
    /// Aspect key or mode the traversal runs under.
    pub mode: &'a str,
}

/// Scheme-level lifecycle hook run around attribute processing; may mutate
/// the result element directly.
pub type LifecycleHook =
    Arc<dyn Fn(&Value, &mut Map<String, Value>, &mut HookState<'_>) + Send + Sync>;

/// Describes one attribute of a scheme.
#[derive(Clone, Default)]
pub struct AttributeDescriptor {
    /// Declared type; absent means the attribute carries no type processing.
    pub type_spec: Option<TypeSpec>,
    /// Absence in validation is an error when set.
    pub required: bool,
    /// Default used when the attribute is absent from input.
    pub default: Option<DefaultValue>,
    /// Key of a nested scheme to recurse into.
    pub scheme: Option<String>,
    /// Entry key type for map-shaped attributes.
    pub key_type: Option<TypeTag>,
    /// Entry value type for map-shaped attributes.
    pub value_type: Option<TypeTag>,
    /// Nested scheme for map entry values.
    pub value_scheme: Option<String>,
    /// Restrictions applied to every map entry key.
    pub key_restrictions: Option<Restrictions>,
    /// Restrictions applied to every map entry value.
    pub value_restrictions: Option<Restrictions>,
    /// Value-level constraints, validation only.
    pub restrictions: Option<Restrictions>,
    /// Recurse into the nested scheme even when the attribute is absent,
    /// filling nested defaults.
    pub traverse_default: bool,
    /// Pass-through / exclusion gate without type processing.
    pub pass: Option<bool>,
    /// Engine-internal attribute, always skipped.
    pub service: bool,
    /// Post-attribute hook.
    pub handler_after: Option<AttributeHook>,
}

impl AttributeDescriptor {
    /// Creates a descriptor with a single declared type tag.
    pub fn typed(tag: TypeTag) -> Self {
        Self {
            type_spec: Some(TypeSpec::Tag(tag)),
            ..Self::default()
        }
    }

    /// Creates a descriptor from a full type spec.
    pub fn of_spec(spec: impl Into<TypeSpec>) -> Self {
        Self {
            type_spec: Some(spec.into()),
            ..Self::default()
        }
    }

    /// Creates a bare pass-through (or exclusion) descriptor.
    pub fn pass_through(pass: bool) -> Self {
        Self {
            pass: Some(pass),
            ..Self::default()
        }
    }

    /// Creates a map-shaped descriptor with entry key/value tags.
    pub fn map_of(key_type: TypeTag, value_type: TypeTag) -> Self {
        Self {
            type_spec: Some(TypeSpec::Tag(TypeTag::AssociatedArray)),
            key_type: Some(key_type),
            value_type: Some(value_type),
            ..Self::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(DefaultValue::Literal(value));
        self
    }

    pub fn default_with(
        mut self,
        producer: impl Fn(&Map<String, Value>, &str, &Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.default = Some(DefaultValue::Producer(Arc::new(producer)));
        self
    }

    pub fn nested(mut self, scheme_key: impl Into<String>) -> Self {
        self.scheme = Some(scheme_key.into());
        self
    }

    pub fn traverse_default(mut self) -> Self {
        self.traverse_default = true;
        self
    }

    pub fn restrict(mut self, restrictions: Restrictions) -> Self {
        self.restrictions = Some(restrictions);
        self
    }

    pub fn value_scheme(mut self, scheme_key: impl Into<String>) -> Self {
        self.value_scheme = Some(scheme_key.into());
        self
    }

    pub fn key_restrictions(mut self, restrictions: Restrictions) -> Self {
        self.key_restrictions = Some(restrictions);
        self
    }

    pub fn value_restrictions(mut self, restrictions: Restrictions) -> Self {
        self.value_restrictions = Some(restrictions);
        self
    }

    pub fn pass(mut self, pass: bool) -> Self {
        self.pass = Some(pass);
        self
    }

    pub fn service(mut self) -> Self {
        self.service = true;
        self
    }

    pub fn handler_after(
        mut self,
        hook: impl Fn(&str, Option<&mut Map<String, Value>>, &str, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.handler_after = Some(Arc::new(hook));
        self
    }

    /// Single declared type tag, if any.
    pub fn single_tag(&self) -> Option<TypeTag> {
        self.type_spec.as_ref().and_then(TypeSpec::as_tag)
    }
}

impl fmt::Debug for AttributeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDescriptor")
            .field("type_spec", &self.type_spec)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("scheme", &self.scheme)
            .field("key_type", &self.key_type)
            .field("value_type", &self.value_type)
            .field("value_scheme", &self.value_scheme)
            .field("traverse_default", &self.traverse_default)
            .field("pass", &self.pass)
            .field("service", &self.service)
            .field("handler_after", &self.handler_after.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_builder() {
        let descriptor = AttributeDescriptor::typed(TypeTag::String)
            .required()
            .default_value(json!("x"));
        assert_eq!(descriptor.single_tag(), Some(TypeTag::String));
        assert!(descriptor.required);
        assert!(matches!(
            descriptor.default,
            Some(DefaultValue::Literal(ref v)) if v == &json!("x")
        ));
    }

    #[test]
    fn test_map_builder() {
        let descriptor = AttributeDescriptor::map_of(TypeTag::String, TypeTag::Number)
            .value_scheme("entries");
        assert_eq!(descriptor.single_tag(), Some(TypeTag::AssociatedArray));
        assert_eq!(descriptor.key_type, Some(TypeTag::String));
        assert_eq!(descriptor.value_type, Some(TypeTag::Number));
        assert_eq!(descriptor.value_scheme.as_deref(), Some("entries"));
    }

    #[test]
    fn test_default_producer() {
        let descriptor = AttributeDescriptor::typed(TypeTag::String)
            .default_with(|_, key, _| json!(format!("made-{key}")));
        match descriptor.default {
            Some(DefaultValue::Producer(producer)) => {
                let made = producer(&Map::new(), "name", &json!({}));
                assert_eq!(made, json!("made-name"));
            }
            other => panic!("expected producer, got {other:?}"),
        }
    }

    #[test]
    fn test_restrictions_builder() {
        let restrictions = Restrictions::default()
            .one_of(vec![json!("a"), json!("b")])
            .min(1.0)
            .max(4.0);
        assert_eq!(restrictions.one_of.as_ref().map(Vec::len), Some(2));
        assert_eq!(restrictions.min, Some(1.0));
        assert_eq!(restrictions.max, Some(4.0));
    }
}
