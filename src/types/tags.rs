//! Type tags and type specifications for scheme attributes

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Caller-supplied predicate deciding whether a raw value satisfies a
/// custom type.
pub type TypeMatcher = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Caller-supplied producer invoked when an attribute with a custom type is
/// absent from the input. Receives the raw source element, the in-progress
/// result element and the attribute key.
pub type TypeProducer =
    Arc<dyn Fn(&Value, &Map<String, Value>, &str) -> Value + Send + Sync>;

/// Supported type tags.
///
/// `AssociatedArray` is a key/value map with independently declared entry
/// types; `Undefined` matches nothing that is present and coerces to
/// attribute omission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    String,
    Number,
    Boolean,
    Integer,
    Float,
    Array,
    Object,
    AssociatedArray,
    Null,
    Undefined,
}

impl TypeTag {
    /// Returns the tag name used in messages and serialized descriptions.
    pub fn type_name(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Boolean => "boolean",
            TypeTag::Integer => "integer",
            TypeTag::Float => "float",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
            TypeTag::AssociatedArray => "associatedArray",
            TypeTag::Null => "null",
            TypeTag::Undefined => "undefined",
        }
    }

    /// Whether this tag is one of the numeric tags.
    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeTag::Number | TypeTag::Integer | TypeTag::Float)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// A caller-supplied type: a matcher predicate plus an optional producer
/// used to synthesize a value when the attribute is absent.
#[derive(Clone)]
pub struct CustomType {
    pub matcher: TypeMatcher,
    pub producer: Option<TypeProducer>,
}

impl CustomType {
    /// Creates a custom type from a matcher predicate.
    pub fn matching(matcher: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self {
            matcher: Arc::new(matcher),
            producer: None,
        }
    }

    /// Attaches a producer for absent attributes.
    pub fn with_producer(
        mut self,
        producer: impl Fn(&Value, &Map<String, Value>, &str) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.producer = Some(Arc::new(producer));
        self
    }
}

impl fmt::Debug for CustomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomType")
            .field("producer", &self.producer.is_some())
            .finish()
    }
}

/// Declared type of a scheme attribute: a single tag, an ordered list of
/// candidate tags (first satisfied wins) or a custom predicate.
#[derive(Debug, Clone)]
pub enum TypeSpec {
    Tag(TypeTag),
    OneOf(Vec<TypeTag>),
    Custom(CustomType),
}

impl TypeSpec {
    /// Returns the tag if this spec is a single tag.
    pub fn as_tag(&self) -> Option<TypeTag> {
        match self {
            TypeSpec::Tag(tag) => Some(*tag),
            _ => None,
        }
    }
}

impl From<TypeTag> for TypeSpec {
    fn from(tag: TypeTag) -> Self {
        TypeSpec::Tag(tag)
    }
}

impl From<Vec<TypeTag>> for TypeSpec {
    fn from(tags: Vec<TypeTag>) -> Self {
        TypeSpec::OneOf(tags)
    }
}

impl From<CustomType> for TypeSpec {
    fn from(custom: CustomType) -> Self {
        TypeSpec::Custom(custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tag_names() {
        assert_eq!(TypeTag::String.type_name(), "string");
        assert_eq!(TypeTag::AssociatedArray.type_name(), "associatedArray");
        assert_eq!(TypeTag::Undefined.type_name(), "undefined");
    }

    #[test]
    fn test_numeric_tags() {
        assert!(TypeTag::Number.is_numeric());
        assert!(TypeTag::Integer.is_numeric());
        assert!(TypeTag::Float.is_numeric());
        assert!(!TypeTag::String.is_numeric());
    }

    #[test]
    fn test_custom_type_matcher() {
        let custom = CustomType::matching(|v| v.as_str().map_or(false, |s| s.len() > 2));
        assert!((custom.matcher)(&json!("abc")));
        assert!(!(custom.matcher)(&json!("ab")));
        assert!(custom.producer.is_none());
    }

    #[test]
    fn test_spec_as_tag() {
        assert_eq!(TypeSpec::Tag(TypeTag::Float).as_tag(), Some(TypeTag::Float));
        assert_eq!(
            TypeSpec::OneOf(vec![TypeTag::String, TypeTag::Number]).as_tag(),
            None
        );
    }
}
