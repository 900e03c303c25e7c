//! Scheme descriptions and the ordered registry resolving them by key

use std::fmt;

use super::descriptor::{AttributeDescriptor, LifecycleHook};
use super::errors::{ConfigError, ConfigResult};

/// A named, ordered description of one expected data shape.
///
/// Attributes keep declaration order; result elements are assembled in the
/// same order.
#[derive(Clone, Default)]
pub struct SchemeDescription {
    /// Unique key identifying this scheme in the registry.
    pub scheme_key: String,
    /// Declared attributes in declaration order.
    pub attributes: Vec<(String, AttributeDescriptor)>,
    /// Hook run once per element before attribute processing.
    pub before: Option<LifecycleHook>,
    /// Hook run once per element after attribute processing.
    pub after: Option<LifecycleHook>,
}

impl SchemeDescription {
    /// Creates an empty scheme description with the given key.
    pub fn new(scheme_key: impl Into<String>) -> Self {
        Self {
            scheme_key: scheme_key.into(),
            ..Self::default()
        }
    }

    /// Appends an attribute descriptor, keeping declaration order.
    pub fn attribute(mut self, key: impl Into<String>, descriptor: AttributeDescriptor) -> Self {
        self.attributes.push((key.into(), descriptor));
        self
    }

    /// Sets the before-element lifecycle hook.
    pub fn before(mut self, hook: LifecycleHook) -> Self {
        self.before = Some(hook);
        self
    }

    /// Sets the after-element lifecycle hook.
    pub fn after(mut self, hook: LifecycleHook) -> Self {
        self.after = Some(hook);
        self
    }

    /// Resolves an attribute descriptor by key (linear scan).
    pub fn get(&self, key: &str) -> Option<&AttributeDescriptor> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, descriptor)| descriptor)
    }
}

impl fmt::Debug for SchemeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemeDescription")
            .field("scheme_key", &self.scheme_key)
            .field("attributes", &self.attributes)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

/// Ordered collection of scheme descriptions keyed by scheme key.
#[derive(Debug, Clone)]
pub struct SchemeRegistry {
    descriptions: Vec<SchemeDescription>,
}

impl SchemeRegistry {
    /// Builds a registry from an ordered description list.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the list is empty, any description carries
    /// an empty `scheme_key`, or two descriptions share a key.
    pub fn new(descriptions: Vec<SchemeDescription>) -> ConfigResult<Self> {
        if descriptions.is_empty() {
            return Err(ConfigError::EmptyCollection);
        }

        for (position, description) in descriptions.iter().enumerate() {
            if description.scheme_key.is_empty() {
                return Err(ConfigError::MissingSchemeKey(position));
            }
            let earlier = descriptions[..position]
                .iter()
                .any(|other| other.scheme_key == description.scheme_key);
            if earlier {
                return Err(ConfigError::DuplicateSchemeKey(
                    description.scheme_key.clone(),
                ));
            }
        }

        Ok(Self { descriptions })
    }

    /// Builds a registry from a single description.
    pub fn of(description: SchemeDescription) -> ConfigResult<Self> {
        Self::new(vec![description])
    }

    /// Resolves a scheme description by key: a linear scan in declaration
    /// order.
    pub fn resolve(&self, scheme_key: &str) -> Option<&SchemeDescription> {
        self.descriptions
            .iter()
            .find(|description| description.scheme_key == scheme_key)
    }

    /// Number of registered descriptions.
    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeTag;

    #[test]
    fn test_registry_resolves_by_key() {
        let registry = SchemeRegistry::new(vec![
            SchemeDescription::new("outer")
                .attribute("id", AttributeDescriptor::typed(TypeTag::String)),
            SchemeDescription::new("inner"),
        ])
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.resolve("outer").is_some());
        assert!(registry.resolve("inner").is_some());
        assert!(registry.resolve("missing").is_none());
    }

    #[test]
    fn test_empty_collection_rejected() {
        assert_eq!(
            SchemeRegistry::new(vec![]).unwrap_err(),
            ConfigError::EmptyCollection
        );
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = SchemeRegistry::new(vec![
            SchemeDescription::new("ok"),
            SchemeDescription::new(""),
        ]);
        assert_eq!(result.unwrap_err(), ConfigError::MissingSchemeKey(1));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let result = SchemeRegistry::new(vec![
            SchemeDescription::new("twice"),
            SchemeDescription::new("twice"),
        ]);
        assert_eq!(
            result.unwrap_err(),
            ConfigError::DuplicateSchemeKey("twice".into())
        );
    }

    #[test]
    fn test_attribute_lookup_keeps_order() {
        let description = SchemeDescription::new("ordered")
            .attribute("first", AttributeDescriptor::typed(TypeTag::String))
            .attribute("second", AttributeDescriptor::typed(TypeTag::Number));

        assert_eq!(description.attributes[0].0, "first");
        assert_eq!(description.attributes[1].0, "second");
        assert!(description.get("second").is_some());
        assert!(description.get("third").is_none());
    }
}
