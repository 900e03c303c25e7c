//! Built-in adjusting aspect
//!
//! Facet order: pass, required, default, type. The pass facet gates the
//! whole attribute; required and default are reserved hooks for custom
//! aspects (defaults are applied inside the type facet); the type facet
//! fills absent attributes and coerces present ones.

use std::collections::HashMap;
use std::sync::Arc;

use crate::scheme::DefaultValue;
use crate::types::{coerce_spec, zero_value, Coercion, TypeSpec, TypeTag};

use super::{Aspect, Facet, FacetError, FacetHandler, FacetOutcome, FacetScope};

/// Builds the adjusting aspect under the given reserved key.
pub(super) fn aspect(key: &str) -> Aspect {
    let handlers: HashMap<Facet, FacetHandler> = HashMap::from([
        (Facet::Pass, Arc::new(pass_facet) as FacetHandler),
        (Facet::Required, Arc::new(reserved_facet) as FacetHandler),
        (Facet::Default, Arc::new(reserved_facet) as FacetHandler),
        (Facet::Type, Arc::new(type_facet) as FacetHandler),
    ]);

    Aspect::new(
        key,
        vec![Facet::Pass, Facet::Required, Facet::Default, Facet::Type],
        handlers,
    )
}

/// Gate facet: `pass: false` drops the attribute entirely, `pass: true`
/// copies the raw value (later facets may overwrite it).
fn pass_facet(scope: &FacetScope<'_>) -> Result<FacetOutcome, FacetError> {
    if scope.descriptor.pass != Some(true) {
        return Ok(FacetOutcome::Continue);
    }
    match scope.data.get(scope.attribute) {
        Some(value) => Ok(FacetOutcome::Write(value.clone())),
        None => Ok(FacetOutcome::Unset),
    }
}

/// Reserved hook so custom aspects can intervene; no base behavior.
fn reserved_facet(_scope: &FacetScope<'_>) -> Result<FacetOutcome, FacetError> {
    Ok(FacetOutcome::Skip)
}

/// Coercion and defaulting facet.
fn type_facet(scope: &FacetScope<'_>) -> Result<FacetOutcome, FacetError> {
    let Some(spec) = scope.descriptor.type_spec.as_ref() else {
        return Ok(FacetOutcome::Skip);
    };

    match scope.data.get(scope.attribute) {
        None => {
            if scope.result.contains_key(scope.attribute) {
                return Ok(FacetOutcome::Skip);
            }

            if let Some(default) = &scope.descriptor.default {
                let value = match default {
                    DefaultValue::Literal(value) => value.clone(),
                    DefaultValue::Producer(producer) => {
                        producer(scope.result, scope.attribute, scope.data)
                    }
                };
                return Ok(FacetOutcome::Write(value));
            }

            match spec {
                TypeSpec::Custom(custom) => match &custom.producer {
                    Some(producer) => Ok(FacetOutcome::Write(producer(
                        scope.data,
                        scope.result,
                        scope.attribute,
                    ))),
                    None => Ok(FacetOutcome::Unset),
                },
                TypeSpec::Tag(tag) => match zero_value(*tag) {
                    Some(value) => Ok(FacetOutcome::Write(value)),
                    None => Ok(FacetOutcome::Unset),
                },
                TypeSpec::OneOf(_) => Ok(FacetOutcome::Unset),
            }
        }
        Some(value) => {
            // Map-shaped attributes are handled by the engine's dedicated
            // branch, not by direct coercion.
            if scope.descriptor.single_tag() == Some(TypeTag::AssociatedArray) {
                return Ok(FacetOutcome::Skip);
            }

            if !scope.options.adjust_types {
                return Ok(FacetOutcome::Write(value.clone()));
            }

            match coerce_spec(spec, value) {
                Coercion::Value(coerced) => Ok(FacetOutcome::Write(coerced)),
                Coercion::Omit => Ok(FacetOutcome::Unset),
                Coercion::Refuse => Ok(FacetOutcome::Skip),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AdjustOptions;
    use crate::scheme::{AttributeDescriptor, SchemeDescription};
    use serde_json::{json, Map, Value};

    fn run(
        facet: Facet,
        descriptor: AttributeDescriptor,
        data: Value,
        result: &Map<String, Value>,
    ) -> FacetOutcome {
        let scheme = SchemeDescription::new("test");
        let options = AdjustOptions::default();
        let scope = FacetScope {
            data: &data,
            result,
            attribute: "attr",
            facet,
            descriptor: &descriptor,
            scheme: &scheme,
            options: &options,
        };
        let aspect = aspect("adjust");
        let handler = aspect.handler(facet).unwrap();
        handler(&scope).unwrap()
    }

    #[test]
    fn test_pass_false_aborts_attribute() {
        let outcome = run(
            Facet::Pass,
            AttributeDescriptor::pass_through(false),
            json!({"attr": "x"}),
            &Map::new(),
        );
        assert_eq!(outcome, FacetOutcome::Continue);
    }

    #[test]
    fn test_pass_true_copies_raw_value() {
        let outcome = run(
            Facet::Pass,
            AttributeDescriptor::pass_through(true),
            json!({"attr": 10}),
            &Map::new(),
        );
        assert_eq!(outcome, FacetOutcome::Write(json!(10)));
    }

    #[test]
    fn test_type_absent_fills_zero_value() {
        let outcome = run(
            Facet::Type,
            AttributeDescriptor::typed(TypeTag::String),
            json!({}),
            &Map::new(),
        );
        assert_eq!(outcome, FacetOutcome::Write(json!("")));
    }

    #[test]
    fn test_type_absent_respects_earlier_write() {
        let mut result = Map::new();
        result.insert("attr".into(), json!("kept"));
        let outcome = run(
            Facet::Type,
            AttributeDescriptor::typed(TypeTag::String),
            json!({}),
            &result,
        );
        assert_eq!(outcome, FacetOutcome::Skip);
    }

    #[test]
    fn test_type_absent_applies_default() {
        let outcome = run(
            Facet::Type,
            AttributeDescriptor::typed(TypeTag::String).default_value(json!("dflt")),
            json!({}),
            &Map::new(),
        );
        assert_eq!(outcome, FacetOutcome::Write(json!("dflt")));
    }

    #[test]
    fn test_type_absent_candidate_list_unsets() {
        let outcome = run(
            Facet::Type,
            AttributeDescriptor::of_spec(vec![TypeTag::String, TypeTag::Number]),
            json!({}),
            &Map::new(),
        );
        assert_eq!(outcome, FacetOutcome::Unset);
    }

    #[test]
    fn test_type_present_coerces() {
        let outcome = run(
            Facet::Type,
            AttributeDescriptor::typed(TypeTag::Integer),
            json!({"attr": "10.1"}),
            &Map::new(),
        );
        assert_eq!(outcome, FacetOutcome::Write(json!(10)));
    }

    #[test]
    fn test_type_present_map_skipped() {
        let outcome = run(
            Facet::Type,
            AttributeDescriptor::map_of(TypeTag::String, TypeTag::Number),
            json!({"attr": {"k": 1}}),
            &Map::new(),
        );
        assert_eq!(outcome, FacetOutcome::Skip);
    }
}
