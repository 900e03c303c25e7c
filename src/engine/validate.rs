//! Validation traversal
//!
//! Walks every element against its scheme description and collects
//! [`ValidationRecord`](super::report::ValidationRecord)s instead of
//! failing fast: one call reports every violation found.

use serde_json::Value;

use crate::scheme::{AttributeHook, Restrictions, SchemeDescription, SchemeRegistry};
use crate::types::{matches_spec, to_number, TypeSpec, TypeTag};

use super::context::{elements, PathFrame, TraversalContext, ValidateOptions};
use super::report::{CheckFailure, RestrictionKind, ValidationReport};

pub(super) fn run(
    registry: &SchemeRegistry,
    data: &Value,
    root_key: &str,
    options: &ValidateOptions,
) -> ValidationReport {
    let mut ctx = TraversalContext::new(root_key);
    for (index, element) in elements(data).iter().enumerate() {
        visit(registry, &mut ctx, root_key, element, Some(index), options);
    }
    ctx.report
}

fn visit(
    registry: &SchemeRegistry,
    ctx: &mut TraversalContext,
    scheme_key: &str,
    data: &Value,
    index: Option<usize>,
    options: &ValidateOptions,
) {
    let Some(scheme) = registry.resolve(scheme_key) else {
        ctx.record(None, None, CheckFailure::message("Wrong scheme"));
        return;
    };

    ctx.path.push(PathFrame::new(scheme_key, data, index));
    visit_attributes(registry, ctx, scheme, data, options);
    ctx.path.pop();
}

fn visit_attributes(
    registry: &SchemeRegistry,
    ctx: &mut TraversalContext,
    scheme: &SchemeDescription,
    data: &Value,
    options: &ValidateOptions,
) {
    let mut hooks: Vec<(&AttributeHook, &str)> = Vec::new();

    for (key, descriptor) in &scheme.attributes {
        if descriptor.service {
            continue;
        }

        let Some(value) = data.get(key.as_str()) else {
            if descriptor.required && !options.ignore_missing_attribute {
                ctx.record(
                    Some(key),
                    None,
                    CheckFailure::message(format!("Missing attribute: {key}")),
                );
            }
            continue;
        };

        if let Some(hook) = &descriptor.handler_after {
            hooks.push((hook, key));
        }

        if !options.ignore_validation_attribute {
            if descriptor.single_tag() == Some(TypeTag::AssociatedArray) {
                visit_map_attribute(registry, ctx, descriptor, key, value, options);
                continue;
            }
            if let Err(failure) = check_value(
                descriptor.type_spec.as_ref(),
                descriptor.restrictions.as_ref(),
                value,
                options,
            ) {
                ctx.record(Some(key), Some(value), failure);
                continue;
            }
        }

        if let Some(nested) = &descriptor.scheme {
            match descriptor.single_tag() {
                Some(TypeTag::Array) => {
                    if let Some(items) = value.as_array() {
                        for (item_index, item) in items.iter().enumerate() {
                            visit(registry, ctx, nested, item, Some(item_index), options);
                        }
                    }
                }
                Some(TypeTag::Object) => {
                    if value.is_object() {
                        visit(registry, ctx, nested, value, None, options);
                    }
                }
                Some(_) => {}
                None => {
                    ctx.record(
                        Some(key),
                        Some(value),
                        CheckFailure::message(format!(
                            "Wrong scheme attribute type: {key}, must be a single type tag"
                        )),
                    );
                }
            }
        }
    }

    for (hook, key) in hooks {
        if let Some(value) = data.get(key) {
            hook("validation", None, key, value);
        }
    }
}

/// Checks a map-shaped attribute entry by entry: every key against the
/// declared key tag and restrictions, every value against the declared
/// value tag and restrictions. The first failing entry is recorded and
/// stops the scan.
fn visit_map_attribute(
    registry: &SchemeRegistry,
    ctx: &mut TraversalContext,
    descriptor: &crate::scheme::AttributeDescriptor,
    key: &str,
    value: &Value,
    options: &ValidateOptions,
) {
    let key_spec = descriptor.key_type.map(TypeSpec::Tag);
    let value_spec = descriptor.value_type.map(TypeSpec::Tag);

    let Some(entries) = value.as_object() else {
        return;
    };

    for (entry_key, entry_value) in entries {
        let key_value = Value::String(entry_key.clone());
        if let Err(failure) = check_value(
            key_spec.as_ref(),
            descriptor.key_restrictions.as_ref(),
            &key_value,
            options,
        ) {
            ctx.record(Some(key), Some(value), failure);
            return;
        }

        if let Some(value_scheme) = &descriptor.value_scheme {
            match descriptor.value_type {
                Some(TypeTag::Array) => {
                    if let Some(items) = entry_value.as_array() {
                        for (item_index, item) in items.iter().enumerate() {
                            visit(registry, ctx, value_scheme, item, Some(item_index), options);
                        }
                    }
                }
                Some(TypeTag::Object) => {
                    visit(registry, ctx, value_scheme, entry_value, None, options);
                }
                _ => {
                    ctx.record(
                        Some(key),
                        Some(value),
                        CheckFailure::message(format!(
                            "Wrong scheme attribute type: {entry_key}, must be a single type tag"
                        )),
                    );
                }
            }
        } else if let Err(failure) = check_value(
            value_spec.as_ref(),
            descriptor.value_restrictions.as_ref(),
            entry_value,
            options,
        ) {
            ctx.record(Some(key), Some(value), failure);
            return;
        }
    }
}

/// Checks one value: the type gate first, then each declared restriction
/// in order. The first violation wins.
fn check_value(
    spec: Option<&TypeSpec>,
    restrictions: Option<&Restrictions>,
    value: &Value,
    options: &ValidateOptions,
) -> Result<(), CheckFailure> {
    if options.validation_type {
        if let Some(spec) = spec {
            if !matches_spec(spec, value, options.strict_validation_type) {
                return Err(CheckFailure::type_mismatch(format!(
                    "Wrong type for value {}",
                    value_text(value)
                )));
            }
        }
    }

    let Some(restrictions) = restrictions else {
        return Ok(());
    };

    if let Some(one_of) = &restrictions.one_of {
        if !one_of.contains(value) {
            return Err(CheckFailure::restriction(
                RestrictionKind::OneOf,
                format!(
                    "The value '{}' must match one of those listed in the scheme",
                    value_text(value)
                ),
            ));
        }
    }

    // Bounds compare the string length for string-typed attributes and the
    // numeric reading otherwise. The numeric reading coerces like the
    // lenient type gate, so strings it admits still face bounds; values
    // with no numeric reading pass.
    let measured = if spec.and_then(TypeSpec::as_tag) == Some(TypeTag::String) {
        value.as_str().map(|s| s.chars().count() as f64)
    } else {
        to_number(value)
    };

    if let (Some(min), Some(measured)) = (restrictions.min, measured) {
        if measured < min {
            return Err(CheckFailure::restriction(
                RestrictionKind::Min,
                format!("The value '{}' must >= {min}", value_text(value)),
            ));
        }
    }

    if let (Some(max), Some(measured)) = (restrictions.max, measured) {
        if measured > max {
            return Err(CheckFailure::restriction(
                RestrictionKind::Max,
                format!("The value '{}' must <= {max}", value_text(value)),
            ));
        }
    }

    if let Some(handler) = &restrictions.handler {
        if let Some(message) = handler(value) {
            return Err(CheckFailure::restriction(RestrictionKind::Handler, message));
        }
    }

    Ok(())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::AttributeDescriptor;
    use serde_json::json;

    fn check(
        spec: Option<TypeSpec>,
        restrictions: Option<Restrictions>,
        value: Value,
    ) -> Result<(), CheckFailure> {
        check_value(
            spec.as_ref(),
            restrictions.as_ref(),
            &value,
            &ValidateOptions::default(),
        )
    }

    #[test]
    fn test_type_gate_runs_first() {
        let failure = check(
            Some(TypeSpec::Tag(TypeTag::Number)),
            Some(Restrictions::default().min(0.0)),
            json!("abc"),
        )
        .unwrap_err();
        assert!(failure.type_error);
        assert_eq!(failure.message, "Wrong type for value abc");
    }

    #[test]
    fn test_one_of_before_bounds() {
        let restrictions = Restrictions::default()
            .one_of(vec![json!(1), json!(2)])
            .min(10.0);
        let failure = check(Some(TypeSpec::Tag(TypeTag::Number)), Some(restrictions), json!(3))
            .unwrap_err();
        assert_eq!(failure.restriction, Some(RestrictionKind::OneOf));
    }

    #[test]
    fn test_string_bounds_measure_length() {
        let spec = Some(TypeSpec::Tag(TypeTag::String));
        let restrictions = Restrictions::default().min(2.0).max(4.0);
        assert!(check(spec.clone(), Some(restrictions.clone()), json!("abc")).is_ok());

        let failure = check(spec.clone(), Some(restrictions.clone()), json!("a")).unwrap_err();
        assert_eq!(failure.restriction, Some(RestrictionKind::Min));

        let failure = check(spec, Some(restrictions), json!("abcde")).unwrap_err();
        assert_eq!(failure.restriction, Some(RestrictionKind::Max));
    }

    #[test]
    fn test_numeric_bounds() {
        let spec = Some(TypeSpec::Tag(TypeTag::Number));
        let restrictions = Restrictions::default().min(0.0).max(120.0);
        assert!(check(spec.clone(), Some(restrictions.clone()), json!(25)).is_ok());

        let failure = check(spec, Some(restrictions), json!(200)).unwrap_err();
        assert_eq!(failure.restriction, Some(RestrictionKind::Max));
        assert_eq!(failure.message, "The value '200' must <= 120");
    }

    #[test]
    fn test_lenient_numeric_strings_face_bounds() {
        // A string the lenient number gate admits is bounded by its numeric
        // reading, not skipped.
        let spec = Some(TypeSpec::Tag(TypeTag::Number));
        let restrictions = Restrictions::default().min(5.0);

        let failure = check(spec.clone(), Some(restrictions.clone()), json!("3")).unwrap_err();
        assert_eq!(failure.restriction, Some(RestrictionKind::Min));
        assert_eq!(failure.message, "The value '3' must >= 5");

        assert!(check(spec, Some(restrictions), json!("10")).is_ok());
    }

    #[test]
    fn test_handler_restriction() {
        let restrictions = Restrictions::default().handler(|value| {
            (value == &json!("bad")).then(|| "rejected by handler".to_string())
        });
        let failure = check(None, Some(restrictions.clone()), json!("bad")).unwrap_err();
        assert_eq!(failure.restriction, Some(RestrictionKind::Handler));
        assert_eq!(failure.message, "rejected by handler");

        assert!(check(None, Some(restrictions), json!("good")).is_ok());
    }

    #[test]
    fn test_missing_required_attribute_recorded() {
        let registry = SchemeRegistry::of(
            SchemeDescription::new("users")
                .attribute("id", AttributeDescriptor::typed(TypeTag::String).required()),
        )
        .unwrap();

        let report = run(
            &registry,
            &json!({"name": "n"}),
            "users",
            &ValidateOptions::default(),
        );
        let records = report.records("users");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "Missing attribute: id");
        assert_eq!(records[0].scheme_attribute.as_deref(), Some("id"));
    }

    #[test]
    fn test_unknown_scheme_recorded() {
        let registry =
            SchemeRegistry::of(SchemeDescription::new("known")).unwrap();
        let report = run(
            &registry,
            &json!({}),
            "unknown",
            &ValidateOptions::default(),
        );
        assert_eq!(report.records("unknown")[0].message, "Wrong scheme");
    }

    #[test]
    fn test_map_attribute_short_circuits() {
        let descriptor = AttributeDescriptor::map_of(TypeTag::String, TypeTag::Number);
        let registry = SchemeRegistry::of(
            SchemeDescription::new("stats").attribute("counters", descriptor),
        )
        .unwrap();

        let report = run(
            &registry,
            &json!({"counters": {"a": "not a number", "b": "also bad"}}),
            "stats",
            &ValidateOptions {
                strict_validation_type: true,
                ..ValidateOptions::default()
            },
        );
        // First failing entry stops the scan.
        assert_eq!(report.records("stats").len(), 1);
    }
}
