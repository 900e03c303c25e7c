//! Aspect-driven traversal
//!
//! Generalizes the adjustment walk: per attribute the aspect's facet
//! pipeline runs first, then the engine handles the structural concerns no
//! facet covers (nested scheme recursion and map-shaped attributes).
//! Running the reserved `adjust` aspect agrees with the inline adjustment
//! traversal.

use serde_json::{Map, Value};

use crate::aspect::{Aspect, AspectError, FacetError, FacetOutcome, FacetScope};
use crate::observability::Logger;
use crate::scheme::{AttributeHook, HookState, SchemeDescription, SchemeRegistry};
use crate::types::TypeTag;

use super::attrs;
use super::context::{elements, AdjustOptions, PathFrame, TraversalContext};

pub(super) fn run(
    registry: &SchemeRegistry,
    data: &Value,
    root_key: &str,
    aspect: &Aspect,
    options: &AdjustOptions,
) -> Result<Vec<Value>, AspectError> {
    let mut ctx = TraversalContext::new(root_key);
    let mut output = Vec::with_capacity(elements(data).len());
    for (index, element) in elements(data).iter().enumerate() {
        output.push(Value::Object(visit(
            registry,
            &mut ctx,
            aspect,
            root_key,
            element,
            Some(index),
            options,
        )?));
    }
    Ok(output)
}

fn visit(
    registry: &SchemeRegistry,
    ctx: &mut TraversalContext,
    aspect: &Aspect,
    scheme_key: &str,
    data: &Value,
    index: Option<usize>,
    options: &AdjustOptions,
) -> Result<Map<String, Value>, AspectError> {
    let Some(scheme) = registry.resolve(scheme_key) else {
        return Ok(Map::new());
    };

    ctx.path.push(PathFrame::new(scheme_key, data, index));
    let result = visit_element(registry, ctx, aspect, scheme, data, options);
    ctx.path.pop();
    result
}

fn visit_element(
    registry: &SchemeRegistry,
    ctx: &mut TraversalContext,
    aspect: &Aspect,
    scheme: &SchemeDescription,
    data: &Value,
    options: &AdjustOptions,
) -> Result<Map<String, Value>, AspectError> {
    let mut result = Map::new();

    if let Some(hook) = &scheme.before {
        let mut state = HookState {
            cache: &mut ctx.cache,
            mode: &aspect.aspect_key,
        };
        hook(data, &mut result, &mut state);
    }

    let mut hooks: Vec<(&AttributeHook, &str)> = Vec::new();

    for (key, descriptor) in &scheme.attributes {
        if descriptor.service {
            continue;
        }
        if let Some(hook) = &descriptor.handler_after {
            hooks.push((hook, key));
        }

        let mut aborted = false;
        for facet in &aspect.facet_order {
            if !facet.declared_by(descriptor) {
                continue;
            }
            let Some(handler) = aspect.handler(*facet) else {
                continue;
            };

            let outcome = handler(&FacetScope {
                data,
                result: &result,
                attribute: key,
                facet: *facet,
                descriptor,
                scheme,
                options,
            });

            match outcome {
                Ok(FacetOutcome::Write(value)) => {
                    result.insert(key.clone(), value);
                }
                Ok(FacetOutcome::Unset) => {
                    result.remove(key.as_str());
                }
                Ok(FacetOutcome::Skip) => {}
                Ok(FacetOutcome::Continue) => {
                    aborted = true;
                    break;
                }
                Err(FacetError::Value(message)) => {
                    // Value-level handler failures are absorbed: the facet
                    // contributes nothing, the traversal goes on.
                    Logger::warn(
                        "FACET_VALUE_ERROR",
                        &[
                            ("aspect", aspect.aspect_key.as_str()),
                            ("attribute", key.as_str()),
                            ("facet", facet.name()),
                            ("message", message.as_str()),
                        ],
                    );
                }
                Err(fatal @ FacetError::Fatal(_)) => {
                    return Err(AspectError::Handler(fatal.to_string()));
                }
            }
        }
        if aborted {
            continue;
        }

        let present = data.get(key.as_str()).is_some();

        if let Some(nested) = &descriptor.scheme {
            if !present && !descriptor.traverse_default {
                continue;
            }
            let value = data.get(key.as_str());
            if value == Some(&Value::Null) {
                result.insert(key.clone(), Value::Null);
                continue;
            }
            match descriptor.single_tag() {
                Some(TypeTag::Array) => {
                    let mut items = Vec::new();
                    if let Some(source) = value.and_then(Value::as_array) {
                        for (item_index, item) in source.iter().enumerate() {
                            items.push(Value::Object(visit(
                                registry,
                                ctx,
                                aspect,
                                nested,
                                item,
                                Some(item_index),
                                options,
                            )?));
                        }
                    }
                    result.insert(key.clone(), Value::Array(items));
                }
                Some(TypeTag::Object) => {
                    let empty = Value::Object(Map::new());
                    let source = value.filter(|v| v.is_object()).unwrap_or(&empty);
                    result.insert(
                        key.clone(),
                        Value::Object(visit(registry, ctx, aspect, nested, source, None, options)?),
                    );
                }
                _ => {}
            }
        } else if present && descriptor.single_tag() == Some(TypeTag::AssociatedArray) {
            if let Some(value) = data.get(key.as_str()) {
                result.insert(
                    key.clone(),
                    attrs::adjust_map(descriptor, value, options.adjust_types),
                );
            }
        }
    }

    if !options.exclude_unnecessary_attributes {
        if let Some(source) = data.as_object() {
            for (key, value) in source {
                if scheme.get(key).is_none() {
                    result.insert(key.clone(), value.clone());
                }
            }
        }
    }

    for (hook, key) in hooks {
        hook(&aspect.aspect_key, Some(&mut result), key, data);
    }

    if let Some(hook) = &scheme.after {
        let mut state = HookState {
            cache: &mut ctx.cache,
            mode: &aspect.aspect_key,
        };
        hook(data, &mut result, &mut state);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::{self, AspectSpec, Facet, FacetHandler};
    use crate::scheme::AttributeDescriptor;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn adjusting() -> Aspect {
        aspect::resolve(AspectSpec::from("adjust")).unwrap()
    }

    #[test]
    fn test_adjust_aspect_matches_inline_adjust() {
        let registry = SchemeRegistry::new(vec![
            SchemeDescription::new("outer")
                .attribute("id", AttributeDescriptor::typed(TypeTag::String))
                .attribute(
                    "inner",
                    AttributeDescriptor::typed(TypeTag::Object).nested("inner"),
                ),
            SchemeDescription::new("inner")
                .attribute("order", AttributeDescriptor::typed(TypeTag::Number)),
        ])
        .unwrap();
        let data = json!({"id": 7, "inner": {"order": "3"}});
        let options = AdjustOptions::default();

        let processed = run(&registry, &data, "outer", &adjusting(), &options).unwrap();
        let adjusted = super::super::adjust::run(&registry, &data, "outer", &options);
        assert_eq!(processed, adjusted);
        assert_eq!(processed, vec![json!({"id": "7", "inner": {"order": 3}})]);
    }

    #[test]
    fn test_pass_false_drops_attribute() {
        let registry = SchemeRegistry::of(
            SchemeDescription::new("gated")
                .attribute("hidden", AttributeDescriptor::pass_through(false))
                .attribute("shown", AttributeDescriptor::pass_through(true)),
        )
        .unwrap();

        let processed = run(
            &registry,
            &json!({"hidden": 1, "shown": 2}),
            "gated",
            &adjusting(),
            &AdjustOptions::default(),
        )
        .unwrap();
        assert_eq!(processed, vec![json!({"shown": 2})]);
    }

    #[test]
    fn test_value_error_absorbed_fatal_aborts() {
        let failing: FacetHandler = Arc::new(|scope| {
            if scope.attribute == "soft" {
                Err(FacetError::Value("ignored".into()))
            } else {
                Err(FacetError::Fatal("broken".into()))
            }
        });
        let aspect = Aspect::new(
            "custom",
            vec![Facet::Type],
            HashMap::from([(Facet::Type, failing)]),
        );

        let soft_registry = SchemeRegistry::of(
            SchemeDescription::new("s")
                .attribute("soft", AttributeDescriptor::typed(TypeTag::String)),
        )
        .unwrap();
        let processed = run(
            &soft_registry,
            &json!({"soft": "x"}),
            "s",
            &aspect,
            &AdjustOptions::default(),
        )
        .unwrap();
        assert_eq!(processed, vec![json!({})]);

        let hard_registry = SchemeRegistry::of(
            SchemeDescription::new("s")
                .attribute("hard", AttributeDescriptor::typed(TypeTag::String)),
        )
        .unwrap();
        let error = run(
            &hard_registry,
            &json!({"hard": "x"}),
            "s",
            &aspect,
            &AdjustOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(error, AspectError::Handler(_)));
    }

    #[test]
    fn test_custom_aspect_last_write_wins() {
        let first: FacetHandler = Arc::new(|_| Ok(FacetOutcome::Write(json!("first"))));
        let second: FacetHandler = Arc::new(|_| Ok(FacetOutcome::Write(json!("second"))));
        let aspect = Aspect::new(
            "custom",
            vec![Facet::Required, Facet::Type],
            HashMap::from([(Facet::Required, first), (Facet::Type, second)]),
        );

        let registry = SchemeRegistry::of(SchemeDescription::new("s").attribute(
            "attr",
            AttributeDescriptor::typed(TypeTag::String).required(),
        ))
        .unwrap();

        let processed = run(
            &registry,
            &json!({"attr": "raw"}),
            "s",
            &aspect,
            &AdjustOptions::default(),
        )
        .unwrap();
        assert_eq!(processed, vec![json!({"attr": "second"})]);
    }

    #[test]
    fn test_undeclared_facet_handler_not_run() {
        // The handler exists but the descriptor declares no default, so the
        // default facet must not fire.
        let default_handler: FacetHandler = Arc::new(|_| Ok(FacetOutcome::Write(json!("boom"))));
        let aspect = Aspect::new(
            "custom",
            vec![Facet::Default],
            HashMap::from([(Facet::Default, default_handler)]),
        );

        let registry = SchemeRegistry::of(
            SchemeDescription::new("s")
                .attribute("attr", AttributeDescriptor::typed(TypeTag::String)),
        )
        .unwrap();

        let processed = run(
            &registry,
            &json!({"attr": "raw"}),
            "s",
            &aspect,
            &AdjustOptions::default(),
        )
        .unwrap();
        assert_eq!(processed, vec![json!({})]);
    }

    #[test]
    fn test_hooks_receive_aspect_key_as_mode() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let seen = Arc::new(AtomicBool::new(false));
        let witness = Arc::clone(&seen);
        let registry = SchemeRegistry::of(SchemeDescription::new("s").attribute(
            "attr",
            AttributeDescriptor::typed(TypeTag::String).handler_after(move |mode, _, _, _| {
                assert_eq!(mode, "transformation");
                witness.store(true, Ordering::SeqCst);
            }),
        ))
        .unwrap();

        run(
            &registry,
            &json!({"attr": "x"}),
            "s",
            &aspect::resolve(AspectSpec::from("transformation")).unwrap(),
            &AdjustOptions::default(),
        )
        .unwrap();
        assert!(seen.load(Ordering::SeqCst));
    }
}
