//! Adjustment traversal
//!
//! Rebuilds every element attribute by attribute in scheme declaration
//! order: fills absent attributes with defaults or zero values, coerces
//! present scalars, recurses into nested schemes and rebuilds map-shaped
//! attributes entry by entry. The input is never mutated.

use serde_json::{Map, Value};

use crate::scheme::{AttributeHook, HookState, SchemeDescription, SchemeRegistry};
use crate::types::TypeTag;

use super::attrs;
use super::context::{elements, AdjustOptions, PathFrame, TraversalContext};

pub(super) fn run(
    registry: &SchemeRegistry,
    data: &Value,
    root_key: &str,
    options: &AdjustOptions,
) -> Vec<Value> {
    let mut ctx = TraversalContext::new(root_key);
    elements(data)
        .iter()
        .enumerate()
        .map(|(index, element)| {
            Value::Object(visit(registry, &mut ctx, root_key, element, Some(index), options))
        })
        .collect()
}

fn visit(
    registry: &SchemeRegistry,
    ctx: &mut TraversalContext,
    scheme_key: &str,
    data: &Value,
    index: Option<usize>,
    options: &AdjustOptions,
) -> Map<String, Value> {
    let Some(scheme) = registry.resolve(scheme_key) else {
        return Map::new();
    };

    ctx.path.push(PathFrame::new(scheme_key, data, index));
    let result = visit_element(registry, ctx, scheme, data, options);
    ctx.path.pop();
    result
}

fn visit_element(
    registry: &SchemeRegistry,
    ctx: &mut TraversalContext,
    scheme: &SchemeDescription,
    data: &Value,
    options: &AdjustOptions,
) -> Map<String, Value> {
    let mut result = Map::new();

    if let Some(hook) = &scheme.before {
        let mut state = HookState {
            cache: &mut ctx.cache,
            mode: "adjust",
        };
        hook(data, &mut result, &mut state);
    }

    let mut hooks: Vec<(&AttributeHook, &str)> = Vec::new();

    for (key, descriptor) in &scheme.attributes {
        if descriptor.service || descriptor.pass == Some(false) {
            continue;
        }
        if let Some(hook) = &descriptor.handler_after {
            hooks.push((hook, key));
        }

        let present = data.get(key.as_str()).is_some();
        if !present {
            if !options.include_missing_attributes && !descriptor.required {
                continue;
            }
            if let Some(value) = attrs::missing_value(descriptor, &result, key, data) {
                result.insert(key.clone(), value);
            }
            if !descriptor.traverse_default {
                continue;
            }
        }

        if let Some(nested) = &descriptor.scheme {
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
                                nested,
                                item,
                                Some(item_index),
                                options,
                            )));
                        }
                    }
                    result.insert(key.clone(), Value::Array(items));
                }
                Some(TypeTag::Object) => {
                    let empty = Value::Object(Map::new());
                    let source = value.filter(|v| v.is_object()).unwrap_or(&empty);
                    result.insert(
                        key.clone(),
                        Value::Object(visit(registry, ctx, nested, source, None, options)),
                    );
                }
                _ => {}
            }
        } else if let Some(value) = data.get(key.as_str()) {
            if descriptor.single_tag() == Some(TypeTag::AssociatedArray) {
                result.insert(
                    key.clone(),
                    attrs::adjust_map(descriptor, value, options.adjust_types),
                );
            } else if let Some(adjusted) =
                attrs::adjust_scalar(descriptor.type_spec.as_ref(), value, options.adjust_types)
            {
                result.insert(key.clone(), adjusted);
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
        hook("adjust", Some(&mut result), key, data);
    }

    if let Some(hook) = &scheme.after {
        let mut state = HookState {
            cache: &mut ctx.cache,
            mode: "adjust",
        };
        hook(data, &mut result, &mut state);
    }

    result
}
