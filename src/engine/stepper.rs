//! Lazy bottom-up adjustment stepper
//!
//! Iterative variant of the adjustment traversal driven by an explicit
//! work stack instead of recursion. Each call to [`AdjustStepper::next`]
//! runs until one element finishes and yields it; nested elements finish
//! before the element containing them, so consumers observe a bottom-up
//! completion order. Exhausting the stepper produces the same root
//! elements as the recursive adjustment.

use std::collections::VecDeque;

use serde_json::{Map, Value};

use crate::scheme::{AttributeHook, HookState, SchemeDescription, SchemeRegistry};
use crate::types::TypeTag;

use super::attrs;
use super::context::{elements, AdjustOptions};

/// One finished element, yielded bottom-up.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustStep {
    /// Key of the scheme the element was adjusted under.
    pub scheme_key: String,
    /// The fully adjusted element.
    pub element: Value,
}

/// Where a finished element is delivered.
enum Slot {
    /// A root element; goes to the finished list.
    Root,
    /// An object-valued attribute of the parent element.
    Attr(String),
    /// The next item of an array-valued attribute of the parent element.
    Item(String),
}

/// Items of an array-valued nested attribute still waiting to be adjusted.
struct ArrayFill {
    key: String,
    nested: String,
    remaining: VecDeque<Value>,
}

/// One in-progress element on the work stack.
struct Frame<'a> {
    scheme: &'a SchemeDescription,
    data: Value,
    result: Map<String, Value>,
    cursor: usize,
    slot: Slot,
    pending: Option<ArrayFill>,
    started: bool,
    hooks: Vec<(&'a AttributeHook, &'a str)>,
}

impl<'a> Frame<'a> {
    fn new(scheme: &'a SchemeDescription, data: Value, slot: Slot) -> Self {
        Self {
            scheme,
            data,
            result: Map::new(),
            cursor: 0,
            slot,
            pending: None,
            started: false,
            hooks: Vec::new(),
        }
    }
}

/// Work-stack iterator over adjusted elements.
pub struct AdjustStepper<'a> {
    registry: &'a SchemeRegistry,
    options: AdjustOptions,
    root_key: String,
    roots: VecDeque<Value>,
    stack: Vec<Frame<'a>>,
    finished: Vec<Value>,
    cache: Map<String, Value>,
}

impl<'a> AdjustStepper<'a> {
    pub(super) fn new(
        registry: &'a SchemeRegistry,
        data: &Value,
        root_key: &str,
        options: AdjustOptions,
    ) -> Self {
        Self {
            registry,
            options,
            root_key: root_key.to_string(),
            roots: elements(data).iter().cloned().collect(),
            stack: Vec::new(),
            finished: Vec::new(),
            cache: Map::new(),
        }
    }

    /// Drains the stepper and returns the finished root elements, in input
    /// order.
    pub fn into_elements(mut self) -> Vec<Value> {
        while self.next().is_some() {}
        self.finished
    }

    /// Pushes a frame for the given scheme, or delivers an empty element
    /// straight to the slot when the scheme is unknown.
    fn open(&mut self, scheme_key: &str, data: Value, slot: Slot) {
        match self.registry.resolve(scheme_key) {
            Some(scheme) => self.stack.push(Frame::new(scheme, data, slot)),
            None => self.deliver(slot, Value::Object(Map::new())),
        }
    }

    /// Hands a finished element to its destination.
    fn deliver(&mut self, slot: Slot, element: Value) {
        match slot {
            Slot::Root => self.finished.push(element),
            Slot::Attr(key) => {
                if let Some(parent) = self.stack.last_mut() {
                    parent.result.insert(key, element);
                }
            }
            Slot::Item(key) => {
                if let Some(parent) = self.stack.last_mut() {
                    if let Some(Value::Array(items)) = parent.result.get_mut(&key) {
                        items.push(element);
                    }
                }
            }
        }
    }

    /// Advances the top frame by one unit of work. Returns the finished
    /// element when the frame completes, `None` when it pushed a child or
    /// merely progressed.
    fn step(&mut self) -> Option<AdjustStep> {
        let mut frame = self.stack.pop()?;
        let scheme = frame.scheme;

        if !frame.started {
            frame.started = true;
            if let Some(hook) = &scheme.before {
                let mut state = HookState {
                    cache: &mut self.cache,
                    mode: "adjust",
                };
                hook(&frame.data, &mut frame.result, &mut state);
            }
        }

        if let Some(mut fill) = frame.pending.take() {
            if let Some(item) = fill.remaining.pop_front() {
                let slot = Slot::Item(fill.key.clone());
                let nested = fill.nested.clone();
                frame.pending = Some(fill);
                self.stack.push(frame);
                self.open(&nested, item, slot);
                return None;
            }
        }

        while frame.cursor < scheme.attributes.len() {
            let (key, descriptor) = &scheme.attributes[frame.cursor];
            frame.cursor += 1;

            if descriptor.service || descriptor.pass == Some(false) {
                continue;
            }
            if let Some(hook) = &descriptor.handler_after {
                frame.hooks.push((hook, key));
            }

            let present = frame.data.get(key.as_str()).is_some();
            if !present {
                if !self.options.include_missing_attributes && !descriptor.required {
                    continue;
                }
                if let Some(value) =
                    attrs::missing_value(descriptor, &frame.result, key, &frame.data)
                {
                    frame.result.insert(key.clone(), value);
                }
                if !descriptor.traverse_default {
                    continue;
                }
            }

            if let Some(nested) = &descriptor.scheme {
                let value = frame.data.get(key.as_str());
                if value == Some(&Value::Null) {
                    frame.result.insert(key.clone(), Value::Null);
                    continue;
                }
                match descriptor.single_tag() {
                    Some(TypeTag::Array) => {
                        let remaining: VecDeque<Value> = value
                            .and_then(Value::as_array)
                            .map(|items| items.iter().cloned().collect())
                            .unwrap_or_default();
                        frame.result.insert(key.clone(), Value::Array(Vec::new()));
                        frame.pending = Some(ArrayFill {
                            key: key.clone(),
                            nested: nested.clone(),
                            remaining,
                        });
                        self.stack.push(frame);
                        return None;
                    }
                    Some(TypeTag::Object) => {
                        let child = value
                            .filter(|v| v.is_object())
                            .cloned()
                            .unwrap_or_else(|| Value::Object(Map::new()));
                        let slot = Slot::Attr(key.clone());
                        let nested = nested.clone();
                        self.stack.push(frame);
                        self.open(&nested, child, slot);
                        return None;
                    }
                    _ => {}
                }
            } else if let Some(value) = frame.data.get(key.as_str()) {
                if descriptor.single_tag() == Some(TypeTag::AssociatedArray) {
                    frame.result.insert(
                        key.clone(),
                        attrs::adjust_map(descriptor, value, self.options.adjust_types),
                    );
                } else if let Some(adjusted) = attrs::adjust_scalar(
                    descriptor.type_spec.as_ref(),
                    value,
                    self.options.adjust_types,
                ) {
                    frame.result.insert(key.clone(), adjusted);
                }
            }
        }

        if !self.options.exclude_unnecessary_attributes {
            if let Some(source) = frame.data.as_object() {
                for (key, value) in source {
                    if scheme.get(key).is_none() {
                        frame.result.insert(key.clone(), value.clone());
                    }
                }
            }
        }

        for (hook, key) in &frame.hooks {
            hook("adjust", Some(&mut frame.result), key, &frame.data);
        }

        if let Some(hook) = &scheme.after {
            let mut state = HookState {
                cache: &mut self.cache,
                mode: "adjust",
            };
            hook(&frame.data, &mut frame.result, &mut state);
        }

        let element = Value::Object(frame.result);
        self.deliver(frame.slot, element.clone());
        Some(AdjustStep {
            scheme_key: scheme.scheme_key.clone(),
            element,
        })
    }
}

impl Iterator for AdjustStepper<'_> {
    type Item = AdjustStep;

    fn next(&mut self) -> Option<AdjustStep> {
        loop {
            if self.stack.is_empty() {
                let root = self.roots.pop_front()?;
                let root_key = self.root_key.clone();
                self.open(&root_key, root, Slot::Root);
                continue;
            }
            if let Some(step) = self.step() {
                return Some(step);
            }
        }
    }
}
