//! Schema introspection.
//!
//! [`SchemaWalker`] expands a [`ComplexType`] into a plain JSON mapping keyed
//! by element name. In [`WalkMode::Descriptive`] every leaf becomes
//! `{type, isOptional, maxOccurs, minOccurs, nillable}`; in
//! [`WalkMode::Skeletal`] every leaf becomes a default value, which gives a
//! request payload template.
//!
//! Repeated complex elements become a list slot and the walk fills its first
//! entry. The walk never fails on cyclic schemas: a named type or a global
//! element already being expanded on the current path is emitted as an empty
//! slot, and nesting beyond `max_depth` is cut off, leaving the partial
//! result in place.

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::document::WsdlDocument;
use crate::error::WsdlResult;
use crate::schema::{ComplexType, ElementDecl, MaxOccurs, SchemaModel, TypeRef};

/// Default nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// What leaves turn into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// Type information per leaf.
    Descriptive,
    /// Default value per leaf.
    Skeletal,
}

/// An entry on the active expansion path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame<'p> {
    Type(&'p str),
    Element(&'p str),
}

enum Content<'m> {
    Complex(Option<&'m str>, &'m ComplexType),
    Simple(&'m str),
}

/// Walks a [`SchemaModel`].
#[derive(Debug, Clone, Copy)]
pub struct SchemaWalker<'m> {
    model: &'m SchemaModel,
    mode: WalkMode,
    max_depth: usize,
}

impl<'m> SchemaWalker<'m> {
    /// Creates a walker with the default depth limit.
    pub fn new(model: &'m SchemaModel, mode: WalkMode) -> Self {
        Self {
            model,
            mode,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Overrides the depth limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Expands `ty` into `acc`.
    ///
    /// With a `key`, the content lands in `acc[key]` (created as a mapping if
    /// absent; an existing list slot has its first entry filled). Without a
    /// key, `acc` itself is the slot.
    pub fn walk(&self, ty: &'m ComplexType, mut acc: Value, key: Option<&str>, depth: usize) -> Value {
        let mut active = Vec::new();
        match key {
            Some(key) => {
                let slot = slot_map(&mut acc)
                    .entry(key.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                self.walk_into(ty, slot, depth, &mut active);
            }
            None => self.walk_into(ty, &mut acc, depth, &mut active),
        }
        acc
    }

    /// Expands the content of a global element. `None` if the element is unknown.
    pub fn walk_element(&self, name: &str) -> Option<Value> {
        let decl = self.model.element(name)?;
        Some(match self.content(&decl.type_ref) {
            Some(Content::Complex(type_name, ty)) => {
                let mut acc = Value::Object(Map::new());
                let mut active = vec![Frame::Element(name)];
                if let Some(type_name) = type_name {
                    active.push(Frame::Type(type_name));
                }
                self.walk_into(ty, &mut acc, 0, &mut active);
                acc
            }
            Some(Content::Simple(type_name)) => self.leaf(decl, type_name),
            None => Value::Object(Map::new()),
        })
    }

    /// Expands a named type (rpc-style parts).
    pub fn walk_type(&self, name: &str) -> Value {
        match self.model.complex_type(name) {
            Some(ty) => {
                let mut acc = Value::Object(Map::new());
                let mut active = vec![Frame::Type(name)];
                self.walk_into(ty, &mut acc, 0, &mut active);
                acc
            }
            None => {
                let decl = ElementDecl {
                    name: name.to_string(),
                    type_ref: TypeRef::Simple(name.to_string()),
                    min_occurs: 1,
                    max_occurs: MaxOccurs::Bounded(1),
                    nillable: false,
                };
                self.leaf(&decl, name)
            }
        }
    }

    fn walk_into<'p>(&self, ty: &'m ComplexType, slot: &mut Value, depth: usize, active: &mut Vec<Frame<'p>>)
    where
        'm: 'p,
    {
        if depth >= self.max_depth {
            debug!(depth, max_depth = self.max_depth, "schema walk depth limit reached");
            return;
        }

        if let Some(base) = ty.base.as_deref() {
            if let Some(base_ty) = self.model.complex_type(base) {
                if !active.contains(&Frame::Type(base)) {
                    active.push(Frame::Type(base));
                    self.walk_into(base_ty, slot, depth + 1, active);
                    active.pop();
                }
            }
        }

        for decl in &ty.particles {
            let (type_ref, element) = match &decl.type_ref {
                TypeRef::ElementRef(name) => match self.model.element(name) {
                    Some(global) => (&global.type_ref, Some(Frame::Element(name.as_str()))),
                    None => (&decl.type_ref, None),
                },
                other => (other, None),
            };

            let value = match self.content(type_ref) {
                Some(Content::Simple(type_name)) => self.leaf(decl, type_name),
                Some(Content::Complex(type_name, child)) => {
                    let mut child_slot = empty_slot(decl.max_occurs);
                    let mut frames: Vec<Frame<'p>> = Vec::with_capacity(2);
                    if let Some(frame) = element {
                        frames.push(frame);
                    }
                    if let Some(name) = type_name {
                        frames.push(Frame::Type(name));
                    }
                    if frames.iter().any(|frame| active.contains(frame)) {
                        debug!(element = %decl.name, "recursive reference not expanded");
                        slot_map(&mut child_slot);
                    } else {
                        let mark = active.len();
                        active.extend(frames);
                        self.walk_into(child, &mut child_slot, depth + 1, active);
                        active.truncate(mark);
                    }
                    child_slot
                }
                None => self.leaf(decl, "anyType"),
            };
            slot_map(slot).insert(decl.name.clone(), value);
        }
    }

    fn content(&self, type_ref: &'m TypeRef) -> Option<Content<'m>> {
        match type_ref {
            TypeRef::Named(name) => Some(match self.model.complex_type(name) {
                Some(ty) => complex_or_simple(Some(name.as_str()), ty),
                None => Content::Simple(name.as_str()),
            }),
            TypeRef::Anonymous(ty) => Some(complex_or_simple(None, ty)),
            TypeRef::Simple(name) => Some(Content::Simple(name.as_str())),
            TypeRef::ElementRef(name) => {
                let global = self.model.element(name)?;
                match &global.type_ref {
                    TypeRef::ElementRef(_) => None,
                    other => self.content(other),
                }
            }
        }
    }

    fn leaf(&self, decl: &ElementDecl, type_name: &str) -> Value {
        match self.mode {
            WalkMode::Descriptive => {
                let max_occurs = match decl.max_occurs {
                    MaxOccurs::Bounded(n) => json!(n),
                    MaxOccurs::Unbounded => json!("unbounded"),
                };
                json!({
                    "type": type_name,
                    "isOptional": decl.min_occurs == 0,
                    "maxOccurs": max_occurs,
                    "minOccurs": decl.min_occurs,
                    "nillable": decl.nillable,
                })
            }
            WalkMode::Skeletal => {
                let value = if decl.nillable {
                    Value::Null
                } else {
                    default_value(self.model.builtin_of(type_name))
                };
                if decl.max_occurs.is_repeated() {
                    Value::Array(vec![value])
                } else {
                    value
                }
            }
        }
    }
}

fn complex_or_simple<'m>(name: Option<&'m str>, ty: &'m ComplexType) -> Content<'m> {
    match (&ty.simple_content, ty.particles.is_empty() && ty.base.is_none()) {
        (Some(base), true) => Content::Simple(base.as_str()),
        _ => Content::Complex(name, ty),
    }
}

fn empty_slot(max_occurs: MaxOccurs) -> Value {
    if max_occurs.is_repeated() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

/// The mapping to populate: the slot itself, or the first entry of a list
/// slot (created on demand).
fn slot_map(slot: &mut Value) -> &mut Map<String, Value> {
    if let Value::Array(items) = slot {
        if items.is_empty() {
            items.push(Value::Object(Map::new()));
        }
    }
    let target = match slot {
        Value::Array(items) => &mut items[0],
        other => other,
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    match target {
        Value::Object(map) => map,
        _ => unreachable!("slot was just replaced with an object"),
    }
}

fn default_value(builtin: &str) -> Value {
    match builtin {
        "boolean" => Value::Bool(false),
        "int" | "integer" | "long" | "short" | "byte" | "nonNegativeInteger" | "positiveInteger"
        | "nonPositiveInteger" | "negativeInteger" | "unsignedInt" | "unsignedLong"
        | "unsignedShort" | "unsignedByte" => json!(0),
        "decimal" | "float" | "double" => json!(0.0),
        _ => Value::String(String::new()),
    }
}

fn message_shape(walker: &SchemaWalker<'_>, doc: &WsdlDocument, message: Option<&str>) -> Value {
    let parts = message.map(|m| doc.message_parts(m)).unwrap_or_default();
    if let [part] = parts {
        if let Some(element) = &part.element {
            return walker
                .walk_element(element)
                .unwrap_or_else(|| Value::Object(Map::new()));
        }
    }

    let mut shape = Map::new();
    for part in parts {
        let value = match (&part.element, &part.type_name) {
            (Some(element), _) => walker.walk_element(element).unwrap_or(Value::Null),
            (None, Some(type_name)) => walker.walk_type(type_name),
            (None, None) => Value::Null,
        };
        shape.insert(part.name.clone(), value);
    }
    Value::Object(shape)
}

/// Type description of an operation's input.
pub fn describe_input(doc: &WsdlDocument, model: &SchemaModel, operation: &str) -> WsdlResult<Value> {
    let op = doc.operation(operation)?;
    let walker = SchemaWalker::new(model, WalkMode::Descriptive);
    Ok(message_shape(&walker, doc, op.input.as_deref()))
}

/// Type description of an operation's output.
pub fn describe_output(doc: &WsdlDocument, model: &SchemaModel, operation: &str) -> WsdlResult<Value> {
    let op = doc.operation(operation)?;
    let walker = SchemaWalker::new(model, WalkMode::Descriptive);
    Ok(message_shape(&walker, doc, op.output.as_deref()))
}

/// Default payload for an operation's input.
pub fn input_skeleton(doc: &WsdlDocument, model: &SchemaModel, operation: &str) -> WsdlResult<Value> {
    let op = doc.operation(operation)?;
    let walker = SchemaWalker::new(model, WalkMode::Skeletal);
    Ok(message_shape(&walker, doc, op.input.as_deref()))
}
