//! SOAP envelope construction and reply decoding.

use std::collections::HashSet;

use serde_json::{Map, Number, Value};
use xroad_core::namespaces::{SOAP_ENV, SOAP_ENV_PREFIX};
use xroad_core::xml::Element;
use xroad_core::HeaderState;

/// Prefix of the service's target namespace in request bodies.
pub const TARGET_PREFIX: &str = "tns";

/// A SOAP `Fault`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// `faultcode`.
    pub code: String,
    /// `faultstring`.
    pub message: String,
    /// Serialised `detail` content.
    pub detail: Option<String>,
}

/// Builds a request envelope: the X-Road header and a body holding
/// `<tns:{operation}>` with one child per argument.
pub fn build_envelope(
    state: &HeaderState,
    namespace: Option<&str>,
    operation: &str,
    args: &Map<String, Value>,
) -> Element {
    let mut request = named(namespace, operation);
    if let Some(ns) = namespace {
        request.declare_namespace(TARGET_PREFIX, ns);
    }
    for (name, value) in args {
        append_value(&mut request, namespace, name, value);
    }

    Element::qualified(SOAP_ENV, SOAP_ENV_PREFIX, "Envelope")
        .with_child(state.to_soap_header())
        .with_child(Element::qualified(SOAP_ENV, SOAP_ENV_PREFIX, "Body").with_child(request))
}

fn named(namespace: Option<&str>, name: &str) -> Element {
    match namespace {
        Some(ns) => Element::qualified(ns, TARGET_PREFIX, name),
        None => Element::new(name),
    }
}

fn append_value(parent: &mut Element, namespace: Option<&str>, name: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                append_value(parent, namespace, name, item);
            }
        }
        Value::Object(fields) => {
            let mut child = named(namespace, name);
            for (field, value) in fields {
                append_value(&mut child, namespace, field, value);
            }
            parent.push(child);
        }
        Value::String(text) => parent.push(named(namespace, name).with_text(text.as_str())),
        other => parent.push(named(namespace, name).with_text(other.to_string())),
    }
}

/// The first element inside `Body`.
pub fn body_payload(envelope: &Element) -> Option<&Element> {
    envelope.child(SOAP_ENV, "Body")?.elements().next()
}

/// The fault carried by a reply, if any.
pub fn extract_fault(envelope: &Element) -> Option<Fault> {
    let fault = envelope.child(SOAP_ENV, "Body")?.child(SOAP_ENV, "Fault")?;
    let text = |name: &str| {
        fault
            .child_by_local(name)
            .map(|el| el.text().trim().to_string())
            .unwrap_or_default()
    };

    let detail = fault.child_by_local("detail").and_then(|detail| {
        let content = if detail.has_element_children() {
            detail.elements().map(Element::to_xml).collect::<String>()
        } else {
            detail.text().trim().to_string()
        };
        (!content.is_empty()).then_some(content)
    });

    Some(Fault {
        code: text("faultcode"),
        message: text("faultstring"),
        detail,
    })
}

/// Converts a reply element into JSON.
///
/// `shape` is a skeleton of the expected content (see
/// `xroad_wsdl::SchemaWalker`): list slots force arrays even for a single
/// occurrence, and numeric or boolean defaults make matching leaves typed.
/// Without a shape every leaf is a string and repeated names become arrays.
pub fn element_to_json(element: &Element, shape: Option<&Value>) -> Value {
    if !element.has_element_children() {
        return leaf_value(element.text(), shape);
    }

    let mut fields = Map::new();
    let mut lists: HashSet<&str> = HashSet::new();
    for child in element.elements() {
        let name = child.local_name();
        let child_shape = shape.and_then(first_entry).and_then(|s| s.get(name));
        let value = element_to_json(child, child_shape.and_then(first_entry));

        match fields.get_mut(name) {
            Some(Value::Array(items)) if lists.contains(name) => items.push(value),
            Some(existing) => {
                let previous = existing.take();
                *existing = Value::Array(vec![previous, value]);
                lists.insert(name);
            }
            None if matches!(child_shape, Some(Value::Array(_))) => {
                fields.insert(name.to_string(), Value::Array(vec![value]));
                lists.insert(name);
            }
            None => {
                fields.insert(name.to_string(), value);
            }
        }
    }
    Value::Object(fields)
}

fn first_entry(shape: &Value) -> Option<&Value> {
    match shape {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

fn leaf_value(text: String, shape: Option<&Value>) -> Value {
    let trimmed = text.trim();
    match shape {
        Some(Value::Number(n)) if n.is_f64() => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map_or(Value::String(text.clone()), Value::Number),
        Some(Value::Number(_)) => trimmed
            .parse::<i64>()
            .map_or(Value::String(text.clone()), Value::from),
        Some(Value::Bool(_)) => match trimmed {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => Value::String(text.clone()),
        },
        Some(Value::Null) if trimmed.is_empty() => Value::Null,
        _ => Value::String(text.clone()),
    }
}
