//! Owned, namespace-aware XML elements.
//!
//! SOAP envelopes and service descriptions are parsed with `roxmltree` into an
//! owned [`Element`] tree so interceptors and patchers can mutate them in place,
//! then serialised back with the namespace declarations each element needs.
//!
//! ```
//! use xroad_core::xml::Element;
//!
//! let mut root = Element::parse(r#"<a xmlns="urn:x"><b>1</b></a>"#).unwrap();
//! root.child_by_local_mut("b").unwrap().set_text("2");
//! assert_eq!(root.to_xml(), r#"<a xmlns="urn:x"><b>2</b></a>"#);
//! ```

use std::fmt::Write as _;

use crate::error::XRoadResult;
use crate::namespaces;

/// A child node of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A nested element.
    Element(Element),
    /// Character data.
    Text(String),
}

/// An attribute of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Namespace URI, if the attribute is qualified.
    pub namespace: Option<String>,
    /// Preferred prefix for a qualified attribute.
    pub prefix: Option<String>,
    /// Local name.
    pub name: String,
    /// Attribute value (unescaped).
    pub value: String,
}

/// An owned XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    namespace: Option<String>,
    prefix: Option<String>,
    name: String,
    attributes: Vec<Attribute>,
    declarations: Vec<(Option<String>, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Creates an element without a namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            prefix: None,
            name: name.into(),
            attributes: Vec::new(),
            declarations: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a namespace-qualified element rendered with `prefix`.
    pub fn qualified(namespace: &str, prefix: &str, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
            ..Self::new(name)
        }
    }

    /// Parses a document and returns its root element.
    pub fn parse(text: &str) -> XRoadResult<Self> {
        let doc = roxmltree::Document::parse(text)?;
        Ok(Self::from_node(doc.root_element()))
    }

    /// Parses a UTF-8 byte buffer and returns its root element.
    pub fn parse_bytes(bytes: &[u8]) -> XRoadResult<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| crate::XRoadError::Xml(format!("document is not UTF-8: {e}")))?;
        Self::parse(text.trim_start_matches('\u{feff}'))
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let tag = node.tag_name();
        let namespace = tag.namespace().map(str::to_string);
        let prefix = tag
            .namespace()
            .and_then(|uri| node.lookup_prefix(uri))
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let inherited: Vec<(Option<&str>, &str)> = node
            .parent_element()
            .map(|parent| parent.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
            .unwrap_or_default();
        let declarations = node
            .namespaces()
            .filter(|ns| ns.uri() != namespaces::XML)
            .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
            .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
            .collect();

        let attributes = node
            .attributes()
            .map(|attr| Attribute {
                namespace: attr.namespace().map(str::to_string),
                prefix: attr
                    .namespace()
                    .and_then(|uri| node.lookup_prefix(uri))
                    .map(str::to_string),
                name: attr.name().to_string(),
                value: attr.value().to_string(),
            })
            .collect();

        // Whitespace between child elements is formatting; in a leaf it is the value.
        let leaf = !node.children().any(|child| child.is_element());
        let mut children = Vec::new();
        for child in node.children() {
            if child.is_element() {
                children.push(Node::Element(Self::from_node(child)));
            } else if child.is_text() {
                if let Some(text) = child.text().filter(|t| leaf || !t.trim().is_empty()) {
                    children.push(Node::Text(text.to_string()));
                }
            }
        }

        Self {
            namespace,
            prefix,
            name: tag.name().to_string(),
            attributes,
            declarations,
            children,
        }
    }

    /// Declares a namespace on this element.
    #[must_use]
    pub fn with_namespace(mut self, prefix: &str, uri: &str) -> Self {
        self.declare_namespace(prefix, uri);
        self
    }

    /// Declares a namespace on this element. An empty prefix declares the default namespace.
    pub fn declare_namespace(&mut self, prefix: &str, uri: &str) {
        let prefix = (!prefix.is_empty()).then(|| prefix.to_string());
        self.declarations.retain(|(p, _)| *p != prefix);
        self.declarations.push((prefix, uri.to_string()));
    }

    /// Adds an unqualified attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Adds a namespace-qualified attribute.
    #[must_use]
    pub fn with_qualified_attribute(
        mut self,
        namespace: &str,
        prefix: &str,
        name: &str,
        value: impl Into<String>,
    ) -> Self {
        self.attributes
            .retain(|a| !(a.name == name && a.namespace.as_deref() == Some(namespace)));
        self.attributes.push(Attribute {
            namespace: Some(namespace.to_string()),
            prefix: Some(prefix.to_string()),
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    /// Appends a child element.
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    /// Replaces the content with a single text node.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    /// Local name.
    pub fn local_name(&self) -> &str {
        &self.name
    }

    /// Namespace URI.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Prefix the element is rendered with.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns true if the element has the given namespace and local name.
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    /// Looks up an attribute by local name, ignoring its namespace.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// All attributes.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Sets an attribute by local name, keeping the namespace of an existing one.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute {
                namespace: None,
                prefix: None,
                name: name.to_string(),
                value,
            }),
        }
    }

    /// All child nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.children
    }

    /// Iterates over child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// Iterates mutably over child elements.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// Returns true if the element has at least one child element.
    pub fn has_element_children(&self) -> bool {
        self.elements().next().is_some()
    }

    /// First child element with the given namespace and local name.
    pub fn child(&self, namespace: &str, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.is(namespace, name))
    }

    /// Mutable variant of [`Element::child`].
    pub fn child_mut(&mut self, namespace: &str, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|el| el.is(namespace, name))
    }

    /// First child element with the given local name in any namespace.
    pub fn child_by_local(&self, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.name == name)
    }

    /// Mutable variant of [`Element::child_by_local`].
    pub fn child_by_local_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|el| el.name == name)
    }

    /// Appends a child element.
    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Appends a text node.
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    /// Removes every child element for which `remove` returns true. Returns the count removed.
    pub fn remove_children<F>(&mut self, mut remove: F) -> usize
    where
        F: FnMut(&Element) -> bool,
    {
        let before = self.children.len();
        self.children.retain(|node| match node {
            Node::Element(el) => !remove(el),
            Node::Text(_) => true,
        });
        before - self.children.len()
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Replaces all children with a single text node (or nothing for empty text).
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.children.clear();
        if !text.is_empty() {
            self.children.push(Node::Text(text));
        }
    }

    /// Serialises the element without an XML declaration.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        let mut scope = Vec::new();
        self.write_into(&mut out, &mut scope);
        out
    }

    /// Serialises the element as a standalone UTF-8 document.
    pub fn to_document(&self) -> String {
        format!("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n{}", self.to_xml())
    }

    fn write_into(&self, out: &mut String, scope: &mut Vec<(Option<String>, String)>) {
        let mark = scope.len();
        let mut declared: Vec<(Option<String>, String)> = Vec::new();

        let mut declare = |scope: &mut Vec<(Option<String>, String)>, prefix: Option<String>, uri: &str| {
            if resolve(scope, prefix.as_deref()) != Some(uri) {
                scope.push((prefix.clone(), uri.to_string()));
                declared.push((prefix, uri.to_string()));
            }
        };

        for (prefix, uri) in &self.declarations {
            declare(scope, prefix.clone(), uri);
        }

        match &self.namespace {
            Some(uri) => declare(scope, self.prefix.clone(), uri),
            None => {
                if resolve(scope, None).is_some_and(|uri| !uri.is_empty()) {
                    declare(scope, None, "");
                }
            }
        }

        let mut rendered_attrs = Vec::with_capacity(self.attributes.len());
        for attr in &self.attributes {
            let qname = match &attr.namespace {
                Some(uri) if uri == namespaces::XML => format!("xml:{}", attr.name),
                Some(uri) => {
                    let prefix = attr
                        .prefix
                        .clone()
                        .filter(|p| resolve(scope, Some(p.as_str())).map_or(true, |bound| bound == uri.as_str()))
                        .or_else(|| prefix_for(scope, uri))
                        .unwrap_or_else(|| "ns0".to_string());
                    declare(scope, Some(prefix.clone()), uri);
                    format!("{prefix}:{}", attr.name)
                }
                None => attr.name.clone(),
            };
            rendered_attrs.push((qname, &attr.value));
        }

        let qname = match &self.prefix {
            Some(prefix) if self.namespace.is_some() => format!("{prefix}:{}", self.name),
            _ => self.name.clone(),
        };

        out.push('<');
        out.push_str(&qname);
        for (prefix, uri) in &declared {
            match prefix {
                Some(p) => {
                    let _ = write!(out, " xmlns:{p}=\"{}\"", escape_attr(uri));
                }
                None => {
                    let _ = write!(out, " xmlns=\"{}\"", escape_attr(uri));
                }
            }
        }
        for (name, value) in rendered_attrs {
            let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
        }

        if self.children.is_empty() {
            out.push_str("/>");
        } else {
            out.push('>');
            for child in &self.children {
                match child {
                    Node::Element(el) => el.write_into(out, scope),
                    Node::Text(text) => out.push_str(&escape_text(text)),
                }
            }
            let _ = write!(out, "</{qname}>");
        }

        scope.truncate(mark);
    }
}

fn resolve<'s>(scope: &'s [(Option<String>, String)], prefix: Option<&str>) -> Option<&'s str> {
    scope
        .iter()
        .rev()
        .find(|(p, _)| p.as_deref() == prefix)
        .map(|(_, uri)| uri.as_str())
}

fn prefix_for(scope: &[(Option<String>, String)], uri: &str) -> Option<String> {
    scope
        .iter()
        .rev()
        .filter_map(|(p, u)| p.as_ref().filter(|_| u == uri))
        .find(|p| resolve(scope, Some(p.as_str())) == Some(uri))
        .cloned()
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}
