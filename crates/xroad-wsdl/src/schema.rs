//! Compiled XML Schema model.
//!
//! Global elements, named complex types and named simple types from every
//! embedded schema, keyed by local name. Types may refer to themselves;
//! nothing here expands references, that is left to the walker.

use std::collections::HashMap;

use xroad_core::namespaces::XSD;
use xroad_core::xml::Element;

use crate::document::{local_part, WsdlDocument};

/// `maxOccurs` of an element declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    /// A finite bound.
    Bounded(u32),
    /// `unbounded`.
    Unbounded,
}

impl MaxOccurs {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("unbounded") => Self::Unbounded,
            Some(n) => Self::Bounded(n.trim().parse().unwrap_or(1)),
            None => Self::Bounded(1),
        }
    }

    /// True if more than one occurrence is allowed.
    pub fn is_repeated(self) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Bounded(n) => n > 1,
        }
    }
}

/// What an element declaration's content is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// Built-in or named simple type, by local name.
    Simple(String),
    /// Named complex type, by local name.
    Named(String),
    /// Inline complex type.
    Anonymous(ComplexType),
    /// `ref` to a global element.
    ElementRef(String),
}

/// An `xs:element` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDecl {
    /// Element name.
    pub name: String,
    /// Content type.
    pub type_ref: TypeRef,
    /// `minOccurs` (default 1).
    pub min_occurs: u32,
    /// `maxOccurs` (default 1).
    pub max_occurs: MaxOccurs,
    /// `nillable`.
    pub nillable: bool,
}

/// A complex type flattened to its element particles.
///
/// Particles of `sequence`, `all` and `choice` groups are concatenated in
/// document order; members of a `choice` are marked optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplexType {
    /// `complexContent/extension` base, by local name.
    pub base: Option<String>,
    /// Element particles.
    pub particles: Vec<ElementDecl>,
    /// Base type of `simpleContent`, if any.
    pub simple_content: Option<String>,
}

impl ComplexType {
    fn from_element(el: &Element) -> Self {
        let mut ty = Self::default();
        collect_content(el, &mut ty, false);
        ty
    }
}

fn collect_content(el: &Element, ty: &mut ComplexType, optional: bool) {
    for child in el.elements().filter(|c| c.namespace() == Some(XSD)) {
        match child.local_name() {
            "sequence" | "all" => {
                let optional = optional || child.attribute("minOccurs") == Some("0");
                collect_content(child, ty, optional);
            }
            "choice" => collect_content(child, ty, true),
            "element" => {
                if let Some(mut decl) = ElementDecl::from_element(child) {
                    if optional {
                        decl.min_occurs = 0;
                    }
                    ty.particles.push(decl);
                }
            }
            "complexContent" => {
                for derivation in child.elements() {
                    if matches!(derivation.local_name(), "extension" | "restriction") {
                        if derivation.local_name() == "extension" {
                            ty.base = derivation.attribute("base").map(local_part);
                        }
                        collect_content(derivation, ty, optional);
                    }
                }
            }
            "simpleContent" => {
                ty.simple_content = child
                    .elements()
                    .find_map(|d| d.attribute("base"))
                    .map(local_part);
            }
            _ => {}
        }
    }
}

impl ElementDecl {
    fn from_element(el: &Element) -> Option<Self> {
        let min_occurs = el
            .attribute("minOccurs")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(1);
        let max_occurs = MaxOccurs::parse(el.attribute("maxOccurs"));
        let nillable = el.attribute("nillable") == Some("true");

        if let Some(reference) = el.attribute("ref") {
            let name = local_part(reference);
            return Some(Self {
                type_ref: TypeRef::ElementRef(name.clone()),
                name,
                min_occurs,
                max_occurs,
                nillable,
            });
        }

        let name = el.attribute("name")?.to_string();
        let type_ref = if let Some(ty) = el.attribute("type") {
            TypeRef::Named(local_part(ty))
        } else if let Some(inline) = el.child(XSD, "complexType") {
            TypeRef::Anonymous(ComplexType::from_element(inline))
        } else if let Some(inline) = el.child(XSD, "simpleType") {
            TypeRef::Simple(simple_base(inline).unwrap_or_else(|| "string".to_string()))
        } else {
            TypeRef::Simple("anyType".to_string())
        };

        Some(Self {
            name,
            type_ref,
            min_occurs,
            max_occurs,
            nillable,
        })
    }
}

fn simple_base(simple: &Element) -> Option<String> {
    simple
        .elements()
        .find(|el| matches!(el.local_name(), "restriction" | "list" | "union"))
        .and_then(|el| el.attribute("base").or_else(|| el.attribute("itemType")))
        .map(local_part)
}

/// The compiled type model of a service description.
#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    elements: HashMap<String, ElementDecl>,
    complex_types: HashMap<String, ComplexType>,
    simple_types: HashMap<String, String>,
}

impl SchemaModel {
    /// Compiles every schema embedded in the document.
    pub fn from_wsdl(doc: &WsdlDocument) -> Self {
        let mut model = Self::default();
        for schema in doc.schemas() {
            model.add_schema(schema);
        }
        model
    }

    /// Adds the top-level declarations of one `xs:schema`.
    pub fn add_schema(&mut self, schema: &Element) {
        for child in schema.elements().filter(|c| c.namespace() == Some(XSD)) {
            let Some(name) = child.attribute("name") else {
                continue;
            };
            match child.local_name() {
                "element" => {
                    if let Some(decl) = ElementDecl::from_element(child) {
                        self.elements.insert(name.to_string(), decl);
                    }
                }
                "complexType" => {
                    self.complex_types
                        .insert(name.to_string(), ComplexType::from_element(child));
                }
                "simpleType" => {
                    let base = simple_base(child).unwrap_or_else(|| "string".to_string());
                    self.simple_types.insert(name.to_string(), base);
                }
                _ => {}
            }
        }
    }

    /// A global element.
    pub fn element(&self, name: &str) -> Option<&ElementDecl> {
        self.elements.get(name)
    }

    /// A named complex type.
    pub fn complex_type(&self, name: &str) -> Option<&ComplexType> {
        self.complex_types.get(name)
    }

    /// Resolves a simple type name down to its built-in base.
    ///
    /// Unknown names are returned unchanged.
    pub fn builtin_of<'a>(&'a self, mut name: &'a str) -> &'a str {
        for _ in 0..self.simple_types.len() {
            match self.simple_types.get(name) {
                Some(base) if base != name => name = base.as_str(),
                _ => break,
            }
        }
        name
    }

    /// Number of global elements.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }
}

#[cfg(test)]
mod tests {
    use xroad_test::fixtures::{GET_DATA_WSDL, RECURSIVE_WSDL};

    use super::*;

    fn model(wsdl: &str) -> SchemaModel {
        SchemaModel::from_wsdl(&WsdlDocument::parse(wsdl.as_bytes()).unwrap())
    }

    #[test]
    fn test_global_elements() {
        let model = model(GET_DATA_WSDL);
        assert_eq!(model.element_count(), 2);

        let get_data = model.element("getData").unwrap();
        let TypeRef::Anonymous(ty) = &get_data.type_ref else {
            panic!("expected inline type");
        };
        let names: Vec<_> = ty.particles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["code", "limit", "filter", "tag"]);
        assert_eq!(ty.particles[1].min_occurs, 0);
        assert_eq!(ty.particles[3].max_occurs, MaxOccurs::Unbounded);
        assert_eq!(ty.particles[2].type_ref, TypeRef::Named("Filter".into()));
    }

    #[test]
    fn test_named_types() {
        let model = model(GET_DATA_WSDL);
        let filter = model.complex_type("Filter").unwrap();
        assert!(filter.particles[0].nillable);
        assert_eq!(model.builtin_of("Name"), "string");
        assert_eq!(model.builtin_of("int"), "int");
    }

    #[test]
    fn test_self_reference_is_representable() {
        let model = model(RECURSIVE_WSDL);
        let node = model.complex_type("Node").unwrap();
        assert_eq!(node.particles[1].type_ref, TypeRef::Named("Node".into()));
        assert!(node.particles[1].max_occurs.is_repeated());
    }

    #[test]
    fn test_choice_and_extension() {
        let schema = Element::parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:complexType name="Base">
                   <xs:sequence><xs:element name="id" type="xs:int"/></xs:sequence>
                 </xs:complexType>
                 <xs:complexType name="Derived">
                   <xs:complexContent>
                     <xs:extension base="Base">
                       <xs:choice>
                         <xs:element name="a" type="xs:string"/>
                         <xs:element name="b" type="xs:string"/>
                       </xs:choice>
                     </xs:extension>
                   </xs:complexContent>
                 </xs:complexType>
               </xs:schema>"#,
        )
        .unwrap();
        let mut model = SchemaModel::default();
        model.add_schema(&schema);

        let derived = model.complex_type("Derived").unwrap();
        assert_eq!(derived.base.as_deref(), Some("Base"));
        assert_eq!(derived.particles.len(), 2);
        assert!(derived.particles.iter().all(|p| p.min_occurs == 0));
    }

    #[test]
    fn test_max_occurs() {
        assert!(!MaxOccurs::parse(None).is_repeated());
        assert!(MaxOccurs::parse(Some("5")).is_repeated());
        assert!(MaxOccurs::parse(Some("unbounded")).is_repeated());
    }
}
