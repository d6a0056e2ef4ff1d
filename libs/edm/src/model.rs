//! Resource types, properties and entity container items
//!
//! Types refer to each other by name rather than by pointer so that
//! self-referencing and mutually-referencing graphs (Customer ↔ Order,
//! Employee → Manager) can be expressed with plain `Arc`s. Resolution of a
//! name to a type goes through `MetadataProvider`.

use crate::primitive::EdmPrimitiveType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceTypeKind {
    Entity,
    Complex,
}

/// Element type of a bag (collection) property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BagElement {
    Primitive(EdmPrimitiveType),
    Complex(Arc<str>),
}

/// Structural shape of a property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Primitive(EdmPrimitiveType),
    /// Complex-typed property; holds the complex type name
    Complex(Arc<str>),
    /// Single-valued navigation property; holds the target entity type name
    ResourceReference(Arc<str>),
    /// Collection-valued navigation property; holds the target entity type name
    ResourceSetReference(Arc<str>),
    Bag(BagElement),
}

/// Traits that combine with any primitive property kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropertyTraits {
    pub key: bool,
    pub etag: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceProperty {
    pub name: Arc<str>,
    pub kind: PropertyKind,
    pub traits: PropertyTraits,
    pub nullable: bool,
}

impl ResourceProperty {
    pub fn new(name: impl Into<Arc<str>>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            traits: PropertyTraits::default(),
            nullable: true,
        }
    }

    pub fn primitive_type(&self) -> Option<EdmPrimitiveType> {
        match &self.kind {
            PropertyKind::Primitive(ty) => Some(*ty),
            _ => None,
        }
    }

    /// Name of the complex or entity type this property points at
    pub fn target_type_name(&self) -> Option<&str> {
        match &self.kind {
            PropertyKind::Complex(name)
            | PropertyKind::ResourceReference(name)
            | PropertyKind::ResourceSetReference(name) => Some(name),
            PropertyKind::Bag(BagElement::Complex(name)) => Some(name),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, PropertyKind::Primitive(_))
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.kind, PropertyKind::Complex(_))
    }

    pub fn is_bag(&self) -> bool {
        matches!(self.kind, PropertyKind::Bag(_))
    }

    pub fn is_navigation(&self) -> bool {
        matches!(
            self.kind,
            PropertyKind::ResourceReference(_) | PropertyKind::ResourceSetReference(_)
        )
    }

    pub fn is_resource_set_reference(&self) -> bool {
        matches!(self.kind, PropertyKind::ResourceSetReference(_))
    }

    pub fn is_key(&self) -> bool {
        self.traits.key
    }

    pub fn is_etag(&self) -> bool {
        self.traits.etag
    }
}

/// An entity or complex type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceType {
    pub name: Arc<str>,
    pub namespace: Option<Arc<str>>,
    pub kind: ResourceTypeKind,
    pub base_type: Option<Arc<str>>,
    pub is_abstract: bool,
    pub is_media_link_entry: bool,
    /// Declared (not inherited) properties, in declaration order
    pub properties: Vec<Arc<ResourceProperty>>,
    pub named_streams: Vec<Arc<str>>,
}

impl ResourceType {
    pub fn new(name: impl Into<Arc<str>>, kind: ResourceTypeKind) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            kind,
            base_type: None,
            is_abstract: false,
            is_media_link_entry: false,
            properties: Vec::new(),
            named_streams: Vec::new(),
        }
    }

    pub fn entity(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, ResourceTypeKind::Entity)
    }

    pub fn complex(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, ResourceTypeKind::Complex)
    }

    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.to_string(),
        }
    }

    pub fn is_entity(&self) -> bool {
        self.kind == ResourceTypeKind::Entity
    }

    pub fn declared_property(&self, name: &str) -> Option<&Arc<ResourceProperty>> {
        self.properties.iter().find(|p| &*p.name == name)
    }

    pub fn declared_keys(&self) -> impl Iterator<Item = &Arc<ResourceProperty>> {
        self.properties.iter().filter(|p| p.is_key())
    }

    pub fn with_namespace(mut self, namespace: impl Into<Arc<str>>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_base_type(mut self, base_type: impl Into<Arc<str>>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn media_link_entry(mut self) -> Self {
        self.is_media_link_entry = true;
        self
    }

    pub fn with_property(mut self, property: ResourceProperty) -> Self {
        self.properties.push(Arc::new(property));
        self
    }

    pub fn with_key(self, name: &str, ty: EdmPrimitiveType) -> Self {
        let mut property = ResourceProperty::new(name, PropertyKind::Primitive(ty));
        property.traits.key = true;
        property.nullable = false;
        self.with_property(property)
    }

    pub fn with_primitive(self, name: &str, ty: EdmPrimitiveType) -> Self {
        self.with_property(ResourceProperty::new(name, PropertyKind::Primitive(ty)))
    }

    pub fn with_etag(self, name: &str, ty: EdmPrimitiveType) -> Self {
        let mut property = ResourceProperty::new(name, PropertyKind::Primitive(ty));
        property.traits.etag = true;
        self.with_property(property)
    }

    pub fn with_complex(self, name: &str, type_name: &str) -> Self {
        self.with_property(ResourceProperty::new(
            name,
            PropertyKind::Complex(Arc::from(type_name)),
        ))
    }

    pub fn with_reference(self, name: &str, type_name: &str) -> Self {
        self.with_property(ResourceProperty::new(
            name,
            PropertyKind::ResourceReference(Arc::from(type_name)),
        ))
    }

    pub fn with_collection_reference(self, name: &str, type_name: &str) -> Self {
        self.with_property(ResourceProperty::new(
            name,
            PropertyKind::ResourceSetReference(Arc::from(type_name)),
        ))
    }

    pub fn with_bag(self, name: &str, element: BagElement) -> Self {
        self.with_property(ResourceProperty::new(name, PropertyKind::Bag(element)))
    }

    pub fn with_named_stream(mut self, name: &str) -> Self {
        self.named_streams.push(Arc::from(name));
        self
    }
}

/// A named, queryable collection of one entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSet {
    pub name: Arc<str>,
    pub type_name: Arc<str>,
}

impl ResourceSet {
    pub fn new(name: impl Into<Arc<str>>, type_name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A single, named entity exposed at the service root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Singleton {
    pub name: Arc<str>,
    pub type_name: Arc<str>,
}

/// Entity container member addressable by the first path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerItem {
    EntitySet(Arc<ResourceSet>),
    Singleton(Arc<Singleton>),
}

impl ContainerItem {
    pub fn name(&self) -> &str {
        match self {
            ContainerItem::EntitySet(set) => &set.name,
            ContainerItem::Singleton(singleton) => &singleton.name,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            ContainerItem::EntitySet(set) => &set.type_name,
            ContainerItem::Singleton(singleton) => &singleton.type_name,
        }
    }
}

/// Read access required to address a resource set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessRight {
    ReadSingle,
    ReadMultiple,
}
