//! JSON model definitions
//!
//! A serde representation of a service model, used by tools and hosts that
//! keep their metadata in configuration files:
//!
//! ```json
//! {
//!   "namespace": "NorthWind",
//!   "types": [
//!     { "name": "Customer", "kind": "entity", "properties": [
//!       { "name": "CustomerID", "kind": "primitive", "type": "Edm.String", "key": true },
//!       { "name": "Orders", "kind": "collection", "type": "Order" }
//!     ]}
//!   ],
//!   "entitySets": [{ "name": "Customers", "type": "Customer" }],
//!   "associations": [{ "source": "Customers", "sourceType": "Customer",
//!                      "property": "Orders", "target": "Orders" }]
//! }
//! ```

use crate::error::Result;
use crate::memory::{EdmModel, EdmModelBuilder, SetRights};
use crate::model::{BagElement, PropertyKind, ResourceProperty, ResourceType, ResourceTypeKind};
use crate::primitive::EdmPrimitiveType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDefinition {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub types: Vec<TypeDefinition>,
    #[serde(default)]
    pub entity_sets: Vec<ContainerItemDefinition>,
    #[serde(default)]
    pub singletons: Vec<ContainerItemDefinition>,
    #[serde(default)]
    pub associations: Vec<AssociationDefinition>,
    #[serde(default)]
    pub rights: Vec<RightsDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefinition {
    pub name: String,
    pub kind: ResourceTypeKind,
    #[serde(default)]
    pub base_type: Option<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub media_link_entry: bool,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
    #[serde(default)]
    pub named_streams: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(flatten)]
    pub kind: PropertyKindDefinition,
    #[serde(default)]
    pub key: bool,
    #[serde(default)]
    pub etag: bool,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PropertyKindDefinition {
    Primitive {
        #[serde(rename = "type")]
        type_name: EdmPrimitiveType,
    },
    Complex {
        #[serde(rename = "type")]
        type_name: String,
    },
    Reference {
        #[serde(rename = "type")]
        type_name: String,
    },
    Collection {
        #[serde(rename = "type")]
        type_name: String,
    },
    /// Element type is either an `Edm.*` primitive name or a complex type name
    Bag {
        #[serde(rename = "elementType")]
        element_type: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerItemDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationDefinition {
    pub source: String,
    pub source_type: String,
    pub property: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RightsDefinition {
    pub entity_set: String,
    #[serde(default)]
    pub read_single: bool,
    #[serde(default)]
    pub read_multiple: bool,
}

impl PropertyKindDefinition {
    fn to_kind(&self) -> PropertyKind {
        match self {
            PropertyKindDefinition::Primitive { type_name } => PropertyKind::Primitive(*type_name),
            PropertyKindDefinition::Complex { type_name } => {
                PropertyKind::Complex(Arc::from(type_name.as_str()))
            }
            PropertyKindDefinition::Reference { type_name } => {
                PropertyKind::ResourceReference(Arc::from(type_name.as_str()))
            }
            PropertyKindDefinition::Collection { type_name } => {
                PropertyKind::ResourceSetReference(Arc::from(type_name.as_str()))
            }
            PropertyKindDefinition::Bag { element_type } => {
                match EdmPrimitiveType::from_name(element_type) {
                    Some(primitive) if element_type.starts_with("Edm.") => {
                        PropertyKind::Bag(BagElement::Primitive(primitive))
                    }
                    _ => PropertyKind::Bag(BagElement::Complex(Arc::from(element_type.as_str()))),
                }
            }
        }
    }
}

impl TypeDefinition {
    fn to_resource_type(&self, namespace: Option<&str>) -> ResourceType {
        let mut resource_type = ResourceType::new(self.name.as_str(), self.kind);
        resource_type.namespace = namespace.map(Arc::from);
        resource_type.base_type = self.base_type.as_deref().map(Arc::from);
        resource_type.is_abstract = self.is_abstract;
        resource_type.is_media_link_entry = self.media_link_entry;
        resource_type.named_streams = self
            .named_streams
            .iter()
            .map(|s| Arc::from(s.as_str()))
            .collect();

        for definition in &self.properties {
            let mut property = ResourceProperty::new(definition.name.as_str(), definition.kind.to_kind());
            property.traits.key = definition.key;
            property.traits.etag = definition.etag;
            property.nullable = definition.nullable && !definition.key;
            resource_type = resource_type.with_property(property);
        }

        resource_type
    }
}

impl ModelDefinition {
    pub fn into_model(self) -> Result<EdmModel> {
        self.to_builder().build()
    }

    pub fn to_builder(&self) -> EdmModelBuilder {
        let namespace = self.namespace.as_deref();
        let mut builder = EdmModelBuilder::new();

        for definition in &self.types {
            builder = builder.add_type(definition.to_resource_type(namespace));
        }
        for set in &self.entity_sets {
            builder = builder.add_entity_set(&set.name, &set.type_name);
        }
        for singleton in &self.singletons {
            builder = builder.add_singleton(&singleton.name, &singleton.type_name);
        }
        for association in &self.associations {
            builder = builder.add_association(
                &association.source,
                &association.source_type,
                &association.property,
                &association.target,
            );
        }
        for rights in &self.rights {
            builder = builder.set_rights(
                &rights.entity_set,
                SetRights {
                    read_single: rights.read_single,
                    read_multiple: rights.read_multiple,
                },
            );
        }

        builder
    }
}
