//! Entity Data Model for OData request interpretation
//!
//! Provides a trait-based, read-only view of an OData service's metadata
//! (resource types, properties, entity sets, singletons and association sets)
//! that the URI and expression layers consume while processing a request.
//!
//! `EdmModel` is an in-memory implementation that can be assembled with
//! `EdmModelBuilder` or loaded from a JSON model definition.

pub mod definition;
pub mod error;
pub mod memory;
pub mod model;
pub mod primitive;
pub mod provider;

pub use definition::ModelDefinition;
pub use error::{Error, Result};
pub use memory::{EdmModel, EdmModelBuilder, SetRights};
pub use model::{
    AccessRight, BagElement, ContainerItem, PropertyKind, PropertyTraits, ResourceProperty,
    ResourceSet, ResourceType, ResourceTypeKind, Singleton,
};
pub use primitive::EdmPrimitiveType;
pub use provider::MetadataProvider;
