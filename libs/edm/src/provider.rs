//! Read-only metadata lookup consumed by request processing
//!
//! Implementors supply the primitive lookups (container items, types by name,
//! derived types, association sets, rights). Inheritance-aware helpers such as
//! `property` and `key_properties` are provided on top of them.

use crate::model::{AccessRight, ContainerItem, ResourceProperty, ResourceSet, ResourceType};
use std::sync::Arc;

/// Trait for metadata resolution
///
/// The model must not be mutated while requests are being processed; the
/// `Send + Sync` bound lets one provider be shared across request workers.
pub trait MetadataProvider: Send + Sync {
    /// Resolve an entity set or singleton by its container name
    fn container_item(&self, name: &str) -> Option<ContainerItem>;

    /// Resolve an entity or complex type by (unqualified or qualified) name
    fn resource_type(&self, name: &str) -> Option<Arc<ResourceType>>;

    /// Types that directly or indirectly derive from `resource_type`
    fn derived_types(&self, resource_type: &ResourceType) -> Vec<Arc<ResourceType>>;

    /// Target set reached by following `property` from an entity of
    /// `source_type` addressed through the container item `source`
    fn association_target(
        &self,
        source: &ContainerItem,
        source_type: &ResourceType,
        property: &ResourceProperty,
    ) -> Option<Arc<ResourceSet>>;

    /// Whether the caller may read `item` with the given right.
    ///
    /// Defaults to allowing everything.
    fn check_rights(&self, _item: &ContainerItem, _right: AccessRight) -> bool {
        true
    }

    /// Resolve the type named by a container item
    fn container_type(&self, item: &ContainerItem) -> Option<Arc<ResourceType>> {
        self.resource_type(item.type_name())
    }

    /// Resolve the complex or entity type a property points at
    fn property_type(&self, property: &ResourceProperty) -> Option<Arc<ResourceType>> {
        property
            .target_type_name()
            .and_then(|name| self.resource_type(name))
    }

    /// Base types of `resource_type`, nearest first and ending at the root
    fn base_types(&self, resource_type: &ResourceType) -> Vec<Arc<ResourceType>> {
        let mut chain: Vec<Arc<ResourceType>> = Vec::new();
        let mut next = resource_type.base_type.clone();

        while let Some(name) = next {
            // Inheritance cycles are rejected by well-formed models; stop anyway
            if name == resource_type.name || chain.iter().any(|t| t.name == name) {
                break;
            }
            match self.resource_type(&name) {
                Some(base) => {
                    next = base.base_type.clone();
                    chain.push(base);
                }
                None => break,
            }
        }

        chain
    }

    /// Look up a declared or inherited property
    fn property(
        &self,
        resource_type: &ResourceType,
        name: &str,
    ) -> Option<Arc<ResourceProperty>> {
        if let Some(property) = resource_type.declared_property(name) {
            return Some(property.clone());
        }
        self.base_types(resource_type)
            .iter()
            .find_map(|t| t.declared_property(name).cloned())
    }

    /// All properties of a type, root-declared ones first
    fn all_properties(&self, resource_type: &ResourceType) -> Vec<Arc<ResourceProperty>> {
        let bases = self.base_types(resource_type);
        with_bases(resource_type, &bases)
            .rev()
            .flat_map(|t| t.properties.iter().cloned())
            .collect()
    }

    /// Key properties, which are only ever declared on the root of a hierarchy
    fn key_properties(&self, resource_type: &ResourceType) -> Vec<Arc<ResourceProperty>> {
        let bases = self.base_types(resource_type);
        let root = bases.last().map_or(resource_type, |root| &**root);
        root.declared_keys().cloned().collect()
    }

    fn is_media_link_entry(&self, resource_type: &ResourceType) -> bool {
        let bases = self.base_types(resource_type);
        let result = with_bases(resource_type, &bases).any(|t| t.is_media_link_entry);
        result
    }

    fn has_named_stream(&self, resource_type: &ResourceType, name: &str) -> bool {
        let bases = self.base_types(resource_type);
        let result =
            with_bases(resource_type, &bases).any(|t| t.named_streams.iter().any(|s| &**s == name));
        result
    }
}

/// `resource_type` followed by the base types found for it
pub(crate) fn with_bases<'a>(
    resource_type: &'a ResourceType,
    bases: &'a [Arc<ResourceType>],
) -> impl DoubleEndedIterator<Item = &'a ResourceType> + 'a {
    std::iter::once(resource_type).chain(bases.iter().map(|base| &**base))
}
