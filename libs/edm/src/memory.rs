//! In-memory metadata model
//!
//! `EdmModelBuilder` collects types, container items and association sets and
//! validates the whole graph once in `build()`. The resulting `EdmModel` is
//! immutable and implements `MetadataProvider`.

use crate::error::{Error, Result};
use crate::model::{
    AccessRight, BagElement, ContainerItem, PropertyKind, ResourceProperty, ResourceSet,
    ResourceType, ResourceTypeKind, Singleton,
};
use crate::provider::{with_bases, MetadataProvider};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Read rights granted on an entity set or singleton
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetRights {
    pub read_single: bool,
    pub read_multiple: bool,
}

impl SetRights {
    pub const ALL: SetRights = SetRights {
        read_single: true,
        read_multiple: true,
    };

    pub const NONE: SetRights = SetRights {
        read_single: false,
        read_multiple: false,
    };

    pub fn allows(&self, right: AccessRight) -> bool {
        match right {
            AccessRight::ReadSingle => self.read_single,
            AccessRight::ReadMultiple => self.read_multiple,
        }
    }
}

/// Key of an association set: (source container, declaring type, navigation property)
type AssociationKey = (Arc<str>, Arc<str>, Arc<str>);

#[derive(Debug, Default)]
pub struct EdmModelBuilder {
    types: Vec<ResourceType>,
    entity_sets: Vec<ResourceSet>,
    singletons: Vec<Singleton>,
    associations: Vec<(AssociationKey, Arc<str>)>,
    rights: Vec<(Arc<str>, SetRights)>,
}

impl EdmModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(mut self, resource_type: ResourceType) -> Self {
        self.types.push(resource_type);
        self
    }

    pub fn add_entity_set(mut self, name: &str, type_name: &str) -> Self {
        self.entity_sets.push(ResourceSet::new(name, type_name));
        self
    }

    pub fn add_singleton(mut self, name: &str, type_name: &str) -> Self {
        self.singletons.push(Singleton {
            name: Arc::from(name),
            type_name: Arc::from(type_name),
        });
        self
    }

    /// Register the set reached by following `property` (declared on
    /// `source_type`) from the container item `source`
    pub fn add_association(
        mut self,
        source: &str,
        source_type: &str,
        property: &str,
        target_set: &str,
    ) -> Self {
        self.associations.push((
            (Arc::from(source), Arc::from(source_type), Arc::from(property)),
            Arc::from(target_set),
        ));
        self
    }

    pub fn set_rights(mut self, item: &str, rights: SetRights) -> Self {
        self.rights.push((Arc::from(item), rights));
        self
    }

    pub fn build(self) -> Result<EdmModel> {
        let mut types: HashMap<Arc<str>, Arc<ResourceType>> = HashMap::new();
        for resource_type in self.types {
            let name = resource_type.name.clone();
            let full_name: Arc<str> = Arc::from(resource_type.full_name());
            if types.contains_key(&name) || types.contains_key(&full_name) {
                return Err(Error::DuplicateName(name.to_string()));
            }
            let resource_type = Arc::new(resource_type);
            if full_name != name {
                types.insert(full_name, resource_type.clone());
            }
            types.insert(name, resource_type);
        }

        let mut model = EdmModel {
            types,
            entity_sets: HashMap::new(),
            singletons: HashMap::new(),
            associations: HashMap::new(),
            rights: HashMap::new(),
        };

        model.validate_types()?;

        for set in self.entity_sets {
            model.check_container_name(&set.name)?;
            model.expect_entity_type(&set.type_name, &set.name)?;
            model.entity_sets.insert(set.name.clone(), Arc::new(set));
        }

        for singleton in self.singletons {
            model.check_container_name(&singleton.name)?;
            model.expect_entity_type(&singleton.type_name, &singleton.name)?;
            model
                .singletons
                .insert(singleton.name.clone(), Arc::new(singleton));
        }

        for (key, target) in self.associations {
            model.validate_association(&key, &target)?;
            model.associations.insert(key, target);
        }

        for (item, rights) in self.rights {
            if model.container_item(&item).is_none() {
                return Err(Error::InvalidContainerItem(format!(
                    "rights declared for unknown entity set '{}'",
                    item
                )));
            }
            model.rights.insert(item, rights);
        }

        tracing::debug!(
            types = model.types.len(),
            entity_sets = model.entity_sets.len(),
            singletons = model.singletons.len(),
            "EDM model built"
        );

        Ok(model)
    }
}

/// Immutable in-memory metadata model
#[derive(Debug)]
pub struct EdmModel {
    types: HashMap<Arc<str>, Arc<ResourceType>>,
    entity_sets: HashMap<Arc<str>, Arc<ResourceSet>>,
    singletons: HashMap<Arc<str>, Arc<Singleton>>,
    associations: HashMap<AssociationKey, Arc<str>>,
    rights: HashMap<Arc<str>, SetRights>,
}

impl EdmModel {
    pub fn builder() -> EdmModelBuilder {
        EdmModelBuilder::new()
    }

    /// Load a model from its JSON definition
    pub fn from_json(json: &str) -> Result<Self> {
        let definition: crate::definition::ModelDefinition = serde_json::from_str(json)?;
        definition.into_model()
    }

    pub fn entity_sets(&self) -> impl Iterator<Item = &Arc<ResourceSet>> {
        self.entity_sets.values()
    }

    fn unique_types(&self) -> Vec<&Arc<ResourceType>> {
        let mut seen = HashSet::new();
        self.types
            .values()
            .filter(|t| seen.insert(t.name.clone()))
            .collect()
    }

    fn check_container_name(&self, name: &str) -> Result<()> {
        if self.entity_sets.contains_key(name) || self.singletons.contains_key(name) {
            return Err(Error::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    fn expect_entity_type(&self, type_name: &str, owner: &str) -> Result<Arc<ResourceType>> {
        let resource_type = self
            .types
            .get(type_name)
            .cloned()
            .ok_or_else(|| Error::UnknownType(type_name.to_string()))?;
        if !resource_type.is_entity() {
            return Err(Error::InvalidContainerItem(format!(
                "'{}' must be of an entity type, '{}' is a complex type",
                owner, type_name
            )));
        }
        Ok(resource_type)
    }

    fn validate_types(&self) -> Result<()> {
        for resource_type in self.unique_types() {
            self.validate_hierarchy(resource_type)?;
            self.validate_keys(resource_type)?;
            for property in &resource_type.properties {
                self.validate_property(resource_type, property)?;
            }
        }
        Ok(())
    }

    fn validate_hierarchy(&self, resource_type: &ResourceType) -> Result<()> {
        let mut visited: HashSet<Arc<str>> = HashSet::new();
        visited.insert(resource_type.name.clone());

        let mut current = resource_type.base_type.clone();
        while let Some(name) = current {
            let base = self
                .types
                .get(&name)
                .ok_or_else(|| Error::UnknownType(name.to_string()))?;
            if base.kind != resource_type.kind {
                return Err(Error::InvalidBaseType(format!(
                    "'{}' cannot derive from '{}' of a different type kind",
                    resource_type.name, base.name
                )));
            }
            if !visited.insert(base.name.clone()) {
                return Err(Error::InvalidBaseType(format!(
                    "inheritance cycle through '{}'",
                    resource_type.name
                )));
            }
            current = base.base_type.clone();
        }
        Ok(())
    }

    fn validate_keys(&self, resource_type: &ResourceType) -> Result<()> {
        let declares_keys = resource_type.declared_keys().next().is_some();
        match resource_type.kind {
            ResourceTypeKind::Complex if declares_keys => Err(Error::InvalidKey(format!(
                "complex type '{}' cannot declare key properties",
                resource_type.name
            ))),
            ResourceTypeKind::Entity if resource_type.base_type.is_some() && declares_keys => {
                Err(Error::InvalidKey(format!(
                    "derived type '{}' cannot declare key properties; keys belong to the root type",
                    resource_type.name
                )))
            }
            ResourceTypeKind::Entity if resource_type.base_type.is_none() && !declares_keys => {
                Err(Error::InvalidKey(format!(
                    "entity type '{}' must declare at least one key property",
                    resource_type.name
                )))
            }
            _ => {
                for key in resource_type.declared_keys() {
                    if !key.is_primitive() {
                        return Err(Error::InvalidKey(format!(
                            "key property '{}' of '{}' must be primitive",
                            key.name, resource_type.name
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    fn validate_property(
        &self,
        owner: &ResourceType,
        property: &ResourceProperty,
    ) -> Result<()> {
        let expect_kind = |type_name: &str, kind: ResourceTypeKind| -> Result<()> {
            let target = self
                .types
                .get(type_name)
                .ok_or_else(|| Error::UnknownType(type_name.to_string()))?;
            if target.kind != kind {
                return Err(Error::InvalidProperty(format!(
                    "property '{}' of '{}' must refer to a {:?} type, '{}' is not one",
                    property.name, owner.name, kind, type_name
                )));
            }
            Ok(())
        };

        match &property.kind {
            PropertyKind::Primitive(_) => Ok(()),
            PropertyKind::Complex(name) => expect_kind(name, ResourceTypeKind::Complex),
            PropertyKind::ResourceReference(name) | PropertyKind::ResourceSetReference(name) => {
                if owner.kind == ResourceTypeKind::Complex {
                    return Err(Error::InvalidProperty(format!(
                        "complex type '{}' cannot declare navigation property '{}'",
                        owner.name, property.name
                    )));
                }
                expect_kind(name, ResourceTypeKind::Entity)
            }
            PropertyKind::Bag(BagElement::Primitive(_)) => Ok(()),
            PropertyKind::Bag(BagElement::Complex(name)) => {
                expect_kind(name, ResourceTypeKind::Complex)?;
                let mut visited = HashSet::new();
                if self.contains_bag(name, &mut visited) {
                    return Err(Error::InvalidBag(format!(
                        "bag property '{}' of '{}' has element type '{}' which itself contains a bag",
                        property.name, owner.name, name
                    )));
                }
                Ok(())
            }
        }
    }

    /// Whether the complex type `type_name`, or any complex type reachable from
    /// it, declares a bag property. `visited` holds the type identities already
    /// explored so self-embedding complex types terminate.
    fn contains_bag(&self, type_name: &str, visited: &mut HashSet<Arc<str>>) -> bool {
        let Some(resource_type) = self.types.get(type_name) else {
            return false;
        };
        if !visited.insert(resource_type.name.clone()) {
            return false;
        }

        let bases = self.base_types(resource_type);
        let result = with_bases(resource_type, &bases).any(|t| {
            t.properties.iter().any(|p| match &p.kind {
                PropertyKind::Bag(_) => true,
                PropertyKind::Complex(inner) => self.contains_bag(inner, visited),
                _ => false,
            })
        });
        result
    }

    fn validate_association(&self, key: &AssociationKey, target: &Arc<str>) -> Result<()> {
        let (source, source_type, property_name) = key;

        let source_item = self.container_item(source).ok_or_else(|| {
            Error::InvalidAssociation(format!("unknown source entity set '{}'", source))
        })?;
        let declaring = self
            .types
            .get(source_type)
            .ok_or_else(|| Error::UnknownType(source_type.to_string()))?;

        let item_type = self
            .container_type(&source_item)
            .ok_or_else(|| Error::UnknownType(source_item.type_name().to_string()))?;
        if !self.is_same_or_derived(&item_type, declaring)
            && !self.is_same_or_derived(declaring, &item_type)
        {
            return Err(Error::InvalidAssociation(format!(
                "type '{}' is unrelated to the type of entity set '{}'",
                source_type, source
            )));
        }

        let property = declaring.declared_property(property_name).ok_or_else(|| {
            Error::InvalidAssociation(format!(
                "type '{}' declares no property '{}'",
                source_type, property_name
            ))
        })?;
        if !property.is_navigation() {
            return Err(Error::InvalidAssociation(format!(
                "'{}.{}' is not a navigation property",
                source_type, property_name
            )));
        }

        let target_set = self.entity_sets.get(target).ok_or_else(|| {
            Error::InvalidAssociation(format!("unknown target entity set '{}'", target))
        })?;
        let target_set_type = self
            .types
            .get(&target_set.type_name)
            .ok_or_else(|| Error::UnknownType(target_set.type_name.to_string()))?;
        let nav_type = property
            .target_type_name()
            .and_then(|name| self.types.get(name))
            .ok_or_else(|| Error::UnknownType(property_name.to_string()))?;
        if !self.is_same_or_derived(target_set_type, nav_type) {
            return Err(Error::InvalidAssociation(format!(
                "entity set '{}' does not hold entities of type '{}'",
                target, nav_type.name
            )));
        }

        Ok(())
    }

    /// Whether `candidate` is `ancestor` or derives from it
    fn is_same_or_derived(&self, candidate: &ResourceType, ancestor: &ResourceType) -> bool {
        candidate.name == ancestor.name
            || self
                .base_types(candidate)
                .iter()
                .any(|t| t.name == ancestor.name)
    }
}

impl MetadataProvider for EdmModel {
    fn container_item(&self, name: &str) -> Option<ContainerItem> {
        if let Some(set) = self.entity_sets.get(name) {
            return Some(ContainerItem::EntitySet(set.clone()));
        }
        self.singletons
            .get(name)
            .map(|singleton| ContainerItem::Singleton(singleton.clone()))
    }

    fn resource_type(&self, name: &str) -> Option<Arc<ResourceType>> {
        self.types.get(name).cloned()
    }

    fn derived_types(&self, resource_type: &ResourceType) -> Vec<Arc<ResourceType>> {
        self.unique_types()
            .into_iter()
            .filter(|t| t.name != resource_type.name && self.is_same_or_derived(t, resource_type))
            .cloned()
            .collect()
    }

    fn association_target(
        &self,
        source: &ContainerItem,
        source_type: &ResourceType,
        property: &ResourceProperty,
    ) -> Option<Arc<ResourceSet>> {
        let source_name: Arc<str> = Arc::from(source.name());
        let bases = self.base_types(source_type);
        let result = with_bases(source_type, &bases).find_map(|t| {
            let key = (source_name.clone(), t.name.clone(), property.name.clone());
            self.associations
                .get(&key)
                .and_then(|target| self.entity_sets.get(target))
                .cloned()
        });
        result
    }

    fn check_rights(&self, item: &ContainerItem, right: AccessRight) -> bool {
        self.rights
            .get(item.name())
            .copied()
            .unwrap_or(SetRights::ALL)
            .allows(right)
    }
}
