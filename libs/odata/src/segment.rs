//! Resolved URI path segments

use crate::key::ValidatedKeyDescriptor;
use ferrum_edm::{ContainerItem, ResourceProperty, ResourceType};
use std::sync::Arc;

/// What a segment addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Nothing,
    ServiceDirectory,
    Resource,
    ComplexObject,
    Primitive,
    PrimitiveValue,
    Metadata,
    VoidServiceOperation,
    Batch,
    Link,
    MediaResource,
    Bag,
    Singleton,
}

impl TargetKind {
    /// No segment may follow a segment of this kind
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TargetKind::Metadata
                | TargetKind::Batch
                | TargetKind::PrimitiveValue
                | TargetKind::MediaResource
                | TargetKind::Bag
                | TargetKind::VoidServiceOperation
        )
    }

    pub fn is_special_purpose(self) -> bool {
        matches!(
            self,
            TargetKind::ServiceDirectory | TargetKind::Metadata | TargetKind::Batch
        )
    }
}

/// Where the data addressed by a segment comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetSource {
    None,
    EntitySet,
    Property,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentDescriptor {
    pub identifier: String,
    pub target_kind: TargetKind,
    pub target_source: TargetSource,
    pub resource_type: Option<Arc<ResourceType>>,
    /// Entity set or singleton the addressed entities live in
    pub container: Option<ContainerItem>,
    pub key_descriptor: Option<ValidatedKeyDescriptor>,
    /// Property that produced this segment, for property segments
    pub projected_property: Option<Arc<ResourceProperty>>,
    pub is_single_result: bool,
}

impl SegmentDescriptor {
    pub fn new(identifier: impl Into<String>, target_kind: TargetKind) -> Self {
        Self {
            identifier: identifier.into(),
            target_kind,
            target_source: TargetSource::None,
            resource_type: None,
            container: None,
            key_descriptor: None,
            projected_property: None,
            is_single_result: false,
        }
    }

    /// A single entity, from a keyed set, a singleton or a reference property
    pub fn is_single_entity(&self) -> bool {
        self.is_single_result
            && matches!(self.target_kind, TargetKind::Resource | TargetKind::Singleton)
    }

    /// An entity collection
    pub fn is_entity_collection(&self) -> bool {
        self.target_kind == TargetKind::Resource && !self.is_single_result
    }
}

/// Ordered list of resolved segments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentChain {
    segments: Vec<SegmentDescriptor>,
}

impl SegmentChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: SegmentDescriptor) {
        self.segments.push(segment);
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SegmentDescriptor> {
        self.segments.get(index)
    }

    pub fn first(&self) -> Option<&SegmentDescriptor> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&SegmentDescriptor> {
        self.segments.last()
    }

    pub fn previous(&self, index: usize) -> Option<&SegmentDescriptor> {
        index.checked_sub(1).and_then(|i| self.segments.get(i))
    }

    pub fn next(&self, index: usize) -> Option<&SegmentDescriptor> {
        self.segments.get(index + 1)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SegmentDescriptor> {
        self.segments.iter()
    }

    /// Kind addressed by the whole chain; an empty chain is the service root
    pub fn target_kind(&self) -> TargetKind {
        self.last()
            .map(|segment| segment.target_kind)
            .unwrap_or(TargetKind::ServiceDirectory)
    }
}

impl<'a> IntoIterator for &'a SegmentChain {
    type Item = &'a SegmentDescriptor;
    type IntoIter = std::slice::Iter<'a, SegmentDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
