//! Segment resolver - request path to typed segment chain
//!
//! The first segment names the service document, `$metadata`, `$batch`, an
//! entity set or a singleton. Every later segment is interpreted purely from
//! the kind of the segment before it:
//!
//! | previous              | legal next segments                               |
//! |-----------------------|---------------------------------------------------|
//! | entity collection     | `$count` (and nothing after it)                   |
//! | single entity         | property, navigation, named stream, `$value` (MLE), `$links` |
//! | `$links`              | exactly one navigation property, then nothing     |
//! | complex object        | its declared properties                           |
//! | primitive             | `$value`                                          |
//! | terminal kinds        | nothing                                           |
//!
//! A denied access right is reported exactly like an unknown name.

use crate::error::{Error, Result};
use crate::key::KeyDescriptor;
use crate::options::ResolverOptions;
use crate::segment::{SegmentChain, SegmentDescriptor, TargetKind, TargetSource};
use ferrum_edm::{AccessRight, ContainerItem, MetadataProvider, PropertyKind};
use std::sync::Arc;

const METADATA: &str = "$metadata";
const BATCH: &str = "$batch";
const COUNT: &str = "$count";
const VALUE: &str = "$value";
const LINKS: &str = "$links";

fn bad_request() -> Error {
    Error::syntax("Bad Request - Error in query syntax.", None)
}

fn not_found(identifier: &str) -> Error {
    Error::Resolution(format!("Resource not found for the segment '{}'", identifier))
}

fn must_be_leaf(identifier: &str) -> Error {
    Error::Structural(format!(
        "The request URI is not valid. The segment '{}' must be the last segment in the URI because it is one of the following: $batch, $value, $metadata, $count, a bag property, a named media resource, or a service operation that does not return a value.",
        identifier
    ))
}

fn no_predicate(predicate: Option<&str>) -> Result<()> {
    match predicate {
        Some(_) => Err(bad_request()),
        None => Ok(()),
    }
}

/// Split `Name(predicate)` into its identifier and the predicate text
fn split_segment(raw: &str) -> Result<(&str, Option<&str>)> {
    let (identifier, predicate) = match raw.find('(') {
        None => (raw, None),
        Some(open) => {
            if !raw.ends_with(')') {
                return Err(bad_request());
            }
            (&raw[..open], Some(&raw[open + 1..raw.len() - 1]))
        }
    };

    if identifier.is_empty() {
        return Err(bad_request());
    }
    Ok((identifier, predicate))
}

/// Parse a predicate; `None` and `()` both mean "no key"
fn parse_keys(predicate: Option<&str>) -> Result<Option<KeyDescriptor>> {
    match predicate {
        None => Ok(None),
        Some(text) => match KeyDescriptor::try_parse_keys_from_key_predicate(text) {
            Some(KeyDescriptor::Empty) => Ok(None),
            Some(keys) => Ok(Some(keys)),
            None => Err(bad_request()),
        },
    }
}

/// Resolves raw path segments against a metadata provider
pub struct SegmentResolver {
    metadata: Arc<dyn MetadataProvider>,
    options: ResolverOptions,
}

impl SegmentResolver {
    pub fn new(metadata: Arc<dyn MetadataProvider>, options: ResolverOptions) -> Self {
        Self { metadata, options }
    }

    /// Resolve every segment, failing on the first illegal one
    pub fn resolve(&self, segments: &[String]) -> Result<SegmentChain> {
        // The service root is the empty chain
        let Some((first, rest)) = segments.split_first() else {
            return Ok(SegmentChain::new());
        };

        let mut chain = SegmentChain::new();

        let mut previous = self.create_first_segment(first)?;
        tracing::trace!(
            segment = %previous.identifier,
            kind = ?previous.target_kind,
            "Resolved segment"
        );

        for raw in rest {
            let next = self.create_next_segment(&previous, raw)?;
            tracing::trace!(
                segment = %next.identifier,
                kind = ?next.target_kind,
                "Resolved segment"
            );
            chain.push(std::mem::replace(&mut previous, next));
        }
        chain.push(previous);

        // `$links` needs the navigation segment after it
        if chain.target_kind() == TargetKind::Link
            && chain.last().map(|s| s.identifier.as_str()) == Some(LINKS)
        {
            return Err(Error::Structural(
                "The request URI is not valid. The segment '$links' must be followed by a navigation property segment."
                    .to_string(),
            ));
        }

        tracing::debug!(
            segments = chain.len(),
            target = ?chain.target_kind(),
            "Resolved request path"
        );
        Ok(chain)
    }

    fn check_rights(&self, item: &ContainerItem, right: AccessRight, identifier: &str) -> Result<()> {
        if self.options.check_rights && !self.metadata.check_rights(item, right) {
            tracing::warn!(
                container = item.name(),
                right = ?right,
                "Access denied, reporting segment as not found"
            );
            return Err(not_found(identifier));
        }
        Ok(())
    }

    fn create_first_segment(&self, raw: &str) -> Result<SegmentDescriptor> {
        let (identifier, predicate) = split_segment(raw)?;

        match identifier {
            METADATA => {
                no_predicate(predicate)?;
                return Ok(SegmentDescriptor::new(identifier, TargetKind::Metadata));
            }
            BATCH => {
                no_predicate(predicate)?;
                return Ok(SegmentDescriptor::new(identifier, TargetKind::Batch));
            }
            _ => {}
        }

        let item = self
            .metadata
            .container_item(identifier)
            .ok_or_else(|| not_found(identifier))?;
        let resource_type = self.metadata.container_type(&item).ok_or_else(|| {
            Error::Internal(format!(
                "Type '{}' of '{}' cannot be resolved",
                item.type_name(),
                identifier
            ))
        })?;

        let mut segment = SegmentDescriptor::new(identifier, TargetKind::Resource);
        segment.target_source = TargetSource::EntitySet;

        match &item {
            ContainerItem::Singleton(_) => {
                no_predicate(predicate)?;
                self.check_rights(&item, AccessRight::ReadSingle, identifier)?;
                segment.target_kind = TargetKind::Singleton;
                segment.is_single_result = true;
            }
            ContainerItem::EntitySet(_) => {
                let keys = parse_keys(predicate)?;
                let right = if keys.is_some() {
                    AccessRight::ReadSingle
                } else {
                    AccessRight::ReadMultiple
                };
                self.check_rights(&item, right, identifier)?;

                if let Some(keys) = keys {
                    segment.key_descriptor =
                        Some(keys.validate(identifier, &resource_type, self.metadata.as_ref())?);
                    segment.is_single_result = true;
                }
            }
        }

        segment.resource_type = Some(resource_type);
        segment.container = Some(item);
        Ok(segment)
    }

    fn create_next_segment(&self, previous: &SegmentDescriptor, raw: &str) -> Result<SegmentDescriptor> {
        if previous.target_kind.is_terminal() {
            return Err(must_be_leaf(&previous.identifier));
        }

        let (identifier, predicate) = split_segment(raw)?;

        if previous.target_kind == TargetKind::Link && previous.identifier != LINKS {
            return Err(Error::Structural(format!(
                "The request URI is not valid. The segment '{}' following '$links' must be the last segment in the URI.",
                previous.identifier
            )));
        }

        match identifier {
            COUNT => return self.count_segment(previous, predicate),
            VALUE => return self.value_segment(previous, predicate),
            LINKS => return self.links_segment(previous, predicate),
            _ => {}
        }

        if previous.target_kind == TargetKind::Primitive {
            return Err(Error::Structural(format!(
                "The request URI is not valid. Since the segment '{}' refers to a primitive property, the only supported segment following it is '$value'.",
                previous.identifier
            )));
        }

        if previous.is_entity_collection() {
            return Err(Error::Structural(format!(
                "The request URI is not valid. Since the segment '{}' refers to a collection, this must be the last segment in the request URI. All intermediate segments must refer to a single resource.",
                previous.identifier
            )));
        }

        self.property_segment(previous, identifier, predicate)
    }

    fn count_segment(&self, previous: &SegmentDescriptor, predicate: Option<&str>) -> Result<SegmentDescriptor> {
        no_predicate(predicate)?;
        if !previous.is_entity_collection() {
            return Err(Error::Structural(format!(
                "The request URI is not valid, the segment '$count' cannot be applied to the segment '{}' since it does not refer to a collection of entities.",
                previous.identifier
            )));
        }

        let mut segment = SegmentDescriptor::new(COUNT, TargetKind::PrimitiveValue);
        segment.target_source = previous.target_source;
        segment.resource_type = previous.resource_type.clone();
        segment.container = previous.container.clone();
        segment.is_single_result = true;
        Ok(segment)
    }

    fn value_segment(&self, previous: &SegmentDescriptor, predicate: Option<&str>) -> Result<SegmentDescriptor> {
        no_predicate(predicate)?;

        let is_media_link_entry = previous.is_single_entity()
            && previous
                .resource_type
                .as_ref()
                .is_some_and(|ty| self.metadata.is_media_link_entry(ty));

        let kind = match previous.target_kind {
            TargetKind::Primitive => TargetKind::PrimitiveValue,
            _ if is_media_link_entry => TargetKind::MediaResource,
            _ => {
                return Err(Error::Structural(format!(
                    "The request URI is not valid. The segment '$value' cannot be applied to the segment '{}'.",
                    previous.identifier
                )))
            }
        };

        let mut segment = SegmentDescriptor::new(VALUE, kind);
        segment.target_source = previous.target_source;
        segment.resource_type = previous.resource_type.clone();
        segment.container = previous.container.clone();
        segment.projected_property = previous.projected_property.clone();
        segment.is_single_result = true;
        Ok(segment)
    }

    fn links_segment(&self, previous: &SegmentDescriptor, predicate: Option<&str>) -> Result<SegmentDescriptor> {
        no_predicate(predicate)?;
        if !previous.is_single_entity() {
            return Err(Error::Structural(format!(
                "The request URI is not valid. The segment '$links' cannot be applied to the segment '{}'; it must refer to a single entity.",
                previous.identifier
            )));
        }

        let mut segment = SegmentDescriptor::new(LINKS, TargetKind::Link);
        segment.target_source = previous.target_source;
        segment.resource_type = previous.resource_type.clone();
        segment.container = previous.container.clone();
        segment.key_descriptor = previous.key_descriptor.clone();
        segment.is_single_result = true;
        Ok(segment)
    }

    fn property_segment(
        &self,
        previous: &SegmentDescriptor,
        identifier: &str,
        predicate: Option<&str>,
    ) -> Result<SegmentDescriptor> {
        let after_links = previous.target_kind == TargetKind::Link;
        let resource_type = previous
            .resource_type
            .clone()
            .ok_or_else(|| not_found(identifier))?;

        let Some(property) = self.metadata.property(&resource_type, identifier) else {
            if !after_links
                && previous.is_single_entity()
                && self.metadata.has_named_stream(&resource_type, identifier)
            {
                no_predicate(predicate)?;
                let mut segment = SegmentDescriptor::new(identifier, TargetKind::MediaResource);
                segment.target_source = TargetSource::Property;
                segment.resource_type = Some(resource_type);
                segment.container = previous.container.clone();
                segment.is_single_result = true;
                return Ok(segment);
            }
            return Err(not_found(identifier));
        };

        if after_links && !property.is_navigation() {
            return Err(Error::Structural(format!(
                "The request URI is not valid. The segment '{}' following '$links' must be a navigation property.",
                identifier
            )));
        }

        let mut segment = SegmentDescriptor::new(identifier, TargetKind::Resource);
        segment.target_source = TargetSource::Property;
        segment.projected_property = Some(property.clone());
        segment.container = previous.container.clone();

        match &property.kind {
            PropertyKind::Primitive(_) => {
                no_predicate(predicate)?;
                segment.target_kind = TargetKind::Primitive;
                segment.is_single_result = true;
            }
            PropertyKind::Complex(_) => {
                no_predicate(predicate)?;
                segment.target_kind = TargetKind::ComplexObject;
                segment.resource_type = self.metadata.property_type(&property);
                segment.is_single_result = true;
            }
            PropertyKind::Bag(_) => {
                no_predicate(predicate)?;
                segment.target_kind = TargetKind::Bag;
                segment.resource_type = self.metadata.property_type(&property);
            }
            PropertyKind::ResourceReference(_) | PropertyKind::ResourceSetReference(_) => {
                let source = previous
                    .container
                    .as_ref()
                    .ok_or_else(|| not_found(identifier))?;
                let target_set = self
                    .metadata
                    .association_target(source, &resource_type, &property)
                    .ok_or_else(|| not_found(identifier))?;
                let target_type = self.metadata.property_type(&property).ok_or_else(|| {
                    Error::Internal(format!(
                        "Target type of navigation property '{}' cannot be resolved",
                        identifier
                    ))
                })?;
                let target = ContainerItem::EntitySet(target_set);

                let keys = if property.is_resource_set_reference() {
                    parse_keys(predicate)?
                } else {
                    no_predicate(predicate)?;
                    None
                };

                let single = !property.is_resource_set_reference() || keys.is_some();
                let right = if single {
                    AccessRight::ReadSingle
                } else {
                    AccessRight::ReadMultiple
                };
                self.check_rights(&target, right, identifier)?;

                if let Some(keys) = keys {
                    segment.key_descriptor =
                        Some(keys.validate(identifier, &target_type, self.metadata.as_ref())?);
                }

                if after_links {
                    segment.target_kind = TargetKind::Link;
                }
                segment.target_source = TargetSource::EntitySet;
                segment.resource_type = Some(target_type);
                segment.container = Some(target);
                segment.is_single_result = single;
            }
        }

        Ok(segment)
    }
}
