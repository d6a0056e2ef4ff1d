//! Request pipeline - path and query options to a request description
//!
//! ```text
//! raw path ──split_path──▶ segments ──SegmentResolver──▶ SegmentChain
//!                                                           │
//! $filter / $orderby ──ExpressionParser──▶ typed tree ──ExpressionCompiler──▶ code
//! ```

use crate::ast::Expression;
use crate::compiler::{CompiledOrderBy, ExpressionCompiler};
use crate::error::{Error, Result};
use crate::options::ProcessorOptions;
use crate::parser::{ExpressionParser, NavigationPath};
use crate::resolver::SegmentResolver;
use crate::segment::{SegmentChain, SegmentDescriptor, TargetKind};
use ferrum_edm::{MetadataProvider, ResourceType};
use std::sync::Arc;

/// Split a raw request path into percent-decoded segments
///
/// Empty segments (leading, trailing or doubled `/`) are dropped.
pub fn split_path(raw: &str) -> Result<Vec<String>> {
    raw.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|decoded| decoded.into_owned())
                .map_err(|_| Error::syntax("Bad Request - Error in query syntax.", None))
        })
        .collect()
}

/// The query options this layer interprets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub filter: Option<String>,
    pub orderby: Option<String>,
}

impl QueryOptions {
    /// Extract `$filter` and `$orderby` from a raw query string
    ///
    /// `+` decodes to a space; other options are ignored.
    pub fn parse(query: &str) -> Result<Self> {
        let mut options = QueryOptions::default();

        for pair in query.trim_start_matches('?').split('&') {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let name = decode_component(name)?;
            let value = decode_component(value)?;

            match name.as_str() {
                "$filter" => options.filter = Some(value),
                "$orderby" => options.orderby = Some(value),
                _ => {}
            }
        }

        Ok(options)
    }
}

fn decode_component(text: &str) -> Result<String> {
    urlencoding::decode(&text.replace('+', " "))
        .map(|decoded| decoded.into_owned())
        .map_err(|_| Error::syntax(format!("Query component '{}' is not valid UTF-8", text), None))
}

/// Parsed and compiled `$filter`
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    pub expression: Expression,
    pub code: String,
}

/// Everything the execution layer needs to serve one request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescription {
    pub segments: SegmentChain,
    pub filter: Option<CompiledFilter>,
    pub orderby: Vec<CompiledOrderBy>,
    /// Navigation and complex paths the filter walks through
    pub navigation_paths: Vec<NavigationPath>,
    /// Filled in by the execution layer for `$count` requests
    pub count_value: Option<u64>,
}

impl RequestDescription {
    pub fn is_count_request(&self) -> bool {
        self.segments
            .last()
            .is_some_and(|segment| segment.identifier == "$count")
    }

    pub fn target_kind(&self) -> TargetKind {
        self.segments.target_kind()
    }
}

/// Runs resolution, parsing and compilation for a request
pub struct UriProcessor {
    metadata: Arc<dyn MetadataProvider>,
    resolver: SegmentResolver,
    compiler: ExpressionCompiler,
    options: ProcessorOptions,
}

impl UriProcessor {
    pub fn new(metadata: Arc<dyn MetadataProvider>, options: ProcessorOptions) -> Self {
        Self {
            resolver: SegmentResolver::new(metadata.clone(), options.resolver.clone()),
            compiler: ExpressionCompiler::new(&options.compiler),
            metadata,
            options,
        }
    }

    /// Resolve a raw path such as `/Customers('ALFKI')/Orders`
    pub fn process_path(&self, path: &str, query: &QueryOptions) -> Result<RequestDescription> {
        self.process(&split_path(path)?, query)
    }

    pub fn process(&self, segments: &[String], query: &QueryOptions) -> Result<RequestDescription> {
        let chain = self.resolver.resolve(segments)?;

        let mut description = RequestDescription {
            segments: chain,
            filter: None,
            orderby: Vec::new(),
            navigation_paths: Vec::new(),
            count_value: None,
        };

        if let Some(filter) = &query.filter {
            let resource_type = self.query_target(&description.segments, "$filter", false)?;
            let mut parser = ExpressionParser::with_options(
                filter,
                resource_type,
                self.metadata.clone(),
                true,
                self.options.parser.clone(),
            )?;
            let expression = parser.parse_filter()?;
            let code = self.compiler.process_expression(&expression);

            tracing::debug!(filter = %filter, code = %code, "Compiled $filter");

            description.navigation_paths = parser.navigation_properties_used().to_vec();
            description.filter = Some(CompiledFilter { expression, code });
        }

        if let Some(orderby) = &query.orderby {
            let resource_type = self.query_target(&description.segments, "$orderby", true)?;
            let mut parser = ExpressionParser::with_options(
                orderby,
                resource_type,
                self.metadata.clone(),
                false,
                self.options.parser.clone(),
            )?;
            let items = parser.parse_orderby()?;
            description.orderby = self.compiler.compile_orderby(&items);
        }

        Ok(description)
    }

    /// Entity type a query option is evaluated against
    fn query_target(
        &self,
        chain: &SegmentChain,
        option: &str,
        collection_only: bool,
    ) -> Result<Arc<ResourceType>> {
        let not_applicable = || {
            Error::Structural(format!(
                "Query option {} cannot be applied to the requested resource",
                option
            ))
        };

        let last = chain.last().ok_or_else(not_applicable)?;
        let target: &SegmentDescriptor = if last.identifier == "$count" {
            chain
                .previous(chain.len() - 1)
                .ok_or_else(not_applicable)?
        } else {
            last
        };

        let applicable = match target.target_kind {
            TargetKind::Resource => !collection_only || !target.is_single_result,
            _ => false,
        };
        if !applicable {
            return Err(not_applicable());
        }

        target.resource_type.clone().ok_or_else(not_applicable)
    }
}
