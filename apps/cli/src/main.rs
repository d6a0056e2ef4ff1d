//! ferrum-odata - show how OData requests are interpreted against a service model

mod config;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ferrum_edm::EdmModel;
use ferrum_odata::{
    Error, QueryOptions, RequestDescription, SegmentDescriptor, UriProcessor,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

#[derive(Parser)]
#[command(
    name = "ferrum-odata",
    version,
    about = "Resolve OData request paths and compile $filter / $orderby expressions"
)]
struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON model definition, overrides the configured model
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a request path such as "/Customers('ALFKI')/Orders"
    Resolve { path: String },

    /// Process a request path with its query string, e.g. "/Customers?$filter=Rating gt 2"
    Request { url: String },

    /// Compile a $filter expression against an entity set
    Filter {
        #[arg(long)]
        entity_set: String,

        expression: String,

        /// Optional $orderby clause compiled alongside the filter
        #[arg(long)]
        orderby: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CliConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level));

    let Some(model_path) = cli.model.clone().or_else(|| config.model.clone()) else {
        bail!("No model definition given; use --model or set `model` in the configuration");
    };
    let text = std::fs::read_to_string(&model_path)
        .with_context(|| format!("Failed to read model {}", model_path.display()))?;
    let model = EdmModel::from_json(&text)
        .with_context(|| format!("Failed to load model {}", model_path.display()))?;

    tracing::info!(
        model = %model_path.display(),
        entity_sets = model.entity_sets().count(),
        "Model loaded"
    );

    let processor = UriProcessor::new(Arc::new(model), config.processor.clone());

    let result = match cli.command {
        Command::Resolve { path } => processor.process_path(&path, &QueryOptions::default()),
        Command::Request { url } => {
            let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
            QueryOptions::parse(query).and_then(|query| processor.process_path(path, &query))
        }
        Command::Filter {
            entity_set,
            expression,
            orderby,
        } => processor.process(
            &[entity_set],
            &QueryOptions {
                filter: Some(expression),
                orderby,
            },
        ),
    };

    match result {
        Ok(request) => {
            println!("{}", serde_json::to_string_pretty(&request_json(&request))?);
            Ok(())
        }
        Err(err) => {
            println!("{}", serde_json::to_string_pretty(&error_json(&err))?);
            std::process::exit(1);
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// The binary's own target is `ferrum_odata`, the same as the library's
fn default_directives(level: &str) -> String {
    format!("ferrum_odata={level},ferrum_edm={level}")
}

fn segment_json(segment: &SegmentDescriptor) -> Value {
    json!({
        "identifier": segment.identifier,
        "kind": format!("{:?}", segment.target_kind),
        "source": format!("{:?}", segment.target_source),
        "singleResult": segment.is_single_result,
        "type": segment.resource_type.as_ref().map(|ty| ty.full_name()),
        "container": segment.container.as_ref().map(|item| item.name().to_string()),
        "key": segment.key_descriptor.as_ref().map(|keys| keys.to_string()),
        "property": segment.projected_property.as_ref().map(|p| p.name.to_string()),
        "etag": segment.projected_property.as_ref().is_some_and(|p| p.is_etag()),
    })
}

fn request_json(request: &RequestDescription) -> Value {
    json!({
        "target": format!("{:?}", request.target_kind()),
        "count": request.is_count_request(),
        "segments": request.segments.iter().map(segment_json).collect::<Vec<_>>(),
        "filter": request.filter.as_ref().map(|filter| filter.code.clone()),
        "navigationPaths": request
            .navigation_paths
            .iter()
            .map(|path| path.iter().map(|p| p.name.to_string()).collect::<Vec<_>>().join("/"))
            .collect::<Vec<_>>(),
        "orderby": request
            .orderby
            .iter()
            .map(|item| json!({
                "expression": item.expression,
                "guard": item.guard,
                "ascending": item.ascending,
            }))
            .collect::<Vec<_>>(),
    })
}

fn error_json(err: &Error) -> Value {
    let category = match err {
        Error::Lexical { .. } => "lexical",
        Error::Syntax { .. } => "syntax",
        Error::Type { .. } => "type",
        Error::Resolution(_) => "resolution",
        Error::Structural(_) => "structural",
        Error::Internal(_) => "internal",
    };

    json!({
        "status": err.status().http_code(),
        "category": category,
        "message": err.message(),
        "position": err.position(),
    })
}
