//! CLI configuration
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! configuration file, `FERRUM_ODATA_*` environment variables and command line
//! flags. Nested keys use `__` in variable names, e.g.
//! `FERRUM_ODATA_PROCESSOR__COMPILER__ROOT_VARIABLE=$row`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File};
use ferrum_odata::ProcessorOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "FERRUM_ODATA";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// JSON model definition
    pub model: Option<PathBuf>,
    pub log_level: String,
    pub processor: ProcessorOptions,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            model: None,
            log_level: "warn".to_string(),
            processor: ProcessorOptions::default(),
        }
    }
}

impl CliConfig {
    /// Load from `path` (if given) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        Self::build(builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        ))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}
