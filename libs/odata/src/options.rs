//! Processing options
//!
//! All option structs deserialize with defaults for missing fields so hosts
//! can embed them in their own configuration files.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Maximum nesting of parenthesized, unary and function-call expressions
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self { max_depth: 200 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Name of the variable bound to the entity under test in generated code
    pub root_variable: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            root_variable: "$lt".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Consult `MetadataProvider::check_rights` for every addressed set
    pub check_rights: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self { check_rights: true }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorOptions {
    pub parser: ParserOptions,
    pub compiler: CompileOptions,
    pub resolver: ResolverOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ProcessorOptions::default();
        assert_eq!(options.parser.max_depth, 200);
        assert_eq!(options.compiler.root_variable, "$lt");
        assert!(options.resolver.check_rights);
    }
}
