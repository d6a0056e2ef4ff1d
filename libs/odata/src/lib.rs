//! OData request interpretation - URI segments, key predicates and query expressions
//!
//! Turns a raw request path plus `$filter` / `$orderby` text into a validated,
//! statically typed description a query backend can execute.
//!
//! # Architecture Overview
//!
//! ```text
//! Request path                          $filter / $orderby
//!      |                                       |
//! SegmentResolver -> SegmentChain       ExpressionLexer -> tokens
//!      |  (KeyDescriptor per key)              |
//!      |                                ExpressionParser -> typed Expression
//!      |                                       |
//!      |                                ExpressionCompiler -> predicate code
//!      |                                       |
//!      +----------- UriProcessor --------------+
//!                       |
//!               RequestDescription
//! ```
//!
//! Metadata is consumed through `ferrum_edm::MetadataProvider`.

pub mod ast;
pub mod codegen;
pub mod compiler;
pub mod error;
pub mod functions;
pub mod key;
pub mod lexer;
pub mod literal;
pub mod options;
pub mod parser;
pub mod processor;
pub mod resolver;
pub mod segment;
pub mod token;
pub mod types;
pub mod value;

// Re-export main types
pub use ast::{Expression, OrderByItem};
pub use codegen::{ExpressionProvider, TextExpressionProvider};
pub use compiler::{CompiledOrderBy, ExpressionCompiler};
pub use error::{Error, ErrorStatus, Result};
pub use key::{KeyDescriptor, ValidatedKeyDescriptor};
pub use lexer::ExpressionLexer;
pub use options::{CompileOptions, ParserOptions, ProcessorOptions, ResolverOptions};
pub use parser::{ExpressionParser, NavigationPath};
pub use processor::{split_path, CompiledFilter, QueryOptions, RequestDescription, UriProcessor};
pub use resolver::SegmentResolver;
pub use segment::{SegmentChain, SegmentDescriptor, TargetKind, TargetSource};
pub use token::{ExpressionToken, TokenId};
pub use types::ExprType;
pub use value::{FieldAccess, Value};
