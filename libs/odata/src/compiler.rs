//! Expression compiler - typed tree to host predicate source
//!
//! Alongside the code for each node the compiler collects null guards: one
//! not-null check per navigation or complex hop a property path walks
//! through. Guards are deduplicated by path and kept in first-seen order.
//!
//! Placement rules:
//! - a property directly on the root entity needs no guard
//! - a multi-hop access guards every hop, the accessed value included
//! - `isNull(path)` guards only the parent hops of `path`
//! - for `and` / `or`, guards from the right operand wrap the right operand
//!   alone; guards from the left operand wrap the whole logical expression
//! - a boolean property used directly as a predicate is compared with `true`
//!   and guarded including itself
//!
//! Whatever guards remain at the root wrap the full predicate as
//! `(guards && predicate)`.

use crate::ast::{Expression, OrderByItem, PropertyAccessExpression, RelationalOp, UnaryOp};
use crate::codegen::{ExpressionProvider, TextExpressionProvider};
use crate::functions::FunctionId;
use crate::options::CompileOptions;
use smallvec::SmallVec;

/// Ordered, path-deduplicated set of not-null checks
#[derive(Debug, Default)]
struct NullGuards {
    checks: SmallVec<[(String, String); 4]>,
}

impl NullGuards {
    fn add<P: ExpressionProvider>(&mut self, provider: &P, access: &PropertyAccessExpression) {
        let key = access.path().join("/");
        if self.checks.iter().any(|(path, _)| *path == key) {
            return;
        }
        self.checks.push((key, provider.on_not_null(access)));
    }

    fn merge(&mut self, other: NullGuards) {
        for (path, check) in other.checks {
            if !self.checks.iter().any(|(existing, _)| *existing == path) {
                self.checks.push((path, check));
            }
        }
    }

    fn render(&self) -> Option<String> {
        if self.checks.is_empty() {
            return None;
        }
        let checks: Vec<&str> = self.checks.iter().map(|(_, check)| check.as_str()).collect();
        Some(checks.join(" && "))
    }

    /// `(guards && code)`, or `code` unchanged when there is nothing to guard
    fn wrap(&self, code: String) -> String {
        match self.render() {
            Some(guard) => format!("({} && {})", guard, code),
            None => code,
        }
    }
}

/// One compiled `$orderby` key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledOrderBy {
    /// Code yielding the sort key
    pub expression: String,
    /// Code that must hold before `expression` may be evaluated
    pub guard: Option<String>,
    pub ascending: bool,
}

/// Compiles typed expressions through an `ExpressionProvider`
pub struct ExpressionCompiler<P: ExpressionProvider = TextExpressionProvider> {
    provider: P,
}

impl ExpressionCompiler<TextExpressionProvider> {
    pub fn new(options: &CompileOptions) -> Self {
        Self {
            provider: TextExpressionProvider::new(options.root_variable.as_str()),
        }
    }
}

impl<P: ExpressionProvider> ExpressionCompiler<P> {
    pub fn with_provider(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Compile a filter predicate, null guards included
    pub fn process_expression(&self, expression: &Expression) -> String {
        let (code, guards) = self.compile_predicate(expression);
        guards.wrap(code)
    }

    /// Compile each `$orderby` key with its own guard
    pub fn compile_orderby(&self, items: &[OrderByItem]) -> Vec<CompiledOrderBy> {
        items
            .iter()
            .map(|item| {
                let (expression, guards) = self.compile(&item.expression);
                CompiledOrderBy {
                    expression,
                    guard: guards.render(),
                    ascending: item.ascending,
                }
            })
            .collect()
    }

    /// Compile an expression in boolean position
    fn compile_predicate(&self, expression: &Expression) -> (String, NullGuards) {
        match expression {
            Expression::PropertyAccess(access) => {
                let mut guards = NullGuards::default();
                for hop in access.hops(true) {
                    guards.add(&self.provider, hop);
                }
                let code = self.provider.on_relational(
                    RelationalOp::Eq,
                    &self.provider.on_property_access(access),
                    "true",
                );
                (code, guards)
            }
            other => self.compile(other),
        }
    }

    fn compile(&self, expression: &Expression) -> (String, NullGuards) {
        match expression {
            Expression::Constant(constant) => {
                (self.provider.on_constant(constant), NullGuards::default())
            }
            Expression::PropertyAccess(access) => {
                let mut guards = NullGuards::default();
                if access.has_parent() {
                    for hop in access.hops(true) {
                        guards.add(&self.provider, hop);
                    }
                }
                (self.provider.on_property_access(access), guards)
            }
            Expression::Arithmetic {
                op, left, right, ..
            } => {
                let (left, mut guards) = self.compile(left);
                let (right, right_guards) = self.compile(right);
                guards.merge(right_guards);
                (self.provider.on_arithmetic(*op, &left, &right), guards)
            }
            Expression::Relational { op, left, right } => {
                let (left, mut guards) = self.compile(left);
                let (right, right_guards) = self.compile(right);
                guards.merge(right_guards);
                (self.provider.on_relational(*op, &left, &right), guards)
            }
            Expression::Logical { op, left, right } => {
                let (left, left_guards) = self.compile_predicate(left);
                let (right, right_guards) = self.compile_predicate(right);
                let right = right_guards.wrap(right);
                let code = left_guards.wrap(self.provider.on_logical(*op, &left, &right));
                (code, NullGuards::default())
            }
            Expression::Unary { op, child, .. } => {
                let (child, guards) = match op {
                    UnaryOp::Not => self.compile_predicate(child),
                    UnaryOp::Negate => self.compile(child),
                };
                (self.provider.on_unary(*op, &child), guards)
            }
            Expression::FunctionCall { function, args } => {
                let mut guards = NullGuards::default();
                let mut compiled = Vec::with_capacity(args.len());

                for arg in args {
                    match arg {
                        Expression::PropertyAccess(access) if function.id == FunctionId::IsNull => {
                            for hop in access.hops(false) {
                                guards.add(&self.provider, hop);
                            }
                            compiled.push(self.provider.on_property_access(access));
                        }
                        other => {
                            let (code, arg_guards) = self.compile(other);
                            guards.merge(arg_guards);
                            compiled.push(code);
                        }
                    }
                }

                (self.provider.on_function_call(function, &compiled), guards)
            }
        }
    }
}

impl Default for ExpressionCompiler<TextExpressionProvider> {
    fn default() -> Self {
        Self::new(&CompileOptions::default())
    }
}
