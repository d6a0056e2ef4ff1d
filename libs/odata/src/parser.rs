//! Expression parser - converts `$filter` / `$orderby` text to a typed tree
//!
//! Recursive descent parser that type-checks while it builds. Precedence
//! (lowest to highest):
//! 1. or
//! 2. and
//! 3. not
//! 4. relational (eq, ne, gt, ge, lt, le)
//! 5. additive (add, sub)
//! 6. multiplicative (mul, div, mod)
//! 7. unary minus
//! 8. primary (literal, property path, parenthesized, function call)
//!
//! The `null` literal flows up as an operand until it reaches an equality
//! operator, where `x eq null` becomes `isNull(x)` and `x ne null` becomes
//! `not isNull(x)`. Anywhere else it is rejected.

use crate::ast::*;
use crate::error::{Error, Result};
use crate::functions::{
    self, BINARY_EQUAL, COMPARE_DATETIME, COMPARE_STRING, GUID_EQUAL, IS_NULL,
};
use crate::lexer::ExpressionLexer;
use crate::literal;
use crate::options::ParserOptions;
use crate::token::{ExpressionToken, TokenId};
use crate::types::{promote_numeric, promote_unary, ExprType};
use crate::value::Value;
use ferrum_edm::{EdmPrimitiveType, MetadataProvider, PropertyKind, ResourceProperty, ResourceType};
use std::sync::Arc;

/// Navigation and complex properties traversed by one property path, root first
pub type NavigationPath = Vec<Arc<ResourceProperty>>;

/// An operand before `null` has been resolved by an equality operator
enum Operand {
    Expr(Expression),
    Null { position: usize },
}

/// Parser for `$filter` and `$orderby` expressions
pub struct ExpressionParser {
    text: String,
    lexer: ExpressionLexer,
    resource_type: Arc<ResourceType>,
    metadata: Arc<dyn MetadataProvider>,
    is_filter: bool,
    options: ParserOptions,
    recursion_depth: usize,
    navigation_paths: Vec<NavigationPath>,
}

impl ExpressionParser {
    /// Create a parser for `text` evaluated against entities of `resource_type`
    pub fn new(
        text: &str,
        resource_type: Arc<ResourceType>,
        metadata: Arc<dyn MetadataProvider>,
        is_filter: bool,
    ) -> Result<Self> {
        Self::with_options(
            text,
            resource_type,
            metadata,
            is_filter,
            ParserOptions::default(),
        )
    }

    pub fn with_options(
        text: &str,
        resource_type: Arc<ResourceType>,
        metadata: Arc<dyn MetadataProvider>,
        is_filter: bool,
        options: ParserOptions,
    ) -> Result<Self> {
        Ok(Self {
            text: text.to_string(),
            lexer: ExpressionLexer::new(text)?,
            resource_type,
            metadata,
            is_filter,
            options,
            recursion_depth: 0,
            navigation_paths: Vec::new(),
        })
    }

    /// Reuse the parser and its type context for a new expression
    pub fn reset_parser(&mut self, text: &str) -> Result<()> {
        self.text = text.to_string();
        self.restart()
    }

    pub fn resource_type(&self) -> &Arc<ResourceType> {
        &self.resource_type
    }

    /// Navigation paths used by the most recently parsed expression
    pub fn navigation_properties_used(&self) -> &[NavigationPath] {
        &self.navigation_paths
    }

    fn restart(&mut self) -> Result<()> {
        self.lexer = ExpressionLexer::new(&self.text)?;
        self.recursion_depth = 0;
        self.navigation_paths.clear();
        Ok(())
    }

    /// Parse the whole text as a single expression
    ///
    /// A filter expression must be of type `Edm.Boolean`.
    pub fn parse_filter(&mut self) -> Result<Expression> {
        self.restart()?;

        let operand = self.parse_expression()?;
        self.lexer.validate_token(TokenId::End)?;

        let expression = match operand {
            Operand::Expr(expression) => expression,
            Operand::Null { position } if !self.is_filter => {
                return Err(Error::syntax(
                    format!(
                        "The 'null' literal at position {} cannot be used as an expression",
                        position
                    ),
                    position,
                ))
            }
            Operand::Null { .. } => return Err(boolean_expected()),
        };

        if self.is_filter && !expression.ty().is_boolean() {
            return Err(boolean_expected());
        }

        Ok(expression)
    }

    /// Parse a comma-separated list of `expression [asc|desc]`
    pub fn parse_orderby(&mut self) -> Result<Vec<OrderByItem>> {
        self.restart()?;

        let mut items = Vec::new();
        loop {
            let position = self.current().position;
            let expression = match self.parse_expression()? {
                Operand::Expr(expression) if expression.primitive_type().is_some() => expression,
                _ => {
                    return Err(Error::type_error(
                        format!("Expression of primitive type expected at position {}", position),
                        position,
                    ))
                }
            };

            let ascending = if self.current().identifier_is("desc") {
                self.next()?;
                false
            } else {
                if self.current().identifier_is("asc") {
                    self.next()?;
                }
                true
            };

            items.push(OrderByItem {
                expression,
                ascending,
            });

            if self.current().id == TokenId::Comma {
                self.next()?;
                continue;
            }
            self.lexer.validate_token(TokenId::End)?;
            break;
        }

        Ok(items)
    }

    fn current(&self) -> &ExpressionToken {
        self.lexer.current_token()
    }

    fn next(&mut self) -> Result<()> {
        self.lexer.next_token().map(|_| ())
    }

    /// Expect a specific token kind and advance
    fn expect(&mut self, id: TokenId, message: &str) -> Result<()> {
        if self.current().id != id {
            let position = self.current().position;
            return Err(Error::syntax(
                format!("{} at position {}", message, position),
                position,
            ));
        }
        self.next()
    }

    fn check_recursion_depth(&mut self) -> Result<()> {
        self.recursion_depth += 1;
        if self.recursion_depth > self.options.max_depth {
            return Err(Error::syntax(
                format!(
                    "Expression too deeply nested (max depth: {})",
                    self.options.max_depth
                ),
                self.current().position,
            ));
        }
        Ok(())
    }

    fn decrement_recursion_depth(&mut self) {
        self.recursion_depth -= 1;
    }

    fn parse_expression(&mut self) -> Result<Operand> {
        self.check_recursion_depth()?;
        let operand = self.parse_logical_or()?;
        self.decrement_recursion_depth();
        Ok(operand)
    }

    fn parse_logical_or(&mut self) -> Result<Operand> {
        let mut left = self.parse_logical_and()?;

        while self.current().identifier_is("or") {
            let position = self.current().position;
            self.next()?;
            let right = self.parse_logical_and()?;
            left = Operand::Expr(combine_logical(LogicalOp::Or, left, right, position)?);
        }

        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Operand> {
        let mut left = self.parse_unary_not()?;

        while self.current().identifier_is("and") {
            let position = self.current().position;
            self.next()?;
            let right = self.parse_unary_not()?;
            left = Operand::Expr(combine_logical(LogicalOp::And, left, right, position)?);
        }

        Ok(left)
    }

    fn parse_unary_not(&mut self) -> Result<Operand> {
        if !self.current().identifier_is("not") {
            return self.parse_relational();
        }

        let position = self.current().position;
        self.next()?;
        self.check_recursion_depth()?;
        let child = self.parse_unary_not()?;
        self.decrement_recursion_depth();

        let child = require_value(child, "not", position)?;
        if !child.ty().is_boolean() {
            return Err(Error::type_error(
                format!(
                    "Operator 'not' incompatible with operand type {} at position {}",
                    child.ty(),
                    position
                ),
                position,
            ));
        }

        Ok(Operand::Expr(Expression::Unary {
            op: UnaryOp::Not,
            child: Box::new(child),
            ty: EdmPrimitiveType::Boolean,
        }))
    }

    fn parse_relational(&mut self) -> Result<Operand> {
        let mut left = self.parse_additive()?;

        while self.current().is_comparison_operator() {
            let token = self.current().clone();
            let op = RelationalOp::from_keyword(&token.text).ok_or_else(|| {
                Error::Internal(format!("'{}' is not a relational operator", token.text))
            })?;
            self.next()?;
            let right = self.parse_additive()?;
            left = Operand::Expr(combine_relational(op, left, right, token.position)?);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Operand> {
        let mut left = self.parse_multiplicative()?;

        while self.current().is_additive_operator() {
            let token = self.current().clone();
            self.next()?;
            let right = self.parse_multiplicative()?;
            left = Operand::Expr(combine_arithmetic(&token, left, right)?);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Operand> {
        let mut left = self.parse_unary()?;

        while self.current().is_multiplicative_operator() {
            let token = self.current().clone();
            self.next()?;
            let right = self.parse_unary()?;
            left = Operand::Expr(combine_arithmetic(&token, left, right)?);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Operand> {
        if self.current().id != TokenId::Minus {
            return self.parse_primary();
        }

        let position = self.current().position;
        self.next()?;
        self.check_recursion_depth()?;
        let child = self.parse_unary()?;
        self.decrement_recursion_depth();

        let child = require_value(child, "-", position)?;
        let ty = child
            .primitive_type()
            .and_then(promote_unary)
            .ok_or_else(|| {
                Error::type_error(
                    format!(
                        "Operator '-' incompatible with operand type {} at position {}",
                        child.ty(),
                        position
                    ),
                    position,
                )
            })?;

        if let Expression::Constant(constant) = &child {
            if let Some(value) = constant.value.convert_to(ty).and_then(|v| v.negate()) {
                return Ok(Operand::Expr(Expression::Constant(ConstantExpression {
                    ty,
                    text: format!("-{}", constant.text),
                    value,
                })));
            }
        }

        Ok(Operand::Expr(Expression::Unary {
            op: UnaryOp::Negate,
            child: Box::new(child),
            ty,
        }))
    }

    fn parse_primary(&mut self) -> Result<Operand> {
        let token = self.current().clone();

        match token.id {
            id if id.is_literal() => {
                let (ty, value) = literal::parse_literal(&token)?;
                self.next()?;
                Ok(Operand::Expr(Expression::Constant(ConstantExpression {
                    ty,
                    text: token.text,
                    value,
                })))
            }
            TokenId::OpenParen => {
                self.next()?;
                let operand = self.parse_expression()?;
                self.expect(TokenId::CloseParen, "')' or operator expected")?;
                Ok(operand)
            }
            TokenId::Identifier if token.text == "null" => {
                self.next()?;
                Ok(Operand::Null {
                    position: token.position,
                })
            }
            TokenId::Identifier => {
                if self.lexer.peek_next_token()?.id == TokenId::OpenParen {
                    self.parse_function_call().map(Operand::Expr)
                } else {
                    self.parse_member_access().map(Operand::Expr)
                }
            }
            _ => Err(Error::syntax(
                format!("Expression expected at position {}", token.position),
                token.position,
            )),
        }
    }

    /// Parse a `/`-separated property path starting at the root type
    fn parse_member_access(&mut self) -> Result<Expression> {
        let query_option = if self.is_filter { "$filter" } else { "$orderby" };
        let mut current_type = self.resource_type.clone();
        let mut parent: Option<PropertyAccessExpression> = None;
        let mut hops: NavigationPath = Vec::new();

        loop {
            let token = self.current().clone();
            let name = token.identifier()?;

            let property = self.metadata.property(&current_type, name).ok_or_else(|| {
                Error::Resolution(format!(
                    "No property '{}' exists in type '{}' at position {}",
                    name, current_type.name, token.position
                ))
            })?;

            match &property.kind {
                PropertyKind::ResourceSetReference(_) => {
                    return Err(Error::Resolution(format!(
                        "The '{}' is an entity collection property of '{}' (position: {}), which cannot be used in {} query option",
                        name, current_type.name, token.position, query_option
                    )))
                }
                PropertyKind::Bag(_) => {
                    return Err(Error::Resolution(format!(
                        "The '{}' is a bag property of '{}' (position: {}), which cannot be used in {} query option",
                        name, current_type.name, token.position, query_option
                    )))
                }
                _ => {}
            }

            let resource_type = match property.primitive_type() {
                Some(ty) => ExprType::Primitive(ty),
                None => {
                    let target = self.metadata.property_type(&property).ok_or_else(|| {
                        Error::Internal(format!(
                            "Type of property '{}' cannot be resolved",
                            property.name
                        ))
                    })?;
                    hops.push(property.clone());
                    ExprType::Resource(target)
                }
            };

            self.next()?;

            let access = PropertyAccessExpression {
                parent: parent.take().map(Box::new),
                property,
                resource_type,
                position: token.position,
            };

            let next_type = match &access.resource_type {
                ExprType::Resource(ty) if self.current().id == TokenId::Slash => Some(ty.clone()),
                _ => None,
            };

            match next_type {
                Some(ty) => {
                    current_type = ty;
                    parent = Some(access);
                    self.next()?;
                }
                None => {
                    self.record_navigation(hops);
                    return Ok(Expression::PropertyAccess(access));
                }
            }
        }
    }

    fn record_navigation(&mut self, hops: NavigationPath) {
        if hops.is_empty() {
            return;
        }
        let seen = self.navigation_paths.iter().any(|path| {
            path.len() == hops.len() && path.iter().zip(&hops).all(|(a, b)| a.name == b.name)
        });
        if !seen {
            self.navigation_paths.push(hops);
        }
    }

    fn parse_function_call(&mut self) -> Result<Expression> {
        let token = self.current().clone();
        let name = token.text.as_str();

        let overloads = functions::lookup(name).ok_or_else(|| {
            Error::Resolution(format!(
                "Unknown function '{}' at position {}",
                name, token.position
            ))
        })?;

        self.next()?; // function name
        self.next()?; // '('

        let mut args = Vec::new();
        if self.current().id != TokenId::CloseParen {
            loop {
                match self.parse_expression()? {
                    Operand::Expr(arg) => args.push(arg),
                    Operand::Null { position } => {
                        return Err(Error::syntax(
                            format!(
                                "The 'null' literal at position {} cannot be used as an argument of '{}'",
                                position, name
                            ),
                            position,
                        ))
                    }
                }
                if self.current().id != TokenId::Comma {
                    break;
                }
                self.next()?;
            }
        }
        self.expect(TokenId::CloseParen, "')' or ',' expected")?;

        let arg_types: Option<Vec<EdmPrimitiveType>> =
            args.iter().map(|arg| arg.primitive_type()).collect();
        let function = arg_types
            .and_then(|types| functions::resolve_overload(overloads, &types))
            .ok_or_else(|| {
                let considered: Vec<String> =
                    overloads.iter().map(|overload| overload.to_string()).collect();
                Error::type_error(
                    format!(
                        "No applicable function found for '{}' at position {} with the specified arguments. The functions considered are: {}",
                        name,
                        token.position,
                        considered.join("; ")
                    ),
                    token.position,
                )
            })?;

        let args = args
            .into_iter()
            .zip(function.params)
            .map(|(arg, ty)| retype(arg, *ty))
            .collect();

        Ok(Expression::FunctionCall { function, args })
    }
}

fn boolean_expected() -> Error {
    Error::type_error("Expression of type 'Edm.Boolean' expected at position 0", 0)
}

fn null_not_supported(operator: &str, position: usize) -> Error {
    Error::type_error(
        format!(
            "The operator '{}' at position {} is not supported for the 'null' literal; only equality checks are supported",
            operator, position
        ),
        position,
    )
}

fn incompatible_operands(operator: &str, left: &Expression, right: &Expression) -> Error {
    Error::type_error(
        format!(
            "Operator '{}' incompatible with operand types {} and {}",
            operator,
            left.ty(),
            right.ty()
        ),
        None,
    )
}

fn require_value(operand: Operand, operator: &str, position: usize) -> Result<Expression> {
    match operand {
        Operand::Expr(expression) => Ok(expression),
        Operand::Null { .. } => Err(null_not_supported(operator, position)),
    }
}

/// Give a constant the type its operator promoted it to
fn retype(expression: Expression, ty: EdmPrimitiveType) -> Expression {
    match expression {
        Expression::Constant(constant) if constant.ty != ty => {
            match constant.value.convert_to(ty) {
                Some(value) => Expression::Constant(ConstantExpression {
                    ty,
                    text: constant.text,
                    value,
                }),
                None => Expression::Constant(constant),
            }
        }
        other => other,
    }
}

fn zero() -> Expression {
    Expression::Constant(ConstantExpression {
        ty: EdmPrimitiveType::Int32,
        text: "0".to_string(),
        value: Value::Int32(0),
    })
}

fn negate(expression: Expression) -> Expression {
    Expression::Unary {
        op: UnaryOp::Not,
        child: Box::new(expression),
        ty: EdmPrimitiveType::Boolean,
    }
}

fn combine_logical(
    op: LogicalOp,
    left: Operand,
    right: Operand,
    position: usize,
) -> Result<Expression> {
    let left = require_value(left, op.keyword(), position)?;
    let right = require_value(right, op.keyword(), position)?;

    if !left.ty().is_boolean() || !right.ty().is_boolean() {
        return Err(incompatible_operands(op.keyword(), &left, &right));
    }

    Ok(Expression::Logical {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn combine_arithmetic(token: &ExpressionToken, left: Operand, right: Operand) -> Result<Expression> {
    let op = ArithmeticOp::from_keyword(&token.text).ok_or_else(|| {
        Error::Internal(format!("'{}' is not an arithmetic operator", token.text))
    })?;
    let left = require_value(left, op.keyword(), token.position)?;
    let right = require_value(right, op.keyword(), token.position)?;

    let ty = match (left.primitive_type(), right.primitive_type()) {
        (Some(l), Some(r)) => promote_numeric(l, r),
        _ => None,
    }
    .ok_or_else(|| incompatible_operands(op.keyword(), &left, &right))?;

    Ok(Expression::Arithmetic {
        op,
        left: Box::new(retype(left, ty)),
        right: Box::new(retype(right, ty)),
        ty,
    })
}

fn combine_relational(
    op: RelationalOp,
    left: Operand,
    right: Operand,
    position: usize,
) -> Result<Expression> {
    match (left, right) {
        (Operand::Null { .. }, Operand::Null { .. }) => {
            Err(null_not_supported(op.keyword(), position))
        }
        (Operand::Expr(value), Operand::Null { .. }) | (Operand::Null { .. }, Operand::Expr(value)) => {
            if !op.is_equality() {
                return Err(null_not_supported(op.keyword(), position));
            }
            let test = Expression::FunctionCall {
                function: &IS_NULL,
                args: vec![value],
            };
            Ok(match op {
                RelationalOp::Ne => negate(test),
                _ => test,
            })
        }
        (Operand::Expr(left), Operand::Expr(right)) => relational(op, left, right),
    }
}

fn relational(op: RelationalOp, left: Expression, right: Expression) -> Result<Expression> {
    let (Some(l), Some(r)) = (left.primitive_type(), right.primitive_type()) else {
        return Err(incompatible_operands(op.keyword(), &left, &right));
    };

    if l.is_numeric() && r.is_numeric() {
        let ty = promote_numeric(l, r)
            .ok_or_else(|| incompatible_operands(op.keyword(), &left, &right))?;
        return Ok(Expression::Relational {
            op,
            left: Box::new(retype(left, ty)),
            right: Box::new(retype(right, ty)),
        });
    }

    if l != r {
        return Err(incompatible_operands(op.keyword(), &left, &right));
    }

    match l {
        EdmPrimitiveType::String | EdmPrimitiveType::DateTime => {
            let compare = if l == EdmPrimitiveType::String {
                &COMPARE_STRING
            } else {
                &COMPARE_DATETIME
            };
            Ok(Expression::Relational {
                op,
                left: Box::new(Expression::FunctionCall {
                    function: compare,
                    args: vec![left, right],
                }),
                right: Box::new(zero()),
            })
        }
        EdmPrimitiveType::Boolean if op.is_equality() => Ok(Expression::Relational {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }),
        EdmPrimitiveType::Guid | EdmPrimitiveType::Binary if op.is_equality() => {
            let function = if l == EdmPrimitiveType::Guid {
                &GUID_EQUAL
            } else {
                &BINARY_EQUAL
            };
            let test = Expression::FunctionCall {
                function,
                args: vec![left, right],
            };
            Ok(match op {
                RelationalOp::Ne => negate(test),
                _ => test,
            })
        }
        _ => Err(incompatible_operands(op.keyword(), &left, &right)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrum_edm::EdmModel;

    fn parser(text: &str) -> ExpressionParser {
        let model = EdmModel::builder()
            .add_type(
                ResourceType::entity("Product")
                    .with_key("ProductID", EdmPrimitiveType::Int32)
                    .with_primitive("Name", EdmPrimitiveType::String)
                    .with_primitive("Price", EdmPrimitiveType::Decimal),
            )
            .add_entity_set("Products", "Product")
            .build()
            .unwrap();
        let product = model.resource_type("Product").unwrap();
        ExpressionParser::new(text, product, Arc::new(model), true).unwrap()
    }

    #[test]
    fn test_decimal_promotion() {
        let expr = parser("Price add 1 gt 10").parse_filter().unwrap();
        let Expression::Relational { left, right, .. } = expr else {
            panic!("expected a relational node");
        };
        assert_eq!(left.primitive_type(), Some(EdmPrimitiveType::Decimal));
        assert_eq!(right.primitive_type(), Some(EdmPrimitiveType::Decimal));
    }

    #[test]
    fn test_filter_must_be_boolean() {
        let err = parser("Price add 1").parse_filter().unwrap_err();
        assert_eq!(
            err.message(),
            "Expression of type 'Edm.Boolean' expected at position 0"
        );
    }

    #[test]
    fn test_ne_null_is_negated_is_null() {
        let expr = parser("Name ne null").parse_filter().unwrap();
        match expr {
            Expression::Unary {
                op: UnaryOp::Not,
                child,
                ..
            } => assert!(matches!(
                *child,
                Expression::FunctionCall { function, .. } if function.id == functions::FunctionId::IsNull
            )),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_recursion_limit() {
        let text = format!("{}true{}", "(".repeat(250), ")".repeat(250));
        let err = parser(&text).parse_filter().unwrap_err();
        assert!(err.message().contains("too deeply nested"));
    }
}
