//! Expression tree produced by the parser
//!
//! Every node carries its resolved type; there is no untyped node in a tree
//! returned from `ExpressionParser`.

use crate::functions::FunctionSignature;
use crate::types::ExprType;
use crate::value::Value;
use ferrum_edm::{EdmPrimitiveType, ResourceProperty};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithmeticOp {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "add" => Some(ArithmeticOp::Add),
            "sub" => Some(ArithmeticOp::Sub),
            "mul" => Some(ArithmeticOp::Mul),
            "div" => Some(ArithmeticOp::Div),
            "mod" => Some(ArithmeticOp::Mod),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Mul => "mul",
            ArithmeticOp::Div => "div",
            ArithmeticOp::Mod => "mod",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl RelationalOp {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "eq" => Some(RelationalOp::Eq),
            "ne" => Some(RelationalOp::Ne),
            "gt" => Some(RelationalOp::Gt),
            "ge" => Some(RelationalOp::Ge),
            "lt" => Some(RelationalOp::Lt),
            "le" => Some(RelationalOp::Le),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            RelationalOp::Eq => "eq",
            RelationalOp::Ne => "ne",
            RelationalOp::Gt => "gt",
            RelationalOp::Ge => "ge",
            RelationalOp::Lt => "lt",
            RelationalOp::Le => "le",
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(self, RelationalOp::Eq | RelationalOp::Ne)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn keyword(self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

impl UnaryOp {
    pub fn keyword(self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::Negate => "-",
        }
    }
}

/// A literal with its source text and typed value
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantExpression {
    pub ty: EdmPrimitiveType,
    pub text: String,
    pub value: Value,
}

/// Access to a property, optionally through a chain of parent accesses
///
/// `parent` is `None` only at the root of a path: `Customer/Address/City` is
/// `City` with parent `Address` with parent `Customer`.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAccessExpression {
    pub parent: Option<Box<PropertyAccessExpression>>,
    pub property: Arc<ResourceProperty>,
    /// Type of the accessed value
    pub resource_type: ExprType,
    pub position: usize,
}

impl PropertyAccessExpression {
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// Property names from the root to this access
    pub fn path(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = Some(self);
        while let Some(access) = current {
            names.push(&*access.property.name);
            current = access.parent.as_deref();
        }
        names.reverse();
        names
    }

    /// Every prefix of the path, root first. The full path is included only
    /// when `include_self` is set.
    pub fn hops(&self, include_self: bool) -> Vec<&PropertyAccessExpression> {
        let mut hops = Vec::new();
        let mut current = if include_self {
            Some(self)
        } else {
            self.parent.as_deref()
        };
        while let Some(access) = current {
            hops.push(access);
            current = access.parent.as_deref();
        }
        hops.reverse();
        hops
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Constant(ConstantExpression),
    PropertyAccess(PropertyAccessExpression),
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expression>,
        right: Box<Expression>,
        ty: EdmPrimitiveType,
    },
    Relational {
        op: RelationalOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        op: UnaryOp,
        child: Box<Expression>,
        ty: EdmPrimitiveType,
    },
    FunctionCall {
        function: &'static FunctionSignature,
        args: Vec<Expression>,
    },
}

impl Expression {
    pub fn ty(&self) -> ExprType {
        match self {
            Expression::Constant(constant) => ExprType::Primitive(constant.ty),
            Expression::PropertyAccess(access) => access.resource_type.clone(),
            Expression::Arithmetic { ty, .. } | Expression::Unary { ty, .. } => {
                ExprType::Primitive(*ty)
            }
            Expression::Relational { .. } | Expression::Logical { .. } => {
                ExprType::Primitive(EdmPrimitiveType::Boolean)
            }
            Expression::FunctionCall { function, .. } => {
                ExprType::Primitive(function.return_type)
            }
        }
    }

    pub fn primitive_type(&self) -> Option<EdmPrimitiveType> {
        self.ty().primitive()
    }
}

/// One `$orderby` key
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expression: Expression,
    pub ascending: bool,
}
