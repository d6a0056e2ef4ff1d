//! Expression types and numeric promotion
//!
//! Binary numeric operators promote both operands along
//! `Int32 -> Int64 -> Single -> Double`. `Byte`, `SByte` and `Int16` take part
//! at the `Int32` level. `Decimal` combines with itself and integral types
//! only.

use ferrum_edm::{EdmPrimitiveType, ResourceType};
use std::fmt;
use std::sync::Arc;

/// Resolved type of an expression node
#[derive(Debug, Clone, PartialEq)]
pub enum ExprType {
    Primitive(EdmPrimitiveType),
    /// Complex or entity type reached through a property path
    Resource(Arc<ResourceType>),
}

impl ExprType {
    pub fn primitive(&self) -> Option<EdmPrimitiveType> {
        match self {
            ExprType::Primitive(ty) => Some(*ty),
            ExprType::Resource(_) => None,
        }
    }

    pub fn is_boolean(&self) -> bool {
        self.primitive() == Some(EdmPrimitiveType::Boolean)
    }
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprType::Primitive(ty) => write!(f, "{}", ty),
            ExprType::Resource(ty) => f.write_str(&ty.full_name()),
        }
    }
}

fn numeric_rank(ty: EdmPrimitiveType) -> Option<u8> {
    match ty {
        EdmPrimitiveType::Byte
        | EdmPrimitiveType::SByte
        | EdmPrimitiveType::Int16
        | EdmPrimitiveType::Int32 => Some(0),
        EdmPrimitiveType::Int64 => Some(1),
        EdmPrimitiveType::Single => Some(2),
        EdmPrimitiveType::Double => Some(3),
        _ => None,
    }
}

fn rank_type(rank: u8) -> EdmPrimitiveType {
    match rank {
        0 => EdmPrimitiveType::Int32,
        1 => EdmPrimitiveType::Int64,
        2 => EdmPrimitiveType::Single,
        _ => EdmPrimitiveType::Double,
    }
}

/// Common type of two numeric operands, if any
pub fn promote_numeric(
    left: EdmPrimitiveType,
    right: EdmPrimitiveType,
) -> Option<EdmPrimitiveType> {
    use EdmPrimitiveType::Decimal;

    match (left, right) {
        (Decimal, Decimal) => Some(Decimal),
        (Decimal, other) | (other, Decimal) => other.is_integral().then_some(Decimal),
        _ => {
            let rank = numeric_rank(left)?.max(numeric_rank(right)?);
            Some(rank_type(rank))
        }
    }
}

/// Result type of arithmetic negation
pub fn promote_unary(operand: EdmPrimitiveType) -> Option<EdmPrimitiveType> {
    match operand {
        EdmPrimitiveType::Decimal => Some(EdmPrimitiveType::Decimal),
        other => numeric_rank(other).map(rank_type),
    }
}
