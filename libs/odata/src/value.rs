//! Typed literal values
//!
//! Every literal in a key predicate or expression is converted to a `Value`
//! of its EDM type. `Display` renders the OData literal form.

use chrono::NaiveDateTime;
use ferrum_edm::EdmPrimitiveType;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Byte(u8),
    SByte(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    String(String),
    DateTime(NaiveDateTime),
    Guid(Uuid),
    Binary(Vec<u8>),
}

impl Value {
    pub fn edm_type(&self) -> Option<EdmPrimitiveType> {
        let ty = match self {
            Value::Null => return None,
            Value::Boolean(_) => EdmPrimitiveType::Boolean,
            Value::Byte(_) => EdmPrimitiveType::Byte,
            Value::SByte(_) => EdmPrimitiveType::SByte,
            Value::Int16(_) => EdmPrimitiveType::Int16,
            Value::Int32(_) => EdmPrimitiveType::Int32,
            Value::Int64(_) => EdmPrimitiveType::Int64,
            Value::Single(_) => EdmPrimitiveType::Single,
            Value::Double(_) => EdmPrimitiveType::Double,
            Value::Decimal(_) => EdmPrimitiveType::Decimal,
            Value::String(_) => EdmPrimitiveType::String,
            Value::DateTime(_) => EdmPrimitiveType::DateTime,
            Value::Guid(_) => EdmPrimitiveType::Guid,
            Value::Binary(_) => EdmPrimitiveType::Binary,
        };
        Some(ty)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn as_integral(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(i64::from(*v)),
            Value::SByte(v) => Some(i64::from(*v)),
            Value::Int16(v) => Some(i64::from(*v)),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to `target`, returning `None` when the value has no
    /// representation in that type. Integral values narrow only when they fit.
    pub fn convert_to(&self, target: EdmPrimitiveType) -> Option<Value> {
        if self.edm_type() == Some(target) {
            return Some(self.clone());
        }

        if let Some(v) = self.as_integral() {
            return match target {
                EdmPrimitiveType::Byte => u8::try_from(v).ok().map(Value::Byte),
                EdmPrimitiveType::SByte => i8::try_from(v).ok().map(Value::SByte),
                EdmPrimitiveType::Int16 => i16::try_from(v).ok().map(Value::Int16),
                EdmPrimitiveType::Int32 => i32::try_from(v).ok().map(Value::Int32),
                EdmPrimitiveType::Int64 => Some(Value::Int64(v)),
                EdmPrimitiveType::Single => Some(Value::Single(v as f32)),
                EdmPrimitiveType::Double => Some(Value::Double(v as f64)),
                EdmPrimitiveType::Decimal => Some(Value::Decimal(Decimal::from(v))),
                _ => None,
            };
        }

        match (self, target) {
            (Value::Single(v), EdmPrimitiveType::Double) => Some(Value::Double(f64::from(*v))),
            _ => None,
        }
    }

    /// Arithmetic negation of a numeric value
    pub fn negate(&self) -> Option<Value> {
        match self {
            Value::SByte(v) => v.checked_neg().map(Value::SByte),
            Value::Int16(v) => v.checked_neg().map(Value::Int16),
            Value::Int32(v) => v.checked_neg().map(Value::Int32),
            Value::Int64(v) => v.checked_neg().map(Value::Int64),
            Value::Byte(v) => Some(Value::Int32(-i32::from(*v))),
            Value::Single(v) => Some(Value::Single(-v)),
            Value::Double(v) => Some(Value::Double(-v)),
            Value::Decimal(v) => Some(Value::Decimal(-v)),
            _ => None,
        }
    }
}

pub(crate) fn format_float(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "INF" } else { "-INF" };
        text.to_string()
    } else {
        format!("{:?}", value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::SByte(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}L", v),
            Value::Single(v) => write!(f, "{}f", format_float(f64::from(*v))),
            Value::Double(v) => f.write_str(&format_float(*v)),
            Value::Decimal(v) => write!(f, "{}M", v),
            Value::String(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::DateTime(v) => write!(f, "datetime'{}'", v.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Guid(v) => write!(f, "guid'{}'", v),
            Value::Binary(v) => write!(f, "X'{}'", hex::encode_upper(v)),
        }
    }
}

/// Named field lookup on a host entity
///
/// Lets a host compare its entities with validated keys without reflection.
pub trait FieldAccess {
    fn get_named_field(&self, name: &str) -> Option<Value>;
}

impl FieldAccess for HashMap<String, Value> {
    fn get_named_field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}
