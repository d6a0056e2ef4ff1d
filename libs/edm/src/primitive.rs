//! EDM primitive types
//!
//! The closed set of OData v2 primitive types this layer understands, with the
//! widening rules used when a value of one type is supplied where another is
//! declared (key predicates, function arguments).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdmPrimitiveType {
    #[serde(rename = "Edm.Binary")]
    Binary,
    #[serde(rename = "Edm.Boolean")]
    Boolean,
    #[serde(rename = "Edm.Byte")]
    Byte,
    #[serde(rename = "Edm.DateTime")]
    DateTime,
    #[serde(rename = "Edm.Decimal")]
    Decimal,
    #[serde(rename = "Edm.Double")]
    Double,
    #[serde(rename = "Edm.Guid")]
    Guid,
    #[serde(rename = "Edm.Int16")]
    Int16,
    #[serde(rename = "Edm.Int32")]
    Int32,
    #[serde(rename = "Edm.Int64")]
    Int64,
    #[serde(rename = "Edm.SByte")]
    SByte,
    #[serde(rename = "Edm.Single")]
    Single,
    #[serde(rename = "Edm.String")]
    String,
}

impl EdmPrimitiveType {
    pub const ALL: [EdmPrimitiveType; 13] = [
        EdmPrimitiveType::Binary,
        EdmPrimitiveType::Boolean,
        EdmPrimitiveType::Byte,
        EdmPrimitiveType::DateTime,
        EdmPrimitiveType::Decimal,
        EdmPrimitiveType::Double,
        EdmPrimitiveType::Guid,
        EdmPrimitiveType::Int16,
        EdmPrimitiveType::Int32,
        EdmPrimitiveType::Int64,
        EdmPrimitiveType::SByte,
        EdmPrimitiveType::Single,
        EdmPrimitiveType::String,
    ];

    /// Fully qualified name, e.g. `Edm.Int32`
    pub fn full_name(self) -> &'static str {
        match self {
            EdmPrimitiveType::Binary => "Edm.Binary",
            EdmPrimitiveType::Boolean => "Edm.Boolean",
            EdmPrimitiveType::Byte => "Edm.Byte",
            EdmPrimitiveType::DateTime => "Edm.DateTime",
            EdmPrimitiveType::Decimal => "Edm.Decimal",
            EdmPrimitiveType::Double => "Edm.Double",
            EdmPrimitiveType::Guid => "Edm.Guid",
            EdmPrimitiveType::Int16 => "Edm.Int16",
            EdmPrimitiveType::Int32 => "Edm.Int32",
            EdmPrimitiveType::Int64 => "Edm.Int64",
            EdmPrimitiveType::SByte => "Edm.SByte",
            EdmPrimitiveType::Single => "Edm.Single",
            EdmPrimitiveType::String => "Edm.String",
        }
    }

    /// Resolve a type by name. Accepts both `Edm.Int32` and `Int32`.
    pub fn from_name(name: &str) -> Option<Self> {
        let short = name.strip_prefix("Edm.").unwrap_or(name);
        Self::ALL
            .iter()
            .copied()
            .find(|ty| &ty.full_name()[4..] == short)
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            EdmPrimitiveType::Byte
                | EdmPrimitiveType::SByte
                | EdmPrimitiveType::Int16
                | EdmPrimitiveType::Int32
                | EdmPrimitiveType::Int64
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_integral()
            || matches!(
                self,
                EdmPrimitiveType::Single | EdmPrimitiveType::Double | EdmPrimitiveType::Decimal
            )
    }

    /// Whether a value of type `other` may be used where `self` is declared.
    ///
    /// Integral types widen to larger integral types and to every
    /// floating/decimal type; `Single` widens to `Double`. `Decimal` never
    /// accepts a floating type.
    pub fn is_compatible_with(self, other: EdmPrimitiveType) -> bool {
        use EdmPrimitiveType::*;

        if self == other {
            return true;
        }

        match self {
            Int16 => matches!(other, Byte | SByte),
            Int32 => matches!(other, Byte | SByte | Int16),
            Int64 => matches!(other, Byte | SByte | Int16 | Int32),
            Single | Decimal => other.is_integral(),
            Double => other.is_integral() || other == Single,
            _ => false,
        }
    }
}

impl fmt::Display for EdmPrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(
            EdmPrimitiveType::from_name("Edm.Int32"),
            Some(EdmPrimitiveType::Int32)
        );
        assert_eq!(
            EdmPrimitiveType::from_name("Guid"),
            Some(EdmPrimitiveType::Guid)
        );
        assert_eq!(EdmPrimitiveType::from_name("Edm.Money"), None);
    }

    #[test]
    fn test_compatibility() {
        use EdmPrimitiveType::*;

        assert!(Int64.is_compatible_with(Int32));
        assert!(Double.is_compatible_with(Single));
        assert!(Decimal.is_compatible_with(Int64));
        assert!(!Decimal.is_compatible_with(Double));
        assert!(!Int32.is_compatible_with(Int64));
        assert!(!String.is_compatible_with(Int32));
    }

    #[test]
    fn test_serde_uses_full_names() {
        let json = serde_json::to_string(&EdmPrimitiveType::DateTime).unwrap();
        assert_eq!(json, "\"Edm.DateTime\"");
        let ty: EdmPrimitiveType = serde_json::from_str("\"Edm.Single\"").unwrap();
        assert_eq!(ty, EdmPrimitiveType::Single);
    }
}
