//! Function catalog for `$filter` / `$orderby` expressions
//!
//! Maps canonical OData function names to their overloads using a
//! compile-time perfect hash map (phf). Overloads are tried in declaration
//! order; the first one whose arity matches and whose parameters accept the
//! argument types wins.
//!
//! The internal functions (`compare`, `guidEqual`, `binaryEqual`, `isNull`)
//! are produced by the parser when lowering operators and are not reachable
//! by name.

use ferrum_edm::EdmPrimitiveType::{self, *};
use phf::phf_map;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionId {
    SubstringOf,
    EndsWith,
    StartsWith,
    Length,
    IndexOf,
    Replace,
    Substring,
    ToLower,
    ToUpper,
    Trim,
    Concat,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Round,
    Floor,
    Ceiling,

    // Internal
    Compare,
    GuidEqual,
    BinaryEqual,
    IsNull,
}

/// One overload of a function
#[derive(Debug, PartialEq, Eq)]
pub struct FunctionSignature {
    pub id: FunctionId,
    pub name: &'static str,
    pub params: &'static [EdmPrimitiveType],
    pub return_type: EdmPrimitiveType,
}

impl FunctionSignature {
    pub fn is_internal(&self) -> bool {
        matches!(
            self.id,
            FunctionId::Compare | FunctionId::GuidEqual | FunctionId::BinaryEqual | FunctionId::IsNull
        )
    }

    /// Whether the overload takes arguments of the given types
    pub fn accepts(&self, args: &[EdmPrimitiveType]) -> bool {
        self.params.len() == args.len()
            && self
                .params
                .iter()
                .zip(args)
                .all(|(param, arg)| param.is_compatible_with(*arg))
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.params.iter().map(|p| p.full_name()).collect();
        write!(f, "{}({})", self.name, params.join(", "))
    }
}

macro_rules! signature {
    ($id:ident, $name:literal, [$($param:ident),*], $ret:ident) => {
        FunctionSignature {
            id: FunctionId::$id,
            name: $name,
            params: &[$($param),*],
            return_type: $ret,
        }
    };
}

const SUBSTRINGOF: &[FunctionSignature] = &[signature!(SubstringOf, "substringof", [String, String], Boolean)];
const ENDSWITH: &[FunctionSignature] = &[signature!(EndsWith, "endswith", [String, String], Boolean)];
const STARTSWITH: &[FunctionSignature] = &[signature!(StartsWith, "startswith", [String, String], Boolean)];
const LENGTH: &[FunctionSignature] = &[signature!(Length, "length", [String], Int32)];
const INDEXOF: &[FunctionSignature] = &[signature!(IndexOf, "indexof", [String, String], Int32)];
const REPLACE: &[FunctionSignature] = &[signature!(Replace, "replace", [String, String, String], String)];
const SUBSTRING: &[FunctionSignature] = &[
    signature!(Substring, "substring", [String, Int32], String),
    signature!(Substring, "substring", [String, Int32, Int32], String),
];
const TOLOWER: &[FunctionSignature] = &[signature!(ToLower, "tolower", [String], String)];
const TOUPPER: &[FunctionSignature] = &[signature!(ToUpper, "toupper", [String], String)];
const TRIM: &[FunctionSignature] = &[signature!(Trim, "trim", [String], String)];
const CONCAT: &[FunctionSignature] = &[signature!(Concat, "concat", [String, String], String)];
const YEAR: &[FunctionSignature] = &[signature!(Year, "year", [DateTime], Int32)];
const MONTH: &[FunctionSignature] = &[signature!(Month, "month", [DateTime], Int32)];
const DAY: &[FunctionSignature] = &[signature!(Day, "day", [DateTime], Int32)];
const HOUR: &[FunctionSignature] = &[signature!(Hour, "hour", [DateTime], Int32)];
const MINUTE: &[FunctionSignature] = &[signature!(Minute, "minute", [DateTime], Int32)];
const SECOND: &[FunctionSignature] = &[signature!(Second, "second", [DateTime], Int32)];
const ROUND: &[FunctionSignature] = &[
    signature!(Round, "round", [Double], Double),
    signature!(Round, "round", [Decimal], Decimal),
];
const FLOOR: &[FunctionSignature] = &[
    signature!(Floor, "floor", [Double], Double),
    signature!(Floor, "floor", [Decimal], Decimal),
];
const CEILING: &[FunctionSignature] = &[
    signature!(Ceiling, "ceiling", [Double], Double),
    signature!(Ceiling, "ceiling", [Decimal], Decimal),
];

/// Static compile-time function catalog
static FUNCTIONS_BY_NAME: phf::Map<&'static str, &'static [FunctionSignature]> = phf_map! {
    // String functions
    "substringof" => SUBSTRINGOF,
    "endswith" => ENDSWITH,
    "startswith" => STARTSWITH,
    "length" => LENGTH,
    "indexof" => INDEXOF,
    "replace" => REPLACE,
    "substring" => SUBSTRING,
    "tolower" => TOLOWER,
    "toupper" => TOUPPER,
    "trim" => TRIM,
    "concat" => CONCAT,

    // Date functions
    "year" => YEAR,
    "month" => MONTH,
    "day" => DAY,
    "hour" => HOUR,
    "minute" => MINUTE,
    "second" => SECOND,

    // Math functions
    "round" => ROUND,
    "floor" => FLOOR,
    "ceiling" => CEILING,
};

pub static COMPARE_STRING: FunctionSignature = signature!(Compare, "compare", [String, String], Int32);
pub static COMPARE_DATETIME: FunctionSignature =
    signature!(Compare, "compare", [DateTime, DateTime], Int32);
pub static GUID_EQUAL: FunctionSignature = signature!(GuidEqual, "guidEqual", [Guid, Guid], Boolean);
pub static BINARY_EQUAL: FunctionSignature =
    signature!(BinaryEqual, "binaryEqual", [Binary, Binary], Boolean);
/// Takes one argument of any type
pub static IS_NULL: FunctionSignature = signature!(IsNull, "isNull", [], Boolean);

/// All overloads of a canonical function
pub fn lookup(name: &str) -> Option<&'static [FunctionSignature]> {
    FUNCTIONS_BY_NAME.get(name).copied()
}

/// First overload accepting the argument types
pub fn resolve_overload(
    overloads: &'static [FunctionSignature],
    args: &[EdmPrimitiveType],
) -> Option<&'static FunctionSignature> {
    overloads.iter().find(|signature| signature.accepts(args))
}

/// Names of every canonical function
pub fn function_names() -> impl Iterator<Item = &'static str> {
    FUNCTIONS_BY_NAME.keys().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_overloads() {
        let substring = lookup("substring").unwrap();
        assert_eq!(substring.len(), 2);

        let chosen = resolve_overload(substring, &[String, Int32, Int32]).unwrap();
        assert_eq!(chosen.params.len(), 3);
        assert!(resolve_overload(substring, &[String]).is_none());
        assert!(lookup("compare").is_none());
    }

    #[test]
    fn test_first_applicable_overload_wins() {
        let round = lookup("round").unwrap();
        assert_eq!(resolve_overload(round, &[Int32]).unwrap().return_type, Double);
        assert_eq!(resolve_overload(round, &[Decimal]).unwrap().return_type, Decimal);
        assert_eq!(resolve_overload(round, &[Single]).unwrap().return_type, Double);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            SUBSTRING[1].to_string(),
            "substring(Edm.String, Edm.Int32, Edm.Int32)"
        );
        assert!(IS_NULL.is_internal());
        assert_eq!(function_names().count(), 20);
    }
}
