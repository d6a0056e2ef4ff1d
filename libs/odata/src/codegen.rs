//! Target-language rendering of expression nodes
//!
//! `ExpressionCompiler` walks the tree and hands already-rendered children to
//! an `ExpressionProvider`, which decides the concrete syntax. The default
//! `TextExpressionProvider` emits PHP-style predicate source operating on the
//! entity bound to the iterator variable (`$lt` unless configured otherwise).

use crate::ast::{
    ArithmeticOp, ConstantExpression, LogicalOp, PropertyAccessExpression, RelationalOp, UnaryOp,
};
use crate::functions::{FunctionId, FunctionSignature};
use crate::value::{format_float, Value};
use ferrum_edm::EdmPrimitiveType;

/// Renders individual expression nodes in some target syntax
pub trait ExpressionProvider {
    /// Variable holding the entity under test
    fn iterator_name(&self) -> &str;

    fn on_logical(&self, op: LogicalOp, left: &str, right: &str) -> String;

    fn on_arithmetic(&self, op: ArithmeticOp, left: &str, right: &str) -> String;

    fn on_relational(&self, op: RelationalOp, left: &str, right: &str) -> String;

    fn on_unary(&self, op: UnaryOp, child: &str) -> String;

    fn on_constant(&self, constant: &ConstantExpression) -> String;

    fn on_property_access(&self, access: &PropertyAccessExpression) -> String;

    fn on_function_call(&self, function: &FunctionSignature, args: &[String]) -> String;

    /// Check that the value reached by `access` is present
    fn on_not_null(&self, access: &PropertyAccessExpression) -> String;
}

/// PHP-flavored source text
#[derive(Debug, Clone)]
pub struct TextExpressionProvider {
    iterator_name: String,
}

impl TextExpressionProvider {
    pub fn new(iterator_name: impl Into<String>) -> Self {
        Self {
            iterator_name: iterator_name.into(),
        }
    }
}

impl Default for TextExpressionProvider {
    fn default() -> Self {
        Self::new("$lt")
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn float_literal(value: f64) -> String {
    if value.is_nan() {
        "NAN".to_string()
    } else {
        format_float(value)
    }
}

impl ExpressionProvider for TextExpressionProvider {
    fn iterator_name(&self) -> &str {
        &self.iterator_name
    }

    fn on_logical(&self, op: LogicalOp, left: &str, right: &str) -> String {
        let symbol = match op {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        };
        format!("({} {} {})", left, symbol, right)
    }

    fn on_arithmetic(&self, op: ArithmeticOp, left: &str, right: &str) -> String {
        let symbol = match op {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "/",
            ArithmeticOp::Mod => "%",
        };
        format!("({} {} {})", left, symbol, right)
    }

    fn on_relational(&self, op: RelationalOp, left: &str, right: &str) -> String {
        let symbol = match op {
            RelationalOp::Eq => "==",
            RelationalOp::Ne => "!=",
            RelationalOp::Gt => ">",
            RelationalOp::Ge => ">=",
            RelationalOp::Lt => "<",
            RelationalOp::Le => "<=",
        };
        format!("({} {} {})", left, symbol, right)
    }

    fn on_unary(&self, op: UnaryOp, child: &str) -> String {
        match op {
            UnaryOp::Not => format!("!({})", child),
            UnaryOp::Negate => format!("-({})", child),
        }
    }

    fn on_constant(&self, constant: &ConstantExpression) -> String {
        match &constant.value {
            Value::Null => "null".to_string(),
            Value::Boolean(v) => v.to_string(),
            Value::Byte(v) => v.to_string(),
            Value::SByte(v) => v.to_string(),
            Value::Int16(v) => v.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::Single(v) => float_literal(f64::from(*v)),
            Value::Double(v) => float_literal(*v),
            Value::Decimal(v) => v.to_string(),
            Value::String(v) => quote(v),
            Value::DateTime(v) => quote(&v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Value::Guid(v) => quote(&v.to_string()),
            Value::Binary(v) => quote(&hex::encode_upper(v)),
        }
    }

    fn on_property_access(&self, access: &PropertyAccessExpression) -> String {
        let mut code = self.iterator_name.clone();
        for name in access.path() {
            code.push_str("->");
            code.push_str(name);
        }
        code
    }

    fn on_function_call(&self, function: &FunctionSignature, args: &[String]) -> String {
        let arg = |i: usize| args.get(i).map(String::as_str).unwrap_or_default();

        match function.id {
            FunctionId::SubstringOf => format!("(strpos({}, {}) !== false)", arg(1), arg(0)),
            FunctionId::StartsWith => format!("(strpos({}, {}) === 0)", arg(0), arg(1)),
            FunctionId::EndsWith => format!(
                "(strcmp(substr({0}, strlen({0}) - strlen({1})), {1}) === 0)",
                arg(0),
                arg(1)
            ),
            FunctionId::Length => format!("strlen({})", arg(0)),
            FunctionId::IndexOf => format!("strpos({}, {})", arg(0), arg(1)),
            FunctionId::Replace => {
                format!("str_replace({}, {}, {})", arg(1), arg(2), arg(0))
            }
            FunctionId::Substring => format!("substr({})", args.join(", ")),
            FunctionId::ToLower => format!("strtolower({})", arg(0)),
            FunctionId::ToUpper => format!("strtoupper({})", arg(0)),
            FunctionId::Trim => format!("trim({})", arg(0)),
            FunctionId::Concat => format!("({} . {})", arg(0), arg(1)),
            FunctionId::Year => format!("date('Y', strtotime({}))", arg(0)),
            FunctionId::Month => format!("date('m', strtotime({}))", arg(0)),
            FunctionId::Day => format!("date('d', strtotime({}))", arg(0)),
            FunctionId::Hour => format!("date('H', strtotime({}))", arg(0)),
            FunctionId::Minute => format!("date('i', strtotime({}))", arg(0)),
            FunctionId::Second => format!("date('s', strtotime({}))", arg(0)),
            FunctionId::Round => format!("round({})", arg(0)),
            FunctionId::Floor => format!("floor({})", arg(0)),
            FunctionId::Ceiling => format!("ceil({})", arg(0)),
            FunctionId::Compare if function.params.first() == Some(&EdmPrimitiveType::DateTime) => {
                format!("compareDateTime({}, {})", arg(0), arg(1))
            }
            FunctionId::Compare => format!("strcmp({}, {})", arg(0), arg(1)),
            FunctionId::GuidEqual => format!("guidEqual({}, {})", arg(0), arg(1)),
            FunctionId::BinaryEqual => format!("binaryEqual({}, {})", arg(0), arg(1)),
            FunctionId::IsNull => format!("is_null({})", arg(0)),
        }
    }

    fn on_not_null(&self, access: &PropertyAccessExpression) -> String {
        format!("({} != null)", self.on_property_access(access))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{lookup, COMPARE_DATETIME, COMPARE_STRING};

    #[test]
    fn test_string_constants_are_escaped() {
        let provider = TextExpressionProvider::default();
        let constant = ConstantExpression {
            ty: EdmPrimitiveType::String,
            text: "'O''Neil'".to_string(),
            value: Value::String("O'Neil".to_string()),
        };
        assert_eq!(provider.on_constant(&constant), "'O\\'Neil'");
    }

    #[test]
    fn test_function_mapping() {
        let provider = TextExpressionProvider::default();
        let args = vec!["'ab'".to_string(), "$lt->Name".to_string()];
        let substringof = &lookup("substringof").unwrap()[0];
        assert_eq!(
            provider.on_function_call(substringof, &args),
            "(strpos($lt->Name, 'ab') !== false)"
        );
        assert_eq!(
            provider.on_function_call(&COMPARE_STRING, &args),
            "strcmp('ab', $lt->Name)"
        );
        assert_eq!(
            provider.on_function_call(&COMPARE_DATETIME, &args),
            "compareDateTime('ab', $lt->Name)"
        );
    }

    #[test]
    fn test_float_literals() {
        assert_eq!(float_literal(2.5), "2.5");
        assert_eq!(float_literal(f64::NAN), "NAN");
        assert_eq!(float_literal(f64::INFINITY), "INF");
    }
}
