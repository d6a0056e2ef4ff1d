//! Conversion of literal tokens to typed values

use crate::error::{Error, Result};
use crate::token::{ExpressionToken, TokenId};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use ferrum_edm::EdmPrimitiveType;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse a literal token into its EDM type and value
pub fn parse_literal(token: &ExpressionToken) -> Result<(EdmPrimitiveType, Value)> {
    let text = token.text.as_str();

    let (ty, value) = match token.id {
        TokenId::BooleanLiteral => (EdmPrimitiveType::Boolean, Some(Value::Boolean(text == "true"))),
        TokenId::StringLiteral => (EdmPrimitiveType::String, unquote(text).map(Value::String)),
        TokenId::IntegerLiteral => (
            EdmPrimitiveType::Int32,
            text.parse::<i32>().ok().map(Value::Int32),
        ),
        TokenId::Int64Literal => (
            EdmPrimitiveType::Int64,
            text.strip_suffix('L')
                .and_then(|body| body.parse::<i64>().ok())
                .map(Value::Int64),
        ),
        TokenId::SingleLiteral => (
            EdmPrimitiveType::Single,
            parse_single(strip_suffix(text, 'F')).map(Value::Single),
        ),
        TokenId::DoubleLiteral => (
            EdmPrimitiveType::Double,
            parse_float(strip_suffix(text, 'D')).map(Value::Double),
        ),
        TokenId::DecimalLiteral => (
            EdmPrimitiveType::Decimal,
            parse_decimal(strip_suffix(text, 'M')).map(Value::Decimal),
        ),
        TokenId::DateTimeLiteral => (
            EdmPrimitiveType::DateTime,
            quoted_body(text, "datetime")
                .and_then(parse_datetime)
                .map(Value::DateTime),
        ),
        TokenId::GuidLiteral => (
            EdmPrimitiveType::Guid,
            quoted_body(text, "guid")
                .and_then(|body| Uuid::parse_str(body).ok())
                .map(Value::Guid),
        ),
        TokenId::BinaryLiteral => (
            EdmPrimitiveType::Binary,
            quoted_body(text, "binary")
                .or_else(|| quoted_body(text, "X"))
                .or_else(|| quoted_body(text, "x"))
                .and_then(|body| hex::decode(body).ok())
                .map(Value::Binary),
        ),
        _ => {
            return Err(Error::syntax(
                format!("Literal expected at position {}", token.position),
                token.position,
            ))
        }
    };

    value.map(|value| (ty, value)).ok_or_else(|| {
        Error::syntax(
            format!(
                "Unrecognized '{}' literal '{}' at position {}",
                ty, text, token.position
            ),
            token.position,
        )
    })
}

/// Strip a type suffix in either case
fn strip_suffix(text: &str, suffix: char) -> &str {
    text.strip_suffix(suffix)
        .or_else(|| text.strip_suffix(suffix.to_ascii_lowercase()))
        .unwrap_or(text)
}

fn unquote(text: &str) -> Option<String> {
    let body = text.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(body.replace("''", "'"))
}

fn quoted_body<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    text.strip_prefix(prefix)?
        .strip_prefix('\'')?
        .strip_suffix('\'')
}

fn parse_float(body: &str) -> Option<f64> {
    match body {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => body.parse::<f64>().ok(),
    }
}

fn parse_single(body: &str) -> Option<f32> {
    match body {
        "INF" => Some(f32::INFINITY),
        "-INF" => Some(f32::NEG_INFINITY),
        "NaN" => Some(f32::NAN),
        _ => body.parse::<f32>().ok(),
    }
}

fn parse_decimal(body: &str) -> Option<Decimal> {
    if body.contains(['e', 'E']) {
        Decimal::from_scientific(&body.to_ascii_lowercase()).ok()
    } else {
        Decimal::from_str(body).ok()
    }
}

fn parse_datetime(body: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(body, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(body)
                .ok()
                .map(|dt| dt.naive_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(body, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
