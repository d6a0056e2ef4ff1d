//! Key predicates - the parenthesized part of `Customers('ALFKI')`
//!
//! Parsing happens in two steps. `try_parse_keys_from_key_predicate` is purely
//! syntactic and yields literal values with their lexical types. `validate`
//! then checks them against the key properties of a resource type and
//! coerces each value to the declared key type.

use crate::error::{Error, Result};
use crate::lexer::ExpressionLexer;
use crate::literal::parse_literal;
use crate::token::TokenId;
use crate::value::{FieldAccess, Value};
use ferrum_edm::{EdmPrimitiveType, MetadataProvider, ResourceProperty, ResourceType};
use std::fmt;
use std::sync::Arc;

/// A literal value as written in a key predicate
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub text: String,
    pub ty: EdmPrimitiveType,
    pub value: Value,
}

/// Syntactic form of a key predicate
#[derive(Debug, Clone, PartialEq)]
pub enum KeyDescriptor {
    /// `()` - addresses the whole set
    Empty,
    /// `(1, 'a')` - values in key declaration order
    Positional(Vec<KeyValue>),
    /// `(OrderID=1, ProductID=2)` - values by key name
    Named(Vec<(String, KeyValue)>),
}

impl KeyDescriptor {
    /// Parse the text between the parentheses of a segment
    ///
    /// Returns `None` when the text is not a well-formed key predicate.
    pub fn try_parse_keys_from_key_predicate(text: &str) -> Option<KeyDescriptor> {
        if text.trim().is_empty() {
            return Some(KeyDescriptor::Empty);
        }

        let mut lexer = ExpressionLexer::new(text).ok()?;
        let mut positional = Vec::new();
        let mut named: Vec<(String, KeyValue)> = Vec::new();

        loop {
            let token = lexer.current_token().clone();

            if token.id == TokenId::Identifier {
                // Only the named form starts a value with an identifier
                if !positional.is_empty() {
                    return None;
                }
                let equal = lexer.next_token().ok()?;
                if equal.id != TokenId::Equal {
                    return None;
                }
                let literal = lexer.next_token().ok()?;
                let value = key_value(&literal)?;
                if named.iter().any(|(name, _)| *name == token.text) {
                    return None;
                }
                named.push((token.text, value));
            } else {
                if !named.is_empty() {
                    return None;
                }
                positional.push(key_value(&token)?);
            }

            match lexer.next_token().ok()?.id {
                TokenId::Comma => {
                    lexer.next_token().ok()?;
                }
                TokenId::End => break,
                _ => return None,
            }
        }

        if named.is_empty() {
            Some(KeyDescriptor::Positional(positional))
        } else {
            Some(KeyDescriptor::Named(named))
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, KeyDescriptor::Empty)
    }

    pub fn is_named(&self) -> bool {
        matches!(self, KeyDescriptor::Named(_))
    }

    pub fn value_count(&self) -> usize {
        match self {
            KeyDescriptor::Empty => 0,
            KeyDescriptor::Positional(values) => values.len(),
            KeyDescriptor::Named(values) => values.len(),
        }
    }

    /// Check the values against the key of `resource_type` and coerce them
    ///
    /// `label` names the segment in error messages.
    pub fn validate(
        &self,
        label: &str,
        resource_type: &ResourceType,
        metadata: &dyn MetadataProvider,
    ) -> Result<ValidatedKeyDescriptor> {
        let keys = metadata.key_properties(resource_type);

        if self.value_count() != keys.len() {
            return Err(Error::syntax(
                format!(
                    "Syntax error in '{}': expect {} keys but {} provided",
                    label,
                    keys.len(),
                    self.value_count()
                ),
                None,
            ));
        }

        let values = match self {
            KeyDescriptor::Empty => Vec::new(),
            KeyDescriptor::Positional(values) => keys
                .iter()
                .zip(values)
                .enumerate()
                .map(|(i, (key, value))| {
                    let coerced = coerce(key, value).ok_or_else(|| {
                        Error::type_error(
                            format!(
                                "Type mismatch in '{}': the value at position '{}' of the key should be of type '{}', given '{}'",
                                label, i, key_type(key), value.ty
                            ),
                            None,
                        )
                    })?;
                    Ok((key.clone(), coerced))
                })
                .collect::<Result<Vec<_>>>()?,
            KeyDescriptor::Named(values) => keys
                .iter()
                .map(|key| {
                    let (_, value) = values
                        .iter()
                        .find(|(name, _)| **name == *key.name)
                        .ok_or_else(|| unknown_key_names(label, &keys, values))?;
                    let coerced = coerce(key, value).ok_or_else(|| {
                        Error::type_error(
                            format!(
                                "Type mismatch in '{}': the value for the key property '{}' should be of type '{}', given '{}'",
                                label, key.name, key_type(key), value.ty
                            ),
                            None,
                        )
                    })?;
                    Ok((key.clone(), coerced))
                })
                .collect::<Result<Vec<_>>>()?,
        };

        Ok(ValidatedKeyDescriptor { values })
    }
}

fn key_value(token: &crate::token::ExpressionToken) -> Option<KeyValue> {
    if !token.id.is_literal() {
        return None;
    }
    let (ty, value) = parse_literal(token).ok()?;
    Some(KeyValue {
        text: token.text.clone(),
        ty,
        value,
    })
}

fn key_type(key: &ResourceProperty) -> EdmPrimitiveType {
    key.primitive_type().unwrap_or(EdmPrimitiveType::String)
}

/// Declared key type accepts the literal, widening or narrowing in range
fn coerce(key: &ResourceProperty, value: &KeyValue) -> Option<Value> {
    let target = key.primitive_type()?;
    if target.is_compatible_with(value.ty) || (target.is_integral() && value.ty.is_integral()) {
        value.value.convert_to(target)
    } else {
        None
    }
}

fn unknown_key_names(
    label: &str,
    keys: &[Arc<ResourceProperty>],
    values: &[(String, KeyValue)],
) -> Error {
    let expected: Vec<&str> = keys.iter().map(|key| &*key.name).collect();
    let given: Vec<&str> = values.iter().map(|(name, _)| name.as_str()).collect();
    Error::syntax(
        format!(
            "Syntax error in '{}': the key names ({}) do not match the key properties ({})",
            label,
            given.join(", "),
            expected.join(", ")
        ),
        None,
    )
}

/// Key values matched to key properties and coerced to their declared types
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedKeyDescriptor {
    pub values: Vec<(Arc<ResourceProperty>, Value)>,
}

impl ValidatedKeyDescriptor {
    /// Whether `entity` carries exactly these key values
    pub fn matches(&self, entity: &dyn FieldAccess) -> bool {
        self.values
            .iter()
            .all(|(key, value)| entity.get_named_field(&key.name).as_ref() == Some(value))
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(key, _)| &*key.name == name)
            .map(|(_, value)| value)
    }
}

impl fmt::Display for ValidatedKeyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", key.name, value)?;
        }
        Ok(())
    }
}
