//! Token types for the expression lexer
//!
//! OData operators (`eq`, `and`, `add`, ...) are plain identifiers at the
//! lexical level; the parser recognizes them by text.

use crate::error::{Error, Result};

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenId {
    Identifier,

    // Literals
    StringLiteral,
    IntegerLiteral,
    Int64Literal,
    SingleLiteral,
    DoubleLiteral,
    DecimalLiteral,
    DateTimeLiteral,
    GuidLiteral,
    BinaryLiteral,
    BooleanLiteral,

    // Punctuation
    OpenParen,  // (
    CloseParen, // )
    Comma,      // ,
    Slash,      // /
    Minus,      // -
    Equal,      // = (key predicates only)

    End,
}

impl TokenId {
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenId::StringLiteral
                | TokenId::IntegerLiteral
                | TokenId::Int64Literal
                | TokenId::SingleLiteral
                | TokenId::DoubleLiteral
                | TokenId::DecimalLiteral
                | TokenId::DateTimeLiteral
                | TokenId::GuidLiteral
                | TokenId::BinaryLiteral
                | TokenId::BooleanLiteral
        )
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            TokenId::IntegerLiteral
                | TokenId::Int64Literal
                | TokenId::SingleLiteral
                | TokenId::DoubleLiteral
                | TokenId::DecimalLiteral
        )
    }
}

const COMPARISON_OPERATORS: [&str; 6] = ["eq", "ne", "gt", "ge", "lt", "le"];
const ADDITIVE_OPERATORS: [&str; 2] = ["add", "sub"];
const MULTIPLICATIVE_OPERATORS: [&str; 3] = ["mul", "div", "mod"];

/// A token produced by the expression lexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionToken {
    pub id: TokenId,
    /// Exact source text, including quotes, prefixes and suffixes
    pub text: String,
    pub position: usize,
}

impl ExpressionToken {
    pub fn new(id: TokenId, text: impl Into<String>, position: usize) -> Self {
        Self {
            id,
            text: text.into(),
            position,
        }
    }

    pub fn end(position: usize) -> Self {
        Self {
            id: TokenId::End,
            text: String::new(),
            position,
        }
    }

    /// Whether this is the identifier `text`
    pub fn identifier_is(&self, text: &str) -> bool {
        self.id == TokenId::Identifier && self.text == text
    }

    pub fn is_comparison_operator(&self) -> bool {
        self.id == TokenId::Identifier && COMPARISON_OPERATORS.contains(&self.text.as_str())
    }

    pub fn is_equality_operator(&self) -> bool {
        self.identifier_is("eq") || self.identifier_is("ne")
    }

    pub fn is_additive_operator(&self) -> bool {
        self.id == TokenId::Identifier && ADDITIVE_OPERATORS.contains(&self.text.as_str())
    }

    pub fn is_multiplicative_operator(&self) -> bool {
        self.id == TokenId::Identifier && MULTIPLICATIVE_OPERATORS.contains(&self.text.as_str())
    }

    /// Operator keywords never end an operand
    pub fn is_operator_keyword(&self) -> bool {
        self.is_comparison_operator()
            || self.is_additive_operator()
            || self.is_multiplicative_operator()
            || self.identifier_is("and")
            || self.identifier_is("or")
            || self.identifier_is("not")
    }

    /// Whether a `-` following this token is a binary minus rather than a sign
    pub(crate) fn ends_operand(&self) -> bool {
        match self.id {
            TokenId::Identifier => !self.is_operator_keyword(),
            TokenId::CloseParen => true,
            id => id.is_literal(),
        }
    }

    pub fn identifier(&self) -> Result<&str> {
        if self.id != TokenId::Identifier {
            return Err(Error::syntax(
                format!("Identifier expected at position {}", self.position),
                self.position,
            ));
        }
        Ok(&self.text)
    }
}
