//! Expression lexer - tokenizes `$filter`, `$orderby` and key predicate text
//!
//! Keeps exactly one token of state: the current token. `next_token` advances,
//! `peek_next_token` looks one token ahead without advancing. Once the end of
//! input is reached every further request returns the same `End` token.
//!
//! Numeric literal kinds are decided by suffix and shape:
//! - `12` Int32, `12L` Int64
//! - `1.5`, `1E3`, `1.5D` Double, `1.5F` Single, `1.5M` Decimal
//! - `INF`, `NaN` Double; `INFF`, `NaNF` Single
//!
//! A `-` directly in front of a number (or `INF`/`INFF`) is folded into the
//! literal unless it follows an operand, in which case it is a `Minus` token.

use crate::error::{Error, Result};
use crate::token::{ExpressionToken, TokenId};

/// The expression lexer
#[derive(Debug, Clone)]
pub struct ExpressionLexer {
    chars: Vec<char>,
    position: usize,
    current_char: Option<char>,
    token: ExpressionToken,
}

impl ExpressionLexer {
    /// Create a lexer and read the first token
    pub fn new(text: &str) -> Result<Self> {
        let chars: Vec<char> = text.chars().collect();
        let current_char = chars.first().copied();
        let mut lexer = Self {
            chars,
            position: 0,
            current_char,
            token: ExpressionToken::end(0),
        };
        lexer.token = lexer.read_token()?;
        Ok(lexer)
    }

    pub fn current_token(&self) -> &ExpressionToken {
        &self.token
    }

    /// Advance and return the new current token
    pub fn next_token(&mut self) -> Result<ExpressionToken> {
        if self.token.id != TokenId::End {
            self.token = self.read_token()?;
        }
        Ok(self.token.clone())
    }

    /// The token after the current one, without advancing
    pub fn peek_next_token(&mut self) -> Result<ExpressionToken> {
        if self.token.id == TokenId::End {
            return Ok(self.token.clone());
        }

        let saved_position = self.position;
        let result = self.read_token();
        self.set_position(saved_position);
        result
    }

    /// Fail unless the current token has the given kind
    pub fn validate_token(&self, expected: TokenId) -> Result<()> {
        if self.token.id != expected {
            return Err(Error::syntax(
                format!("Syntax error at position {}", self.token.position),
                self.token.position,
            ));
        }
        Ok(())
    }

    fn advance(&mut self) {
        self.set_position(self.position + 1);
    }

    fn set_position(&mut self, position: usize) {
        self.position = position;
        self.current_char = self.chars.get(position).copied();
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current_char, Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn text_from(&self, start: usize) -> String {
        self.chars[start..self.position].iter().collect()
    }

    fn read_token(&mut self) -> Result<ExpressionToken> {
        self.skip_whitespace();

        let position = self.position;
        let Some(c) = self.current_char else {
            return Ok(ExpressionToken::end(position));
        };

        let id = match c {
            '(' => self.single(TokenId::OpenParen),
            ')' => self.single(TokenId::CloseParen),
            ',' => self.single(TokenId::Comma),
            '/' => self.single(TokenId::Slash),
            '=' => self.single(TokenId::Equal),
            '-' => self.read_minus(position)?,
            '\'' => {
                self.read_quoted(position)?;
                TokenId::StringLiteral
            }
            c if c.is_ascii_digit() => self.read_number(position)?,
            c if c.is_ascii_alphabetic() || c == '_' => self.read_identifier_or_keyword()?,
            c => {
                return Err(Error::lexical(
                    format!("Invalid character '{}' at position {}", c, position),
                    position,
                ))
            }
        };

        Ok(ExpressionToken::new(id, self.text_from(position), position))
    }

    fn single(&mut self, id: TokenId) -> TokenId {
        self.advance();
        id
    }

    /// `-` is a sign when it does not follow an operand
    fn read_minus(&mut self, start: usize) -> Result<TokenId> {
        if !self.token.ends_operand() {
            match self.peek() {
                Some(c) if c.is_ascii_digit() => {
                    self.advance();
                    return self.read_number(start);
                }
                Some('I') => {
                    self.advance();
                    let ident = self.read_identifier();
                    match ident.as_str() {
                        "INF" => return Ok(TokenId::DoubleLiteral),
                        "INFF" | "INFf" => return Ok(TokenId::SingleLiteral),
                        _ => self.set_position(start),
                    }
                }
                _ => {}
            }
        }

        self.advance();
        Ok(TokenId::Minus)
    }

    fn read_digits(&mut self) {
        while matches!(self.current_char, Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn validate_digit(&self) -> Result<()> {
        match self.current_char {
            Some(c) if c.is_ascii_digit() => Ok(()),
            _ => Err(Error::lexical(
                format!("Digit expected at position {}", self.position),
                self.position,
            )),
        }
    }

    /// Read a numeric literal starting at a digit
    fn read_number(&mut self, start: usize) -> Result<TokenId> {
        let mut id = TokenId::IntegerLiteral;
        let mut fractional = false;

        self.read_digits();

        if self.current_char == Some('.') {
            id = TokenId::DoubleLiteral;
            fractional = true;
            self.advance();
            self.validate_digit()?;
            self.read_digits();
        }

        if matches!(self.current_char, Some('E') | Some('e')) {
            id = TokenId::DoubleLiteral;
            fractional = true;
            self.advance();
            if matches!(self.current_char, Some('+') | Some('-')) {
                self.advance();
            }
            self.validate_digit()?;
            self.read_digits();
        }

        let id = match self.current_char {
            Some('M') | Some('m') => self.single(TokenId::DecimalLiteral),
            Some('D') | Some('d') => self.single(TokenId::DoubleLiteral),
            Some('F') | Some('f') => self.single(TokenId::SingleLiteral),
            Some('L') if fractional => {
                return Err(Error::lexical(
                    format!(
                        "Invalid Int64 literal '{}L' at position {}",
                        self.text_from(start),
                        start
                    ),
                    start,
                ))
            }
            Some('L') => self.single(TokenId::Int64Literal),
            _ => id,
        };

        Ok(id)
    }

    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while matches!(self.current_char, Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }
        self.text_from(start)
    }

    fn read_identifier_or_keyword(&mut self) -> Result<TokenId> {
        let ident = self.read_identifier();

        let id = match ident.as_str() {
            "true" | "false" => TokenId::BooleanLiteral,
            "INF" | "NaN" => TokenId::DoubleLiteral,
            "INFF" | "INFf" | "NaNF" | "NaNf" => TokenId::SingleLiteral,
            "datetime" | "guid" | "binary" | "X" | "x" if self.current_char == Some('\'') => {
                let quote = self.position;
                self.read_quoted(quote)?;
                match ident.as_str() {
                    "datetime" => TokenId::DateTimeLiteral,
                    "guid" => TokenId::GuidLiteral,
                    _ => TokenId::BinaryLiteral,
                }
            }
            _ => TokenId::Identifier,
        };

        Ok(id)
    }

    /// Read a single-quoted run starting at the opening quote. `''` is an
    /// escaped quote.
    fn read_quoted(&mut self, quote: usize) -> Result<()> {
        loop {
            self.advance();
            while matches!(self.current_char, Some(c) if c != '\'') {
                self.advance();
            }
            if self.current_char.is_none() {
                return Err(Error::lexical(
                    format!("Unterminated string literal at position {}", quote + 1),
                    quote + 1,
                ));
            }
            self.advance();
            if self.current_char != Some('\'') {
                return Ok(());
            }
        }
    }
}
