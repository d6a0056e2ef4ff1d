//! Error types for OData request interpretation
//!
//! Every failure carries the category the host maps to an HTTP status. Access
//! denials are raised as `Resolution` so callers cannot tell a forbidden set
//! from a missing one.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP-flavored category of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    BadRequest,
    NotFound,
    Internal,
}

impl ErrorStatus {
    pub fn http_code(self) -> u16 {
        match self {
            ErrorStatus::BadRequest => 400,
            ErrorStatus::NotFound => 404,
            ErrorStatus::Internal => 500,
        }
    }
}

/// Request interpretation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid character, unterminated literal or malformed number
    #[error("Lexical error: {message}")]
    Lexical { message: String, position: usize },

    /// Malformed expression or path structure; carries the offending token's position when known
    #[error("Syntax error: {message}")]
    Syntax {
        message: String,
        position: Option<usize>,
    },

    #[error("Type error: {message}")]
    Type {
        message: String,
        position: Option<usize>,
    },

    /// Unknown set, type, property or function
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Segment ordering violations ($count, $value, $links, terminal segments)
    #[error("Structural error: {0}")]
    Structural(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn lexical(message: impl Into<String>, position: usize) -> Self {
        Error::Lexical {
            message: message.into(),
            position,
        }
    }

    pub(crate) fn syntax(message: impl Into<String>, position: impl Into<Option<usize>>) -> Self {
        Error::Syntax {
            message: message.into(),
            position: position.into(),
        }
    }

    pub(crate) fn type_error(
        message: impl Into<String>,
        position: impl Into<Option<usize>>,
    ) -> Self {
        Error::Type {
            message: message.into(),
            position: position.into(),
        }
    }

    pub fn status(&self) -> ErrorStatus {
        match self {
            Error::Lexical { .. }
            | Error::Syntax { .. }
            | Error::Type { .. }
            | Error::Structural(_) => ErrorStatus::BadRequest,
            Error::Resolution(_) => ErrorStatus::NotFound,
            Error::Internal(_) => ErrorStatus::Internal,
        }
    }

    /// The 0-based character position of the offending token, if known
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::Lexical { position, .. } => Some(*position),
            Error::Syntax { position, .. } | Error::Type { position, .. } => *position,
            _ => None,
        }
    }

    /// The user-visible message without the category prefix
    pub fn message(&self) -> &str {
        match self {
            Error::Lexical { message, .. }
            | Error::Syntax { message, .. }
            | Error::Type { message, .. } => message,
            Error::Resolution(message)
            | Error::Structural(message)
            | Error::Internal(message) => message,
        }
    }
}
