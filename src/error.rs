//! Error types shared across the parser, the algebra and the conversion
//! engine.

use thiserror::Error;

/// Every failure the crate can surface.
///
/// The algebra only ever produces [`Error::DivisionByZero`]; the parser
/// produces [`Error::Parse`]; targeted conversion produces [`Error::NoPath`]
/// (simplification absorbs it); the fact-file loader produces
/// [`Error::MalformedFact`] and [`Error::Io`].
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed expression. `column` is the zero-based byte offset of the
    /// offending token in the input.
    #[error("parse error at column {column}: {message}")]
    Parse { message: String, column: usize },

    /// Division by a quantity whose value is zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Targeted conversion found no edge sequence between the two shapes.
    #[error("no conversion path from `{from}` to `{to}`")]
    NoPath { from: String, to: String },

    /// A conversion-fact line could not be turned into two unit literals
    /// plus a real factor.
    #[error("malformed conversion fact at line {line}: {reason}")]
    MalformedFact { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn parse(message: impl Into<String>, column: usize) -> Self {
        Error::Parse {
            message: message.into(),
            column,
        }
    }

    pub(crate) fn malformed_fact(line: usize, reason: impl Into<String>) -> Self {
        Error::MalformedFact {
            line,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
