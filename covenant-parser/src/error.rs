//! Parser error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token at position {position}: expected {expected}, found {found}")]
    UnexpectedToken {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input: expected {0}")]
    UnexpectedEof(String),

    #[error("Invalid token at position {position}: '{text}'")]
    InvalidToken { position: usize, text: String },

    #[error("Empty expression")]
    EmptyExpression,

    #[error("Maximum parsing depth exceeded: depth {depth} exceeds limit of {max_depth}")]
    MaxDepthExceeded { depth: usize, max_depth: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnexpectedToken,
    UnexpectedEof,
    InvalidToken,
    EmptyExpression,
    MaxDepthExceeded,
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::UnexpectedToken { .. } => ErrorKind::UnexpectedToken,
            ParseError::UnexpectedEof(_) => ErrorKind::UnexpectedEof,
            ParseError::InvalidToken { .. } => ErrorKind::InvalidToken,
            ParseError::EmptyExpression => ErrorKind::EmptyExpression,
            ParseError::MaxDepthExceeded { .. } => ErrorKind::MaxDepthExceeded,
        }
    }

    /// Byte offset of the error in the source, when known
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::UnexpectedToken { position, .. }
            | ParseError::InvalidToken { position, .. } => Some(*position),
            _ => None,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
