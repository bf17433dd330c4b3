use thiserror::Error;

/// A lexical or syntactic error, with the byte offset into the
/// expression source where it was detected.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at offset {position}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}
