use thiserror::Error;

/// Grammar failure located at a character offset in the source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message} at index {index}")]
pub struct ParseError {
    pub message: String,
    pub index: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, index: usize) -> Self {
        Self {
            message: message.into(),
            index,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
