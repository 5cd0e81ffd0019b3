use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Invalid character literal at index {index}")]
    InvalidCharacter { index: usize },
    #[error("Unterminated character literal at index {index}")]
    UnterminatedCharacter { index: usize },
    #[error("Unterminated string literal at index {index}")]
    UnterminatedString { index: usize },
    #[error("Invalid escape sequence at index {index}")]
    InvalidEscape { index: usize },
    #[error("Unexpected character '{character}' at index {index}")]
    UnexpectedCharacter { character: char, index: usize },
}

impl LexError {
    pub fn index(&self) -> usize {
        match self {
            LexError::InvalidCharacter { index }
            | LexError::UnterminatedCharacter { index }
            | LexError::UnterminatedString { index }
            | LexError::InvalidEscape { index }
            | LexError::UnexpectedCharacter { index, .. } => *index,
        }
    }
}

pub type LexResult<T> = Result<T, LexError>;
