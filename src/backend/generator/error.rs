use thiserror::Error;

/// Raised when the generator meets a tree the analyzer has not annotated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("Missing type annotation for {node}")]
    MissingType { node: &'static str },
    #[error("Missing variable binding for '{name}'")]
    MissingVariable { name: String },
    #[error("Missing function binding for '{name}'")]
    MissingFunction { name: String },
}

pub type GenerateResult<T> = Result<T, GeneratorError>;
