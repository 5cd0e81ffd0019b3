use thiserror::Error;

use crate::ast::BinaryOperator;
use crate::environment::DefinitionError;

/// Typed errors produced by the tree-walking interpreter backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String },
    #[error("Undefined function '{name}' with {arity} arguments")]
    UndefinedFunction { name: String, arity: usize },
    #[error(transparent)]
    Redefinition(#[from] DefinitionError),
    #[error("Unknown type '{name}'")]
    UnknownType { name: String },
    #[error("Cannot assign to immutable variable '{name}'")]
    ImmutableAssignment { name: String },
    #[error("Only variable or list element access can be assigned")]
    InvalidAssignmentTarget,
    #[error("Operator '{operator}' cannot be applied to {left} and {right}")]
    InvalidOperands {
        operator: BinaryOperator,
        left: &'static str,
        right: &'static str,
    },
    #[error("Expected Boolean, found {found}")]
    ExpectedBoolean { found: &'static str },
    #[error("List offset must be Integer, found {found}")]
    ExpectedInteger { found: &'static str },
    #[error("Variable '{name}' does not hold a list")]
    ExpectedList { name: String },
    #[error("List index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: String, len: usize },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Exponent must be a non-negative 32-bit Integer, found {exponent}")]
    InvalidExponent { exponent: String },
    #[error("Function '{name}' expected {expected} arguments, got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Function '{name}' has no implementation")]
    UnboundFunction { name: String },
    #[error("Function '{name}' failed: {message}")]
    Native { name: String, message: String },
    #[error("Return outside of function")]
    ReturnOutsideFunction,
    #[error("Failed to write program output: {message}")]
    Output { message: String },
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
