use thiserror::Error;

use crate::ast::BinaryOperator;
use crate::environment::{DefinitionError, Type};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("Unknown type '{name}'")]
    UnknownType { name: String },
    #[error("Invalid assignment: attempting to assign {actual} to a {target} variable")]
    NotAssignable { target: Type, actual: Type },
    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String },
    #[error("Undefined function '{name}' with {arity} arguments")]
    UndefinedFunction { name: String, arity: usize },
    #[error(transparent)]
    Redefinition(#[from] DefinitionError),
    #[error("Variable '{name}' needs a type or an initial value")]
    MissingType { name: String },
    #[error("Program must define a function main() with no parameters")]
    MissingMain,
    #[error("Function main() must return Integer, found {found}")]
    MainReturnType { found: Type },
    #[error("Expression statements must be function calls")]
    ExpressionStatement,
    #[error("{construct} condition must be Boolean, found {found}")]
    ConditionType {
        construct: &'static str,
        found: Type,
    },
    #[error("IF statement must have at least one statement in its then block")]
    EmptyIfBlock,
    #[error("CASE value must match the SWITCH condition type {expected}, found {found}")]
    CaseType { expected: Type, found: Type },
    #[error("DEFAULT must be the last arm of a SWITCH")]
    DefaultNotLast,
    #[error("Only variable or list element access can be assigned")]
    InvalidAssignmentTarget,
    #[error("Cannot assign to immutable variable '{name}'")]
    ImmutableAssignment { name: String },
    #[error("RETURN outside of a function")]
    ReturnOutsideFunction,
    #[error("Integer literal {value} is outside the 32-bit signed range")]
    IntegerOutOfRange { value: String },
    #[error("Decimal literal {value} is not a finite double")]
    DecimalOutOfRange { value: String },
    #[error("Grouped expression must be a binary expression")]
    GroupNotBinary,
    #[error("Operator '{operator}' cannot be applied to {left} and {right}")]
    InvalidOperands {
        operator: BinaryOperator,
        left: Type,
        right: Type,
    },
    #[error("List offset must be Integer, found {found}")]
    OffsetType { found: Type },
}

pub type AnalyzeResult<T> = Result<T, SemanticError>;
