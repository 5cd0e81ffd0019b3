//! Binding and type universe shared by the analyzer and the interpreter.

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::ast;

mod object;
mod scope;
mod types;

pub use object::{ListRef, PlcObject, Value};
pub use scope::{Frame, ScopeId, Scopes};
pub use types::Type;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("Variable '{name}' is already defined in this scope")]
    Variable { name: String },
    #[error("Function '{name}/{arity}' is already defined in this scope")]
    Function { name: String, arity: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub host_name: String,
    pub ty: Type,
    pub mutable: bool,
    pub value: PlcObject,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: Type, mutable: bool, value: PlcObject) -> Self {
        let name = name.into();
        Self {
            host_name: name.clone(),
            name,
            ty,
            mutable,
            value,
        }
    }
}

pub type NativeFn = Rc<dyn Fn(Vec<PlcObject>) -> Result<PlcObject, String>>;

/// How a function is executed once its arguments are evaluated.
#[derive(Clone)]
pub enum Callable {
    /// Writes its single argument followed by a newline to the program output.
    Print,
    Native(NativeFn),
    Declared {
        declaration: Rc<ast::Function>,
        closure: ScopeId,
    },
    /// Signature only; produced by static analysis.
    Unbound,
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Print => f.write_str("Print"),
            Callable::Native(_) => f.write_str("Native(..)"),
            Callable::Declared { declaration, closure } => f
                .debug_struct("Declared")
                .field("name", &declaration.name)
                .field("closure", closure)
                .finish(),
            Callable::Unbound => f.write_str("Unbound"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub host_name: String,
    pub parameter_types: Vec<Type>,
    pub return_type: Type,
    pub callable: Callable,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        parameter_types: Vec<Type>,
        return_type: Type,
        callable: Callable,
    ) -> Self {
        let name = name.into();
        Self {
            host_name: name.clone(),
            name,
            parameter_types,
            return_type,
            callable,
        }
    }

    pub fn signature(name: impl Into<String>, parameter_types: Vec<Type>, return_type: Type) -> Self {
        Self::new(name, parameter_types, return_type, Callable::Unbound)
    }

    pub fn native(
        name: impl Into<String>,
        parameter_types: Vec<Type>,
        return_type: Type,
        invoke: impl Fn(Vec<PlcObject>) -> Result<PlcObject, String> + 'static,
    ) -> Self {
        Self::new(name, parameter_types, return_type, Callable::Native(Rc::new(invoke)))
    }

    /// The built-in `print(Any): Nil`, emitted as `System.out.println`.
    pub fn print() -> Self {
        Self {
            host_name: "System.out.println".to_string(),
            ..Self::new("print", vec![Type::Any], Type::Nil, Callable::Print)
        }
    }

    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }
}
