use std::io::{self, Write};
use std::rc::Rc;

use tracing::debug;

use crate::ast::{self, Expression, Source, Statement};
use crate::environment::{Callable, Function, PlcObject, ScopeId, Scopes, Type, Variable};

mod error;
mod runtime;

pub use error::{RuntimeError, RuntimeResult};
use runtime::ExecResult;

/// AST-walking backend that evaluates programs against live scopes.
///
/// Program output from `print` goes to `W`, standard output by default.
pub struct Interpreter<W = io::Stdout> {
    scopes: Scopes,
    output: W,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(output: W) -> Self {
        Self {
            scopes: Scopes::with_builtins([Function::print()]),
            output,
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Defines every global and function, then calls `main()`.
    pub fn run(&mut self, source: &Source) -> RuntimeResult<PlcObject> {
        for global in &source.globals {
            self.define_global(global)?;
        }
        for function in &source.functions {
            self.define_declared_function(function)?;
        }
        debug!(
            globals = source.globals.len(),
            functions = source.functions.len(),
            "invoking main"
        );
        self.invoke("main", Vec::new())
    }

    pub fn define_variable(&mut self, variable: Variable) -> RuntimeResult<()> {
        Ok(self.scopes.define_variable(variable)?)
    }

    pub fn define_function(&mut self, function: Function) -> RuntimeResult<()> {
        Ok(self.scopes.define_function(function)?)
    }

    pub fn lookup_variable(&self, name: &str) -> Option<&Variable> {
        self.scopes.lookup_variable(name)
    }

    /// Calls the function visible as `name` with a matching arity.
    pub fn invoke(&mut self, name: &str, arguments: Vec<PlcObject>) -> RuntimeResult<PlcObject> {
        let function = self
            .scopes
            .lookup_function(name, arguments.len())
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedFunction {
                name: name.to_string(),
                arity: arguments.len(),
            })?;
        self.call(&function, arguments)
    }

    /// Executes one statement in the current scope.
    ///
    /// A `RETURN` reaching this level has no function to return from and is
    /// reported as an error.
    pub fn execute(&mut self, statement: &Statement) -> RuntimeResult<()> {
        match self.execute_statement(statement)? {
            ExecResult::Continue => Ok(()),
            ExecResult::Return(_) => Err(RuntimeError::ReturnOutsideFunction),
        }
    }

    pub fn evaluate(&mut self, expression: &Expression) -> RuntimeResult<PlcObject> {
        self.evaluate_expression(expression)
    }

    fn define_global(&mut self, global: &ast::Global) -> RuntimeResult<()> {
        let value = match &global.value {
            Some(value) => self.evaluate(value)?,
            None => PlcObject::nil(),
        };
        let ty = match &global.type_name {
            Some(name) => resolve_type(name)?,
            None => value.ty,
        };
        self.define_variable(Variable::new(&global.name, ty, global.mutable, value))
    }

    fn define_declared_function(&mut self, function: &ast::Function) -> RuntimeResult<()> {
        let parameter_types = function
            .parameter_type_names
            .iter()
            .map(|name| resolve_type(name))
            .collect::<RuntimeResult<Vec<_>>>()?;
        let return_type = match &function.return_type_name {
            Some(name) => resolve_type(name)?,
            None => Type::Nil,
        };
        let callable = Callable::Declared {
            declaration: Rc::new(function.clone()),
            closure: self.scopes.current(),
        };
        self.define_function(Function::new(
            &function.name,
            parameter_types,
            return_type,
            callable,
        ))
    }

    /// Runs `body` in a fresh child of `parent`, restoring the current scope
    /// afterwards whatever `body` returns.
    fn with_scope<T>(&mut self, parent: ScopeId, body: impl FnOnce(&mut Self) -> T) -> T {
        let frame = self.scopes.enter(parent);
        let result = body(self);
        self.scopes.leave(frame);
        result
    }
}

fn resolve_type(name: &str) -> RuntimeResult<Type> {
    Type::from_name(name).ok_or_else(|| RuntimeError::UnknownType {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests;
