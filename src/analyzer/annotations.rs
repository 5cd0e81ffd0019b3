use rustc_hash::FxHashMap;

use crate::ast::NodeId;
use crate::environment::{Function, Type, Variable};

/// Results of static analysis keyed by syntax node.
///
/// Every analyzed expression has a type; globals, declarations and access
/// expressions have a variable; functions and call expressions have a
/// function.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    types: FxHashMap<NodeId, Type>,
    variables: FxHashMap<NodeId, Variable>,
    functions: FxHashMap<NodeId, Function>,
}

impl Annotations {
    pub fn type_of(&self, id: NodeId) -> Option<Type> {
        self.types.get(&id).copied()
    }

    pub fn variable(&self, id: NodeId) -> Option<&Variable> {
        self.variables.get(&id)
    }

    pub fn function(&self, id: NodeId) -> Option<&Function> {
        self.functions.get(&id)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn binding_count(&self) -> usize {
        self.variables.len() + self.functions.len()
    }

    pub(crate) fn set_type(&mut self, id: NodeId, ty: Type) {
        self.types.insert(id, ty);
    }

    pub(crate) fn bind_variable(&mut self, id: NodeId, variable: Variable) {
        self.variables.insert(id, variable);
    }

    pub(crate) fn bind_function(&mut self, id: NodeId, function: Function) {
        self.functions.insert(id, function);
    }
}
