use rustc_hash::FxHashMap;

use super::{DefinitionError, Function, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
pub struct Scope {
    parent: Option<ScopeId>,
    variables: FxHashMap<String, Variable>,
    functions: FxHashMap<(String, usize), Function>,
}

/// Marker returned by [`Scopes::enter`]; hand it back to [`Scopes::leave`].
#[must_use]
#[derive(Debug)]
pub struct Frame {
    previous: ScopeId,
    depth: usize,
}

/// Arena of lexically nested scopes with a movable current scope.
///
/// Scopes are discarded in stack order: leaving a frame drops the scope it
/// opened along with anything opened after it.
#[derive(Debug)]
pub struct Scopes {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Scopes {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            current: ScopeId(0),
        }
    }

    /// Arena whose root scope holds `builtins`, keyed like any other function.
    pub fn with_builtins(builtins: impl IntoIterator<Item = Function>) -> Self {
        let functions = builtins
            .into_iter()
            .map(|function| ((function.name.clone(), function.arity()), function))
            .collect();
        Self {
            scopes: vec![Scope {
                functions,
                ..Scope::default()
            }],
            current: ScopeId(0),
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Opens a child of `parent` and makes it current.
    pub fn enter(&mut self, parent: ScopeId) -> Frame {
        let frame = Frame {
            previous: self.current,
            depth: self.scopes.len(),
        };
        self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        self.current = ScopeId(frame.depth);
        frame
    }

    pub fn leave(&mut self, frame: Frame) {
        self.scopes.truncate(frame.depth);
        self.current = frame.previous;
    }

    pub fn define_variable(&mut self, variable: Variable) -> Result<(), DefinitionError> {
        let scope = &mut self.scopes[self.current.0];
        if scope.variables.contains_key(&variable.name) {
            return Err(DefinitionError::Variable {
                name: variable.name,
            });
        }
        scope.variables.insert(variable.name.clone(), variable);
        Ok(())
    }

    pub fn define_function(&mut self, function: Function) -> Result<(), DefinitionError> {
        let scope = &mut self.scopes[self.current.0];
        let key = (function.name.clone(), function.arity());
        if scope.functions.contains_key(&key) {
            return Err(DefinitionError::Function {
                name: key.0,
                arity: key.1,
            });
        }
        scope.functions.insert(key, function);
        Ok(())
    }

    pub fn lookup_variable(&self, name: &str) -> Option<&Variable> {
        self.chain()
            .find_map(|id| self.scopes[id.0].variables.get(name))
    }

    pub fn lookup_variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        let id = self
            .chain()
            .find(|id| self.scopes[id.0].variables.contains_key(name))?;
        self.scopes[id.0].variables.get_mut(name)
    }

    pub fn lookup_function(&self, name: &str, arity: usize) -> Option<&Function> {
        let key = (name.to_string(), arity);
        self.chain()
            .find_map(|id| self.scopes[id.0].functions.get(&key))
    }

    /// Current scope followed by each of its ancestors up to the root.
    fn chain(&self) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(self.current), |id| self.scopes[id.0].parent)
    }
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}
