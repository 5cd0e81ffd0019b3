//! Syntax tree shared by the analyzer and both backends.
//!
//! Nodes that later passes annotate (expressions, globals, functions and
//! declarations) carry a [`NodeId`]. Equality between nodes is structural and
//! ignores those ids.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

/// Identity of an annotatable node, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn next() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Source {
    pub globals: Vec<Global>,
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone)]
pub struct Global {
    pub id: NodeId,
    pub name: String,
    pub type_name: Option<String>,
    pub mutable: bool,
    pub value: Option<Expression>,
}

impl Global {
    pub fn new(
        name: impl Into<String>,
        type_name: Option<String>,
        mutable: bool,
        value: Option<Expression>,
    ) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            type_name,
            mutable,
            value,
        }
    }
}

impl PartialEq for Global {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.type_name == other.type_name
            && self.mutable == other.mutable
            && self.value == other.value
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub id: NodeId,
    pub name: String,
    pub parameters: Vec<String>,
    pub parameter_type_names: Vec<String>,
    pub return_type_name: Option<String>,
    pub statements: Vec<Statement>,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<(String, String)>,
        return_type_name: Option<String>,
        statements: Vec<Statement>,
    ) -> Self {
        let (parameters, parameter_type_names) = parameters.into_iter().unzip();
        Self {
            id: NodeId::next(),
            name: name.into(),
            parameters,
            parameter_type_names,
            return_type_name,
            statements,
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.parameters == other.parameters
            && self.parameter_type_names == other.parameter_type_names
            && self.return_type_name == other.return_type_name
            && self.statements == other.statements
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Expression(Expression),
    Declaration(Declaration),
    Assignment {
        receiver: Expression,
        value: Expression,
    },
    If {
        condition: Expression,
        then_statements: Vec<Statement>,
        else_statements: Vec<Statement>,
    },
    Switch {
        condition: Expression,
        cases: Vec<Case>,
    },
    While {
        condition: Expression,
        statements: Vec<Statement>,
    },
    Return(Expression),
}

#[derive(Debug, Clone)]
pub struct Declaration {
    pub id: NodeId,
    pub name: String,
    pub type_name: Option<String>,
    pub value: Option<Expression>,
}

impl Declaration {
    pub fn new(name: impl Into<String>, type_name: Option<String>, value: Option<Expression>) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            type_name,
            value,
        }
    }
}

impl PartialEq for Declaration {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.type_name == other.type_name && self.value == other.value
    }
}

/// A `CASE` arm, or the `DEFAULT` arm when `value` is absent.
#[derive(Debug, PartialEq, Clone)]
pub struct Case {
    pub value: Option<Expression>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct Expression {
    pub id: NodeId,
    pub kind: ExpressionKind,
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum ExpressionKind {
    Literal(Literal),
    Group(Box<Expression>),
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Access {
        name: String,
        offset: Option<Box<Expression>>,
    },
    Function {
        name: String,
        arguments: Vec<Expression>,
    },
    /// List literal; its element type comes from the enclosing global.
    List(Vec<Expression>),
}

impl Expression {
    pub fn new(kind: ExpressionKind) -> Self {
        Self {
            id: NodeId::next(),
            kind,
        }
    }

    pub fn literal(literal: Literal) -> Self {
        Self::new(ExpressionKind::Literal(literal))
    }

    pub fn group(inner: Expression) -> Self {
        Self::new(ExpressionKind::Group(Box::new(inner)))
    }

    pub fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Self {
        Self::new(ExpressionKind::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn access(name: impl Into<String>, offset: Option<Expression>) -> Self {
        Self::new(ExpressionKind::Access {
            name: name.into(),
            offset: offset.map(Box::new),
        })
    }

    pub fn function(name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Self::new(ExpressionKind::Function {
            name: name.into(),
            arguments,
        })
    }

    pub fn list(values: Vec<Expression>) -> Self {
        Self::new(ExpressionKind::List(values))
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Nil,
    Boolean(bool),
    Integer(BigInt),
    Decimal(BigDecimal),
    Character(char),
    String(String),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOperator {
    And,
    Or,
    Less,
    Greater,
    Equal,
    NotEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "&&" => Self::And,
            "||" => Self::Or,
            "<" => Self::Less,
            ">" => Self::Greater,
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            "+" => Self::Add,
            "-" => Self::Subtract,
            "*" => Self::Multiply,
            "/" => Self::Divide,
            "^" => Self::Power,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
            Self::Less => "<",
            Self::Greater => ">",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Power => "^",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
