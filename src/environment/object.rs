use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use super::Type;
use crate::ast::Literal;

/// Shared backing store of a list value. Clones alias the same elements.
pub type ListRef = Rc<RefCell<Vec<PlcObject>>>;

/// Runtime value paired with the type it was created under.
#[derive(Debug, Clone, PartialEq)]
pub struct PlcObject {
    pub ty: Type,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(BigInt),
    Decimal(BigDecimal),
    Character(char),
    String(String),
    List(ListRef),
}

impl PlcObject {
    pub fn new(ty: Type, value: Value) -> Self {
        Self { ty, value }
    }

    pub fn nil() -> Self {
        Self::new(Type::Nil, Value::Nil)
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(Type::Boolean, Value::Boolean(value))
    }

    pub fn integer(value: impl Into<BigInt>) -> Self {
        Self::new(Type::Integer, Value::Integer(value.into()))
    }

    pub fn decimal(value: BigDecimal) -> Self {
        Self::new(Type::Decimal, Value::Decimal(value))
    }

    pub fn character(value: char) -> Self {
        Self::new(Type::Character, Value::Character(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(Type::String, Value::String(value.into()))
    }

    pub fn list(values: Vec<PlcObject>) -> Self {
        Self::new(Type::Any, Value::List(Rc::new(RefCell::new(values))))
    }

    pub fn from_literal(literal: &Literal) -> Self {
        match literal {
            Literal::Nil => Self::nil(),
            Literal::Boolean(value) => Self::boolean(*value),
            Literal::Integer(value) => Self::integer(value.clone()),
            Literal::Decimal(value) => Self::decimal(value.clone()),
            Literal::Character(value) => Self::character(*value),
            Literal::String(value) => Self::string(value.clone()),
        }
    }
}

impl Value {
    /// Name of the runtime shape, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Decimal(_) => "Decimal",
            Value::Character(_) => "Character",
            Value::String(_) => "String",
            Value::List(_) => "List",
        }
    }
}

impl fmt::Display for PlcObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("null"),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Decimal(value) => write!(f, "{value}"),
            Value::Character(value) => write!(f, "{value}"),
            Value::String(value) => f.write_str(value),
            Value::List(values) => {
                let rendered = values
                    .borrow()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "[{rendered}]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn renders_values_for_output() {
        assert_eq!(PlcObject::nil().to_string(), "null");
        assert_eq!(PlcObject::boolean(true).to_string(), "true");
        assert_eq!(PlcObject::integer(-7).to_string(), "-7");
        let decimal = BigDecimal::from_str("2.50").expect("decimal");
        assert_eq!(PlcObject::decimal(decimal).to_string(), "2.50");
        assert_eq!(PlcObject::character('c').to_string(), "c");
        assert_eq!(PlcObject::string("hi").to_string(), "hi");
        let list = PlcObject::list(vec![PlcObject::integer(1), PlcObject::integer(5)]);
        assert_eq!(list.to_string(), "[1, 5]");
    }

    #[test]
    fn list_clones_share_elements() {
        let list = PlcObject::list(vec![PlcObject::integer(1)]);
        let alias = list.clone();
        if let Value::List(values) = &alias.value {
            values.borrow_mut()[0] = PlcObject::integer(2);
        }
        assert_eq!(list.to_string(), "[2]");
        assert_eq!(list.ty, Type::Any);
    }
}
