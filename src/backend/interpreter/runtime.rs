use std::io::Write;
use std::rc::Rc;

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use tracing::trace;

use crate::ast::{BinaryOperator, Case, Expression, ExpressionKind, Statement};
use crate::environment::{Callable, Function, ListRef, PlcObject, Value, Variable};

use super::{Interpreter, RuntimeError, RuntimeResult};

/// Control-flow marker for statement execution.
pub(super) enum ExecResult {
    Continue,
    Return(PlcObject),
}

impl<W: Write> Interpreter<W> {
    pub(super) fn execute_block(&mut self, statements: &[Statement]) -> RuntimeResult<ExecResult> {
        for statement in statements {
            if let ExecResult::Return(value) = self.execute_statement(statement)? {
                return Ok(ExecResult::Return(value));
            }
        }
        Ok(ExecResult::Continue)
    }

    fn execute_scoped_block(&mut self, statements: &[Statement]) -> RuntimeResult<ExecResult> {
        self.with_scope(self.scopes.current(), |this| this.execute_block(statements))
    }

    pub(super) fn execute_statement(&mut self, statement: &Statement) -> RuntimeResult<ExecResult> {
        match statement {
            Statement::Expression(expression) => {
                self.evaluate_expression(expression)?;
            }
            Statement::Declaration(declaration) => {
                let value = match &declaration.value {
                    Some(value) => self.evaluate_expression(value)?,
                    None => PlcObject::nil(),
                };
                let ty = match &declaration.type_name {
                    Some(name) => super::resolve_type(name)?,
                    None => value.ty,
                };
                self.define_variable(Variable::new(&declaration.name, ty, true, value))?;
            }
            Statement::Assignment { receiver, value } => self.assign(receiver, value)?,
            Statement::If {
                condition,
                then_statements,
                else_statements,
            } => {
                let branch = if self.evaluate_boolean(condition)? {
                    then_statements
                } else {
                    else_statements
                };
                return self.execute_scoped_block(branch);
            }
            Statement::Switch { condition, cases } => {
                let condition = self.evaluate_expression(condition)?;
                return self.with_scope(self.scopes.current(), |this| {
                    this.execute_switch(&condition, cases)
                });
            }
            Statement::While {
                condition,
                statements,
            } => {
                while self.evaluate_boolean(condition)? {
                    if let ExecResult::Return(value) = self.execute_scoped_block(statements)? {
                        return Ok(ExecResult::Return(value));
                    }
                }
            }
            Statement::Return(value) => {
                return Ok(ExecResult::Return(self.evaluate_expression(value)?));
            }
        }
        Ok(ExecResult::Continue)
    }

    fn execute_switch(&mut self, condition: &PlcObject, cases: &[Case]) -> RuntimeResult<ExecResult> {
        for case in cases {
            let matched = match &case.value {
                Some(value) => self.evaluate_expression(value)?.value == condition.value,
                None => true,
            };
            if matched {
                return self.execute_block(&case.statements);
            }
        }
        Ok(ExecResult::Continue)
    }

    fn assign(&mut self, receiver: &Expression, value: &Expression) -> RuntimeResult<()> {
        let ExpressionKind::Access { name, offset } = &receiver.kind else {
            return Err(RuntimeError::InvalidAssignmentTarget);
        };
        match offset {
            Some(offset) => {
                let index = self.evaluate_offset(offset)?;
                let value = self.evaluate_expression(value)?;
                let list = self.lookup_list(name)?;
                let mut elements = list.borrow_mut();
                let slot = checked_index(&index, elements.len())?;
                elements[slot] = value;
            }
            None => {
                let value = self.evaluate_expression(value)?;
                let variable = self
                    .scopes
                    .lookup_variable_mut(name)
                    .ok_or_else(|| RuntimeError::UndefinedVariable { name: name.clone() })?;
                if !variable.mutable {
                    return Err(RuntimeError::ImmutableAssignment { name: name.clone() });
                }
                variable.value = value;
            }
        }
        Ok(())
    }

    pub(super) fn evaluate_expression(&mut self, expression: &Expression) -> RuntimeResult<PlcObject> {
        match &expression.kind {
            ExpressionKind::Literal(literal) => Ok(PlcObject::from_literal(literal)),
            ExpressionKind::Group(inner) => self.evaluate_expression(inner),
            ExpressionKind::Binary {
                operator,
                left,
                right,
            } => self.evaluate_binary(*operator, left, right),
            ExpressionKind::Access { name, offset } => match offset {
                Some(offset) => {
                    let index = self.evaluate_offset(offset)?;
                    let list = self.lookup_list(name)?;
                    let elements = list.borrow();
                    let slot = checked_index(&index, elements.len())?;
                    Ok(elements[slot].clone())
                }
                None => self
                    .scopes
                    .lookup_variable(name)
                    .map(|variable| variable.value.clone())
                    .ok_or_else(|| RuntimeError::UndefinedVariable { name: name.clone() }),
            },
            ExpressionKind::Function { name, arguments } => {
                let function = self
                    .scopes
                    .lookup_function(name, arguments.len())
                    .cloned()
                    .ok_or_else(|| RuntimeError::UndefinedFunction {
                        name: name.clone(),
                        arity: arguments.len(),
                    })?;
                let arguments = arguments
                    .iter()
                    .map(|argument| self.evaluate_expression(argument))
                    .collect::<RuntimeResult<Vec<_>>>()?;
                self.call(&function, arguments)
            }
            ExpressionKind::List(values) => {
                let values = values
                    .iter()
                    .map(|value| self.evaluate_expression(value))
                    .collect::<RuntimeResult<Vec<_>>>()?;
                Ok(PlcObject::list(values))
            }
        }
    }

    pub(super) fn call(
        &mut self,
        function: &Function,
        arguments: Vec<PlcObject>,
    ) -> RuntimeResult<PlcObject> {
        if arguments.len() != function.arity() {
            return Err(RuntimeError::ArityMismatch {
                name: function.name.clone(),
                expected: function.arity(),
                found: arguments.len(),
            });
        }
        trace!(function = %function.name, arguments = arguments.len(), "invoking function");
        match &function.callable {
            Callable::Print => {
                for argument in &arguments {
                    writeln!(self.output, "{argument}").map_err(|error| RuntimeError::Output {
                        message: error.to_string(),
                    })?;
                }
                Ok(PlcObject::nil())
            }
            Callable::Native(invoke) => invoke(arguments).map_err(|message| RuntimeError::Native {
                name: function.name.clone(),
                message,
            }),
            Callable::Declared {
                declaration,
                closure,
            } => {
                let declaration = Rc::clone(declaration);
                self.with_scope(*closure, |this| {
                    let parameters = declaration
                        .parameters
                        .iter()
                        .zip(&function.parameter_types)
                        .zip(arguments);
                    for ((name, ty), value) in parameters {
                        this.define_variable(Variable::new(name, *ty, true, value))?;
                    }
                    match this.execute_block(&declaration.statements)? {
                        ExecResult::Return(value) => Ok(value),
                        ExecResult::Continue => Ok(PlcObject::nil()),
                    }
                })
            }
            Callable::Unbound => Err(RuntimeError::UnboundFunction {
                name: function.name.clone(),
            }),
        }
    }

    fn evaluate_binary(
        &mut self,
        operator: BinaryOperator,
        left: &Expression,
        right: &Expression,
    ) -> RuntimeResult<PlcObject> {
        match operator {
            BinaryOperator::And => {
                let result = self.evaluate_boolean(left)? && self.evaluate_boolean(right)?;
                Ok(PlcObject::boolean(result))
            }
            BinaryOperator::Or => {
                let result = self.evaluate_boolean(left)? || self.evaluate_boolean(right)?;
                Ok(PlcObject::boolean(result))
            }
            _ => {
                let left = self.evaluate_expression(left)?;
                let right = self.evaluate_expression(right)?;
                apply_binary(operator, &left.value, &right.value)
            }
        }
    }

    fn evaluate_boolean(&mut self, expression: &Expression) -> RuntimeResult<bool> {
        match self.evaluate_expression(expression)?.value {
            Value::Boolean(value) => Ok(value),
            other => Err(RuntimeError::ExpectedBoolean {
                found: other.kind_name(),
            }),
        }
    }

    fn evaluate_offset(&mut self, offset: &Expression) -> RuntimeResult<BigInt> {
        match self.evaluate_expression(offset)?.value {
            Value::Integer(index) => Ok(index),
            other => Err(RuntimeError::ExpectedInteger {
                found: other.kind_name(),
            }),
        }
    }

    fn lookup_list(&self, name: &str) -> RuntimeResult<ListRef> {
        let variable = self
            .scopes
            .lookup_variable(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable {
                name: name.to_string(),
            })?;
        match &variable.value.value {
            Value::List(list) => Ok(Rc::clone(list)),
            _ => Err(RuntimeError::ExpectedList {
                name: name.to_string(),
            }),
        }
    }
}

fn checked_index(index: &BigInt, len: usize) -> RuntimeResult<usize> {
    index
        .to_usize()
        .filter(|slot| *slot < len)
        .ok_or_else(|| RuntimeError::IndexOutOfBounds {
            index: index.to_string(),
            len,
        })
}

/// Applies a strict binary operator to two evaluated operands.
pub(super) fn apply_binary(
    operator: BinaryOperator,
    left: &Value,
    right: &Value,
) -> RuntimeResult<PlcObject> {
    let invalid = || RuntimeError::InvalidOperands {
        operator,
        left: left.kind_name(),
        right: right.kind_name(),
    };
    match operator {
        BinaryOperator::And | BinaryOperator::Or => match (left, right) {
            (Value::Boolean(l), Value::Boolean(r)) => Ok(PlcObject::boolean(
                if operator == BinaryOperator::And { *l && *r } else { *l || *r },
            )),
            _ => Err(invalid()),
        },
        BinaryOperator::Less | BinaryOperator::Greater => {
            let ordering = match (left, right) {
                (Value::Integer(l), Value::Integer(r)) => l.cmp(r),
                (Value::Decimal(l), Value::Decimal(r)) => l.cmp(r),
                (Value::Character(l), Value::Character(r)) => l.cmp(r),
                (Value::String(l), Value::String(r)) => l.cmp(r),
                _ => return Err(invalid()),
            };
            Ok(PlcObject::boolean(if operator == BinaryOperator::Less {
                ordering.is_lt()
            } else {
                ordering.is_gt()
            }))
        }
        BinaryOperator::Equal => Ok(PlcObject::boolean(left == right)),
        BinaryOperator::NotEqual => Ok(PlcObject::boolean(left != right)),
        BinaryOperator::Add => match (left, right) {
            (Value::String(l), Value::String(r)) => Ok(PlcObject::string(format!("{l}{r}"))),
            (Value::Integer(l), Value::Integer(r)) => Ok(PlcObject::integer(l + r)),
            (Value::Decimal(l), Value::Decimal(r)) => Ok(PlcObject::decimal(l + r)),
            _ => Err(invalid()),
        },
        BinaryOperator::Subtract => match (left, right) {
            (Value::Integer(l), Value::Integer(r)) => Ok(PlcObject::integer(l - r)),
            (Value::Decimal(l), Value::Decimal(r)) => Ok(PlcObject::decimal(l - r)),
            _ => Err(invalid()),
        },
        BinaryOperator::Multiply => match (left, right) {
            (Value::Integer(l), Value::Integer(r)) => Ok(PlcObject::integer(l * r)),
            (Value::Decimal(l), Value::Decimal(r)) => Ok(PlcObject::decimal(l * r)),
            _ => Err(invalid()),
        },
        BinaryOperator::Divide => match (left, right) {
            (Value::Integer(_), Value::Integer(r)) if r.is_zero() => {
                Err(RuntimeError::DivisionByZero)
            }
            (Value::Integer(l), Value::Integer(r)) => Ok(PlcObject::integer(l / r)),
            (Value::Decimal(l), Value::Decimal(r)) => divide_decimal(l, r).map(PlcObject::decimal),
            _ => Err(invalid()),
        },
        BinaryOperator::Power => match (left, right) {
            (Value::Integer(base), Value::Integer(exponent)) => {
                let exponent = exponent
                    .to_u32()
                    .ok_or_else(|| RuntimeError::InvalidExponent {
                        exponent: exponent.to_string(),
                    })?;
                Ok(PlcObject::integer(base.pow(exponent)))
            }
            _ => Err(invalid()),
        },
    }
}

/// Decimal quotient kept at the dividend's scale, rounding half to even.
fn divide_decimal(dividend: &BigDecimal, divisor: &BigDecimal) -> RuntimeResult<BigDecimal> {
    if divisor.is_zero() {
        return Err(RuntimeError::DivisionByZero);
    }
    let (_, scale) = dividend.as_bigint_and_exponent();
    Ok((dividend / divisor).with_scale_round(scale, RoundingMode::HalfEven))
}
