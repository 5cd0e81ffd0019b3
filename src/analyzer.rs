//! Static pass resolving names and types ahead of code generation.
//!
//! Analysis stops at the first error. On success every expression has a type
//! in [`Annotations`] and every name has its binding.

use num_traits::ToPrimitive;

use crate::ast::{
    BinaryOperator, Case, Declaration, Expression, ExpressionKind, Function, Global, Literal,
    Source, Statement,
};
use crate::environment::{self, PlcObject, ScopeId, Scopes, Type, Variable};

mod annotations;
mod error;

pub use annotations::Annotations;
pub use error::{AnalyzeResult, SemanticError};

pub struct Analyzer {
    scopes: Scopes,
    annotations: Annotations,
    return_type: Option<Type>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            scopes: Scopes::with_builtins([environment::Function::print()]),
            annotations: Annotations::default(),
            return_type: None,
        }
    }

    pub fn analyze(mut self, source: &Source) -> AnalyzeResult<Annotations> {
        self.visit_source(source)?;
        Ok(self.annotations)
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn into_annotations(self) -> Annotations {
        self.annotations
    }

    pub fn define_variable(&mut self, variable: Variable) -> AnalyzeResult<()> {
        Ok(self.scopes.define_variable(variable)?)
    }

    pub fn define_function(&mut self, function: environment::Function) -> AnalyzeResult<()> {
        Ok(self.scopes.define_function(function)?)
    }

    pub fn visit_source(&mut self, source: &Source) -> AnalyzeResult<()> {
        for global in &source.globals {
            self.visit_global(global)?;
        }
        for function in &source.functions {
            self.visit_function(function)?;
        }
        let main = self
            .scopes
            .lookup_function("main", 0)
            .ok_or(SemanticError::MissingMain)?;
        if main.return_type != Type::Integer {
            return Err(SemanticError::MainReturnType {
                found: main.return_type,
            });
        }
        Ok(())
    }

    pub fn visit_global(&mut self, global: &Global) -> AnalyzeResult<()> {
        let declared = resolve_type(global.type_name.as_deref())?;
        let actual = match &global.value {
            Some(value) => Some(match &value.kind {
                ExpressionKind::List(values) => {
                    let element = declared.unwrap_or(Type::Any);
                    self.visit_list_values(values, element)?;
                    self.annotations.set_type(value.id, element);
                    element
                }
                _ => self.visit_expression(value)?,
            }),
            None => None,
        };
        let ty = binding_type(&global.name, declared, actual)?;
        let variable = Variable::new(&global.name, ty, global.mutable, PlcObject::nil());
        self.scopes.define_variable(variable.clone())?;
        self.annotations.bind_variable(global.id, variable);
        Ok(())
    }

    pub fn visit_function(&mut self, function: &Function) -> AnalyzeResult<()> {
        let parameter_types = function
            .parameter_type_names
            .iter()
            .map(|name| resolve_type(Some(name)).map(|ty| ty.unwrap_or(Type::Any)))
            .collect::<AnalyzeResult<Vec<_>>>()?;
        let return_type = resolve_type(function.return_type_name.as_deref())?.unwrap_or(Type::Nil);

        let signature =
            environment::Function::signature(&function.name, parameter_types.clone(), return_type);
        self.scopes.define_function(signature.clone())?;
        self.annotations.bind_function(function.id, signature);

        let enclosing = self.return_type.replace(return_type);
        let result = self.with_scope(self.scopes.current(), |this| {
            for (name, ty) in function.parameters.iter().zip(parameter_types) {
                this.scopes
                    .define_variable(Variable::new(name, ty, true, PlcObject::nil()))?;
            }
            this.visit_block(&function.statements)
        });
        self.return_type = enclosing;
        result
    }

    pub fn visit_statement(&mut self, statement: &Statement) -> AnalyzeResult<()> {
        match statement {
            Statement::Expression(expression) => {
                if !matches!(expression.kind, ExpressionKind::Function { .. }) {
                    return Err(SemanticError::ExpressionStatement);
                }
                self.visit_expression(expression)?;
                Ok(())
            }
            Statement::Declaration(declaration) => self.visit_declaration(declaration),
            Statement::Assignment { receiver, value } => self.visit_assignment(receiver, value),
            Statement::If {
                condition,
                then_statements,
                else_statements,
            } => {
                self.require_condition("IF", condition)?;
                if then_statements.is_empty() {
                    return Err(SemanticError::EmptyIfBlock);
                }
                self.visit_scoped_block(then_statements)?;
                self.visit_scoped_block(else_statements)
            }
            Statement::Switch { condition, cases } => self.visit_switch(condition, cases),
            Statement::While {
                condition,
                statements,
            } => {
                self.require_condition("WHILE", condition)?;
                self.visit_scoped_block(statements)
            }
            Statement::Return(value) => {
                let expected = self
                    .return_type
                    .ok_or(SemanticError::ReturnOutsideFunction)?;
                let actual = self.visit_expression(value)?;
                require_assignable(expected, actual)
            }
        }
    }

    fn visit_declaration(&mut self, declaration: &Declaration) -> AnalyzeResult<()> {
        let declared = resolve_type(declaration.type_name.as_deref())?;
        let actual = declaration
            .value
            .as_ref()
            .map(|value| self.visit_expression(value))
            .transpose()?;
        let ty = binding_type(&declaration.name, declared, actual)?;
        let variable = Variable::new(&declaration.name, ty, true, PlcObject::nil());
        self.scopes.define_variable(variable.clone())?;
        self.annotations.bind_variable(declaration.id, variable);
        Ok(())
    }

    fn visit_assignment(&mut self, receiver: &Expression, value: &Expression) -> AnalyzeResult<()> {
        let ExpressionKind::Access { name, .. } = &receiver.kind else {
            return Err(SemanticError::InvalidAssignmentTarget);
        };
        let target = self.visit_expression(receiver)?;
        if let Some(variable) = self.scopes.lookup_variable(name)
            && !variable.mutable
        {
            return Err(SemanticError::ImmutableAssignment { name: name.clone() });
        }
        let actual = self.visit_expression(value)?;
        require_assignable(target, actual)
    }

    fn visit_switch(&mut self, condition: &Expression, cases: &[Case]) -> AnalyzeResult<()> {
        let expected = self.visit_expression(condition)?;
        for (position, case) in cases.iter().enumerate() {
            match &case.value {
                Some(value) => {
                    let found = self.visit_expression(value)?;
                    if found != expected {
                        return Err(SemanticError::CaseType { expected, found });
                    }
                }
                None if position + 1 != cases.len() => {
                    return Err(SemanticError::DefaultNotLast);
                }
                None => {}
            }
            self.visit_scoped_block(&case.statements)?;
        }
        Ok(())
    }

    pub fn visit_expression(&mut self, expression: &Expression) -> AnalyzeResult<Type> {
        let ty = match &expression.kind {
            ExpressionKind::Literal(literal) => literal_type(literal)?,
            ExpressionKind::Group(inner) => {
                if !matches!(inner.kind, ExpressionKind::Binary { .. }) {
                    return Err(SemanticError::GroupNotBinary);
                }
                self.visit_expression(inner)?
            }
            ExpressionKind::Binary {
                operator,
                left,
                right,
            } => {
                let left = self.visit_expression(left)?;
                let right = self.visit_expression(right)?;
                binary_type(*operator, left, right)?
            }
            ExpressionKind::Access { name, offset } => {
                if let Some(offset) = offset {
                    let found = self.visit_expression(offset)?;
                    if found != Type::Integer {
                        return Err(SemanticError::OffsetType { found });
                    }
                }
                let variable = self
                    .scopes
                    .lookup_variable(name)
                    .cloned()
                    .ok_or_else(|| SemanticError::UndefinedVariable { name: name.clone() })?;
                let ty = variable.ty;
                self.annotations.bind_variable(expression.id, variable);
                ty
            }
            ExpressionKind::Function { name, arguments } => {
                let function = self
                    .scopes
                    .lookup_function(name, arguments.len())
                    .cloned()
                    .ok_or_else(|| SemanticError::UndefinedFunction {
                        name: name.clone(),
                        arity: arguments.len(),
                    })?;
                for (argument, parameter) in arguments.iter().zip(&function.parameter_types) {
                    let actual = self.visit_expression(argument)?;
                    require_assignable(*parameter, actual)?;
                }
                let ty = function.return_type;
                self.annotations.bind_function(expression.id, function);
                ty
            }
            ExpressionKind::List(values) => {
                self.visit_list_values(values, Type::Any)?;
                Type::Any
            }
        };
        self.annotations.set_type(expression.id, ty);
        Ok(ty)
    }

    fn visit_list_values(&mut self, values: &[Expression], element: Type) -> AnalyzeResult<()> {
        for value in values {
            let actual = self.visit_expression(value)?;
            require_assignable(element, actual)?;
        }
        Ok(())
    }

    fn visit_block(&mut self, statements: &[Statement]) -> AnalyzeResult<()> {
        statements
            .iter()
            .try_for_each(|statement| self.visit_statement(statement))
    }

    fn visit_scoped_block(&mut self, statements: &[Statement]) -> AnalyzeResult<()> {
        self.with_scope(self.scopes.current(), |this| this.visit_block(statements))
    }

    fn require_condition(
        &mut self,
        construct: &'static str,
        condition: &Expression,
    ) -> AnalyzeResult<()> {
        let found = self.visit_expression(condition)?;
        if found != Type::Boolean {
            return Err(SemanticError::ConditionType { construct, found });
        }
        Ok(())
    }

    fn with_scope<T>(&mut self, parent: ScopeId, body: impl FnOnce(&mut Self) -> T) -> T {
        let frame = self.scopes.enter(parent);
        let result = body(self);
        self.scopes.leave(frame);
        result
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

pub fn require_assignable(target: Type, actual: Type) -> AnalyzeResult<()> {
    if target.accepts(actual) {
        Ok(())
    } else {
        Err(SemanticError::NotAssignable { target, actual })
    }
}

fn resolve_type(name: Option<&str>) -> AnalyzeResult<Option<Type>> {
    name.map(|name| {
        Type::from_name(name).ok_or_else(|| SemanticError::UnknownType {
            name: name.to_string(),
        })
    })
    .transpose()
}

/// Type of a new binding: the declared type, checked against the
/// initializer when both are present.
fn binding_type(name: &str, declared: Option<Type>, actual: Option<Type>) -> AnalyzeResult<Type> {
    match (declared, actual) {
        (Some(declared), Some(actual)) => {
            require_assignable(declared, actual)?;
            Ok(declared)
        }
        (Some(ty), None) | (None, Some(ty)) => Ok(ty),
        (None, None) => Err(SemanticError::MissingType {
            name: name.to_string(),
        }),
    }
}

fn literal_type(literal: &Literal) -> AnalyzeResult<Type> {
    Ok(match literal {
        Literal::Nil => Type::Nil,
        Literal::Boolean(_) => Type::Boolean,
        Literal::Integer(value) => {
            if value.to_i32().is_none() {
                return Err(SemanticError::IntegerOutOfRange {
                    value: value.to_string(),
                });
            }
            Type::Integer
        }
        Literal::Decimal(value) => {
            if !value.to_f64().is_some_and(f64::is_finite) {
                return Err(SemanticError::DecimalOutOfRange {
                    value: value.to_string(),
                });
            }
            Type::Decimal
        }
        Literal::Character(_) => Type::Character,
        Literal::String(_) => Type::String,
    })
}

fn binary_type(operator: BinaryOperator, left: Type, right: Type) -> AnalyzeResult<Type> {
    let invalid = || SemanticError::InvalidOperands {
        operator,
        left,
        right,
    };
    match operator {
        BinaryOperator::And | BinaryOperator::Or => {
            if left == Type::Boolean && right == Type::Boolean {
                Ok(Type::Boolean)
            } else {
                Err(invalid())
            }
        }
        BinaryOperator::Less
        | BinaryOperator::Greater
        | BinaryOperator::Equal
        | BinaryOperator::NotEqual => {
            require_assignable(Type::Comparable, left)?;
            require_assignable(Type::Comparable, right)?;
            if left == right {
                Ok(Type::Boolean)
            } else {
                Err(invalid())
            }
        }
        BinaryOperator::Add if left == Type::String || right == Type::String => Ok(Type::String),
        BinaryOperator::Add
        | BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide => match (left, right) {
            (Type::Integer, Type::Integer) => Ok(Type::Integer),
            (Type::Decimal, Type::Decimal) => Ok(Type::Decimal),
            _ => Err(invalid()),
        },
        BinaryOperator::Power => match (left, right) {
            (Type::Integer | Type::Decimal, Type::Integer) => Ok(left),
            _ => Err(invalid()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::Parser;
    use indoc::indoc;

    fn parser(input: &str) -> Parser {
        Parser::new(tokenize(input).expect("tokenize should succeed"))
    }

    fn analyze(input: &str) -> AnalyzeResult<Annotations> {
        let source = parser(input).parse_source().expect("parse should succeed");
        Analyzer::new().analyze(&source)
    }

    fn analyze_expression(input: &str) -> AnalyzeResult<Type> {
        let expression = parser(input)
            .parse_expression()
            .expect("parse should succeed");
        let mut analyzer = Analyzer::new();
        analyzer
            .define_variable(Variable::new("num", Type::Integer, true, PlcObject::nil()))
            .expect("define num");
        analyzer
            .define_variable(Variable::new("name", Type::String, false, PlcObject::nil()))
            .expect("define name");
        analyzer.visit_expression(&expression)
    }

    #[test]
    fn annotates_types_and_bindings() {
        let input = indoc! {"
            VAL greeting = \"hi\";
            FUN main(): Integer DO
                print(greeting);
                RETURN 0;
            END
        "};
        let source = parser(input).parse_source().expect("parse should succeed");
        let annotations = Analyzer::new().analyze(&source).expect("analysis failed");

        let global = annotations
            .variable(source.globals[0].id)
            .expect("global binding");
        assert_eq!(global.ty, Type::String);
        assert!(!global.mutable);

        let function = annotations
            .function(source.functions[0].id)
            .expect("function binding");
        assert_eq!(function.return_type, Type::Integer);

        let Statement::Expression(call) = &source.functions[0].statements[0] else {
            panic!("expected call statement");
        };
        let print = annotations.function(call.id).expect("print binding");
        assert_eq!(print.host_name, "System.out.println");
        assert_eq!(annotations.type_of(call.id), Some(Type::Nil));
    }

    #[test]
    fn requires_main_returning_integer() {
        let err = analyze("FUN helper(): Integer DO RETURN 1; END")
            .expect_err("expected analysis failure");
        assert_eq!(err, SemanticError::MissingMain);
    }

    #[test]
    fn rejects_main_with_wrong_return_type() {
        let err = analyze("FUN main() DO END").expect_err("expected analysis failure");
        assert_eq!(err, SemanticError::MainReturnType { found: Type::Nil });
    }

    #[test]
    fn checks_return_values_against_the_function() {
        let err = analyze("FUN main(): Integer DO RETURN \"zero\"; END")
            .expect_err("expected analysis failure");
        assert_eq!(
            err,
            SemanticError::NotAssignable {
                target: Type::Integer,
                actual: Type::String
            }
        );
    }

    #[test]
    fn allows_self_recursion() {
        let input = indoc! {"
            FUN fact(n: Integer): Integer DO
                IF n < 2 DO
                    RETURN 1;
                END
                RETURN n * fact(n - 1);
            END
            FUN main(): Integer DO RETURN fact(5); END
        "};
        analyze(input).expect("analysis failed");
    }

    #[test]
    fn list_global_checks_elements_against_its_type() {
        analyze(indoc! {"
            LIST list: Integer = [1, 5, 10];
            FUN main(): Integer DO RETURN list[1]; END
        "})
        .expect("analysis failed");

        let err = analyze(indoc! {"
            LIST list: Integer = [1, 2.0];
            FUN main(): Integer DO RETURN 0; END
        "})
        .expect_err("expected analysis failure");
        assert_eq!(
            err,
            SemanticError::NotAssignable {
                target: Type::Integer,
                actual: Type::Decimal
            }
        );
    }

    #[test]
    fn infers_untyped_globals_and_rejects_missing_types() {
        analyze(indoc! {"
            VAR count = 1;
            FUN main(): Integer DO RETURN count; END
        "})
        .expect("analysis failed");

        let err = analyze("VAR count; FUN main(): Integer DO RETURN 0; END")
            .expect_err("expected analysis failure");
        assert_eq!(err, SemanticError::MissingType { name: "count".into() });
    }

    #[test]
    fn rejects_unknown_type_names() {
        let err = analyze("VAR x: Float = 1.0; FUN main(): Integer DO RETURN 0; END")
            .expect_err("expected analysis failure");
        assert_eq!(err, SemanticError::UnknownType { name: "Float".into() });
    }

    #[test]
    fn expression_statements_must_be_calls() {
        let err = analyze("VAR x: Integer = 1; FUN main(): Integer DO x + 1; RETURN 0; END")
            .expect_err("expected analysis failure");
        assert_eq!(err, SemanticError::ExpressionStatement);
    }

    #[test]
    fn rejects_assignment_to_immutable_values() {
        let err = analyze("VAL x: Integer = 1; FUN main(): Integer DO x = 2; RETURN x; END")
            .expect_err("expected analysis failure");
        assert_eq!(err, SemanticError::ImmutableAssignment { name: "x".into() });
    }

    #[test]
    fn conditions_must_be_boolean() {
        let err = analyze("FUN main(): Integer DO WHILE 1 DO END RETURN 0; END")
            .expect_err("expected analysis failure");
        assert_eq!(
            err,
            SemanticError::ConditionType {
                construct: "WHILE",
                found: Type::Integer
            }
        );
    }

    #[test]
    fn rejects_empty_then_block() {
        let err = analyze("FUN main(): Integer DO IF TRUE DO ELSE print(1); END RETURN 0; END")
            .expect_err("expected analysis failure");
        assert_eq!(err, SemanticError::EmptyIfBlock);
    }

    #[test]
    fn case_values_must_match_the_condition() {
        let err = analyze(indoc! {"
            FUN main(): Integer DO
                SWITCH 'y'
                    CASE 1: print(1);
                    DEFAULT print(2);
                END
                RETURN 0;
            END
        "})
        .expect_err("expected analysis failure");
        assert_eq!(
            err,
            SemanticError::CaseType {
                expected: Type::Character,
                found: Type::Integer
            }
        );
    }

    #[test]
    fn block_declarations_do_not_leak() {
        let err = analyze(indoc! {"
            FUN main(): Integer DO
                IF TRUE DO
                    LET inner = 1;
                END
                RETURN inner;
            END
        "})
        .expect_err("expected analysis failure");
        assert_eq!(err, SemanticError::UndefinedVariable { name: "inner".into() });

        let err = analyze(indoc! {"
            FUN main(): Integer DO
                SWITCH 1
                    CASE 1:
                        LET inner = 5;
                    DEFAULT
                        print(0);
                END
                RETURN inner;
            END
        "})
        .expect_err("expected analysis failure");
        assert_eq!(err, SemanticError::UndefinedVariable { name: "inner".into() });
    }

    #[test]
    fn rejects_redefinition_in_one_scope() {
        let err = analyze("FUN main(): Integer DO LET x = 1; LET x = 2; RETURN x; END")
            .expect_err("expected analysis failure");
        assert!(matches!(err, SemanticError::Redefinition(_)));
        assert_eq!(err.to_string(), "Variable 'x' is already defined in this scope");
    }

    #[test]
    fn bounds_numeric_literals() {
        assert_eq!(analyze_expression("2147483647"), Ok(Type::Integer));
        assert_eq!(analyze_expression("-2147483648"), Ok(Type::Integer));
        assert_eq!(
            analyze_expression("99999999999"),
            Err(SemanticError::IntegerOutOfRange {
                value: "99999999999".into()
            })
        );
        assert_eq!(analyze_expression("0.1"), Ok(Type::Decimal));
        let huge = format!("1{}.0", "0".repeat(400));
        assert!(matches!(
            analyze_expression(&huge),
            Err(SemanticError::DecimalOutOfRange { .. })
        ));
    }

    #[test]
    fn types_binary_operators() {
        assert_eq!(analyze_expression("TRUE && FALSE"), Ok(Type::Boolean));
        assert_eq!(analyze_expression("num < 10"), Ok(Type::Boolean));
        assert_eq!(analyze_expression("name + 1"), Ok(Type::String));
        assert_eq!(analyze_expression("1.5 / 0.5"), Ok(Type::Decimal));
        assert_eq!(analyze_expression("2.0 ^ 3"), Ok(Type::Decimal));
        assert_eq!(analyze_expression("num ^ 2"), Ok(Type::Integer));
        assert_eq!(
            analyze_expression("1 + 1.0"),
            Err(SemanticError::InvalidOperands {
                operator: BinaryOperator::Add,
                left: Type::Integer,
                right: Type::Decimal
            })
        );
        assert_eq!(
            analyze_expression("1 == 'a'"),
            Err(SemanticError::InvalidOperands {
                operator: BinaryOperator::Equal,
                left: Type::Integer,
                right: Type::Character
            })
        );
        assert_eq!(
            analyze_expression("TRUE == TRUE"),
            Err(SemanticError::NotAssignable {
                target: Type::Comparable,
                actual: Type::Boolean
            })
        );
    }

    #[test]
    fn group_must_wrap_a_binary_expression() {
        assert_eq!(analyze_expression("(num + 1)"), Ok(Type::Integer));
        assert_eq!(analyze_expression("(num)"), Err(SemanticError::GroupNotBinary));
    }

    #[test]
    fn checks_call_arguments_and_offsets() {
        assert_eq!(analyze_expression("print(num)"), Ok(Type::Nil));
        assert_eq!(
            analyze_expression("print(num, num)"),
            Err(SemanticError::UndefinedFunction {
                name: "print".into(),
                arity: 2
            })
        );
        assert_eq!(
            analyze_expression("num['a']"),
            Err(SemanticError::OffsetType {
                found: Type::Character
            })
        );
    }
}
