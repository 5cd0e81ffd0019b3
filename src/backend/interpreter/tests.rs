use std::str::FromStr;

use bigdecimal::BigDecimal;
use indoc::indoc;
use num_bigint::BigInt;

use super::*;
use crate::ast::{BinaryOperator, Declaration, Literal};
use crate::environment::Value;
use crate::lexer::tokenize;
use crate::parser::Parser;

fn parser(input: &str) -> Parser {
    Parser::new(tokenize(input).expect("tokenize should succeed"))
}

fn interpreter() -> Interpreter<Vec<u8>> {
    Interpreter::with_output(Vec::new())
}

fn run_program(input: &str) -> (RuntimeResult<PlcObject>, String) {
    let source = parser(input).parse_source().expect("parse should succeed");
    let mut interpreter = interpreter();
    let result = interpreter.run(&source);
    let output = String::from_utf8(interpreter.into_output()).expect("utf-8 output");
    (result, output)
}

fn execute_statements(interpreter: &mut Interpreter<Vec<u8>>, input: &str) -> RuntimeResult<()> {
    let mut parser = parser(input);
    while !parser.is_done() {
        let statement = parser.parse_statement().expect("parse should succeed");
        interpreter.execute(&statement)?;
    }
    Ok(())
}

fn evaluate(input: &str) -> RuntimeResult<PlcObject> {
    let expression = parser(input)
        .parse_expression()
        .expect("parse should succeed");
    interpreter().evaluate(&expression)
}

fn decimal(text: &str) -> PlcObject {
    PlcObject::decimal(BigDecimal::from_str(text).expect("decimal"))
}

fn integer(value: i64) -> Expression {
    Expression::literal(Literal::Integer(BigInt::from(value)))
}

#[test]
fn returns_main_result() {
    let (result, output) = run_program("FUN main() DO RETURN 0; END");
    assert_eq!(result, Ok(PlcObject::integer(0)));
    assert!(output.is_empty());
}

#[test]
fn main_without_return_yields_nil() {
    let (result, _) = run_program(indoc! {"
        VAR x: Integer = 1;
        VAR y: Integer = 10;
        FUN main() DO
            x + y;
        END
    "});
    assert_eq!(result, Ok(PlcObject::nil()));
}

#[test]
fn reads_and_replaces_list_elements() {
    let (result, output) = run_program(indoc! {"
        LIST list: Integer = [1, 5, 10];
        FUN main(): Integer DO
            print(list[1]);
            list[2] = 3;
            print(list);
            RETURN list[1];
        END
    "});
    assert_eq!(result, Ok(PlcObject::integer(5)));
    assert_eq!(output, "5\n[1, 5, 3]\n");
}

#[test]
fn switch_runs_the_first_matching_case() {
    let mut interpreter = interpreter();
    interpreter
        .define_variable(Variable::new("letter", Type::Character, true, PlcObject::character('y')))
        .expect("define letter");
    execute_statements(
        &mut interpreter,
        indoc! {"
            SWITCH letter
                CASE 'y':
                    print(\"yes\");
                    letter = 'n';
                DEFAULT
                    print(\"no\");
            END
        "},
    )
    .expect("execution failed");
    assert_eq!(
        interpreter.lookup_variable("letter").map(|v| v.value.clone()),
        Some(PlcObject::character('n'))
    );
    assert_eq!(interpreter.output(), b"yes\n");
}

#[test]
fn switch_falls_back_to_default() {
    let mut interpreter = interpreter();
    execute_statements(
        &mut interpreter,
        indoc! {"
            SWITCH 3
                CASE 1: print(\"one\");
                CASE 2: print(\"two\");
                DEFAULT print(\"many\");
            END
        "},
    )
    .expect("execution failed");
    assert_eq!(interpreter.output(), b"many\n");
}

#[test]
fn while_loops_until_condition_is_false() {
    let mut interpreter = interpreter();
    interpreter
        .define_variable(Variable::new("num", Type::Integer, true, PlcObject::integer(0)))
        .expect("define num");
    execute_statements(&mut interpreter, "WHILE num < 10 DO num = num + 1; END")
        .expect("execution failed");
    assert_eq!(
        interpreter.lookup_variable("num").map(|v| v.value.clone()),
        Some(PlcObject::integer(10))
    );
}

#[test]
fn calls_declared_functions_with_arguments() {
    let (result, _) = run_program(indoc! {"
        FUN square(x: Integer): Integer DO
            RETURN x * x;
        END
        FUN main(): Integer DO
            RETURN square(10);
        END
    "});
    assert_eq!(result, Ok(PlcObject::integer(100)));
}

#[test]
fn return_unwinds_nested_blocks_once() {
    let (result, output) = run_program(indoc! {"
        FUN find(): Integer DO
            LET i = 0;
            WHILE TRUE DO
                IF i == 3 DO
                    RETURN i;
                END
                i = i + 1;
            END
        END
        FUN main(): Integer DO
            print(find());
            RETURN 1;
        END
    "});
    assert_eq!(result, Ok(PlcObject::integer(1)));
    assert_eq!(output, "3\n");
}

#[test]
fn recursion_builds_independent_frames() {
    let (result, _) = run_program(indoc! {"
        FUN fact(n: Integer): Integer DO
            IF n < 2 DO
                RETURN 1;
            END
            RETURN n * fact(n - 1);
        END
        FUN main(): Integer DO RETURN fact(10); END
    "});
    assert_eq!(result, Ok(PlcObject::integer(3_628_800)));
}

#[test]
fn functions_see_their_closure_not_the_caller() {
    let (result, _) = run_program(indoc! {"
        FUN peek(): Integer DO RETURN secret; END
        FUN main(): Integer DO
            LET secret = 1;
            RETURN peek();
        END
    "});
    assert_eq!(
        result,
        Err(RuntimeError::UndefinedVariable {
            name: "secret".into()
        })
    );
}

#[test]
fn logical_operators_short_circuit() {
    assert_eq!(evaluate("FALSE && undefinedFn()"), Ok(PlcObject::boolean(false)));
    assert_eq!(evaluate("TRUE || undefinedFn()"), Ok(PlcObject::boolean(true)));
    assert_eq!(
        evaluate("TRUE && undefinedFn()"),
        Err(RuntimeError::UndefinedFunction {
            name: "undefinedFn".into(),
            arity: 0
        })
    );
}

#[test]
fn block_scopes_are_discarded() {
    let mut interpreter = interpreter();
    interpreter
        .define_variable(Variable::new("x", Type::Integer, true, PlcObject::integer(1)))
        .expect("define x");
    execute_statements(
        &mut interpreter,
        indoc! {"
            IF TRUE DO
                LET x = 2;
                LET inner = 3;
            END
            WHILE x < 2 DO
                LET looped = 4;
                x = x + 1;
            END
            SWITCH x
                CASE 2:
                    LET matched = 5;
                DEFAULT
                    LET fallback = 6;
            END
        "},
    )
    .expect("execution failed");
    assert_eq!(
        interpreter.lookup_variable("x").map(|v| v.value.clone()),
        Some(PlcObject::integer(2))
    );
    assert!(interpreter.lookup_variable("inner").is_none());
    assert!(interpreter.lookup_variable("looped").is_none());
    assert!(interpreter.lookup_variable("matched").is_none());
    assert!(interpreter.lookup_variable("fallback").is_none());
}

#[test]
fn list_aliases_share_storage() {
    let mut interpreter = interpreter();
    let list = PlcObject::list(vec![PlcObject::integer(1), PlcObject::integer(2)]);
    interpreter
        .define_variable(Variable::new("list", Type::Integer, true, list.clone()))
        .expect("define list");
    execute_statements(&mut interpreter, "LET alias = list; alias[0] = 9;")
        .expect("execution failed");
    assert_eq!(list.to_string(), "[9, 2]");
}

#[test]
fn evaluates_arithmetic() {
    assert_eq!(evaluate("1 + 2 * 3"), Ok(PlcObject::integer(7)));
    assert_eq!(evaluate("-7 / 2"), Ok(PlcObject::integer(-3)));
    assert_eq!(evaluate("2 ^ 10"), Ok(PlcObject::integer(1024)));
    assert_eq!(evaluate("1.2 / 3.4"), Ok(decimal("0.4")));
    assert_eq!(evaluate("2.5 / 1.0"), Ok(decimal("2.5")));
    assert_eq!(evaluate("1.5 + 2.25"), Ok(decimal("3.75")));
    assert_eq!(evaluate("\"a\" + \"b\""), Ok(PlcObject::string("ab")));
}

#[test]
fn decimal_division_rounds_half_to_even() {
    assert_eq!(evaluate("0.5 / 2.0"), Ok(decimal("0.2")));
    assert_eq!(evaluate("1.5 / 2.0"), Ok(decimal("0.8")));
}

#[test]
fn evaluates_comparisons() {
    assert_eq!(evaluate("1 < 2"), Ok(PlcObject::boolean(true)));
    assert_eq!(evaluate("'b' > 'a'"), Ok(PlcObject::boolean(true)));
    assert_eq!(evaluate("\"abc\" < \"abd\""), Ok(PlcObject::boolean(true)));
    assert_eq!(evaluate("1 == 1"), Ok(PlcObject::boolean(true)));
    assert_eq!(evaluate("1 != 1.0"), Ok(PlcObject::boolean(true)));
}

#[test]
fn operand_mismatch_is_a_runtime_error() {
    assert_eq!(
        evaluate("1 + 1.0"),
        Err(RuntimeError::InvalidOperands {
            operator: BinaryOperator::Add,
            left: "Integer",
            right: "Decimal"
        })
    );
    assert_eq!(
        evaluate("1 < 'a'"),
        Err(RuntimeError::InvalidOperands {
            operator: BinaryOperator::Less,
            left: "Integer",
            right: "Character"
        })
    );
    assert_eq!(
        evaluate("2.0 ^ 2"),
        Err(RuntimeError::InvalidOperands {
            operator: BinaryOperator::Power,
            left: "Decimal",
            right: "Integer"
        })
    );
}

#[test]
fn concatenation_requires_two_strings() {
    assert_eq!(
        evaluate("\"a\" + 1"),
        Err(RuntimeError::InvalidOperands {
            operator: BinaryOperator::Add,
            left: "String",
            right: "Integer"
        })
    );
    assert_eq!(
        evaluate("1 + \"a\""),
        Err(RuntimeError::InvalidOperands {
            operator: BinaryOperator::Add,
            left: "Integer",
            right: "String"
        })
    );
    assert_eq!(
        evaluate("'!' + \"x\""),
        Err(RuntimeError::InvalidOperands {
            operator: BinaryOperator::Add,
            left: "Character",
            right: "String"
        })
    );
}

#[test]
fn rejects_invalid_arithmetic() {
    assert_eq!(evaluate("1 / 0"), Err(RuntimeError::DivisionByZero));
    assert_eq!(evaluate("1.0 / 0.0"), Err(RuntimeError::DivisionByZero));
    assert_eq!(
        evaluate("2 ^ -1"),
        Err(RuntimeError::InvalidExponent {
            exponent: "-1".into()
        })
    );
}

#[test]
fn conditions_must_be_boolean_at_runtime() {
    let mut interpreter = interpreter();
    let err = execute_statements(&mut interpreter, "IF 1 DO print(1); END")
        .expect_err("expected runtime failure");
    assert_eq!(err, RuntimeError::ExpectedBoolean { found: "Integer" });
    assert_eq!(
        evaluate("1 && TRUE"),
        Err(RuntimeError::ExpectedBoolean { found: "Integer" })
    );
}

#[test]
fn list_access_is_bounds_checked() {
    let mut interpreter = interpreter();
    let list = PlcObject::list(vec![PlcObject::integer(1)]);
    interpreter
        .define_variable(Variable::new("list", Type::Integer, true, list))
        .expect("define list");
    interpreter
        .define_variable(Variable::new("n", Type::Integer, true, PlcObject::integer(1)))
        .expect("define n");

    let err = execute_statements(&mut interpreter, "list[1] = 2;")
        .expect_err("expected runtime failure");
    assert_eq!(
        err,
        RuntimeError::IndexOutOfBounds {
            index: "1".into(),
            len: 1
        }
    );
    let err = execute_statements(&mut interpreter, "print(list[-1]);")
        .expect_err("expected runtime failure");
    assert_eq!(
        err,
        RuntimeError::IndexOutOfBounds {
            index: "-1".into(),
            len: 1
        }
    );
    let err = execute_statements(&mut interpreter, "print(n[0]);")
        .expect_err("expected runtime failure");
    assert_eq!(err, RuntimeError::ExpectedList { name: "n".into() });
    let err = execute_statements(&mut interpreter, "print(list[TRUE]);")
        .expect_err("expected runtime failure");
    assert_eq!(err, RuntimeError::ExpectedInteger { found: "Boolean" });
}

#[test]
fn assignment_respects_mutability_and_targets() {
    let mut interpreter = interpreter();
    interpreter
        .define_variable(Variable::new("fixed", Type::Integer, false, PlcObject::integer(1)))
        .expect("define fixed");
    let err = execute_statements(&mut interpreter, "fixed = 2;")
        .expect_err("expected runtime failure");
    assert_eq!(
        err,
        RuntimeError::ImmutableAssignment {
            name: "fixed".into()
        }
    );

    let statement = Statement::Assignment {
        receiver: integer(1),
        value: integer(2),
    };
    assert_eq!(
        interpreter.execute(&statement),
        Err(RuntimeError::InvalidAssignmentTarget)
    );
}

#[test]
fn redefinition_in_one_scope_fails() {
    let mut interpreter = interpreter();
    let declaration = Statement::Declaration(Declaration::new("x", None, Some(integer(1))));
    interpreter.execute(&declaration).expect("first declaration");
    let err = interpreter
        .execute(&declaration)
        .expect_err("expected redefinition failure");
    assert!(matches!(err, RuntimeError::Redefinition(_)));
}

#[test]
fn declaration_without_value_binds_nil() {
    let mut interpreter = interpreter();
    execute_statements(&mut interpreter, "LET empty;").expect("execution failed");
    let variable = interpreter.lookup_variable("empty").expect("declared");
    assert_eq!(variable.value, PlcObject::nil());
    assert!(variable.mutable);
}

#[test]
fn errors_on_return_outside_function() {
    let mut interpreter = interpreter();
    assert_eq!(
        interpreter.execute(&Statement::Return(integer(1))),
        Err(RuntimeError::ReturnOutsideFunction)
    );
}

#[test]
fn errors_on_missing_main() {
    let (result, _) = run_program("FUN helper() DO END");
    assert_eq!(
        result,
        Err(RuntimeError::UndefinedFunction {
            name: "main".into(),
            arity: 0
        })
    );
}

#[test]
fn native_functions_receive_evaluated_arguments() {
    let mut interpreter = interpreter();
    interpreter
        .define_function(Function::native(
            "double",
            vec![Type::Integer],
            Type::Integer,
            |arguments| match arguments.first().map(|argument| &argument.value) {
                Some(Value::Integer(value)) => Ok(PlcObject::integer(value * BigInt::from(2))),
                _ => Err("expected an integer".to_string()),
            },
        ))
        .expect("define double");

    let result = interpreter.evaluate(&Expression::function("double", vec![integer(21)]));
    assert_eq!(result, Ok(PlcObject::integer(42)));

    let err = interpreter
        .invoke("double", vec![PlcObject::string("x")])
        .expect_err("expected native failure");
    assert_eq!(
        err,
        RuntimeError::Native {
            name: "double".into(),
            message: "expected an integer".into()
        }
    );
}

#[test]
fn print_renders_runtime_values() {
    let mut interpreter = interpreter();
    execute_statements(
        &mut interpreter,
        indoc! {"
            print(NIL);
            print(TRUE);
            print(2.50);
            print('c');
            print(\"tab\\there\");
        "},
    )
    .expect("execution failed");
    let output = String::from_utf8(interpreter.into_output()).expect("utf-8 output");
    assert_eq!(output, "null\ntrue\n2.50\nc\ntab\there\n");
}
