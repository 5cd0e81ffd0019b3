use tracing::debug;

use crate::analyzer::Annotations;
use crate::ast::{
    BinaryOperator, Case, Declaration, Expression, ExpressionKind, Function, Global, Literal,
    Source, Statement,
};
use crate::environment::Type;

mod error;

pub use error::{GenerateResult, GeneratorError};

/// Emits a Java translation of an analyzed program.
///
/// The whole program becomes `class Main`; globals turn into fields and a
/// synthetic `main(String[])` exits with the value of the program's `main()`.
pub struct Generator<'a> {
    annotations: &'a Annotations,
}

impl<'a> Generator<'a> {
    pub fn new(annotations: &'a Annotations) -> Self {
        Self { annotations }
    }

    pub fn generate(&self, source: &Source) -> GenerateResult<String> {
        let mut output = String::new();
        self.push_line(&mut output, 0, "public class Main {");
        output.push('\n');

        for global in &source.globals {
            let line = self.emit_global(global)?;
            self.push_line(&mut output, 1, &line);
        }
        if !source.globals.is_empty() {
            output.push('\n');
        }

        self.push_line(&mut output, 1, "public static void main(String[] args) {");
        self.push_line(&mut output, 2, "System.exit(new Main().main());");
        self.push_line(&mut output, 1, "}");

        for function in &source.functions {
            output.push('\n');
            self.emit_function(function, 1, &mut output)?;
        }

        output.push('\n');
        self.push_line(&mut output, 0, "}");
        debug!(bytes = output.len(), "generated java source");
        Ok(output)
    }

    fn emit_global(&self, global: &Global) -> GenerateResult<String> {
        let variable =
            self.annotations
                .variable(global.id)
                .ok_or_else(|| GeneratorError::MissingVariable {
                    name: global.name.clone(),
                })?;
        let qualifier = if global.mutable { "" } else { "final " };
        let suffix = match &global.value {
            Some(Expression {
                kind: ExpressionKind::List(_),
                ..
            }) => "[]",
            _ => "",
        };
        let mut line = format!(
            "{qualifier}{}{suffix} {}",
            variable.ty.host_name(),
            variable.host_name
        );
        if let Some(value) = &global.value {
            line.push_str(" = ");
            line.push_str(&self.emit_expression(value)?);
        }
        line.push(';');
        Ok(line)
    }

    fn emit_function(
        &self,
        function: &Function,
        indent: usize,
        output: &mut String,
    ) -> GenerateResult<()> {
        let signature =
            self.annotations
                .function(function.id)
                .ok_or_else(|| GeneratorError::MissingFunction {
                    name: function.name.clone(),
                })?;
        let parameters = function
            .parameters
            .iter()
            .zip(&signature.parameter_types)
            .map(|(name, ty)| format!("{} {name}", ty.host_name()))
            .collect::<Vec<_>>()
            .join(", ");
        let header = format!(
            "{} {}({parameters}) {{",
            signature.return_type.host_name(),
            signature.host_name
        );
        if function.statements.is_empty() {
            self.push_line(output, indent, &format!("{header}}}"));
            return Ok(());
        }
        self.push_line(output, indent, &header);
        self.emit_block(&function.statements, indent + 1, output)?;
        self.push_line(output, indent, "}");
        Ok(())
    }

    fn emit_block(
        &self,
        statements: &[Statement],
        indent: usize,
        output: &mut String,
    ) -> GenerateResult<()> {
        for statement in statements {
            self.emit_statement(statement, indent, output)?;
        }
        Ok(())
    }

    fn emit_statement(
        &self,
        statement: &Statement,
        indent: usize,
        output: &mut String,
    ) -> GenerateResult<()> {
        match statement {
            Statement::Expression(expression) => {
                let expression = self.emit_expression(expression)?;
                self.push_line(output, indent, &format!("{expression};"));
            }
            Statement::Declaration(declaration) => {
                let line = self.emit_declaration(declaration)?;
                self.push_line(output, indent, &line);
            }
            Statement::Assignment { receiver, value } => {
                let receiver = self.emit_expression(receiver)?;
                let value = self.emit_expression(value)?;
                self.push_line(output, indent, &format!("{receiver} = {value};"));
            }
            Statement::If {
                condition,
                then_statements,
                else_statements,
            } => {
                let condition = self.emit_expression(condition)?;
                self.push_line(output, indent, &format!("if ({condition}) {{"));
                self.emit_block(then_statements, indent + 1, output)?;
                if else_statements.is_empty() {
                    self.push_line(output, indent, "}");
                } else {
                    self.push_line(output, indent, "} else {");
                    self.emit_block(else_statements, indent + 1, output)?;
                    self.push_line(output, indent, "}");
                }
            }
            Statement::Switch { condition, cases } => {
                let condition = self.emit_expression(condition)?;
                self.push_line(output, indent, &format!("switch ({condition}) {{"));
                for case in cases {
                    self.emit_case(case, indent + 1, output)?;
                }
                self.push_line(output, indent, "}");
            }
            Statement::While {
                condition,
                statements,
            } => {
                let condition = self.emit_expression(condition)?;
                if statements.is_empty() {
                    self.push_line(output, indent, &format!("while ({condition}) {{}}"));
                } else {
                    self.push_line(output, indent, &format!("while ({condition}) {{"));
                    self.emit_block(statements, indent + 1, output)?;
                    self.push_line(output, indent, "}");
                }
            }
            Statement::Return(value) => {
                let value = self.emit_expression(value)?;
                self.push_line(output, indent, &format!("return {value};"));
            }
        }
        Ok(())
    }

    fn emit_declaration(&self, declaration: &Declaration) -> GenerateResult<String> {
        let variable = self.annotations.variable(declaration.id).ok_or_else(|| {
            GeneratorError::MissingVariable {
                name: declaration.name.clone(),
            }
        })?;
        let target = format!("{} {}", variable.ty.host_name(), variable.host_name);
        Ok(match &declaration.value {
            Some(value) => format!("{target} = {};", self.emit_expression(value)?),
            None => format!("{target};"),
        })
    }

    /// Non-default arms end with an explicit `break`.
    fn emit_case(&self, case: &Case, indent: usize, output: &mut String) -> GenerateResult<()> {
        match &case.value {
            Some(value) => {
                let value = self.emit_expression(value)?;
                self.push_line(output, indent, &format!("case {value}:"));
                self.emit_block(&case.statements, indent + 1, output)?;
                self.push_line(output, indent + 1, "break;");
            }
            None => {
                self.push_line(output, indent, "default:");
                self.emit_block(&case.statements, indent + 1, output)?;
            }
        }
        Ok(())
    }

    fn emit_expression(&self, expression: &Expression) -> GenerateResult<String> {
        match &expression.kind {
            ExpressionKind::Literal(literal) => Ok(emit_literal(literal)),
            ExpressionKind::Group(inner) => Ok(format!("({})", self.emit_expression(inner)?)),
            ExpressionKind::Binary {
                operator: BinaryOperator::Power,
                left,
                right,
            } => {
                let ty = self
                    .annotations
                    .type_of(expression.id)
                    .ok_or(GeneratorError::MissingType {
                        node: "power expression",
                    })?;
                let left = self.emit_expression(left)?;
                let right = self.emit_expression(right)?;
                Ok(if ty == Type::Integer {
                    format!("(int) Math.pow({left}, {right})")
                } else {
                    format!("Math.pow({left}, {right})")
                })
            }
            ExpressionKind::Binary {
                operator,
                left,
                right,
            } => {
                let left = self.emit_expression(left)?;
                let right = self.emit_expression(right)?;
                Ok(format!("{left} {operator} {right}"))
            }
            ExpressionKind::Access { name, offset } => {
                let variable = self.annotations.variable(expression.id).ok_or_else(|| {
                    GeneratorError::MissingVariable { name: name.clone() }
                })?;
                match offset {
                    Some(offset) => Ok(format!(
                        "{}[{}]",
                        variable.host_name,
                        self.emit_expression(offset)?
                    )),
                    None => Ok(variable.host_name.clone()),
                }
            }
            ExpressionKind::Function { name, arguments } => {
                let function = self.annotations.function(expression.id).ok_or_else(|| {
                    GeneratorError::MissingFunction { name: name.clone() }
                })?;
                let arguments = self.emit_expressions(arguments)?;
                Ok(format!("{}({arguments})", function.host_name))
            }
            ExpressionKind::List(values) => Ok(format!("{{{}}}", self.emit_expressions(values)?)),
        }
    }

    fn emit_expressions(&self, expressions: &[Expression]) -> GenerateResult<String> {
        let rendered = expressions
            .iter()
            .map(|expression| self.emit_expression(expression))
            .collect::<GenerateResult<Vec<_>>>()?;
        Ok(rendered.join(", "))
    }

    fn push_line(&self, output: &mut String, indent: usize, line: &str) {
        for _ in 0..indent {
            output.push_str("    ");
        }
        output.push_str(line);
        output.push('\n');
    }
}

fn emit_literal(literal: &Literal) -> String {
    match literal {
        Literal::Nil => "null".to_string(),
        Literal::Boolean(value) => value.to_string(),
        Literal::Integer(value) => value.to_string(),
        Literal::Decimal(value) => value.to_string(),
        Literal::Character(value) => format!("'{}'", escape_java(&value.to_string(), '\'')),
        Literal::String(value) => format!("\"{}\"", escape_java(value, '"')),
    }
}

fn escape_java(text: &str, quote: char) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{8}' => escaped.push_str("\\b"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\\' => escaped.push_str("\\\\"),
            c if c == quote => {
                escaped.push('\\');
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }
    escaped
}
