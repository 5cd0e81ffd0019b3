use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::ast::{
    BinaryOperator, Case, Declaration, Expression, Function, Global, Literal, Source, Statement,
};
use crate::lexer::{Token, TokenKind};

mod error;

pub use error::{ParseError, ParseResult};

/// Recursive-descent parser over a lexed token list.
///
/// Every `parse_*` method corresponds to one grammar rule and may be called
/// directly. Errors are located just past the last consumed token.
pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    /// True once every token has been consumed.
    pub fn is_done(&self) -> bool {
        !self.has(0)
    }

    pub fn parse_source(&mut self) -> ParseResult<Source> {
        let mut source = Source::default();
        while self.has(0) {
            if self.peek_any(&["LIST", "VAR", "VAL"]) {
                source.globals.push(self.parse_global()?);
            } else if self.peek_literal("FUN") {
                source.functions.push(self.parse_function()?);
            } else {
                return Err(self.error("Expected LIST, VAL, VAR, or FUN"));
            }
        }
        Ok(source)
    }

    pub fn parse_global(&mut self) -> ParseResult<Global> {
        let global = if self.match_literal("LIST") {
            self.parse_list()?
        } else if self.match_literal("VAR") {
            self.parse_mutable()?
        } else if self.match_literal("VAL") {
            self.parse_immutable()?
        } else {
            return Err(self.error("Expected LIST, VAL, or VAR"));
        };
        self.expect_literal(";", "Expected ';' after global")?;
        Ok(global)
    }

    /// `LIST name: Type = [ expr (, expr)* ]`, after the `LIST` keyword.
    pub fn parse_list(&mut self) -> ParseResult<Global> {
        let name = self.expect_identifier("Expected list name")?;
        self.expect_literal(":", "Expected ':' after list name")?;
        let type_name = self.expect_identifier("Expected list element type")?;
        self.expect_literal("=", "Expected '=' in list declaration")?;
        self.expect_literal("[", "Expected '[' to open list literal")?;
        let values = self.parse_separated("]", "Expected ']' to close list literal")?;
        Ok(Global::new(
            name,
            Some(type_name),
            true,
            Some(Expression::list(values)),
        ))
    }

    /// `VAR name [: Type] [= expr]`, after the `VAR` keyword.
    pub fn parse_mutable(&mut self) -> ParseResult<Global> {
        let name = self.expect_identifier("Expected variable name")?;
        let type_name = self.parse_type_annotation()?;
        let value = if self.match_literal("=") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(Global::new(name, type_name, true, value))
    }

    /// `VAL name [: Type] = expr`, after the `VAL` keyword.
    pub fn parse_immutable(&mut self) -> ParseResult<Global> {
        let name = self.expect_identifier("Expected value name")?;
        let type_name = self.parse_type_annotation()?;
        self.expect_literal("=", "Expected '=' in immutable declaration")?;
        let value = self.parse_expression()?;
        Ok(Global::new(name, type_name, false, Some(value)))
    }

    pub fn parse_function(&mut self) -> ParseResult<Function> {
        self.expect_literal("FUN", "Expected FUN")?;
        let name = self.expect_identifier("Expected function name")?;
        self.expect_literal("(", "Expected '(' after function name")?;
        let mut parameters = Vec::new();
        if !self.match_literal(")") {
            loop {
                let parameter = self.expect_identifier("Expected parameter name")?;
                self.expect_literal(":", "Expected ':' after parameter name")?;
                let type_name = self.expect_identifier("Expected parameter type")?;
                parameters.push((parameter, type_name));
                if self.match_literal(")") {
                    break;
                }
                self.expect_literal(",", "Expected ',' or ')' in parameter list")?;
            }
        }
        let return_type_name = self.parse_type_annotation()?;
        self.expect_literal("DO", "Expected DO")?;
        let statements = self.parse_block()?;
        self.expect_literal("END", "Expected END")?;
        Ok(Function::new(name, parameters, return_type_name, statements))
    }

    /// Statements up to (not including) `END`, `ELSE`, `CASE` or `DEFAULT`.
    pub fn parse_block(&mut self) -> ParseResult<Vec<Statement>> {
        let mut statements = Vec::new();
        while !self.peek_any(&["END", "ELSE", "CASE", "DEFAULT"]) {
            if !self.has(0) {
                return Err(self.error("Expected END"));
            }
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    pub fn parse_statement(&mut self) -> ParseResult<Statement> {
        if self.peek_literal("LET") {
            return self.parse_declaration_statement();
        }
        if self.peek_literal("IF") {
            return self.parse_if_statement();
        }
        if self.peek_literal("SWITCH") {
            return self.parse_switch_statement();
        }
        if self.peek_literal("WHILE") {
            return self.parse_while_statement();
        }
        if self.peek_literal("RETURN") {
            return self.parse_return_statement();
        }

        let receiver = self.parse_expression()?;
        if self.match_literal("=") {
            let value = self.parse_expression()?;
            self.expect_literal(";", "Expected ';' after assignment")?;
            return Ok(Statement::Assignment { receiver, value });
        }
        self.expect_literal(";", "Expected ';' after expression")?;
        Ok(Statement::Expression(receiver))
    }

    pub fn parse_declaration_statement(&mut self) -> ParseResult<Statement> {
        self.expect_literal("LET", "Expected LET")?;
        let name = self.expect_identifier("Expected variable name")?;
        let type_name = self.parse_type_annotation()?;
        let value = if self.match_literal("=") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect_literal(";", "Expected ';' after declaration")?;
        Ok(Statement::Declaration(Declaration::new(name, type_name, value)))
    }

    pub fn parse_if_statement(&mut self) -> ParseResult<Statement> {
        self.expect_literal("IF", "Expected IF")?;
        let condition = self.parse_expression()?;
        self.expect_literal("DO", "Expected DO after IF condition")?;
        let then_statements = self.parse_block()?;
        let else_statements = if self.match_literal("ELSE") {
            self.parse_block()?
        } else {
            Vec::new()
        };
        self.expect_literal("END", "Expected END to close IF")?;
        Ok(Statement::If {
            condition,
            then_statements,
            else_statements,
        })
    }

    pub fn parse_switch_statement(&mut self) -> ParseResult<Statement> {
        self.expect_literal("SWITCH", "Expected SWITCH")?;
        let condition = self.parse_expression()?;
        let mut cases = Vec::new();
        while self.peek_literal("CASE") {
            cases.push(self.parse_case_statement()?);
        }
        cases.push(self.parse_case_statement()?);
        self.expect_literal("END", "Expected END to close SWITCH")?;
        Ok(Statement::Switch { condition, cases })
    }

    /// One `CASE value:` arm or the closing `DEFAULT` arm.
    pub fn parse_case_statement(&mut self) -> ParseResult<Case> {
        if self.match_literal("CASE") {
            let value = self.parse_expression()?;
            self.expect_literal(":", "Expected ':' after CASE value")?;
            let statements = self.parse_block()?;
            return Ok(Case {
                value: Some(value),
                statements,
            });
        }
        self.expect_literal("DEFAULT", "Expected DEFAULT in SWITCH")?;
        let statements = self.parse_block()?;
        Ok(Case {
            value: None,
            statements,
        })
    }

    pub fn parse_while_statement(&mut self) -> ParseResult<Statement> {
        self.expect_literal("WHILE", "Expected WHILE")?;
        let condition = self.parse_expression()?;
        self.expect_literal("DO", "Expected DO after WHILE condition")?;
        let statements = self.parse_block()?;
        self.expect_literal("END", "Expected END to close WHILE")?;
        Ok(Statement::While {
            condition,
            statements,
        })
    }

    pub fn parse_return_statement(&mut self) -> ParseResult<Statement> {
        self.expect_literal("RETURN", "Expected RETURN")?;
        let value = self.parse_expression()?;
        self.expect_literal(";", "Expected ';' after RETURN value")?;
        Ok(Statement::Return(value))
    }

    pub fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_logical_expression()
    }

    pub fn parse_logical_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary(&["&&", "||"], Self::parse_comparison_expression)
    }

    pub fn parse_comparison_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary(&["<", ">", "==", "!="], Self::parse_additive_expression)
    }

    pub fn parse_additive_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary(&["+", "-"], Self::parse_multiplicative_expression)
    }

    pub fn parse_multiplicative_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary(&["*", "/", "^"], Self::parse_primary_expression)
    }

    pub fn parse_primary_expression(&mut self) -> ParseResult<Expression> {
        if self.match_literal("NIL") {
            return Ok(Expression::literal(Literal::Nil));
        }
        if self.match_literal("TRUE") {
            return Ok(Expression::literal(Literal::Boolean(true)));
        }
        if self.match_literal("FALSE") {
            return Ok(Expression::literal(Literal::Boolean(false)));
        }
        if self.match_literal("(") {
            let inner = self.parse_expression()?;
            self.expect_literal(")", "Expected closing parenthesis")?;
            return Ok(Expression::group(inner));
        }

        let Some(token) = self.tokens.get(self.index).cloned() else {
            return Err(self.error("Expected expression"));
        };
        match token.kind {
            TokenKind::Identifier => {
                self.advance();
                self.parse_identifier_suffix(token.literal)
            }
            TokenKind::Integer => {
                self.advance();
                let value = BigInt::from_str(&token.literal)
                    .map_err(|_| ParseError::new("Invalid integer literal", token.index))?;
                Ok(Expression::literal(Literal::Integer(value)))
            }
            TokenKind::Decimal => {
                self.advance();
                let value = BigDecimal::from_str(&token.literal)
                    .map_err(|_| ParseError::new("Invalid decimal literal", token.index))?;
                Ok(Expression::literal(Literal::Decimal(value)))
            }
            TokenKind::Character => {
                self.advance();
                let unescaped = unescape(strip_quotes(&token.literal));
                let mut chars = unescaped.chars();
                match (chars.next(), chars.next()) {
                    (Some(value), None) => Ok(Expression::literal(Literal::Character(value))),
                    _ => Err(ParseError::new("Invalid character literal", token.index)),
                }
            }
            TokenKind::String => {
                self.advance();
                let value = unescape(strip_quotes(&token.literal));
                Ok(Expression::literal(Literal::String(value)))
            }
            TokenKind::Operator => Err(ParseError::new("Invalid expression", token.index)),
        }
    }

    /// Call arguments or a list offset following an identifier.
    fn parse_identifier_suffix(&mut self, name: String) -> ParseResult<Expression> {
        if self.match_literal("(") {
            let arguments = self.parse_separated(")", "Expected ')' after arguments")?;
            return Ok(Expression::function(name, arguments));
        }
        if self.match_literal("[") {
            let offset = self.parse_expression()?;
            self.expect_literal("]", "Expected ']' after list offset")?;
            return Ok(Expression::access(name, Some(offset)));
        }
        Ok(Expression::access(name, None))
    }

    /// Comma-separated expressions up to and including `close`.
    fn parse_separated(&mut self, close: &str, message: &str) -> ParseResult<Vec<Expression>> {
        let mut values = Vec::new();
        if self.match_literal(close) {
            return Ok(values);
        }
        loop {
            values.push(self.parse_expression()?);
            if self.match_literal(close) {
                return Ok(values);
            }
            if !self.match_literal(",") {
                return Err(self.error(message));
            }
            if self.peek_literal(close) {
                return Err(self.error("Trailing comma"));
            }
        }
    }

    fn parse_binary(
        &mut self,
        operators: &[&str],
        operand: fn(&mut Self) -> ParseResult<Expression>,
    ) -> ParseResult<Expression> {
        let mut left = operand(self)?;
        while let Some(operator) = self.match_operator(operators) {
            let right = operand(self)?;
            left = Expression::binary(operator, left, right);
        }
        Ok(left)
    }

    fn parse_type_annotation(&mut self) -> ParseResult<Option<String>> {
        if self.match_literal(":") {
            return self.expect_identifier("Expected type name").map(Some);
        }
        Ok(None)
    }

    fn match_operator(&mut self, operators: &[&str]) -> Option<BinaryOperator> {
        let token = self.tokens.get(self.index)?;
        if token.kind != TokenKind::Operator || !operators.contains(&token.literal.as_str()) {
            return None;
        }
        let operator = BinaryOperator::from_symbol(&token.literal)?;
        self.advance();
        Some(operator)
    }

    fn expect_identifier(&mut self, message: &str) -> ParseResult<String> {
        match self.tokens.get(self.index) {
            Some(token) if token.kind == TokenKind::Identifier => {
                let name = token.literal.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(message)),
        }
    }

    fn expect_literal(&mut self, literal: &str, message: &str) -> ParseResult<()> {
        if self.match_literal(literal) {
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn has(&self, offset: usize) -> bool {
        self.index + offset < self.tokens.len()
    }

    fn peek_literal(&self, literal: &str) -> bool {
        self.tokens
            .get(self.index)
            .is_some_and(|token| token.literal == literal)
    }

    fn peek_any(&self, literals: &[&str]) -> bool {
        literals.iter().any(|literal| self.peek_literal(literal))
    }

    fn match_literal(&mut self, literal: &str) -> bool {
        let matched = self.peek_literal(literal);
        if matched {
            self.advance();
        }
        matched
    }

    fn advance(&mut self) {
        self.index += 1;
    }

    fn error(&self, message: &str) -> ParseError {
        let index = match self.index.checked_sub(1) {
            Some(previous) => self.tokens[previous].end(),
            None => 0,
        };
        ParseError::new(message, index)
    }
}

fn strip_quotes(literal: &str) -> &str {
    let mut chars = literal.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}

fn unescape(raw: &str) -> String {
    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('b') => value.push('\u{8}'),
            Some('n') => value.push('\n'),
            Some('r') => value.push('\r'),
            Some('t') => value.push('\t'),
            Some(other) => value.push(other),
            None => value.push('\\'),
        }
    }
    value
}

pub fn parse_tokens(tokens: Vec<Token>) -> ParseResult<Source> {
    Parser::new(tokens).parse_source()
}
