//! Character-level scanner producing a flat token list.
//!
//! Dispatch happens on the first unconsumed character; each `lex_*` routine
//! consumes one token and hands it to [`CharStream::emit`].

mod error;
mod token;

pub use error::{LexError, LexResult};
pub use token::{Token, TokenKind};

type Pattern = fn(char) -> bool;

/// Cursor over the raw input tracking the start of the token being matched.
pub struct CharStream {
    chars: Vec<char>,
    index: usize,
    length: usize,
}

impl CharStream {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            index: 0,
            length: 0,
        }
    }

    pub fn has(&self, offset: usize) -> bool {
        self.index + offset < self.chars.len()
    }

    pub fn get(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn advance(&mut self) {
        self.index += 1;
        self.length += 1;
    }

    /// Drops the characters matched so far without emitting them.
    pub fn skip(&mut self) {
        self.length = 0;
    }

    pub fn emit(&mut self, kind: TokenKind) -> Token {
        let start = self.index - self.length;
        self.skip();
        let literal = self.chars[start..self.index].iter().collect::<String>();
        Token::new(kind, literal, start)
    }
}

pub struct Lexer {
    chars: CharStream,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: CharStream::new(input),
        }
    }

    pub fn lex(mut self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while self.chars.has(0) {
            if self.matches(&[is_whitespace]) {
                self.chars.skip();
            } else {
                tokens.push(self.lex_token()?);
            }
        }
        Ok(tokens)
    }

    fn lex_token(&mut self) -> LexResult<Token> {
        if self.peek(&[is_letter]) {
            Ok(self.lex_identifier())
        } else if self.peek(&[is_digit])
            || self.peek(&[is_minus, is_digit])
            || self.peek(&[is_dot])
        {
            Ok(self.lex_number())
        } else if self.peek(&[is_single_quote]) {
            self.lex_character()
        } else if self.peek(&[is_double_quote]) {
            self.lex_string()
        } else {
            self.lex_operator()
        }
    }

    fn lex_identifier(&mut self) -> Token {
        self.chars.advance();
        while self.matches(&[is_identifier_tail]) {}
        self.chars.emit(TokenKind::Identifier)
    }

    fn lex_number(&mut self) -> Token {
        // A dot that does not follow a number never starts a decimal.
        if self.matches(&[is_dot]) {
            return self.chars.emit(TokenKind::Operator);
        }
        self.matches(&[is_minus]);
        if self.matches(&[|c| c == '0']) {
            if self.peek(&[is_digit]) {
                return self.chars.emit(TokenKind::Integer);
            }
        } else {
            while self.matches(&[is_digit]) {}
        }
        if self.matches(&[is_dot, is_digit]) {
            while self.matches(&[is_digit]) {}
            return self.chars.emit(TokenKind::Decimal);
        }
        self.chars.emit(TokenKind::Integer)
    }

    fn lex_character(&mut self) -> LexResult<Token> {
        self.chars.advance();
        if self.peek(&[is_literal_character]) {
            self.chars.advance();
        } else if self.peek(&[is_backslash]) {
            self.lex_escape()?;
        } else {
            return Err(LexError::InvalidCharacter {
                index: self.chars.index(),
            });
        }
        if !self.matches(&[is_single_quote]) {
            return Err(LexError::UnterminatedCharacter {
                index: self.chars.index(),
            });
        }
        Ok(self.chars.emit(TokenKind::Character))
    }

    fn lex_string(&mut self) -> LexResult<Token> {
        self.chars.advance();
        loop {
            if self.peek(&[is_string_character]) {
                self.chars.advance();
            } else if self.peek(&[is_backslash]) {
                self.lex_escape()?;
            } else {
                break;
            }
        }
        if !self.matches(&[is_double_quote]) {
            return Err(LexError::UnterminatedString {
                index: self.chars.index(),
            });
        }
        Ok(self.chars.emit(TokenKind::String))
    }

    fn lex_escape(&mut self) -> LexResult<()> {
        if self.matches(&[is_backslash, is_escape]) {
            Ok(())
        } else {
            Err(LexError::InvalidEscape {
                index: self.chars.index() + 1,
            })
        }
    }

    fn lex_operator(&mut self) -> LexResult<Token> {
        if self.matches(&[|c| matches!(c, '<' | '>' | '!' | '='), |c| c == '='])
            || self.matches(&[|c| c == '&', |c| c == '&'])
            || self.matches(&[|c| c == '|', |c| c == '|'])
            || self.matches(&[is_operator])
        {
            return Ok(self.chars.emit(TokenKind::Operator));
        }
        Err(LexError::UnexpectedCharacter {
            character: self.chars.get(0).unwrap_or('\0'),
            index: self.chars.index(),
        })
    }

    /// True when the next characters satisfy `patterns` one-to-one.
    fn peek(&self, patterns: &[Pattern]) -> bool {
        patterns
            .iter()
            .enumerate()
            .all(|(offset, pattern)| self.chars.get(offset).is_some_and(pattern))
    }

    fn matches(&mut self, patterns: &[Pattern]) -> bool {
        let matched = self.peek(patterns);
        if matched {
            for _ in patterns {
                self.chars.advance();
            }
        }
        matched
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\u{8}')
}

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_identifier_tail(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_minus(c: char) -> bool {
    c == '-'
}

fn is_dot(c: char) -> bool {
    c == '.'
}

fn is_single_quote(c: char) -> bool {
    c == '\''
}

fn is_double_quote(c: char) -> bool {
    c == '"'
}

fn is_backslash(c: char) -> bool {
    c == '\\'
}

fn is_escape(c: char) -> bool {
    matches!(c, 'b' | 'n' | 'r' | 't' | '\'' | '"' | '\\')
}

fn is_literal_character(c: char) -> bool {
    !matches!(c, '\'' | '\n' | '\r' | '\\')
}

fn is_string_character(c: char) -> bool {
    !matches!(c, '"' | '\n' | '\r' | '\\')
}

fn is_operator(c: char) -> bool {
    matches!(
        c,
        '!' | '@'
            | '#'
            | '$'
            | '%'
            | '^'
            | '&'
            | '*'
            | '('
            | ')'
            | '-'
            | '='
            | '+'
            | ';'
            | ':'
            | '['
            | ']'
            | ','
            | '/'
            | '<'
            | '>'
    )
}

pub fn tokenize(input: &str) -> LexResult<Vec<Token>> {
    Lexer::new(input).lex()
}
