#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Integer,
    Decimal,
    Character,
    String,
    Operator,
}

/// A lexical unit with its raw source text.
///
/// `index` is the character offset of the first character of `literal` in the
/// lexed input. Parse errors are reported relative to these offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub index: usize,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, index: usize) -> Self {
        Self {
            kind,
            literal: literal.into(),
            index,
        }
    }

    /// Offset of the first character after this token.
    pub fn end(&self) -> usize {
        self.index + self.literal.chars().count()
    }
}
