//! Tokenizer token types.

/// Token kinds produced by the SQL fragment tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Whitespace and comments, merged into one token.
    Space,
    /// A string literal of any flavor (plain, extended, dollar-quoted).
    String,
    Number,
    /// Plain identifier, or a `$n` parameter reference.
    Word,
    /// Identifier chain with `.` separators, possibly with quoted segments.
    DottedWord,
    /// Any other single character, returned as itself.
    Char(char),
}

impl TokenKind {
    /// Whether the query builder should try to resolve this token as a
    /// column reference.
    pub fn is_ident(&self) -> bool {
        matches!(self, TokenKind::Word | TokenKind::DottedWord)
    }
}

/// A token with its source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}
