//! Token definitions

use serde::Serialize;

use crate::location::SourceLocation;

/// Token categories
///
/// `BlockStart` and `BlockEnd` are only produced by the indentation
/// processor. `LineEnd` comes from both the indentation processor and the
/// flat stream of `lexer::tokenize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Name,
    Number,
    String,
    Keyword,
    Operator,
    /// Verbatim payload of a `python:` pass-through line
    Raw,
    /// Full-line `#` comment, text kept verbatim
    Comment,
    BlockStart,
    BlockEnd,
    LineEnd,
    EndOfInput,
}

/// A classified slice of source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
        }
    }

    /// Structural marker with no text
    pub fn marker(kind: TokenKind, line: usize, column: usize) -> Self {
        Self::new(kind, "", line, column)
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    /// True for NAME or KEYWORD tokens spelled `word`
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self.kind, TokenKind::Name | TokenKind::Keyword) && self.text == word
    }

    /// True for OPERATOR tokens spelled `op`
    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == op
    }

    /// Human-readable form used in syntax errors
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::BlockStart => "indented block".to_string(),
            TokenKind::BlockEnd => "end of block".to_string(),
            TokenKind::LineEnd => "end of line".to_string(),
            TokenKind::EndOfInput => "end of input".to_string(),
            TokenKind::Raw => "raw python line".to_string(),
            TokenKind::Comment => "comment".to_string(),
            _ => format!("'{}'", self.text),
        }
    }
}

/// One logical source line as produced by the lexer
///
/// `indent` is the raw leading whitespace; measuring it is the
/// indentation processor's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub line: usize,
    pub indent: String,
    pub tokens: Vec<Token>,
    /// Column just past the last token, where LINE_END is placed
    pub end_column: usize,
}
