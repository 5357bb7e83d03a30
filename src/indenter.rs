//! Indentation processor
//!
//! Turns the lexer's per-line groups into a flat token stream with explicit
//! block structure.
//!
//! # Algorithm
//!
//! 1. Measure each line's leading whitespace (tabs count as 4 columns)
//! 2. Compare it with the top of the indentation stack:
//!    - greater: push it and emit BLOCK_START
//!    - equal: nothing
//!    - less: pop until the top matches, one BLOCK_END per pop; a width that
//!      matches no open level is an indentation error
//! 3. Emit the line's tokens followed by LINE_END
//! 4. At end of input pop every open level, then emit END_OF_INPUT

use crate::error::{PlainPyError, Result};
use crate::lexer::{SourceLine, Token, TokenKind};

pub const TAB_WIDTH: usize = 4;

/// Widths of the currently open blocks
///
/// The base level 0 is implicit, so an empty stack means top level.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndentStack {
    levels: Vec<usize>,
}

impl IndentStack {
    pub fn top(&self) -> usize {
        self.levels.last().copied().unwrap_or(0)
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Every width a new line may legally dedent to, outermost first
    pub fn admissible(&self) -> Vec<usize> {
        std::iter::once(0).chain(self.levels.iter().copied()).collect()
    }

    fn push(&mut self, width: usize) {
        self.levels.push(width);
    }

    fn pop(&mut self) -> Option<usize> {
        self.levels.pop()
    }
}

/// Stateful processor fed one logical line at a time
#[derive(Debug, Default)]
pub struct Indenter {
    stack: IndentStack,
    tokens: Vec<Token>,
    last_line: usize,
}

impl Indenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stack(&self) -> &IndentStack {
        &self.stack
    }

    /// Append one line, preceded by whatever block markers its width implies
    pub fn push_line(&mut self, line: SourceLine) -> Result<()> {
        let width = measure(&line.indent, line.line)?;
        let column = line.indent.chars().count() + 1;

        if width > self.stack.top() {
            self.stack.push(width);
            self.tokens
                .push(Token::marker(TokenKind::BlockStart, line.line, column));
        } else if width < self.stack.top() {
            let expected = self.stack.admissible();
            while width < self.stack.top() {
                self.stack.pop();
                self.tokens
                    .push(Token::marker(TokenKind::BlockEnd, line.line, column));
            }
            if width != self.stack.top() {
                return Err(PlainPyError::IndentationError {
                    line: line.line,
                    found: width,
                    expected_one_of: expected,
                });
            }
        }

        self.last_line = line.line;
        self.tokens.extend(line.tokens);
        self.tokens
            .push(Token::marker(TokenKind::LineEnd, line.line, line.end_column));
        Ok(())
    }

    /// Close every open block and terminate the stream
    pub fn finish(mut self) -> Vec<Token> {
        let line = self.last_line + 1;
        while self.stack.pop().is_some() {
            self.tokens.push(Token::marker(TokenKind::BlockEnd, line, 1));
        }
        self.tokens
            .push(Token::marker(TokenKind::EndOfInput, line, 1));
        self.tokens
    }
}

/// Run the whole line list through a fresh processor
pub fn process(lines: Vec<SourceLine>) -> Result<Vec<Token>> {
    let mut indenter = Indenter::new();
    for line in lines {
        indenter.push_line(line)?;
    }
    Ok(indenter.finish())
}

/// Width of an indentation prefix; tabs and spaces may not be mixed
pub fn measure(prefix: &str, line: usize) -> Result<usize> {
    let has_tab = prefix.contains('\t');
    let has_space = prefix.contains(' ');
    if has_tab && has_space {
        return Err(PlainPyError::MixedIndentationError { line });
    }
    Ok(prefix
        .chars()
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum())
}
