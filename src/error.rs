//! Error types for the plainpy transpiler

use thiserror::Error;

/// Main error type for plainpy
///
/// Every stage aborts on the first error; no partial output is produced.
#[derive(Debug, Error)]
pub enum PlainPyError {
    #[error("Lex error at line {line}, column {column}: unexpected character {ch:?}")]
    LexError { line: usize, column: usize, ch: char },

    #[error(
        "Indentation error at line {line}: width {found} does not match any open block (expected one of {})",
        join_widths(.expected_one_of)
    )]
    IndentationError {
        line: usize,
        found: usize,
        expected_one_of: Vec<usize>,
    },

    #[error("Indentation error at line {line}: tabs and spaces are mixed in the indentation")]
    MixedIndentationError { line: usize },

    #[error(
        "Syntax error at line {line}, column {column}: expected {}, found {found}",
        join_expected(.expected)
    )]
    SyntaxError {
        line: usize,
        column: usize,
        expected: Vec<String>,
        found: String,
    },

    /// `line` is 0 when the failure is not tied to a source line
    #[error("Macro expansion error in '{pattern_name}': {message}")]
    MacroExpansionError {
        pattern_name: String,
        line: usize,
        message: String,
    },

    #[error("Emission error: {message}")]
    EmissionError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PlainPyError {
    /// Line the error points at, when it has one
    pub fn line(&self) -> Option<usize> {
        match self {
            PlainPyError::LexError { line, .. }
            | PlainPyError::IndentationError { line, .. }
            | PlainPyError::MixedIndentationError { line }
            | PlainPyError::SyntaxError { line, .. } => Some(*line),
            PlainPyError::MacroExpansionError { line, .. } if *line > 0 => Some(*line),
            _ => None,
        }
    }

    /// Column the error points at, when it has one
    pub fn column(&self) -> Option<usize> {
        match self {
            PlainPyError::LexError { column, .. } | PlainPyError::SyntaxError { column, .. } => {
                Some(*column)
            }
            _ => None,
        }
    }
}

fn join_widths(widths: &[usize]) -> String {
    widths
        .iter()
        .map(|w| w.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_expected(expected: &[String]) -> String {
    match expected {
        [] => "a statement".to_string(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}

pub type Result<T> = std::result::Result<T, PlainPyError>;
