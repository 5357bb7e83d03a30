//! PpyDiagnostics - structured compile diagnostics and their renderings

use serde::Serialize;
use serde_json::json;
use std::path::Path;

use crate::error::PlainPyError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticSpan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PpyDiagnostic {
    pub code: String,
    pub message: String,
    pub severity: DiagnosticSeverity,
    pub span: DiagnosticSpan,
    pub phase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct PpyDiagnostics {
    pub diagnostics: Vec<PpyDiagnostic>,
}

impl PpyDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error)
    }

    pub fn add(&mut self, diag: PpyDiagnostic) {
        self.diagnostics.push(diag);
    }

    pub fn extend(&mut self, other: PpyDiagnostics) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for diag in &self.diagnostics {
            let file = diag.span.file.as_deref().unwrap_or("<input>");
            out.push_str(&format!(
                "[{}] {}:{}:{} {}\n",
                diag.code, file, diag.span.line, diag.span.column, diag.message
            ));
        }
        out
    }
}

pub fn span_for_line(file: Option<&Path>, line: usize, column: usize, len: usize) -> DiagnosticSpan {
    let end_column = if len == 0 {
        column
    } else {
        column + len.saturating_sub(1)
    };
    DiagnosticSpan {
        file: file.map(|p| p.display().to_string()),
        line,
        column,
        end_line: line,
        end_column,
    }
}

pub fn error_diag(code: &str, message: String, span: DiagnosticSpan, phase: &str) -> PpyDiagnostic {
    PpyDiagnostic {
        code: code.to_string(),
        message,
        severity: DiagnosticSeverity::Error,
        span,
        phase: phase.to_string(),
        meta: None,
    }
}

/// Width of the offending text quoted in a `found` description
fn found_width(found: &str) -> usize {
    found
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .map_or(1, |s| s.chars().count())
}

/// Convert a pipeline error into a one-entry diagnostic list
pub fn from_error(err: &PlainPyError, file: Option<&Path>) -> PpyDiagnostics {
    let message = err.to_string();
    let (code, phase, span, meta) = match err {
        PlainPyError::LexError { line, column, ch } => (
            "PPY-LEX-ERROR",
            "lex",
            span_for_line(file, *line, *column, 1),
            Some(json!({ "character": ch.to_string() })),
        ),
        PlainPyError::IndentationError {
            line,
            found,
            expected_one_of,
        } => (
            "PPY-INDENT-ERROR",
            "indent",
            span_for_line(file, *line, 1, *found),
            Some(json!({ "found": found, "expected_one_of": expected_one_of })),
        ),
        PlainPyError::MixedIndentationError { line } => (
            "PPY-MIXED-INDENT",
            "indent",
            span_for_line(file, *line, 1, 1),
            None,
        ),
        PlainPyError::SyntaxError {
            line,
            column,
            expected,
            found,
        } => (
            "PPY-SYNTAX-ERROR",
            "parse",
            span_for_line(file, *line, *column, found_width(found)),
            Some(json!({ "expected": expected, "found": found })),
        ),
        PlainPyError::MacroExpansionError {
            pattern_name, line, ..
        } => (
            "PPY-MACRO-ERROR",
            "macro",
            span_for_line(file, (*line).max(1), 1, 1),
            Some(json!({ "pattern": pattern_name })),
        ),
        PlainPyError::EmissionError { .. } => (
            "PPY-EMIT-ERROR",
            "emit",
            span_for_line(file, 1, 1, 1),
            None,
        ),
        PlainPyError::IoError(_) => ("PPY-IO-ERROR", "io", span_for_line(file, 1, 1, 1), None),
    };

    let mut diag = error_diag(code, message, span, phase);
    diag.meta = meta;
    let mut diags = PpyDiagnostics::new();
    diags.add(diag);
    diags
}
