//! plainpy - English to Python Transpiler
//!
//! # Overview
//! Turns programs written as plain English statements into Python source.
//!
//! # Pipeline
//! 1. [`lexer`]: source text to per-line tokens
//! 2. [`indenter`]: indentation to explicit block markers
//! 3. [`normalizer`]: comparison phrases to operators
//! 4. [`parser`]: token stream to a statement tree
//! 5. [`emitter`]: tree to Python text
//!
//! Statement forms contributed by [`macros`] plugins join the grammar at
//! step 4 and are expanded at step 5.

pub mod diagnostics;
pub mod emitter;
pub mod error;
pub mod indenter;
pub mod lexer;
pub mod location;
pub mod macros;
pub mod normalizer;
pub mod parser;

pub use error::{PlainPyError, Result};
pub use macros::MacroRegistry;

use once_cell::sync::Lazy;
use std::path::Path;

use lexer::Token;
use parser::{Grammar, Program};

/// Configured pipeline: a macro registry and the grammar built from it
///
/// Holds no per-run state, so one instance can serve many threads.
#[derive(Debug, Clone)]
pub struct Transpiler {
    registry: MacroRegistry,
    grammar: Grammar,
}

impl Transpiler {
    pub fn new(registry: MacroRegistry) -> Self {
        let grammar = Grammar::new(&registry);
        Self { registry, grammar }
    }

    /// Core statements only
    pub fn without_macros() -> Self {
        Self::new(MacroRegistry::new())
    }

    pub fn registry(&self) -> &MacroRegistry {
        &self.registry
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Lexed, block-annotated and normalized token stream
    pub fn tokenize(&self, source: &str) -> Result<Vec<Token>> {
        let lines = lexer::lex_lines(source)?;
        let tokens = indenter::process(lines)?;
        Ok(normalizer::normalize_tokens(tokens))
    }

    pub fn parse(&self, source: &str) -> Result<Program> {
        let tokens = self.tokenize(source)?;
        parser::parse(&tokens, &self.grammar)
    }

    pub fn transpile(&self, source: &str) -> Result<String> {
        let program = self.parse(source)?;
        emitter::emit(&program, &self.registry)
    }
}

impl Default for Transpiler {
    /// Core statements plus the HTTP and data macros
    fn default() -> Self {
        Self::new(MacroRegistry::with_defaults())
    }
}

static DEFAULT_TRANSPILER: Lazy<Transpiler> = Lazy::new(Transpiler::default);

/// Shared default pipeline
pub fn default_transpiler() -> &'static Transpiler {
    &DEFAULT_TRANSPILER
}

/// Transpile English source to Python source
pub fn transpile(source: &str) -> Result<String> {
    DEFAULT_TRANSPILER.transpile(source)
}

/// Transpile English source to Python source with diagnostics
pub fn transpile_with_diagnostics(
    source: &str,
    file: Option<&Path>,
) -> std::result::Result<String, diagnostics::PpyDiagnostics> {
    transpile(source).map_err(|err| diagnostics::from_error(&err, file))
}

/// Transpile an English source file to a Python file
pub fn transpile_file(input: &Path, output: &Path) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(input).map_err(PlainPyError::from)?;
    let python = transpile(&source)?;
    std::fs::write(output, python).map_err(PlainPyError::from)?;
    Ok(())
}
