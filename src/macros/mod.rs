//! Macro registry
//!
//! A macro pattern contributes one statement form to the grammar. The
//! parser records the captures; at emission the captured values are rendered
//! to Python source, handed to the pattern's `extract` function, and the
//! resulting named arguments are passed to `render`.
//!
//! Patterns are plain records, so plugins are `const` tables
//! (see [`http::PATTERNS`] and [`data::PATTERNS`]).

pub mod data;
pub mod http;

use std::collections::BTreeMap;

use crate::error::{PlainPyError, Result};
use crate::parser::Sym;

/// A captured value, already rendered as Python source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroValue {
    /// Identifier
    Name(String),
    /// Expression or literal code
    Code(String),
    /// Optional part that was not written
    Absent,
}

/// Positional captures of one matched pattern
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroInput {
    values: Vec<MacroValue>,
}

impl MacroInput {
    pub fn new(values: Vec<MacroValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MacroValue> {
        self.values.get(index)
    }

    /// Source text of the capture at `index`, if present
    pub fn code(&self, index: usize) -> Option<&str> {
        match self.values.get(index)? {
            MacroValue::Name(text) | MacroValue::Code(text) => Some(text),
            MacroValue::Absent => None,
        }
    }

    /// Like [`code`](Self::code) but missing values are an error
    pub fn required(&self, index: usize, what: &str) -> std::result::Result<String, String> {
        self.code(index)
            .map(str::to_string)
            .ok_or_else(|| format!("missing {what}"))
    }
}

/// Named arguments produced by `extract`
pub type MacroArgs = BTreeMap<String, String>;

pub type Extractor = fn(&MacroInput) -> std::result::Result<MacroArgs, String>;
pub type Renderer = fn(&MacroArgs) -> std::result::Result<String, String>;

/// One registered statement form
#[derive(Clone, Copy)]
pub struct MacroPattern {
    /// Unique pattern name
    pub name: &'static str,
    /// Statement syntax; must end with `Sym::End`
    pub syntax: &'static [Sym],
    pub extract: Extractor,
    pub render: Renderer,
    /// Import lines the rendered code needs
    pub imports: &'static [&'static str],
}

impl std::fmt::Debug for MacroPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacroPattern")
            .field("name", &self.name)
            .field("syntax", &self.syntax)
            .field("imports", &self.imports)
            .finish_non_exhaustive()
    }
}

/// Fetch a named argument inside a renderer
pub fn arg<'a>(args: &'a MacroArgs, key: &str) -> std::result::Result<&'a str, String> {
    args.get(key)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument `{key}`"))
}

/// Ordered collection of macro patterns
#[derive(Debug, Clone, Default)]
pub struct MacroRegistry {
    patterns: Vec<MacroPattern>,
}

impl MacroRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the HTTP and data plugins
    pub fn with_defaults() -> Self {
        let patterns = http::PATTERNS
            .iter()
            .chain(data::PATTERNS)
            .copied()
            .collect();
        Self { patterns }
    }

    /// Add a pattern after checking its syntax and name
    pub fn register(&mut self, pattern: MacroPattern) -> Result<()> {
        let invalid = |message: String| PlainPyError::MacroExpansionError {
            pattern_name: pattern.name.to_string(),
            line: 0,
            message,
        };
        if self.get(pattern.name).is_some() {
            return Err(invalid("pattern name already registered".to_string()));
        }
        validate_syntax(pattern.syntax).map_err(invalid)?;
        self.patterns.push(pattern);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&MacroPattern> {
        self.patterns.iter().find(|p| p.name == name)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &MacroPattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Macro statements are single lines with inline captures only
pub fn validate_syntax(syntax: &[Sym]) -> std::result::Result<(), String> {
    match syntax.first() {
        Some(Sym::Word(_) | Sym::Op(_) | Sym::Choice(_) | Sym::OneOf(_)) => {}
        Some(other) => return Err(format!("must start with a fixed word, not {}", other.describe())),
        None => return Err("syntax is empty".to_string()),
    }
    if syntax.last() != Some(&Sym::End) {
        return Err("syntax must end at end of line".to_string());
    }
    check_symbols(syntax)
}

fn check_symbols(syms: &[Sym]) -> std::result::Result<(), String> {
    for sym in syms {
        match sym {
            Sym::Body | Sym::Indented | Sym::Cases => {
                return Err("block symbols are not allowed in macro syntax".to_string())
            }
            Sym::Args
            | Sym::Params
            | Sym::Names
            | Sym::Imports
            | Sym::Raw
            | Sym::Comment
            | Sym::Pattern => {
                return Err(format!("{} cannot be captured by a macro", sym.describe()))
            }
            Sym::Opt(inner) => check_symbols(inner)?,
            Sym::OneOf(alternatives) => {
                for alternative in alternatives.iter() {
                    check_symbols(alternative)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}
