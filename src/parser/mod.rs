//! Parser module - production-table parser for English statements
//!
//! Each logical line is matched against the ordered productions of a
//! [`Grammar`]. Alternatives backtrack freely until a line matches; once a
//! production is inside an indented block, errors in that block are final.
//! When nothing matches, the error points at the farthest token any
//! production reached.

mod ast;
mod build;
mod expr;
mod grammar;

pub use ast::*;
pub use grammar::{
    count_captures, Grammar, Production, ProductionRule, StmtRule, Sym, CORE_PRODUCTIONS,
};

use std::collections::BTreeSet;

use crate::error::{PlainPyError, Result};
use crate::lexer::{Token, TokenKind};
use build::Parsed;

/// Value captured by a grammar symbol
#[derive(Debug, Clone, PartialEq)]
pub enum Capture {
    Name(String),
    Names(Vec<String>),
    Expr(Expr),
    Text(String),
    Args(Vec<Arg>),
    Params(Vec<Param>),
    Imports(Vec<ImportName>),
    Block(Vec<Stmt>),
    Pattern(CasePattern),
    Cases(Vec<MatchCase>),
    /// Placeholder for an optional group that did not match
    Absent,
}

/// Parse a normalized, block-annotated token stream
pub fn parse(tokens: &[Token], grammar: &Grammar) -> Result<Program> {
    if tokens.is_empty() {
        return Ok(Program::default());
    }
    let mut parser = Parser::new(tokens, grammar);
    let (items, _) = parser.statements(0, TokenKind::EndOfInput)?;
    Ok(Program {
        body: build::fold(items)?,
    })
}

/// Furthest position any alternative reached, and what it wanted there
#[derive(Debug, Default)]
struct Farthest {
    pos: usize,
    expected: BTreeSet<String>,
}

impl Farthest {
    fn at(pos: usize) -> Self {
        Self {
            pos,
            expected: BTreeSet::new(),
        }
    }
}

pub(crate) struct Parser<'t, 'g> {
    tokens: &'t [Token],
    grammar: &'g Grammar,
    farthest: Farthest,
}

type Matched = Option<(Option<Capture>, usize)>;

impl<'t, 'g> Parser<'t, 'g> {
    fn new(tokens: &'t [Token], grammar: &'g Grammar) -> Self {
        Self {
            tokens,
            grammar,
            farthest: Farthest::default(),
        }
    }

    /// Token at `pos`; past the end this is the final END_OF_INPUT
    fn token(&self, pos: usize) -> &'t Token {
        let tokens: &'t [Token] = self.tokens;
        &tokens[pos.min(tokens.len() - 1)]
    }

    fn is_op(&self, pos: usize, op: &str) -> bool {
        self.token(pos).is_op(op)
    }

    fn is_word(&self, pos: usize, word: &str) -> bool {
        self.token(pos).is_word(word)
    }

    /// Record that `what` would have been accepted at `pos`
    fn expect(&mut self, pos: usize, what: impl Into<String>) {
        if pos > self.farthest.pos {
            self.farthest = Farthest::at(pos);
        }
        if pos == self.farthest.pos {
            self.farthest.expected.insert(what.into());
        }
    }

    // ========================================================================
    // Blocks and statements
    // ========================================================================

    /// Statements up to (not including) a token of kind `until`, unfolded
    fn statements(&mut self, mut pos: usize, until: TokenKind) -> Result<(Vec<Parsed>, usize)> {
        let mut parsed = Vec::new();
        loop {
            let token = self.token(pos);
            if token.kind == until {
                break;
            }
            if matches!(token.kind, TokenKind::EndOfInput | TokenKind::BlockEnd) {
                return Err(PlainPyError::SyntaxError {
                    line: token.line,
                    column: token.column,
                    expected: vec!["statement".to_string()],
                    found: token.describe(),
                });
            }
            let (item, next) = self.statement(pos)?;
            parsed.push(item);
            pos = next;
        }
        Ok((parsed, pos))
    }

    /// BLOCK_START statements BLOCK_END, starting at the BLOCK_START
    fn block(&mut self, pos: usize) -> Result<(Vec<Stmt>, usize)> {
        let (items, end) = self.statements(pos + 1, TokenKind::BlockEnd)?;
        Ok((build::fold(items)?, end + 1))
    }

    /// `:` LINE_END and a block holding only `case` clauses
    fn cases(&mut self, pos: usize) -> Result<Matched> {
        if !self.is_op(pos, ":") {
            self.expect(pos, "`:`");
            return Ok(None);
        }
        if self.token(pos + 1).kind != TokenKind::LineEnd {
            self.expect(pos + 1, "end of line");
            return Ok(None);
        }
        let start = pos + 2;
        if self.token(start).kind != TokenKind::BlockStart {
            self.expect(start, "indented block");
            return Ok(None);
        }
        let (items, end) = self.statements(start + 1, TokenKind::BlockEnd)?;
        let cases = build::cases(items, self.token(pos).location())?;
        Ok(Some((Some(Capture::Cases(cases)), end + 1)))
    }

    /// First production that matches the line starting at `pos`
    fn statement(&mut self, pos: usize) -> Result<(Parsed, usize)> {
        let saved = std::mem::replace(&mut self.farthest, Farthest::at(pos));
        let grammar = self.grammar;
        let location = self.token(pos).location();

        for production in grammar.productions() {
            let mut captures = Vec::new();
            if let Some(end) = self.match_seq(&[production.syms.as_slice()], pos, &mut captures)? {
                let parsed = build::build(production.rule, captures, location)?;
                self.farthest = saved;
                return Ok((parsed, end));
            }
        }
        Err(self.syntax_error(pos))
    }

    fn syntax_error(&self, start: usize) -> PlainPyError {
        let token = self.token(self.farthest.pos);
        let expected = if self.farthest.pos == start || self.farthest.expected.is_empty() {
            vec!["statement".to_string()]
        } else {
            self.farthest.expected.iter().cloned().collect()
        };
        PlainPyError::SyntaxError {
            line: token.line,
            column: token.column,
            expected,
            found: token.describe(),
        }
    }

    // ========================================================================
    // Sequence matching
    // ========================================================================

    /// Match the concatenation of `frames` at `pos`
    ///
    /// `Ok(None)` means no match (try something else); `Err` is final.
    fn match_seq(
        &mut self,
        frames: &[&'g [Sym]],
        pos: usize,
        captures: &mut Vec<Capture>,
    ) -> Result<Option<usize>> {
        let Some(index) = frames.iter().position(|f| !f.is_empty()) else {
            return Ok(Some(pos));
        };
        let frame = frames[index];
        let mut rest: Vec<&'g [Sym]> = Vec::with_capacity(frames.len() - index + 1);
        rest.push(&frame[1..]);
        rest.extend_from_slice(&frames[index + 1..]);
        let mark = captures.len();

        match frame[0] {
            Sym::Opt(inner) => {
                if let Some(end) = self.match_seq(&prepend(inner, &rest), pos, captures)? {
                    return Ok(Some(end));
                }
                captures.truncate(mark);
                captures.extend(std::iter::repeat_with(|| Capture::Absent).take(count_captures(inner)));
                let matched = self.match_seq(&rest, pos, captures)?;
                if matched.is_none() {
                    captures.truncate(mark);
                }
                Ok(matched)
            }
            Sym::OneOf(alternatives) => {
                for alternative in alternatives.iter().copied() {
                    if let Some(end) = self.match_seq(&prepend(alternative, &rest), pos, captures)? {
                        return Ok(Some(end));
                    }
                    captures.truncate(mark);
                }
                Ok(None)
            }
            sym => match self.match_symbol(sym, pos)? {
                Some((capture, next)) => {
                    captures.extend(capture);
                    let matched = self.match_seq(&rest, next, captures)?;
                    if matched.is_none() {
                        captures.truncate(mark);
                    }
                    Ok(matched)
                }
                None => Ok(None),
            },
        }
    }

    /// Match one non-combinator symbol
    fn match_symbol(&mut self, sym: Sym, pos: usize) -> Result<Matched> {
        let token = self.token(pos);
        let matched = match sym {
            Sym::Word(word) => token.is_word(word).then_some((None, pos + 1)),
            Sym::Op(op) => token.is_op(op).then_some((None, pos + 1)),
            Sym::NotOp(op) => (!token.is_op(op)).then_some((None, pos)),
            Sym::Choice(options) => {
                let accepted = matches!(
                    token.kind,
                    TokenKind::Name | TokenKind::Keyword | TokenKind::Operator
                ) && options.contains(&token.text.as_str());
                accepted.then(|| (Some(Capture::Text(token.text.clone())), pos + 1))
            }
            Sym::Name => (token.kind == TokenKind::Name)
                .then(|| (Some(Capture::Name(token.text.clone())), pos + 1)),
            Sym::Dotted => self
                .dotted(pos)
                .map(|(name, next)| (Some(Capture::Name(name)), next)),
            Sym::Names => self
                .names(pos)
                .map(|(names, next)| (Some(Capture::Names(names)), next)),
            Sym::Expr => self
                .expression(pos)
                .map(|(e, next)| (Some(Capture::Expr(e)), next)),
            Sym::Arith => self
                .arith(pos)
                .map(|(e, next)| (Some(Capture::Expr(e)), next)),
            Sym::ExprList => self
                .expression_list(pos)
                .map(|(e, next)| (Some(Capture::Expr(e)), next)),
            Sym::Target => self
                .target(pos)
                .map(|(e, next)| (Some(Capture::Expr(e)), next)),
            Sym::TargetList => self
                .target_list(pos)
                .map(|(e, next)| (Some(Capture::Expr(e)), next)),
            Sym::CompareOp => expr::comparison_op(token)
                .map(|_| (Some(Capture::Text(token.text.clone())), pos + 1)),
            Sym::Str => (token.kind == TokenKind::String)
                .then(|| (Some(Capture::Text(token.text.clone())), pos + 1)),
            Sym::Args => {
                let (args, next) = self.call_args(pos);
                Some((Some(Capture::Args(args)), next))
            }
            Sym::Params => self
                .params(pos)
                .map(|(params, next)| (Some(Capture::Params(params)), next)),
            Sym::Imports => self
                .imports(pos)
                .map(|(names, next)| (Some(Capture::Imports(names)), next)),
            Sym::Raw => (token.kind == TokenKind::Raw)
                .then(|| (Some(Capture::Text(token.text.clone())), pos + 1)),
            Sym::Comment => (token.kind == TokenKind::Comment)
                .then(|| (Some(Capture::Text(token.text.clone())), pos + 1)),
            Sym::Pattern => self
                .case_pattern(pos)
                .map(|(pattern, next)| (Some(Capture::Pattern(pattern)), next)),
            Sym::Cases => return self.cases(pos),
            Sym::End => (token.kind == TokenKind::LineEnd).then_some((None, pos + 1)),
            Sym::Body => return self.body(pos),
            Sym::Indented => {
                if token.kind == TokenKind::BlockStart {
                    let (body, next) = self.block(pos)?;
                    Some((Some(Capture::Block(body)), next))
                } else {
                    None
                }
            }
            Sym::Opt(_) | Sym::OneOf(_) => {
                return Err(PlainPyError::EmissionError {
                    message: "combinator reached the symbol matcher".to_string(),
                })
            }
        };
        if matched.is_none() {
            self.expect(pos, sym.describe());
        }
        Ok(matched)
    }

    /// `:` LINE_END and an optional block; a missing block is an empty body
    fn body(&mut self, pos: usize) -> Result<Matched> {
        if !self.is_op(pos, ":") {
            self.expect(pos, "`:`");
            return Ok(None);
        }
        if self.token(pos + 1).kind != TokenKind::LineEnd {
            self.expect(pos + 1, "end of line");
            return Ok(None);
        }
        let after = pos + 2;
        if self.token(after).kind == TokenKind::BlockStart {
            let (body, next) = self.block(after)?;
            Ok(Some((Some(Capture::Block(body)), next)))
        } else {
            Ok(Some((Some(Capture::Block(Vec::new())), after)))
        }
    }

    // ========================================================================
    // Name lists
    // ========================================================================

    fn dotted(&mut self, pos: usize) -> Option<(String, usize)> {
        if self.token(pos).kind != TokenKind::Name {
            return None;
        }
        let mut name = self.token(pos).text.clone();
        let mut cursor = pos + 1;
        while self.is_op(cursor, ".") && self.token(cursor + 1).kind == TokenKind::Name {
            name.push('.');
            name.push_str(&self.token(cursor + 1).text);
            cursor += 2;
        }
        Some((name, cursor))
    }

    fn names(&mut self, pos: usize) -> Option<(Vec<String>, usize)> {
        if self.token(pos).kind != TokenKind::Name {
            return None;
        }
        let mut names = vec![self.token(pos).text.clone()];
        let mut cursor = pos + 1;
        while self.is_op(cursor, ",") && self.token(cursor + 1).kind == TokenKind::Name {
            names.push(self.token(cursor + 1).text.clone());
            cursor += 2;
        }
        Some((names, cursor))
    }

    fn imports(&mut self, pos: usize) -> Option<(Vec<ImportName>, usize)> {
        if self.is_op(pos, "*") {
            return Some((Vec::new(), pos + 1));
        }
        let mut names = Vec::new();
        let mut cursor = pos;
        loop {
            let token = self.token(cursor);
            if token.kind != TokenKind::Name {
                self.expect(cursor, "identifier");
                return None;
            }
            cursor += 1;
            let mut alias = None;
            if self.is_word(cursor, "as") && self.token(cursor + 1).kind == TokenKind::Name {
                alias = Some(self.token(cursor + 1).text.clone());
                cursor += 2;
            }
            names.push(ImportName {
                name: token.text.clone(),
                alias,
            });
            if !self.is_op(cursor, ",") {
                break;
            }
            cursor += 1;
        }
        Some((names, cursor))
    }
}

fn prepend<'g>(first: &'g [Sym], rest: &[&'g [Sym]]) -> Vec<&'g [Sym]> {
    let mut frames = Vec::with_capacity(rest.len() + 1);
    frames.push(first);
    frames.extend_from_slice(rest);
    frames
}

#[cfg(test)]
mod tests;
