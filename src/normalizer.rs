//! Condition/Operator normalizer
//!
//! Maps natural-language comparison phrases to canonical operators. The
//! lexer already groups a phrase into one KEYWORD token (longest phrase
//! first), so normalization is a lookup in [`COMPARISON_PHRASES`].
//!
//! The one-word phrases `above`, `below` and `equals` are comparisons only
//! between two operands. Anywhere else they are ordinary identifiers, so
//! `above = 10` assigns a variable.
//!
//! [`normalize_tokens`] is the pipeline pass; [`normalize`] applies the same
//! table to plain text, leaving string literals, comments and everything it
//! cannot lex untouched.

use crate::lexer::{self, Token, TokenKind};

/// Phrase → canonical operator, in precedence order
///
/// When two phrases could match at the same position the lexer prefers the
/// one listed first here.
pub const COMPARISON_PHRASES: &[(&str, &str)] = &[
    ("is greater than or equal to", ">="),
    ("is less than or equal to", "<="),
    ("greater than or equal to", ">="),
    ("less than or equal to", "<="),
    ("is not equal to", "!="),
    ("is greater than", ">"),
    ("is less than", "<"),
    ("is equal to", "=="),
    ("not equal to", "!="),
    ("is at least", ">="),
    ("is at most", "<="),
    ("is not in", "not in"),
    ("greater than", ">"),
    ("less than", "<"),
    ("equal to", "=="),
    ("is over", ">"),
    ("is above", ">"),
    ("is under", "<"),
    ("is below", "<"),
    ("is not", "!="),
    ("is in", "in"),
    ("not in", "not in"),
    ("above", ">"),
    ("below", "<"),
    ("equals", "=="),
    ("is", "=="),
];

/// Phrases that are also usable as names
pub const BARE_WORDS: &[&str] = &["above", "below", "equals"];

/// Canonical operator for a (whitespace-collapsed) phrase
pub fn canonical_operator(phrase: &str) -> Option<&'static str> {
    COMPARISON_PHRASES
        .iter()
        .find(|(p, _)| *p == phrase)
        .map(|(_, op)| *op)
}

/// Rewrite one token if it is a comparison phrase
///
/// Symbolic results become OPERATOR tokens; `in` and `not in` stay keywords.
pub fn normalize_token(token: Token) -> Token {
    if token.kind != TokenKind::Keyword {
        return token;
    }
    match canonical_operator(&token.text) {
        Some(op) => {
            let kind = if matches!(op, "in" | "not in") {
                TokenKind::Keyword
            } else {
                TokenKind::Operator
            };
            Token::new(kind, op, token.line, token.column)
        }
        None => token,
    }
}

fn ends_operand(token: &Token) -> bool {
    match token.kind {
        TokenKind::Name | TokenKind::Number | TokenKind::String => true,
        TokenKind::Operator => matches!(token.text.as_str(), ")" | "]" | "}"),
        TokenKind::Keyword => matches!(token.text.as_str(), "True" | "False" | "None"),
        _ => false,
    }
}

fn starts_operand(token: &Token) -> bool {
    match token.kind {
        TokenKind::Name | TokenKind::Number | TokenKind::String => true,
        TokenKind::Operator => matches!(token.text.as_str(), "(" | "[" | "{" | "-" | "+" | "~"),
        TokenKind::Keyword => {
            matches!(
                token.text.as_str(),
                "True" | "False" | "None" | "not" | "lambda" | "await"
            ) || BARE_WORDS.contains(&token.text.as_str())
        }
        _ => false,
    }
}

/// Rewrite one token given its neighbours
///
/// `previous` must already be normalized. A bare word outside operator
/// position becomes a NAME.
pub fn normalize_in_context(token: Token, previous: Option<&Token>, next: Option<&Token>) -> Token {
    let bare = token.kind == TokenKind::Keyword && BARE_WORDS.contains(&token.text.as_str());
    if bare && !(previous.is_some_and(ends_operand) && next.is_some_and(starts_operand)) {
        return Token::new(TokenKind::Name, token.text, token.line, token.column);
    }
    normalize_token(token)
}

/// Pipeline pass over the block-annotated stream
pub fn normalize_tokens(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut rest = tokens.into_iter().peekable();
    while let Some(token) = rest.next() {
        let token = normalize_in_context(token, out.last(), rest.peek());
        out.push(token);
    }
    out
}

/// Normalize comparison phrases in free text
///
/// Pure and idempotent: running it on its own output changes nothing.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut lines = text.split('\n').peekable();
    while let Some(line) = lines.next() {
        normalize_line(line, &mut out);
        if lines.peek().is_some() {
            out.push('\n');
        }
    }
    out
}

fn normalize_line(line: &str, out: &mut String) {
    let scan = lexer::scan(line, 1, 1);
    let mut copied = 0;
    let mut previous: Option<Token> = None;
    for (index, (token, span)) in scan.tokens.iter().enumerate() {
        let next = scan.tokens.get(index + 1).map(|(t, _)| t);
        let normalized = normalize_in_context(token.clone(), previous.as_ref(), next);
        let rewritten = token.kind == TokenKind::Keyword
            && normalized.kind != TokenKind::Name
            && canonical_operator(&token.text).is_some();
        if rewritten {
            out.push_str(&line[copied..span.start]);
            out.push_str(&normalized.text);
            copied = span.end;
        }
        previous = Some(normalized);
    }
    // Whatever follows the last rewrite, including a comment or an unlexable
    // remainder where the scan stopped, is copied verbatim.
    out.push_str(&line[copied..]);
}
