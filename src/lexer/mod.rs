//! Lexer module - Tokenization
//!
//! Splits source text into logical lines and classifies each line's tokens
//! with the pest grammar in `lexer.pest`. Block structure is left to the
//! indentation processor.

mod token;

pub use token::*;

use std::ops::Range;

use pest::Parser;
use pest_derive::Parser;

use crate::error::{PlainPyError, Result};

#[derive(Parser)]
#[grammar = "lexer/lexer.pest"]
pub struct LineLexer;

/// Token plus its byte range in the scanned text
pub(crate) type Spanned = (Token, Range<usize>);

/// Why a scan stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stop {
    End,
    /// A `#` comment starts at this byte offset
    Comment(usize),
    /// No token matches at this byte offset
    Invalid(usize),
}

#[derive(Debug)]
pub(crate) struct Scan {
    pub tokens: Vec<Spanned>,
    pub stop: Stop,
    /// Column just past the last scanned token
    pub end_column: usize,
}

/// Tokenize source into the raw flat stream: every logical line's tokens
/// followed by LINE_END, then END_OF_INPUT. No block markers.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let lines = lex_lines(source)?;
    let mut tokens = Vec::new();
    for line in lines {
        let (number, end_column) = (line.line, line.end_column);
        tokens.extend(line.tokens);
        tokens.push(Token::marker(TokenKind::LineEnd, number, end_column));
    }
    tokens.push(end_of_input(source));
    Ok(tokens)
}

/// Split source into logical lines
///
/// Blank lines are dropped. A comment-only line becomes a line holding one
/// COMMENT token, indented like the next code line so it never opens or
/// closes a block. Trailing comments are dropped. Lines continued inside
/// open brackets are joined into the line that opened them.
pub fn lex_lines(source: &str) -> Result<Vec<SourceLine>> {
    let mut lines = Vec::new();
    let mut pending: Option<SourceLine> = None;
    let mut comments: Vec<Token> = Vec::new();
    let mut depth = 0usize;

    for (index, raw) in source.lines().enumerate() {
        let number = index + 1;
        let content = raw.trim_start_matches([' ', '\t']);
        let indent = &raw[..raw.len() - content.len()];
        let start_column = indent.len() + 1;

        if let Some(mut current) = pending.take() {
            let (tokens, end_column) = scan_checked(content, number, start_column)?;
            if !tokens.is_empty() {
                current.end_column = end_column;
            }
            depth = track_depth(depth, &tokens);
            current.tokens.extend(tokens);
            if depth == 0 {
                lines.push(current);
            } else {
                pending = Some(current);
            }
            continue;
        }

        if content.is_empty() {
            continue;
        }
        if content.starts_with('#') {
            let text = content.trim_end();
            comments.push(Token::new(TokenKind::Comment, text, number, start_column));
            continue;
        }
        flush_comments(&mut lines, &mut comments, indent);

        if let Some(text) = raw_escape(content) {
            lines.push(SourceLine {
                line: number,
                indent: indent.to_string(),
                tokens: vec![Token::new(TokenKind::Raw, text, number, start_column)],
                end_column: raw.chars().count() + 1,
            });
            continue;
        }

        let (tokens, end_column) = scan_checked(content, number, start_column)?;
        depth = track_depth(0, &tokens);
        let line = SourceLine {
            line: number,
            indent: indent.to_string(),
            tokens,
            end_column,
        };
        if depth == 0 {
            lines.push(line);
        } else {
            pending = Some(line);
        }
    }

    // Unclosed brackets at end of input are left for the parser to report.
    if let Some(line) = pending {
        lines.push(line);
    }
    flush_comments(&mut lines, &mut comments, "");
    Ok(lines)
}

/// Emit buffered comment lines at the indentation of the line that follows
fn flush_comments(lines: &mut Vec<SourceLine>, comments: &mut Vec<Token>, indent: &str) {
    for token in comments.drain(..) {
        let end_column = token.column + token.text.chars().count();
        lines.push(SourceLine {
            line: token.line,
            indent: indent.to_string(),
            tokens: vec![token],
            end_column,
        });
    }
}

/// END_OF_INPUT marker placed on the line after the last one
pub(crate) fn end_of_input(source: &str) -> Token {
    Token::marker(TokenKind::EndOfInput, source.lines().count() + 1, 1)
}

/// Scan tokens from `text` until its end, a comment, or an unknown character
pub(crate) fn scan(text: &str, line: usize, first_column: usize) -> Scan {
    let mut tokens = Vec::new();
    let mut offset = 0;
    let mut column = first_column;
    let mut end_column = first_column;

    loop {
        let rest = &text[offset..];
        let trimmed = rest.trim_start_matches([' ', '\t']);
        let skipped = rest.len() - trimmed.len();
        offset += skipped;
        column += skipped;

        if trimmed.is_empty() {
            return Scan {
                tokens,
                stop: Stop::End,
                end_column,
            };
        }
        if trimmed.starts_with('#') {
            return Scan {
                tokens,
                stop: Stop::Comment(offset),
                end_column,
            };
        }

        match next_token(trimmed) {
            Some((kind, lexeme)) => {
                let text = match kind {
                    TokenKind::Keyword => canonical_phrase(lexeme),
                    _ => lexeme.to_string(),
                };
                tokens.push((Token::new(kind, text, line, column), offset..offset + lexeme.len()));
                column += lexeme.chars().count();
                offset += lexeme.len();
                end_column = column;
            }
            None => {
                return Scan {
                    tokens,
                    stop: Stop::Invalid(offset),
                    end_column,
                }
            }
        }
    }
}

/// Match a single token at the start of `text`
fn next_token(text: &str) -> Option<(TokenKind, &str)> {
    let pair = LineLexer::parse(Rule::token, text).ok()?.next()?;
    let inner = pair.into_inner().next()?;
    let kind = match inner.as_rule() {
        Rule::string => TokenKind::String,
        Rule::number => TokenKind::Number,
        Rule::keyword => TokenKind::Keyword,
        Rule::name => TokenKind::Name,
        Rule::operator => TokenKind::Operator,
        _ => return None,
    };
    let lexeme = inner.as_str();
    // Every token must consume input, or the scan would not progress.
    if lexeme.is_empty() {
        return None;
    }
    Some((kind, lexeme))
}

fn scan_checked(content: &str, line: usize, start_column: usize) -> Result<(Vec<Token>, usize)> {
    let scan = scan(content, line, start_column);
    if let Stop::Invalid(offset) = scan.stop {
        let ch = content[offset..].chars().next().unwrap_or(' ');
        return Err(PlainPyError::LexError {
            line,
            column: start_column + content[..offset].chars().count(),
            ch,
        });
    }
    let tokens = scan.tokens.into_iter().map(|(token, _)| token).collect();
    Ok((tokens, scan.end_column))
}

fn track_depth(mut depth: usize, tokens: &[Token]) -> usize {
    for token in tokens.iter().filter(|t| t.kind == TokenKind::Operator) {
        match token.text.as_str() {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth
}

fn raw_escape(content: &str) -> Option<String> {
    let pair = LineLexer::parse(Rule::raw_escape, content).ok()?.next()?;
    let text = pair.into_inner().find(|p| p.as_rule() == Rule::raw_text)?;
    Some(text.as_str().trim_end().to_string())
}

/// Keyword phrases keep their words but collapse inner whitespace
fn canonical_phrase(lexeme: &str) -> String {
    lexeme.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds_and_texts(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_tokenize_empty() {
        let tokens = tokenize("").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::EndOfInput);
    }

    #[test]
    fn test_tokenize_say_hello() {
        let tokens = kinds_and_texts("say \"Hello\"");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Name, "say".to_string()),
                (TokenKind::String, "\"Hello\"".to_string()),
                (TokenKind::LineEnd, String::new()),
                (TokenKind::EndOfInput, String::new()),
            ]
        );
    }

    #[test]
    fn test_flat_stream_ends_lines_without_blocks() {
        let tokens = tokenize("if a:\n    say 1\n").unwrap();
        let line_ends = tokens.iter().filter(|t| t.kind == TokenKind::LineEnd).count();
        assert_eq!(line_ends, 2);
        assert!(tokens
            .iter()
            .all(|t| !matches!(t.kind, TokenKind::BlockStart | TokenKind::BlockEnd)));
    }

    #[test]
    fn test_longest_phrase_wins() {
        let tokens = kinds_and_texts("if x is greater than or equal to y:");
        assert_eq!(tokens[2], (TokenKind::Keyword, "is greater than or equal to".to_string()));
        assert_eq!(tokens[3], (TokenKind::Name, "y".to_string()));
    }

    #[test]
    fn test_phrase_falls_back_to_shorter() {
        // "or" is followed by a name, so the long phrase cannot match
        let tokens = kinds_and_texts("x is greater than y or z");
        assert_eq!(tokens[1], (TokenKind::Keyword, "is greater than".to_string()));
        assert_eq!(tokens[3], (TokenKind::Keyword, "or".to_string()));
    }

    #[test]
    fn test_phrase_whitespace_is_canonical() {
        let tokens = kinds_and_texts("x is   not\tin y");
        assert_eq!(tokens[1], (TokenKind::Keyword, "is not in".to_string()));
    }

    #[test]
    fn test_keywords_need_word_boundary() {
        let tokens = kinds_and_texts("island = isolated + is_ok");
        assert_eq!(tokens[0], (TokenKind::Name, "island".to_string()));
        assert_eq!(tokens[2], (TokenKind::Name, "isolated".to_string()));
        assert_eq!(tokens[4], (TokenKind::Name, "is_ok".to_string()));
    }

    #[test]
    fn test_is_followed_by_partial_word() {
        // "is overt" must not become "is over" + "t"
        let tokens = kinds_and_texts("x is overt");
        assert_eq!(tokens[1], (TokenKind::Keyword, "is".to_string()));
        assert_eq!(tokens[2], (TokenKind::Name, "overt".to_string()));
    }

    #[test]
    fn test_numbers_and_operators() {
        let tokens = kinds_and_texts("x **= 1_000 + .5 // 0xFF");
        let texts: Vec<_> = tokens.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(texts, vec!["x", "**=", "1_000", "+", ".5", "//", "0xFF", "", ""]);
        assert_eq!(tokens[2].0, TokenKind::Number);
        assert_eq!(tokens[1].0, TokenKind::Operator);
    }

    #[test]
    fn test_string_prefixes_and_escapes() {
        let tokens = kinds_and_texts(r#"say f"Hi {name}", 'it\'s', r"\d""#);
        assert_eq!(tokens[1], (TokenKind::String, "f\"Hi {name}\"".to_string()));
        assert_eq!(tokens[3], (TokenKind::String, r"'it\'s'".to_string()));
        assert_eq!(tokens[5], (TokenKind::String, r#"r"\d""#.to_string()));
    }

    #[test]
    fn test_trailing_comments_are_dropped() {
        let tokens = kinds_and_texts("say 1  # trailing\n");
        let texts: Vec<_> = tokens.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(texts, vec!["say", "1", "", ""]);
    }

    #[test]
    fn test_comment_lines_take_next_indent() {
        let lines = lex_lines("if a:\n# note  \n    say 1\n    # last\n").unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1].tokens[0].kind, TokenKind::Comment);
        assert_eq!(lines[1].tokens[0].text, "# note");
        assert_eq!(lines[1].indent, "    ");
        assert_eq!(lines[1].end_column, 7);
        assert_eq!(lines[3].tokens[0].column, 5);
        assert_eq!(lines[3].indent, "");
    }

    #[test]
    fn test_comment_inside_brackets_is_dropped() {
        let lines = lex_lines("items = [\n    # first\n    1,\n]\n").unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].tokens.iter().all(|t| t.kind != TokenKind::Comment));
    }

    #[test]
    fn test_walrus_and_bar_operators() {
        let tokens = kinds_and_texts("(n := 1) | 2");
        assert_eq!(tokens[2], (TokenKind::Operator, ":=".to_string()));
        assert_eq!(tokens[5], (TokenKind::Operator, "|".to_string()));
    }

    #[test]
    fn test_hash_inside_string_is_not_comment() {
        let tokens = kinds_and_texts("say \"#1\"");
        assert_eq!(tokens[1], (TokenKind::String, "\"#1\"".to_string()));
    }

    #[test]
    fn test_brackets_join_lines() {
        let lines = lex_lines("names = [\n    \"a\",\n    \"b\"\n]\nsay names").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].tokens.len(), 7);
        assert_eq!(lines[1].line, 5);
    }

    #[test]
    fn test_raw_escape_line() {
        let lines = lex_lines("    python: x = {k: v for k, v in d.items()}").unwrap();
        assert_eq!(lines[0].indent, "    ");
        assert_eq!(lines[0].tokens[0].kind, TokenKind::Raw);
        assert_eq!(lines[0].tokens[0].text, "x = {k: v for k, v in d.items()}");
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("say 1\n  show x").unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 5));
        assert_eq!((tokens[3].line, tokens[3].column), (2, 3));
        assert_eq!((tokens[4].line, tokens[4].column), (2, 8));
    }

    #[test]
    fn test_unknown_character_is_lex_error() {
        let err = tokenize("say 1\nx = 5 $ 3").unwrap_err();
        match err {
            PlainPyError::LexError { line, column, ch } => {
                assert_eq!((line, column, ch), (2, 7, '$'));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_string_is_lex_error() {
        let err = tokenize("say \"oops").unwrap_err();
        assert!(matches!(err, PlainPyError::LexError { column: 5, ch: '"', .. }));
    }

    #[test]
    fn test_scan_reports_comment_offset() {
        let scan = scan("x = 1 # note", 1, 1);
        assert_eq!(scan.tokens.len(), 3);
        assert_eq!(scan.stop, Stop::Comment(6));
    }
}
