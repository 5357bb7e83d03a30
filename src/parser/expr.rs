//! Expression parsing
//!
//! Precedence climbing over a fixed table, loosest first:
//!
//! | level      | forms                                   |
//! |------------|-----------------------------------------|
//! | named      | `n := e`                                |
//! | lambda     | `lambda a, b: e`, `x => e`              |
//! | ternary    | `a if cond else b`                      |
//! | or / and   | boolean connectives                     |
//! | not        | prefix `not`                            |
//! | comparison | `== != < <= > >= in not in` (chained)   |
//! | arith      | `+ -`                                   |
//! | term       | `* / // % @`                            |
//! | unary      | prefix `- + ~`                          |
//! | power      | `**` (right associative)                |
//! | await      | prefix `await`                          |
//! | postfix    | attribute, call, subscript              |
//!
//! Expression helpers return `None` on failure and never raise; the caller
//! decides whether a miss is a backtrack or an error.

use super::ast::*;
use super::Parser;
use crate::lexer::{Token, TokenKind};

type Parsed<T> = Option<(T, usize)>;

/// Comparison operator carried by a normalized token
pub(crate) fn comparison_op(token: &Token) -> Option<CmpOp> {
    match token.kind {
        TokenKind::Operator => match token.text.as_str() {
            "==" | "!=" | "<" | "<=" | ">" | ">=" => CmpOp::from_symbol(&token.text),
            _ => None,
        },
        TokenKind::Keyword => match token.text.as_str() {
            "in" | "not in" => CmpOp::from_symbol(&token.text),
            _ => None,
        },
        _ => None,
    }
}

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    Expr::BinOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Call {
        func: Box::new(Expr::Name(name.to_string())),
        args: args.into_iter().map(Arg::Positional).collect(),
    }
}

fn method_call(value: Expr, method: &str, args: Vec<Expr>) -> Expr {
    Expr::Call {
        func: Box::new(Expr::Attribute {
            value: Box::new(value),
            attr: method.to_string(),
        }),
        args: args.into_iter().map(Arg::Positional).collect(),
    }
}

impl<'t, 'g> Parser<'t, 'g> {
    pub(super) fn expression(&mut self, pos: usize) -> Parsed<Expr> {
        let token = self.token(pos);
        if token.kind == TokenKind::Name && self.is_op(pos + 1, ":=") {
            let (value, next) = self.expression(pos + 2)?;
            let named = Expr::NamedExpr {
                target: token.text.clone(),
                value: Box::new(value),
            };
            return Some((named, next));
        }
        if let Some(found) = self.lambda(pos) {
            return Some(found);
        }
        let (body, next) = self.or_test(pos)?;
        if self.is_word(next, "if") {
            if let Some((test, after_test)) = self.or_test(next + 1) {
                if self.is_word(after_test, "else") {
                    if let Some((orelse, end)) = self.expression(after_test + 1) {
                        let ternary = Expr::IfExp {
                            test: Box::new(test),
                            body: Box::new(body),
                            orelse: Box::new(orelse),
                        };
                        return Some((ternary, end));
                    }
                } else {
                    self.expect(after_test, "`else`");
                }
            }
        }
        Some((body, next))
    }

    /// Comma-separated expressions; two or more form a tuple
    pub(super) fn expression_list(&mut self, pos: usize) -> Parsed<Expr> {
        let (first, mut cursor) = self.expression(pos)?;
        let mut items = vec![first];
        while self.is_op(cursor, ",") {
            match self.expression(cursor + 1) {
                Some((item, next)) => {
                    items.push(item);
                    cursor = next;
                }
                None => break,
            }
        }
        if items.len() == 1 {
            items.pop().map(|e| (e, cursor))
        } else {
            Some((Expr::Tuple(items), cursor))
        }
    }

    /// Assignable expression
    pub(super) fn target(&mut self, pos: usize) -> Parsed<Expr> {
        let (expr, next) = self.postfix(pos)?;
        match expr {
            Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. } => Some((expr, next)),
            _ => {
                self.expect(pos, "assignment target");
                None
            }
        }
    }

    pub(super) fn target_list(&mut self, pos: usize) -> Parsed<Expr> {
        let (first, mut cursor) = self.target(pos)?;
        let mut items = vec![first];
        while self.is_op(cursor, ",") {
            match self.target(cursor + 1) {
                Some((item, next)) => {
                    items.push(item);
                    cursor = next;
                }
                None => break,
            }
        }
        if items.len() == 1 {
            items.pop().map(|e| (e, cursor))
        } else {
            Some((Expr::Tuple(items), cursor))
        }
    }

    fn lambda(&mut self, pos: usize) -> Parsed<Expr> {
        let token = self.token(pos);
        if token.is_word("lambda") {
            let mut params = Vec::new();
            let mut cursor = pos + 1;
            if self.token(cursor).kind == TokenKind::Name {
                let (names, next) = self.names(cursor)?;
                params = names;
                cursor = next;
            }
            if !self.is_op(cursor, ":") {
                self.expect(cursor, "`:`");
                return None;
            }
            let (body, end) = self.expression(cursor + 1)?;
            return Some((
                Expr::Lambda {
                    params,
                    body: Box::new(body),
                },
                end,
            ));
        }
        if token.kind == TokenKind::Name && self.is_op(pos + 1, "=>") {
            let (body, end) = self.expression(pos + 2)?;
            return Some((
                Expr::Lambda {
                    params: vec![token.text.clone()],
                    body: Box::new(body),
                },
                end,
            ));
        }
        None
    }

    fn or_test(&mut self, pos: usize) -> Parsed<Expr> {
        let (mut left, mut cursor) = self.and_test(pos)?;
        while self.is_word(cursor, "or") {
            let Some((right, next)) = self.and_test(cursor + 1) else {
                break;
            };
            left = binary(left, BinOp::Or, right);
            cursor = next;
        }
        Some((left, cursor))
    }

    fn and_test(&mut self, pos: usize) -> Parsed<Expr> {
        let (mut left, mut cursor) = self.not_test(pos)?;
        while self.is_word(cursor, "and") {
            let Some((right, next)) = self.not_test(cursor + 1) else {
                break;
            };
            left = binary(left, BinOp::And, right);
            cursor = next;
        }
        Some((left, cursor))
    }

    fn not_test(&mut self, pos: usize) -> Parsed<Expr> {
        if self.is_word(pos, "not") {
            let (operand, next) = self.not_test(pos + 1)?;
            return Some((
                Expr::UnaryOp {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                next,
            ));
        }
        self.comparison(pos)
    }

    fn comparison(&mut self, pos: usize) -> Parsed<Expr> {
        let (left, mut cursor) = self.arith(pos)?;
        let mut ops = Vec::new();
        while let Some(op) = comparison_op(self.token(cursor)) {
            let Some((right, next)) = self.arith(cursor + 1) else {
                break;
            };
            ops.push((op, right));
            cursor = next;
        }
        if ops.is_empty() {
            Some((left, cursor))
        } else {
            Some((
                Expr::Compare {
                    left: Box::new(left),
                    ops,
                },
                cursor,
            ))
        }
    }

    /// Sums and everything tighter; never reads a comparison or connective
    pub(super) fn arith(&mut self, pos: usize) -> Parsed<Expr> {
        let (mut left, mut cursor) = self.term(pos)?;
        loop {
            let op = match self.token(cursor) {
                t if t.is_op("+") => BinOp::Add,
                t if t.is_op("-") => BinOp::Sub,
                _ => break,
            };
            let Some((right, next)) = self.term(cursor + 1) else {
                break;
            };
            left = binary(left, op, right);
            cursor = next;
        }
        Some((left, cursor))
    }

    fn term(&mut self, pos: usize) -> Parsed<Expr> {
        let (mut left, mut cursor) = self.factor(pos)?;
        loop {
            let token = self.token(cursor);
            let op = match token.text.as_str() {
                "*" => BinOp::Mul,
                "/" => BinOp::Div,
                "//" => BinOp::FloorDiv,
                "%" => BinOp::Mod,
                "@" => BinOp::MatMul,
                _ => break,
            };
            if token.kind != TokenKind::Operator {
                break;
            }
            let Some((right, next)) = self.factor(cursor + 1) else {
                break;
            };
            left = binary(left, op, right);
            cursor = next;
        }
        Some((left, cursor))
    }

    fn factor(&mut self, pos: usize) -> Parsed<Expr> {
        let token = self.token(pos);
        let op = match token.text.as_str() {
            "-" if token.kind == TokenKind::Operator => Some(UnaryOp::Neg),
            "+" if token.kind == TokenKind::Operator => Some(UnaryOp::Pos),
            "~" if token.kind == TokenKind::Operator => Some(UnaryOp::Invert),
            _ => None,
        };
        match op {
            Some(op) => {
                let (operand, next) = self.factor(pos + 1)?;
                Some((
                    Expr::UnaryOp {
                        op,
                        operand: Box::new(operand),
                    },
                    next,
                ))
            }
            None => self.power(pos),
        }
    }

    fn power(&mut self, pos: usize) -> Parsed<Expr> {
        let (base, cursor) = self.await_expr(pos)?;
        if self.is_op(cursor, "**") {
            if let Some((exponent, next)) = self.factor(cursor + 1) {
                return Some((binary(base, BinOp::Pow, exponent), next));
            }
        }
        Some((base, cursor))
    }

    fn await_expr(&mut self, pos: usize) -> Parsed<Expr> {
        if self.is_word(pos, "await") {
            let (value, next) = self.postfix(pos + 1)?;
            return Some((Expr::Await(Box::new(value)), next));
        }
        self.postfix(pos)
    }

    // ========================================================================
    // Postfix trailers and atoms
    // ========================================================================

    pub(super) fn postfix(&mut self, pos: usize) -> Parsed<Expr> {
        let (mut value, mut cursor) = self.atom(pos)?;
        loop {
            if self.is_op(cursor, ".") {
                let attr = self.token(cursor + 1);
                if attr.kind != TokenKind::Name {
                    self.expect(cursor + 1, "identifier");
                    break;
                }
                value = Expr::Attribute {
                    value: Box::new(value),
                    attr: attr.text.clone(),
                };
                cursor += 2;
            } else if self.is_op(cursor, "(") {
                let (args, next) = self.call_args(cursor + 1);
                if !self.is_op(next, ")") {
                    self.expect(next, "`)`");
                    return None;
                }
                value = Expr::Call {
                    func: Box::new(value),
                    args,
                };
                cursor = next + 1;
            } else if self.is_op(cursor, "[") {
                let (index, next) = self.subscript(cursor + 1)?;
                if !self.is_op(next, "]") {
                    self.expect(next, "`]`");
                    return None;
                }
                value = Expr::Subscript {
                    value: Box::new(value),
                    index: Box::new(index),
                };
                cursor = next + 1;
            } else {
                break;
            }
        }
        Some((value, cursor))
    }

    fn subscript(&mut self, pos: usize) -> Parsed<Expr> {
        let mut cursor = pos;
        let lower = if self.is_op(cursor, ":") {
            None
        } else {
            let (index, next) = self.expression_list(cursor)?;
            if !self.is_op(next, ":") {
                return Some((index, next));
            }
            cursor = next;
            Some(Box::new(index))
        };
        cursor += 1;

        let mut upper = None;
        if !self.is_op(cursor, "]") && !self.is_op(cursor, ":") {
            let (bound, next) = self.expression(cursor)?;
            upper = Some(Box::new(bound));
            cursor = next;
        }
        let mut step = None;
        if self.is_op(cursor, ":") {
            cursor += 1;
            if !self.is_op(cursor, "]") {
                let (stride, next) = self.expression(cursor)?;
                step = Some(Box::new(stride));
                cursor = next;
            }
        }
        Some((Expr::Slice { lower, upper, step }, cursor))
    }

    /// Call arguments up to the first token that cannot continue them
    pub(super) fn call_args(&mut self, pos: usize) -> (Vec<Arg>, usize) {
        let mut args = Vec::new();
        let mut cursor = pos;
        while let Some((arg, next)) = self.argument(cursor) {
            args.push(arg);
            cursor = next;
            if !self.is_op(cursor, ",") {
                break;
            }
            cursor += 1;
        }
        (args, cursor)
    }

    fn argument(&mut self, pos: usize) -> Parsed<Arg> {
        if self.is_op(pos, "**") {
            let (value, next) = self.expression(pos + 1)?;
            return Some((Arg::DoubleStar(value), next));
        }
        if self.is_op(pos, "*") {
            let (value, next) = self.expression(pos + 1)?;
            return Some((Arg::Star(value), next));
        }
        let token = self.token(pos);
        if token.kind == TokenKind::Name && self.is_op(pos + 1, "=") {
            let (value, next) = self.expression(pos + 2)?;
            return Some((Arg::Keyword(token.text.clone(), value), next));
        }
        let (value, next) = self.expression(pos)?;
        Some((Arg::Positional(value), next))
    }

    /// `( param, ... )`
    pub(super) fn params(&mut self, pos: usize) -> Parsed<Vec<Param>> {
        if !self.is_op(pos, "(") {
            self.expect(pos, "`(`");
            return None;
        }
        let mut params = Vec::new();
        let mut cursor = pos + 1;
        while !self.is_op(cursor, ")") {
            let (param, next) = self.param(cursor)?;
            params.push(param);
            cursor = next;
            if self.is_op(cursor, ",") {
                cursor += 1;
            } else if !self.is_op(cursor, ")") {
                self.expect(cursor, "`)`");
                return None;
            }
        }
        Some((params, cursor + 1))
    }

    fn param(&mut self, pos: usize) -> Parsed<Param> {
        let (kind, mut cursor) = if self.is_op(pos, "**") {
            (ParamKind::KwArgs, pos + 1)
        } else if self.is_op(pos, "*") {
            (ParamKind::VarArgs, pos + 1)
        } else {
            (ParamKind::Normal, pos)
        };
        let token = self.token(cursor);
        if token.kind != TokenKind::Name {
            self.expect(cursor, "parameter name");
            return None;
        }
        cursor += 1;

        let mut annotation = None;
        if self.is_op(cursor, ":") {
            let (ty, next) = self.expression(cursor + 1)?;
            annotation = Some(ty);
            cursor = next;
        }
        let mut default = None;
        if self.is_op(cursor, "=") {
            let (value, next) = self.expression(cursor + 1)?;
            default = Some(value);
            cursor = next;
        }
        Some((
            Param {
                name: token.text.clone(),
                kind,
                annotation,
                default,
            },
            cursor,
        ))
    }

    fn atom(&mut self, pos: usize) -> Parsed<Expr> {
        if let Some(found) = self.phrase_atom(pos) {
            return Some(found);
        }
        let token = self.token(pos);
        match token.kind {
            TokenKind::Name => Some((Expr::Name(token.text.clone()), pos + 1)),
            TokenKind::Number => Some((Expr::Number(token.text.clone()), pos + 1)),
            TokenKind::String => Some((Expr::Str(token.text.clone()), pos + 1)),
            TokenKind::Keyword => match token.text.as_str() {
                "True" => Some((Expr::Bool(true), pos + 1)),
                "False" => Some((Expr::Bool(false), pos + 1)),
                "None" => Some((Expr::NoneLiteral, pos + 1)),
                _ => {
                    self.expect(pos, "expression");
                    None
                }
            },
            TokenKind::Operator => match token.text.as_str() {
                "(" => self.parenthesized(pos + 1),
                "[" => self.list_display(pos + 1),
                "{" => self.brace_display(pos + 1),
                _ => {
                    self.expect(pos, "expression");
                    None
                }
            },
            _ => {
                self.expect(pos, "expression");
                None
            }
        }
    }

    /// Contents after `(`: grouping or tuple
    fn parenthesized(&mut self, pos: usize) -> Parsed<Expr> {
        if self.is_op(pos, ")") {
            return Some((Expr::Tuple(Vec::new()), pos + 1));
        }
        let (first, mut cursor) = self.expression(pos)?;
        let mut items = vec![first];
        let mut is_tuple = false;
        while self.is_op(cursor, ",") {
            is_tuple = true;
            cursor += 1;
            if self.is_op(cursor, ")") {
                break;
            }
            let (item, next) = self.expression(cursor)?;
            items.push(item);
            cursor = next;
        }
        if !self.is_op(cursor, ")") {
            self.expect(cursor, "`)`");
            return None;
        }
        let expr = if is_tuple {
            Expr::Tuple(items)
        } else {
            items.pop()?
        };
        Some((expr, cursor + 1))
    }

    /// Contents after `[`: list literal or comprehension
    fn list_display(&mut self, pos: usize) -> Parsed<Expr> {
        if self.is_op(pos, "]") {
            return Some((Expr::List(Vec::new()), pos + 1));
        }
        let (first, mut cursor) = self.expression(pos)?;

        if self.is_word(cursor, "for") {
            let (targets, next) = self.names(cursor + 1)?;
            if !self.is_word(next, "in") {
                self.expect(next, "`in`");
                return None;
            }
            let (iter, next) = self.or_test(next + 1)?;
            cursor = next;
            let mut condition = None;
            if self.is_word(cursor, "if") {
                let (test, next) = self.or_test(cursor + 1)?;
                condition = Some(Box::new(test));
                cursor = next;
            }
            if !self.is_op(cursor, "]") {
                self.expect(cursor, "`]`");
                return None;
            }
            let comprehension = Expr::ListComp {
                element: Box::new(first),
                targets,
                iter: Box::new(iter),
                condition,
            };
            return Some((comprehension, cursor + 1));
        }

        let (items, end) = self.remaining_items(first, cursor, "]")?;
        Some((Expr::List(items), end))
    }

    /// Contents after `{`: dict or set literal
    fn brace_display(&mut self, pos: usize) -> Parsed<Expr> {
        if self.is_op(pos, "}") {
            return Some((Expr::Dict(Vec::new()), pos + 1));
        }
        let (first, cursor) = self.expression(pos)?;
        if !self.is_op(cursor, ":") {
            let (items, end) = self.remaining_items(first, cursor, "}")?;
            return Some((Expr::Set(items), end));
        }

        let (value, mut cursor) = self.expression(cursor + 1)?;
        let mut entries = vec![(first, value)];
        while self.is_op(cursor, ",") {
            cursor += 1;
            if self.is_op(cursor, "}") {
                break;
            }
            let (key, next) = self.expression(cursor)?;
            if !self.is_op(next, ":") {
                self.expect(next, "`:`");
                return None;
            }
            let (value, next) = self.expression(next + 1)?;
            entries.push((key, value));
            cursor = next;
        }
        if !self.is_op(cursor, "}") {
            self.expect(cursor, "`}`");
            return None;
        }
        Some((Expr::Dict(entries), cursor + 1))
    }

    /// `, item ...` up to the closing bracket
    fn remaining_items(&mut self, first: Expr, mut cursor: usize, close: &str) -> Parsed<Vec<Expr>> {
        let mut items = vec![first];
        while self.is_op(cursor, ",") {
            cursor += 1;
            if self.is_op(cursor, close) {
                break;
            }
            let (item, next) = self.expression(cursor)?;
            items.push(item);
            cursor = next;
        }
        if !self.is_op(cursor, close) {
            self.expect(cursor, format!("`{close}`"));
            return None;
        }
        Some((items, cursor + 1))
    }

    // ========================================================================
    // Phrase atoms
    // ========================================================================

    /// Position after `words` if they all follow from `pos`
    fn words(&self, pos: usize, words: &[&str]) -> Option<usize> {
        words
            .iter()
            .enumerate()
            .all(|(i, w)| self.is_word(pos + i, w))
            .then_some(pos + words.len())
    }

    fn first_words(&self, pos: usize, options: &[&[&str]]) -> Option<usize> {
        options.iter().find_map(|words| self.words(pos, words))
    }

    /// English phrases that read as a single value
    fn phrase_atom(&mut self, pos: usize) -> Parsed<Expr> {
        if let Some(cursor) = self.words(pos, &["random", "number", "from"]) {
            if let Some(found) = self.random_range(cursor, "to") {
                return Some(found);
            }
        }
        if let Some(cursor) = self.first_words(
            pos,
            &[&["random", "number", "between"], &["random", "between"]],
        ) {
            if let Some(found) = self.random_range(cursor, "and") {
                return Some(found);
            }
        }
        if let Some(cursor) = self.first_words(
            pos,
            &[&["random", "choice", "from"], &["random", "item", "from"]],
        ) {
            if let Some((seq, next)) = self.postfix(cursor) {
                return Some((Expr::Builtin(Builtin::RandomChoice(Box::new(seq))), next));
            }
        }
        if let Some(next) = self.words(pos, &["current", "time"]) {
            return Some((Expr::Builtin(Builtin::Now), next));
        }
        if let Some(next) = self.words(pos, &["current", "date"]) {
            return Some((Expr::Builtin(Builtin::Today), next));
        }
        if let Some(cursor) = self.first_words(
            pos,
            &[&["length", "of"], &["size", "of"], &["count", "items", "in"]],
        ) {
            if let Some((seq, next)) = self.postfix(cursor) {
                return Some((call("len", vec![seq]), next));
            }
        }
        if let Some(cursor) = self.first_words(
            pos,
            &[&["first", "item", "in"], &["first", "item", "of"]],
        ) {
            if let Some(found) = self.indexed(cursor, "0") {
                return Some(found);
            }
        }
        if let Some(cursor) = self.first_words(
            pos,
            &[&["last", "item", "in"], &["last", "item", "of"]],
        ) {
            if let Some(found) = self.indexed(cursor, "-1") {
                return Some(found);
            }
        }
        if let Some(cursor) = self.words(pos, &["slice"]) {
            if let Some(found) = self.slice_phrase(cursor) {
                return Some(found);
            }
        }
        if let Some(cursor) = self.first_words(pos, &[&["file", "exists"], &["exists", "file"]]) {
            if let Some((path, next)) = self.postfix(cursor) {
                return Some((Expr::Builtin(Builtin::FileExists(Box::new(path))), next));
            }
        }
        self.verb_phrase(pos)
    }

    /// Math, string and list verbs: `add a and b`, `uppercase name`, ...
    ///
    /// The verb only reads as a phrase when a plain operand follows it, so
    /// `sort(items)`, `order[0]` and `add = 1` keep their usual meaning.
    fn verb_phrase(&mut self, pos: usize) -> Parsed<Expr> {
        let verb = self.token(pos);
        if verb.kind != TokenKind::Name || self.token(pos + 1).kind == TokenKind::Operator {
            return None;
        }
        let cursor = pos + 1;
        match verb.text.as_str() {
            "add" | "sum" => {
                let ((a, b), next) = self.operand_pair(cursor, &["and", "plus"], false)?;
                Some((binary(a, BinOp::Add, b), next))
            }
            "subtract" => {
                let ((a, b), next) = self.operand_pair(cursor, &["from"], false)?;
                Some((binary(b, BinOp::Sub, a), next))
            }
            "multiply" => {
                let ((a, b), next) = self.operand_pair(cursor, &["by"], false)?;
                Some((binary(a, BinOp::Mul, b), next))
            }
            "divide" => {
                let ((a, b), next) = self.operand_pair(cursor, &["by"], false)?;
                Some((binary(a, BinOp::Div, b), next))
            }
            "join" | "combine" => {
                let ((items, separator), next) = self.operand_pair(cursor, &["with"], true)?;
                Some((method_call(separator, "join", vec![items]), next))
            }
            "split" | "separate" => {
                let ((text, separator), next) = self.operand_pair(cursor, &["by"], true)?;
                Some((method_call(text, "split", vec![separator]), next))
            }
            "uppercase" | "lowercase" => {
                let (text, next) = self.postfix(cursor)?;
                let method = if verb.text == "uppercase" { "upper" } else { "lower" };
                Some((method_call(text, method, Vec::new()), next))
            }
            "reverse" | "flip" => {
                let (seq, next) = self.postfix(cursor)?;
                Some((call("list", vec![call("reversed", vec![seq])]), next))
            }
            "sort" | "order" => {
                let (seq, next) = self.postfix(cursor)?;
                Some((call("sorted", vec![seq]), next))
            }
            _ => None,
        }
    }

    /// `A <separator> B`; operands are sums, or postfix chains when `tight`
    fn operand_pair(&mut self, pos: usize, separators: &[&str], tight: bool) -> Parsed<(Expr, Expr)> {
        let (first, cursor) = if tight { self.postfix(pos)? } else { self.arith(pos)? };
        if !separators.iter().any(|s| self.is_word(cursor, s)) {
            return None;
        }
        let (second, next) = if tight {
            self.postfix(cursor + 1)?
        } else {
            self.arith(cursor + 1)?
        };
        Some(((first, second), next))
    }

    fn random_range(&mut self, pos: usize, separator: &str) -> Parsed<Expr> {
        let (low, cursor) = self.arith(pos)?;
        if !self.is_word(cursor, separator) {
            self.expect(cursor, format!("`{separator}`"));
            return None;
        }
        let (high, next) = self.arith(cursor + 1)?;
        let random = Builtin::RandomInt {
            low: Box::new(low),
            high: Box::new(high),
        };
        Some((Expr::Builtin(random), next))
    }

    fn indexed(&mut self, pos: usize, index: &str) -> Parsed<Expr> {
        let (seq, next) = self.postfix(pos)?;
        Some((
            Expr::Subscript {
                value: Box::new(seq),
                index: Box::new(Expr::Number(index.to_string())),
            },
            next,
        ))
    }

    /// `slice X from A to B`
    fn slice_phrase(&mut self, pos: usize) -> Parsed<Expr> {
        let (seq, cursor) = self.postfix(pos)?;
        if !self.is_word(cursor, "from") {
            return None;
        }
        let (lower, cursor) = self.arith(cursor + 1)?;
        if !self.is_word(cursor, "to") {
            self.expect(cursor, "`to`");
            return None;
        }
        let (upper, next) = self.arith(cursor + 1)?;
        let slice = Expr::Slice {
            lower: Some(Box::new(lower)),
            upper: Some(Box::new(upper)),
            step: None,
        };
        Some((
            Expr::Subscript {
                value: Box::new(seq),
                index: Box::new(slice),
            },
            next,
        ))
    }

    // ========================================================================
    // Case patterns
    // ========================================================================

    /// `p | q`, `p or q`, `a, b` and an optional `as name`
    pub(super) fn case_pattern(&mut self, pos: usize) -> Parsed<CasePattern> {
        let mut alternatives = Vec::new();
        let mut cursor = pos;
        loop {
            let (alternative, next) = self.pattern_items(cursor)?;
            alternatives.push(alternative);
            cursor = next;
            if !(self.is_op(cursor, "|") || self.is_word(cursor, "or")) {
                break;
            }
            cursor += 1;
        }
        let mut capture = None;
        if self.is_word(cursor, "as") {
            let name = self.token(cursor + 1);
            if name.kind != TokenKind::Name {
                self.expect(cursor + 1, "identifier");
                return None;
            }
            capture = Some(name.text.clone());
            cursor += 2;
        }
        Some((
            CasePattern {
                alternatives,
                capture,
            },
            cursor,
        ))
    }

    fn pattern_items(&mut self, pos: usize) -> Parsed<Expr> {
        let (first, mut cursor) = self.arith(pos)?;
        let mut items = vec![first];
        while self.is_op(cursor, ",") {
            let (item, next) = self.arith(cursor + 1)?;
            items.push(item);
            cursor = next;
        }
        if items.len() == 1 {
            items.pop().map(|e| (e, cursor))
        } else {
            Some((Expr::Tuple(items), cursor))
        }
    }
}
