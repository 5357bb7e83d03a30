//! Tree builders
//!
//! Turns a matched production's captures into a tree node, then folds
//! continuation clauses (`elif`, `else`, `except`, `finally`) and decorators
//! into the statement they belong to. `case` clauses are only collected
//! inside a `match` block.

use super::ast::*;
use super::grammar::{ProductionRule, StmtRule};
use super::Capture;
use crate::error::{PlainPyError, Result};
use crate::location::SourceLocation;

/// One parsed line before clause folding
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Parsed {
    Stmt(Stmt),
    Elif(CondBranch, SourceLocation),
    Else(Vec<Stmt>, SourceLocation),
    Except(ExceptHandler, SourceLocation),
    Finally(Vec<Stmt>, SourceLocation),
    Decorator(Decorator, SourceLocation),
    Case(MatchCase, SourceLocation),
}

/// Sequential reader over a production's captures
struct Captures {
    items: std::vec::IntoIter<Capture>,
}

fn shape_error(expected: &str, found: Option<&Capture>) -> PlainPyError {
    PlainPyError::EmissionError {
        message: format!("production capture mismatch: expected {expected}, got {found:?}"),
    }
}

impl Captures {
    fn new(items: Vec<Capture>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }

    fn next(&mut self, expected: &str) -> Result<Capture> {
        self.items.next().ok_or_else(|| shape_error(expected, None))
    }

    fn name(&mut self) -> Result<String> {
        match self.next("identifier")? {
            Capture::Name(name) => Ok(name),
            other => Err(shape_error("identifier", Some(&other))),
        }
    }

    fn opt_name(&mut self) -> Result<Option<String>> {
        match self.next("identifier")? {
            Capture::Name(name) => Ok(Some(name)),
            Capture::Absent => Ok(None),
            other => Err(shape_error("identifier", Some(&other))),
        }
    }

    fn names(&mut self) -> Result<Vec<String>> {
        match self.next("identifiers")? {
            Capture::Names(names) => Ok(names),
            other => Err(shape_error("identifiers", Some(&other))),
        }
    }

    fn opt_names(&mut self) -> Result<Option<Vec<String>>> {
        match self.next("identifiers")? {
            Capture::Names(names) => Ok(Some(names)),
            Capture::Absent => Ok(None),
            other => Err(shape_error("identifiers", Some(&other))),
        }
    }

    fn expr(&mut self) -> Result<Expr> {
        match self.next("expression")? {
            Capture::Expr(expr) => Ok(expr),
            other => Err(shape_error("expression", Some(&other))),
        }
    }

    fn opt_expr(&mut self) -> Result<Option<Expr>> {
        match self.next("expression")? {
            Capture::Expr(expr) => Ok(Some(expr)),
            Capture::Absent => Ok(None),
            other => Err(shape_error("expression", Some(&other))),
        }
    }

    fn text(&mut self) -> Result<String> {
        match self.next("text")? {
            Capture::Text(text) => Ok(text),
            other => Err(shape_error("text", Some(&other))),
        }
    }

    fn args(&mut self) -> Result<Vec<Arg>> {
        match self.next("arguments")? {
            Capture::Args(args) => Ok(args),
            other => Err(shape_error("arguments", Some(&other))),
        }
    }

    fn opt_args(&mut self) -> Result<Option<Vec<Arg>>> {
        match self.next("arguments")? {
            Capture::Args(args) => Ok(Some(args)),
            Capture::Absent => Ok(None),
            other => Err(shape_error("arguments", Some(&other))),
        }
    }

    fn opt_params(&mut self) -> Result<Option<Vec<Param>>> {
        match self.next("parameters")? {
            Capture::Params(params) => Ok(Some(params)),
            Capture::Absent => Ok(None),
            other => Err(shape_error("parameters", Some(&other))),
        }
    }

    fn params(&mut self) -> Result<Vec<Param>> {
        self.opt_params()?
            .ok_or_else(|| shape_error("parameters", Some(&Capture::Absent)))
    }

    fn imports(&mut self) -> Result<Vec<ImportName>> {
        match self.next("import names")? {
            Capture::Imports(names) => Ok(names),
            other => Err(shape_error("import names", Some(&other))),
        }
    }

    fn opt_block(&mut self) -> Result<Option<Vec<Stmt>>> {
        match self.next("block")? {
            Capture::Block(body) => Ok(Some(body)),
            Capture::Absent => Ok(None),
            other => Err(shape_error("block", Some(&other))),
        }
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        self.opt_block()?
            .ok_or_else(|| shape_error("block", Some(&Capture::Absent)))
    }

    fn pattern(&mut self) -> Result<CasePattern> {
        match self.next("case pattern")? {
            Capture::Pattern(pattern) => Ok(pattern),
            other => Err(shape_error("case pattern", Some(&other))),
        }
    }

    fn cases(&mut self) -> Result<Vec<MatchCase>> {
        match self.next("case clauses")? {
            Capture::Cases(cases) => Ok(cases),
            other => Err(shape_error("case clauses", Some(&other))),
        }
    }
}

/// Build the node for one matched production
pub(super) fn build(
    rule: ProductionRule,
    captures: Vec<Capture>,
    location: SourceLocation,
) -> Result<Parsed> {
    let rule = match rule {
        ProductionRule::Core(rule) => rule,
        ProductionRule::Macro(pattern) => {
            let args = captures
                .into_iter()
                .map(macro_arg)
                .collect::<Result<Vec<_>>>()?;
            let kind = StmtKind::Macro {
                pattern: pattern.to_string(),
                args,
            };
            return Ok(Parsed::Stmt(Stmt::new(kind, location)));
        }
    };

    let mut c = Captures::new(captures);
    let kind = match rule {
        StmtRule::Output => StmtKind::Output { args: c.args()? },
        StmtRule::Input => StmtKind::Input {
            target: c.name()?,
            prompt: c.opt_expr()?,
            conversion: None,
        },
        StmtRule::InputTyped => {
            let conversion = match c.text()?.as_str() {
                "decimal" => Conversion::Float,
                _ => Conversion::Int,
            };
            StmtKind::Input {
                target: c.name()?,
                prompt: c.opt_expr()?,
                conversion: Some(conversion),
            }
        }
        StmtRule::If => StmtKind::If {
            branches: vec![CondBranch {
                test: c.expr()?,
                body: c.block()?,
            }],
            orelse: None,
        },
        StmtRule::Elif => {
            let branch = CondBranch {
                test: c.expr()?,
                body: c.block()?,
            };
            return Ok(Parsed::Elif(branch, location));
        }
        StmtRule::Else => return Ok(Parsed::Else(c.block()?, location)),
        StmtRule::Repeat => StmtKind::Repeat {
            count: c.expr()?,
            body: c.block()?,
        },
        StmtRule::ForEach => StmtKind::ForEach {
            targets: c.names()?,
            iter: c.expr()?,
            body: c.block()?,
        },
        StmtRule::LoopThrough => {
            let iter = c.expr()?;
            let targets = c
                .opt_names()?
                .unwrap_or_else(|| vec!["item".to_string()]);
            StmtKind::ForEach {
                targets,
                iter,
                body: c.block()?,
            }
        }
        StmtRule::While => StmtKind::While {
            condition: c.expr()?,
            body: c.block()?,
        },
        StmtRule::Forever => StmtKind::While {
            condition: Expr::Bool(true),
            body: c.block()?,
        },
        StmtRule::Break => StmtKind::Break,
        StmtRule::Continue => StmtKind::Continue,
        StmtRule::Pass => StmtKind::Pass,
        StmtRule::ExitProgram => StmtKind::ExitProgram,
        StmtRule::Wait => StmtKind::Wait(c.expr()?),
        StmtRule::CollectionDecl => {
            c.text()?;
            StmtKind::Assign {
                target: Expr::Name(c.name()?),
                value: c.expr()?,
            }
        }
        StmtRule::CollectionEmpty => {
            let value = empty_collection(&c.text()?);
            StmtKind::Assign {
                target: Expr::Name(c.name()?),
                value,
            }
        }
        StmtRule::Append => {
            let value = c.expr()?;
            StmtKind::Append {
                list: c.expr()?,
                value,
            }
        }
        StmtRule::Remove => {
            let value = c.expr()?;
            StmtKind::Remove {
                list: c.expr()?,
                value,
            }
        }
        StmtRule::DeleteFile => StmtKind::DeleteFile(c.expr()?),
        StmtRule::FunctionDef | StmtRule::AsyncFunctionDef => {
            StmtKind::FunctionDef(FunctionDef {
                name: c.name()?,
                params: c.opt_params()?.unwrap_or_default(),
                returns: c.opt_expr()?,
                body: c.block()?,
                decorators: Vec::new(),
                is_async: rule == StmtRule::AsyncFunctionDef,
            })
        }
        StmtRule::Init => StmtKind::FunctionDef(FunctionDef {
            name: "__init__".to_string(),
            params: c.params()?,
            returns: None,
            body: c.block()?,
            decorators: Vec::new(),
            is_async: false,
        }),
        StmtRule::Return => StmtKind::Return(c.opt_expr()?),
        StmtRule::Yield => StmtKind::Yield(c.opt_expr()?),
        StmtRule::ClassDef => {
            let class = ClassDef {
                name: c.name()?,
                bases: c.opt_args()?.unwrap_or_default(),
                body: c.block()?,
                decorators: Vec::new(),
            };
            check_methods(&class.body)?;
            StmtKind::ClassDef(class)
        }
        StmtRule::Decorator => {
            let decorator = Decorator {
                name: c.name()?,
                args: c.opt_args()?,
            };
            return Ok(Parsed::Decorator(decorator, location));
        }
        StmtRule::BareDecorator => {
            let decorator = Decorator {
                name: c.text()?,
                args: None,
            };
            return Ok(Parsed::Decorator(decorator, location));
        }
        StmtRule::Try => StmtKind::Try {
            body: c.block()?,
            handlers: Vec::new(),
            orelse: None,
            finalbody: None,
        },
        StmtRule::Except => {
            let handler = ExceptHandler {
                exception: c.opt_expr()?,
                name: c.opt_name()?,
                body: c.block()?,
            };
            return Ok(Parsed::Except(handler, location));
        }
        StmtRule::Finally => return Ok(Parsed::Finally(c.block()?, location)),
        StmtRule::Raise => StmtKind::Raise {
            exception: c.opt_expr()?,
            cause: c.opt_expr()?,
        },
        StmtRule::Assert => StmtKind::Assert {
            test: c.expr()?,
            message: c.opt_expr()?,
        },
        StmtRule::Import => StmtKind::Import {
            module: c.name()?,
            alias: c.opt_name()?,
        },
        StmtRule::FromImport => StmtKind::FromImport {
            module: c.name()?,
            names: c.imports()?,
        },
        StmtRule::With => StmtKind::With {
            context: c.expr()?,
            alias: c.opt_name()?,
            body: c.block()?,
        },
        StmtRule::OpenFile => StmtKind::OpenFile {
            path: c.expr()?,
            alias: c.name()?,
            body: c.block()?,
        },
        StmtRule::SaveFile => StmtKind::SaveFile {
            content: c.expr()?,
            path: c.expr()?,
        },
        StmtRule::ReadFile => StmtKind::ReadFile {
            path: c.expr()?,
            target: c.name()?,
        },
        StmtRule::Match => StmtKind::Match {
            subject: c.expr()?,
            cases: c.cases()?,
        },
        StmtRule::Case => {
            let case = MatchCase {
                pattern: c.pattern()?,
                guard: c.opt_expr()?,
                body: c.block()?,
            };
            return Ok(Parsed::Case(case, location));
        }
        StmtRule::Comment => StmtKind::Comment(c.text()?),
        StmtRule::Raw => StmtKind::Raw {
            text: c.text()?,
            body: c.opt_block()?,
        },
        StmtRule::Declare => StmtKind::Declare {
            target: c.expr()?,
            annotation: c.expr()?,
            value: c.opt_expr()?,
        },
        StmtRule::AugAssign => {
            let target = c.expr()?;
            let symbol = c.text()?;
            let op = AugOp::from_symbol(&symbol).ok_or_else(|| PlainPyError::SyntaxError {
                line: location.line,
                column: location.column,
                expected: vec!["augmented assignment operator".to_string()],
                found: format!("'{symbol}'"),
            })?;
            StmtKind::AugAssign {
                target,
                op,
                value: c.expr()?,
            }
        }
        StmtRule::Assign => StmtKind::Assign {
            target: c.expr()?,
            value: c.expr()?,
        },
        StmtRule::ExprStmt => StmtKind::Expr(c.expr()?),
    };
    Ok(Parsed::Stmt(Stmt::new(kind, location)))
}

fn macro_arg(capture: Capture) -> Result<MacroArg> {
    match capture {
        Capture::Name(name) => Ok(MacroArg::Name(name)),
        Capture::Expr(expr) => Ok(MacroArg::Expr(expr)),
        Capture::Text(text) => Ok(MacroArg::Text(text)),
        Capture::Absent => Ok(MacroArg::Absent),
        other => Err(shape_error("macro argument", Some(&other))),
    }
}

fn empty_collection(kind: &str) -> Expr {
    match kind {
        "dict" | "dictionary" => Expr::Dict(Vec::new()),
        "tuple" => Expr::Tuple(Vec::new()),
        "set" => Expr::Call {
            func: Box::new(Expr::Name("set".to_string())),
            args: Vec::new(),
        },
        _ => Expr::List(Vec::new()),
    }
}

/// Methods never spell out their receiver; the emitter adds it
fn check_methods(body: &[Stmt]) -> Result<()> {
    for stmt in body {
        let StmtKind::FunctionDef(func) = &stmt.kind else {
            continue;
        };
        if func.has_decorator("staticmethod") {
            continue;
        }
        if let Some(first) = func.params.first() {
            if first.kind == ParamKind::Normal && matches!(first.name.as_str(), "self" | "cls") {
                return Err(PlainPyError::SyntaxError {
                    line: stmt.location.line,
                    column: stmt.location.column,
                    expected: vec![format!("parameters of `{}` without a receiver", func.name)],
                    found: format!("'{}'", first.name),
                });
            }
        }
    }
    Ok(())
}

fn clause_error(location: SourceLocation, expected: &str, found: &str) -> PlainPyError {
    PlainPyError::SyntaxError {
        line: location.line,
        column: location.column,
        expected: vec![expected.to_string()],
        found: found.to_string(),
    }
}

/// Clauses of a `match` block; comments between them are dropped
pub(super) fn cases(items: Vec<Parsed>, location: SourceLocation) -> Result<Vec<MatchCase>> {
    let mut cases = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Parsed::Case(case, _) => cases.push(case),
            Parsed::Stmt(Stmt {
                kind: StmtKind::Comment(_),
                ..
            }) => {}
            Parsed::Stmt(stmt) => return Err(clause_error(stmt.location, "`case` clause", "statement")),
            Parsed::Decorator(_, at)
            | Parsed::Elif(_, at)
            | Parsed::Else(_, at)
            | Parsed::Except(_, at)
            | Parsed::Finally(_, at) => return Err(clause_error(at, "`case` clause", "clause")),
        }
    }
    if cases.is_empty() {
        return Err(clause_error(location, "`case` clause", "empty match block"));
    }
    Ok(cases)
}

fn is_comment(stmt: &Stmt) -> bool {
    matches!(stmt.kind, StmtKind::Comment(_))
}

/// Attach continuation clauses and decorators within one block
///
/// Comments written just before a clause move into the start of that
/// clause's body. Comments between a decorator and its definition move
/// above the definition.
pub(super) fn fold(items: Vec<Parsed>) -> Result<Vec<Stmt>> {
    let mut out: Vec<Stmt> = Vec::with_capacity(items.len());
    let mut decorators: Vec<(Decorator, SourceLocation)> = Vec::new();

    for item in items {
        match item {
            Parsed::Decorator(decorator, location) => decorators.push((decorator, location)),
            Parsed::Stmt(stmt) if is_comment(&stmt) && !decorators.is_empty() => out.push(stmt),
            Parsed::Stmt(mut stmt) => {
                if !decorators.is_empty() {
                    let list: Vec<Decorator> = decorators.drain(..).map(|(d, _)| d).collect();
                    match &mut stmt.kind {
                        StmtKind::FunctionDef(func) => func.decorators = list,
                        StmtKind::ClassDef(class) => class.decorators = list,
                        _ => {
                            return Err(clause_error(
                                stmt.location,
                                "function or class definition after decorator",
                                "statement",
                            ))
                        }
                    }
                }
                out.push(stmt);
            }
            clause => {
                if let Some((_, location)) = decorators.first() {
                    return Err(clause_error(
                        *location,
                        "function or class definition after decorator",
                        "clause",
                    ));
                }
                let split = out.len() - out.iter().rev().take_while(|s| is_comment(s)).count();
                let comments = out.split_off(split);
                attach(&mut out, clause, comments)?;
            }
        }
    }

    if let Some((_, location)) = decorators.first() {
        return Err(clause_error(
            *location,
            "function or class definition after decorator",
            "end of block",
        ));
    }
    for stmt in &out {
        if let StmtKind::Try {
            handlers,
            finalbody: None,
            ..
        } = &stmt.kind
        {
            if handlers.is_empty() {
                return Err(clause_error(
                    stmt.location,
                    "`except` or `finally` after `try` block",
                    "end of try statement",
                ));
            }
        }
    }
    Ok(out)
}

fn attach(out: &mut [Stmt], clause: Parsed, comments: Vec<Stmt>) -> Result<()> {
    let previous = out.last_mut().map(|stmt| &mut stmt.kind);
    let clause = with_leading(clause, comments);
    match clause {
        Parsed::Elif(branch, location) => match previous {
            Some(StmtKind::If {
                branches,
                orelse: None,
            }) => {
                branches.push(branch);
                Ok(())
            }
            _ => Err(clause_error(location, "`if` block before `elif`", "'elif'")),
        },
        Parsed::Else(body, location) => match previous {
            Some(StmtKind::If {
                orelse: slot @ None,
                ..
            }) => {
                *slot = Some(body);
                Ok(())
            }
            Some(StmtKind::Try {
                handlers,
                orelse: slot @ None,
                finalbody: None,
                ..
            }) if !handlers.is_empty() => {
                *slot = Some(body);
                Ok(())
            }
            _ => Err(clause_error(location, "`if` or `try` block before `else`", "'else'")),
        },
        Parsed::Except(handler, location) => match previous {
            Some(StmtKind::Try {
                handlers,
                orelse: None,
                finalbody: None,
                ..
            }) => {
                handlers.push(handler);
                Ok(())
            }
            _ => Err(clause_error(location, "`try` block before `except`", "'except'")),
        },
        Parsed::Finally(body, location) => match previous {
            Some(StmtKind::Try {
                finalbody: slot @ None,
                ..
            }) => {
                *slot = Some(body);
                Ok(())
            }
            _ => Err(clause_error(location, "`try` block before `finally`", "'finally'")),
        },
        Parsed::Case(_, location) => Err(clause_error(location, "`match` block before `case`", "'case'")),
        Parsed::Stmt(stmt) => Err(clause_error(stmt.location, "clause", "statement")),
        Parsed::Decorator(_, location) => Err(clause_error(location, "clause", "decorator")),
    }
}

/// Prepend `comments` to the body a clause opens
fn with_leading(clause: Parsed, mut comments: Vec<Stmt>) -> Parsed {
    if comments.is_empty() {
        return clause;
    }
    let mut prepend = |body: Vec<Stmt>| {
        comments.extend(body);
        std::mem::take(&mut comments)
    };
    match clause {
        Parsed::Elif(mut branch, location) => {
            branch.body = prepend(branch.body);
            Parsed::Elif(branch, location)
        }
        Parsed::Else(body, location) => Parsed::Else(prepend(body), location),
        Parsed::Except(mut handler, location) => {
            handler.body = prepend(handler.body);
            Parsed::Except(handler, location)
        }
        Parsed::Finally(body, location) => Parsed::Finally(prepend(body), location),
        other => other,
    }
}
