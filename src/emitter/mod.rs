//! Emitter module - Python code generation
//!
//! Walks the tree with an explicit [`EmitterState`]: the current indent
//! level, the imports required so far, and whether the statements being
//! emitted are the direct body of a class. Imports are collected while
//! emitting and written first, so a program only imports what it uses.

use std::collections::BTreeSet;

use crate::error::{PlainPyError, Result};
use crate::macros::{MacroInput, MacroRegistry, MacroValue};
use crate::parser::*;

const INDENT: &str = "    ";

/// Emit Python source for a whole program
pub fn emit(program: &Program, registry: &MacroRegistry) -> Result<String> {
    let mut emitter = PythonEmitter::new(registry);
    emitter.emit_program(program)
}

/// Mutable emission state, fresh for every program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitterState {
    pub indent_level: usize,
    /// Import lines, kept sorted and unique
    pub imports: BTreeSet<String>,
    /// True while emitting the direct body of a class
    pub in_class_context: bool,
}

/// Python code emitter
pub struct PythonEmitter<'r> {
    state: EmitterState,
    registry: &'r MacroRegistry,
}

impl<'r> PythonEmitter<'r> {
    pub fn new(registry: &'r MacroRegistry) -> Self {
        Self {
            state: EmitterState::default(),
            registry,
        }
    }

    pub fn state(&self) -> &EmitterState {
        &self.state
    }

    pub fn emit_program(&mut self, program: &Program) -> Result<String> {
        let mut lines: Vec<String> = Vec::new();
        let mut previous_was_definition = false;
        // First line of the comment run directly above the current statement
        let mut comment_run: Option<usize> = None;
        for stmt in &program.body {
            let is_definition = matches!(
                stmt.kind,
                StmtKind::FunctionDef(_) | StmtKind::ClassDef(_)
            );
            if !lines.is_empty() && previous_was_definition {
                lines.push(String::new());
            } else if is_definition && !lines.is_empty() {
                let at = comment_run.unwrap_or(lines.len());
                if at > 0 && !lines[at - 1].is_empty() {
                    lines.insert(at, String::new());
                }
            }
            if matches!(stmt.kind, StmtKind::Comment(_)) {
                if comment_run.is_none() {
                    comment_run = Some(lines.len());
                }
            } else {
                comment_run = None;
            }
            self.emit_stmt(stmt, &mut lines)?;
            previous_was_definition = is_definition;
        }

        let mut output = String::new();
        if !self.state.imports.is_empty() {
            for import in &self.state.imports {
                output.push_str(import);
                output.push('\n');
            }
            output.push('\n');
        }
        output.push_str(&lines.join("\n"));
        output.push('\n');
        Ok(output)
    }

    fn require(&mut self, module: &str) {
        self.state.imports.insert(format!("import {module}"));
    }

    fn line(&self, out: &mut Vec<String>, text: impl AsRef<str>) {
        out.push(format!("{}{}", INDENT.repeat(self.state.indent_level), text.as_ref()));
    }

    /// Indented block; a block with no code ends in `pass`
    fn emit_body(&mut self, body: &[Stmt], out: &mut Vec<String>) -> Result<()> {
        self.state.indent_level += 1;
        for stmt in body {
            self.emit_stmt(stmt, out)?;
        }
        if body.iter().all(|s| matches!(s.kind, StmtKind::Comment(_))) {
            self.line(out, "pass");
        }
        self.state.indent_level -= 1;
        Ok(())
    }

    /// Block emitted with class context switched on or off
    fn emit_body_in(&mut self, body: &[Stmt], class_context: bool, out: &mut Vec<String>) -> Result<()> {
        let saved = std::mem::replace(&mut self.state.in_class_context, class_context);
        let result = self.emit_body(body, out);
        self.state.in_class_context = saved;
        result
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub fn emit_stmt(&mut self, stmt: &Stmt, out: &mut Vec<String>) -> Result<()> {
        match &stmt.kind {
            StmtKind::Output { args } => {
                let args = self.emit_args(args)?;
                self.line(out, format!("print({args})"));
            }
            StmtKind::Input {
                target,
                prompt,
                conversion,
            } => {
                let prompt = match prompt {
                    Some(p) => self.emit_expr(p)?,
                    None => String::new(),
                };
                let read = format!("input({prompt})");
                let value = match conversion {
                    Some(Conversion::Int) => format!("int({read})"),
                    Some(Conversion::Float) => format!("float({read})"),
                    None => read,
                };
                self.line(out, format!("{target} = {value}"));
            }
            StmtKind::If { branches, orelse } => {
                for (index, branch) in branches.iter().enumerate() {
                    let keyword = if index == 0 { "if" } else { "elif" };
                    let test = self.emit_expr(&branch.test)?;
                    self.line(out, format!("{keyword} {test}:"));
                    self.emit_body(&branch.body, out)?;
                }
                if let Some(body) = orelse {
                    self.line(out, "else:");
                    self.emit_body(body, out)?;
                }
            }
            StmtKind::Repeat { count, body } => {
                let count = self.emit_expr(count)?;
                self.line(out, format!("for _ in range({count}):"));
                self.emit_body(body, out)?;
            }
            StmtKind::ForEach {
                targets,
                iter,
                body,
            } => {
                let iter = self.emit_expr(iter)?;
                self.line(out, format!("for {} in {iter}:", targets.join(", ")));
                self.emit_body(body, out)?;
            }
            StmtKind::While { condition, body } => {
                let condition = self.emit_expr(condition)?;
                self.line(out, format!("while {condition}:"));
                self.emit_body(body, out)?;
            }
            StmtKind::Break => self.line(out, "break"),
            StmtKind::Continue => self.line(out, "continue"),
            StmtKind::Pass => self.line(out, "pass"),
            StmtKind::Assign { target, value } => {
                let target = self.emit_bare(target)?;
                let value = self.emit_bare(value)?;
                self.line(out, format!("{target} = {value}"));
            }
            StmtKind::AugAssign { target, op, value } => {
                let target = self.emit_expr(target)?;
                let value = self.emit_bare(value)?;
                self.line(out, format!("{target} {} {value}", op.as_str()));
            }
            StmtKind::Declare {
                target,
                annotation,
                value,
            } => {
                let target = self.emit_expr(target)?;
                let annotation = self.emit_expr(annotation)?;
                match value {
                    Some(v) => {
                        let value = self.emit_bare(v)?;
                        self.line(out, format!("{target}: {annotation} = {value}"));
                    }
                    None => self.line(out, format!("{target}: {annotation}")),
                }
            }
            StmtKind::Append { list, value } => {
                let list = self.emit_value(list)?;
                let value = self.emit_expr(value)?;
                self.line(out, format!("{list}.append({value})"));
            }
            StmtKind::Remove { list, value } => {
                let list = self.emit_value(list)?;
                let value = self.emit_expr(value)?;
                self.line(out, format!("{list}.remove({value})"));
            }
            StmtKind::FunctionDef(func) => self.emit_function(func, out)?,
            StmtKind::ClassDef(class) => self.emit_class(class, out)?,
            StmtKind::Return(value) => match value {
                Some(v) => {
                    let value = self.emit_bare(v)?;
                    self.line(out, format!("return {value}"));
                }
                None => self.line(out, "return"),
            },
            StmtKind::Yield(value) => match value {
                Some(v) => {
                    let value = self.emit_bare(v)?;
                    self.line(out, format!("yield {value}"));
                }
                None => self.line(out, "yield"),
            },
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                self.line(out, "try:");
                self.emit_body(body, out)?;
                for handler in handlers {
                    let header = match (&handler.exception, &handler.name) {
                        (Some(exception), Some(name)) => {
                            format!("except {} as {name}:", self.emit_expr(exception)?)
                        }
                        (Some(exception), None) => format!("except {}:", self.emit_expr(exception)?),
                        (None, _) => "except:".to_string(),
                    };
                    self.line(out, header);
                    self.emit_body(&handler.body, out)?;
                }
                if let Some(body) = orelse {
                    self.line(out, "else:");
                    self.emit_body(body, out)?;
                }
                if let Some(body) = finalbody {
                    self.line(out, "finally:");
                    self.emit_body(body, out)?;
                }
            }
            StmtKind::Raise { exception, cause } => {
                let text = match (exception, cause) {
                    (Some(e), Some(c)) => {
                        format!("raise {} from {}", self.emit_expr(e)?, self.emit_expr(c)?)
                    }
                    (Some(e), None) => format!("raise {}", self.emit_expr(e)?),
                    (None, _) => "raise".to_string(),
                };
                self.line(out, text);
            }
            StmtKind::Assert { test, message } => {
                let test = self.emit_expr(test)?;
                match message {
                    Some(m) => {
                        let message = self.emit_expr(m)?;
                        self.line(out, format!("assert {test}, {message}"));
                    }
                    None => self.line(out, format!("assert {test}")),
                }
            }
            StmtKind::Import { module, alias } => match alias {
                Some(alias) => self.line(out, format!("import {module} as {alias}")),
                None => self.line(out, format!("import {module}")),
            },
            StmtKind::FromImport { module, names } => {
                let names = if names.is_empty() {
                    "*".to_string()
                } else {
                    names
                        .iter()
                        .map(|n| match &n.alias {
                            Some(alias) => format!("{} as {alias}", n.name),
                            None => n.name.clone(),
                        })
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                self.line(out, format!("from {module} import {names}"));
            }
            StmtKind::With {
                context,
                alias,
                body,
            } => {
                let context = self.emit_expr(context)?;
                match alias {
                    Some(alias) => self.line(out, format!("with {context} as {alias}:")),
                    None => self.line(out, format!("with {context}:")),
                }
                self.emit_body(body, out)?;
            }
            StmtKind::OpenFile { path, alias, body } => {
                let path = self.emit_expr(path)?;
                self.line(out, format!("with {} as {alias}:", open_call(&path, "r")));
                self.emit_body(body, out)?;
            }
            StmtKind::Match { subject, cases } => {
                let subject = self.emit_bare(subject)?;
                self.line(out, format!("match {subject}:"));
                self.state.indent_level += 1;
                for case in cases {
                    let pattern = &case.pattern;
                    let bare = pattern.alternatives.len() == 1 && pattern.capture.is_none();
                    let mut alternatives = Vec::with_capacity(pattern.alternatives.len());
                    for alternative in &pattern.alternatives {
                        alternatives.push(if bare {
                            self.emit_bare(alternative)?
                        } else {
                            self.emit_expr(alternative)?
                        });
                    }
                    let mut header = format!("case {}", alternatives.join(" | "));
                    if let Some(name) = &case.pattern.capture {
                        header.push_str(&format!(" as {name}"));
                    }
                    if let Some(guard) = &case.guard {
                        header.push_str(&format!(" if {}", self.emit_expr(guard)?));
                    }
                    header.push(':');
                    self.line(out, header);
                    self.emit_body(&case.body, out)?;
                }
                self.state.indent_level -= 1;
            }
            StmtKind::Comment(text) => self.line(out, text),
            StmtKind::SaveFile { content, path } => {
                let path = self.emit_expr(path)?;
                let content = self.emit_expr(content)?;
                self.line(out, format!("with {} as f:", open_call(&path, "w")));
                self.state.indent_level += 1;
                self.line(out, format!("f.write(str({content}))"));
                self.state.indent_level -= 1;
            }
            StmtKind::ReadFile { path, target } => {
                let path = self.emit_expr(path)?;
                self.line(out, format!("with {} as f:", open_call(&path, "r")));
                self.state.indent_level += 1;
                self.line(out, format!("{target} = f.read()"));
                self.state.indent_level -= 1;
            }
            StmtKind::DeleteFile(path) => {
                self.require("os");
                let path = self.emit_expr(path)?;
                self.line(out, format!("os.remove({path})"));
            }
            StmtKind::Wait(seconds) => {
                self.require("time");
                let seconds = self.emit_expr(seconds)?;
                self.line(out, format!("time.sleep({seconds})"));
            }
            StmtKind::ExitProgram => {
                self.require("sys");
                self.line(out, "sys.exit()");
            }
            StmtKind::Raw { text, body } => {
                self.line(out, text);
                if let Some(body) = body {
                    self.emit_body(body, out)?;
                }
            }
            StmtKind::Expr(expr) => {
                let expr = self.emit_bare(expr)?;
                self.line(out, expr);
            }
            StmtKind::Macro { pattern, args } => {
                self.emit_macro(pattern, args, stmt.location.line, out)?
            }
        }
        Ok(())
    }

    fn emit_decorators(&mut self, decorators: &[Decorator], out: &mut Vec<String>) -> Result<()> {
        for decorator in decorators {
            match &decorator.args {
                Some(args) => {
                    let args = self.emit_args(args)?;
                    self.line(out, format!("@{}({args})", decorator.name));
                }
                None => self.line(out, format!("@{}", decorator.name)),
            }
        }
        Ok(())
    }

    fn emit_function(&mut self, func: &FunctionDef, out: &mut Vec<String>) -> Result<()> {
        self.emit_decorators(&func.decorators, out)?;

        let receiver = if !self.state.in_class_context || func.has_decorator("staticmethod") {
            None
        } else if func.has_decorator("classmethod") {
            Some("cls")
        } else {
            Some("self")
        };
        let mut params: Vec<String> = receiver.into_iter().map(str::to_string).collect();
        for param in &func.params {
            params.push(self.emit_param(param)?);
        }

        let prefix = if func.is_async { "async def" } else { "def" };
        let returns = match &func.returns {
            Some(r) => format!(" -> {}", self.emit_expr(r)?),
            None => String::new(),
        };
        self.line(
            out,
            format!("{prefix} {}({}){returns}:", func.name, params.join(", ")),
        );
        self.emit_body_in(&func.body, false, out)
    }

    fn emit_class(&mut self, class: &ClassDef, out: &mut Vec<String>) -> Result<()> {
        self.emit_decorators(&class.decorators, out)?;
        if class.bases.is_empty() {
            self.line(out, format!("class {}:", class.name));
        } else {
            let bases = self.emit_args(&class.bases)?;
            self.line(out, format!("class {}({bases}):", class.name));
        }
        self.emit_body_in(&class.body, true, out)
    }

    fn emit_param(&mut self, param: &Param) -> Result<String> {
        let prefix = match param.kind {
            ParamKind::Normal => "",
            ParamKind::VarArgs => "*",
            ParamKind::KwArgs => "**",
        };
        let mut text = format!("{prefix}{}", param.name);
        if let Some(annotation) = &param.annotation {
            text.push_str(&format!(": {}", self.emit_expr(annotation)?));
        }
        if let Some(default) = &param.default {
            let separator = if param.annotation.is_some() { " = " } else { "=" };
            text.push_str(separator);
            text.push_str(&self.emit_expr(default)?);
        }
        Ok(text)
    }

    fn emit_macro(
        &mut self,
        pattern: &str,
        args: &[MacroArg],
        line: usize,
        out: &mut Vec<String>,
    ) -> Result<()> {
        let failure = |message: String| PlainPyError::MacroExpansionError {
            pattern_name: pattern.to_string(),
            line,
            message,
        };
        let registry = self.registry;
        let macro_pattern = registry
            .get(pattern)
            .ok_or_else(|| failure("pattern is not registered".to_string()))?;

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(match arg {
                MacroArg::Name(name) => MacroValue::Name(name.clone()),
                MacroArg::Expr(expr) => MacroValue::Code(self.emit_expr(expr)?),
                MacroArg::Text(text) => MacroValue::Code(text.clone()),
                MacroArg::Absent => MacroValue::Absent,
            });
        }
        let named = (macro_pattern.extract)(&MacroInput::new(values)).map_err(failure)?;
        let code = (macro_pattern.render)(&named).map_err(failure)?;
        if code.trim().is_empty() {
            return Err(failure("rendered no code".to_string()));
        }

        for rendered in code.lines() {
            self.line(out, rendered);
        }
        self.state
            .imports
            .extend(macro_pattern.imports.iter().map(|i| i.to_string()));
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Expression in a position that needs no grouping
    pub fn emit_expr(&mut self, expr: &Expr) -> Result<String> {
        Ok(match expr {
            Expr::Name(name) => name.clone(),
            Expr::Number(text) | Expr::Str(text) => text.clone(),
            Expr::Bool(true) => "True".to_string(),
            Expr::Bool(false) => "False".to_string(),
            Expr::NoneLiteral => "None".to_string(),
            Expr::BinOp { left, op, right } => {
                let left = self.emit_operand(left)?;
                let right = self.emit_operand(right)?;
                format!("{left} {} {right}", op.as_str())
            }
            Expr::Compare { left, ops } => {
                let mut text = self.emit_operand(left)?;
                for (op, right) in ops {
                    let right = self.emit_operand(right)?;
                    text.push_str(&format!(" {} {right}", op.as_str()));
                }
                text
            }
            Expr::UnaryOp { op, operand } => {
                let operand = self.emit_operand(operand)?;
                match op {
                    UnaryOp::Neg => format!("-{operand}"),
                    UnaryOp::Pos => format!("+{operand}"),
                    UnaryOp::Invert => format!("~{operand}"),
                    UnaryOp::Not => format!("not {operand}"),
                }
            }
            Expr::Call { func, args } => {
                let func = self.emit_value(func)?;
                let args = self.emit_args(args)?;
                format!("{func}({args})")
            }
            Expr::Attribute { value, attr } => format!("{}.{attr}", self.emit_value(value)?),
            Expr::Subscript { value, index } => {
                let value = self.emit_value(value)?;
                let index = match index.as_ref() {
                    Expr::Slice { lower, upper, step } => self.emit_slice(lower, upper, step)?,
                    other => self.emit_bare(other)?,
                };
                format!("{value}[{index}]")
            }
            Expr::Slice { .. } => {
                return Err(PlainPyError::EmissionError {
                    message: "slice outside of a subscript".to_string(),
                })
            }
            Expr::List(items) => format!("[{}]", self.emit_list(items)?),
            Expr::Tuple(items) => match items.as_slice() {
                [] => "()".to_string(),
                [only] => format!("({},)", self.emit_expr(only)?),
                _ => format!("({})", self.emit_list(items)?),
            },
            Expr::Set(items) if items.is_empty() => "set()".to_string(),
            Expr::Set(items) => format!("{{{}}}", self.emit_list(items)?),
            Expr::Dict(entries) => {
                let mut parts = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    parts.push(format!("{}: {}", self.emit_expr(key)?, self.emit_expr(value)?));
                }
                format!("{{{}}}", parts.join(", "))
            }
            Expr::ListComp {
                element,
                targets,
                iter,
                condition,
            } => {
                let element = self.emit_expr(element)?;
                let iter = self.emit_expr(iter)?;
                let mut text = format!("[{element} for {} in {iter}", targets.join(", "));
                if let Some(condition) = condition {
                    text.push_str(&format!(" if {}", self.emit_expr(condition)?));
                }
                text.push(']');
                text
            }
            Expr::Lambda { params, body } => {
                let body = self.emit_expr(body)?;
                if params.is_empty() {
                    format!("lambda: {body}")
                } else {
                    format!("lambda {}: {body}", params.join(", "))
                }
            }
            Expr::IfExp { test, body, orelse } => {
                let body = self.emit_branch(body)?;
                let test = self.emit_branch(test)?;
                let orelse = self.emit_expr(orelse)?;
                format!("{body} if {test} else {orelse}")
            }
            Expr::Await(value) => format!("await {}", self.emit_operand(value)?),
            Expr::NamedExpr { target, value } => format!("{target} := {}", self.emit_branch(value)?),
            Expr::Builtin(builtin) => self.emit_builtin(builtin)?,
        })
    }

    /// Top of an assignment, return or expression statement: tuples are bare
    fn emit_bare(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Tuple(items) if items.len() > 1 => self.emit_list(items),
            Expr::NamedExpr { .. } => Ok(format!("({})", self.emit_expr(expr)?)),
            other => self.emit_expr(other),
        }
    }

    /// Operand of an operator: compound expressions are grouped
    fn emit_operand(&mut self, expr: &Expr) -> Result<String> {
        let text = self.emit_expr(expr)?;
        Ok(if is_compound(expr) {
            format!("({text})")
        } else {
            text
        })
    }

    /// Receiver of a call, attribute access or subscript
    fn emit_value(&mut self, expr: &Expr) -> Result<String> {
        self.emit_operand(expr)
    }

    /// Body or test of a conditional expression
    fn emit_branch(&mut self, expr: &Expr) -> Result<String> {
        let text = self.emit_expr(expr)?;
        Ok(match expr {
            Expr::Lambda { .. } | Expr::IfExp { .. } | Expr::NamedExpr { .. } => format!("({text})"),
            _ => text,
        })
    }

    fn emit_list(&mut self, items: &[Expr]) -> Result<String> {
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            parts.push(self.emit_expr(item)?);
        }
        Ok(parts.join(", "))
    }

    fn emit_args(&mut self, args: &[Arg]) -> Result<String> {
        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            parts.push(match arg {
                Arg::Positional(e) => self.emit_expr(e)?,
                Arg::Keyword(name, e) => format!("{name}={}", self.emit_expr(e)?),
                Arg::Star(e) => format!("*{}", self.emit_operand(e)?),
                Arg::DoubleStar(e) => format!("**{}", self.emit_operand(e)?),
            });
        }
        Ok(parts.join(", "))
    }

    fn emit_slice(
        &mut self,
        lower: &Option<Box<Expr>>,
        upper: &Option<Box<Expr>>,
        step: &Option<Box<Expr>>,
    ) -> Result<String> {
        let mut bound = |e: &Option<Box<Expr>>| -> Result<String> {
            match e {
                Some(e) => self.emit_expr(e),
                None => Ok(String::new()),
            }
        };
        let lower = bound(lower)?;
        let upper = bound(upper)?;
        let mut text = format!("{lower}:{upper}");
        if step.is_some() {
            text.push(':');
            text.push_str(&bound(step)?);
        }
        Ok(text)
    }

    fn emit_builtin(&mut self, builtin: &Builtin) -> Result<String> {
        Ok(match builtin {
            Builtin::RandomInt { low, high } => {
                self.require("random");
                format!("random.randint({}, {})", self.emit_expr(low)?, self.emit_expr(high)?)
            }
            Builtin::RandomChoice(seq) => {
                self.require("random");
                format!("random.choice({})", self.emit_expr(seq)?)
            }
            Builtin::Now => {
                self.require("datetime");
                "datetime.datetime.now()".to_string()
            }
            Builtin::Today => {
                self.require("datetime");
                "datetime.date.today()".to_string()
            }
            Builtin::FileExists(path) => {
                self.require("os");
                format!("os.path.exists({})", self.emit_expr(path)?)
            }
        })
    }
}

/// Expressions that need parentheses when nested under an operator
fn is_compound(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::BinOp { .. }
            | Expr::Compare { .. }
            | Expr::UnaryOp { .. }
            | Expr::Lambda { .. }
            | Expr::IfExp { .. }
            | Expr::Await(_)
            | Expr::NamedExpr { .. }
    )
}

fn open_call(path: &str, mode: &str) -> String {
    format!("open({path}, \"{mode}\", encoding=\"utf-8\")")
}

#[cfg(test)]
mod tests;
