//! AST definitions
//!
//! One variant per construct. Every English phrasing of a construct lowers
//! to the same variant, so the emitter never sees surface wording.

use crate::location::SourceLocation;

/// Expression types
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Identifier
    Name(String),
    /// Numeric literal, kept as written
    Number(String),
    /// String literal, kept as written (quotes and prefix included)
    Str(String),
    /// True / False
    Bool(bool),
    /// None
    NoneLiteral,
    /// Arithmetic or boolean binary operation
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// Comparison chain (a < b <= c)
    Compare {
        left: Box<Expr>,
        ops: Vec<(CmpOp, Expr)>,
    },
    /// Unary operation
    UnaryOp { op: UnaryOp, operand: Box<Expr> },
    /// Function call
    Call { func: Box<Expr>, args: Vec<Arg> },
    /// Attribute access (obj.attr)
    Attribute { value: Box<Expr>, attr: String },
    /// Subscription (value[index]); slices appear as `Expr::Slice` indexes
    Subscript { value: Box<Expr>, index: Box<Expr> },
    /// Slice bounds, only valid as a subscript index
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    /// List literal
    List(Vec<Expr>),
    /// Tuple literal
    Tuple(Vec<Expr>),
    /// Set literal
    Set(Vec<Expr>),
    /// Dict literal
    Dict(Vec<(Expr, Expr)>),
    /// List comprehension [element for targets in iter if condition]
    ListComp {
        element: Box<Expr>,
        targets: Vec<String>,
        iter: Box<Expr>,
        condition: Option<Box<Expr>>,
    },
    /// Lambda expression
    Lambda { params: Vec<String>, body: Box<Expr> },
    /// Conditional expression (body if test else orelse)
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    /// await expr
    Await(Box<Expr>),
    /// Assignment expression (name := value)
    NamedExpr { target: String, value: Box<Expr> },
    /// Phrase that lowers to a library call needing an import
    Builtin(Builtin),
}

/// Library-backed phrase atoms
#[derive(Debug, Clone, PartialEq)]
pub enum Builtin {
    /// random number from low to high (inclusive)
    RandomInt { low: Box<Expr>, high: Box<Expr> },
    /// random choice from a sequence
    RandomChoice(Box<Expr>),
    /// current time
    Now,
    /// current date
    Today,
    /// file exists <path>
    FileExists(Box<Expr>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    MatMul,
    And,
    Or,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::MatMul => "@",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

/// Comparison operators (after normalization)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    NotIn,
}

impl CmpOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtEq => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtEq => ">=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        }
    }

    pub fn from_symbol(text: &str) -> Option<Self> {
        Some(match text {
            "==" => CmpOp::Eq,
            "!=" => CmpOp::NotEq,
            "<" => CmpOp::Lt,
            "<=" => CmpOp::LtEq,
            ">" => CmpOp::Gt,
            ">=" => CmpOp::GtEq,
            "in" => CmpOp::In,
            "not in" => CmpOp::NotIn,
            _ => return None,
        })
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
    Invert,
}

/// Augmented assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AugOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl AugOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AugOp::Add => "+=",
            AugOp::Sub => "-=",
            AugOp::Mul => "*=",
            AugOp::Div => "/=",
            AugOp::FloorDiv => "//=",
            AugOp::Mod => "%=",
            AugOp::Pow => "**=",
        }
    }

    pub fn from_symbol(text: &str) -> Option<Self> {
        Some(match text {
            "+=" => AugOp::Add,
            "-=" => AugOp::Sub,
            "*=" => AugOp::Mul,
            "/=" => AugOp::Div,
            "//=" => AugOp::FloorDiv,
            "%=" => AugOp::Mod,
            "**=" => AugOp::Pow,
            _ => return None,
        })
    }
}

/// Call argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Positional(Expr),
    Keyword(String, Expr),
    /// *iterable
    Star(Expr),
    /// **mapping
    DoubleStar(Expr),
}

/// Parameter kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Normal,
    /// *args
    VarArgs,
    /// **kwargs
    KwArgs,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub annotation: Option<Expr>,
    pub default: Option<Expr>,
}

impl Param {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Normal,
            annotation: None,
            default: None,
        }
    }
}

/// Decorator applied to a function or class
#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    pub name: String,
    pub args: Option<Vec<Arg>>,
}

/// Function definition
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub returns: Option<Expr>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Decorator>,
    pub is_async: bool,
}

impl FunctionDef {
    pub fn has_decorator(&self, name: &str) -> bool {
        self.decorators.iter().any(|d| d.name == name)
    }
}

/// Class definition
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Arg>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Decorator>,
}

/// One `if` / `elif` arm
#[derive(Debug, Clone, PartialEq)]
pub struct CondBranch {
    pub test: Expr,
    pub body: Vec<Stmt>,
}

/// except clause
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    pub exception: Option<Expr>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
}

/// Pattern of one `case` clause
///
/// Alternatives are value patterns; `_` is the wildcard and a bare name
/// binds like in Python.
#[derive(Debug, Clone, PartialEq)]
pub struct CasePattern {
    pub alternatives: Vec<Expr>,
    pub capture: Option<String>,
}

/// case clause of a match statement
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCase {
    pub pattern: CasePattern,
    pub guard: Option<Expr>,
    pub body: Vec<Stmt>,
}

/// Type conversion applied to console input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Int,
    Float,
}

/// Name imported by `from module import ...`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportName {
    pub name: String,
    pub alias: Option<String>,
}

/// Value captured by a macro pattern
#[derive(Debug, Clone, PartialEq)]
pub enum MacroArg {
    Name(String),
    Expr(Expr),
    /// Verbatim token text (string literals, comparison operators)
    Text(String),
    /// Optional part of the pattern that was not written
    Absent,
}

/// Statement with its source position
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub location: SourceLocation,
}

impl Stmt {
    pub fn new(kind: StmtKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }
}

/// Statement types
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Console output
    Output { args: Vec<Arg> },
    /// Console input into a variable
    Input {
        target: String,
        prompt: Option<Expr>,
        conversion: Option<Conversion>,
    },
    /// if / elif / else chain
    If {
        branches: Vec<CondBranch>,
        orelse: Option<Vec<Stmt>>,
    },
    /// Loop a fixed number of times
    Repeat { count: Expr, body: Vec<Stmt> },
    /// Loop over a collection
    ForEach {
        targets: Vec<String>,
        iter: Expr,
        body: Vec<Stmt>,
    },
    /// Conditional loop
    While { condition: Expr, body: Vec<Stmt> },
    Break,
    Continue,
    Pass,
    /// Assignment; tuple targets/values are `Expr::Tuple`
    Assign { target: Expr, value: Expr },
    /// Augmented assignment (x += 1)
    AugAssign { target: Expr, op: AugOp, value: Expr },
    /// Annotated declaration (x: int = 1)
    Declare {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
    },
    /// Append a value to a list
    Append { list: Expr, value: Expr },
    /// Remove a value from a list
    Remove { list: Expr, value: Expr },
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Return(Option<Expr>),
    Yield(Option<Expr>),
    /// try / except / else / finally
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Option<Vec<Stmt>>,
        finalbody: Option<Vec<Stmt>>,
    },
    Raise {
        exception: Option<Expr>,
        cause: Option<Expr>,
    },
    Assert { test: Expr, message: Option<Expr> },
    /// import module [as alias]
    Import {
        module: String,
        alias: Option<String>,
    },
    /// from module import names; empty names means `*`
    FromImport {
        module: String,
        names: Vec<ImportName>,
    },
    /// with context [as alias]
    With {
        context: Expr,
        alias: Option<String>,
        body: Vec<Stmt>,
    },
    /// Open a text file for reading around a block
    OpenFile {
        path: Expr,
        alias: String,
        body: Vec<Stmt>,
    },
    /// Write a value to a text file
    SaveFile { content: Expr, path: Expr },
    /// Read a whole text file into a variable
    ReadFile { path: Expr, target: String },
    /// Delete a file from disk
    DeleteFile(Expr),
    /// Sleep for a number of seconds
    Wait(Expr),
    /// Terminate the program
    ExitProgram,
    /// match / case
    Match { subject: Expr, cases: Vec<MatchCase> },
    /// Full-line comment, `#` included
    Comment(String),
    /// Verbatim Python line with an optional indented body
    Raw {
        text: String,
        body: Option<Vec<Stmt>>,
    },
    /// Expression statement
    Expr(Expr),
    /// Statement matched by a registered macro pattern
    Macro { pattern: String, args: Vec<MacroArg> },
}

/// Root of the tree
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
}
