//! Statement grammar
//!
//! Every statement form is a production: a rule tag plus a sequence of
//! grammar symbols. Several English phrasings of one construct share a rule
//! tag, so they build the same tree node.
//!
//! Productions are ordered most-specific-first: leading alternations are
//! expanded into one production per alternative, then productions are
//! stably sorted by the length of their fixed-token prefix. The parser tries
//! them in that order and keeps the first complete match.

use crate::macros::MacroRegistry;

/// Grammar symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sym {
    /// NAME or KEYWORD token with exactly this text
    Word(&'static str),
    /// OPERATOR token with exactly this text
    Op(&'static str),
    /// Zero-width: the next token is not this operator
    NotOp(&'static str),
    /// Any one of these words/operators; captures its text
    Choice(&'static [&'static str]),
    /// Identifier
    Name,
    /// Dotted identifier (os.path); captured as one name
    Dotted,
    /// Comma-separated identifiers
    Names,
    /// Single expression
    Expr,
    /// Arithmetic expression; stops before comparisons and `and`/`or`
    Arith,
    /// Comma-separated expressions; more than one forms a tuple
    ExprList,
    /// Assignable expression (name, attribute, subscript)
    Target,
    /// Comma-separated targets; more than one forms a tuple
    TargetList,
    /// Comparison operator token; captures its text
    CompareOp,
    /// String literal; captures its text
    Str,
    /// Call arguments (possibly none), without parentheses
    Args,
    /// Parenthesized parameter list
    Params,
    /// `*` or `name [as alias], ...` after `from module import`
    Imports,
    /// Raw pass-through line
    Raw,
    /// Full-line comment; captures its text
    Comment,
    /// `case` pattern: alternatives joined by `|` or `or`, optional `as name`
    Pattern,
    /// `:` LINE_END and an indented block of `case` clauses
    Cases,
    /// LINE_END
    End,
    /// `:` LINE_END and an optional indented block
    Body,
    /// BLOCK_START statements BLOCK_END
    Indented,
    /// Optional group; absent captures are filled with placeholders
    Opt(&'static [Sym]),
    /// Alternatives with identical capture shapes
    OneOf(&'static [&'static [Sym]]),
}

impl Sym {
    /// True for symbols that match exactly one known token
    pub fn is_fixed(self) -> bool {
        matches!(self, Sym::Word(_) | Sym::Op(_) | Sym::Choice(_))
    }

    /// How many captures this symbol contributes
    pub fn capture_count(self) -> usize {
        match self {
            Sym::Word(_) | Sym::Op(_) | Sym::NotOp(_) | Sym::End => 0,
            Sym::Opt(inner) => count_captures(inner),
            Sym::OneOf(alternatives) => alternatives.first().map_or(0, |alt| count_captures(alt)),
            _ => 1,
        }
    }

    /// Human-readable form used in syntax errors
    pub fn describe(self) -> String {
        match self {
            Sym::Word(w) | Sym::Op(w) | Sym::NotOp(w) => format!("`{w}`"),
            Sym::Choice(options) => options
                .iter()
                .map(|o| format!("`{o}`"))
                .collect::<Vec<_>>()
                .join(" or "),
            Sym::Name | Sym::Names | Sym::Dotted => "identifier".to_string(),
            Sym::Expr | Sym::ExprList | Sym::Arith => "expression".to_string(),
            Sym::Target | Sym::TargetList => "assignment target".to_string(),
            Sym::CompareOp => "comparison operator".to_string(),
            Sym::Str => "string literal".to_string(),
            Sym::Args => "arguments".to_string(),
            Sym::Params => "`(`".to_string(),
            Sym::Imports => "import names".to_string(),
            Sym::Raw => "raw python line".to_string(),
            Sym::Comment => "comment".to_string(),
            Sym::Pattern => "case pattern".to_string(),
            Sym::Cases => "`:`".to_string(),
            Sym::End => "end of line".to_string(),
            Sym::Body => "`:`".to_string(),
            Sym::Indented => "indented block".to_string(),
            Sym::Opt(inner) => inner.first().map_or_else(String::new, |s| s.describe()),
            Sym::OneOf(alternatives) => alternatives
                .iter()
                .filter_map(|alt| alt.first())
                .map(|s| s.describe())
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }
}

pub fn count_captures(syms: &[Sym]) -> usize {
    syms.iter().map(|s| s.capture_count()).sum()
}

/// Core statement rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StmtRule {
    Output,
    Input,
    InputTyped,
    If,
    Elif,
    Else,
    Repeat,
    ForEach,
    LoopThrough,
    While,
    Forever,
    Break,
    Continue,
    Pass,
    ExitProgram,
    Wait,
    CollectionDecl,
    CollectionEmpty,
    Append,
    Remove,
    DeleteFile,
    FunctionDef,
    AsyncFunctionDef,
    Init,
    Return,
    Yield,
    ClassDef,
    Decorator,
    BareDecorator,
    Try,
    Except,
    Finally,
    Raise,
    Assert,
    Import,
    FromImport,
    With,
    OpenFile,
    SaveFile,
    ReadFile,
    Match,
    Case,
    Comment,
    Raw,
    Declare,
    AugAssign,
    Assign,
    ExprStmt,
}

/// What a matched production builds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductionRule {
    Core(StmtRule),
    /// Registered macro pattern, by name
    Macro(&'static str),
}

use Sym::*;

const COLLECTIONS: &[&str] = &["list", "dict", "dictionary", "tuple", "set"];
const AUG_OPS: &[&str] = &["+=", "-=", "*=", "/=", "//=", "%=", "**="];
const DECORATOR_WORDS: &[&str] = &[
    "staticmethod",
    "classmethod",
    "property",
    "abstractmethod",
    "dataclass",
];

const ASK: &[&[Sym]] = &[
    &[Word("ask"), Word("for")],
    &[Word("ask")],
    &[Word("get")],
    &[Word("read")],
    &[Word("prompt")],
];
const CREATE_OR_NOTHING: &[&[Sym]] = &[&[Word("create")], &[Word("make")], &[]];
const CALL_ARGS: &[Sym] = &[Op("("), Args, Op(")")];

/// The core statement table, in tie-breaking order
pub const CORE_PRODUCTIONS: &[(StmtRule, &[Sym])] = &[
    (
        StmtRule::Output,
        &[
            OneOf(&[
                &[Word("say")],
                &[Word("show")],
                &[Word("display")],
                &[Word("tell")],
                &[Word("print"), NotOp("(")],
            ]),
            Args,
            End,
        ],
    ),
    (
        StmtRule::InputTyped,
        &[
            OneOf(ASK),
            Choice(&["number", "integer", "decimal"]),
            Name,
            Opt(&[Expr]),
            End,
        ],
    ),
    (StmtRule::Input, &[OneOf(ASK), Name, Opt(&[Expr]), End]),
    (
        StmtRule::If,
        &[
            OneOf(&[&[Word("if")], &[Word("when")], &[Word("whenever")]]),
            Expr,
            Body,
        ],
    ),
    (
        StmtRule::Elif,
        &[
            OneOf(&[
                &[Word("elif")],
                &[Word("else"), Word("if")],
                &[Word("or"), Word("if")],
            ]),
            Expr,
            Body,
        ],
    ),
    (
        StmtRule::Else,
        &[OneOf(&[&[Word("else")], &[Word("otherwise")]]), Body],
    ),
    (
        StmtRule::Repeat,
        &[
            OneOf(&[&[Word("repeat")], &[Word("do")], &[Word("loop")]]),
            Expr,
            OneOf(&[&[Word("times")], &[Word("time")]]),
            Body,
        ],
    ),
    (
        StmtRule::ForEach,
        &[
            OneOf(&[
                &[Word("for"), Word("each")],
                &[Word("for"), Word("every")],
                &[Word("for")],
            ]),
            Names,
            Word("in"),
            Expr,
            Body,
        ],
    ),
    (
        StmtRule::LoopThrough,
        &[
            OneOf(&[
                &[Word("loop"), Word("through")],
                &[Word("loop"), Word("over")],
                &[Word("iterate"), Word("over")],
                &[Word("iterate"), Word("through")],
                &[Word("go"), Word("through")],
            ]),
            Expr,
            Opt(&[Word("as"), Names]),
            Body,
        ],
    ),
    (
        StmtRule::While,
        &[
            OneOf(&[
                &[Word("while")],
                &[Word("as"), Word("long"), Word("as")],
                &[Word("keep"), Word("doing"), Word("while")],
                &[Word("continue"), Word("while")],
                &[Word("repeat"), Word("while")],
                &[Word("loop"), Word("while")],
            ]),
            Expr,
            Body,
        ],
    ),
    (
        StmtRule::Forever,
        &[
            OneOf(&[
                &[Word("keep"), Word("doing")],
                &[Word("loop"), Word("forever")],
                &[Word("repeat"), Word("forever")],
            ]),
            Body,
        ],
    ),
    (
        StmtRule::Break,
        &[
            OneOf(&[
                &[Word("break")],
                &[Word("stop")],
                &[Word("stop"), Word("loop")],
                &[Word("exit"), Word("loop")],
                &[Word("leave"), Word("loop")],
                &[Word("quit"), Word("loop")],
            ]),
            End,
        ],
    ),
    (
        StmtRule::Continue,
        &[
            OneOf(&[
                &[Word("continue")],
                &[Word("skip")],
                &[Word("next")],
                &[Word("go"), Word("to"), Word("next")],
                &[Word("proceed")],
            ]),
            End,
        ],
    ),
    (
        StmtRule::Pass,
        &[
            OneOf(&[
                &[Word("pass")],
                &[Word("do"), Word("nothing")],
                &[Word("skip"), Word("this")],
                &[Word("ignore")],
            ]),
            End,
        ],
    ),
    (
        StmtRule::ExitProgram,
        &[
            OneOf(&[
                &[Word("exit"), Word("program")],
                &[Word("quit"), Word("program")],
                &[Word("stop"), Word("program")],
            ]),
            End,
        ],
    ),
    (
        StmtRule::Wait,
        &[
            OneOf(&[
                &[Word("wait"), Word("for")],
                &[Word("wait")],
                &[Word("pause")],
                &[Word("sleep")],
                &[Word("delay")],
            ]),
            Expr,
            OneOf(&[&[Word("seconds")], &[Word("second")]]),
            End,
        ],
    ),
    (
        StmtRule::CollectionDecl,
        &[
            OneOf(CREATE_OR_NOTHING),
            Choice(COLLECTIONS),
            Name,
            Op("="),
            ExprList,
            End,
        ],
    ),
    (
        StmtRule::CollectionEmpty,
        &[
            OneOf(CREATE_OR_NOTHING),
            Opt(&[Word("empty")]),
            Choice(COLLECTIONS),
            Name,
            End,
        ],
    ),
    (
        StmtRule::Append,
        &[
            OneOf(&[&[Word("add")], &[Word("append")]]),
            Expr,
            Word("to"),
            Target,
            End,
        ],
    ),
    (
        StmtRule::Append,
        &[
            OneOf(&[&[Word("put")], &[Word("insert")]]),
            Expr,
            Word("into"),
            Target,
            End,
        ],
    ),
    (
        StmtRule::Remove,
        &[
            OneOf(&[
                &[Word("remove")],
                &[Word("delete")],
                &[Word("take"), Word("out")],
            ]),
            Expr,
            Word("from"),
            Target,
            End,
        ],
    ),
    (
        StmtRule::DeleteFile,
        &[
            OneOf(&[&[Word("delete"), Word("file")], &[Word("remove"), Word("file")]]),
            Expr,
            End,
        ],
    ),
    (
        StmtRule::FunctionDef,
        &[
            OneOf(&[
                &[Word("define")],
                &[Word("function")],
                &[Word("to")],
                &[Word("create"), Word("function")],
                &[Word("def")],
                &[Word("task")],
                &[Word("magic")],
            ]),
            Name,
            Opt(&[Params]),
            Opt(&[Op("->"), Expr]),
            Body,
        ],
    ),
    (
        StmtRule::AsyncFunctionDef,
        &[
            Word("async"),
            OneOf(&[
                &[Word("define")],
                &[Word("function")],
                &[Word("def")],
                &[Word("task")],
            ]),
            Name,
            Opt(&[Params]),
            Opt(&[Op("->"), Expr]),
            Body,
        ],
    ),
    (
        StmtRule::Init,
        &[
            OneOf(&[&[Word("init")], &[Word("constructor")], &[Word("initialize")]]),
            Params,
            Body,
        ],
    ),
    (
        StmtRule::Return,
        &[
            OneOf(&[
                &[Word("return")],
                &[Word("give"), Word("back")],
                &[Word("send"), Word("back")],
            ]),
            Opt(&[ExprList]),
            End,
        ],
    ),
    (StmtRule::Yield, &[Word("yield"), Opt(&[ExprList]), End]),
    (
        StmtRule::ClassDef,
        &[
            OneOf(&[
                &[Word("class")],
                &[Word("create"), Word("class")],
                &[Word("make"), Word("class")],
            ]),
            Name,
            Opt(CALL_ARGS),
            Body,
        ],
    ),
    (
        StmtRule::Decorator,
        &[Op("@"), Dotted, Opt(CALL_ARGS), End],
    ),
    (
        StmtRule::Decorator,
        &[Word("decorator"), Dotted, Opt(CALL_ARGS), Opt(&[Op(":")]), End],
    ),
    (
        StmtRule::BareDecorator,
        &[Choice(DECORATOR_WORDS), Opt(&[Op(":")]), End],
    ),
    (
        StmtRule::Try,
        &[
            OneOf(&[
                &[Word("try")],
                &[Word("attempt")],
                &[Word("attempt"), Word("to")],
            ]),
            Body,
        ],
    ),
    (
        StmtRule::Except,
        &[
            OneOf(&[
                &[Word("except")],
                &[Word("catch")],
                &[Word("handle")],
                &[Word("on"), Word("error")],
            ]),
            Opt(&[Expr, Opt(&[Word("as"), Name])]),
            Body,
        ],
    ),
    (
        StmtRule::Finally,
        &[
            OneOf(&[
                &[Word("finally")],
                &[Word("always")],
                &[Word("in"), Word("the"), Word("end")],
            ]),
            Body,
        ],
    ),
    (
        StmtRule::Raise,
        &[
            OneOf(&[&[Word("raise")], &[Word("throw")]]),
            Opt(&[Expr, Opt(&[Word("from"), Expr])]),
            End,
        ],
    ),
    (
        StmtRule::Assert,
        &[
            OneOf(&[
                &[Word("assert")],
                &[Word("ensure"), NotOp("(")],
                &[Word("make"), Word("sure")],
            ]),
            Expr,
            Opt(&[Op(","), Expr]),
            End,
        ],
    ),
    (
        StmtRule::Import,
        &[
            OneOf(&[&[Word("import")], &[Word("use")]]),
            Dotted,
            Opt(&[Word("as"), Name]),
            End,
        ],
    ),
    (
        StmtRule::FromImport,
        &[
            Word("from"),
            Dotted,
            OneOf(&[&[Word("import")], &[Word("use")]]),
            Imports,
            End,
        ],
    ),
    (
        StmtRule::With,
        &[Word("with"), Expr, Opt(&[Word("as"), Name]), Body],
    ),
    (
        StmtRule::OpenFile,
        &[
            OneOf(&[&[Word("open"), Word("file")], &[Word("open")]]),
            Expr,
            Word("as"),
            Name,
            Body,
        ],
    ),
    (
        StmtRule::SaveFile,
        &[
            OneOf(&[
                &[Word("save"), Word("text")],
                &[Word("save")],
                &[Word("write")],
            ]),
            Arith,
            OneOf(&[
                &[Word("to"), Word("file")],
                &[Word("into"), Word("file")],
                &[Word("in"), Word("file")],
            ]),
            Expr,
            End,
        ],
    ),
    (
        StmtRule::ReadFile,
        &[
            OneOf(&[
                &[Word("read"), Word("file")],
                &[Word("load"), Word("file")],
                &[Word("get"), Word("from"), Word("file")],
            ]),
            Expr,
            Word("as"),
            Name,
            End,
        ],
    ),
    (StmtRule::Match, &[Word("match"), Expr, Cases]),
    (
        StmtRule::Case,
        &[Word("case"), Pattern, Opt(&[Word("if"), Expr]), Body],
    ),
    (StmtRule::Comment, &[Comment, End]),
    (StmtRule::Raw, &[Raw, End, Opt(&[Indented])]),
    (
        StmtRule::Declare,
        &[Target, Op(":"), Expr, Opt(&[Op("="), ExprList]), End],
    ),
    (
        StmtRule::AugAssign,
        &[OneOf(&[&[Word("set")], &[]]), Target, Choice(AUG_OPS), Expr, End],
    ),
    (
        StmtRule::Assign,
        &[
            OneOf(&[
                &[Word("set")],
                &[Word("let")],
                &[Word("assign")],
                &[Word("make")],
                &[Word("create")],
                &[Word("initialize")],
                &[Word("store")],
                &[Word("save")],
                &[Word("put")],
                &[],
            ]),
            TargetList,
            Op("="),
            ExprList,
            End,
        ],
    ),
    (
        StmtRule::Assign,
        &[
            OneOf(&[&[Word("set")], &[Word("change")], &[Word("update")]]),
            Target,
            Word("to"),
            ExprList,
            End,
        ],
    ),
    (StmtRule::ExprStmt, &[ExprList, End]),
];

/// One expanded production
#[derive(Debug, Clone, PartialEq)]
pub struct Production {
    pub rule: ProductionRule,
    pub syms: Vec<Sym>,
    pub fixed_prefix: usize,
}

impl Production {
    fn new(rule: ProductionRule, syms: Vec<Sym>) -> Self {
        let fixed_prefix = syms
            .iter()
            .filter(|s| !matches!(s, Sym::NotOp(_)))
            .take_while(|s| s.is_fixed())
            .count();
        Self {
            rule,
            syms,
            fixed_prefix,
        }
    }
}

/// Ordered production list used by the parser
#[derive(Debug, Clone)]
pub struct Grammar {
    productions: Vec<Production>,
}

impl Grammar {
    /// Core productions plus every pattern in `registry`
    pub fn new(registry: &MacroRegistry) -> Self {
        let core = CORE_PRODUCTIONS
            .iter()
            .map(|(rule, syms)| (ProductionRule::Core(*rule), *syms));
        let macros = registry
            .patterns()
            .map(|pattern| (ProductionRule::Macro(pattern.name), pattern.syntax));

        let mut productions: Vec<Production> = core
            .chain(macros)
            .flat_map(|(rule, syms)| {
                expand(syms)
                    .into_iter()
                    .map(move |expanded| Production::new(rule, expanded))
            })
            .collect();
        // Stable: ties keep table order.
        productions.sort_by(|a, b| b.fixed_prefix.cmp(&a.fixed_prefix));
        Self { productions }
    }

    /// Core productions only
    pub fn core() -> Self {
        Self::new(&MacroRegistry::new())
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }
}

/// Expand alternations that sit inside the fixed prefix
fn expand(syms: &[Sym]) -> Vec<Vec<Sym>> {
    for (index, sym) in syms.iter().enumerate() {
        match sym {
            Sym::OneOf(alternatives) => {
                return alternatives
                    .iter()
                    .flat_map(|alt| {
                        let mut expanded = syms[..index].to_vec();
                        expanded.extend_from_slice(alt);
                        expanded.extend_from_slice(&syms[index + 1..]);
                        expand(&expanded)
                    })
                    .collect();
            }
            Sym::NotOp(_) => continue,
            s if s.is_fixed() => continue,
            _ => break,
        }
    }
    vec![syms.to_vec()]
}
