//! emitter module tests
//!
//! Extracted from mod.rs for better code organization.

use super::*;
use crate::location::SourceLocation;
use pretty_assertions::assert_eq;

fn stmt(kind: StmtKind) -> Stmt {
    Stmt::new(kind, SourceLocation::new(1, 1))
}

fn name(n: &str) -> Expr {
    Expr::Name(n.to_string())
}

fn num(n: &str) -> Expr {
    Expr::Number(n.to_string())
}

fn bin(left: Expr, op: BinOp, right: Expr) -> Expr {
    Expr::BinOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn emit_core(body: Vec<Stmt>) -> String {
    emit(&Program { body }, &MacroRegistry::new()).unwrap()
}

fn method(name: &str, params: &[&str], decorators: &[&str]) -> Stmt {
    stmt(StmtKind::FunctionDef(FunctionDef {
        name: name.to_string(),
        params: params.iter().map(|p| Param::named(*p)).collect(),
        returns: None,
        body: vec![stmt(StmtKind::Pass)],
        decorators: decorators
            .iter()
            .map(|d| Decorator {
                name: d.to_string(),
                args: None,
            })
            .collect(),
        is_async: false,
    }))
}

fn class(body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::ClassDef(ClassDef {
        name: "Shape".to_string(),
        bases: vec![],
        body,
        decorators: vec![],
    }))
}

#[test]
fn test_emit_empty_program() {
    assert_eq!(emit_core(vec![]), "\n");
}

#[test]
fn test_nested_operand_is_grouped() {
    let expr = bin(name("a"), BinOp::Add, bin(name("b"), BinOp::Mul, name("c")));
    let registry = MacroRegistry::new();
    let mut emitter = PythonEmitter::new(&registry);
    assert_eq!(emitter.emit_expr(&expr).unwrap(), "a + (b * c)");

    let expr = bin(bin(name("a"), BinOp::Add, name("b")), BinOp::Mul, name("c"));
    assert_eq!(emitter.emit_expr(&expr).unwrap(), "(a + b) * c");
}

#[test]
fn test_boolean_and_unary_grouping() {
    let registry = MacroRegistry::new();
    let mut emitter = PythonEmitter::new(&registry);
    let test = Expr::Compare {
        left: Box::new(name("x")),
        ops: vec![(CmpOp::Gt, num("1"))],
    };
    let expr = Expr::UnaryOp {
        op: UnaryOp::Not,
        operand: Box::new(bin(test, BinOp::Or, name("done"))),
    };
    assert_eq!(emitter.emit_expr(&expr).unwrap(), "not ((x > 1) or done)");
}

#[test]
fn test_method_receives_self() {
    let output = emit_core(vec![class(vec![method("area", &["scale"], &[])])]);
    assert_eq!(output, "class Shape:\n    def area(self, scale):\n        pass\n");
}

#[test]
fn test_staticmethod_and_classmethod_receivers() {
    let output = emit_core(vec![class(vec![
        method("unit", &[], &["staticmethod"]),
        method("build", &["size"], &["classmethod"]),
    ])]);
    assert_eq!(
        output,
        "class Shape:\n    @staticmethod\n    def unit():\n        pass\n    @classmethod\n    def build(cls, size):\n        pass\n"
    );
}

#[test]
fn test_nested_function_in_method_has_no_receiver() {
    let StmtKind::FunctionDef(mut outer) = method("area", &[], &[]).kind else {
        unreachable!()
    };
    outer.body = vec![method("helper", &["n"], &[])];
    let output = emit_core(vec![class(vec![stmt(StmtKind::FunctionDef(outer))])]);
    assert!(output.contains("    def area(self):\n"));
    assert!(output.contains("        def helper(n):\n"));
}

#[test]
fn test_top_level_function_has_no_receiver() {
    assert_eq!(emit_core(vec![method("run", &["n"], &[])]), "def run(n):\n    pass\n");
}

#[test]
fn test_empty_body_emits_pass() {
    let output = emit_core(vec![stmt(StmtKind::While {
        condition: Expr::Bool(true),
        body: vec![],
    })]);
    assert_eq!(output, "while True:\n    pass\n");
}

#[test]
fn test_blank_lines_around_definitions() {
    let output = emit_core(vec![
        stmt(StmtKind::Pass),
        method("run", &[], &[]),
        stmt(StmtKind::Break),
    ]);
    assert_eq!(output, "pass\n\ndef run():\n    pass\n\nbreak\n");
}

#[test]
fn test_imports_are_sorted_and_unique() {
    let output = emit_core(vec![
        stmt(StmtKind::Wait(num("1"))),
        stmt(StmtKind::ExitProgram),
        stmt(StmtKind::Wait(num("2"))),
    ]);
    assert_eq!(
        output,
        "import sys\nimport time\n\ntime.sleep(1)\nsys.exit()\ntime.sleep(2)\n"
    );
}

#[test]
fn test_tuple_assignment_is_bare() {
    let output = emit_core(vec![stmt(StmtKind::Assign {
        target: Expr::Tuple(vec![name("a"), name("b")]),
        value: Expr::Tuple(vec![name("b"), name("a")]),
    })]);
    assert_eq!(output, "a, b = b, a\n");
}

#[test]
fn test_single_tuple_and_empty_set() {
    let registry = MacroRegistry::new();
    let mut emitter = PythonEmitter::new(&registry);
    assert_eq!(emitter.emit_expr(&Expr::Tuple(vec![num("1")])).unwrap(), "(1,)");
    assert_eq!(emitter.emit_expr(&Expr::Set(vec![])).unwrap(), "set()");
}

#[test]
fn test_slice_outside_subscript_is_error() {
    let registry = MacroRegistry::new();
    let mut emitter = PythonEmitter::new(&registry);
    let slice = Expr::Slice {
        lower: None,
        upper: None,
        step: None,
    };
    let err = emitter.emit_expr(&slice).unwrap_err();
    assert!(matches!(err, PlainPyError::EmissionError { .. }));
}

#[test]
fn test_unregistered_macro_is_error() {
    let program = Program {
        body: vec![stmt(StmtKind::Macro {
            pattern: "data_load".to_string(),
            args: vec![],
        })],
    };
    let err = emit(&program, &MacroRegistry::new()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Macro expansion error in 'data_load': pattern is not registered"
    );
}

#[test]
fn test_state_tracks_class_context() {
    let registry = MacroRegistry::new();
    let mut emitter = PythonEmitter::new(&registry);
    let program = Program {
        body: vec![class(vec![method("area", &[], &[])])],
    };
    emitter.emit_program(&program).unwrap();
    assert_eq!(emitter.state().indent_level, 0);
    assert!(!emitter.state().in_class_context);
}

// --- pipeline ---

#[test]
fn test_pipeline_file_statements() {
    let output = crate::transpile("save \"hi\" to file \"out.txt\"\nread file \"out.txt\" as text\n")
        .unwrap();
    assert_eq!(
        output,
        "with open(\"out.txt\", \"w\", encoding=\"utf-8\") as f:\n    f.write(str(\"hi\"))\nwith open(\"out.txt\", \"r\", encoding=\"utf-8\") as f:\n    text = f.read()\n"
    );
}

#[test]
fn test_pipeline_builtin_imports() {
    let output = crate::transpile("wait 2 seconds\nroll = random number from 1 to 6\n").unwrap();
    assert_eq!(
        output,
        "import random\nimport time\n\ntime.sleep(2)\nroll = random.randint(1, 6)\n"
    );
}

#[test]
fn test_pipeline_macro_expansion() {
    let output = crate::transpile("load \"sales.csv\" into sales\n").unwrap();
    assert_eq!(output, "import pandas as pd\n\nsales = pd.read_csv(\"sales.csv\")\n");

    let output = crate::transpile("get data from \"https://api.test/users\" as users\n").unwrap();
    assert_eq!(
        output,
        "import requests\n\nusers = requests.get(\"https://api.test/users\").json()\n"
    );
}

#[test]
fn test_pipeline_class_with_init() {
    let source = "\
class Counter:
    init(start):
        self.count = start
    define bump():
        self.count += 1
";
    assert_eq!(
        crate::transpile(source).unwrap(),
        "class Counter:\n    def __init__(self, start):\n        self.count = start\n    def bump(self):\n        self.count += 1\n"
    );
}

#[test]
fn test_macro_error_carries_statement_line() {
    let program = Program {
        body: vec![Stmt::new(
            StmtKind::Macro {
                pattern: "http_get".to_string(),
                args: vec![],
            },
            SourceLocation::new(7, 5),
        )],
    };
    let err = emit(&program, &MacroRegistry::new()).unwrap_err();
    assert!(matches!(err, PlainPyError::MacroExpansionError { line: 7, .. }));
    assert_eq!(err.line(), Some(7));
}

#[test]
fn test_named_expression_grouping() {
    let named = Expr::NamedExpr {
        target: "n".to_string(),
        value: Box::new(num("10")),
    };
    let output = emit_core(vec![
        stmt(StmtKind::Expr(named.clone())),
        stmt(StmtKind::If {
            branches: vec![CondBranch {
                test: Expr::Compare {
                    left: Box::new(named.clone()),
                    ops: vec![(CmpOp::Gt, num("5"))],
                },
                body: vec![],
            }],
            orelse: None,
        }),
        stmt(StmtKind::While {
            condition: named,
            body: vec![],
        }),
    ]);
    assert_eq!(
        output,
        "(n := 10)\nif (n := 10) > 5:\n    pass\nwhile n := 10:\n    pass\n"
    );
}

#[test]
fn test_emit_match_case() {
    let output = emit_core(vec![stmt(StmtKind::Match {
        subject: name("point"),
        cases: vec![
            MatchCase {
                pattern: CasePattern {
                    alternatives: vec![
                        Expr::Tuple(vec![num("0"), num("0")]),
                        Expr::List(vec![]),
                    ],
                    capture: Some("origin".to_string()),
                },
                guard: None,
                body: vec![stmt(StmtKind::Comment("# nothing to do".to_string()))],
            },
            MatchCase {
                pattern: CasePattern {
                    alternatives: vec![Expr::Tuple(vec![name("x"), name("y")])],
                    capture: None,
                },
                guard: Some(Expr::Compare {
                    left: Box::new(name("x")),
                    ops: vec![(CmpOp::Eq, name("y"))],
                }),
                body: vec![stmt(StmtKind::Break)],
            },
        ],
    })]);
    assert_eq!(
        output,
        "\
match point:
    case (0, 0) | [] as origin:
        # nothing to do
        pass
    case x, y if x == y:
        break
"
    );
}

#[test]
fn test_comment_run_stays_attached_to_definition() {
    let output = emit_core(vec![
        stmt(StmtKind::Pass),
        stmt(StmtKind::Comment("# helper".to_string())),
        stmt(StmtKind::Comment("# second line".to_string())),
        method("run", &[], &[]),
        stmt(StmtKind::Comment("# tail".to_string())),
        method("stop", &[], &[]),
    ]);
    assert_eq!(
        output,
        "pass\n\n# helper\n# second line\ndef run():\n    pass\n\n# tail\ndef stop():\n    pass\n"
    );
}

#[test]
fn test_pipeline_comments_pass_through() {
    let source = "\
# greet the user
say \"hi\"  # trailing comments are dropped
if ready:
    # nothing yet
    pass
# done
";
    assert_eq!(
        crate::transpile(source).unwrap(),
        "# greet the user\nprint(\"hi\")\nif ready:\n    # nothing yet\n    pass\n# done\n"
    );
}

#[test]
fn test_pipeline_save_in_file() {
    let output = crate::transpile("save report in file \"out.txt\"\n").unwrap();
    assert_eq!(
        output,
        "with open(\"out.txt\", \"w\", encoding=\"utf-8\") as f:\n    f.write(str(report))\n"
    );
}

#[test]
fn test_pipeline_phrase_verbs() {
    let source = "\
total = add price and tax
parts = split line by \",\"
shout = uppercase name
ranked = sort scores
";
    assert_eq!(
        crate::transpile(source).unwrap(),
        "total = price + tax\nparts = line.split(\",\")\nshout = name.upper()\nranked = sorted(scores)\n"
    );
}

#[test]
fn test_pipeline_bare_comparison_words_as_names() {
    assert_eq!(
        crate::transpile("above = 10\nsay above\nif x below above:\n    pass\n").unwrap(),
        "above = 10\nprint(above)\nif x < above:\n    pass\n"
    );
}
