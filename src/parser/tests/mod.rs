//! parser module tests
//!
//! Extracted from mod.rs for better code organization.

use super::*;
use crate::indenter;
use crate::location::SourceLocation;
use crate::lexer::lex_lines;
use crate::normalizer::normalize_tokens;
use pretty_assertions::assert_eq;

fn parse_source(source: &str) -> Result<Program> {
    let tokens = normalize_tokens(indenter::process(lex_lines(source)?)?);
    parse(&tokens, &Grammar::core())
}

fn single(source: &str) -> StmtKind {
    let mut program = parse_source(source).unwrap();
    assert_eq!(program.body.len(), 1, "source: {source}");
    program.body.remove(0).kind
}

fn name(n: &str) -> Expr {
    Expr::Name(n.to_string())
}

fn num(n: &str) -> Expr {
    Expr::Number(n.to_string())
}

fn string(s: &str) -> Expr {
    Expr::Str(s.to_string())
}

#[test]
fn test_parse_output_phrasings_agree() {
    let expected = StmtKind::Output {
        args: vec![Arg::Positional(string("\"Hello\""))],
    };
    for source in ["say \"Hello\"", "show \"Hello\"", "display \"Hello\"", "print \"Hello\""] {
        assert_eq!(single(source), expected, "source: {source}");
    }
}

#[test]
fn test_print_call_is_expression_statement() {
    let kind = single("print(\"Hello\")");
    assert!(matches!(kind, StmtKind::Expr(Expr::Call { .. })));
}

#[test]
fn test_parse_input_forms() {
    assert_eq!(
        single("ask name \"Your name? \""),
        StmtKind::Input {
            target: "name".to_string(),
            prompt: Some(string("\"Your name? \"")),
            conversion: None,
        }
    );
    assert_eq!(
        single("ask for number age"),
        StmtKind::Input {
            target: "age".to_string(),
            prompt: None,
            conversion: Some(Conversion::Int),
        }
    );
    assert_eq!(
        single("get decimal price \"Price: \""),
        StmtKind::Input {
            target: "price".to_string(),
            prompt: Some(string("\"Price: \"")),
            conversion: Some(Conversion::Float),
        }
    );
}

#[test]
fn test_parse_if_elif_else_chain() {
    let source = "if x > 1:\n    say 1\nelse if x > 0:\n    say 2\notherwise:\n    say 3\n";
    let StmtKind::If { branches, orelse } = single(source) else {
        panic!("expected if");
    };
    assert_eq!(branches.len(), 2);
    assert_eq!(orelse.map(|b| b.len()), Some(1));
}

#[test]
fn test_comparison_phrase_in_condition() {
    let StmtKind::If { branches, .. } = single("if score is greater than or equal to 90:\n    pass\n")
    else {
        panic!("expected if");
    };
    assert_eq!(
        branches[0].test,
        Expr::Compare {
            left: Box::new(name("score")),
            ops: vec![(CmpOp::GtEq, num("90"))],
        }
    );
}

#[test]
fn test_parse_repeat() {
    assert_eq!(
        single("repeat 3 times:\n    say \"hi\"\n"),
        StmtKind::Repeat {
            count: num("3"),
            body: vec![Stmt::new(
                StmtKind::Output {
                    args: vec![Arg::Positional(string("\"hi\""))]
                },
                SourceLocation::new(2, 5),
            )],
        }
    );
}

#[test]
fn test_parse_loops() {
    let StmtKind::ForEach { targets, iter, .. } = single("for each item in items:\n    say item\n")
    else {
        panic!("expected for");
    };
    assert_eq!(targets, vec!["item"]);
    assert_eq!(iter, name("items"));

    let StmtKind::ForEach { targets, .. } = single("loop through items:\n    say item\n") else {
        panic!("expected for");
    };
    assert_eq!(targets, vec!["item"]);

    let StmtKind::ForEach { targets, .. } = single("for key, value in pairs:\n    pass\n") else {
        panic!("expected for");
    };
    assert_eq!(targets, vec!["key", "value"]);

    let StmtKind::While { condition, .. } = single("keep doing:\n    break\n") else {
        panic!("expected while");
    };
    assert_eq!(condition, Expr::Bool(true));

    assert!(matches!(
        single("as long as n < 10:\n    n += 1\n"),
        StmtKind::While { .. }
    ));
}

#[test]
fn test_loop_control_phrases() {
    assert_eq!(single("stop"), StmtKind::Break);
    assert_eq!(single("exit loop"), StmtKind::Break);
    assert_eq!(single("skip"), StmtKind::Continue);
    assert_eq!(single("do nothing"), StmtKind::Pass);
    assert_eq!(single("quit program"), StmtKind::ExitProgram);
}

#[test]
fn test_parse_assignment_forms() {
    let expected = StmtKind::Assign {
        target: name("x"),
        value: num("5"),
    };
    assert_eq!(single("x = 5"), expected);
    assert_eq!(single("set x = 5"), expected);
    assert_eq!(single("set x to 5"), expected);
    assert_eq!(
        single("a, b = 1, 2"),
        StmtKind::Assign {
            target: Expr::Tuple(vec![name("a"), name("b")]),
            value: Expr::Tuple(vec![num("1"), num("2")]),
        }
    );
    assert_eq!(
        single("total += price * 2"),
        StmtKind::AugAssign {
            target: name("total"),
            op: AugOp::Add,
            value: Expr::BinOp {
                left: Box::new(name("price")),
                op: BinOp::Mul,
                right: Box::new(num("2")),
            },
        }
    );
}

#[test]
fn test_parse_collections() {
    assert_eq!(
        single("create list names = [\"a\", \"b\"]"),
        StmtKind::Assign {
            target: name("names"),
            value: Expr::List(vec![string("\"a\""), string("\"b\"")]),
        }
    );
    assert_eq!(
        single("create empty dict scores"),
        StmtKind::Assign {
            target: name("scores"),
            value: Expr::Dict(Vec::new()),
        }
    );
    assert_eq!(
        single("add 4 to numbers"),
        StmtKind::Append {
            list: name("numbers"),
            value: num("4"),
        }
    );
    assert_eq!(
        single("remove 4 from numbers"),
        StmtKind::Remove {
            list: name("numbers"),
            value: num("4"),
        }
    );
}

#[test]
fn test_parse_function_definition() {
    let StmtKind::FunctionDef(func) = single("define add(a, b=1) -> int:\n    return a + b\n")
    else {
        panic!("expected function");
    };
    assert_eq!(func.name, "add");
    assert_eq!(func.params.len(), 2);
    assert_eq!(func.params[1].default, Some(num("1")));
    assert_eq!(func.returns, Some(name("int")));
    assert_eq!(func.body.len(), 1);
    assert!(!func.is_async);

    let StmtKind::FunctionDef(func) = single("async define fetch(url):\n    pass\n") else {
        panic!("expected function");
    };
    assert!(func.is_async);
}

#[test]
fn test_empty_body_allowed() {
    let StmtKind::FunctionDef(func) = single("define noop():\n") else {
        panic!("expected function");
    };
    assert!(func.body.is_empty());
}

#[test]
fn test_parse_class_with_decorated_method() {
    let source = "\
class Counter:
    init(start):
        self.count = start
    staticmethod
    define zero():
        return 0
";
    let StmtKind::ClassDef(class) = single(source) else {
        panic!("expected class");
    };
    assert_eq!(class.name, "Counter");
    assert_eq!(class.body.len(), 2);
    let StmtKind::FunctionDef(init) = &class.body[0].kind else {
        panic!("expected init");
    };
    assert_eq!(init.name, "__init__");
    let StmtKind::FunctionDef(zero) = &class.body[1].kind else {
        panic!("expected method");
    };
    assert!(zero.has_decorator("staticmethod"));
}

#[test]
fn test_explicit_self_is_rejected() {
    let source = "class A:\n    define run(self):\n        pass\n";
    let err = parse_source(source).unwrap_err();
    assert!(matches!(err, PlainPyError::SyntaxError { line: 2, .. }));
}

#[test]
fn test_decorator_without_definition_is_rejected() {
    let err = parse_source("@cache\nx = 1\n").unwrap_err();
    assert!(matches!(err, PlainPyError::SyntaxError { line: 2, .. }));
}

#[test]
fn test_parse_try_except_finally() {
    let source = "\
try:
    risky()
catch ValueError as e:
    say e
finally:
    say \"done\"
";
    let StmtKind::Try {
        handlers,
        finalbody,
        ..
    } = single(source)
    else {
        panic!("expected try");
    };
    assert_eq!(handlers.len(), 1);
    assert_eq!(handlers[0].exception, Some(name("ValueError")));
    assert_eq!(handlers[0].name.as_deref(), Some("e"));
    assert!(finalbody.is_some());
}

#[test]
fn test_try_without_handler_is_rejected() {
    let err = parse_source("try:\n    pass\nsay 1\n").unwrap_err();
    assert!(matches!(err, PlainPyError::SyntaxError { line: 1, .. }));
}

#[test]
fn test_dangling_else_is_rejected() {
    let err = parse_source("say 1\nelse:\n    say 2\n").unwrap_err();
    assert!(matches!(err, PlainPyError::SyntaxError { line: 2, .. }));
}

#[test]
fn test_parse_file_statements() {
    assert!(matches!(
        single("open file \"data.txt\" as f:\n    say f.read()\n"),
        StmtKind::OpenFile { .. }
    ));
    assert_eq!(
        single("save text to file \"out.txt\""),
        StmtKind::SaveFile {
            content: name("text"),
            path: string("\"out.txt\""),
        }
    );
    assert_eq!(
        single("read file \"in.txt\" as content"),
        StmtKind::ReadFile {
            path: string("\"in.txt\""),
            target: "content".to_string(),
        }
    );
    assert_eq!(
        single("delete file \"old.txt\""),
        StmtKind::DeleteFile(string("\"old.txt\""))
    );
}

#[test]
fn test_save_content_stops_before_file_phrase() {
    let expected = StmtKind::SaveFile {
        content: name("data"),
        path: string("\"out.txt\""),
    };
    for source in [
        "save data in file \"out.txt\"",
        "save data into file \"out.txt\"",
        "write data to file \"out.txt\"",
    ] {
        assert_eq!(single(source), expected, "source: {source}");
    }
    let StmtKind::SaveFile { content, .. } = single("save total + 1 in file path") else {
        panic!("expected save");
    };
    assert!(matches!(content, Expr::BinOp { op: BinOp::Add, .. }));
}

#[test]
fn test_parse_imports() {
    assert_eq!(
        single("import numpy as np"),
        StmtKind::Import {
            module: "numpy".to_string(),
            alias: Some("np".to_string()),
        }
    );
    assert_eq!(
        single("from os.path import join, exists as file_exists"),
        StmtKind::FromImport {
            module: "os.path".to_string(),
            names: vec![
                ImportName {
                    name: "join".to_string(),
                    alias: None
                },
                ImportName {
                    name: "exists".to_string(),
                    alias: Some("file_exists".to_string())
                },
            ],
        }
    );
}

#[test]
fn test_parse_raw_line_with_body() {
    let kind = single("python: with lock:\n    count += 1\n");
    let StmtKind::Raw { text, body } = kind else {
        panic!("expected raw");
    };
    assert_eq!(text, "with lock:");
    assert_eq!(body.map(|b| b.len()), Some(1));
}

#[test]
fn test_precedence() {
    let StmtKind::Expr(expr) = single("a + b * c") else {
        panic!("expected expression");
    };
    assert_eq!(
        expr,
        Expr::BinOp {
            left: Box::new(name("a")),
            op: BinOp::Add,
            right: Box::new(Expr::BinOp {
                left: Box::new(name("b")),
                op: BinOp::Mul,
                right: Box::new(name("c")),
            }),
        }
    );
}

#[test]
fn test_power_is_right_associative() {
    let StmtKind::Expr(expr) = single("2 ** 3 ** 2") else {
        panic!("expected expression");
    };
    let Expr::BinOp { left, right, .. } = expr else {
        panic!("expected binop");
    };
    assert_eq!(*left, num("2"));
    assert!(matches!(*right, Expr::BinOp { op: BinOp::Pow, .. }));
}

#[test]
fn test_phrase_atoms() {
    let StmtKind::Assign { value, .. } = single("n = random number from 1 to 10") else {
        panic!("expected assignment");
    };
    assert_eq!(
        value,
        Expr::Builtin(Builtin::RandomInt {
            low: Box::new(num("1")),
            high: Box::new(num("10")),
        })
    );

    let StmtKind::Assign { value, .. } = single("n = length of names + 1") else {
        panic!("expected assignment");
    };
    assert!(matches!(value, Expr::BinOp { op: BinOp::Add, .. }));

    let StmtKind::Assign { value, .. } = single("x = last item in names") else {
        panic!("expected assignment");
    };
    assert_eq!(
        value,
        Expr::Subscript {
            value: Box::new(name("names")),
            index: Box::new(num("-1")),
        }
    );
}

fn assigned(source: &str) -> Expr {
    match single(source) {
        StmtKind::Assign { value, .. } => value,
        other => panic!("expected assignment, got {other:?}"),
    }
}

fn call_of(func: &str, args: Vec<Expr>) -> Expr {
    Expr::Call {
        func: Box::new(name(func)),
        args: args.into_iter().map(Arg::Positional).collect(),
    }
}

fn method(value: Expr, attr: &str, args: Vec<Expr>) -> Expr {
    Expr::Call {
        func: Box::new(Expr::Attribute {
            value: Box::new(value),
            attr: attr.to_string(),
        }),
        args: args.into_iter().map(Arg::Positional).collect(),
    }
}

fn bin(left: Expr, op: BinOp, right: Expr) -> Expr {
    Expr::BinOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

#[test]
fn test_math_phrases() {
    assert_eq!(assigned("n = add a and b"), bin(name("a"), BinOp::Add, name("b")));
    assert_eq!(assigned("n = sum a plus 2 * b"), bin(name("a"), BinOp::Add, bin(num("2"), BinOp::Mul, name("b"))));
    assert_eq!(assigned("n = subtract 3 from total"), bin(name("total"), BinOp::Sub, num("3")));
    assert_eq!(assigned("n = multiply price by qty"), bin(name("price"), BinOp::Mul, name("qty")));
    assert_eq!(assigned("n = divide total by count"), bin(name("total"), BinOp::Div, name("count")));
}

#[test]
fn test_string_and_list_phrases() {
    assert_eq!(
        assigned("line = join words with \", \""),
        method(string("\", \""), "join", vec![name("words")])
    );
    assert_eq!(
        assigned("parts = split line by \",\""),
        method(name("line"), "split", vec![string("\",\"")])
    );
    assert_eq!(assigned("loud = uppercase name"), method(name("name"), "upper", vec![]));
    assert_eq!(assigned("quiet = lowercase name"), method(name("name"), "lower", vec![]));
    assert_eq!(
        assigned("back = reverse items"),
        call_of("list", vec![call_of("reversed", vec![name("items")])])
    );
    assert_eq!(assigned("ranked = sort scores"), call_of("sorted", vec![name("scores")]));
}

#[test]
fn test_phrase_verbs_stay_names_without_operand() {
    assert_eq!(assigned("x = sort(items)"), call_of("sort", vec![name("items")]));
    assert_eq!(
        assigned("x = order[0]"),
        Expr::Subscript {
            value: Box::new(name("order")),
            index: Box::new(num("0")),
        }
    );
    assert_eq!(assigned("x = add"), name("add"));
    assert_eq!(
        single("add = 1"),
        StmtKind::Assign {
            target: name("add"),
            value: num("1"),
        }
    );
}

#[test]
fn test_named_expression() {
    let StmtKind::While { condition, .. } = single("while (chunk := read()) is not \"\":\n    pass\n") else {
        panic!("expected while");
    };
    let Expr::Compare { left, .. } = condition else {
        panic!("expected comparison");
    };
    assert_eq!(
        *left,
        Expr::NamedExpr {
            target: "chunk".to_string(),
            value: Box::new(call_of("read", vec![])),
        }
    );
}

#[test]
fn test_bare_comparison_words_as_names() {
    assert_eq!(
        single("above = 10"),
        StmtKind::Assign {
            target: name("above"),
            value: num("10"),
        }
    );
    let StmtKind::If { branches, .. } = single("if x above limit:\n    say equals\n") else {
        panic!("expected if");
    };
    assert!(matches!(branches[0].test, Expr::Compare { .. }));
    assert_eq!(
        branches[0].body[0].kind,
        StmtKind::Output {
            args: vec![Arg::Positional(name("equals"))],
        }
    );
}

#[test]
fn test_parse_match_case() {
    let source = "\
match command:
    case \"go\" | \"run\":
        say 1
    # fallback
    case [x, y] as pair if x above 0:
        say pair
    case _:
        pass
";
    let StmtKind::Match { subject, cases } = single(source) else {
        panic!("expected match");
    };
    assert_eq!(subject, name("command"));
    assert_eq!(cases.len(), 3);
    assert_eq!(
        cases[0].pattern.alternatives,
        vec![string("\"go\""), string("\"run\"")]
    );
    assert_eq!(cases[1].pattern.capture.as_deref(), Some("pair"));
    assert!(matches!(cases[1].guard, Some(Expr::Compare { .. })));
    assert_eq!(cases[2].pattern.alternatives, vec![name("_")]);
}

#[test]
fn test_match_block_holds_only_cases() {
    let err = parse_source("match x:\n    say 1\n").unwrap_err();
    assert!(matches!(err, PlainPyError::SyntaxError { line: 2, .. }));
    let err = parse_source("case 1:\n    pass\n").unwrap_err();
    assert!(matches!(err, PlainPyError::SyntaxError { line: 1, .. }));
}

#[test]
fn test_match_and_case_as_names() {
    assert_eq!(
        single("match = find(text)"),
        StmtKind::Assign {
            target: name("match"),
            value: call_of("find", vec![name("text")]),
        }
    );
}

#[test]
fn test_comments_become_statements() {
    let program = parse_source("# intro\nsay 1\nif x:\n    # inside\n    pass\n").unwrap();
    assert_eq!(program.body[0].kind, StmtKind::Comment("# intro".to_string()));
    let StmtKind::If { branches, .. } = &program.body[2].kind else {
        panic!("expected if");
    };
    assert_eq!(branches[0].body[0].kind, StmtKind::Comment("# inside".to_string()));
}

#[test]
fn test_comment_before_clause_moves_into_it() {
    let source = "if x:\n    say 1\n# other case\nelse:\n    say 2\n";
    let StmtKind::If { orelse, .. } = single(source) else {
        panic!("expected if");
    };
    let orelse = orelse.unwrap();
    assert_eq!(orelse[0].kind, StmtKind::Comment("# other case".to_string()));
    assert_eq!(orelse.len(), 2);
}

#[test]
fn test_comment_between_decorator_and_definition() {
    let program = parse_source("dataclass\n# fields\nclass Point:\n    x: int\n").unwrap();
    assert_eq!(program.body.len(), 2);
    assert_eq!(program.body[0].kind, StmtKind::Comment("# fields".to_string()));
    let StmtKind::ClassDef(class) = &program.body[1].kind else {
        panic!("expected class");
    };
    assert_eq!(class.decorators[0].name, "dataclass");
}

#[test]
fn test_comprehension_lambda_and_ternary() {
    let StmtKind::Assign { value, .. } = single("evens = [n for n in numbers if n % 2 == 0]") else {
        panic!("expected assignment");
    };
    assert!(matches!(value, Expr::ListComp { condition: Some(_), .. }));

    let StmtKind::Assign { value, .. } = single("double = x => x * 2") else {
        panic!("expected assignment");
    };
    assert!(matches!(value, Expr::Lambda { .. }));

    let StmtKind::Assign { value, .. } = single("label = \"big\" if n > 5 else \"small\"") else {
        panic!("expected assignment");
    };
    assert!(matches!(value, Expr::IfExp { .. }));
}

#[test]
fn test_slices() {
    let StmtKind::Expr(Expr::Subscript { index, .. }) = single("items[1:3]") else {
        panic!("expected subscript");
    };
    assert!(matches!(*index, Expr::Slice { step: None, .. }));
}

#[test]
fn test_syntax_error_reports_farthest_token() {
    let err = parse_source("say 1 2\n").unwrap_err();
    match err {
        PlainPyError::SyntaxError {
            line,
            column,
            expected,
            found,
        } => {
            assert_eq!((line, column), (1, 7));
            assert!(expected.contains(&"end of line".to_string()));
            assert_eq!(found, "'2'");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_ambiguous_negated_phrase_is_error() {
    assert!(parse_source("if x is not above y:\n    pass\n").is_err());
}

#[test]
fn test_error_inside_block_is_reported_at_its_line() {
    let err = parse_source("if x:\n    say 1\n    )\n").unwrap_err();
    assert_eq!(err.line(), Some(3));
}

#[test]
fn test_empty_source_parses_to_empty_program() {
    assert_eq!(parse_source("").unwrap(), Program::default());
    assert_eq!(parse_source("\n   \n\n").unwrap(), Program::default());
}
