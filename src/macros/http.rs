//! HTTP statements backed by `requests`

use super::{arg, MacroArgs, MacroInput, MacroPattern};
use crate::parser::Sym::*;

const IMPORTS: &[&str] = &["import requests"];
const DEFAULT_TARGET: &str = "response";

/// Captures: URL, optional target
fn url_and_target(input: &MacroInput) -> Result<MacroArgs, String> {
    let mut args = MacroArgs::new();
    args.insert("url".to_string(), input.required(0, "URL")?);
    let target = input.code(1).unwrap_or(DEFAULT_TARGET);
    args.insert("target".to_string(), target.to_string());
    Ok(args)
}

/// Captures: URL, optional payload, optional target
fn url_payload_target(input: &MacroInput) -> Result<MacroArgs, String> {
    let mut args = MacroArgs::new();
    args.insert("url".to_string(), input.required(0, "URL")?);
    if let Some(payload) = input.code(1) {
        args.insert("payload".to_string(), payload.to_string());
    }
    let target = input.code(2).unwrap_or(DEFAULT_TARGET);
    args.insert("target".to_string(), target.to_string());
    Ok(args)
}

/// `target = requests.<method>(url)<suffix>`
fn request(args: &MacroArgs, method: &str, suffix: &str) -> Result<String, String> {
    let url = arg(args, "url")?;
    let target = arg(args, "target")?;
    Ok(format!("{target} = requests.{method}({url}){suffix}"))
}

/// `target = requests.<method>(url[, keyword=payload])<suffix>`
fn send(args: &MacroArgs, method: &str, keyword: &str, suffix: &str) -> Result<String, String> {
    let url = arg(args, "url")?;
    let target = arg(args, "target")?;
    let call_args = match args.get("payload") {
        Some(payload) => format!("{url}, {keyword}={payload}"),
        None => url.to_string(),
    };
    Ok(format!("{target} = requests.{method}({call_args}){suffix}"))
}

pub const PATTERNS: &[MacroPattern] = &[
    MacroPattern {
        name: "http_get_json",
        syntax: &[
            OneOf(&[
                &[Word("get"), Word("data"), Word("from")],
                &[Word("get"), Word("json"), Word("from")],
            ]),
            Expr,
            Opt(&[Word("as"), Name]),
            End,
        ],
        extract: url_and_target,
        render: |args| request(args, "get", ".json()"),
        imports: IMPORTS,
    },
    MacroPattern {
        name: "http_get_text",
        syntax: &[
            Word("get"),
            Word("text"),
            Word("from"),
            Expr,
            Opt(&[Word("as"), Name]),
            End,
        ],
        extract: url_and_target,
        render: |args| request(args, "get", ".text"),
        imports: IMPORTS,
    },
    MacroPattern {
        name: "http_post_json",
        syntax: &[
            OneOf(&[
                &[Word("post"), Word("data"), Word("to")],
                &[Word("post"), Word("json"), Word("to")],
            ]),
            Expr,
            Opt(&[Word("with"), Expr]),
            Opt(&[Word("as"), Name]),
            End,
        ],
        extract: url_payload_target,
        render: |args| send(args, "post", "json", ".json()"),
        imports: IMPORTS,
    },
    MacroPattern {
        name: "http_post_text",
        syntax: &[
            Word("post"),
            Word("text"),
            Word("to"),
            Expr,
            Opt(&[Word("with"), Expr]),
            Opt(&[Word("as"), Name]),
            End,
        ],
        extract: url_payload_target,
        render: |args| send(args, "post", "data", ".text"),
        imports: IMPORTS,
    },
    MacroPattern {
        name: "http_put_json",
        syntax: &[
            OneOf(&[
                &[Word("put"), Word("data"), Word("to")],
                &[Word("put"), Word("json"), Word("to")],
            ]),
            Expr,
            Opt(&[Word("with"), Expr]),
            Opt(&[Word("as"), Name]),
            End,
        ],
        extract: url_payload_target,
        render: |args| send(args, "put", "json", ".json()"),
        imports: IMPORTS,
    },
    MacroPattern {
        name: "http_delete",
        syntax: &[
            Word("delete"),
            Word("from"),
            Expr,
            Opt(&[Word("as"), Name]),
            End,
        ],
        extract: url_and_target,
        render: |args| request(args, "delete", ""),
        imports: IMPORTS,
    },
];
