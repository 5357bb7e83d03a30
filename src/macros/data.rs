//! Tabular data statements backed by `pandas`

use super::{arg, MacroArgs, MacroInput, MacroPattern};
use crate::parser::Sym::*;

const IMPORTS: &[&str] = &["import pandas as pd"];

/// Reader function for a quoted file name
fn reader_for(path: &str) -> &'static str {
    let unquoted = path.trim_matches(|c| c == '"' || c == '\'');
    if unquoted.to_ascii_lowercase().ends_with(".json") {
        "read_json"
    } else {
        "read_csv"
    }
}

fn load_extract(input: &MacroInput) -> Result<MacroArgs, String> {
    let mut args = MacroArgs::new();
    args.insert("path".to_string(), input.required(0, "file name")?);
    args.insert("target".to_string(), input.required(1, "target name")?);
    Ok(args)
}

fn load_render(args: &MacroArgs) -> Result<String, String> {
    let path = arg(args, "path")?;
    let target = arg(args, "target")?;
    Ok(format!("{target} = pd.{}({path})", reader_for(path)))
}

fn filter_extract(input: &MacroInput) -> Result<MacroArgs, String> {
    let mut args = MacroArgs::new();
    args.insert("frame".to_string(), input.required(0, "data frame")?);
    args.insert("column".to_string(), input.required(1, "column")?);
    args.insert("op".to_string(), input.required(2, "comparison")?);
    args.insert("value".to_string(), input.required(3, "value")?);
    Ok(args)
}

fn filter_render(args: &MacroArgs) -> Result<String, String> {
    let frame = arg(args, "frame")?;
    let column = arg(args, "column")?;
    let op = arg(args, "op")?;
    let value = arg(args, "value")?;
    Ok(format!("{frame} = {frame}[{frame}[{column}] {op} {value}]"))
}

/// Captures: frame, column, optional target defaulting to `<frame>_<suffix>`
fn grouping(input: &MacroInput, suffix: &str) -> Result<MacroArgs, String> {
    let mut args = MacroArgs::new();
    let frame = input.required(0, "data frame")?;
    let target = input
        .code(2)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{frame}_{suffix}"));
    args.insert("column".to_string(), input.required(1, "column")?);
    args.insert("frame".to_string(), frame);
    args.insert("target".to_string(), target);
    Ok(args)
}

fn grouped(args: &MacroArgs, tail: &str) -> Result<String, String> {
    let frame = arg(args, "frame")?;
    let column = arg(args, "column")?;
    let target = arg(args, "target")?;
    Ok(format!("{target} = {frame}.groupby({column}){tail}"))
}

pub const PATTERNS: &[MacroPattern] = &[
    MacroPattern {
        name: "data_load",
        syntax: &[Word("load"), Str, Word("into"), Name, End],
        extract: load_extract,
        render: load_render,
        imports: IMPORTS,
    },
    MacroPattern {
        name: "data_filter",
        syntax: &[
            Word("filter"),
            Name,
            Word("where"),
            Word("column"),
            Str,
            CompareOp,
            Expr,
            End,
        ],
        extract: filter_extract,
        render: filter_render,
        imports: IMPORTS,
    },
    MacroPattern {
        name: "data_group",
        syntax: &[
            Word("group"),
            Name,
            Word("by"),
            Str,
            Opt(&[Word("as"), Name]),
            End,
        ],
        extract: |input| grouping(input, "grouped"),
        render: |args| grouped(args, ""),
        imports: IMPORTS,
    },
    MacroPattern {
        name: "data_sum",
        syntax: &[
            Word("sum"),
            Name,
            Word("by"),
            Str,
            Opt(&[Word("as"), Name]),
            End,
        ],
        extract: |input| grouping(input, "summed"),
        render: |args| grouped(args, ".sum()"),
        imports: IMPORTS,
    },
];
