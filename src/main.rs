//! plainpy CLI - English to Python Transpiler

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::Command;

use plainpy::diagnostics::{self, PpyDiagnostics};
use plainpy::{MacroRegistry, PlainPyError, Transpiler};

/// plainpy - English to Python Transpiler
#[derive(Parser, Debug)]
#[command(name = "plainpy")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Transpile plain English programs to Python", long_about = None)]
struct Cli {
    /// Input source file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output Python file (default: <INPUT>.py in the current directory)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Check only (don't generate output)
    #[arg(short, long)]
    check: bool,

    /// Show debug information
    #[arg(short, long)]
    debug: bool,

    /// Dump the normalized token stream as JSON and exit
    #[arg(long)]
    dump_tokens: bool,

    /// Dump the parsed statement tree and exit
    #[arg(long)]
    dump_tree: bool,

    /// Emit JSON diagnostics to stderr (on failure only)
    #[arg(long)]
    diag_json: bool,

    /// Disable the HTTP and data macro statements
    #[arg(long)]
    no_macros: bool,

    /// Run the generated file with python3 after writing it
    #[arg(short, long)]
    run: bool,
}

/// Print diagnostics for a failed stage and exit
fn fail(cli: &Cli, err: PlainPyError) -> ! {
    let diags: PpyDiagnostics = diagnostics::from_error(&err, Some(&cli.input));
    print!("{}", diags.to_text());
    if cli.diag_json {
        eprintln!("{}", diags.to_json());
    }
    std::process::exit(1);
}

fn default_output(input: &Path) -> PathBuf {
    let mut p = input.to_path_buf();
    p.set_extension("py");
    // Keep only the file name so output lands in the current directory
    match p.file_name() {
        Some(filename) => PathBuf::from(filename),
        None => p,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        println!("[DEBUG] Input: {:?}", cli.input);
        println!("[DEBUG] Output: {:?}", cli.output);
        println!("[DEBUG] Macros: {}", if cli.no_macros { "off" } else { "on" });
    }

    let source = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;

    if cli.debug {
        println!("[DEBUG] Source length: {} bytes", source.len());
    }

    let transpiler = if cli.no_macros {
        Transpiler::without_macros()
    } else {
        Transpiler::new(MacroRegistry::with_defaults())
    };

    if cli.dump_tokens {
        let tokens = transpiler.tokenize(&source).unwrap_or_else(|err| fail(&cli, err));
        println!("{}", serde_json::to_string_pretty(&tokens)?);
        return Ok(());
    }

    if cli.dump_tree {
        let program = transpiler.parse(&source).unwrap_or_else(|err| fail(&cli, err));
        println!("=== Statement Tree ===");
        for (i, stmt) in program.body.iter().enumerate() {
            println!("[{:03}] {} {:?}", i, stmt.location, stmt.kind);
        }
        return Ok(());
    }

    if cli.debug {
        let tokens = transpiler.tokenize(&source).unwrap_or_else(|err| fail(&cli, err));
        println!("[DEBUG] Token count: {}", tokens.len());
    }

    let python = transpiler.transpile(&source).unwrap_or_else(|err| fail(&cli, err));

    if cli.debug {
        println!("[DEBUG] Generated Python code:");
        print!("{python}");
    }

    if cli.check {
        println!("✅ Transpilation successful!");
        return Ok(());
    }

    let output_path = cli.output.clone().unwrap_or_else(|| default_output(&cli.input));
    std::fs::write(&output_path, &python)
        .with_context(|| format!("failed to write {}", output_path.display()))?;
    println!("✅ Transpiled to: {output_path:?}");

    if cli.run {
        if cli.debug {
            println!("[DEBUG] Running: python3 {}", output_path.display());
        }
        let status = Command::new("python3")
            .arg(&output_path)
            .status()
            .context("failed to start python3")?;
        if !status.success() {
            std::process::exit(status.code().unwrap_or(1));
        }
    }

    Ok(())
}
