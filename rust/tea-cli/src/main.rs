//! Tea CLI — command-line entry point.
//!
//! Grounded on `examples/alliecatowo-lumen/rust/lumen-cli/src/main.rs`'s
//! `clap::Parser`/`Subcommand` shape, trimmed from Lumen's package-manager-
//! sized command set down to the three forms SPEC_FULL.md §4.8 names: bare
//! REPL, `run <file>`, `check <file>`, plus a global `--debug` flag.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tea_cli::colors::{bold, cyan, red};
use tea_cli::repl;

#[derive(Parser)]
#[command(
    name = "tea",
    version,
    about = "Tea — a small, dynamically-typed, expression-oriented scripting language",
    long_about = "Tea lexes, parses, and tree-walks source text, producing a value or a \
                  structured error per top-level statement.\n\nWith no subcommand, opens an \
                  interactive REPL."
)]
struct Cli {
    /// Emit tracing output for lexer/parser/evaluator internals.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and evaluate a source file, then exit.
    Run {
        /// Path to the source file
        file: PathBuf,
    },
    /// Parse a source file and report errors without evaluating it.
    Check {
        /// Path to the source file
        file: PathBuf,
    },
}

fn init_tracing(debug: bool) {
    let filter = EnvFilter::new(if debug { "tea=trace" } else { "tea=warn" });
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match cli.command {
        None => {
            repl::run(cli.debug);
            ExitCode::SUCCESS
        }
        Some(Commands::Run { file }) => run_file(&file),
        Some(Commands::Check { file }) => check_file(&file),
    }
}

fn read_source(path: &PathBuf) -> Result<String, ExitCode> {
    fs::read_to_string(path).map_err(|e| {
        eprintln!("{} could not read {}: {}", red("!!"), path.display(), e);
        ExitCode::FAILURE
    })
}

fn run_file(path: &PathBuf) -> ExitCode {
    let source = match read_source(path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let ast = match tea_core::parse_source(&source) {
        Ok(ast) => ast,
        Err(e) => {
            eprintln!("{} {}", red("!!"), e);
            return ExitCode::FAILURE;
        }
    };
    let mut ctx = tea_rt::Context::new();
    ctx.load(tea_rt::stdlib::standard_library());
    match tea_rt::eval(&ast, &mut ctx) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", red("!!"), e);
            ExitCode::FAILURE
        }
    }
}

fn check_file(path: &PathBuf) -> ExitCode {
    let source = match read_source(path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match tea_core::parse_source(&source) {
        Ok(_) => {
            println!("{} {}", bold(&cyan("ok")), path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {}", red("!!"), e);
            ExitCode::FAILURE
        }
    }
}
