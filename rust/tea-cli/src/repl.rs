//! Interactive REPL for Tea (spec.md §6's shell surface).
//!
//! Grounded on `examples/alliecatowo-lumen/rust/lumen-cli/src/repl.rs`'s
//! `rustyline::Editor` + `Helper` + history-file shape: same editor
//! construction and tab-completion seam, replumbed to Tea's `>> `/`   `
//! prompts and `!exec`/`!debug`/`!exit` commands instead of Lumen's
//! `:`-prefixed command set and block-keyword continuation rule.

use std::fs;
use std::path::PathBuf;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context as RlContext, Editor, Helper};
use tracing_subscriber::EnvFilter;

use tea_core::{lex, parse, TokenKind};
use tea_rt::{Context, Payload};

use crate::colors::{bold, cyan, gray, green, red};

const KEYWORDS: &[&str] = &[
    "var", "func", "if", "else", "while", "for", "return", "break", "continue", "true", "false", "null",
];

const TYPE_NAMES: &[&str] = &["int", "float", "bool", "string", "list", "set", "map", "object", "func"];

const BUILTINS: &[&str] = &["print", "len", "type", "str", "int", "float", "bool"];

/// Tab completer for identifiers and keywords. Like the teacher's
/// `LumenCompleter`, only `Completer` carries real logic — the rest of
/// `Helper`'s traits are satisfied with blank impls.
struct TeaCompleter;

impl Completer for TeaCompleter {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &RlContext<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace() || c == '(' || c == ',')
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = &line[start..pos];
        if word.is_empty() {
            return Ok((start, Vec::new()));
        }
        let mut candidates = Vec::new();
        for &word_candidate in KEYWORDS.iter().chain(TYPE_NAMES).chain(BUILTINS) {
            if word_candidate.starts_with(word) {
                candidates.push(Pair {
                    display: word_candidate.to_string(),
                    replacement: word_candidate.to_string(),
                });
            }
        }
        Ok((start, candidates))
    }
}

impl Hinter for TeaCompleter {
    type Hint = String;
}

impl Highlighter for TeaCompleter {}
impl Validator for TeaCompleter {}
impl Helper for TeaCompleter {}

fn history_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    let mut path = PathBuf::from(home);
    path.push(".tea");
    path.push("repl_history");
    Some(path)
}

/// True while `buffer`'s unclosed `(`/`{` outnumber their closers — the REPL
/// keeps reading continuation lines rather than submit a partial statement
/// (a dangling `func add(a: int, b: int) {`) to the parser. Counts real
/// tokens rather than raw characters so a `{` inside a string literal is not
/// mistaken for a block opener.
fn needs_more_input(buffer: &str) -> bool {
    let tokens = lex(buffer).unwrap_or_else(|e| match e {});
    let mut depth = 0i32;
    for tok in tokens {
        match tok.kind {
            TokenKind::LeftParen | TokenKind::LeftBlock => depth += 1,
            TokenKind::RightParen | TokenKind::RightBlock => depth -= 1,
            _ => {}
        }
    }
    depth > 0
}

/// Lexes, parses, and evaluates one submitted chunk against the session's
/// shared `Context`, printing the `<- ` result or `!! ` error per spec.md §6.
fn eval_chunk(source: &str, ctx: &mut Context) {
    let tokens = lex(source).unwrap_or_else(|e| match e {});
    let ast = match parse(tokens) {
        Ok(ast) => ast,
        Err(e) => {
            println!("{} {}", red("!!"), e);
            return;
        }
    };
    match tea_rt::eval(&ast, ctx) {
        Ok(value) => {
            if !matches!(value.payload, Payload::Null) {
                println!("{} {}", green("<-"), tea_rt::format(&value));
            }
        }
        Err(e) => println!("{} {}", red("!!"), e),
    }
}

/// `!exec <file>`: loads and evaluates a file in the current session's
/// context, so definitions it makes are visible afterward at the prompt.
fn exec_file(path: &str, ctx: &mut Context) {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            println!("{} could not read {}: {}", red("!!"), path, e);
            return;
        }
    };
    eval_chunk(&source, ctx);
}

fn toggle_debug(debug: &mut bool) {
    *debug = !*debug;
    let filter = if *debug { "tea=trace" } else { "tea=warn" };
    let _ = tracing_subscriber::fmt().with_env_filter(EnvFilter::new(filter)).try_init();
    println!("{} debug tracing {}", gray("!!"), if *debug { "on" } else { "off" });
}

/// Runs the interactive prompt: `>> ` / `   ` prompts, `<- ` result prefix,
/// `!! ` error prefix, `!exit`/`!debug`/`!exec <file>` meta-commands. One
/// `Context` lives for the whole session (spec.md §3's Context lifecycle),
/// so declarations and function definitions persist across submitted lines.
pub fn run(initial_debug: bool) {
    println!("{}", bold(&cyan("Tea")));
    println!("{}\n", gray("!exit to quit, !debug to toggle tracing, !exec <file> to load a file."));

    let config = rustyline::Config::builder().auto_add_history(true).build();
    let mut rl: Editor<TeaCompleter, rustyline::history::DefaultHistory> =
        Editor::with_config(config).expect("failed to create line editor");
    rl.set_helper(Some(TeaCompleter));

    let history_path = history_path();
    if let Some(ref path) = history_path {
        if path.exists() {
            let _ = rl.load_history(path);
        }
    }

    let mut ctx = Context::new();
    ctx.load(tea_rt::stdlib::standard_library());
    let mut debug = initial_debug;
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() {
            format!("{} ", green(">>"))
        } else {
            "   ".to_string()
        };

        match rl.readline(&prompt) {
            Ok(line) => {
                if buffer.is_empty() {
                    let trimmed = line.trim();
                    if trimmed == "!exit" {
                        break;
                    }
                    if trimmed == "!debug" {
                        toggle_debug(&mut debug);
                        continue;
                    }
                    if let Some(path) = trimmed.strip_prefix("!exec ") {
                        exec_file(path.trim(), &mut ctx);
                        continue;
                    }
                    if trimmed.is_empty() {
                        continue;
                    }
                }

                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);

                if needs_more_input(&buffer) {
                    continue;
                }

                let input = std::mem::take(&mut buffer);
                eval_chunk(&input, &mut ctx);
            }
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
                println!("{}", gray("(^C — !exit to quit)"));
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{} {:?}", red("!!"), err);
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = rl.save_history(path);
    }
    println!("\n{}", cyan("bye"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_more_input_tracks_unclosed_blocks_and_calls() {
        assert!(needs_more_input("func add(a: int, b: int) {"));
        assert!(needs_more_input("print("));
        assert!(!needs_more_input("1 + 1;"));
        assert!(!needs_more_input("func add(a: int, b: int) { return a + b }"));
    }

    #[test]
    fn needs_more_input_ignores_braces_inside_strings() {
        assert!(!needs_more_input("print(\"{\");"));
    }
}
