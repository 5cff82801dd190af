//! Tea CLI library: ANSI color helpers and the interactive REPL.
//!
//! `tea-cli` is the thin shell around the `tea-core`/`tea-rt` contracts
//! (spec.md §1's "out of scope" boundary): it owns the prompt, file loading,
//! meta-commands, and result formatting, and nothing else.

pub mod colors;
pub mod repl;
