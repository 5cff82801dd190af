//! Tea's front end: lexer, tokens, AST, and parser.
//!
//! This crate is pure `source text -> AST`: no I/O, no evaluation. `tea-rt`
//! walks the tree this crate produces.

pub mod compiler;

pub use compiler::ast::{Literal, Node, Param};
pub use compiler::lexer::{lex, LexError};
pub use compiler::parser::{parse, ParseError};
pub use compiler::tokens::{Span, Token, TokenKind};

/// Convenience wrapper: lex then parse in one call.
pub fn parse_source(source: &str) -> Result<Node, ParseError> {
    let tokens = lex(source).unwrap_or_else(|e| match e {});
    parse(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_small_program() {
        let ast = parse_source("var x: int = 5; x = x + 1; x").unwrap();
        match ast {
            Node::Sequence { body, .. } => assert_eq!(body.len(), 3),
            other => panic!("unexpected node {:?}", other),
        }
    }
}
