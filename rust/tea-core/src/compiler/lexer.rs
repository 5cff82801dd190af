use super::tokens::{Span, Token, TokenKind};

/// Reserved for future use. In this design the lexer accepts any input: an
/// unrecognized singleton character is emitted as a [`TokenKind::None`]
/// token rather than rejected here, and it is the parser that eventually
/// reports a problem with it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LexError {}

const OPERATOR_SYMBOLS: &[&str] = &[
    "=", "+", "-", "*", "/", ":", "<", ">", "!", "%", "+=", "-=", "*=", "/=", "%=", "^=", "==",
    "!=", "<=", ">=", "&&", "||", "^|", "^",
];

fn is_ident_start(c: char) -> bool {
    c == '#' || c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c == '#' || c.is_ascii_alphanumeric() || c == '_'
}

fn ident_matches(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => chars.all(is_ident_continue),
        _ => false,
    }
}

fn number_matches(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    let (int_part, frac_part) = match s.split_once('.') {
        Some((a, b)) => (a, Some(b)),
        None => (s, None),
    };
    if int_part.is_empty() || !int_part.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    match frac_part {
        Some(b) => b.chars().all(|c| c.is_ascii_digit()),
        None => true,
    }
}

fn string_matches(s: &str) -> bool {
    let mut chars = s.chars();
    if chars.next() != Some('"') {
        return false;
    }
    let body: Vec<char> = chars.collect();
    if body.is_empty() {
        return true;
    }
    let (mid, _closed) = if *body.last().unwrap() == '"' {
        (&body[..body.len() - 1], true)
    } else {
        (&body[..], false)
    };
    mid.iter().all(|&c| c != '\n' && c != '\r' && c != '"')
}

/// Classifies a single fresh character into the token kind it starts. Order
/// matters: it mirrors the ordered kind list in the lexer's algorithm, so a
/// character valid in more than one kind (e.g. `-`, which starts both an
/// operator and, per the number grammar, a negative literal) always
/// resolves the same way.
fn classify(c: char) -> TokenKind {
    if c.is_whitespace() {
        TokenKind::Whitespace
    } else if OPERATOR_SYMBOLS.contains(&c.to_string().as_str()) {
        TokenKind::Operator
    } else if is_ident_start(c) {
        TokenKind::Identifier
    } else if c.is_ascii_digit() {
        TokenKind::Number
    } else if c == '"' {
        TokenKind::String
    } else if c == '(' {
        TokenKind::LeftParen
    } else if c == ')' {
        TokenKind::RightParen
    } else if c == '{' {
        TokenKind::LeftBlock
    } else if c == '}' {
        TokenKind::RightBlock
    } else if c == ';' {
        TokenKind::Statement
    } else if c == ',' {
        TokenKind::Separator
    } else {
        TokenKind::None
    }
}

/// Tests whether `candidate` (the current token's value with one more
/// character appended) still matches `kind`'s grammar. Bracket/punctuation
/// kinds are single characters and never extend.
fn extends(kind: TokenKind, candidate: &str) -> bool {
    match kind {
        TokenKind::Whitespace => candidate.chars().all(char::is_whitespace),
        TokenKind::Operator => OPERATOR_SYMBOLS.contains(&candidate),
        TokenKind::Identifier => ident_matches(candidate),
        TokenKind::Number => number_matches(candidate),
        TokenKind::String => string_matches(candidate),
        TokenKind::LeftParen
        | TokenKind::RightParen
        | TokenKind::LeftBlock
        | TokenKind::RightBlock
        | TokenKind::Statement
        | TokenKind::Separator
        | TokenKind::None => false,
    }
}

/// Greedy longest-match scan of `source` into an ordered token stream. The
/// concatenation of every returned token's value reproduces `source`
/// exactly, whitespace included; callers that only care about syntax should
/// filter `TokenKind::Whitespace` out themselves.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut current: Option<(TokenKind, String, usize)> = None;
    let mut line = 1usize;

    for c in source.chars() {
        if let Some((kind, value, start_line)) = current.take() {
            let mut candidate = value.clone();
            candidate.push(c);
            if extends(kind, &candidate) {
                current = Some((kind, candidate, start_line));
                if c == '\n' {
                    line += 1;
                }
                continue;
            }
            tokens.push(Token::new(kind, value, Span::new(start_line)));
        }
        let kind = classify(c);
        current = Some((kind, c.to_string(), line));
        if c == '\n' {
            line += 1;
        }
    }
    if let Some((kind, value, start_line)) = current {
        tokens.push(Token::new(kind, value, Span::new(start_line)));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(source: &str) -> Vec<String> {
        lex(source).unwrap().into_iter().map(|t| t.value).collect()
    }

    #[test]
    fn concatenation_round_trips() {
        let source = "var x: int = 5;\nx = x + 1;\n";
        let tokens = lex(source).unwrap();
        let rebuilt: String = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn splits_keywords_and_punctuation() {
        assert_eq!(
            values("var x = 1;"),
            vec!["var", " ", "x", " ", "=", " ", "1", ";"]
        );
    }

    #[test]
    fn greedy_match_prefers_longest_operator() {
        assert_eq!(values("a += 1"), vec!["a", " ", "+=", " ", "1"]);
        assert_eq!(values("a+1"), vec!["a", "+", "1"]);
    }

    #[test]
    fn compound_operators_are_single_tokens() {
        for op in ["==", "!=", "<=", ">=", "&&", "||", "^|"] {
            let toks = lex(op).unwrap();
            assert_eq!(toks.len(), 1);
            assert_eq!(toks[0].kind, TokenKind::Operator);
        }
    }

    #[test]
    fn strings_do_not_cross_quotes() {
        let toks = lex("\"ab\"\"cd\"").unwrap();
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[0].value, "\"ab\"");
        assert_eq!(toks[1].value, "\"cd\"");
    }

    #[test]
    fn numbers_parse_integers_and_floats() {
        assert_eq!(values("3.14"), vec!["3.14"]);
        assert_eq!(values("42"), vec!["42"]);
    }

    #[test]
    fn identifiers_allow_hash_and_underscore() {
        assert_eq!(values("#tag _x2"), vec!["#tag", " ", "_x2"]);
    }

    #[test]
    fn unrecognized_characters_become_none_tokens() {
        let toks = lex("@").unwrap();
        assert_eq!(toks[0].kind, TokenKind::None);
    }
}
