//! Recursive-descent statement parser plus a shunting-yard expression parser.

use super::ast::{Literal, Node, Param};
use super::tokens::{Span, Token, TokenKind};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: {message}")]
    BadStatement { line: usize, message: String },
    #[error("line {line}: not implemented: {message}")]
    NotImplemented { line: usize, message: String },
    #[error("line {line}: invalid declaration: {message}")]
    InvalidDeclaration { line: usize, message: String },
    #[error("line {line}: invalid definition: {message}")]
    InvalidDefinition { line: usize, message: String },
    #[error("line {line}: invalid assignment: {message}")]
    InvalidAssignment { line: usize, message: String },
    #[error("line {line}: invalid block: {message}")]
    InvalidBlock { line: usize, message: String },
    #[error("line {line}: invalid expression: {message}")]
    InvalidExpression { line: usize, message: String },
    #[error("line {line}: invalid condition: {message}")]
    InvalidCondition { line: usize, message: String },
    #[error("line {line}: invalid loop: {message}")]
    InvalidLoop { line: usize, message: String },
    #[error("line {line}: missing operand")]
    MissingOperand { line: usize },
    #[error("line {line}: unknown operator '{symbol}'")]
    UnknownOperator { line: usize, symbol: String },
}

/// Parses a whitespace-filtered token stream into a top-level `Sequence`.
pub fn parse(tokens: Vec<Token>) -> Result<Node, ParseError> {
    let filtered: Vec<Token> = tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Whitespace)
        .collect();
    let mut parser = Parser {
        tokens: filtered,
        pos: 0,
    };
    let program = parser.parse_program()?;
    Ok(desugar_casts(program))
}

fn is_assign_op(s: &str) -> bool {
    matches!(s, "=" | "+=" | "-=" | "*=" | "/=" | "%=" | "^=")
}

/// Precedence, arity, and left-associativity for a binary or unary operator
/// symbol, per the operator table. Returns `None` for a symbol with no
/// defined form in the requested arity.
fn operator_props(symbol: &str, unary: bool) -> Option<(u8, u8, bool)> {
    if unary {
        match symbol {
            "+" | "-" | "!" => Some((7, 1, false)),
            _ => None,
        }
    } else {
        match symbol {
            "^" => Some((6, 2, false)),
            "*" | "/" => Some((5, 2, true)),
            "+" | "-" | ":" => Some((4, 2, true)),
            "%" => Some((3, 2, true)),
            "<" | ">" | "<=" | ">=" | "==" | "!=" => Some((2, 2, true)),
            "&&" | "||" | "^|" => Some((1, 2, true)),
            "=" | "+=" | "-=" | "*=" | "/=" | "%=" | "^=" => Some((0, 2, true)),
            _ => None,
        }
    }
}

fn decode_string(raw: &str) -> String {
    let inner = raw.strip_prefix('"').unwrap_or(raw);
    let inner = inner.strip_suffix('"').unwrap_or(inner);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// An item on the expression parser's operator stack: either a pending
/// operation awaiting its operands, or a paren marker delimiting a
/// grouping or a call's argument list.
#[derive(Debug, Clone)]
enum ExprTok {
    Paren,
    CallParen {
        name: String,
        mark: usize,
        span: Span,
    },
    Op {
        symbol: String,
        precedence: u8,
        arg_count: u8,
        left_associative: bool,
        span: Span,
    },
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(
        &mut self,
        kind: TokenKind,
        err: impl FnOnce(usize, String) -> ParseError,
    ) -> Result<Token, ParseError> {
        match self.advance() {
            Some(t) if t.kind == kind => Ok(t),
            Some(t) => Err(err(
                t.span.line,
                format!("expected {}, found {} {:?}", kind, t.kind, t.value),
            )),
            None => Err(err(0, format!("expected {}, found end of input", kind))),
        }
    }

    fn expect_operator(
        &mut self,
        symbol: &str,
        err: impl FnOnce(usize, String) -> ParseError,
    ) -> Result<Token, ParseError> {
        match self.advance() {
            Some(t) if t.kind == TokenKind::Operator && t.value == symbol => Ok(t),
            Some(t) => Err(err(
                t.span.line,
                format!("expected '{}', found {:?}", symbol, t.value),
            )),
            None => Err(err(0, format!("expected '{}', found end of input", symbol))),
        }
    }

    fn parse_program(&mut self) -> Result<Node, ParseError> {
        let span = self.peek().map(|t| t.span).unwrap_or(Span::new(1));
        let mut body = Vec::new();
        while self.peek().is_some() {
            body.push(self.parse_statement()?);
        }
        Ok(Node::Sequence {
            substitute: false,
            body,
            span,
        })
    }

    /// Parses `{ ... }`, consuming both braces. The body is a plain,
    /// non-substituting sequence: substitution (if any) is the
    /// responsibility of whatever construct owns this block (Conditional,
    /// Branch's else arm, or a function call).
    fn parse_block(&mut self) -> Result<Node, ParseError> {
        let open = self.expect(TokenKind::LeftBlock, |line, message| ParseError::InvalidBlock {
            line,
            message,
        })?;
        let mut body = Vec::new();
        while let Some(tok) = self.peek() {
            if tok.kind == TokenKind::RightBlock {
                break;
            }
            body.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RightBlock, |line, message| ParseError::InvalidBlock {
            line,
            message,
        })?;
        Ok(Node::Sequence {
            substitute: false,
            body,
            span: open.span,
        })
    }

    fn parse_statement(&mut self) -> Result<Node, ParseError> {
        let tok = match self.peek() {
            Some(t) => t.clone(),
            None => {
                return Err(ParseError::BadStatement {
                    line: 0,
                    message: "expected a statement, found end of input".into(),
                })
            }
        };
        tracing::trace!(line = tok.span.line, token = %tok.value, "statement boundary");
        match tok.kind {
            TokenKind::Identifier => match tok.value.as_str() {
                "func" => self.parse_definition(),
                "return" => self.parse_return(),
                "continue" => {
                    self.advance();
                    self.consume_optional_statement_end();
                    Ok(Node::Continue { span: tok.span })
                }
                "break" => {
                    self.advance();
                    self.consume_optional_statement_end();
                    Ok(Node::Break { span: tok.span })
                }
                "while" => self.parse_while(),
                "if" => self.parse_branch(),
                "for" => self.parse_for(),
                "var" => self.parse_var(),
                _ => {
                    if matches!(self.peek_at(1), Some(t) if t.kind == TokenKind::Operator && is_assign_op(&t.value))
                    {
                        self.parse_assignment()
                    } else {
                        self.parse_expression()
                    }
                }
            },
            TokenKind::LeftBlock => self.parse_block(),
            TokenKind::RightBlock => Err(ParseError::InvalidBlock {
                line: tok.span.line,
                message: "unexpected '}'".into(),
            }),
            _ => self.parse_expression(),
        }
    }

    fn consume_optional_statement_end(&mut self) {
        if matches!(self.peek(), Some(t) if t.kind == TokenKind::Statement) {
            self.advance();
        }
    }

    fn parse_return(&mut self) -> Result<Node, ParseError> {
        let tok = self.advance().expect("return");
        let span = tok.span;
        let at_end = matches!(
            self.peek(),
            None | Some(Token {
                kind: TokenKind::Statement | TokenKind::RightBlock,
                ..
            })
        );
        if at_end {
            self.consume_optional_statement_end();
            Ok(Node::Return { expr: None, span })
        } else {
            let expr = self.parse_expression()?;
            Ok(Node::Return {
                expr: Some(Box::new(expr)),
                span,
            })
        }
    }

    fn parse_while(&mut self) -> Result<Node, ParseError> {
        let tok = self.advance().expect("while");
        let span = tok.span;
        let predicate = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Node::Loop {
            predicate: Box::new(predicate),
            body: Box::new(body),
            span,
        })
    }

    fn parse_conditional(&mut self) -> Result<Node, ParseError> {
        let span = self.peek().map(|t| t.span).unwrap_or(Span::new(0));
        let predicate = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Node::Conditional {
            predicate: Box::new(predicate),
            body: Box::new(body),
            span,
        })
    }

    fn parse_branch(&mut self) -> Result<Node, ParseError> {
        let tok = self.advance().expect("if");
        let span = tok.span;
        let mut conditionals = vec![self.parse_conditional()?];
        let mut otherwise: Option<Box<Node>> = None;
        loop {
            let is_else = matches!(self.peek(), Some(t) if t.kind == TokenKind::Identifier && t.value == "else");
            if !is_else {
                break;
            }
            self.advance();
            let is_else_if = matches!(self.peek(), Some(t) if t.kind == TokenKind::Identifier && t.value == "if");
            if is_else_if {
                self.advance();
                conditionals.push(self.parse_conditional()?);
                continue;
            }
            otherwise = Some(Box::new(self.parse_block()?));
            break;
        }
        let otherwise = otherwise.unwrap_or_else(|| {
            Box::new(Node::Sequence {
                substitute: false,
                body: vec![],
                span,
            })
        });
        Ok(Node::Branch {
            conditionals,
            otherwise,
            span,
        })
    }

    /// `for` is not a distinct evaluator contract: it desugars here to
    /// `Sequence[init, Loop(cond, Sequence[body, iter])]` with the outer
    /// sequence substituting, so the loop variable's scope is the loop
    /// itself rather than the enclosing block.
    fn parse_for(&mut self) -> Result<Node, ParseError> {
        let tok = self.advance().expect("for");
        let span = tok.span;
        self.expect(TokenKind::LeftParen, |line, message| ParseError::InvalidLoop {
            line,
            message,
        })?;
        let init = self.parse_statement()?;
        let cond = self.parse_expression()?;
        let iter = self.parse_for_clause()?;
        self.expect(TokenKind::RightParen, |line, message| ParseError::InvalidLoop {
            line,
            message,
        })?;
        let body_block = self.parse_block()?;
        let mut inner_body = match body_block {
            Node::Sequence { body, .. } => body,
            other => vec![other],
        };
        inner_body.push(iter);
        let inner = Node::Sequence {
            substitute: false,
            body: inner_body,
            span,
        };
        let loop_node = Node::Loop {
            predicate: Box::new(cond),
            body: Box::new(inner),
            span,
        };
        Ok(Node::Sequence {
            substitute: true,
            body: vec![init, loop_node],
            span,
        })
    }

    /// The `iter` clause of a `for` header has no trailing `;` — it's
    /// terminated by the header's closing `)`, which `parse_expression`
    /// recognizes as foreign (not one it opened) and leaves unconsumed.
    fn parse_for_clause(&mut self) -> Result<Node, ParseError> {
        if matches!((self.peek(), self.peek_at(1)), (Some(a), Some(b)) if a.kind == TokenKind::Identifier && b.kind == TokenKind::Operator && is_assign_op(&b.value))
        {
            self.parse_assignment()
        } else {
            self.parse_expression()
        }
    }

    fn parse_var(&mut self) -> Result<Node, ParseError> {
        let tok = self.advance().expect("var");
        let span = tok.span;
        let mut names = Vec::new();
        loop {
            let name = self.expect(TokenKind::Identifier, |line, message| {
                ParseError::InvalidDeclaration { line, message }
            })?;
            names.push(name.value);
            if matches!(self.peek(), Some(t) if t.kind == TokenKind::Separator) {
                self.advance();
                continue;
            }
            break;
        }
        let type_name = if matches!(self.peek(), Some(t) if t.kind == TokenKind::Operator && t.value == ":")
        {
            self.advance();
            let t = self.expect(TokenKind::Identifier, |line, message| {
                ParseError::InvalidDeclaration { line, message }
            })?;
            Some(t.value)
        } else {
            None
        };
        let init = if matches!(self.peek(), Some(t) if t.kind == TokenKind::Operator && t.value == "=")
        {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            self.consume_optional_statement_end();
            None
        };
        let declared_type = type_name.clone().unwrap_or_else(|| "null".to_string());
        let mut stmts: Vec<Node> = names
            .iter()
            .map(|n| Node::Declaration {
                name: n.clone(),
                type_name: declared_type.clone(),
                span,
            })
            .collect();
        if let Some(expr) = init {
            let ignore_type = type_name.is_none();
            for name in &names {
                stmts.push(Node::Assignment {
                    name: name.clone(),
                    ignore_type,
                    expr: Box::new(expr.clone()),
                    span,
                });
            }
        }
        Ok(Node::Sequence {
            substitute: false,
            body: stmts,
            span,
        })
    }

    /// `name op= expr` rewrites to `name = name op expr`; a bare `name =
    /// expr` is its own degenerate case of the rewrite (no wrapping
    /// Operation). Reassignment always type-checks (`ignore_type = false`);
    /// only a `var` declaration's own initializer may set `ignore_type`.
    fn parse_assignment(&mut self) -> Result<Node, ParseError> {
        let name_tok = self.advance().expect("identifier");
        let op_tok = self.advance().expect("assignment operator");
        let span = name_tok.span;
        let rhs = self.parse_expression()?;
        let expr = if op_tok.value == "=" {
            rhs
        } else {
            let base = op_tok.value.trim_end_matches('=').to_string();
            let (precedence, arg_count, left_associative) =
                operator_props(&base, false).unwrap_or((4, 2, true));
            Node::Operation {
                symbol: base,
                precedence,
                arg_count,
                left_associative,
                operands: vec![
                    Node::Identifier {
                        name: name_tok.value.clone(),
                        span,
                    },
                    rhs,
                ],
                span,
            }
        };
        Ok(Node::Assignment {
            name: name_tok.value,
            ignore_type: false,
            expr: Box::new(expr),
            span,
        })
    }

    fn parse_definition(&mut self) -> Result<Node, ParseError> {
        let tok = self.advance().expect("func");
        let span = tok.span;
        let name = self.expect(TokenKind::Identifier, |line, message| {
            ParseError::InvalidDefinition { line, message }
        })?;
        self.expect(TokenKind::LeftParen, |line, message| ParseError::InvalidDefinition {
            line,
            message,
        })?;
        let mut parameters = Vec::new();
        if !matches!(self.peek(), Some(t) if t.kind == TokenKind::RightParen) {
            loop {
                let pname = self.expect(TokenKind::Identifier, |line, message| {
                    ParseError::InvalidDefinition { line, message }
                })?;
                self.expect_operator(":", |line, message| ParseError::InvalidDefinition {
                    line,
                    message,
                })?;
                let ptype = self.expect(TokenKind::Identifier, |line, message| {
                    ParseError::InvalidDefinition { line, message }
                })?;
                parameters.push(Param {
                    name: pname.value,
                    type_name: ptype.value,
                });
                if matches!(self.peek(), Some(t) if t.kind == TokenKind::Separator) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RightParen, |line, message| ParseError::InvalidDefinition {
            line,
            message,
        })?;
        let body = self.parse_block()?;
        Ok(Node::Definition {
            name: name.value,
            parameters,
            body: Box::new(body),
            span,
        })
    }

    fn reduce_top(
        &self,
        operands: &mut Vec<Node>,
        operators: &mut Vec<ExprTok>,
    ) -> Result<(), ParseError> {
        if let Some(ExprTok::Op {
            symbol,
            precedence,
            arg_count,
            left_associative,
            span,
        }) = operators.pop()
        {
            let n = arg_count as usize;
            if operands.len() < n {
                return Err(ParseError::MissingOperand { line: span.line });
            }
            let start = operands.len() - n;
            let args = operands.split_off(start);
            operands.push(Node::Operation {
                symbol,
                precedence,
                arg_count,
                left_associative,
                operands: args,
                span,
            });
        }
        Ok(())
    }

    fn close_paren(
        &self,
        operands: &mut Vec<Node>,
        operators: &mut Vec<ExprTok>,
        rparen: Span,
    ) -> Result<(), ParseError> {
        loop {
            match operators.last() {
                Some(ExprTok::Op { .. }) => self.reduce_top(operands, operators)?,
                Some(ExprTok::Paren) => {
                    operators.pop();
                    return Ok(());
                }
                Some(ExprTok::CallParen { .. }) => {
                    let (name, mark, span) = match operators.pop().unwrap() {
                        ExprTok::CallParen { name, mark, span } => (name, mark, span),
                        _ => unreachable!(),
                    };
                    if operands.len() < mark {
                        return Err(ParseError::InvalidExpression {
                            line: rparen.line,
                            message: "call argument mismatch".into(),
                        });
                    }
                    let arguments = operands.split_off(mark);
                    operands.push(Node::Call {
                        name,
                        arguments,
                        span,
                    });
                    return Ok(());
                }
                None => {
                    return Err(ParseError::InvalidExpression {
                        line: rparen.line,
                        message: "unmatched ')'".into(),
                    })
                }
            }
        }
    }

    fn flush_to_marker(
        &self,
        operands: &mut Vec<Node>,
        operators: &mut Vec<ExprTok>,
    ) -> Result<(), ParseError> {
        loop {
            match operators.last() {
                Some(ExprTok::Op { .. }) => self.reduce_top(operands, operators)?,
                _ => return Ok(()),
            }
        }
    }

    /// Shunting-yard expression parse. Stops (without consuming) at a
    /// `TokenKind::RightBlock`, at a `)` that does not belong to a marker
    /// this call pushed (foreign to an enclosing `for`/call header), or at
    /// end of input; consumes a trailing `;` if present.
    fn parse_expression(&mut self) -> Result<Node, ParseError> {
        let mut operands: Vec<Node> = Vec::new();
        let mut operators: Vec<ExprTok> = Vec::new();
        let mut prev_kind: Option<TokenKind> = None;

        loop {
            let tok = match self.peek() {
                Some(t) => t.clone(),
                None => break,
            };
            match tok.kind {
                TokenKind::Statement => {
                    self.advance();
                    break;
                }
                TokenKind::RightBlock => break,
                TokenKind::Number => {
                    self.advance();
                    let lit = if tok.value.contains('.') {
                        let v: f64 = tok.value.parse().map_err(|_| ParseError::InvalidExpression {
                            line: tok.span.line,
                            message: format!("bad float literal '{}'", tok.value),
                        })?;
                        Literal::Float(v)
                    } else {
                        let v: i64 = tok.value.parse().map_err(|_| ParseError::InvalidExpression {
                            line: tok.span.line,
                            message: format!("bad integer literal '{}'", tok.value),
                        })?;
                        Literal::Integer(v)
                    };
                    operands.push(Node::Literal {
                        value: lit,
                        span: tok.span,
                    });
                    prev_kind = Some(TokenKind::Number);
                }
                TokenKind::String => {
                    self.advance();
                    operands.push(Node::Literal {
                        value: Literal::Str(decode_string(&tok.value)),
                        span: tok.span,
                    });
                    prev_kind = Some(TokenKind::String);
                }
                TokenKind::Identifier => {
                    self.advance();
                    if matches!(self.peek(), Some(t) if t.kind == TokenKind::LeftParen) {
                        self.advance();
                        operators.push(ExprTok::CallParen {
                            name: tok.value.clone(),
                            mark: operands.len(),
                            span: tok.span,
                        });
                        prev_kind = Some(TokenKind::LeftParen);
                    } else {
                        let node = match tok.value.as_str() {
                            "true" => Node::Literal {
                                value: Literal::Bool(true),
                                span: tok.span,
                            },
                            "false" => Node::Literal {
                                value: Literal::Bool(false),
                                span: tok.span,
                            },
                            "null" => Node::Literal {
                                value: Literal::Null,
                                span: tok.span,
                            },
                            _ => Node::Identifier {
                                name: tok.value.clone(),
                                span: tok.span,
                            },
                        };
                        operands.push(node);
                        prev_kind = Some(TokenKind::Identifier);
                    }
                }
                TokenKind::LeftParen => {
                    self.advance();
                    operators.push(ExprTok::Paren);
                    prev_kind = Some(TokenKind::LeftParen);
                }
                TokenKind::RightParen => {
                    let has_marker = operators
                        .iter()
                        .any(|o| matches!(o, ExprTok::Paren | ExprTok::CallParen { .. }));
                    if !has_marker {
                        break;
                    }
                    self.advance();
                    self.close_paren(&mut operands, &mut operators, tok.span)?;
                    prev_kind = Some(TokenKind::RightParen);
                }
                TokenKind::Separator => {
                    let has_marker = operators
                        .iter()
                        .any(|o| matches!(o, ExprTok::Paren | ExprTok::CallParen { .. }));
                    if !has_marker {
                        break;
                    }
                    self.advance();
                    self.flush_to_marker(&mut operands, &mut operators)?;
                    prev_kind = Some(TokenKind::Separator);
                }
                TokenKind::Operator => {
                    self.advance();
                    let unary = matches!(
                        prev_kind,
                        None | Some(TokenKind::Operator)
                            | Some(TokenKind::Separator)
                            | Some(TokenKind::LeftParen)
                    );
                    let (precedence, arg_count, left_associative) =
                        operator_props(&tok.value, unary).ok_or_else(|| ParseError::UnknownOperator {
                            line: tok.span.line,
                            symbol: tok.value.clone(),
                        })?;
                    loop {
                        let should_pop = match operators.last() {
                            Some(ExprTok::Op {
                                precedence: top_prec,
                                ..
                            }) => {
                                if left_associative {
                                    *top_prec > precedence
                                } else {
                                    *top_prec >= precedence
                                }
                            }
                            _ => false,
                        };
                        if !should_pop {
                            break;
                        }
                        self.reduce_top(&mut operands, &mut operators)?;
                    }
                    operators.push(ExprTok::Op {
                        symbol: tok.value.clone(),
                        precedence,
                        arg_count,
                        left_associative,
                        span: tok.span,
                    });
                    prev_kind = Some(TokenKind::Operator);
                }
                _ => break,
            }
        }

        while let Some(top) = operators.last() {
            match top {
                ExprTok::Op { .. } => self.reduce_top(&mut operands, &mut operators)?,
                _ => {
                    let line = self.peek().map(|t| t.span.line).unwrap_or(0);
                    return Err(ParseError::InvalidExpression {
                        line,
                        message: "unmatched '('".into(),
                    });
                }
            }
        }

        if operands.len() != 1 {
            let line = self.peek().map(|t| t.span.line).unwrap_or(0);
            return Err(ParseError::MissingOperand { line });
        }
        Ok(operands.pop().unwrap())
    }
}

/// Post-pass: any binary `:` Operation whose right operand is an
/// Identifier is a type annotation, not arithmetic — the shunting-yard
/// parser cannot tell the two apart while building the tree, since `:` is
/// ordinary operator syntax to it.
fn desugar_casts(node: Node) -> Node {
    match node {
        Node::Sequence {
            substitute,
            body,
            span,
        } => Node::Sequence {
            substitute,
            body: body.into_iter().map(desugar_casts).collect(),
            span,
        },
        Node::Branch {
            conditionals,
            otherwise,
            span,
        } => Node::Branch {
            conditionals: conditionals.into_iter().map(desugar_casts).collect(),
            otherwise: Box::new(desugar_casts(*otherwise)),
            span,
        },
        Node::Conditional {
            predicate,
            body,
            span,
        } => Node::Conditional {
            predicate: Box::new(desugar_casts(*predicate)),
            body: Box::new(desugar_casts(*body)),
            span,
        },
        Node::Loop {
            predicate,
            body,
            span,
        } => Node::Loop {
            predicate: Box::new(desugar_casts(*predicate)),
            body: Box::new(desugar_casts(*body)),
            span,
        },
        Node::Operation {
            symbol,
            precedence,
            arg_count,
            left_associative,
            operands,
            span,
        } => {
            let mut operands: Vec<Node> = operands.into_iter().map(desugar_casts).collect();
            if symbol == ":" && operands.len() == 2 {
                if let Node::Identifier { name, .. } = &operands[1] {
                    let type_name = name.clone();
                    let expr = operands.remove(0);
                    return Node::Cast {
                        type_name,
                        expr: Box::new(expr),
                        span,
                    };
                }
            }
            Node::Operation {
                symbol,
                precedence,
                arg_count,
                left_associative,
                operands,
                span,
            }
        }
        Node::Call {
            name,
            arguments,
            span,
        } => Node::Call {
            name,
            arguments: arguments.into_iter().map(desugar_casts).collect(),
            span,
        },
        Node::Cast {
            type_name,
            expr,
            span,
        } => Node::Cast {
            type_name,
            expr: Box::new(desugar_casts(*expr)),
            span,
        },
        Node::Return { expr, span } => Node::Return {
            expr: expr.map(|e| Box::new(desugar_casts(*e))),
            span,
        },
        Node::Assignment {
            name,
            ignore_type,
            expr,
            span,
        } => Node::Assignment {
            name,
            ignore_type,
            expr: Box::new(desugar_casts(*expr)),
            span,
        },
        Node::Definition {
            name,
            parameters,
            body,
            span,
        } => Node::Definition {
            name,
            parameters,
            body: Box::new(desugar_casts(*body)),
            span,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::lex;

    fn parse_src(src: &str) -> Node {
        parse(lex(src).unwrap()).unwrap()
    }

    fn stmts(node: &Node) -> &[Node] {
        match node {
            Node::Sequence { body, .. } => body,
            _ => panic!("expected Sequence"),
        }
    }

    #[test]
    fn precedence_binds_multiplication_tighter() {
        let prog = parse_src("1 + 2 * 3;");
        let top = &stmts(&prog)[0];
        match top {
            Node::Operation { symbol, operands, .. } => {
                assert_eq!(symbol, "+");
                assert!(matches!(operands[1], Node::Operation { .. }));
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn parens_override_precedence() {
        let prog = parse_src("(1 + 2) * 3;");
        let top = &stmts(&prog)[0];
        match top {
            Node::Operation { symbol, operands, .. } => {
                assert_eq!(symbol, "*");
                assert!(matches!(operands[0], Node::Operation { .. }));
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn var_declaration_with_initializer_desugars() {
        let prog = parse_src("var x: int = 5;");
        let body = stmts(&prog);
        assert!(matches!(body[0], Node::Declaration { .. }));
        assert!(matches!(body[1], Node::Assignment { ignore_type: false, .. }));
    }

    #[test]
    fn multi_name_var_declaration_assigns_initializer_to_every_name() {
        let prog = parse_src("var a, b: int = 5;");
        let body = stmts(&prog);
        assert!(matches!(body[0], Node::Declaration { ref name, .. } if name == "a"));
        assert!(matches!(body[1], Node::Declaration { ref name, .. } if name == "b"));
        match &body[2] {
            Node::Assignment { name, ignore_type, .. } => {
                assert_eq!(name, "a");
                assert!(!ignore_type);
            }
            other => panic!("unexpected node {:?}", other),
        }
        match &body[3] {
            Node::Assignment { name, ignore_type, .. } => {
                assert_eq!(name, "b");
                assert!(!ignore_type);
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn var_without_type_is_ignore_type() {
        let prog = parse_src("var x = 5;");
        let body = stmts(&prog);
        match &body[1] {
            Node::Assignment { ignore_type, .. } => assert!(*ignore_type),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn compound_assignment_rewrites_to_binary_op() {
        let prog = parse_src("x += 1;");
        match &stmts(&prog)[0] {
            Node::Assignment { expr, .. } => match &**expr {
                Node::Operation { symbol, .. } => assert_eq!(symbol, "+"),
                other => panic!("unexpected expr {:?}", other),
            },
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn function_call_collects_arguments_in_order() {
        let prog = parse_src("add(2, 3);");
        match &stmts(&prog)[0] {
            Node::Call { name, arguments, .. } => {
                assert_eq!(name, "add");
                assert_eq!(arguments.len(), 2);
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn if_else_chain_produces_branch() {
        let prog = parse_src("if (true) { 1 } else if (false) { 2 } else { 3 }");
        match &stmts(&prog)[0] {
            Node::Branch { conditionals, .. } => assert_eq!(conditionals.len(), 2),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn cast_operator_desugars_to_cast_node() {
        let prog = parse_src("x: int;");
        match &stmts(&prog)[0] {
            Node::Cast { type_name, .. } => assert_eq!(type_name, "int"),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn for_loop_desugars_to_sequence_and_loop() {
        let prog = parse_src("for (var i: int = 0; i < 3; i = i + 1) { i }");
        match &stmts(&prog)[0] {
            Node::Sequence { substitute, body, .. } => {
                assert!(*substitute);
                assert_eq!(body.len(), 2);
                assert!(matches!(body[1], Node::Loop { .. }));
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn function_definition_parses_parameters() {
        let prog = parse_src("func add(a: int, b: int) { return a + b }");
        match &stmts(&prog)[0] {
            Node::Definition { name, parameters, .. } => {
                assert_eq!(name, "add");
                assert_eq!(parameters.len(), 2);
            }
            other => panic!("unexpected node {:?}", other),
        }
    }
}
