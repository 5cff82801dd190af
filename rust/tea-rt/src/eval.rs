//! The tree-walking evaluator (spec.md §4.5): one `eval` per AST node kind,
//! dispatching calls and operators by signature and threading the
//! control-flow `Behavior` flag through Sequence/Loop/Call boundaries.
//!
//! New code grounded directly on spec.md §4.5's per-variant contracts. The
//! "mutable behavior flag vs. sum-type result" choice from spec.md §9 is
//! resolved in favor of keeping the mutable `Context::behavior` field.

use std::rc::Rc;

use tea_core::{Literal, Node};

use crate::error::RuntimeError;
use crate::function::{self, Function, Parameter, Signature, SignatureBody};
use crate::namespace::{Behavior, Binding, Context};
use crate::value::{cast, DataType, Payload, Value};
use tracing::{debug, trace};

/// Evaluates `node` against `ctx`, mutating `ctx.current`/`ctx.behavior` as
/// the contracts in spec.md §4.5 require.
pub fn eval(node: &Node, ctx: &mut Context) -> Result<Value, RuntimeError> {
    match node {
        Node::Sequence { substitute, body, .. } => eval_sequence(*substitute, body, ctx),
        Node::Branch { conditionals, otherwise, .. } => eval_branch(conditionals, otherwise, ctx),
        Node::Conditional { predicate, body, .. } => {
            Ok(eval_conditional(predicate, body, ctx)?.unwrap_or_else(|| Value::bool(false)))
        }
        Node::Loop { predicate, body, .. } => eval_loop(predicate, body, ctx),
        Node::Operation { symbol, operands, span, .. } => {
            eval_operation(symbol, operands, span.line, ctx)
        }
        Node::Call { name, arguments, span } => eval_call(name, arguments, span.line, ctx),
        Node::Identifier { name, span } => eval_identifier(name, span.line, ctx),
        Node::Literal { value, .. } => Ok(eval_literal(value)),
        Node::Cast { type_name, expr, span } => eval_cast(type_name, expr, span.line, ctx),
        Node::Return { expr, .. } => eval_return(expr, ctx),
        Node::Break { .. } => {
            ctx.behavior = Behavior::Break;
            Ok(Value::null())
        }
        Node::Continue { .. } => {
            ctx.behavior = Behavior::Continue;
            Ok(Value::null())
        }
        Node::Declaration { name, type_name, span } => eval_declaration(name, type_name, span.line, ctx),
        Node::Assignment { name, ignore_type, expr, span } => {
            eval_assignment(name, *ignore_type, expr, span.line, ctx)
        }
        Node::Definition { name, parameters, body, span } => {
            eval_definition(name, parameters, body, span.line, ctx)
        }
    }
}

fn eval_sequence(substitute: bool, body: &[Node], ctx: &mut Context) -> Result<Value, RuntimeError> {
    if substitute {
        trace!("substituting namespace for sequence");
    }
    let previous = substitute.then(|| ctx.substitute());
    ctx.behavior = Behavior::Default;

    let mut last = Value::null();
    let mut failure = None;
    for statement in body {
        match eval(statement, ctx) {
            Ok(v) => {
                last = v;
                if ctx.behavior != Behavior::Default {
                    break;
                }
            }
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    if let Some(previous) = previous {
        ctx.restore(previous);
    }
    match failure {
        Some(e) => Err(e),
        None => Ok(last),
    }
}

/// Shared by `Branch` and `Loop`: evaluates the predicate, and if it is
/// `true` evaluates the body in a substituted namespace. Returns `None` for
/// the false sentinel (spec.md §9).
fn eval_conditional(predicate: &Node, body: &Node, ctx: &mut Context) -> Result<Option<Value>, RuntimeError> {
    let line = predicate.span().line;
    let predicate_value = eval(predicate, ctx)?;
    match predicate_value.as_bool() {
        Some(true) => {
            trace!(line, "substituting namespace for conditional body");
            let previous = ctx.substitute();
            let result = eval(body, ctx);
            ctx.restore(previous);
            result.map(Some)
        }
        Some(false) => Ok(None),
        None => Err(RuntimeError::RuntimeError { line, message: "Bad conditional".to_string() }),
    }
}

fn eval_branch(conditionals: &[Node], otherwise: &Node, ctx: &mut Context) -> Result<Value, RuntimeError> {
    for conditional in conditionals {
        if let Node::Conditional { predicate, body, .. } = conditional {
            if let Some(value) = eval_conditional(predicate, body, ctx)? {
                return Ok(value);
            }
        }
    }
    trace!("substituting namespace for otherwise branch");
    let previous = ctx.substitute();
    let result = eval(otherwise, ctx);
    ctx.restore(previous);
    result
}

fn eval_loop(predicate: &Node, body: &Node, ctx: &mut Context) -> Result<Value, RuntimeError> {
    loop {
        match eval_conditional(predicate, body, ctx)? {
            None => return Ok(Value::null()),
            Some(body_value) => match ctx.behavior {
                Behavior::Return => return Ok(body_value),
                Behavior::Break => {
                    ctx.behavior = Behavior::Default;
                    return Ok(Value::null());
                }
                _ => {
                    ctx.behavior = Behavior::Default;
                }
            },
        }
    }
}

fn eval_operation(symbol: &str, operands: &[Node], line: usize, ctx: &mut Context) -> Result<Value, RuntimeError> {
    debug!(symbol, line, "dispatching operator");
    let operator = ctx.find_op(symbol, line)?;
    let mut args = Vec::with_capacity(operands.len());
    for operand in operands {
        args.push(eval(operand, ctx)?);
    }
    function::call_operator(&operator, &args, ctx, line)
}

fn eval_call(name: &str, arguments: &[Node], line: usize, ctx: &mut Context) -> Result<Value, RuntimeError> {
    debug!(name, line, "dispatching call");
    let binding = ctx.find_id(name, line)?;
    let callee = match binding {
        Binding::Function(f) => f,
        Binding::Value(_) => {
            return Err(RuntimeError::FunctionError { line, message: format!("'{name}' is not callable") })
        }
    };
    let mut args = Vec::with_capacity(arguments.len());
    for argument in arguments {
        args.push(eval(argument, ctx)?);
    }
    let result = function::call_function(&callee, &args, ctx, line);
    // A RETURN inside the callee must not leak (spec.md §4.5.Call).
    ctx.behavior = Behavior::Default;
    result
}

fn eval_identifier(name: &str, line: usize, ctx: &mut Context) -> Result<Value, RuntimeError> {
    match ctx.find_id(name, line)? {
        Binding::Value(v) => Ok(v),
        Binding::Function(f) => Ok(Value::new(DataType::Function, Payload::Function(Some(f))).named(name)),
    }
}

fn eval_literal(literal: &Literal) -> Value {
    match literal {
        Literal::Integer(n) => Value::int(*n),
        Literal::Float(f) => Value::float(*f),
        Literal::Str(s) => Value::string(s.clone()),
        Literal::Bool(b) => Value::bool(*b),
        Literal::Null => Value::null(),
    }
}

fn eval_cast(type_name: &str, expr: &Node, line: usize, ctx: &mut Context) -> Result<Value, RuntimeError> {
    let ty = ctx.find_ty(type_name, line)?;
    let value = eval(expr, ctx)?;
    cast(&value, ty).map_err(|cause| RuntimeError::CastError { line, cause })
}

fn eval_return(expr: &Option<Box<Node>>, ctx: &mut Context) -> Result<Value, RuntimeError> {
    let value = match expr {
        Some(e) => eval(e, ctx)?,
        None => Value::null(),
    };
    ctx.behavior = Behavior::Return;
    Ok(value)
}

fn eval_declaration(name: &str, type_name: &str, line: usize, ctx: &mut Context) -> Result<Value, RuntimeError> {
    if ctx.has_local_id(name) {
        return Err(RuntimeError::NamespaceError {
            line,
            message: format!("'{name}' already declared in this scope"),
        });
    }
    let ty = ctx.find_ty(type_name, line)?;
    let initial = cast(&Value::null(), ty)
        .map_err(|cause| RuntimeError::CastError { line, cause })?
        .named(name);
    ctx.store_value(initial.clone());
    Ok(initial)
}

fn eval_assignment(
    name: &str,
    ignore_type: bool,
    expr: &Node,
    line: usize,
    ctx: &mut Context,
) -> Result<Value, RuntimeError> {
    let rhs = eval(expr, ctx)?;
    let owner = crate::namespace::find_owning(&ctx.current, name)
        .ok_or_else(|| RuntimeError::NamespaceError { line, message: format!("'{name}' not found") })?;

    let existing_ty = {
        let owner_ref = owner.borrow();
        match owner_ref.id_get(name) {
            Some(Binding::Value(v)) => v.ty,
            Some(Binding::Function(_)) => {
                return Err(RuntimeError::AssignmentError {
                    line,
                    message: format!("'{name}' is a function, not assignable"),
                })
            }
            None => unreachable!("find_owning guarantees a local id entry"),
        }
    };

    let updated = if ignore_type {
        rhs.clone().named(name)
    } else if rhs.ty != existing_ty {
        return Err(RuntimeError::AssignmentError {
            line,
            message: format!("cannot assign {} to '{name}' of type {}", rhs.ty.name(), existing_ty.name()),
        });
    } else {
        let mut v = rhs.clone();
        v.ty = existing_ty;
        v.named(name)
    };

    owner.borrow_mut().id_insert(name.to_string(), Binding::Value(updated));
    Ok(rhs)
}

fn eval_definition(
    name: &str,
    parameters: &[tea_core::Param],
    body: &Node,
    line: usize,
    ctx: &mut Context,
) -> Result<Value, RuntimeError> {
    if ctx.find_id(name, line).is_ok() {
        return Err(RuntimeError::NamespaceError { line, message: format!("'{name}' already defined") });
    }

    let mut params = Vec::with_capacity(parameters.len());
    for param in parameters {
        let ty = ctx.find_ty(&param.type_name, line)?;
        params.push(Parameter { name: param.name.clone(), ty, default: None });
    }

    let function = Rc::new(Function {
        name: name.to_string(),
        signatures: vec![Signature { parameters: params, body: SignatureBody::Ast(Rc::new(body.clone())) }],
        closure: ctx.current.clone(),
    });
    ctx.store_function(Rc::clone(&function));
    Ok(Value::new(DataType::Function, Payload::Function(Some(function))).named(name))
}
