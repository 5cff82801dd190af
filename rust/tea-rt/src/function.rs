//! Signature matching and Function/Operator overload dispatch
//! (spec.md §3, §4.5 "Function invocation protocol").
//!
//! Grounded on `parcadei-ouros/crates/ouros/src/signature.rs`'s positional
//! argument-binding algorithm, simplified from Python's full
//! `pos_args`/`*args`/`kwargs` machinery down to spec.md §3's flat
//! ordered-parameter-list-with-trailing-defaults model. `Operator`'s
//! function list and first-match-wins dispatch (invariant 7) is the same
//! pattern keyed by symbol instead of name.

use std::fmt;
use std::rc::Rc;

use tea_core::Node;

use crate::error::RuntimeError;
use crate::namespace::{self, Context, NamespaceRef};
use crate::value::{cast, DataType, Value};
use tracing::trace;

/// One parameter in a Signature: its name, declared type, and optional
/// default payload (spec.md §3).
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub ty: DataType,
    pub default: Option<Value>,
}

pub type NativeFn = Rc<dyn Fn(&mut Context, &[Value]) -> Result<Value, RuntimeError>>;

#[derive(Clone)]
pub enum SignatureBody {
    /// A user-defined function body: the Tea AST sequence from a
    /// Definition's child[0].
    Ast(Rc<Node>),
    /// A standard-library binding whose body is a Rust closure rather than
    /// an AST node (spec.md §4.5 "Bindings").
    Native(NativeFn),
}

impl fmt::Debug for SignatureBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureBody::Ast(_) => write!(f, "SignatureBody::Ast(..)"),
            SignatureBody::Native(_) => write!(f, "SignatureBody::Native(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Signature {
    pub parameters: Vec<Parameter>,
    pub body: SignatureBody,
}

/// A name plus an ordered list of Signatures plus the namespace this
/// function was defined in (its lexical closure root).
#[derive(Clone)]
pub struct Function {
    pub name: String,
    pub signatures: Vec<Signature>,
    pub closure: NamespaceRef,
}

impl fmt::Debug for Function {
    // A native binding's closure is the root namespace, which in turn holds
    // that same binding in its `op`/`id` maps — deriving Debug here would
    // walk that cycle forever. Print the name and arity only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("signatures", &self.signatures.len())
            .finish()
    }
}

/// A symbol plus an ordered list of Functions; new overloads append to the
/// end (spec.md §3).
#[derive(Debug, Clone)]
pub struct Operator {
    pub symbol: String,
    pub functions: Vec<Rc<Function>>,
}

impl Operator {
    pub fn new(symbol: impl Into<String>) -> Self {
        Operator { symbol: symbol.into(), functions: Vec::new() }
    }

    pub fn with(mut self, function: Rc<Function>) -> Self {
        self.functions.push(function);
        self
    }
}

/// Binds `args` against `signature`'s parameter list: per-parameter `kind_of`
/// check + cast + rename, defaults for missing trailing parameters. Returns
/// `ArgumentError`/`ArgumentCastError` on any mismatch — the caller treats
/// those two (and only those two) as "try the next signature" (spec.md §7).
fn bind_arguments(signature: &Signature, args: &[Value], line: usize) -> Result<Vec<Value>, RuntimeError> {
    let n = signature.parameters.len();
    let m = args.len();
    if m > n {
        return Err(RuntimeError::ArgumentError {
            line,
            message: format!("too many arguments: expected at most {n}, got {m}"),
        });
    }

    let mut bound = Vec::with_capacity(n);
    for (i, param) in signature.parameters.iter().enumerate() {
        let raw = if i < m {
            args[i].clone()
        } else {
            match &param.default {
                Some(default) => default.clone(),
                None => {
                    return Err(RuntimeError::ArgumentError {
                        line,
                        message: format!("missing argument '{}'", param.name),
                    })
                }
            }
        };

        if !raw.ty.kind_of(param.ty) {
            return Err(RuntimeError::ArgumentError {
                line,
                message: format!(
                    "argument '{}' expects {}, got {}",
                    param.name,
                    param.ty.name(),
                    raw.ty.name()
                ),
            });
        }

        let mut casted = cast(&raw, param.ty).map_err(|cause| RuntimeError::ArgumentCastError {
            line,
            message: cause.to_string(),
        })?;
        casted.name = Some(param.name.clone());
        bound.push(casted);
    }
    Ok(bound)
}

fn invoke_signature(
    signature: &Signature,
    bound: Vec<Value>,
    closure: &NamespaceRef,
    ctx: &mut Context,
) -> Result<Value, RuntimeError> {
    match &signature.body {
        SignatureBody::Native(native) => native(ctx, &bound),
        SignatureBody::Ast(body) => {
            let previous = ctx.current.clone();
            ctx.current = namespace::Namespace::child(closure);
            for param in bound {
                ctx.store_value(param);
            }
            let result = crate::eval::eval(body, ctx);
            ctx.current = previous;
            result
        }
    }
}

/// Step 1-3 of the function invocation protocol: try each signature in
/// order, invoking the first whose arguments bind successfully. Step 4
/// (`FunctionError` on total failure) happens here, one level below
/// `call_operator`'s own first-match-wins loop over Functions.
pub fn call_function(
    function: &Rc<Function>,
    args: &[Value],
    ctx: &mut Context,
    line: usize,
) -> Result<Value, RuntimeError> {
    for (i, signature) in function.signatures.iter().enumerate() {
        trace!(name = %function.name, signature = i, "trying signature");
        match bind_arguments(signature, args, line) {
            Ok(bound) => return invoke_signature(signature, bound, &function.closure, ctx),
            Err(RuntimeError::ArgumentError { .. }) | Err(RuntimeError::ArgumentCastError { .. }) => {
                continue
            }
            Err(other) => return Err(other),
        }
    }
    Err(RuntimeError::FunctionError { line, message: "No signature found".to_string() })
}

/// The same protocol applied to an Operator's function list: tries each
/// Function in order, the first whose dispatch succeeds wins
/// (invariant 7). A `FunctionError` from one candidate just means "this
/// overload didn't accept these arguments" and moves on to the next; any
/// other error raised once a signature has matched propagates immediately.
pub fn call_operator(
    operator: &Operator,
    args: &[Value],
    ctx: &mut Context,
    line: usize,
) -> Result<Value, RuntimeError> {
    for (i, function) in operator.functions.iter().enumerate() {
        trace!(symbol = %operator.symbol, overload = i, "trying overload");
        match call_function(function, args, ctx, line) {
            Ok(v) => return Ok(v),
            Err(RuntimeError::FunctionError { .. }) => continue,
            Err(other) => return Err(other),
        }
    }
    Err(RuntimeError::OperatorError {
        line,
        message: format!("no overload of '{}' matched", operator.symbol),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Namespace;

    fn native_add() -> Rc<Function> {
        Rc::new(Function {
            name: "+".to_string(),
            signatures: vec![Signature {
                parameters: vec![
                    Parameter { name: "a".into(), ty: DataType::Integer, default: None },
                    Parameter { name: "b".into(), ty: DataType::Integer, default: None },
                ],
                body: SignatureBody::Native(Rc::new(|_ctx, args| {
                    Ok(Value::int(args[0].as_int().unwrap() + args[1].as_int().unwrap()))
                })),
            }],
            closure: Namespace::root(),
        })
    }

    #[test]
    fn matching_signature_dispatches() {
        let mut ctx = Context::new();
        let f = native_add();
        let result = call_function(&f, &[Value::int(2), Value::int(3)], &mut ctx, 1).unwrap();
        assert_eq!(result.as_int(), Some(5));
    }

    #[test]
    fn arity_mismatch_yields_function_error() {
        let mut ctx = Context::new();
        let f = native_add();
        let err = call_function(&f, &[Value::int(2)], &mut ctx, 1).unwrap_err();
        assert!(matches!(err, RuntimeError::FunctionError { .. }));
    }

    #[test]
    fn operator_tries_next_function_on_mismatch() {
        let mut ctx = Context::new();
        let string_concat = Rc::new(Function {
            name: "+".to_string(),
            signatures: vec![Signature {
                parameters: vec![
                    Parameter { name: "a".into(), ty: DataType::String, default: None },
                    Parameter { name: "b".into(), ty: DataType::Any, default: None },
                ],
                body: SignatureBody::Native(Rc::new(|_ctx, args| {
                    let cast_b = cast(&args[1], DataType::String).unwrap();
                    Ok(Value::string(format!(
                        "{}{}",
                        args[0].as_str().unwrap(),
                        cast_b.as_str().unwrap()
                    )))
                })),
            }],
            closure: Namespace::root(),
        });
        let op = Operator::new("+").with(native_add()).with(string_concat);
        let result = call_operator(&op, &[Value::string("a"), Value::int(1)], &mut ctx, 1).unwrap();
        assert_eq!(result.as_str(), Some("a1"));
    }
}
