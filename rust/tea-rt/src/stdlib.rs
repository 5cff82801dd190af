//! Standard library bindings (spec.md §6, expanded by SPEC_FULL.md §4.9).
//!
//! Grounded on `scostello-monty/crates/monty/src/builtins/*.rs`: one native
//! `Function` per builtin, installed into a namespace at startup via
//! `Context::load`. Tea's operators are native the same way — arithmetic
//! and comparisons never need an AST body.

use std::rc::Rc;

use crate::error::RuntimeError;
use crate::function::{Function, NativeFn, Parameter, Signature, SignatureBody};
use crate::namespace::{LibraryItem, Namespace};
use crate::value::{cast, DataType, Payload, Value, ALL_TYPES};

fn native(
    name: &str,
    params: Vec<(&str, DataType)>,
    body: NativeFn,
) -> Rc<Function> {
    Rc::new(Function {
        name: name.to_string(),
        signatures: vec![Signature {
            parameters: params
                .into_iter()
                .map(|(n, ty)| Parameter { name: n.to_string(), ty, default: None })
                .collect(),
            body: SignatureBody::Native(body),
        }],
        closure: Namespace::root(),
    })
}

fn as_f64(v: &Value) -> f64 {
    v.as_int().map(|n| n as f64).or(v.as_float()).unwrap_or(0.0)
}

fn arithmetic_operator(
    symbol: &str,
    int_op: fn(i64, i64) -> Result<i64, String>,
    float_op: fn(f64, f64) -> Result<f64, String>,
) -> crate::function::Operator {
    let int_fn = native(symbol, vec![("a", DataType::Integer), ("b", DataType::Integer)], {
        let op = int_op;
        Rc::new(move |_ctx, args| {
            let a = args[0].as_int().unwrap();
            let b = args[1].as_int().unwrap();
            op(a, b).map(Value::int).map_err(|message| RuntimeError::RuntimeError { line: 0, message })
        })
    });
    let float_fn = native(symbol, vec![("a", DataType::Float), ("b", DataType::Float)], {
        let op = float_op;
        Rc::new(move |_ctx, args| {
            let a = args[0].as_float().unwrap();
            let b = args[1].as_float().unwrap();
            op(a, b).map(Value::float).map_err(|message| RuntimeError::RuntimeError { line: 0, message })
        })
    });
    crate::function::Operator::new(symbol).with(int_fn).with(float_fn)
}

fn comparison_operator(symbol: &str, op: fn(f64, f64) -> bool) -> LibraryItem {
    let f = native(symbol, vec![("a", DataType::Number), ("b", DataType::Number)], {
        Rc::new(move |_ctx, args| Ok(Value::bool(op(as_f64(&args[0]), as_f64(&args[1])))))
    });
    LibraryItem::Operator(crate::function::Operator::new(symbol).with(f))
}

fn equality_operator(symbol: &str, expect_equal: bool) -> LibraryItem {
    let f = native(symbol, vec![("a", DataType::Any), ("b", DataType::Any)], Rc::new(move |_ctx, args| {
        let (a, b) = (&args[0], &args[1]);
        if a.ty != b.ty {
            return Err(RuntimeError::RuntimeError {
                line: 0,
                message: format!("cannot compare {} and {} for equality", a.ty.name(), b.ty.name()),
            });
        }
        Ok(Value::bool(a.equal(b) == expect_equal))
    }));
    LibraryItem::Operator(crate::function::Operator::new(symbol).with(f))
}

fn logical_operator(symbol: &str, op: fn(bool, bool) -> bool) -> LibraryItem {
    let f = native(symbol, vec![("a", DataType::Boolean), ("b", DataType::Boolean)], {
        Rc::new(move |_ctx, args| {
            Ok(Value::bool(op(args[0].as_bool().unwrap(), args[1].as_bool().unwrap())))
        })
    });
    LibraryItem::Operator(crate::function::Operator::new(symbol).with(f))
}

fn checked_div_i64(a: i64, b: i64) -> Result<i64, String> {
    if b == 0 {
        return Err("division by zero".to_string());
    }
    Ok(a / b) // Rust's `/` on i64 already truncates toward zero.
}

fn checked_div_f64(a: f64, b: f64) -> Result<f64, String> {
    if b == 0.0 {
        return Err("division by zero".to_string());
    }
    Ok(a / b)
}

/// Builds the ordered list of items `Context::load` installs: every
/// DataType, the arithmetic/comparison/logical operators of spec.md §6, and
/// the free functions SPEC_FULL.md §4.9 adds on top.
pub fn standard_library() -> Vec<LibraryItem> {
    let mut items: Vec<LibraryItem> = Vec::new();

    for ty in ALL_TYPES {
        items.push(LibraryItem::Type(ty.name(), *ty));
    }

    // `+` tries integer, then float, then STRING-concat-of-any-right-hand
    // (spec.md §6) last, so `1 + 2` resolves to the integer overload first.
    let concat = native("+", vec![("a", DataType::String), ("b", DataType::Any)], Rc::new(|_ctx, args| {
        let rhs = cast(&args[1], DataType::String).map_err(|cause| RuntimeError::CastError { line: 0, cause })?;
        Ok(Value::string(format!("{}{}", args[0].as_str().unwrap(), rhs.as_str().unwrap())))
    }));
    let plus = arithmetic_operator("+", |a, b| Ok(a.wrapping_add(b)), |a, b| Ok(a + b)).with(concat);
    items.push(LibraryItem::Operator(plus));

    // `-` tries binary int/float subtraction first; a one-operand call
    // (unary minus) fails arity on those and falls through to negation.
    let neg_int =
        native("-", vec![("a", DataType::Integer)], Rc::new(|_ctx, args| Ok(Value::int(-args[0].as_int().unwrap()))));
    let neg_float = native("-", vec![("a", DataType::Float)], Rc::new(|_ctx, args| {
        Ok(Value::float(-args[0].as_float().unwrap()))
    }));
    let minus = arithmetic_operator("-", |a, b| Ok(a.wrapping_sub(b)), |a, b| Ok(a - b))
        .with(neg_int)
        .with(neg_float);
    items.push(LibraryItem::Operator(minus));

    items.push(LibraryItem::Operator(arithmetic_operator("*", |a, b| Ok(a.wrapping_mul(b)), |a, b| Ok(a * b))));
    items.push(LibraryItem::Operator(arithmetic_operator("/", checked_div_i64, checked_div_f64)));

    items.push(equality_operator("==", true));
    items.push(equality_operator("!=", false));
    items.push(logical_operator("&&", |a, b| a && b));
    items.push(logical_operator("||", |a, b| a || b));
    items.push(logical_operator("^|", |a, b| a != b));
    items.push(comparison_operator("<", |a, b| a < b));
    items.push(comparison_operator(">", |a, b| a > b));
    items.push(comparison_operator("<=", |a, b| a <= b));
    items.push(comparison_operator(">=", |a, b| a >= b));

    items.push(LibraryItem::Function(print_fn()));
    items.push(LibraryItem::Function(len_fn()));
    items.push(LibraryItem::Function(type_fn()));
    items.push(LibraryItem::Function(cast_wrapper("str", DataType::String)));
    items.push(LibraryItem::Function(cast_wrapper("int", DataType::Integer)));
    items.push(LibraryItem::Function(cast_wrapper("float", DataType::Float)));
    items.push(LibraryItem::Function(cast_wrapper("bool", DataType::Boolean)));

    items
}

fn print_fn() -> Rc<Function> {
    native("print", vec![("value", DataType::Any)], Rc::new(|_ctx, args| {
        let as_string =
            cast(&args[0], DataType::String).map_err(|cause| RuntimeError::CastError { line: 0, cause })?;
        println!("{}", as_string.as_str().unwrap());
        Ok(Value::null())
    }))
}

fn len_fn() -> Rc<Function> {
    native("len", vec![("value", DataType::Any)], Rc::new(|_ctx, args| {
        let n = match &args[0].payload {
            Payload::Str(s) => s.chars().count(),
            Payload::List(l) => l.len(),
            Payload::Set(s) => s.len(),
            Payload::Map(m) => m.len(),
            _ => {
                return Err(RuntimeError::ArgumentError {
                    line: 0,
                    message: format!("len() has no meaning for {}", args[0].ty.name()),
                })
            }
        };
        Ok(Value::int(n as i64))
    }))
}

fn type_fn() -> Rc<Function> {
    native("type", vec![("value", DataType::Any)], Rc::new(|_ctx, args| Ok(Value::string(args[0].ty.name()))))
}

fn cast_wrapper(name: &'static str, target: DataType) -> Rc<Function> {
    native(name, vec![("value", DataType::Any)], Rc::new(move |_ctx, args| {
        cast(&args[0], target).map_err(|cause| RuntimeError::ArgumentCastError { line: 0, message: cause.to_string() })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Context;

    #[test]
    fn integer_addition_dispatches_before_float() {
        let mut ctx = Context::new();
        ctx.load(standard_library());
        let op = ctx.find_op("+", 1).unwrap();
        let sum = crate::function::call_operator(&op, &[Value::int(1), Value::int(2)], &mut ctx, 1).unwrap();
        assert_eq!(sum.as_int(), Some(3));
    }

    #[test]
    fn string_plus_any_concatenates_via_string_cast() {
        let mut ctx = Context::new();
        ctx.load(standard_library());
        let op = ctx.find_op("+", 1).unwrap();
        let result = crate::function::call_operator(&op, &[Value::string("a"), Value::int(1)], &mut ctx, 1).unwrap();
        assert_eq!(result.as_str(), Some("a1"));
    }

    #[test]
    fn integer_division_by_zero_errors() {
        let mut ctx = Context::new();
        ctx.load(standard_library());
        let op = ctx.find_op("/", 1).unwrap();
        let err = crate::function::call_operator(&op, &[Value::int(1), Value::int(0)], &mut ctx, 1).unwrap_err();
        assert!(matches!(err, RuntimeError::RuntimeError { .. }));
    }

    #[test]
    fn equality_across_different_types_errors() {
        let mut ctx = Context::new();
        ctx.load(standard_library());
        let op = ctx.find_op("==", 1).unwrap();
        let err = crate::function::call_operator(&op, &[Value::int(1), Value::float(1.0)], &mut ctx, 1).unwrap_err();
        assert!(matches!(err, RuntimeError::RuntimeError { .. }));
    }

    #[test]
    fn len_reports_string_character_count() {
        let mut ctx = Context::new();
        ctx.load(standard_library());
        let binding = ctx.find_id("len", 1).unwrap();
        let f = match binding {
            crate::namespace::Binding::Function(f) => f,
            _ => panic!("expected function"),
        };
        let result = crate::function::call_function(&f, &[Value::string("hello")], &mut ctx, 1).unwrap();
        assert_eq!(result.as_int(), Some(5));
    }
}
