//! Tea's runtime: value/type system, scoped namespaces, function and
//! operator dispatch, the tree-walking evaluator, and the standard library.
//!
//! `tea-core` hands this crate an AST; `eval` walks it against a `Context`.

pub mod error;
pub mod eval;
pub mod function;
pub mod namespace;
pub mod stdlib;
pub mod value;

pub use error::RuntimeError;
pub use eval::eval;
pub use function::{Function, Operator, Parameter, Signature, SignatureBody};
pub use namespace::{Behavior, Binding, Context, LibraryItem, Namespace, NamespaceRef};
pub use value::{cast, CastError, DataType, Payload, Value};

/// `format(value)` from spec.md §6: the display form mirrors the STRING
/// cast.
pub fn format(value: &Value) -> String {
    cast(value, DataType::String)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// `empty_context()` from spec.md §6.
pub fn empty_context() -> Context {
    Context::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tea_core::parse_source;

    #[test]
    fn empty_context_has_no_standard_library_until_loaded() {
        let ctx = empty_context();
        assert!(ctx.find_id("print", 1).is_err());
    }

    #[test]
    fn format_mirrors_the_string_cast() {
        assert_eq!(format(&Value::int(5)), "5");
        assert_eq!(format(&Value::null()), "null");
    }

    #[test]
    fn eval_wires_parse_source_straight_through() {
        let ast = parse_source("1 + 1").unwrap();
        let mut ctx = Context::new();
        ctx.load(stdlib::standard_library());
        assert_eq!(eval(&ast, &mut ctx).unwrap().as_int(), Some(2));
    }
}
