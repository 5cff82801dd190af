//! The type lattice and the `Value` triple (spec.md §3, §4.1).
//!
//! Grounded on `lumen-vm/src/values.rs`'s tagged `Value` enum, trimmed to the
//! payload set spec.md §3 actually names (no `BigInt`, `Bytes`, `Union`,
//! `Closure`, `Future`) and given the `DataType` tag and optional name every
//! Tea value carries.

use std::rc::Rc;

use crate::function::Function;

/// A node in the type lattice. Types are process-wide singletons; since this
/// is a closed, fixed set, identity comparison is just enum equality — no
/// interning table is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Root of the lattice. Every concrete type's ancestor chain ends here.
    Any,
    /// Abstract parent of `Integer`/`Float`. Not instantiable, not castable;
    /// used only for signature matching (spec.md §4.1).
    Number,
    Null,
    Integer,
    Float,
    Boolean,
    String,
    List,
    Set,
    Map,
    Object,
    Function,
}

impl DataType {
    /// The name this type is registered under in a namespace's `ty` space
    /// (spec.md §6's standard library export list).
    pub fn name(self) -> &'static str {
        match self {
            DataType::Any => "*any",
            DataType::Number => "*number",
            DataType::Null => "null",
            DataType::Integer => "int",
            DataType::Float => "float",
            DataType::Boolean => "bool",
            DataType::String => "string",
            DataType::List => "list",
            DataType::Set => "set",
            DataType::Map => "map",
            DataType::Object => "object",
            DataType::Function => "func",
        }
    }

    pub fn parent(self) -> Option<DataType> {
        match self {
            DataType::Any => None,
            DataType::Number => Some(DataType::Any),
            DataType::Integer | DataType::Float => Some(DataType::Number),
            _ => Some(DataType::Any),
        }
    }

    /// Reflexive-transitive subtype test: true iff `self` equals `other` or
    /// some ancestor of `self` does.
    pub fn kind_of(self, other: DataType) -> bool {
        let mut current = Some(self);
        while let Some(t) = current {
            if t == other {
                return true;
            }
            current = t.parent();
        }
        false
    }
}

/// The eleven concrete + abstract types, in the order the standard library
/// registers them into a namespace's `ty` space.
pub const ALL_TYPES: &[DataType] = &[
    DataType::Any,
    DataType::Number,
    DataType::Null,
    DataType::Integer,
    DataType::Float,
    DataType::Boolean,
    DataType::String,
    DataType::List,
    DataType::Set,
    DataType::Map,
    DataType::Object,
    DataType::Function,
];

/// The payload half of a Value. Collections are `Rc`-wrapped so cloning a
/// Value (which happens on every namespace lookup and every argument bind)
/// stays cheap.
#[derive(Debug, Clone)]
pub enum Payload {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Rc<String>),
    List(Rc<Vec<Value>>),
    Set(Rc<Vec<Value>>),
    Map(Rc<Vec<(Value, Value)>>),
    /// `None` represents the "no function" value produced by casting NULL to
    /// FUNCTION (spec.md §4.1).
    Function(Option<Rc<Function>>),
    Object(Rc<Value>),
}

/// A (DataType, payload, optional name) triple (spec.md §3).
#[derive(Debug, Clone)]
pub struct Value {
    pub ty: DataType,
    pub payload: Payload,
    pub name: Option<String>,
}

impl Value {
    pub fn new(ty: DataType, payload: Payload) -> Self {
        Value { ty, payload, name: None }
    }

    pub fn null() -> Self {
        Value::new(DataType::Null, Payload::Null)
    }

    pub fn int(n: i64) -> Self {
        Value::new(DataType::Integer, Payload::Int(n))
    }

    pub fn float(f: f64) -> Self {
        Value::new(DataType::Float, Payload::Float(f))
    }

    pub fn bool(b: bool) -> Self {
        Value::new(DataType::Boolean, Payload::Bool(b))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::new(DataType::String, Payload::Str(Rc::new(s.into())))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.payload {
            Payload::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.payload {
            Payload::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.payload {
            Payload::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.payload {
            Payload::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Equality compares (DataType, payload) ignoring name (spec.md §3).
    pub fn equal(&self, other: &Value) -> bool {
        self == other
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.ty != other.ty {
            return false;
        }
        match (&self.payload, &other.payload) {
            (Payload::Null, Payload::Null) => true,
            (Payload::Int(a), Payload::Int(b)) => a == b,
            (Payload::Float(a), Payload::Float(b)) => a == b,
            (Payload::Bool(a), Payload::Bool(b)) => a == b,
            (Payload::Str(a), Payload::Str(b)) => a == b,
            (Payload::List(a), Payload::List(b)) => a == b,
            (Payload::Set(a), Payload::Set(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.contains(x))
            }
            (Payload::Map(a), Payload::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.iter().any(|(k2, v2)| k == k2 && v == v2))
            }
            (Payload::Function(a), Payload::Function(b)) => match (a, b) {
                (Some(x), Some(y)) => Rc::ptr_eq(x, y),
                (None, None) => true,
                _ => false,
            },
            (Payload::Object(a), Payload::Object(b)) => a == b,
            _ => false,
        }
    }
}

/// Raised when no cast rule in §4.1's table covers `(value.ty, target)`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("cannot cast {value_type} to {target}")]
pub struct CastError {
    pub value_type: &'static str,
    pub target: &'static str,
}

/// The exhaustive cast table from spec.md §4.1. The NULL→STRING rule is
/// resolved per DESIGN.md's open question: `"null"`, matching
/// `original_source/runtime/lib.py`'s and `std.py`'s `to_string` dispatch
/// for a NULL-typed value.
///
/// `ANY`/`NUMBER` are abstract: spec.md §4.1 says `NUMBER` "has no cast" —
/// read literally, casting to an abstract parent is a no-op rather than a
/// rejection, since the caller has already proven `kind_of` before reaching
/// here (argument binding against an abstract parameter type, e.g. the
/// standard library's `+` over `*any`).
pub fn cast(value: &Value, target: DataType) -> Result<Value, CastError> {
    use DataType::*;

    if matches!(target, Any | Number) {
        return Ok(value.clone());
    }

    let payload = match (target, &value.payload) {
        (Integer, Payload::Int(n)) => Payload::Int(*n),
        (Integer, Payload::Float(f)) => Payload::Int(f.trunc() as i64),
        (Integer, Payload::Bool(b)) => Payload::Int(if *b { 1 } else { 0 }),
        (Integer, Payload::Null) => Payload::Int(0),

        (Float, Payload::Float(f)) => Payload::Float(*f),
        (Float, Payload::Int(n)) => Payload::Float(*n as f64),
        (Float, Payload::Null) => Payload::Float(0.0),

        (String, Payload::Int(n)) => Payload::Str(Rc::new(n.to_string())),
        (String, Payload::Float(f)) => Payload::Str(Rc::new(f.to_string())),
        (String, Payload::Str(s)) => Payload::Str(Rc::clone(s)),
        (String, Payload::Bool(b)) => {
            Payload::Str(Rc::new(if *b { "true".to_string() } else { "false".to_string() }))
        }
        (String, Payload::Null) => Payload::Str(Rc::new("null".to_string())),

        (Boolean, Payload::Int(n)) => Payload::Bool(*n > 0),
        (Boolean, Payload::Bool(b)) => Payload::Bool(*b),
        (Boolean, Payload::Null) => Payload::Bool(false),

        (List, Payload::List(l)) => Payload::List(Rc::clone(l)),
        (List, Payload::Str(s)) => Payload::List(Rc::new(
            s.chars().map(|c| Value::string(c.to_string())).collect(),
        )),
        (List, Payload::Null) => Payload::List(Rc::new(Vec::new())),

        (Set, Payload::Set(s)) => Payload::Set(Rc::clone(s)),
        (Set, Payload::List(l)) => {
            let mut out: Vec<Value> = Vec::new();
            for v in l.iter() {
                if !out.contains(v) {
                    out.push(v.clone());
                }
            }
            Payload::Set(Rc::new(out))
        }
        (Set, Payload::Null) => Payload::Set(Rc::new(Vec::new())),

        (Map, Payload::Map(m)) => Payload::Map(Rc::clone(m)),
        (Map, Payload::Null) => Payload::Map(Rc::new(Vec::new())),

        (Function, Payload::Function(f)) => Payload::Function(f.clone()),
        (Function, Payload::Null) => Payload::Function(None),

        (Object, _) => Payload::Object(Rc::new(value.clone())),

        _ => {
            return Err(CastError {
                value_type: value.ty.name(),
                target: target.name(),
            })
        }
    };

    Ok(Value { ty: target, payload, name: value.name.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_of_is_reflexive_and_walks_ancestors() {
        assert!(DataType::Integer.kind_of(DataType::Integer));
        assert!(DataType::Integer.kind_of(DataType::Number));
        assert!(DataType::Integer.kind_of(DataType::Any));
        assert!(!DataType::Integer.kind_of(DataType::Float));
    }

    #[test]
    fn cast_is_idempotent_for_matching_concrete_types() {
        let v = Value::int(5);
        assert_eq!(cast(&v, DataType::Integer).unwrap(), v);
        let s = Value::string("hi");
        assert_eq!(cast(&s, DataType::String).unwrap(), s);
    }

    #[test]
    fn null_casts_to_the_string_null() {
        let n = Value::null();
        let s = cast(&n, DataType::String).unwrap();
        assert_eq!(s.as_str(), Some("null"));
    }

    #[test]
    fn float_truncates_toward_zero_on_cast_to_integer() {
        assert_eq!(cast(&Value::float(3.9), DataType::Integer).unwrap().as_int(), Some(3));
        assert_eq!(cast(&Value::float(-3.9), DataType::Integer).unwrap().as_int(), Some(-3));
    }

    #[test]
    fn unlisted_pair_fails() {
        let v = Value::bool(true);
        assert!(cast(&v, DataType::List).is_err());
    }

    #[test]
    fn equality_ignores_name() {
        let a = Value::int(1).named("a");
        let b = Value::int(1).named("b");
        assert!(a.equal(&b));
    }

    #[test]
    fn set_cast_from_list_deduplicates() {
        let l = Value::new(
            DataType::List,
            Payload::List(Rc::new(vec![Value::int(1), Value::int(1), Value::int(2)])),
        );
        let s = cast(&l, DataType::Set).unwrap();
        match s.payload {
            Payload::Set(items) => assert_eq!(items.len(), 2),
            _ => panic!("expected set payload"),
        }
    }
}
