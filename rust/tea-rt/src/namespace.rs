//! Lexically-scoped, parent-linked, tri-partitioned symbol tables
//! (spec.md §3, §4.2).
//!
//! Grounded on `parcadei-ouros/crates/ouros/src/namespace.rs`'s scope-tree
//! shape and `scostello-monty/crates/monty/src/namespace.rs`'s naming, but
//! adapted from their compile-time index-slot storage to name-keyed
//! `HashMap`s: Tea resolves names at tree-walk time, with no separate
//! resolution pass that could assign stable slots ahead of time.

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::HashSet;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::function::{Function, Operator};
use crate::value::{DataType, Value};

/// What the `id` space holds: a plain Value, or a reference to a Function
/// (functions and values share one search space per spec.md §3).
#[derive(Debug, Clone)]
pub enum Binding {
    Value(Value),
    Function(Rc<Function>),
}

impl Binding {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Binding::Value(v) => Some(v),
            Binding::Function(_) => None,
        }
    }
}

/// A single scope. Held behind `Rc<RefCell<_>>` since function closures keep
/// a handle to the namespace they were defined in, independent of whatever
/// scope is currently executing.
#[derive(Debug)]
pub struct Namespace {
    parent: Option<Rc<RefCell<Namespace>>>,
    id: HashMap<String, Binding>,
    op: HashMap<String, Operator>,
    ty: HashMap<String, DataType>,
}

pub type NamespaceRef = Rc<RefCell<Namespace>>;

impl Namespace {
    pub fn root() -> NamespaceRef {
        Rc::new(RefCell::new(Namespace {
            parent: None,
            id: HashMap::new(),
            op: HashMap::new(),
            ty: HashMap::new(),
        }))
    }

    /// Returns a new namespace whose parent is `parent`.
    pub fn child(parent: &NamespaceRef) -> NamespaceRef {
        Rc::new(RefCell::new(Namespace {
            parent: Some(Rc::clone(parent)),
            id: HashMap::new(),
            op: HashMap::new(),
            ty: HashMap::new(),
        }))
    }

    fn has_local_id(&self, name: &str) -> bool {
        self.id.contains_key(name)
    }

    /// Reads a local `id` entry directly. Used by Assignment, which already
    /// holds the owning namespace from [`find_owning`] and needs the
    /// existing binding's type before deciding whether the new value is
    /// compatible.
    pub fn id_get(&self, name: &str) -> Option<&Binding> {
        self.id.get(name)
    }

    /// Mutates a local `id` entry in place. Assignment uses this instead of
    /// [`store_value`] because the target namespace was already located by
    /// [`find_owning`], which may not be the current namespace.
    pub fn id_insert(&mut self, name: String, binding: Binding) {
        self.id.insert(name, binding);
    }
}

/// An item `load`/`store` can install. Covers every item kind spec.md §4.2
/// names: Value/Function go into `id`, Operator into `op`, DataType into
/// `ty`.
pub enum LibraryItem {
    Value(Value),
    Function(Rc<Function>),
    Operator(Operator),
    Type(&'static str, DataType),
}

/// Local-then-parent lookup, returning the shallowest match.
pub fn find_id(ns: &NamespaceRef, name: &str, line: usize) -> Result<Binding, RuntimeError> {
    let mut cursor = Rc::clone(ns);
    loop {
        if let Some(b) = cursor.borrow().id.get(name) {
            return Ok(b.clone());
        }
        let parent = cursor.borrow().parent.clone();
        match parent {
            Some(p) => cursor = p,
            None => {
                return Err(RuntimeError::NamespaceError {
                    line,
                    message: format!("identifier '{name}' not found"),
                })
            }
        }
    }
}

pub fn find_op(ns: &NamespaceRef, symbol: &str, line: usize) -> Result<Operator, RuntimeError> {
    let mut cursor = Rc::clone(ns);
    loop {
        if let Some(op) = cursor.borrow().op.get(symbol) {
            return Ok(op.clone());
        }
        let parent = cursor.borrow().parent.clone();
        match parent {
            Some(p) => cursor = p,
            None => {
                return Err(RuntimeError::NamespaceError {
                    line,
                    message: format!("operator '{symbol}' not found"),
                })
            }
        }
    }
}

pub fn find_ty(ns: &NamespaceRef, name: &str, line: usize) -> Result<DataType, RuntimeError> {
    let mut cursor = Rc::clone(ns);
    loop {
        if let Some(ty) = cursor.borrow().ty.get(name) {
            return Ok(*ty);
        }
        let parent = cursor.borrow().parent.clone();
        match parent {
            Some(p) => cursor = p,
            None => {
                return Err(RuntimeError::NamespaceError {
                    line,
                    message: format!("type '{name}' not found"),
                })
            }
        }
    }
}

/// Walks the chain starting at `ns` to find the namespace whose *local* `id`
/// map already holds `name`. Assignment mutates that entry in place rather
/// than shadowing it locally (spec.md §3, §4.5.Assignment).
pub fn find_owning(ns: &NamespaceRef, name: &str) -> Option<NamespaceRef> {
    let mut cursor = Rc::clone(ns);
    loop {
        if cursor.borrow().has_local_id(name) {
            return Some(cursor);
        }
        let parent = cursor.borrow().parent.clone();
        match parent {
            Some(p) => cursor = p,
            None => return None,
        }
    }
}

pub fn has_local_id(ns: &NamespaceRef, name: &str) -> bool {
    ns.borrow().has_local_id(name)
}

/// Insert is always local: a duplicate name in the same local map overwrites
/// silently (spec.md §4.2) — the Declaration duplicate-name check is the
/// caller's job, not this function's.
pub fn store_value(ns: &NamespaceRef, value: Value) {
    let name = value.name.clone().expect("stored values must be named");
    ns.borrow_mut().id.insert(name, Binding::Value(value));
}

pub fn store_function(ns: &NamespaceRef, function: Rc<Function>) {
    ns.borrow_mut().id.insert(function.name.clone(), Binding::Function(function));
}

pub fn store_operator(ns: &NamespaceRef, operator: Operator) {
    ns.borrow_mut().op.insert(operator.symbol.clone(), operator);
}

pub fn load(ns: &NamespaceRef, items: Vec<LibraryItem>) {
    for item in items {
        match item {
            LibraryItem::Value(v) => store_value(ns, v),
            LibraryItem::Function(f) => store_function(ns, f),
            LibraryItem::Operator(op) => store_operator(ns, op),
            LibraryItem::Type(name, ty) => {
                ns.borrow_mut().ty.insert(name.to_string(), ty);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Default,
    Return,
    Break,
    Continue,
    Exit,
}

/// The runtime cursor (spec.md §3, §4.2): the current namespace, a handle to
/// the root namespace captured at context creation, the control-flow
/// `behavior` flag, and the REPL's string flags.
pub struct Context {
    pub current: NamespaceRef,
    pub root: NamespaceRef,
    pub behavior: Behavior,
    pub flags: HashSet<String>,
}

impl Context {
    /// `empty_context()` from spec.md §6: a fresh Context with nothing
    /// loaded. The standard library is installed afterward via `load`.
    pub fn new() -> Self {
        let root = Namespace::root();
        Context { current: Rc::clone(&root), root, behavior: Behavior::Default, flags: HashSet::new() }
    }

    /// Captures the current namespace, installs a fresh child, and returns
    /// the captured original so the caller can restore it later.
    pub fn substitute(&mut self) -> NamespaceRef {
        let previous = Rc::clone(&self.current);
        self.current = Namespace::child(&previous);
        previous
    }

    pub fn restore(&mut self, previous: NamespaceRef) {
        self.current = previous;
    }

    pub fn find_id(&self, name: &str, line: usize) -> Result<Binding, RuntimeError> {
        find_id(&self.current, name, line)
    }

    pub fn find_op(&self, symbol: &str, line: usize) -> Result<Operator, RuntimeError> {
        find_op(&self.current, symbol, line)
    }

    pub fn find_ty(&self, name: &str, line: usize) -> Result<DataType, RuntimeError> {
        find_ty(&self.current, name, line)
    }

    pub fn has_local_id(&self, name: &str) -> bool {
        has_local_id(&self.current, name)
    }

    pub fn store_value(&self, value: Value) {
        store_value(&self.current, value);
    }

    pub fn store_function(&self, function: Rc<Function>) {
        store_function(&self.current, function);
    }

    pub fn load(&self, items: Vec<LibraryItem>) {
        load(&self.current, items);
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_after_store_returns_the_same_item() {
        let ctx = Context::new();
        ctx.store_value(Value::int(5).named("x"));
        let found = ctx.find_id("x", 1).unwrap();
        match found {
            Binding::Value(v) => assert_eq!(v.as_int(), Some(5)),
            _ => panic!("expected a value binding"),
        }
    }

    #[test]
    fn lookup_walks_to_parent_on_miss() {
        let mut ctx = Context::new();
        ctx.store_value(Value::int(1).named("outer"));
        let previous = ctx.substitute();
        let found = ctx.find_id("outer", 1).unwrap();
        assert_eq!(found.as_value().and_then(|v| v.as_int()), Some(1));
        ctx.restore(previous);
    }

    #[test]
    fn insert_is_local_not_visible_from_parent() {
        let mut ctx = Context::new();
        let previous = ctx.substitute();
        ctx.store_value(Value::int(2).named("inner"));
        ctx.restore(previous);
        assert!(ctx.find_id("inner", 1).is_err());
    }
}
