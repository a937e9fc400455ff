//! Runtime value model.
//!
//! A tagged variant with structural equality on the hashable subset and
//! reference-identity equality on heap-allocated containers and callables.
//! Arrays and maps are reclaimed when their last `Rc` drops rather than by
//! a tracing collector.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

/// A compiled, not-yet-closed-over function body.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    pub instructions: Rc<[u8]>,
    pub num_locals: usize,
    pub num_parameters: usize,
    /// Name for diagnostics only (anonymous functions use `"<anonymous>"`).
    pub name: String,
}

/// A compiled function together with its captured free-variable values.
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub function: Rc<CompiledFunction>,
    pub free: SmallVec<[Value; 4]>,
}

/// A key restricted to the hashable subset of [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    String(String),
}

/// Every runtime datum in Pepper is one of these variants.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    String(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<HashMap<HashKey, Value>>>),
    CompiledFunction(Rc<CompiledFunction>),
    Closure(Rc<Closure>),
    Builtin(usize),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::CompiledFunction(_) => "function",
            Value::Closure(_) => "function",
            Value::Builtin(_) => "builtin",
        }
    }

    /// `false` and `Null` are falsy; every other value is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    /// The hashable subset can be used as a `Map` key.
    pub fn as_hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(i) => Some(HashKey::Integer(*i)),
            Value::Boolean(b) => Some(HashKey::Boolean(*b)),
            Value::String(s) => Some(HashKey::String(s.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match key {
                        HashKey::Integer(n) => write!(f, "{}", n)?,
                        HashKey::Boolean(b) => write!(f, "{}", b)?,
                        HashKey::String(s) => write!(f, "\"{}\"", s)?,
                    }
                    write!(f, ": {}", value)?;
                }
                write!(f, "}}")
            }
            Value::CompiledFunction(func) => write!(f, "<function {}>", func.name),
            Value::Closure(closure) => write!(f, "<function {}>", closure.function.name),
            Value::Builtin(idx) => write!(f, "<builtin #{}>", idx),
        }
    }
}

/// Structural equality on Integer/Boolean/String/Null; reference identity on
/// Array/Map/callable variants.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::CompiledFunction(a), Value::CompiledFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::String("".into()).is_truthy());
        assert!(Value::Boolean(true).is_truthy());
    }

    #[test]
    fn structural_equality_on_scalars() {
        assert_eq!(Value::Integer(5), Value::Integer(5));
        assert_ne!(Value::Integer(5), Value::Integer(6));
        assert_eq!(
            Value::String(Rc::from("a")),
            Value::String(Rc::from("a"))
        );
    }

    #[test]
    fn reference_identity_on_arrays() {
        let a = Value::Array(Rc::new(RefCell::new(vec![Value::Integer(1)])));
        let b = Value::Array(Rc::new(RefCell::new(vec![Value::Integer(1)])));
        assert_ne!(a, b, "distinct allocations are not equal even with equal contents");
        let a_clone = a.clone();
        assert_eq!(a, a_clone);
    }

    #[test]
    fn hash_key_reflexive_and_consistent() {
        let a = Value::Integer(42).as_hash_key().unwrap();
        let b = Value::Integer(42).as_hash_key().unwrap();
        assert_eq!(a, b);
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut h1 = DefaultHasher::new();
        a.hash(&mut h1);
        let mut h2 = DefaultHasher::new();
        b.hash(&mut h2);
        assert_eq!(h1.finish(), h2.finish());
    }
}
