//! Host-provided functions reachable from Pepper source via `OP_GET_BUILTIN`.
//!
//! A flat, index-addressed function table: the minimum roster a script
//! touching arrays needs to be useful at all.

use std::rc::Rc;

use crate::symbol_table::SymbolTable;
use crate::value::Value;
use crate::vm::VmError;

pub type BuiltinFn = fn(&[Value]) -> Result<Value, VmError>;

/// Index-addressed; a symbol's `index` into this slice is baked into
/// `OP_GET_BUILTIN` at compile time, so entries must never be reordered.
pub static BUILTINS: &[(&str, BuiltinFn)] = &[
    ("len", builtin_len),
    ("first", builtin_first),
    ("last", builtin_last),
    ("rest", builtin_rest),
    ("push", builtin_push),
    ("print", builtin_print),
];

/// Define every builtin in the outermost scope, in table order, so each
/// symbol's index matches its slot in [`BUILTINS`].
pub fn register(symbol_table: &mut SymbolTable) {
    for (index, (name, _)) in BUILTINS.iter().enumerate() {
        symbol_table.define_builtin(index, name);
    }
}

pub fn lookup(index: usize) -> Option<BuiltinFn> {
    BUILTINS.get(index).map(|(_, f)| *f)
}

fn arity_error(expected: usize, got: usize) -> VmError {
    VmError::ArityMismatch { expected, got }
}

fn builtin_len(args: &[Value]) -> Result<Value, VmError> {
    if args.len() != 1 {
        return Err(arity_error(1, args.len()));
    }
    match &args[0] {
        Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
        Value::Array(items) => Ok(Value::Integer(items.borrow().len() as i64)),
        other => Err(VmError::TypeMismatch {
            op: "len",
            lhs: other.type_name(),
            rhs: None,
        }),
    }
}

fn builtin_first(args: &[Value]) -> Result<Value, VmError> {
    if args.len() != 1 {
        return Err(arity_error(1, args.len()));
    }
    match &args[0] {
        Value::Array(items) => Ok(items.borrow().first().cloned().unwrap_or(Value::Null)),
        other => Err(VmError::TypeMismatch {
            op: "first",
            lhs: other.type_name(),
            rhs: None,
        }),
    }
}

fn builtin_last(args: &[Value]) -> Result<Value, VmError> {
    if args.len() != 1 {
        return Err(arity_error(1, args.len()));
    }
    match &args[0] {
        Value::Array(items) => Ok(items.borrow().last().cloned().unwrap_or(Value::Null)),
        other => Err(VmError::TypeMismatch {
            op: "last",
            lhs: other.type_name(),
            rhs: None,
        }),
    }
}

fn builtin_rest(args: &[Value]) -> Result<Value, VmError> {
    if args.len() != 1 {
        return Err(arity_error(1, args.len()));
    }
    match &args[0] {
        Value::Array(items) => {
            let borrowed = items.borrow();
            if borrowed.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::Array(Rc::new(std::cell::RefCell::new(
                    borrowed[1..].to_vec(),
                ))))
            }
        }
        other => Err(VmError::TypeMismatch {
            op: "rest",
            lhs: other.type_name(),
            rhs: None,
        }),
    }
}

fn builtin_push(args: &[Value]) -> Result<Value, VmError> {
    if args.len() != 2 {
        return Err(arity_error(2, args.len()));
    }
    match &args[0] {
        Value::Array(items) => {
            let mut copy = items.borrow().clone();
            copy.push(args[1].clone());
            Ok(Value::Array(Rc::new(std::cell::RefCell::new(copy))))
        }
        other => Err(VmError::TypeMismatch {
            op: "push",
            lhs: other.type_name(),
            rhs: None,
        }),
    }
}

fn builtin_print(args: &[Value]) -> Result<Value, VmError> {
    let rendered: Vec<String> = args.iter().map(|v| v.to_string()).collect();
    println!("{}", rendered.join(" "));
    Ok(Value::Null)
}
