//! Lexical-scope resolver.
//!
//! Maps identifiers to a storage class (global / local / free / builtin /
//! the enclosing function's own name) at compile time, across a stack of
//! lexically nested scopes.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    Global,
    Local,
    Free,
    Builtin,
    /// The enclosing function's own name, for self-recursion.
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub scope: SymbolScope,
    pub index: usize,
}

#[derive(Debug, Default, Clone)]
struct Scope {
    store: HashMap<String, Symbol>,
    num_definitions: usize,
    free_symbols: Vec<Symbol>,
}

/// A stack of scopes, innermost last.
#[derive(Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

/// Metadata about a scope popped off the table, handed back to the
/// compiler so it can read `free_symbols` and `num_definitions`.
pub struct PoppedScope {
    pub num_definitions: usize,
    pub free_symbols: Vec<Symbol>,
}

/// Bindings visible before a `for`-loop's block scope was entered.
pub struct BlockMark {
    store: HashMap<String, Symbol>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::default()],
        }
    }

    fn is_outermost(&self) -> bool {
        self.scopes.len() == 1
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) -> PoppedScope {
        let scope = self
            .scopes
            .pop()
            .expect("pop_scope called with no scope on the stack");
        PoppedScope {
            num_definitions: scope.num_definitions,
            free_symbols: scope.free_symbols,
        }
    }

    pub fn define(&mut self, name: &str) -> Symbol {
        let outermost = self.is_outermost();
        let scope = self.scopes.last_mut().expect("at least one scope");
        let scope_tag = if outermost {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let index = scope.num_definitions;
        let symbol = Symbol {
            name: name.to_string(),
            scope: scope_tag,
            index,
        };
        scope.num_definitions += 1;
        scope.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Builtin,
            index,
        };
        self.scopes[0].store.insert(name.to_string(), symbol.clone());
        symbol
    }

    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Function,
            index: 0,
        };
        let scope = self.scopes.last_mut().expect("at least one scope");
        scope.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    fn define_free(&mut self, depth_from_top: usize, original: Symbol) -> Symbol {
        let scope_index = self.scopes.len() - 1 - depth_from_top;
        let scope = &mut self.scopes[scope_index];
        scope.free_symbols.push(original.clone());
        let index = scope.free_symbols.len() - 1;
        let symbol = Symbol {
            name: original.name,
            scope: SymbolScope::Free,
            index,
        };
        scope.store.insert(symbol.name.clone(), symbol.clone());
        symbol
    }

    /// Snapshot of a scope's bindings, taken before entering a `for`-loop's
    /// dedicated block. Local slot numbering does not reset for a block;
    /// only function scopes get a fresh `num_definitions` counter, so a
    /// loop-local `let` still gets a unique, never-reused stack slot within
    /// the enclosing function.
    pub fn enter_block(&mut self) -> BlockMark {
        BlockMark {
            store: self.scopes.last().expect("at least one scope").store.clone(),
        }
    }

    /// Restore the bindings visible before `enter_block`, so loop-local
    /// names become unresolvable again once the loop is compiled.
    pub fn exit_block(&mut self, mark: BlockMark) {
        self.scopes.last_mut().expect("at least one scope").store = mark.store;
    }

    /// Resolve `name`, searching from the innermost scope outward. A name
    /// resolved past an intermediate scope is promoted to `Free` in every
    /// scope it transits, so each function on the chain gets its own free
    /// slot for it (multi-level capture promotion).
    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        self.resolve_from(self.scopes.len() - 1, name)
    }

    fn resolve_from(&mut self, depth: usize, name: &str) -> Option<Symbol> {
        if let Some(sym) = self.scopes[depth].store.get(name) {
            return Some(sym.clone());
        }
        if depth == 0 {
            return None;
        }
        let resolved = self.resolve_from(depth - 1, name)?;
        match resolved.scope {
            SymbolScope::Global | SymbolScope::Builtin => Some(resolved),
            _ => {
                let depth_from_top = self.scopes.len() - 1 - depth;
                Some(self.define_free(depth_from_top, resolved))
            }
        }
    }
}
