//! Pepper: a small dynamically-typed expression language.
//!
//! Source text runs through a three-stage pipeline: [`lexer`] + [`parser`]
//! turn it into a [`ast::Program`], [`compiler`] lowers that tree to a flat
//! bytecode [`code::Program`], and [`vm::Vm`] executes it on a stack machine.
//! [`value`] holds the runtime tagged-variant data model shared by the
//! compiler's constant pool and the VM's stack; [`symbol_table`] resolves
//! identifiers to storage classes at compile time; [`builtins`] is the
//! host-function roster the VM dispatches `OP_GET_BUILTIN`/`OP_CALL` into.
//!
//! ```rust
//! use pepper::{compiler::Compiler, parser, vm::{Globals, Vm}};
//!
//! let ast = parser::parse("let x = 2; let y = 3; x * y + 1;").unwrap();
//! let mut compiler = Compiler::new();
//! compiler.compile_program(&ast).unwrap();
//! let (bytecode, _symbols) = compiler.bytecode();
//!
//! let mut vm = Vm::new(&bytecode);
//! let mut globals = Globals::new();
//! vm.run(&mut globals).unwrap();
//! assert_eq!(vm.stack_last_popped().to_string(), "7");
//! ```

pub mod ast;
pub mod builtins;
pub mod code;
pub mod compiler;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod symbol_table;
pub mod value;
pub mod vm;

pub use code::Program as Bytecode;
pub use value::Value;
