//! Interactive read-eval-print loop.
//!
//! One [`symbol_table::SymbolTable`], one constant pool, and one
//! [`vm::Globals`] are kept alive for the whole session so `let` bindings
//! and previously-compiled constants persist across prompts; only the
//! per-line [`compiler::Compiler`] and [`vm::Vm`] are recreated. A
//! `DefaultEditor` with a history file under the user's home directory
//! drives `readline`/`add_history_entry` in a loop; `Ctrl-C`/`Ctrl-D` exits.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::compiler::Compiler;
use crate::parser;
use crate::symbol_table::SymbolTable;
use crate::value::Value;
use crate::vm::{Globals, Vm};

const PROMPT: &str = ">> ";
const HISTORY_FILE: &str = ".pepper_history";

fn history_path() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|home| home.join(HISTORY_FILE))
}

/// Drive the REPL until the user exits. Returns the process exit code.
pub fn run() -> i32 {
    println!("Pepper {} (press Ctrl-D to exit)", env!("CARGO_PKG_VERSION"));

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("failed to start line editor: {}", err);
            return 1;
        }
    };
    if let Some(path) = history_path() {
        let _ = editor.load_history(&path);
    }

    let mut symbol_table = SymbolTable::new();
    crate::builtins::register(&mut symbol_table);
    let mut constants = Vec::new();
    let mut globals = Globals::new();

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                if line.trim().is_empty() {
                    continue;
                }

                let ast = match parser::parse(&line) {
                    Ok(ast) => ast,
                    Err(errors) => {
                        for err in errors {
                            println!("ParseError: {}", err);
                        }
                        continue;
                    }
                };

                // Snapshot so a failed compile (which may leave an unpopped
                // function scope behind on error) can't corrupt the symbol
                // table the next line resolves against: compilation aborts
                // with no partial state surviving the failure.
                let table_before_line = symbol_table.clone();
                let mut compiler = Compiler::new_with_state(symbol_table, constants.clone());
                if let Err(err) = compiler.compile_program(&ast) {
                    println!("CompileError: {}", err);
                    symbol_table = table_before_line;
                    continue;
                }
                let (bytecode, restored_table) = compiler.bytecode();
                symbol_table = restored_table;
                constants = bytecode.constants.clone();

                let mut vm = Vm::new(&bytecode);
                match vm.run(&mut globals) {
                    Ok(()) => {
                        let result = vm.stack_last_popped();
                        // Every Pepper function literal becomes a Closure at
                        // runtime (even a zero-free-variable one goes through
                        // OP_CLOSURE), so the bare CompiledFunction variant
                        // spec.md names never actually reaches the stack —
                        // Closure is the value this exclusion is meant to
                        // cover.
                        if !matches!(
                            result,
                            Value::CompiledFunction(_) | Value::Closure(_) | Value::Builtin(_)
                        ) {
                            println!("{}", result);
                        }
                    }
                    Err(err) => println!("RuntimeError: {}", err),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("readline error: {}", err);
                break;
            }
        }
    }

    if let Some(path) = history_path() {
        let _ = editor.save_history(&path);
    }
    0
}
