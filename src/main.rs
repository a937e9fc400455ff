//! Pepper CLI.
//!
//! No arguments: start the REPL. `--version`: print a banner and exit 0.
//! Any other single argument is a source file path: read, compile, run it.
//! No argument-parsing crate; plain `env::args()` matching and
//! `eprintln!`-based error reporting.

use std::fs;
use std::process;

use pepper::compiler::Compiler;
use pepper::parser;
use pepper::vm::{Globals, Vm};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    println!("Pepper {}", VERSION);
}

fn run_script(path: &str) -> i32 {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error reading '{}': {}", path, err);
            return 1;
        }
    };

    let ast = match parser::parse(&source) {
        Ok(ast) => ast,
        Err(errors) => {
            for err in errors {
                eprintln!("ParseError: {}", err);
            }
            return 1;
        }
    };

    let mut compiler = Compiler::new();
    if let Err(err) = compiler.compile_program(&ast) {
        eprintln!("CompileError: {}", err);
        return 1;
    }
    let (bytecode, _symbol_table) = compiler.bytecode();

    let mut vm = Vm::new(&bytecode);
    let mut globals = Globals::new();
    if let Err(err) = vm.run(&mut globals) {
        eprintln!("RuntimeError: {}", err);
        return 1;
    }
    0
}

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let exit_code = match args.as_slice() {
        [_] => pepper::repl::run(),
        [_, flag] if flag == "--version" => {
            print_version();
            0
        }
        [_, path] => run_script(path),
        _ => {
            eprintln!("usage: pepper [--version | <script>]");
            1
        }
    };

    process::exit(exit_code);
}
