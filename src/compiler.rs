//! Single-pass bytecode compiler.
//!
//! Walks the AST once, emitting instructions directly with no separate
//! intermediate representation, using a scope-stacked instruction buffer
//! so nested function literals each get their own growable code region.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::ast::{Expression, InfixOp, PrefixOp, Program as AstProgram, Statement};
use crate::code::{self, Opcode, Program as Bytecode};
use crate::symbol_table::{Symbol, SymbolScope, SymbolTable};
use crate::value::{CompiledFunction, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    UnknownIdentifier(String),
    InvalidAssignTarget,
    BreakOutsideLoop,
    ContinueOutsideLoop,
    DuplicateParameter(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnknownIdentifier(name) => write!(f, "unknown identifier: {}", name),
            CompileError::InvalidAssignTarget => {
                write!(f, "invalid assignment target")
            }
            CompileError::BreakOutsideLoop => write!(f, "'break' outside of a loop"),
            CompileError::ContinueOutsideLoop => write!(f, "'continue' outside of a loop"),
            CompileError::DuplicateParameter(name) => {
                write!(f, "duplicate parameter name: {}", name)
            }
        }
    }
}

impl std::error::Error for CompileError {}

#[derive(Debug, Clone, Copy)]
struct EmittedInstruction {
    opcode: Opcode,
    position: usize,
}

#[derive(Default)]
struct CompilationScope {
    instructions: Vec<u8>,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

#[derive(Default)]
struct LoopContext {
    break_patches: Vec<usize>,
    continue_patches: Vec<usize>,
}

/// Dedup key for the hashable literal subset of [`Value`]; function
/// constants are never deduplicated (each literal is its own object).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstKey {
    Integer(i64),
    String(String),
}

/// Compiles one [`AstProgram`] into a [`Bytecode`] program. `symbol_table`
/// and the constant pool can be carried over from a previous call so a
/// REPL session accumulates globals and constants across lines without
/// copying VM state in and out between invocations.
pub struct Compiler {
    constants: Vec<Value>,
    constant_index: HashMap<ConstKey, usize>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilationScope>,
    loops: Vec<LoopContext>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        crate::builtins::register(&mut symbol_table);
        Self::new_with_state(symbol_table, Vec::new())
    }

    pub fn new_with_state(symbol_table: SymbolTable, constants: Vec<Value>) -> Self {
        let mut constant_index = HashMap::new();
        for (i, value) in constants.iter().enumerate() {
            if let Some(key) = dedup_key(value) {
                constant_index.entry(key).or_insert(i);
            }
        }
        Compiler {
            constants,
            constant_index,
            symbol_table,
            scopes: vec![CompilationScope::default()],
            loops: Vec::new(),
        }
    }

    pub fn compile_program(&mut self, program: &AstProgram) -> Result<(), CompileError> {
        debug!(statements = program.statements.len(), "compiling program");
        self.compile_statements(&program.statements)
    }

    /// Consume the compiler, returning the finished program and the
    /// symbol table (so a REPL can feed both back into the next line).
    pub fn bytecode(self) -> (Bytecode, SymbolTable) {
        let instructions = self
            .scopes
            .into_iter()
            .next()
            .expect("outermost scope always present")
            .instructions;
        (
            Bytecode {
                instructions,
                constants: self.constants,
            },
            self.symbol_table,
        )
    }

    // -- statement compilation -------------------------------------------------

    fn compile_statements(&mut self, statements: &[Statement]) -> Result<(), CompileError> {
        for statement in statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    fn compile_statement(&mut self, statement: &Statement) -> Result<(), CompileError> {
        match statement {
            Statement::Let { name, value } => {
                self.compile_expression(value)?;
                let symbol = self.symbol_table.define(name);
                self.emit_set(&symbol);
                // Set* opcodes leave the stored value on the stack (needed so
                // assignment-as-expression and `arr[i] = v;` statements both
                // work through the ordinary expression-statement OP_POP
                // rule); a `let` isn't an expression statement, so it pops
                // that residual itself to keep the stack from growing with
                // every binding.
                self.emit(Opcode::Pop, &[]);
                Ok(())
            }
            Statement::Expr(expr) => {
                self.compile_expression(expr)?;
                self.emit(Opcode::Pop, &[]);
                Ok(())
            }
            Statement::Block(statements) => self.compile_statements(statements),
            Statement::While { cond, body } => self.compile_while(cond, body),
            Statement::For {
                init,
                cond,
                post,
                body,
            } => self.compile_for(init, cond, post, body),
            Statement::Break => {
                if self.loops.is_empty() {
                    return Err(CompileError::BreakOutsideLoop);
                }
                let pos = self.emit(Opcode::Jump, &[9999]);
                self.loops.last_mut().unwrap().break_patches.push(pos);
                Ok(())
            }
            Statement::Continue => {
                if self.loops.is_empty() {
                    return Err(CompileError::ContinueOutsideLoop);
                }
                let pos = self.emit(Opcode::Jump, &[9999]);
                self.loops.last_mut().unwrap().continue_patches.push(pos);
                Ok(())
            }
            Statement::Return(value) => {
                match value {
                    Some(expr) => {
                        self.compile_expression(expr)?;
                        self.emit(Opcode::ReturnValue, &[]);
                    }
                    None => {
                        self.emit(Opcode::Return, &[]);
                    }
                }
                Ok(())
            }
        }
    }

    fn compile_while(&mut self, cond: &Expression, body: &[Statement]) -> Result<(), CompileError> {
        let loop_start = self.current_instructions().len();
        self.loops.push(LoopContext::default());
        self.compile_expression(cond)?;
        let jump_if_false_pos = self.emit(Opcode::JumpIfFalse, &[9999]);
        self.compile_statements(body)?;
        self.emit(Opcode::Jump, &[loop_start]);
        let after_loop = self.current_instructions().len();
        self.change_operand(jump_if_false_pos, after_loop);

        let ctx = self.loops.pop().expect("loop context pushed above");
        for pos in ctx.break_patches {
            self.change_operand(pos, after_loop);
        }
        for pos in ctx.continue_patches {
            self.change_operand(pos, loop_start);
        }
        Ok(())
    }

    fn compile_for(
        &mut self,
        init: &Statement,
        cond: &Expression,
        post: &Statement,
        body: &[Statement],
    ) -> Result<(), CompileError> {
        // Dedicated block scope: `init`'s `let` is visible only for the
        // duration of the loop, without disturbing local slot numbering
        // for bindings that follow the loop in the enclosing function.
        let mark = self.symbol_table.enter_block();
        self.compile_statement(init)?;

        let loop_start = self.current_instructions().len();
        self.loops.push(LoopContext::default());
        self.compile_expression(cond)?;
        let jump_if_false_pos = self.emit(Opcode::JumpIfFalse, &[9999]);
        self.compile_statements(body)?;
        // `continue` lands here, past the user's body but before `post`,
        // so the post-statement still runs on every iteration.
        let continue_target = self.current_instructions().len();
        self.compile_statement(post)?;
        self.emit(Opcode::Jump, &[loop_start]);
        let after_loop = self.current_instructions().len();
        self.change_operand(jump_if_false_pos, after_loop);

        let ctx = self.loops.pop().expect("loop context pushed above");
        for pos in ctx.break_patches {
            self.change_operand(pos, after_loop);
        }
        for pos in ctx.continue_patches {
            self.change_operand(pos, continue_target);
        }

        self.symbol_table.exit_block(mark);
        Ok(())
    }

    // -- expression compilation -------------------------------------------------

    fn compile_expression(&mut self, expr: &Expression) -> Result<(), CompileError> {
        match expr {
            Expression::IntLiteral(n) => {
                let idx = self.add_constant(Value::Integer(*n));
                self.emit(Opcode::Constant, &[idx]);
            }
            Expression::StringLiteral(s) => {
                let idx = self.add_constant(Value::String(Rc::from(s.as_str())));
                self.emit(Opcode::Constant, &[idx]);
            }
            Expression::BoolLiteral(true) => {
                self.emit(Opcode::True, &[]);
            }
            Expression::BoolLiteral(false) => {
                self.emit(Opcode::False, &[]);
            }
            Expression::NullLiteral => {
                self.emit(Opcode::Null, &[]);
            }
            Expression::Identifier(name) => {
                let symbol = self
                    .symbol_table
                    .resolve(name)
                    .ok_or_else(|| CompileError::UnknownIdentifier(name.clone()))?;
                self.load_symbol(&symbol);
            }
            Expression::ArrayLiteral(items) => {
                for item in items {
                    self.compile_expression(item)?;
                }
                self.emit(Opcode::Array, &[items.len()]);
            }
            Expression::MapLiteral(pairs) => {
                for (key, value) in pairs {
                    self.compile_expression(key)?;
                    self.compile_expression(value)?;
                }
                self.emit(Opcode::Hash, &[pairs.len() * 2]);
            }
            Expression::Prefix { op, right } => {
                self.compile_expression(right)?;
                match op {
                    PrefixOp::Minus => self.emit(Opcode::Minus, &[]),
                    PrefixOp::Not => self.emit(Opcode::Bang, &[]),
                };
            }
            Expression::Infix { op, left, right } => self.compile_infix(*op, left, right)?,
            Expression::If {
                cond,
                consequence,
                alternative,
            } => self.compile_if(cond, consequence, alternative)?,
            Expression::FunctionLiteral { name, params, body } => {
                let (const_idx, num_free) =
                    self.compile_function_literal(name.as_deref(), params, body)?;
                self.emit(Opcode::Closure, &[const_idx, num_free]);
            }
            Expression::Call { func, args } => {
                self.compile_expression(func)?;
                for arg in args {
                    self.compile_expression(arg)?;
                }
                self.emit(Opcode::Call, &[args.len()]);
            }
            Expression::Index { left, index } => {
                self.compile_expression(left)?;
                self.compile_expression(index)?;
                self.emit(Opcode::Index, &[]);
            }
            Expression::Assign { target, value } => self.compile_assign(target, value)?,
        }
        Ok(())
    }

    fn compile_infix(
        &mut self,
        op: InfixOp,
        left: &Expression,
        right: &Expression,
    ) -> Result<(), CompileError> {
        // `<` and `<=` have no dedicated opcode: swap the operands and
        // reuse OP_GT / OP_GTEQ instead.
        match op {
            InfixOp::Lt => {
                self.compile_expression(right)?;
                self.compile_expression(left)?;
                self.emit(Opcode::Gt, &[]);
                return Ok(());
            }
            InfixOp::LtEq => {
                self.compile_expression(right)?;
                self.compile_expression(left)?;
                self.emit(Opcode::GtEq, &[]);
                return Ok(());
            }
            _ => {}
        }

        self.compile_expression(left)?;
        self.compile_expression(right)?;
        let opcode = match op {
            InfixOp::Add => Opcode::Add,
            InfixOp::Sub => Opcode::Sub,
            InfixOp::Mul => Opcode::Mul,
            InfixOp::Div => Opcode::Div,
            InfixOp::Mod => Opcode::Mod,
            InfixOp::Eq => Opcode::Eq,
            InfixOp::NotEq => Opcode::NotEq,
            InfixOp::Gt => Opcode::Gt,
            InfixOp::GtEq => Opcode::GtEq,
            InfixOp::And => Opcode::And,
            InfixOp::Or => Opcode::Or,
            InfixOp::Lt | InfixOp::LtEq => unreachable!("handled above"),
        };
        self.emit(opcode, &[]);
        Ok(())
    }

    fn compile_if(
        &mut self,
        cond: &Expression,
        consequence: &[Statement],
        alternative: &Option<Vec<Statement>>,
    ) -> Result<(), CompileError> {
        self.compile_expression(cond)?;
        let jump_if_false_pos = self.emit(Opcode::JumpIfFalse, &[9999]);

        self.compile_statements(consequence)?;
        if self.last_instruction_is(Opcode::Pop) {
            self.remove_last_pop();
        } else {
            self.emit(Opcode::Null, &[]);
        }
        let jump_pos = self.emit(Opcode::Jump, &[9999]);

        let after_consequence = self.current_instructions().len();
        self.change_operand(jump_if_false_pos, after_consequence);

        match alternative {
            Some(alt) => {
                self.compile_statements(alt)?;
                if self.last_instruction_is(Opcode::Pop) {
                    self.remove_last_pop();
                } else {
                    self.emit(Opcode::Null, &[]);
                }
            }
            None => {
                self.emit(Opcode::Null, &[]);
            }
        }
        let after_alternative = self.current_instructions().len();
        self.change_operand(jump_pos, after_alternative);
        Ok(())
    }

    fn compile_assign(
        &mut self,
        target: &Expression,
        value: &Expression,
    ) -> Result<(), CompileError> {
        match target {
            Expression::Identifier(name) => {
                self.compile_expression(value)?;
                let symbol = self
                    .symbol_table
                    .resolve(name)
                    .ok_or_else(|| CompileError::UnknownIdentifier(name.clone()))?;
                match symbol.scope {
                    SymbolScope::Global | SymbolScope::Local => {
                        self.emit_set(&symbol);
                        Ok(())
                    }
                    // No OP_SET_FREE / OP_SET_BUILTIN / OP_SET_CURRENT_CLOSURE
                    // exists, so these bindings are read-only from Pepper's
                    // point of view.
                    SymbolScope::Free | SymbolScope::Builtin | SymbolScope::Function => {
                        Err(CompileError::InvalidAssignTarget)
                    }
                }
            }
            Expression::Index { left, index } => {
                self.compile_expression(value)?;
                self.compile_expression(left)?;
                self.compile_expression(index)?;
                self.emit(Opcode::SetIndex, &[]);
                Ok(())
            }
            _ => Err(CompileError::InvalidAssignTarget),
        }
    }

    fn emit_set(&mut self, symbol: &Symbol) {
        match symbol.scope {
            SymbolScope::Global => {
                self.emit(Opcode::SetGlobal, &[symbol.index]);
            }
            SymbolScope::Local => {
                self.emit(Opcode::SetLocal, &[symbol.index]);
            }
            _ => unreachable!("define() only ever produces Global or Local symbols"),
        };
    }

    fn load_symbol(&mut self, symbol: &Symbol) {
        match symbol.scope {
            SymbolScope::Global => {
                self.emit(Opcode::GetGlobal, &[symbol.index]);
            }
            SymbolScope::Local => {
                self.emit(Opcode::GetLocal, &[symbol.index]);
            }
            SymbolScope::Free => {
                self.emit(Opcode::GetFree, &[symbol.index]);
            }
            SymbolScope::Builtin => {
                self.emit(Opcode::GetBuiltin, &[symbol.index]);
            }
            SymbolScope::Function => {
                self.emit(Opcode::CurrentClosure, &[]);
            }
        };
    }

    // -- function compilation -------------------------------------------------

    /// Returns the constant-pool index of the new `CompiledFunction` and
    /// the number of free variables it captured, so the caller can emit
    /// `OP_CLOSURE const_idx num_free`.
    fn compile_function_literal(
        &mut self,
        name: Option<&str>,
        params: &[String],
        body: &[Statement],
    ) -> Result<(usize, usize), CompileError> {
        self.enter_function_scope();

        if let Some(name) = name {
            self.symbol_table.define_function_name(name);
        }

        let mut seen = HashSet::with_capacity(params.len());
        for param in params {
            if !seen.insert(param.as_str()) {
                return Err(CompileError::DuplicateParameter(param.clone()));
            }
            self.symbol_table.define(param);
        }

        self.compile_statements(body)?;
        self.finish_function_body();

        let popped = self.symbol_table.pop_scope();
        let instructions = self.leave_function_scope();

        let num_free = popped.free_symbols.len();
        for symbol in &popped.free_symbols {
            self.load_symbol(symbol);
        }

        let compiled = CompiledFunction {
            instructions: Rc::from(instructions.into_boxed_slice()),
            num_locals: popped.num_definitions,
            num_parameters: params.len(),
            name: name.map(str::to_string).unwrap_or_else(|| "<anonymous>".to_string()),
        };
        let const_idx = self.constants.len();
        debug!(name, num_free, const_idx, "compiled function literal");
        self.constants.push(Value::CompiledFunction(Rc::new(compiled)));
        Ok((const_idx, num_free))
    }

    /// Governs how a function body's last instruction becomes a return:
    /// a trailing expression statement's OP_POP is rewritten in place to
    /// OP_RETURN_VALUE; anything else that doesn't already end in a
    /// return gets an implicit `return null` appended.
    fn finish_function_body(&mut self) {
        if self.last_instruction_is(Opcode::Pop) {
            self.replace_last_pop_with_return_value();
        } else if !(self.last_instruction_is(Opcode::Return)
            || self.last_instruction_is(Opcode::ReturnValue))
        {
            self.emit(Opcode::Return, &[]);
        }
    }

    fn enter_function_scope(&mut self) {
        self.scopes.push(CompilationScope::default());
        self.symbol_table.push_scope();
    }

    /// Pops the compiler's instruction-buffer stack (not the symbol
    /// table's scope stack; the caller pops that separately via
    /// `symbol_table.pop_scope()` to read `free_symbols` first).
    fn leave_function_scope(&mut self) -> Vec<u8> {
        self.scopes
            .pop()
            .expect("enter_function_scope/leave_function_scope must pair up")
            .instructions
    }

    // -- instruction emission -------------------------------------------------

    fn current_instructions(&self) -> &Vec<u8> {
        &self.scopes.last().expect("at least one scope").instructions
    }

    fn current_instructions_mut(&mut self) -> &mut Vec<u8> {
        &mut self.scopes.last_mut().expect("at least one scope").instructions
    }

    fn emit(&mut self, op: Opcode, operands: &[usize]) -> usize {
        let bytes = code::make_instruction(op, operands);
        let pos = self.current_instructions().len();
        self.current_instructions_mut().extend_from_slice(&bytes);

        let scope = self.scopes.last_mut().expect("at least one scope");
        scope.previous_instruction = scope.last_instruction.take();
        scope.last_instruction = Some(EmittedInstruction { opcode: op, position: pos });
        pos
    }

    fn last_instruction_is(&self, op: Opcode) -> bool {
        self.scopes
            .last()
            .and_then(|scope| scope.last_instruction)
            .map(|emitted| emitted.opcode == op)
            .unwrap_or(false)
    }

    /// Elides a trailing OP_POP so a block's final expression statement
    /// yields a value instead of discarding it (used for if-expression
    /// branches).
    fn remove_last_pop(&mut self) {
        let scope = self.scopes.last_mut().expect("at least one scope");
        if let Some(last) = scope.last_instruction {
            scope.instructions.truncate(last.position);
            scope.last_instruction = scope.previous_instruction.take();
        }
    }

    /// OP_POP and OP_RETURN_VALUE are both single, operand-less bytes, so
    /// this is a same-size in-place overwrite.
    fn replace_last_pop_with_return_value(&mut self) {
        let scope = self.scopes.last_mut().expect("at least one scope");
        let position = scope
            .last_instruction
            .expect("replace_last_pop_with_return_value called with no emitted instruction")
            .position;
        scope.instructions[position] = Opcode::ReturnValue as u8;
        scope.last_instruction = Some(EmittedInstruction {
            opcode: Opcode::ReturnValue,
            position,
        });
    }

    /// Rewrites the operand of a previously emitted jump (or any
    /// single-2-byte-operand instruction) at `pos` to `operand`, used to
    /// back-patch forward jumps once their target is known.
    fn change_operand(&mut self, pos: usize, operand: usize) {
        let op = Opcode::from_byte(self.current_instructions()[pos])
            .expect("patch site holds a valid opcode");
        let new_instruction = code::make_instruction(op, &[operand]);
        let instructions = self.current_instructions_mut();
        instructions[pos..pos + new_instruction.len()].copy_from_slice(&new_instruction);
    }

    fn add_constant(&mut self, value: Value) -> usize {
        if let Some(key) = dedup_key(&value) {
            if let Some(&idx) = self.constant_index.get(&key) {
                return idx;
            }
            let idx = self.constants.len();
            self.constants.push(value);
            self.constant_index.insert(key, idx);
            idx
        } else {
            let idx = self.constants.len();
            self.constants.push(value);
            idx
        }
    }
}

fn dedup_key(value: &Value) -> Option<ConstKey> {
    match value {
        Value::Integer(n) => Some(ConstKey::Integer(*n)),
        Value::String(s) => Some(ConstKey::String(s.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::read_u16;
    use crate::parser;

    fn compile_source(source: &str) -> Bytecode {
        let ast = parser::parse(source).expect("source parses");
        let mut compiler = Compiler::new();
        compiler.compile_program(&ast).expect("source compiles");
        let (bytecode, _) = compiler.bytecode();
        bytecode
    }

    #[test]
    fn integer_literals_are_deduplicated() {
        let bytecode = compile_source("1; 1; 2;");
        assert_eq!(bytecode.constants.len(), 2);
    }

    #[test]
    fn less_than_compiles_via_operand_swap() {
        let bytecode = compile_source("1 < 2;");
        assert!(bytecode.instructions.contains(&(Opcode::Gt as u8)));
        assert!(!bytecode.instructions.contains(&(Opcode::Jump as u8)));
    }

    #[test]
    fn if_without_else_falls_back_to_null() {
        let bytecode = compile_source("if (false) { 1 };");
        // OP_NULL appears at least twice: once for the implicit alternative,
        // none needed for the consequence since it ends in an expression.
        assert!(bytecode.instructions.contains(&(Opcode::Null as u8)));
    }

    #[test]
    fn while_loop_jumps_back_to_condition() {
        let bytecode = compile_source("let i = 0; while (i < 5) { i = i + 1; }");
        assert!(bytecode.instructions.contains(&(Opcode::JumpIfFalse as u8)));
        assert!(bytecode.instructions.contains(&(Opcode::Jump as u8)));
    }

    #[test]
    fn break_outside_loop_is_a_compile_error() {
        let ast = parser::parse("break;").unwrap();
        let mut compiler = Compiler::new();
        assert_eq!(
            compiler.compile_program(&ast),
            Err(CompileError::BreakOutsideLoop)
        );
    }

    #[test]
    fn continue_outside_loop_is_a_compile_error() {
        let ast = parser::parse("continue;").unwrap();
        let mut compiler = Compiler::new();
        assert_eq!(
            compiler.compile_program(&ast),
            Err(CompileError::ContinueOutsideLoop)
        );
    }

    #[test]
    fn unknown_identifier_is_a_compile_error() {
        let ast = parser::parse("y;").unwrap();
        let mut compiler = Compiler::new();
        assert_eq!(
            compiler.compile_program(&ast),
            Err(CompileError::UnknownIdentifier("y".to_string()))
        );
    }

    #[test]
    fn assign_to_undefined_name_is_a_compile_error() {
        let ast = parser::parse("x = 5;").unwrap();
        let mut compiler = Compiler::new();
        assert_eq!(
            compiler.compile_program(&ast),
            Err(CompileError::UnknownIdentifier("x".to_string()))
        );
    }

    #[test]
    fn duplicate_parameter_names_are_rejected() {
        let ast = parser::parse("fn(a, a) { a };").unwrap();
        let mut compiler = Compiler::new();
        assert_eq!(
            compiler.compile_program(&ast),
            Err(CompileError::DuplicateParameter("a".to_string()))
        );
    }

    #[test]
    fn closure_captures_free_variable_through_one_level() {
        let bytecode = compile_source("let make = fn(x) { fn(y) { x + y } }; make(5);");
        assert!(bytecode.instructions.contains(&(Opcode::Closure as u8)));
        let has_function_constant = bytecode
            .constants
            .iter()
            .any(|c| matches!(c, Value::CompiledFunction(_)));
        assert!(has_function_constant);
    }

    #[test]
    fn jump_targets_are_within_instruction_bounds() {
        let bytecode = compile_source(
            "let i = 0; while (i < 3) { if (i == 1) { continue; } i = i + 1; }",
        );
        let len = bytecode.instructions.len();
        let mut ip = 0;
        while ip < len {
            let op = Opcode::from_byte(bytecode.instructions[ip]).expect("valid opcode");
            if op == Opcode::Jump || op == Opcode::JumpIfFalse {
                let target = read_u16(&bytecode.instructions, ip + 1) as usize;
                assert!(target <= len, "jump target {} out of bounds ({})", target, len);
            }
            let mut cursor = ip + 1;
            for width in op.operand_widths() {
                cursor += width;
            }
            ip = cursor;
        }
    }

    #[test]
    fn for_loop_continue_still_runs_post_statement() {
        // `s` should end up 0+1+2 = 3: if continue skipped `post`, the loop
        // would never terminate (i would never increment past 1).
        let bytecode = compile_source(
            "let s = 0; for (let i = 0; i < 3; i = i + 1) { if (i == 1) { continue; } s = s + i; }",
        );
        assert!(bytecode.instructions.contains(&(Opcode::Jump as u8)));
    }
}
