//! Code generation from AST to module bytes.
//!
//! This module contains the `Compiler` which transforms a parsed YASL
//! [`Program`] into the byte stream executed by the VM.
//!
//! Code is built bottom-up: every node first generates its children into
//! separate byte vectors, then uses their lengths to write relative branch
//! offsets before concatenating them. No instruction is ever patched after
//! it is emitted.
//!
//! ```text
//! if c { A } else { B }
//!
//!   <c>
//!   BRF_8  len(A) + 9     ; lands on <B>
//!   <A>
//!   BR_8   len(B)         ; lands after <B>
//!   <B>
//! ```

mod scope;


pub use scope::{Scope, ScopeKind};

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::ast::*;
use crate::compiler::bytecode::{
    BRANCH_SIZE, BUILTIN_APPEND, BUILTIN_FIND, BUILTIN_INSERT, HEADER_SIZE, OpCode,
    builtin_selector, method_selector, push_f64, push_i64,
};
use crate::error::{Error, Result};

/// A declared function, as seen by its call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord {
    /// Function name
    pub name: String,
    /// Offset of the first body byte within the module
    pub address: i64,
    /// Number of parameters
    pub params: u8,
    /// Frame size: parameters plus distinct locals
    pub locals: u8,
}

/// The function whose body is being compiled.
#[derive(Debug)]
pub struct FunctionFrame {
    name: String,
    scope: Scope,
}

/// Where a resolved variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Global(u8),
    Local(u8),
}

impl Slot {
    fn load(self) -> [u8; 2] {
        match self {
            Slot::Global(slot) => [OpCode::GLoad1.byte(), slot],
            Slot::Local(slot) => [OpCode::LLoad1.byte(), slot],
        }
    }

    fn store(self) -> [u8; 2] {
        match self {
            Slot::Global(slot) => [OpCode::GStore1.byte(), slot],
            Slot::Local(slot) => [OpCode::LStore1.byte(), slot],
        }
    }
}

/// Compiles AST to module bytes.
///
/// Globals, function records and function bodies persist across calls to
/// [`Compiler::compile`], so one instance can compile a program piece by
/// piece, as the REPL does.
pub struct Compiler {
    /// Global variable slots
    globals: Scope,
    /// Declared functions by name
    functions: FxHashMap<String, FunctionRecord>,
    /// Header placeholder followed by every function body so far
    header: Vec<u8>,
}

impl Compiler {
    /// Creates a new compiler.
    pub fn new() -> Self {
        Self {
            globals: Scope::global(),
            functions: FxHashMap::default(),
            header: vec![0; HEADER_SIZE],
        }
    }

    /// Returns the global scope.
    pub fn globals(&self) -> &Scope {
        &self.globals
    }

    /// Returns the record of a declared function.
    pub fn function(&self, name: &str) -> Option<&FunctionRecord> {
        self.functions.get(name)
    }

    /// Returns the current length of the header and function segment.
    pub fn header_len(&self) -> usize {
        self.header.len()
    }

    // ========================================================================
    // Main Compilation Entry Point
    // ========================================================================

    /// Compiles a program into a complete module.
    ///
    /// On error the compiler is left exactly as it was before the call.
    pub fn compile(&mut self, program: &Program) -> Result<Vec<u8>> {
        let globals = self.globals.clone();
        let functions = self.functions.clone();
        let header_len = self.header.len();

        match self.compile_program(program) {
            Ok(code) => Ok(self.assemble(code)),
            Err(e) => {
                self.globals = globals;
                self.functions = functions;
                self.header.truncate(header_len);
                Err(e)
            }
        }
    }

    fn compile_program(&mut self, program: &Program) -> Result<Vec<u8>> {
        let mut frame = None;
        let mut code = Vec::new();
        for stmt in &program.body {
            code.extend(self.compile_statement(stmt, &mut frame)?);
        }
        Ok(code)
    }

    /// Writes the header fields and joins header, code and `HALT`.
    fn assemble(&mut self, code: Vec<u8>) -> Vec<u8> {
        let header_len = self.header.len() as i64;
        let global_count = self.globals.size() as i64;
        self.header[0..8].copy_from_slice(&header_len.to_ne_bytes());
        self.header[8..16].copy_from_slice(&global_count.to_ne_bytes());

        let mut module = Vec::with_capacity(self.header.len() + code.len() + 1);
        module.extend_from_slice(&self.header);
        module.extend(code);
        module.push(OpCode::Halt.byte());

        debug!(
            header = header_len,
            globals = global_count,
            total = module.len(),
            "assembled module"
        );
        module
    }

    // ========================================================================
    // Statement Compilation
    // ========================================================================

    fn compile_statement(
        &mut self,
        stmt: &Statement,
        frame: &mut Option<FunctionFrame>,
    ) -> Result<Vec<u8>> {
        trace!(line = stmt.line(), "compiling statement");

        match stmt {
            Statement::Print(print) => {
                let mut code = self.compile_expression(&print.argument, frame)?;
                code.push(OpCode::Print.byte());
                Ok(code)
            }
            Statement::Expression(expr) => {
                let mut code = self.compile_expression(&expr.expression, frame)?;
                code.push(OpCode::Pop.byte());
                Ok(code)
            }
            Statement::Let(decl) => self.compile_let(decl, frame),
            Statement::If(stmt) => {
                let mut code = self.compile_expression(&stmt.test, frame)?;
                let then = self.compile_block(&stmt.consequent, frame)?;
                code.extend(branch(OpCode::Brf8, len(&then)));
                code.extend(then);
                Ok(code)
            }
            Statement::IfElse(stmt) => {
                let test = self.compile_expression(&stmt.test, frame)?;
                let then = self.compile_block(&stmt.consequent, frame)?;
                let otherwise = self.compile_statement(&stmt.alternate, frame)?;
                Ok(two_way(test, then, otherwise))
            }
            Statement::While(stmt) => {
                let mut code = self.compile_expression(&stmt.test, frame)?;
                let body = self.compile_block(&stmt.body, frame)?;
                // Back to the first byte of the condition
                let back = -(len(&code) + len(&body) + 2 * BRANCH_SIZE as i64);
                code.extend(branch(OpCode::Brf8, len(&body) + BRANCH_SIZE as i64));
                code.extend(body);
                code.extend(branch(OpCode::Br8, back));
                Ok(code)
            }
            Statement::Function(func) => {
                self.compile_function(func, frame)?;
                Ok(Vec::new())
            }
            Statement::Return(ret) => self.compile_return(ret, frame),
            Statement::Block(block) => self.compile_block(block, frame),
        }
    }

    fn compile_block(
        &mut self,
        block: &BlockStatement,
        frame: &mut Option<FunctionFrame>,
    ) -> Result<Vec<u8>> {
        let mut code = Vec::new();
        for stmt in &block.body {
            code.extend(self.compile_statement(stmt, frame)?);
        }
        Ok(code)
    }

    /// Compiles the initializer, then declares the name.
    fn compile_let(
        &mut self,
        decl: &LetStatement,
        frame: &mut Option<FunctionFrame>,
    ) -> Result<Vec<u8>> {
        let mut code = self.compile_expression(&decl.init, frame)?;
        let slot = match frame.as_mut() {
            Some(function) => Slot::Local(function.scope.declare(&decl.name, decl.line)?),
            None => Slot::Global(self.globals.declare(&decl.name, decl.line)?),
        };
        code.extend(slot.store());
        Ok(code)
    }

    /// Compiles a function body into the header segment.
    fn compile_function(
        &mut self,
        func: &FunctionDeclaration,
        frame: &mut Option<FunctionFrame>,
    ) -> Result<()> {
        if frame.is_some() {
            return Err(Error::NestedFunction {
                name: func.name.clone(),
                line: func.line,
            });
        }
        if self.functions.contains_key(&func.name) {
            return Err(Error::FunctionRedefinition {
                name: func.name.clone(),
                line: func.line,
            });
        }

        let mut scope = Scope::local();
        for param in &func.params {
            scope.declare_param(&param.name, param.line)?;
        }

        let overflow = || Error::SlotOverflow {
            name: func.name.clone(),
            line: func.line,
        };
        let params = u8::try_from(func.params.len()).map_err(|_| overflow())?;
        let locals = u8::try_from(func.params.len() + func.local_count()).map_err(|_| overflow())?;
        let address = self.header.len() as i64;

        debug!(name = %func.name, address, params, locals, "declaring function");

        // Registered before the body so recursive calls resolve
        self.functions.insert(
            func.name.clone(),
            FunctionRecord {
                name: func.name.clone(),
                address,
                params,
                locals,
            },
        );

        let mut inner = Some(FunctionFrame {
            name: func.name.clone(),
            scope,
        });
        let mut body = self.compile_block(&func.body, &mut inner)?;
        body.push(OpCode::NConst.byte());
        body.push(OpCode::Ret.byte());
        self.header.extend(body);
        Ok(())
    }

    fn compile_return(
        &mut self,
        ret: &ReturnStatement,
        frame: &mut Option<FunctionFrame>,
    ) -> Result<Vec<u8>> {
        let Some(current) = frame.as_ref() else {
            return Err(Error::ReturnOutsideFunction { line: ret.line });
        };

        // `return f(...)` inside `f` reuses the frame
        if let Expression::Call(call) = &ret.argument {
            if call.callee == current.name && builtin_selector(&call.callee).is_none() {
                let operands = self.call_operands(call)?;
                let mut code = self.compile_arguments(&call.arguments, frame)?;
                code.push(OpCode::TCall8.byte());
                code.extend(operands);
                return Ok(code);
            }
        }

        let mut code = self.compile_expression(&ret.argument, frame)?;
        code.push(OpCode::Ret.byte());
        Ok(code)
    }

    // ========================================================================
    // Expression Compilation
    // ========================================================================

    fn compile_expression(
        &mut self,
        expr: &Expression,
        frame: &mut Option<FunctionFrame>,
    ) -> Result<Vec<u8>> {
        match expr {
            Expression::Literal(lit) => Ok(compile_literal(&lit.value)),
            Expression::List(list) => {
                let mut code = vec![OpCode::NewList.byte()];
                for element in &list.elements {
                    code.push(OpCode::Dup.byte());
                    code.extend(self.compile_expression(element, frame)?);
                    code.extend(builtin_call(BUILTIN_APPEND));
                    code.push(OpCode::Pop.byte());
                }
                Ok(code)
            }
            Expression::Map(map) => {
                let mut code = vec![OpCode::NewTable.byte()];
                for (key, value) in &map.entries {
                    code.push(OpCode::Dup.byte());
                    code.extend(self.compile_expression(key, frame)?);
                    code.extend(self.compile_expression(value, frame)?);
                    code.extend(builtin_call(BUILTIN_INSERT));
                    code.push(OpCode::Pop.byte());
                }
                Ok(code)
            }
            Expression::Variable(id) => Ok(self.resolve(id, frame)?.load().to_vec()),
            Expression::Binary(bin) => {
                let mut code = self.compile_expression(&bin.left, frame)?;
                code.extend(self.compile_expression(&bin.right, frame)?);
                code.extend(binary_ops(bin.operator).iter().map(|op| op.byte()));
                Ok(code)
            }
            Expression::Unary(unary) => {
                let mut code = self.compile_expression(&unary.argument, frame)?;
                let op = match unary.operator {
                    UnaryOperator::Negate => OpCode::Neg,
                    UnaryOperator::Plus => OpCode::Pos,
                    UnaryOperator::Not => OpCode::Not,
                    UnaryOperator::Length => OpCode::Len,
                };
                code.push(op.byte());
                Ok(code)
            }
            Expression::Logical(logical) => {
                let left = self.compile_expression(&logical.left, frame)?;
                let right = self.compile_expression(&logical.right, frame)?;
                let op = match logical.operator {
                    LogicalOperator::And => OpCode::Brf8,
                    LogicalOperator::Or => OpCode::Brt8,
                };
                Ok(short_circuit(left, op, right))
            }
            Expression::Ternary(ternary) => {
                let test = self.compile_expression(&ternary.test, frame)?;
                let then = self.compile_expression(&ternary.consequent, frame)?;
                let otherwise = self.compile_expression(&ternary.alternate, frame)?;
                Ok(two_way(test, then, otherwise))
            }
            Expression::NullCoalesce(nc) => {
                let left = self.compile_expression(&nc.left, frame)?;
                let right = self.compile_expression(&nc.right, frame)?;
                Ok(short_circuit(left, OpCode::Brn8, right))
            }
            Expression::Index(index) => {
                let mut code = self.compile_expression(&index.object, frame)?;
                code.extend(self.compile_expression(&index.index, frame)?);
                code.extend(builtin_call(BUILTIN_FIND));
                Ok(code)
            }
            Expression::Assignment(assign) => self.compile_assignment(assign, frame),
            Expression::Call(call) => {
                // Builtins shadow user functions of the same name
                if let Some(selector) = builtin_selector(&call.callee) {
                    let mut code = self.compile_arguments(&call.arguments, frame)?;
                    code.push(OpCode::BCall8.byte());
                    push_i64(&mut code, selector);
                    return Ok(code);
                }
                let operands = self.call_operands(call)?;
                let mut code = self.compile_arguments(&call.arguments, frame)?;
                code.push(OpCode::Call8.byte());
                code.extend(operands);
                Ok(code)
            }
            Expression::MethodCall(call) => {
                let selector = method_selector(&call.method).ok_or_else(|| Error::UnknownMethod {
                    name: call.method.clone(),
                    line: call.line,
                })?;
                let mut code = self.compile_expression(&call.receiver, frame)?;
                code.extend(self.compile_arguments(&call.arguments, frame)?);
                code.push(OpCode::MCall8.byte());
                push_i64(&mut code, selector);
                Ok(code)
            }
        }
    }

    fn compile_assignment(
        &mut self,
        assign: &AssignmentExpression,
        frame: &mut Option<FunctionFrame>,
    ) -> Result<Vec<u8>> {
        match &assign.target {
            AssignmentTarget::Variable(id) => {
                let slot = self.resolve(id, frame)?;
                let mut code = self.compile_expression(&assign.value, frame)?;
                code.push(OpCode::Dup.byte());
                code.extend(slot.store());
                Ok(code)
            }
            // The insert builtin mutates the container and leaves it on the stack
            AssignmentTarget::Index(index) => {
                let mut code = self.compile_expression(&index.object, frame)?;
                code.extend(self.compile_expression(&index.index, frame)?);
                code.extend(self.compile_expression(&assign.value, frame)?);
                code.extend(builtin_call(BUILTIN_INSERT));
                Ok(code)
            }
        }
    }

    fn compile_arguments(
        &mut self,
        args: &[Expression],
        frame: &mut Option<FunctionFrame>,
    ) -> Result<Vec<u8>> {
        let mut code = Vec::new();
        for arg in args {
            code.extend(self.compile_expression(arg, frame)?);
        }
        Ok(code)
    }

    // ========================================================================
    // Utilities
    // ========================================================================

    /// Resolves a variable: the function frame first, then globals.
    fn resolve(&self, id: &Identifier, frame: &Option<FunctionFrame>) -> Result<Slot> {
        if let Some(slot) = frame.as_ref().and_then(|f| f.scope.lookup(&id.name)) {
            return Ok(Slot::Local(slot));
        }
        self.globals
            .lookup(&id.name)
            .map(Slot::Global)
            .ok_or_else(|| Error::UndeclaredVariable {
                name: id.name.clone(),
                line: id.line,
            })
    }

    /// Returns the `params addr locals` operand bytes for a user call.
    fn call_operands(&self, call: &CallExpression) -> Result<Vec<u8>> {
        let record = self
            .functions
            .get(&call.callee)
            .ok_or_else(|| Error::UndefinedFunction {
                name: call.callee.clone(),
                line: call.line,
            })?;

        if call.arguments.len() != usize::from(record.params) {
            return Err(Error::ArityMismatch {
                name: call.callee.clone(),
                expected: usize::from(record.params),
                found: call.arguments.len(),
                line: call.line,
            });
        }

        let mut operands = vec![record.params];
        push_i64(&mut operands, record.address);
        operands.push(record.locals);
        Ok(operands)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

fn len(code: &[u8]) -> i64 {
    code.len() as i64
}

fn branch(op: OpCode, offset: i64) -> Vec<u8> {
    let mut code = Vec::with_capacity(BRANCH_SIZE);
    code.push(op.byte());
    push_i64(&mut code, offset);
    code
}

fn builtin_call(selector: i64) -> Vec<u8> {
    let mut code = vec![OpCode::BCall8.byte()];
    push_i64(&mut code, selector);
    code
}

/// `test BRF_8 (len(then)+9) then BR_8 len(otherwise) otherwise`
fn two_way(mut test: Vec<u8>, then: Vec<u8>, otherwise: Vec<u8>) -> Vec<u8> {
    test.extend(branch(OpCode::Brf8, len(&then) + BRANCH_SIZE as i64));
    test.extend(then);
    test.extend(branch(OpCode::Br8, len(&otherwise)));
    test.extend(otherwise);
    test
}

/// `left DUP <op> (1+len(right)) POP right`: keeps `left` when `op` branches.
fn short_circuit(mut left: Vec<u8>, op: OpCode, right: Vec<u8>) -> Vec<u8> {
    left.push(OpCode::Dup.byte());
    left.extend(branch(op, 1 + len(&right)));
    left.push(OpCode::Pop.byte());
    left.extend(right);
    left
}

fn binary_ops(operator: BinaryOperator) -> &'static [OpCode] {
    match operator {
        BinaryOperator::Add => &[OpCode::Add],
        BinaryOperator::Subtract => &[OpCode::Sub],
        BinaryOperator::Multiply => &[OpCode::Mul],
        BinaryOperator::Divide => &[OpCode::FDiv],
        BinaryOperator::IntegerDivide => &[OpCode::IDiv],
        BinaryOperator::Modulo => &[OpCode::Mod],
        BinaryOperator::Concat => &[OpCode::Cnct],
        BinaryOperator::Equal => &[OpCode::Eq],
        BinaryOperator::NotEqual => &[OpCode::Eq, OpCode::Not],
        BinaryOperator::Identical => &[OpCode::Id],
        BinaryOperator::NotIdentical => &[OpCode::Id, OpCode::Not],
        BinaryOperator::Greater => &[OpCode::Gt],
        BinaryOperator::GreaterEqual => &[OpCode::Ge],
        BinaryOperator::Less => &[OpCode::Ge, OpCode::Not],
        BinaryOperator::LessEqual => &[OpCode::Gt, OpCode::Not],
    }
}

fn compile_literal(value: &Literal) -> Vec<u8> {
    let mut code = Vec::new();
    match value {
        Literal::Integer(n) => {
            let op = match n {
                -1 => OpCode::IConstM1,
                0 => OpCode::IConst0,
                1 => OpCode::IConst1,
                2 => OpCode::IConst2,
                3 => OpCode::IConst3,
                4 => OpCode::IConst4,
                5 => OpCode::IConst5,
                _ => {
                    code.push(OpCode::IConst.byte());
                    push_i64(&mut code, *n);
                    return code;
                }
            };
            code.push(op.byte());
        }
        Literal::Float(n) => {
            // -0.0 keeps its sign, so compare bit patterns for zero
            let op = if n.to_bits() == 0f64.to_bits() {
                OpCode::DConst0
            } else if *n == 1.0 {
                OpCode::DConst1
            } else if *n == 2.0 {
                OpCode::DConst2
            } else {
                code.push(OpCode::DConst.byte());
                push_f64(&mut code, *n);
                return code;
            };
            code.push(op.byte());
        }
        Literal::Boolean(true) => code.push(OpCode::BConstT.byte()),
        Literal::Boolean(false) => code.push(OpCode::BConstF.byte()),
        Literal::Undefined => code.push(OpCode::NConst.byte()),
        Literal::String(s) => {
            code.push(OpCode::NewStr.byte());
            push_i64(&mut code, s.len() as i64);
            code.extend_from_slice(s.as_bytes());
        }
    }
    code
}
