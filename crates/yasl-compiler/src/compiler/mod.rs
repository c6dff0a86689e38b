//! Bytecode compiler for YASL.
//!
//! Transforms the AST into module bytes that can be executed by the VM.
//!
//! # Module Structure
//!
//! - `bytecode`: Opcodes, operand layouts and selector tables
//! - `codegen`: Code generation from AST
//!   - `codegen::scope`: Slot allocation for globals, parameters and locals
//! - `disasm`: Decoding and listing of module bytes

pub mod bytecode;
pub mod codegen;
pub mod disasm;

pub use bytecode::{OpCode, OperandLayout};
pub use codegen::{Compiler, FunctionRecord, Scope, ScopeKind};
pub use disasm::{DecodedModule, Instruction, Operand, decode, disassemble};
