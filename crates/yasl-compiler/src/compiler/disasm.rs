//! Module disassembler.
//!
//! [`decode`] turns module bytes back into instructions; [`disassemble`]
//! renders them one per line:
//!
//! ```text
//! ; header 16 bytes, 1 global
//! main:
//!   0016  ICONST_2
//!   0017  GSTORE_1     0
//!   0019  GLOAD_1      0
//!   0021  ICONST_1
//!   0022  GT
//!   0023  BRF_8        3          ; -> 0035
//! ```

use std::fmt;

use crate::compiler::bytecode::{
    HEADER_SIZE, OpCode, OperandLayout, builtin_name, method_name, read_f64, read_i64,
};
use crate::error::{Error, Result};

/// A decoded operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand
    None,
    /// Variable slot
    Slot(u8),
    /// Integer constant
    Int(i64),
    /// Float constant
    Float(f64),
    /// Relative branch with its absolute target
    Branch {
        /// Offset as encoded
        offset: i64,
        /// Absolute module offset the branch lands on
        target: usize,
    },
    /// Builtin or method selector
    Selector(i64),
    /// String constant bytes
    Str(Vec<u8>),
    /// User call operands
    Call {
        /// Parameter count
        params: u8,
        /// Absolute address of the callee body
        address: i64,
        /// Frame size
        locals: u8,
    },
}

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Offset of the opcode byte within the module
    pub offset: usize,
    /// Total encoded size, opcode included
    pub size: usize,
    /// The opcode
    pub opcode: OpCode,
    /// The operand
    pub operand: Operand,
}

/// A decoded module.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedModule {
    /// Header length field: where top-level code starts
    pub header_len: usize,
    /// Global count field
    pub globals: i64,
    /// Every instruction after the fixed header, in order
    pub instructions: Vec<Instruction>,
}

impl DecodedModule {
    /// Instructions belonging to function bodies.
    pub fn functions(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter().filter(|i| i.offset < self.header_len)
    }

    /// Instructions of the top-level code, `HALT` included.
    pub fn main(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter().filter(|i| i.offset >= self.header_len)
    }

    /// Returns true if some instruction starts at `offset`.
    pub fn is_boundary(&self, offset: usize) -> bool {
        self.instructions
            .binary_search_by_key(&offset, |i| i.offset)
            .is_ok()
    }
}

fn bytecode_error(message: impl Into<String>, offset: usize) -> Error {
    Error::Bytecode {
        message: message.into(),
        offset,
    }
}

/// Decodes module bytes.
pub fn decode(module: &[u8]) -> Result<DecodedModule> {
    let header_len = read_i64(module, 0)
        .ok_or_else(|| bytecode_error("truncated header", 0))?;
    let globals = read_i64(module, 8).ok_or_else(|| bytecode_error("truncated header", 8))?;

    let header_len = usize::try_from(header_len)
        .ok()
        .filter(|&len| (HEADER_SIZE..=module.len()).contains(&len))
        .ok_or_else(|| bytecode_error(format!("invalid header length {}", header_len), 0))?;

    let mut instructions = Vec::new();
    let mut pos = HEADER_SIZE;
    while pos < module.len() {
        let instruction = decode_instruction(module, pos)?;
        pos += instruction.size;
        instructions.push(instruction);
    }

    Ok(DecodedModule {
        header_len,
        globals,
        instructions,
    })
}

fn decode_instruction(module: &[u8], offset: usize) -> Result<Instruction> {
    let byte = module[offset];
    let opcode = OpCode::from_byte(byte)
        .ok_or_else(|| bytecode_error(format!("unknown opcode 0x{:02X}", byte), offset))?;
    let at = offset + 1;
    let truncated = || bytecode_error(format!("truncated {} operand", opcode.mnemonic()), offset);

    let (operand, operand_size) = match opcode.layout() {
        OperandLayout::None => (Operand::None, 0),
        OperandLayout::Slot => {
            let slot = *module.get(at).ok_or_else(truncated)?;
            (Operand::Slot(slot), 1)
        }
        OperandLayout::Int => (Operand::Int(read_i64(module, at).ok_or_else(truncated)?), 8),
        OperandLayout::Float => (Operand::Float(read_f64(module, at).ok_or_else(truncated)?), 8),
        OperandLayout::Selector => (
            Operand::Selector(read_i64(module, at).ok_or_else(truncated)?),
            8,
        ),
        OperandLayout::Branch => {
            let relative = read_i64(module, at).ok_or_else(truncated)?;
            let end = at + 8;
            let target = i64::try_from(end)
                .ok()
                .and_then(|end| end.checked_add(relative))
                .and_then(|target| usize::try_from(target).ok())
                .filter(|&target| target <= module.len())
                .ok_or_else(|| bytecode_error("branch target out of range", offset))?;
            (
                Operand::Branch {
                    offset: relative,
                    target,
                },
                8,
            )
        }
        OperandLayout::Str => {
            let len = read_i64(module, at).ok_or_else(truncated)?;
            let bytes = usize::try_from(len)
                .ok()
                .and_then(|len| module.get(at + 8..(at + 8).checked_add(len)?))
                .ok_or_else(truncated)?;
            (Operand::Str(bytes.to_vec()), 8 + bytes.len())
        }
        OperandLayout::Call => {
            let params = *module.get(at).ok_or_else(truncated)?;
            let address = read_i64(module, at + 1).ok_or_else(truncated)?;
            let locals = *module.get(at + 9).ok_or_else(truncated)?;
            (
                Operand::Call {
                    params,
                    address,
                    locals,
                },
                10,
            )
        }
    };

    Ok(Instruction {
        offset,
        size: 1 + operand_size,
        opcode,
        operand,
    })
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}  {:<12}", self.offset, self.opcode.mnemonic())?;
        match &self.operand {
            Operand::None => Ok(()),
            Operand::Slot(slot) => write!(f, " {}", slot),
            Operand::Int(n) => write!(f, " {}", n),
            Operand::Float(n) => write!(f, " {:?}", n),
            Operand::Branch { offset, target } => write!(f, " {:<10} ; -> {:04}", offset, target),
            Operand::Selector(id) => {
                let name = match self.opcode {
                    OpCode::MCall8 => method_name(*id),
                    _ => builtin_name(*id),
                };
                write!(f, " {:<10} ; {}", id, name.unwrap_or("?"))
            }
            Operand::Str(bytes) => write!(f, " {:?}", String::from_utf8_lossy(bytes)),
            Operand::Call {
                params,
                address,
                locals,
            } => write!(f, " {} {:04} {}", params, address, locals),
        }
    }
}

/// Disassembles module bytes into a listing.
pub fn disassemble(module: &[u8]) -> Result<String> {
    let decoded = decode(module)?;
    let mut out = format!(
        "; header {} bytes, {} global{}\n",
        decoded.header_len,
        decoded.globals,
        if decoded.globals == 1 { "" } else { "s" }
    );

    let mut functions = decoded.functions().peekable();
    if functions.peek().is_some() {
        out.push_str("functions:\n");
        for instruction in functions {
            out.push_str(&format!("  {}\n", instruction));
        }
    }

    out.push_str("main:\n");
    for instruction in decoded.main() {
        out.push_str(&format!("  {}\n", instruction));
    }

    Ok(out)
}
