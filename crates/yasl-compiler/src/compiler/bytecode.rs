//! Bytecode definitions.
//!
//! A module is a flat byte vector. Every instruction is one opcode byte
//! followed by a fixed operand layout (see [`OperandLayout`]). Multi-byte
//! operands are 8-byte native-endian values.

/// Size of the module header: header length, then global count.
pub const HEADER_SIZE: usize = 16;

/// Size of a branch instruction: opcode plus an `i64` offset.
pub const BRANCH_SIZE: usize = 9;

/// Operation codes for the VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // Constants
    /// Push undefined
    NConst = 0x01,
    /// Push false
    BConstF = 0x08,
    /// Push true
    BConstT = 0x09,
    /// Stop the VM
    Halt = 0x0F,
    /// Push the following `i64`
    IConst = 0x10,
    /// Push -1
    IConstM1 = 0x11,
    /// Push 0
    IConst0 = 0x12,
    /// Push 1
    IConst1 = 0x13,
    /// Push 2
    IConst2 = 0x14,
    /// Push 3
    IConst3 = 0x15,
    /// Push 4
    IConst4 = 0x16,
    /// Push 5
    IConst5 = 0x17,
    /// Push the following `f64`
    DConst = 0x1A,
    /// Push 0.0
    DConst0 = 0x1B,
    /// Push 1.0
    DConst1 = 0x1C,
    /// Push 2.0
    DConst2 = 0x1D,

    // Arithmetic and unary
    /// Add top two values
    Add = 0x60,
    /// Subtract
    Sub = 0x61,
    /// Multiply
    Mul = 0x62,
    /// Float division (`/`)
    FDiv = 0x64,
    /// Integer division (`//`)
    IDiv = 0x65,
    /// Modulo
    Mod = 0x66,
    /// Negate (unary minus)
    Neg = 0x67,
    /// Numeric identity (unary plus)
    Pos = 0x68,
    /// Logical not
    Not = 0x69,
    /// Length (`#`)
    Len = 0x6A,
    /// String concatenation (`||`)
    Cnct = 0x6B,

    // Comparison
    /// Greater than
    Gt = 0x72,
    /// Greater or equal
    Ge = 0x73,
    /// Equal (`==`)
    Eq = 0x74,
    /// Identical (`===`)
    Id = 0x76,

    // Containers and stack
    /// Push a string built from the following length and bytes
    NewStr = 0x9B,
    /// Push an empty map
    NewTable = 0x9C,
    /// Push an empty list
    NewList = 0x9D,
    /// Duplicate the top value
    Dup = 0xB8,
    /// Pop the top value
    Pop = 0xBF,

    // Branches
    /// Unconditional branch
    Br8 = 0xC0,
    /// Pop and branch if false
    Brf8 = 0xC1,
    /// Pop and branch if true
    Brt8 = 0xC2,
    /// Pop and branch if not undefined
    Brn8 = 0xC3,

    // Calls
    /// Call a builtin by selector
    BCall8 = 0xE4,
    /// Call a method on the receiver by selector
    MCall8 = 0xE5,
    /// Call a user function
    Call8 = 0xE9,
    /// Return from a function
    Ret = 0xEA,
    /// Self tail call, reusing the current frame
    TCall8 = 0xEB,

    // Variables and output
    /// Store to a global slot
    GStore1 = 0xF4,
    /// Load from a global slot
    GLoad1 = 0xF5,
    /// Store to a local slot
    LStore1 = 0xF6,
    /// Load from a local slot
    LLoad1 = 0xF7,
    /// Print the top value
    Print = 0xFF,
}

/// The operand bytes that follow an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandLayout {
    /// No operand
    None,
    /// One-byte variable slot
    Slot,
    /// `i64` constant
    Int,
    /// `f64` constant
    Float,
    /// `i64` relative offset, measured from the end of the instruction
    Branch,
    /// `i64` builtin or method selector
    Selector,
    /// `i64` byte length, then that many bytes
    Str,
    /// `u8` params, `i64` address, `u8` locals
    Call,
}

impl OpCode {
    /// Decodes an opcode byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        use OpCode::*;
        let op = match byte {
            0x01 => NConst,
            0x08 => BConstF,
            0x09 => BConstT,
            0x0F => Halt,
            0x10 => IConst,
            0x11 => IConstM1,
            0x12 => IConst0,
            0x13 => IConst1,
            0x14 => IConst2,
            0x15 => IConst3,
            0x16 => IConst4,
            0x17 => IConst5,
            0x1A => DConst,
            0x1B => DConst0,
            0x1C => DConst1,
            0x1D => DConst2,
            0x60 => Add,
            0x61 => Sub,
            0x62 => Mul,
            0x64 => FDiv,
            0x65 => IDiv,
            0x66 => Mod,
            0x67 => Neg,
            0x68 => Pos,
            0x69 => Not,
            0x6A => Len,
            0x6B => Cnct,
            0x72 => Gt,
            0x73 => Ge,
            0x74 => Eq,
            0x76 => Id,
            0x9B => NewStr,
            0x9C => NewTable,
            0x9D => NewList,
            0xB8 => Dup,
            0xBF => Pop,
            0xC0 => Br8,
            0xC1 => Brf8,
            0xC2 => Brt8,
            0xC3 => Brn8,
            0xE4 => BCall8,
            0xE5 => MCall8,
            0xE9 => Call8,
            0xEA => Ret,
            0xEB => TCall8,
            0xF4 => GStore1,
            0xF5 => GLoad1,
            0xF6 => LStore1,
            0xF7 => LLoad1,
            0xFF => Print,
            _ => return None,
        };
        Some(op)
    }

    /// Returns the opcode byte.
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Returns the assembler name of this opcode.
    pub fn mnemonic(self) -> &'static str {
        use OpCode::*;
        match self {
            NConst => "NCONST",
            BConstF => "BCONST_F",
            BConstT => "BCONST_T",
            Halt => "HALT",
            IConst => "ICONST",
            IConstM1 => "ICONST_M1",
            IConst0 => "ICONST_0",
            IConst1 => "ICONST_1",
            IConst2 => "ICONST_2",
            IConst3 => "ICONST_3",
            IConst4 => "ICONST_4",
            IConst5 => "ICONST_5",
            DConst => "DCONST",
            DConst0 => "DCONST_0",
            DConst1 => "DCONST_1",
            DConst2 => "DCONST_2",
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            FDiv => "FDIV",
            IDiv => "IDIV",
            Mod => "MOD",
            Neg => "NEG",
            Pos => "POS",
            Not => "NOT",
            Len => "LEN",
            Cnct => "CNCT",
            Gt => "GT",
            Ge => "GE",
            Eq => "EQ",
            Id => "ID",
            NewStr => "NEWSTR",
            NewTable => "NEWTABLE",
            NewList => "NEWLIST",
            Dup => "DUP",
            Pop => "POP",
            Br8 => "BR_8",
            Brf8 => "BRF_8",
            Brt8 => "BRT_8",
            Brn8 => "BRN_8",
            BCall8 => "BCALL_8",
            MCall8 => "MCALL_8",
            Call8 => "CALL_8",
            Ret => "RET",
            TCall8 => "TCALL_8",
            GStore1 => "GSTORE_1",
            GLoad1 => "GLOAD_1",
            LStore1 => "LSTORE_1",
            LLoad1 => "LLOAD_1",
            Print => "PRINT",
        }
    }

    /// Returns the operand layout that follows this opcode.
    pub fn layout(self) -> OperandLayout {
        use OpCode::*;
        match self {
            IConst => OperandLayout::Int,
            DConst => OperandLayout::Float,
            NewStr => OperandLayout::Str,
            Br8 | Brf8 | Brt8 | Brn8 => OperandLayout::Branch,
            BCall8 | MCall8 => OperandLayout::Selector,
            Call8 | TCall8 => OperandLayout::Call,
            GStore1 | GLoad1 | LStore1 | LLoad1 => OperandLayout::Slot,
            _ => OperandLayout::None,
        }
    }
}

/// Selector of the `insert` builtin.
pub const BUILTIN_INSERT: i64 = 6;
/// Selector of the `find` builtin.
pub const BUILTIN_FIND: i64 = 7;
/// Selector of the `append` builtin.
pub const BUILTIN_APPEND: i64 = 8;

/// Builtin functions, by selector.
pub const BUILTINS: &[(&str, i64)] = &[
    ("upcase", 0),
    ("downcase", 1),
    ("isalnum", 2),
    ("isal", 3),
    ("isnum", 4),
    ("isspace", 5),
    ("insert", BUILTIN_INSERT),
    ("find", BUILTIN_FIND),
    ("append", BUILTIN_APPEND),
    ("print", 9),
    ("input", 10),
    ("open", 11),
    ("popen", 12),
];

/// Methods callable with `receiver.name(...)`, by selector.
pub const METHODS: &[(&str, i64)] = &[
    ("tofloat64", 0),
    ("toint64", 1),
    ("tobool", 2),
    ("tostr", 3),
    ("upcase", 4),
    ("downcase", 5),
    ("isalnum", 6),
    ("isal", 7),
    ("isnum", 8),
    ("isspace", 9),
    ("startswith", 10),
    ("endswith", 11),
    ("search", 12),
    ("split", 13),
    ("append", 14),
    ("keys", 15),
    ("values", 16),
];

fn selector(table: &[(&str, i64)], name: &str) -> Option<i64> {
    table.iter().find(|(n, _)| *n == name).map(|&(_, id)| id)
}

fn selector_name(table: &[(&'static str, i64)], id: i64) -> Option<&'static str> {
    table.iter().find(|(_, i)| *i == id).map(|&(name, _)| name)
}

/// Returns the selector of a builtin function.
pub fn builtin_selector(name: &str) -> Option<i64> {
    selector(BUILTINS, name)
}

/// Returns the selector of a method.
pub fn method_selector(name: &str) -> Option<i64> {
    selector(METHODS, name)
}

/// Returns the builtin name for a selector.
pub fn builtin_name(id: i64) -> Option<&'static str> {
    selector_name(BUILTINS, id)
}

/// Returns the method name for a selector.
pub fn method_name(id: i64) -> Option<&'static str> {
    selector_name(METHODS, id)
}

/// Appends an `i64` in module byte order.
pub fn push_i64(code: &mut Vec<u8>, value: i64) {
    code.extend_from_slice(&value.to_ne_bytes());
}

/// Appends an `f64` in module byte order.
pub fn push_f64(code: &mut Vec<u8>, value: f64) {
    code.extend_from_slice(&value.to_ne_bytes());
}

/// Reads an `i64` at `offset`, if enough bytes remain.
pub fn read_i64(code: &[u8], offset: usize) -> Option<i64> {
    let bytes = code.get(offset..offset.checked_add(8)?)?;
    bytes.try_into().ok().map(i64::from_ne_bytes)
}

/// Reads an `f64` at `offset`, if enough bytes remain.
pub fn read_f64(code: &[u8], offset: usize) -> Option<f64> {
    let bytes = code.get(offset..offset.checked_add(8)?)?;
    bytes.try_into().ok().map(f64::from_ne_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_bytes_round_trip() {
        for byte in 0..=u8::MAX {
            if let Some(op) = OpCode::from_byte(byte) {
                assert_eq!(op.byte(), byte, "{}", op.mnemonic());
            }
        }
    }

    #[test]
    fn test_external_opcode_values() {
        assert_eq!(OpCode::Halt.byte(), 0x0F);
        assert_eq!(OpCode::IConst2.byte(), 0x14);
        assert_eq!(OpCode::Brf8.byte(), 0xC1);
        assert_eq!(OpCode::Call8.byte(), 0xE9);
        assert_eq!(OpCode::GStore1.byte(), 0xF4);
        assert_eq!(OpCode::Print.byte(), 0xFF);
    }

    #[test]
    fn test_unassigned_bytes_do_not_decode() {
        assert_eq!(OpCode::from_byte(0x00), None);
        assert_eq!(OpCode::from_byte(0x63), None);
        assert_eq!(OpCode::from_byte(0x75), None);
    }

    #[test]
    fn test_layouts() {
        assert_eq!(OpCode::Add.layout(), OperandLayout::None);
        assert_eq!(OpCode::IConst.layout(), OperandLayout::Int);
        assert_eq!(OpCode::Brn8.layout(), OperandLayout::Branch);
        assert_eq!(OpCode::TCall8.layout(), OperandLayout::Call);
        assert_eq!(OpCode::LLoad1.layout(), OperandLayout::Slot);
    }

    #[test]
    fn test_selectors() {
        assert_eq!(builtin_selector("insert"), Some(6));
        assert_eq!(builtin_selector("print"), Some(9));
        assert_eq!(builtin_selector("tostr"), None);
        assert_eq!(method_selector("tostr"), Some(3));
        assert_eq!(method_selector("values"), Some(16));
        assert_eq!(builtin_name(7), Some("find"));
        assert_eq!(method_name(13), Some("split"));
        assert_eq!(method_name(99), None);
    }

    #[test]
    fn test_read_helpers_check_bounds() {
        let mut code = Vec::new();
        push_i64(&mut code, -42);
        push_f64(&mut code, 1.5);
        assert_eq!(read_i64(&code, 0), Some(-42));
        assert_eq!(read_f64(&code, 8), Some(1.5));
        assert_eq!(read_i64(&code, 9), None);
        assert_eq!(read_i64(&code, usize::MAX), None);
    }
}
