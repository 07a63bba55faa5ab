//! # Instruction set for the Titan bytecode VM
//!
//! This module enumerates every opcode the compiler emits and the VM
//! dispatches on, and centralizes the one fact both of them must agree on:
//! how many bytes a given opcode occupies in the code stream (the opcode
//! byte itself plus any inline operand bytes).
//!
//! Operands come in three widths, chosen by the compiler per emit site
//! based on how large the address/count actually is (see `compiler.rs`):
//! - no operand (constant, arithmetic, comparison ops)
//! - a single operand byte (short forms, indices up to 255)
//! - a 16-bit little-endian operand (`_W2`, up to 65535)
//! - a 32-bit little-endian operand (`_W4`, up to u32::MAX)
//!
//! `instruction_length` is the single source of truth for these widths. The
//! compiler reads it when computing jump back-patch offsets; the VM and the
//! disassembler read it when stepping over an instruction.

/// Width (in bytes) of an opcode's inline operand. Mirrors the width
/// selection the compiler performs when choosing which form of an
/// instruction to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandWidth {
    Byte,
    Word16,
    Word32,
}

impl OperandWidth {
    /// Number of bytes this width occupies in the code stream.
    pub fn byte_len(self) -> usize {
        match self {
            OperandWidth::Byte => 1,
            OperandWidth::Word16 => 2,
            OperandWidth::Word32 => 4,
        }
    }

    /// Largest value this width can encode.
    pub fn max_value(self) -> usize {
        match self {
            OperandWidth::Byte => 0xFF,
            OperandWidth::Word16 => 0xFFFF,
            OperandWidth::Word32 => 0xFFFF_FFFF,
        }
    }

    /// Choose the narrowest width that can hold `value`, or `None` if it
    /// exceeds the largest supported operand (`u32::MAX`).
    pub fn narrowest_for(value: usize) -> Option<OperandWidth> {
        if value <= 0xFF {
            Some(OperandWidth::Byte)
        } else if value <= 0xFFFF {
            Some(OperandWidth::Word16)
        } else if value <= 0xFFFF_FFFF {
            Some(OperandWidth::Word32)
        } else {
            None
        }
    }
}

/// The Titan instruction set.
///
/// Variants are grouped exactly as in the spec: 0-operand instructions,
/// 1-byte short forms, and their `_W2`/`_W4` wide counterparts. `repr(u8)`
/// so the discriminant is the on-the-wire byte value directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    // ----- 0-operand -----
    Add,
    Sub,
    Mul,
    Div,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Not,
    Negate,
    True,
    False,
    Null,
    Pop,
    Print,
    Return,
    // ----- 1-byte operand -----
    PopN,
    Constant,
    DefineGlobal,
    GetGlobal,
    SetGlobal,
    GetLocal,
    SetLocal,
    Jump,
    JumpBack,
    JumpIfFalse,
    JumpIfFalsePop,
    // ----- 16-bit wide forms -----
    ConstantW2,
    DefineGlobalW2,
    GetGlobalW2,
    SetGlobalW2,
    GetLocalW2,
    SetLocalW2,
    JumpW2,
    JumpBackW2,
    JumpIfFalseW2,
    JumpIfFalsePopW2,
    // ----- 32-bit wide forms -----
    ConstantW4,
    DefineGlobalW4,
    GetGlobalW4,
    SetGlobalW4,
    GetLocalW4,
    SetLocalW4,
    JumpW4,
    JumpBackW4,
    JumpIfFalseW4,
    JumpIfFalsePopW4,
}

/// One past the last valid opcode discriminant; used to size the static
/// length table and to bound-check `from_byte`.
const OPCODE_COUNT: u8 = Opcode::JumpIfFalsePopW4 as u8 + 1;

impl Opcode {
    /// Operand width for this opcode, or `None` if it takes no operand.
    pub fn operand_width(self) -> Option<OperandWidth> {
        use Opcode::*;
        match self {
            Add | Sub | Mul | Div | Equal | NotEqual | Greater | GreaterEqual | Less
            | LessEqual | Not | Negate | True | False | Null | Pop | Print | Return => None,

            PopN | Constant | DefineGlobal | GetGlobal | SetGlobal | GetLocal | SetLocal
            | Jump | JumpBack | JumpIfFalse | JumpIfFalsePop => Some(OperandWidth::Byte),

            ConstantW2 | DefineGlobalW2 | GetGlobalW2 | SetGlobalW2 | GetLocalW2 | SetLocalW2
            | JumpW2 | JumpBackW2 | JumpIfFalseW2 | JumpIfFalsePopW2 => Some(OperandWidth::Word16),

            ConstantW4 | DefineGlobalW4 | GetGlobalW4 | SetGlobalW4 | GetLocalW4 | SetLocalW4
            | JumpW4 | JumpBackW4 | JumpIfFalseW4 | JumpIfFalsePopW4 => Some(OperandWidth::Word32),
        }
    }

    /// Total encoded length of this opcode: the opcode byte itself plus any
    /// inline operand bytes. The one place the compiler and VM both defer
    /// to, so lengths never drift apart between emit and dispatch sites.
    pub fn instruction_length(self) -> usize {
        1 + self.operand_width().map(OperandWidth::byte_len).unwrap_or(0)
    }

    /// Decode an opcode from its raw byte. Panics on an out-of-range byte
    /// (a well-formed `Program` never contains one; a malformed one is a
    /// compiler bug, not a recoverable runtime condition).
    pub fn from_byte(byte: u8) -> Opcode {
        assert!(byte < OPCODE_COUNT, "invalid opcode byte {byte}");
        // SAFETY: `Opcode` is `repr(u8)` with discriminants `0..OPCODE_COUNT`
        // assigned in declaration order (no explicit values anywhere in the
        // enum), and `byte` was just checked to lie in that range.
        unsafe { std::mem::transmute::<u8, Opcode>(byte) }
    }

    /// Mnemonic name, used by the disassembler.
    pub fn name(self) -> &'static str {
        use Opcode::*;
        match self {
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            Div => "DIV",
            Equal => "EQUAL",
            NotEqual => "NOT_EQUAL",
            Greater => "GREATER",
            GreaterEqual => "GREATER_EQUAL",
            Less => "LESS",
            LessEqual => "LESS_EQUAL",
            Not => "NOT",
            Negate => "NEGATE",
            True => "TRUE",
            False => "FALSE",
            Null => "NULL",
            Pop => "POP",
            Print => "PRINT",
            Return => "RETURN",
            PopN => "POP_N",
            Constant => "CONSTANT",
            DefineGlobal => "DEFINE_GLOBAL",
            GetGlobal => "GET_GLOBAL",
            SetGlobal => "SET_GLOBAL",
            GetLocal => "GET_LOCAL",
            SetLocal => "SET_LOCAL",
            Jump => "JUMP",
            JumpBack => "JUMP_BACK",
            JumpIfFalse => "JUMP_IF_FALSE",
            JumpIfFalsePop => "JUMP_IF_FALSE_POP",
            ConstantW2 => "CONSTANT_W2",
            DefineGlobalW2 => "DEFINE_GLOBAL_W2",
            GetGlobalW2 => "GET_GLOBAL_W2",
            SetGlobalW2 => "SET_GLOBAL_W2",
            GetLocalW2 => "GET_LOCAL_W2",
            SetLocalW2 => "SET_LOCAL_W2",
            JumpW2 => "JUMP_W2",
            JumpBackW2 => "JUMP_BACK_W2",
            JumpIfFalseW2 => "JUMP_IF_FALSE_W2",
            JumpIfFalsePopW2 => "JUMP_IF_FALSE_POP_W2",
            ConstantW4 => "CONSTANT_W4",
            DefineGlobalW4 => "DEFINE_GLOBAL_W4",
            GetGlobalW4 => "GET_GLOBAL_W4",
            SetGlobalW4 => "SET_GLOBAL_W4",
            GetLocalW4 => "GET_LOCAL_W4",
            SetLocalW4 => "SET_LOCAL_W4",
            JumpW4 => "JUMP_W4",
            JumpBackW4 => "JUMP_BACK_W4",
            JumpIfFalseW4 => "JUMP_IF_FALSE_W4",
            JumpIfFalsePopW4 => "JUMP_IF_FALSE_POP_W4",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_roundtrip() {
        for byte in 0..OPCODE_COUNT {
            let op = Opcode::from_byte(byte);
            assert_eq!(op as u8, byte);
        }
    }

    #[test]
    fn widths_match_spec_partition() {
        assert_eq!(Opcode::Add.instruction_length(), 1);
        assert_eq!(Opcode::Constant.instruction_length(), 2);
        assert_eq!(Opcode::ConstantW2.instruction_length(), 3);
        assert_eq!(Opcode::ConstantW4.instruction_length(), 5);
    }

    #[test]
    fn narrowest_for_thresholds() {
        assert_eq!(OperandWidth::narrowest_for(0), Some(OperandWidth::Byte));
        assert_eq!(OperandWidth::narrowest_for(0xFF), Some(OperandWidth::Byte));
        assert_eq!(
            OperandWidth::narrowest_for(0x100),
            Some(OperandWidth::Word16)
        );
        assert_eq!(
            OperandWidth::narrowest_for(0xFFFF),
            Some(OperandWidth::Word16)
        );
        assert_eq!(
            OperandWidth::narrowest_for(0x1_0000),
            Some(OperandWidth::Word32)
        );
    }
}
