//! Instruction encoding and decoding.
//!
//! Every instruction is one 16-bit word. The low nibble selects the opcode
//! and the remaining 12 bits use one of two layouts:
//!
//! ```text
//! register format  (and or xor not sh add sub mul div comp)
//!   15    12 11     8 7      4 3      0
//!  [  r3    |  r2    |  r1    | opcode ]
//!
//! immediate format (li amc lwmc swmc piu apceq)
//!   15             8 7      4 3      0
//!  [   immediate   |  r2    | opcode ]
//! ```
//!
//! The immediate is sign-extended from 8 bits. Both layouts use all 16 bits,
//! so [`decode`] is total and `encode(decode(w)) == w` for every word.

use std::fmt;
use crate::word::Word;
use crate::cpu::registers::Reg;
use thiserror::Error;

/// Smallest immediate operand.
pub const IMMEDIATE_MIN: i16 = -128;

/// Largest immediate operand.
pub const IMMEDIATE_MAX: i16 = 127;

const OPCODE_MASK: u16 = 0x000F;
const R1_SHIFT: u16 = 4;
const R2_SHIFT_REGISTER: u16 = 8;
const R2_SHIFT_IMMEDIATE: u16 = 4;
const R3_SHIFT: u16 = 12;
const IMMEDIATE_SHIFT: u16 = 8;

/// Operand layout of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Three register selectors.
    Register,
    /// One register selector and an 8-bit immediate.
    Immediate,
}

/// The sixteen operations of the instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    And = 0,
    Or = 1,
    Xor = 2,
    Not = 3,
    Sh = 4,
    Add = 5,
    Sub = 6,
    Mul = 7,
    Div = 8,
    Comp = 9,
    Li = 10,
    Amc = 11,
    Lwmc = 12,
    Swmc = 13,
    Piu = 14,
    Apceq = 15,
}

impl Opcode {
    /// Every opcode, in tag order.
    pub const ALL: [Opcode; 16] = [
        Opcode::And, Opcode::Or, Opcode::Xor, Opcode::Not,
        Opcode::Sh, Opcode::Add, Opcode::Sub, Opcode::Mul,
        Opcode::Div, Opcode::Comp, Opcode::Li, Opcode::Amc,
        Opcode::Lwmc, Opcode::Swmc, Opcode::Piu, Opcode::Apceq,
    ];

    /// Assembler mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Xor => "xor",
            Opcode::Not => "not",
            Opcode::Sh => "sh",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Comp => "comp",
            Opcode::Li => "li",
            Opcode::Amc => "amc",
            Opcode::Lwmc => "lwmc",
            Opcode::Swmc => "swmc",
            Opcode::Piu => "piu",
            Opcode::Apceq => "apceq",
        }
    }

    /// Look up an opcode by mnemonic (case-insensitive).
    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        Opcode::ALL
            .into_iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(name))
    }

    /// The opcode selected by the low nibble of `bits`.
    ///
    /// All sixteen nibble values are assigned, so this never fails.
    pub const fn from_nibble(bits: u16) -> Opcode {
        Opcode::ALL[(bits & OPCODE_MASK) as usize]
    }

    /// The operand layout used by this opcode.
    pub const fn format(self) -> Format {
        match self {
            Opcode::Li
            | Opcode::Amc
            | Opcode::Lwmc
            | Opcode::Swmc
            | Opcode::Piu
            | Opcode::Apceq => Format::Immediate,
            _ => Format::Register,
        }
    }

    /// Numeric tag.
    #[inline]
    pub const fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        if u16::from(tag) > OPCODE_MASK {
            return Err(DecodeError::InvalidOpcode(tag));
        }
        Ok(Opcode::from_nibble(u16::from(tag)))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A decoded instruction.
///
/// Fields the opcode's [`Format`] does not use are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub r1: Reg,
    pub r2: Reg,
    pub r3: Reg,
    pub immediate: Word,
}

impl Instruction {
    /// A register-format instruction: `opcode r1, r2, r3`.
    pub fn register(opcode: Opcode, r1: Reg, r2: Reg, r3: Reg) -> Self {
        Self { opcode, r1, r2, r3, immediate: Word::ZERO }
    }

    /// An immediate-format instruction: `opcode r2, immediate`.
    pub fn immediate(opcode: Opcode, r2: Reg, immediate: i16) -> Self {
        Self {
            opcode,
            r1: Reg::default(),
            r2,
            r3: Reg::default(),
            immediate: Word::from(immediate),
        }
    }
}

/// Decode an instruction word. Every bit pattern decodes.
pub fn decode(word: Word) -> Instruction {
    let bits = word.to_bits();
    let opcode = Opcode::from_nibble(bits);

    match opcode.format() {
        Format::Register => Instruction::register(
            opcode,
            Reg::from_bits(bits >> R1_SHIFT),
            Reg::from_bits(bits >> R2_SHIFT_REGISTER),
            Reg::from_bits(bits >> R3_SHIFT),
        ),
        Format::Immediate => Instruction::immediate(
            opcode,
            Reg::from_bits(bits >> R2_SHIFT_IMMEDIATE),
            // Arithmetic shift of the high byte sign-extends it
            (bits as i16) >> IMMEDIATE_SHIFT,
        ),
    }
}

/// Encode an instruction record into a word.
///
/// Fields outside the opcode's format are ignored; the immediate is
/// truncated to 8 bits.
pub fn encode(instr: &Instruction) -> Word {
    let opcode = instr.opcode.tag() as u16;
    let bits = match instr.opcode.format() {
        Format::Register => {
            opcode
                | instr.r1.bits() << R1_SHIFT
                | instr.r2.bits() << R2_SHIFT_REGISTER
                | instr.r3.bits() << R3_SHIFT
        }
        Format::Immediate => {
            opcode
                | instr.r2.bits() << R2_SHIFT_IMMEDIATE
                | (instr.immediate.to_bits() & 0xFF) << IMMEDIATE_SHIFT
        }
    };
    Word::from_bits(bits)
}

/// Check whether an immediate fits the 8-bit field.
pub fn immediate_in_range(value: i64) -> bool {
    (IMMEDIATE_MIN as i64..=IMMEDIATE_MAX as i64).contains(&value)
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode: {0}")]
    InvalidOpcode(u8),
}
