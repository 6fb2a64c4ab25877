//! Instruction set and instruction decoding.
//!
//! Every instruction is one byte: a 4-bit opcode in the high nibble and a
//! 4-bit operand (a memory address) in the low nibble. The opcode numbers
//! are a stable contract shared with the assembler.

use crate::binary::Byte;
use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The thirteen opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    /// A := [addr]
    Lda = 0b0000,
    /// O := [addr]
    Ldo = 0b0001,
    /// B := [addr]; A := A + B
    Adda = 0b0010,
    /// B := [addr]; O := A + B
    Addo = 0b0011,
    /// B := [addr]; A := A - B
    Suba = 0b0100,
    /// B := [addr]; O := A - B
    Subo = 0b0101,
    /// [addr] := A
    Stoa = 0b0110,
    /// [addr] := O
    Stoo = 0b0111,
    /// Swap A and B through O (O ends up holding the old A)
    Swab = 0b1000,
    /// Swap A and O through B (B ends up holding the old A)
    Swao = 0b1001,
    /// PC := addr if ZERO
    Jmpz = 0b1010,
    /// PC := addr if CARRY
    Jmpc = 0b1011,
    /// Stop the clock
    Hlt = 0b1100,
}

impl Opcode {
    /// All opcodes in numeric order.
    pub const ALL: [Opcode; 13] = [
        Opcode::Lda,
        Opcode::Ldo,
        Opcode::Adda,
        Opcode::Addo,
        Opcode::Suba,
        Opcode::Subo,
        Opcode::Stoa,
        Opcode::Stoo,
        Opcode::Swab,
        Opcode::Swao,
        Opcode::Jmpz,
        Opcode::Jmpc,
        Opcode::Hlt,
    ];

    /// Decode a 4-bit opcode.
    pub fn from_nibble(nibble: u8) -> Result<Self, DecodeError> {
        Self::ALL
            .get(nibble as usize)
            .copied()
            .ok_or(DecodeError::UndefinedOpcode(nibble))
    }

    /// Opcode number (high nibble of the instruction byte).
    #[inline]
    pub const fn nibble(self) -> u8 {
        self as u8
    }

    /// Assembler mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Lda => "LDA",
            Opcode::Ldo => "LDO",
            Opcode::Adda => "ADDA",
            Opcode::Addo => "ADDO",
            Opcode::Suba => "SUBA",
            Opcode::Subo => "SUBO",
            Opcode::Stoa => "STOA",
            Opcode::Stoo => "STOO",
            Opcode::Swab => "SWAB",
            Opcode::Swao => "SWAO",
            Opcode::Jmpz => "JMPZ",
            Opcode::Jmpc => "JMPC",
            Opcode::Hlt => "HLT",
        }
    }

    /// Look up a mnemonic, ignoring case.
    pub fn from_mnemonic(text: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(text))
    }

    /// Whether the low nibble means anything. The swaps and HLT ignore it.
    pub const fn takes_operand(self) -> bool {
        !matches!(self, Opcode::Swab | Opcode::Swao | Opcode::Hlt)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A decoded instruction byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Operation.
    pub opcode: Opcode,
    /// Memory address, 0-15.
    pub operand: u8,
}

impl Instruction {
    /// Build an instruction, keeping the low 4 bits of `operand`.
    pub fn new(opcode: Opcode, operand: u8) -> Self {
        Self { opcode, operand: operand & 0x0F }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.opcode.takes_operand() {
            write!(f, "{} 0x{:X}", self.opcode, self.operand)
        } else {
            write!(f, "{}", self.opcode)
        }
    }
}

/// Decode an instruction byte.
pub fn decode(byte: Byte) -> Result<Instruction, DecodeError> {
    let opcode = Opcode::from_nibble(byte.high_nibble())?;
    Ok(Instruction { opcode, operand: byte.low_nibble() })
}

/// Encode an instruction to its byte.
pub fn encode(instr: &Instruction) -> Byte {
    Byte::from_nibbles(instr.opcode.nibble(), instr.operand)
}

/// Errors that can occur while decoding instructions and microcode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("undefined opcode: {0:#06b}")]
    UndefinedOpcode(u8),

    #[error("no microcode branch for CARRY={carry} ZERO={zero}")]
    InvalidFlagVariant { carry: u8, zero: u8 },

    #[error("{opcode} has no microinstruction at step {step}")]
    StepOutOfRange { opcode: Opcode, step: usize },
}
