//! Control lines and the microcode table.
//!
//! A control word is the set of pins asserted during one clock step. Words
//! are stored as bit sets, first pin in the most significant position, and
//! decoded into named [`Pin`]s before they reach the datapath.
//!
//! The table is indexed by opcode, then by flag variant
//! (`CARRY * 2 + ZERO`, so 0 = no flag, 1 = ZERO, 2 = CARRY), then by step.

use crate::cpu::decode::{DecodeError, Opcode};
use std::fmt;
use serde::{Serialize, Deserialize};

/// Named control lines, in word order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pin {
    /// A in (read bus)
    Ai,
    /// A out (drive bus)
    Ao,
    Bi,
    Bo,
    /// Output register in
    Oi,
    Oo,
    /// ALU out (compute and drive)
    So,
    /// ALU subtract
    Su,
    /// Memory address register in
    Mai,
    /// RAM in (store bus at selected cell)
    Ri,
    /// RAM out
    Ro,
    /// Program counter in (jump)
    Pci,
    Pco,
    /// Program counter count (increment)
    Pcc,
    /// Instruction register in
    Ii,
    /// Instruction register out (operand only)
    Io,
    /// End of instruction: reset the step counter
    Yld,
    /// Stop the clock
    Hlt,
}

impl Pin {
    pub const COUNT: usize = 18;

    pub const ALL: [Pin; Pin::COUNT] = [
        Pin::Ai, Pin::Ao, Pin::Bi, Pin::Bo, Pin::Oi, Pin::Oo,
        Pin::So, Pin::Su, Pin::Mai, Pin::Ri, Pin::Ro, Pin::Pci,
        Pin::Pco, Pin::Pcc, Pin::Ii, Pin::Io, Pin::Yld, Pin::Hlt,
    ];

    /// Pins that put a value on the bus.
    pub const DRIVERS: [Pin; 7] = [Pin::Ao, Pin::Bo, Pin::Oo, Pin::So, Pin::Ro, Pin::Pco, Pin::Io];

    /// This pin's bit inside a control word.
    #[inline]
    pub const fn mask(self) -> u32 {
        1 << (Pin::COUNT - 1 - self as usize)
    }

    /// Upper-case pin name as used in microcode listings.
    pub const fn name(self) -> &'static str {
        match self {
            Pin::Ai => "AI",
            Pin::Ao => "AO",
            Pin::Bi => "BI",
            Pin::Bo => "BO",
            Pin::Oi => "OI",
            Pin::Oo => "OO",
            Pin::So => "SO",
            Pin::Su => "SU",
            Pin::Mai => "MAI",
            Pin::Ri => "RI",
            Pin::Ro => "RO",
            Pin::Pci => "PCI",
            Pin::Pco => "PCO",
            Pin::Pcc => "PCC",
            Pin::Ii => "II",
            Pin::Io => "IO",
            Pin::Yld => "YLD",
            Pin::Hlt => "HLT",
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of asserted pins.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ControlWord(u32);

impl ControlWord {
    /// No pins asserted.
    pub const EMPTY: ControlWord = ControlWord(0);

    /// Encode a list of pins.
    pub const fn of(pins: &[Pin]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < pins.len() {
            bits |= pins[i].mask();
            i += 1;
        }
        ControlWord(bits)
    }

    /// Whether `pin` is part of this word.
    #[inline]
    pub const fn asserts(self, pin: Pin) -> bool {
        self.0 & pin.mask() != 0
    }

    /// Assert or release one pin.
    pub fn set(&mut self, pin: Pin, asserted: bool) {
        if asserted {
            self.0 |= pin.mask();
        } else {
            self.0 &= !pin.mask();
        }
    }

    /// Asserted pins in word order.
    pub fn pins(self) -> impl Iterator<Item = Pin> {
        Pin::ALL.into_iter().filter(move |pin| self.asserts(*pin))
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for ControlWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ControlWord({})", self)
    }
}

impl fmt::Display for ControlWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        let names: Vec<&str> = self.pins().map(Pin::name).collect();
        f.write_str(&names.join(" "))
    }
}

/// Number of flag variants each opcode has a sequence for.
pub const FLAG_VARIANTS: usize = 3;

/// Flag variant selected when ZERO is set.
pub const VARIANT_ZERO: usize = 1;

/// Flag variant selected when CARRY is set.
pub const VARIANT_CARRY: usize = 2;

use Pin::*;

const FETCH_ADDRESS: ControlWord = ControlWord::of(&[Pco, Mai]);
const FETCH_INSTRUCTION: ControlWord = ControlWord::of(&[Ro, Ii, Pcc]);
const OPERAND_ADDRESS: ControlWord = ControlWord::of(&[Io, Mai]);
const YIELD: ControlWord = ControlWord::of(&[Yld]);

const LDA: &[ControlWord] = &[
    FETCH_ADDRESS, FETCH_INSTRUCTION, OPERAND_ADDRESS,
    ControlWord::of(&[Ro, Ai]),
    YIELD,
];

const LDO: &[ControlWord] = &[
    FETCH_ADDRESS, FETCH_INSTRUCTION, OPERAND_ADDRESS,
    ControlWord::of(&[Ro, Oi]),
    YIELD,
];

const ADDA: &[ControlWord] = &[
    FETCH_ADDRESS, FETCH_INSTRUCTION, OPERAND_ADDRESS,
    ControlWord::of(&[Ro, Bi]),
    ControlWord::of(&[So, Ai]),
    YIELD,
];

const ADDO: &[ControlWord] = &[
    FETCH_ADDRESS, FETCH_INSTRUCTION, OPERAND_ADDRESS,
    ControlWord::of(&[Ro, Bi]),
    ControlWord::of(&[So, Oi]),
    YIELD,
];

const SUBA: &[ControlWord] = &[
    FETCH_ADDRESS, FETCH_INSTRUCTION, OPERAND_ADDRESS,
    ControlWord::of(&[Ro, Bi]),
    ControlWord::of(&[So, Ai, Su]),
    YIELD,
];

const SUBO: &[ControlWord] = &[
    FETCH_ADDRESS, FETCH_INSTRUCTION, OPERAND_ADDRESS,
    ControlWord::of(&[Ro, Bi]),
    ControlWord::of(&[So, Oi, Su]),
    YIELD,
];

const STOA: &[ControlWord] = &[
    FETCH_ADDRESS, FETCH_INSTRUCTION, OPERAND_ADDRESS,
    ControlWord::of(&[Ri, Ao]),
    YIELD,
];

const STOO: &[ControlWord] = &[
    FETCH_ADDRESS, FETCH_INSTRUCTION, OPERAND_ADDRESS,
    ControlWord::of(&[Ri, Oo]),
    YIELD,
];

const SWAB: &[ControlWord] = &[
    FETCH_ADDRESS, FETCH_INSTRUCTION, OPERAND_ADDRESS,
    ControlWord::of(&[Ao, Oi]),
    ControlWord::of(&[Bo, Ai]),
    ControlWord::of(&[Oo, Bi]),
    YIELD,
];

const SWAO: &[ControlWord] = &[
    FETCH_ADDRESS, FETCH_INSTRUCTION, OPERAND_ADDRESS,
    ControlWord::of(&[Ao, Bi]),
    ControlWord::of(&[Oo, Ai]),
    ControlWord::of(&[Bo, Oi]),
    YIELD,
];

/// Conditional jump whose condition does not hold.
const NO_JUMP: &[ControlWord] = &[FETCH_ADDRESS, FETCH_INSTRUCTION, YIELD];

/// Conditional jump whose condition holds: the operand replaces the PC.
const JUMP: &[ControlWord] = &[
    FETCH_ADDRESS, FETCH_INSTRUCTION,
    ControlWord::of(&[Io, Pci]),
    YIELD,
];

const HLT: &[ControlWord] = &[FETCH_ADDRESS, FETCH_INSTRUCTION, ControlWord::of(&[Hlt])];

/// `TABLE[opcode][flag variant]` is the step sequence of one instruction.
static TABLE: [[&[ControlWord]; FLAG_VARIANTS]; 13] = [
    [LDA, LDA, LDA],
    [LDO, LDO, LDO],
    [ADDA, ADDA, ADDA],
    [ADDO, ADDO, ADDO],
    [SUBA, SUBA, SUBA],
    [SUBO, SUBO, SUBO],
    [STOA, STOA, STOA],
    [STOO, STOO, STOO],
    [SWAB, SWAB, SWAB],
    [SWAO, SWAO, SWAO],
    [NO_JUMP, JUMP, NO_JUMP],
    [NO_JUMP, NO_JUMP, JUMP],
    [HLT, HLT, HLT],
];

/// The step sequence for an opcode under a flag variant.
pub fn sequence(opcode: Opcode, variant: usize) -> Result<&'static [ControlWord], DecodeError> {
    TABLE[opcode.nibble() as usize]
        .get(variant)
        .copied()
        .ok_or(DecodeError::InvalidFlagVariant {
            carry: (variant >> 1) as u8,
            zero: (variant & 1) as u8,
        })
}

/// Look up one microinstruction.
pub fn lookup(opcode: Opcode, variant: usize, step: usize) -> Result<ControlWord, DecodeError> {
    sequence(opcode, variant)?
        .get(step)
        .copied()
        .ok_or(DecodeError::StepOutOfRange { opcode, step })
}
