//! Arithmetic-logic unit.
//!
//! The ALU is wired directly to the A and B registers and is never loaded
//! from the bus. It only recomputes when the control unit asserts SO, and
//! can only float or drive.

use crate::binary::{arith, Bit, Byte};
use crate::cpu::device::{Device, DeviceError, DeviceId, TriState};
use serde::{Serialize, Deserialize};

/// Status flags produced by a computation.
///
/// ZERO and CARRY are never both set: a zero result suppresses the carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flags {
    /// Carry out of a non-zero result.
    pub carry: Bit,
    /// Result was zero.
    pub zero: Bit,
}

impl Flags {
    /// Flags for a result byte and the adder's final carry.
    pub fn from_result(result: &Byte, carry_out: Bit) -> Self {
        let zero = Bit::from_bool(result.is_zero());
        let carry = carry_out.and(zero.not());
        Self { carry, zero }
    }
}

/// The ALU and its last result.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Alu {
    mode: TriState,
    output: Byte,
    subtract: Bit,
    carry_in: Bit,
    carry_out: Bit,
}

impl Alu {
    /// Create an idle ALU in add mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the SU control line.
    pub fn set_subtract(&mut self, subtract: Bit) {
        self.subtract = subtract;
    }

    /// Current SU line.
    pub fn subtract(&self) -> Bit {
        self.subtract
    }

    /// Carry fed into the last computation.
    pub fn carry_in(&self) -> Bit {
        self.carry_in
    }

    /// Raw adder carry from the last computation.
    pub fn carry_out(&self) -> Bit {
        self.carry_out
    }

    /// Last computed result.
    pub fn output(&self) -> Byte {
        self.output
    }

    /// Derive a new output from the A and B register values.
    ///
    /// In subtract mode B is inverted and the carry seeded with 1, turning
    /// the adder into a two's-complement subtractor.
    pub fn compute(&mut self, a: &Byte, b: &Byte) -> Flags {
        let (result, carry_out) = if self.subtract.is_set() {
            self.carry_in = Bit::One;
            arith::ripple_subtract(a, b)
        } else {
            self.carry_in = Bit::Zero;
            arith::ripple_add(a, b, Bit::Zero)
        };
        self.output = result;
        self.carry_out = carry_out;

        Flags::from_result(&result, carry_out)
    }
}

impl Device for Alu {
    fn mode(&self) -> TriState {
        self.mode
    }

    fn set_mode(&mut self, mode: TriState) -> Result<(), DeviceError> {
        if mode == TriState::Read {
            return Err(DeviceError::InvalidMode { device: DeviceId::Alu, mode });
        }
        self.mode = mode;
        Ok(())
    }

    fn contents(&self) -> Byte {
        self.output
    }

    /// Never in READ mode, so there is nothing to latch.
    fn latch(&mut self, _value: Byte) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(a: u8, b: u8, subtract: bool) -> (u8, Flags) {
        let mut alu = Alu::new();
        alu.set_subtract(Bit::from_bool(subtract));
        let flags = alu.compute(&Byte::from_u8(a), &Byte::from_u8(b));
        (alu.output().to_u8(), flags)
    }

    #[test]
    fn test_add() {
        let (result, flags) = run(3, 2, false);
        assert_eq!(result, 5);
        assert_eq!(flags, Flags::default());
    }

    #[test]
    fn test_add_with_carry() {
        let (result, flags) = run(0xF0, 0x20, false);
        assert_eq!(result, 0x10);
        assert_eq!(flags.carry, Bit::One);
        assert_eq!(flags.zero, Bit::Zero);
    }

    #[test]
    fn test_zero_suppresses_carry() {
        // 0x80 + 0x80 = 0x100: carry out but a zero result
        let (result, flags) = run(0x80, 0x80, false);
        assert_eq!(result, 0);
        assert_eq!(flags.zero, Bit::One);
        assert_eq!(flags.carry, Bit::Zero);
    }

    #[test]
    fn test_subtract_borrow() {
        let (result, flags) = run(2, 3, true);
        assert_eq!(result, 0xFF);
        assert_eq!(flags, Flags::default());
    }

    #[test]
    fn test_subtract_equal_is_zero() {
        let (result, flags) = run(3, 3, true);
        assert_eq!(result, 0);
        assert_eq!(flags.zero, Bit::One);
        assert_eq!(flags.carry, Bit::Zero);
    }

    #[test]
    fn test_subtract_records_carry_in() {
        let mut alu = Alu::new();
        alu.set_subtract(Bit::One);
        alu.compute(&Byte::from_u8(5), &Byte::from_u8(1));
        assert_eq!(alu.carry_in(), Bit::One);
        assert_eq!(alu.carry_out(), Bit::One);
        assert_eq!(alu.output().to_u8(), 4);
    }

    #[test]
    fn test_read_mode_rejected() {
        let mut alu = Alu::new();
        alu.set_mode(TriState::Write).unwrap();
        let err = alu.set_mode(TriState::Read).unwrap_err();
        assert_eq!(err, DeviceError::InvalidMode { device: DeviceId::Alu, mode: TriState::Read });
        // State unchanged
        assert_eq!(alu.mode(), TriState::Write);
    }
}
