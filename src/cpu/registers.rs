//! The register family.
//!
//! Four kinds of register sit on the bus:
//! - [`Register`]: general purpose (A, B and the Output register O)
//! - [`AddressRegister`]: only its low 4 bits select a memory cell
//! - [`InstructionRegister`]: opcode in the high nibble, operand in the low
//! - [`ProgramCounter`]: an unsigned ripple counter

use crate::binary::{arith, Bit, Byte};
use crate::cpu::device::{Device, DeviceError, TriState};
use crate::cpu::memory::ADDRESS_WIDTH;
use serde::{Serialize, Deserialize};

/// A general-purpose 8-bit register.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Register {
    mode: TriState,
    storage: Byte,
}

impl Register {
    /// Create a floating register holding zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored value.
    #[inline]
    pub fn value(&self) -> Byte {
        self.storage
    }

    /// Overwrite the stored value without going through the bus.
    pub fn load(&mut self, value: Byte) {
        self.storage = value;
    }
}

impl Device for Register {
    fn mode(&self) -> TriState {
        self.mode
    }

    fn set_mode(&mut self, mode: TriState) -> Result<(), DeviceError> {
        self.mode = mode;
        Ok(())
    }

    fn contents(&self) -> Byte {
        self.storage
    }

    fn latch(&mut self, value: Byte) {
        self.storage = value;
    }
}

/// Memory address register.
///
/// Stores a full byte but only the low [`ADDRESS_WIDTH`] bits are
/// effective. The datapath repoints memory every time this latches.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AddressRegister {
    mode: TriState,
    storage: Byte,
}

impl AddressRegister {
    /// Create an address register selecting cell 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// The effective address (low 4 bits).
    #[inline]
    pub fn address(&self) -> usize {
        self.contents().to_u8() as usize
    }
}

impl Device for AddressRegister {
    fn mode(&self) -> TriState {
        self.mode
    }

    fn set_mode(&mut self, mode: TriState) -> Result<(), DeviceError> {
        self.mode = mode;
        Ok(())
    }

    fn contents(&self) -> Byte {
        self.storage.low_bits(ADDRESS_WIDTH)
    }

    fn latch(&mut self, value: Byte) {
        self.storage = value;
    }

    /// Only the effective bits go on the bus; the upper lines keep their level.
    fn drive(&self) -> Vec<Bit> {
        self.storage.bits()[Byte::WIDTH - ADDRESS_WIDTH..].to_vec()
    }
}

/// Instruction register.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InstructionRegister {
    mode: TriState,
    storage: Byte,
}

impl InstructionRegister {
    /// Create an empty instruction register.
    pub fn new() -> Self {
        Self::default()
    }

    /// High nibble.
    #[inline]
    pub fn opcode(&self) -> u8 {
        self.storage.high_nibble()
    }

    /// Low nibble.
    #[inline]
    pub fn operand(&self) -> u8 {
        self.storage.low_nibble()
    }
}

impl Device for InstructionRegister {
    fn mode(&self) -> TriState {
        self.mode
    }

    fn set_mode(&mut self, mode: TriState) -> Result<(), DeviceError> {
        self.mode = mode;
        Ok(())
    }

    fn contents(&self) -> Byte {
        self.storage
    }

    fn latch(&mut self, value: Byte) {
        self.storage = value;
    }

    /// Drives the operand zero-extended to a full byte, so both the address
    /// register and the program counter receive exactly the operand.
    fn drive(&self) -> Vec<Bit> {
        self.storage.low_bits(ADDRESS_WIDTH).bits().to_vec()
    }
}

/// Program counter.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProgramCounter {
    mode: TriState,
    storage: Byte,
}

impl ProgramCounter {
    /// Create a counter at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one, rippling the carry from the least significant bit.
    pub fn increment(&mut self) {
        arith::ripple_increment(&mut self.storage);
    }

    /// Unsigned value of the counter.
    #[inline]
    pub fn value(&self) -> u8 {
        self.storage.to_u8()
    }

    /// Set the counter without going through the bus.
    pub fn jump(&mut self, target: Byte) {
        self.storage = target;
    }
}

impl Device for ProgramCounter {
    fn mode(&self) -> TriState {
        self.mode
    }

    fn set_mode(&mut self, mode: TriState) -> Result<(), DeviceError> {
        self.mode = mode;
        Ok(())
    }

    fn contents(&self) -> Byte {
        self.storage
    }

    fn latch(&mut self, value: Byte) {
        self.storage = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_latch() {
        let mut reg = Register::new();
        reg.latch(Byte::from_u8(42));
        assert_eq!(reg.value().to_u8(), 42);
        assert_eq!(reg.drive(), Byte::from_u8(42).bits().to_vec());
    }

    #[test]
    fn test_address_register_masks() {
        let mut adr = AddressRegister::new();
        adr.latch(Byte::from_u8(0xA7));
        assert_eq!(adr.address(), 7);
        assert_eq!(adr.contents().to_u8(), 0x07);
        assert_eq!(adr.drive().len(), ADDRESS_WIDTH);
    }

    #[test]
    fn test_instruction_register_fields() {
        let mut ir = InstructionRegister::new();
        ir.latch(Byte::from_u8(0b1010_0101));
        assert_eq!(ir.opcode(), 0b1010);
        assert_eq!(ir.operand(), 0b0101);
        // Drives only the operand
        assert_eq!(ir.drive(), Byte::from_u8(0b0000_0101).bits().to_vec());
    }

    #[test]
    fn test_program_counter_increment() {
        let mut pc = ProgramCounter::new();
        pc.increment();
        pc.increment();
        pc.increment();
        assert_eq!(pc.value(), 3);
    }

    #[test]
    fn test_program_counter_full_wrap() {
        let mut pc = ProgramCounter::new();
        pc.jump(Byte::from_u8(77));
        for _ in 0..256 {
            pc.increment();
        }
        assert_eq!(pc.value(), 77);
    }

    #[test]
    fn test_default_mode_is_float() {
        assert_eq!(Register::new().mode(), TriState::Float);
        assert_eq!(ProgramCounter::new().mode(), TriState::Float);
    }
}
