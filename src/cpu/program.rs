//! Program images.
//!
//! A program is a run of instruction bytes loaded from address 0 plus any
//! number of single data bytes at arbitrary addresses.

use crate::binary::Byte;
use crate::cpu::memory::{Memory, MemoryError};
use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

/// Bytes to place in memory before the clock starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Bytes for addresses 0, 1, 2, ...
    pub instructions: Vec<Byte>,
    /// Bytes placed at individual addresses after the instructions are loaded.
    pub data: BTreeMap<usize, Byte>,
}

impl Program {
    /// A program with no sparse data.
    pub fn new(instructions: Vec<Byte>) -> Self {
        Self { instructions, data: BTreeMap::new() }
    }

    /// Add a data byte, replacing any earlier one at the same address.
    pub fn with_data(mut self, address: usize, value: Byte) -> Self {
        self.data.insert(address, value);
        self
    }

    /// Highest address the program touches, if any.
    pub fn end(&self) -> Option<usize> {
        let code_end = self.instructions.len().checked_sub(1);
        let data_end = self.data.keys().next_back().copied();
        code_end.max(data_end)
    }

    /// The byte a fresh memory would hold at `address` after loading.
    pub fn byte_at(&self, address: usize) -> Byte {
        self.data
            .get(&address)
            .or_else(|| self.instructions.get(address))
            .copied()
            .unwrap_or_default()
    }

    /// Write the program into memory.
    pub fn load_into(&self, memory: &mut Memory) -> Result<(), MemoryError> {
        memory.load_program(0, &self.instructions)?;
        for (address, value) in &self.data {
            memory.write(*address, *value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_into() {
        let program = Program::new(vec![Byte::from_u8(0x0F), Byte::from_u8(0xC0)])
            .with_data(15, Byte::from_u8(5));
        let mut mem = Memory::full();
        program.load_into(&mut mem).unwrap();
        assert_eq!(mem.read(0).unwrap().to_u8(), 0x0F);
        assert_eq!(mem.read(1).unwrap().to_u8(), 0xC0);
        assert_eq!(mem.read(15).unwrap().to_u8(), 5);
    }

    #[test]
    fn test_data_out_of_range() {
        let program = Program::new(vec![]).with_data(9, Byte::from_u8(1));
        let mut mem = Memory::new(3).unwrap();
        assert_eq!(
            program.load_into(&mut mem),
            Err(MemoryError::AddressOutOfRange { address: 9, size: 8 })
        );
    }

    #[test]
    fn test_end_and_byte_at() {
        let program = Program::new(vec![Byte::from_u8(1); 3]).with_data(12, Byte::from_u8(7));
        assert_eq!(program.end(), Some(12));
        assert_eq!(program.byte_at(2).to_u8(), 1);
        assert_eq!(program.byte_at(12).to_u8(), 7);
        assert_eq!(program.byte_at(5).to_u8(), 0);
        assert_eq!(Program::default().end(), None);
    }
}
