//! Main memory.
//!
//! Memory is 2^pages bytes. The cell it reads or writes on the bus is the
//! one selected by the address register; memory never moves that pointer
//! itself.

use crate::binary::Byte;
use crate::cpu::device::{Device, DeviceError, TriState};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Number of address bits the address register exposes.
pub const ADDRESS_WIDTH: usize = 4;

/// Largest memory: one cell per effective address.
pub const MAX_CELLS: usize = 1 << ADDRESS_WIDTH;

/// Addressable byte array.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "MemoryImage")]
pub struct Memory {
    mode: TriState,
    cells: Vec<Byte>,
    address: usize,
}

impl Memory {
    /// Create a memory of `2^pages` zeroed cells.
    pub fn new(pages: usize) -> Result<Self, MemoryError> {
        if pages > ADDRESS_WIDTH {
            return Err(MemoryError::CapacityExceeded { pages, max: ADDRESS_WIDTH });
        }
        Ok(Self::with_cells(1 << pages))
    }

    /// The largest memory the address register can reach.
    pub fn full() -> Self {
        Self::with_cells(MAX_CELLS)
    }

    fn with_cells(len: usize) -> Self {
        Self {
            mode: TriState::Float,
            cells: vec![Byte::zero(); len],
            address: 0,
        }
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Currently selected cell index.
    #[inline]
    pub fn address(&self) -> usize {
        self.address
    }

    /// Point at a cell. Addresses beyond a small memory wrap around.
    pub fn select(&mut self, address: usize) {
        self.address = address % self.cells.len();
    }

    /// Read a cell by address.
    pub fn read(&self, addr: usize) -> Result<Byte, MemoryError> {
        self.cells
            .get(addr)
            .copied()
            .ok_or(MemoryError::AddressOutOfRange { address: addr, size: self.cells.len() })
    }

    /// Write a cell by address.
    pub fn write(&mut self, addr: usize, value: Byte) -> Result<(), MemoryError> {
        let size = self.cells.len();
        let cell = self
            .cells
            .get_mut(addr)
            .ok_or(MemoryError::AddressOutOfRange { address: addr, size })?;
        *cell = value;
        Ok(())
    }

    /// Copy bytes into consecutive cells starting at `start_addr`.
    pub fn load_program(&mut self, start_addr: usize, program: &[Byte]) -> Result<(), MemoryError> {
        let available = self.cells.len().saturating_sub(start_addr);
        if program.len() > available {
            return Err(MemoryError::ProgramTooLarge { size: program.len(), available });
        }

        self.cells[start_addr..start_addr + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// All cells in address order.
    pub fn cells(&self) -> &[Byte] {
        &self.cells
    }
}

impl Device for Memory {
    fn mode(&self) -> TriState {
        self.mode
    }

    fn set_mode(&mut self, mode: TriState) -> Result<(), DeviceError> {
        self.mode = mode;
        Ok(())
    }

    /// The selected cell.
    fn contents(&self) -> Byte {
        self.cells[self.address]
    }

    /// Overwrite the selected cell.
    fn latch(&mut self, value: Byte) {
        self.cells[self.address] = value;
    }
}

/// Unchecked serialized form of [`Memory`].
#[derive(Deserialize)]
struct MemoryImage {
    mode: TriState,
    cells: Vec<Byte>,
    address: usize,
}

impl TryFrom<MemoryImage> for Memory {
    type Error = MemoryError;

    /// Reject sizes `Memory::new` could not build and pointers past the end.
    fn try_from(image: MemoryImage) -> Result<Self, MemoryError> {
        let len = image.cells.len();
        if !len.is_power_of_two() || len > MAX_CELLS {
            return Err(MemoryError::InvalidSize { cells: len, max: MAX_CELLS });
        }
        if image.address >= len {
            return Err(MemoryError::AddressOutOfRange { address: image.address, size: len });
        }
        Ok(Self { mode: image.mode, cells: image.cells, address: image.address })
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|cell| !cell.is_zero()).count();

        f.debug_struct("Memory")
            .field("mode", &self.mode)
            .field("address", &self.address)
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &self.cells.len())
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("{pages} pages requested but the address register only reaches {max}")]
    CapacityExceeded { pages: usize, max: usize },

    #[error("memory address {address} out of range (size {size})")]
    AddressOutOfRange { address: usize, size: usize },

    #[error("{cells} cells is not a power of two up to {max}")]
    InvalidSize { cells: usize, max: usize },

    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sizes() {
        assert_eq!(Memory::new(4).unwrap().len(), 16);
        assert_eq!(Memory::new(2).unwrap().len(), 4);
        assert_eq!(Memory::new(0).unwrap().len(), 1);
    }

    #[test]
    fn test_capacity_exceeded() {
        let err = Memory::new(5).unwrap_err();
        assert_eq!(err, MemoryError::CapacityExceeded { pages: 5, max: 4 });
    }

    #[test]
    fn test_bus_side_uses_selected_cell() {
        let mut mem = Memory::full();
        mem.write(9, Byte::from_u8(99)).unwrap();
        mem.select(9);
        assert_eq!(mem.contents().to_u8(), 99);

        mem.latch(Byte::from_u8(7));
        assert_eq!(mem.read(9).unwrap().to_u8(), 7);
    }

    #[test]
    fn test_select_wraps_small_memory() {
        let mut mem = Memory::new(2).unwrap();
        mem.select(6);
        assert_eq!(mem.address(), 2);
    }

    #[test]
    fn test_out_of_range() {
        let mut mem = Memory::new(1).unwrap();
        assert!(mem.read(2).is_err());
        assert!(mem.write(2, Byte::zero()).is_err());
    }

    #[test]
    fn test_load_program() {
        let mut mem = Memory::full();
        let program = [Byte::from_u8(1), Byte::from_u8(2), Byte::from_u8(3)];
        mem.load_program(0, &program).unwrap();
        assert_eq!(mem.read(0).unwrap().to_u8(), 1);
        assert_eq!(mem.read(2).unwrap().to_u8(), 3);

        let too_big = vec![Byte::zero(); 17];
        assert_eq!(
            mem.load_program(0, &too_big),
            Err(MemoryError::ProgramTooLarge { size: 17, available: 16 })
        );
    }

    #[test]
    fn test_deserialize_checks_pointer_and_size() {
        let mut mem = Memory::new(2).unwrap();
        mem.select(3);
        let json = serde_json::to_string(&mem).unwrap();
        let back: Memory = serde_json::from_str(&json).unwrap();
        assert_eq!(back.address(), 3);
        assert_eq!(back.len(), 4);

        let past_end = json.replace("\"address\":3", "\"address\":4");
        assert!(serde_json::from_str::<Memory>(&past_end).is_err());

        let empty = r#"{"mode":"Float","cells":[],"address":0}"#;
        assert!(serde_json::from_str::<Memory>(empty).is_err());

        let odd = r#"{"mode":"Float","cells":["00000000","00000000","00000000"],"address":0}"#;
        assert!(serde_json::from_str::<Memory>(odd).is_err());
    }
}
