//! The shared 8-bit bus.
//!
//! The bus holds the current line levels and the list of devices attached
//! to it, in attachment order. It does not own the devices: after every
//! write the datapath walks [`Bus::attached`] and lets each device in READ
//! mode latch the new value before the writer regains control.

use crate::binary::{Bit, Byte};
use crate::cpu::device::DeviceId;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The bus lines and their observers.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Bus {
    lines: Byte,
    attached: Vec<DeviceId>,
}

impl Bus {
    /// Create a bus with all lines low and nothing attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device. Attaching twice has no effect.
    pub fn attach(&mut self, id: DeviceId) {
        if !self.attached.contains(&id) {
            self.attached.push(id);
        }
    }

    /// Attached devices in attachment order.
    pub fn attached(&self) -> &[DeviceId] {
        &self.attached
    }

    /// Copy of the current bus contents.
    #[inline]
    pub fn read(&self) -> Byte {
        self.lines
    }

    /// Drive `data` onto the low-order lines, leaving the upper lines as they were.
    ///
    /// Data wider than the bus is an overflow: its low-order 8 bits are still
    /// written and the error is returned for the caller to report.
    pub fn write(&mut self, data: &[Bit]) -> Result<(), BusError> {
        let width = data.len().min(Byte::WIDTH);
        let start = Byte::WIDTH - width;
        let source = &data[data.len() - width..];

        for (offset, bit) in source.iter().enumerate() {
            self.lines.set(start + offset, *bit);
        }

        if data.len() > Byte::WIDTH {
            return Err(BusError::Overflow { width: data.len() });
        }
        Ok(())
    }
}

/// Errors raised by bus writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("attempted to write {width} bits to an 8-bit bus")]
    Overflow { width: usize },
}
