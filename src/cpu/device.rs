//! The tri-state device contract.
//!
//! Every unit attached to the bus is in one of three modes at any time:
//! floating (no effect), reading (latching whatever is on the bus) or
//! writing (driving its contents onto the bus). The datapath is the only
//! place that moves bytes between devices and the bus; a device just says
//! what it latches and what it drives.

use crate::binary::{Bit, Byte};
use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Bus connection mode of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TriState {
    /// Disconnected from the bus.
    #[default]
    Float,
    /// Latches the bus contents.
    Read,
    /// Drives the bus.
    Write,
}

impl TriState {
    /// Mode selected by an input/output control pin pair. Input wins.
    #[inline]
    pub fn from_pins(input: bool, output: bool) -> Self {
        if input {
            TriState::Read
        } else if output {
            TriState::Write
        } else {
            TriState::Float
        }
    }

    /// Upper-case mode name for displays.
    pub fn as_str(self) -> &'static str {
        match self {
            TriState::Float => "FLOAT",
            TriState::Read => "READ",
            TriState::Write => "WRITE",
        }
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Identifies each bus device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceId {
    Alu,
    A,
    B,
    Output,
    Memory,
    ProgramCounter,
    AddressRegister,
    InstructionRegister,
}

impl DeviceId {
    /// Order in which control pins are dispatched each clock edge.
    ///
    /// The ALU comes first so its result is on the bus before any register
    /// that reads it in the same step.
    pub const FAN_OUT: [DeviceId; 8] = [
        DeviceId::Alu,
        DeviceId::A,
        DeviceId::B,
        DeviceId::Output,
        DeviceId::Memory,
        DeviceId::ProgramCounter,
        DeviceId::AddressRegister,
        DeviceId::InstructionRegister,
    ];

    /// Order in which devices are attached to the bus when the machine is built.
    pub const ATTACH: [DeviceId; 8] = [
        DeviceId::A,
        DeviceId::B,
        DeviceId::Output,
        DeviceId::Memory,
        DeviceId::AddressRegister,
        DeviceId::Alu,
        DeviceId::ProgramCounter,
        DeviceId::InstructionRegister,
    ];

    /// Short name used in snapshots and logs.
    pub const fn name(self) -> &'static str {
        match self {
            DeviceId::Alu => "ALU",
            DeviceId::A => "A",
            DeviceId::B => "B",
            DeviceId::Output => "O",
            DeviceId::Memory => "RAM",
            DeviceId::ProgramCounter => "PC",
            DeviceId::AddressRegister => "ADR",
            DeviceId::InstructionRegister => "IR",
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared behaviour of everything attached to the bus.
pub trait Device {
    /// Current bus connection mode.
    fn mode(&self) -> TriState;

    /// Change the bus connection mode.
    ///
    /// The caller is responsible for running the state update that follows
    /// a mode change (latching or driving).
    fn set_mode(&mut self, mode: TriState) -> Result<(), DeviceError>;

    /// The value this device exposes, for snapshots and for readers of it.
    fn contents(&self) -> Byte;

    /// Take a value from the bus.
    fn latch(&mut self, value: Byte);

    /// Bits this device puts on the bus in WRITE mode, most significant first.
    ///
    /// Usually a full byte, but narrower devices drive fewer lines.
    fn drive(&self) -> Vec<Bit> {
        self.contents().bits().to_vec()
    }
}

/// Errors raised by devices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("{device} cannot enter {mode} mode")]
    InvalidMode { device: DeviceId, mode: TriState },
}
