//! CPU emulation for the sap8 bus computer.
//!
//! This module implements the machine at the microarchitecture level:
//! - an 8-bit bus shared by tri-state devices
//! - registers A, B and O, a memory address register, an instruction
//!   register and a program counter
//! - a ripple-carry ALU wired to A and B
//! - 16 bytes of memory
//! - a microcoded control unit stepped by a two-edge clock

pub mod bus;
pub mod device;
pub mod registers;
pub mod alu;
pub mod memory;
pub mod clock;
pub mod decode;
pub mod microcode;
pub mod control;
pub mod datapath;
pub mod program;
pub mod computer;

pub use bus::{Bus, BusError};
pub use device::{Device, DeviceError, DeviceId, TriState};
pub use registers::{AddressRegister, InstructionRegister, ProgramCounter, Register};
pub use alu::{Alu, Flags};
pub use memory::{Memory, MemoryError};
pub use clock::{Clock, ClockState, Edge};
pub use decode::{decode, encode, DecodeError, Instruction, Opcode};
pub use microcode::{ControlWord, Pin};
pub use control::{ControlUnit, Event, MicroStep};
pub use datapath::Datapath;
pub use program::Program;
pub use computer::{Computer, MachineError, Snapshot};
