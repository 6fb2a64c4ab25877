//! # sap8 Emulator
//!
//! A microarchitecture-level emulator of a minimal 8-bit stored-program
//! computer in the style of the classic "simple as possible" breadboard
//! machines.
//!
//! Every device sits on one shared bus and is floating, reading or driving
//! at any moment. A microcoded control unit, stepped by the clock, asserts
//! the control lines that move bytes between them one step at a time.

pub mod binary;
pub mod cpu;
pub mod asm;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use binary::{Bit, Byte};
pub use cpu::{Computer, Event, MachineError, Opcode, Program, Snapshot};
pub use asm::{assemble, disassemble, AssemblerError, ImageError, load_image, save_image};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
