//! TUI debugger for the sap8 emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Edge, cycle and instruction stepping
//! - Device modes and contents, bus, flags and asserted pins
//! - Memory view with the selected cell highlighted
//! - Event log and PC breakpoints

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
