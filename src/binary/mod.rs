//! Binary number primitives.
//!
//! This module provides the core types the machine is built from:
//! - [`Bit`] - A single binary digit
//! - [`Byte`] - An 8-bit word (bus width, register width, memory cell)
//! - [`arith`] - Ripple-carry adder and ripple-toggle counter

mod bit;
mod byte;
pub mod arith;

pub use bit::Bit;
pub use byte::{Byte, ParseByteError};
pub use arith::{ripple_add, ripple_subtract, ripple_increment};
