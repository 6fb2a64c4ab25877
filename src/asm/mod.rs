//! Assembler, disassembler and program image files.
//!
//! This module provides:
//! - A two-pass assembler (text → [`Program`](crate::cpu::Program))
//! - A disassembler (bytes → readable text)
//! - A text image format for assembled programs

pub mod assembler;
pub mod disasm;
pub mod image;

pub use assembler::{assemble, AssemblerError};
pub use disasm::{disassemble, disassemble_instruction, disassemble_program};
pub use image::{format_image, load_image, parse_image, save_image, ImageError};
