//! Program image files.
//!
//! A simple text format:
//! - `bbbbbbbb` on a line fills the next sequential cell, starting at 0
//! - `@addr bbbbbbbb` places a byte at an explicit address (decimal or `0x` hex)
//! - Anything after `;` is a comment; blank lines are ignored
//!
//! Sequential lines must all come before the first `@` line.

use crate::binary::Byte;
use crate::asm::disasm::disassemble_instruction;
use crate::cpu::memory::MAX_CELLS;
use crate::cpu::program::Program;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Parse image text.
pub fn parse_image(text: &str) -> Result<Program, ImageError> {
    let mut program = Program::default();

    for (line_num, line) in text.lines().enumerate() {
        let line_num = line_num + 1;
        let content = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        }
        .trim();

        if content.is_empty() {
            continue;
        }

        if let Some(rest) = content.strip_prefix('@') {
            let (addr_text, bits) = rest.split_once(char::is_whitespace).ok_or_else(|| {
                ImageError::ParseError { line: line_num, message: "expected '@addr bbbbbbbb'".into() }
            })?;
            let address = parse_address(addr_text).ok_or_else(|| ImageError::ParseError {
                line: line_num,
                message: format!("invalid address '{}'", addr_text),
            })?;
            if address >= MAX_CELLS {
                return Err(ImageError::AddressOutOfRange { line: line_num, address });
            }
            program.data.insert(address, parse_byte(bits, line_num)?);
        } else {
            if !program.data.is_empty() {
                return Err(ImageError::ParseError {
                    line: line_num,
                    message: "sequential byte after an addressed one".into(),
                });
            }
            if program.instructions.len() >= MAX_CELLS {
                return Err(ImageError::AddressOutOfRange { line: line_num, address: MAX_CELLS });
            }
            program.instructions.push(parse_byte(content, line_num)?);
        }
    }

    Ok(program)
}

/// Render a program as image text.
pub fn format_image(program: &Program) -> String {
    let mut text = String::new();
    text.push_str("; sap8 program image\n");
    text.push_str(&format!(
        "; {} sequential bytes, {} addressed\n\n",
        program.instructions.len(),
        program.data.len()
    ));

    for (addr, byte) in program.instructions.iter().enumerate() {
        text.push_str(&format!("{} ; {:02} {}\n", byte, addr, disassemble_instruction(*byte)));
    }
    for (addr, byte) in &program.data {
        text.push_str(&format!("@{} {}\n", addr, byte));
    }
    text
}

/// Load an image file from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Program, ImageError> {
    let text = std::fs::read_to_string(path.as_ref()).map_err(|e| ImageError::IoError(e.to_string()))?;
    parse_image(&text)
}

/// Save an image file to disk.
pub fn save_image<P: AsRef<Path>>(path: P, program: &Program) -> Result<(), ImageError> {
    let mut file = std::fs::File::create(path.as_ref()).map_err(|e| ImageError::IoError(e.to_string()))?;
    file.write_all(format_image(program).as_bytes())
        .map_err(|e| ImageError::IoError(e.to_string()))
}

fn parse_address(text: &str) -> Option<usize> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

fn parse_byte(text: &str, line_num: usize) -> Result<Byte, ImageError> {
    Byte::parse(text).map_err(|e| ImageError::ParseError { line: line_num, message: e.to_string() })
}

/// Errors that can occur while reading or writing images.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("address {address} on line {line} is past the end of memory")]
    AddressOutOfRange { line: usize, address: usize },
}
