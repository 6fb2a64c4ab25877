//! Two-pass assembler for sap8 programs.
//!
//! Syntax:
//! ```text
//! ; Comment
//! LOOP:           ; Define a label
//!     LDA X       ; Load from the address of X
//!     SUBA ONE    ; A := A - [ONE]
//!     JMPZ DONE   ; Jump if the result was zero
//!     HLT
//!
//!     ORG 14      ; Set origin address
//! ONE: DAT 1      ; Define data value
//! X:   DAT 0x03
//! ```
//!
//! Operands are decimal, `0x` hex, `0b` binary or a label. Instruction
//! operands are memory addresses (0-15) and default to 0 when omitted.
//! SWAB, SWAO and HLT take none. `DAT` takes 0..=255 or -128..=-1.

use crate::binary::Byte;
use crate::cpu::decode::{encode, Instruction, Opcode};
use crate::cpu::memory::MAX_CELLS;
use crate::cpu::program::Program;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Assemble source code into a program.
pub fn assemble(source: &str) -> Result<Program, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// A label use waiting for the label's address.
struct Pending {
    address: usize,
    label: String,
    line: usize,
    /// `DAT` stores the whole address; instructions put it in the low nibble.
    data: bool,
}

struct Assembler {
    current_addr: usize,
    /// Label -> address.
    symbols: HashMap<String, usize>,
    pending: Vec<Pending>,
    cells: BTreeMap<usize, Byte>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            current_addr: 0,
            symbols: HashMap::new(),
            pending: Vec::new(),
            cells: BTreeMap::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Program, AssemblerError> {
        // Pass 1: emit code, recording label uses
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: patch label uses
        self.resolve_references()?;

        Ok(self.program())
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let line = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        }
        .trim();

        if line.is_empty() {
            return Ok(());
        }

        if let Some(colon_idx) = line.find(':') {
            let label = line[..colon_idx].trim().to_uppercase();
            if !is_identifier(&label) {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("invalid label '{}'", label),
                });
            }
            if self.symbols.insert(label.clone(), self.current_addr).is_some() {
                return Err(AssemblerError::DuplicateLabel { line: line_num, label });
            }

            let rest = line[colon_idx + 1..].trim();
            if !rest.is_empty() {
                return self.process_statement(rest, line_num);
            }
            return Ok(());
        }

        self.process_statement(line, line_num)
    }

    fn process_statement(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let mnemonic = parts[0].to_uppercase();
        let operand = match parts.len() {
            1 => None,
            2 => Some(parts[1]),
            _ => {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: "too many operands".into(),
                })
            }
        };

        match mnemonic.as_str() {
            "ORG" => {
                let operand = require(operand, "ORG requires an address", line_num)?;
                let addr = self.parse_number(operand, line_num)?;
                if !(0..MAX_CELLS as i32).contains(&addr) {
                    return Err(AssemblerError::ValueOutOfRange { line: line_num, value: addr });
                }
                self.current_addr = addr as usize;
            }

            "DAT" | "DATA" => {
                let operand = require(operand, "DAT requires a value", line_num)?;
                let value = match self.parse_operand_value(operand, true, line_num)? {
                    // Negative values are stored in two's complement
                    v @ -128..=255 => (v & 0xFF) as u8,
                    v => return Err(AssemblerError::ValueOutOfRange { line: line_num, value: v }),
                };
                self.emit(Byte::from_u8(value), line_num)?;
            }

            _ => {
                let opcode = Opcode::from_mnemonic(&mnemonic).ok_or_else(|| {
                    AssemblerError::UnknownMnemonic { line: line_num, mnemonic: mnemonic.clone() }
                })?;
                let instr = self.parse_instruction(opcode, operand, line_num)?;
                self.emit(encode(&instr), line_num)?;
            }
        }

        Ok(())
    }

    fn parse_instruction(
        &mut self,
        opcode: Opcode,
        operand: Option<&str>,
        line_num: usize,
    ) -> Result<Instruction, AssemblerError> {
        if !opcode.takes_operand() {
            if operand.is_some() {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("{} takes no operand", opcode),
                });
            }
            return Ok(Instruction::new(opcode, 0));
        }

        // A bare mnemonic addresses cell 0
        let Some(operand) = operand else {
            return Ok(Instruction::new(opcode, 0));
        };
        let addr = self.parse_operand_value(operand, false, line_num)?;
        if !(0..MAX_CELLS as i32).contains(&addr) {
            return Err(AssemblerError::ValueOutOfRange { line: line_num, value: addr });
        }
        Ok(Instruction::new(opcode, addr as u8))
    }

    /// A number, or a label whose address is patched in pass 2 (reads as 0 until then).
    fn parse_operand_value(&mut self, operand: &str, data: bool, line_num: usize) -> Result<i32, AssemblerError> {
        if starts_numeric(operand) {
            return self.parse_number(operand, line_num);
        }

        let label = operand.to_uppercase();
        if !is_identifier(&label) {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("invalid operand '{}'", operand),
            });
        }
        self.pending.push(Pending { address: self.current_addr, label, line: line_num, data });
        Ok(0)
    }

    fn parse_number(&self, operand: &str, line_num: usize) -> Result<i32, AssemblerError> {
        let (negative, digits) = match operand.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, operand),
        };
        let lower = digits.to_ascii_lowercase();
        let parsed = if let Some(hex) = lower.strip_prefix("0x") {
            i32::from_str_radix(hex, 16)
        } else if let Some(bin) = lower.strip_prefix("0b") {
            i32::from_str_radix(bin, 2)
        } else {
            lower.parse::<i32>()
        };

        parsed
            .map(|value| if negative { -value } else { value })
            .map_err(|_| AssemblerError::SyntaxError {
                line: line_num,
                message: format!("invalid number '{}'", operand),
            })
    }

    fn emit(&mut self, value: Byte, line_num: usize) -> Result<(), AssemblerError> {
        if self.current_addr >= MAX_CELLS {
            return Err(AssemblerError::AddressOutOfRange { line: line_num, address: self.current_addr });
        }
        if self.cells.insert(self.current_addr, value).is_some() {
            return Err(AssemblerError::Overlap { line: line_num, address: self.current_addr });
        }
        self.current_addr += 1;
        Ok(())
    }

    fn resolve_references(&mut self) -> Result<(), AssemblerError> {
        for pending in &self.pending {
            let target = *self.symbols.get(&pending.label).ok_or_else(|| {
                AssemblerError::UndefinedLabel { line: pending.line, label: pending.label.clone() }
            })?;
            if target >= MAX_CELLS {
                // Label placed after the last cell
                return Err(AssemblerError::ValueOutOfRange { line: pending.line, value: target as i32 });
            }

            if let Some(cell) = self.cells.get_mut(&pending.address) {
                *cell = if pending.data {
                    Byte::from_u8(target as u8)
                } else {
                    Byte::from_nibbles(cell.high_nibble(), target as u8)
                };
            }
        }
        Ok(())
    }

    /// Split the cells into the contiguous run from address 0 and sparse data.
    fn program(&self) -> Program {
        let mut program = Program::default();
        for (address, value) in &self.cells {
            if *address == program.instructions.len() && program.data.is_empty() {
                program.instructions.push(*value);
            } else {
                program = program.with_data(*address, *value);
            }
        }
        program
    }
}

fn require<'a>(operand: Option<&'a str>, message: &str, line_num: usize) -> Result<&'a str, AssemblerError> {
    operand.ok_or_else(|| AssemblerError::SyntaxError { line: line_num, message: message.into() })
}

fn starts_numeric(operand: &str) -> bool {
    operand
        .trim_start_matches('-')
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("label defined twice on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: i32 },

    #[error("line {line} emits to address {address}, past the end of memory")]
    AddressOutOfRange { line: usize, address: usize },

    #[error("line {line} overwrites address {address}")]
    Overlap { line: usize, address: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(values: &[u8]) -> Vec<Byte> {
        values.iter().map(|v| Byte::from_u8(*v)).collect()
    }

    #[test]
    fn test_assemble_simple() {
        let source = r#"
            ; Simple test program
            LDA 14
            ADDA 15
            STOA 13
            HLT
        "#;

        let program = assemble(source).unwrap();
        assert_eq!(program.instructions, bytes(&[0x0E, 0x2F, 0x6D, 0xC0]));
        assert!(program.data.is_empty());
    }

    #[test]
    fn test_assemble_with_labels() {
        let source = r#"
        START:
            LDA X
            JMPZ END
            JMPC START
        END: HLT
        X:   DAT 7
        "#;

        let program = assemble(source).unwrap();
        assert_eq!(program.instructions, bytes(&[0x04, 0xA3, 0xB0, 0xC0, 0x07]));
    }

    #[test]
    fn test_assemble_data() {
        let source = r#"
            DAT 42
            DAT -1
            DAT 0b1010
            DAT 0xFF
        "#;

        let program = assemble(source).unwrap();
        assert_eq!(program.instructions, bytes(&[42, 0xFF, 0b1010, 0xFF]));
    }

    #[test]
    fn test_org_produces_sparse_data() {
        let source = "LDA 15\nHLT\nORG 15\nDAT 5";
        let program = assemble(source).unwrap();
        assert_eq!(program.instructions, bytes(&[0x0F, 0xC0]));
        assert_eq!(program.data.get(&15), Some(&Byte::from_u8(5)));
    }

    #[test]
    fn test_operand_defaults_to_zero() {
        let program = assemble("SWAB\nSWAO\nLDA\nJMPZ\nHLT").unwrap();
        assert_eq!(program.instructions, bytes(&[0x80, 0x90, 0x00, 0xA0, 0xC0]));
    }

    #[test]
    fn test_case_insensitive() {
        let program = assemble("loop: lda loop\nhlt").unwrap();
        assert_eq!(program.instructions, bytes(&[0x00, 0xC0]));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(assemble("NOP"), Err(AssemblerError::UnknownMnemonic { line: 1, .. })));
        assert!(matches!(assemble("LDA 16"), Err(AssemblerError::ValueOutOfRange { value: 16, .. })));
        assert!(matches!(assemble("DAT 256"), Err(AssemblerError::ValueOutOfRange { .. })));
        assert!(matches!(assemble("DAT -129"), Err(AssemblerError::ValueOutOfRange { .. })));
        assert!(matches!(assemble("JMPZ NOWHERE"), Err(AssemblerError::UndefinedLabel { .. })));
        assert!(matches!(assemble("A: HLT\nA: HLT"), Err(AssemblerError::DuplicateLabel { line: 2, .. })));
        assert!(matches!(assemble("HLT 3"), Err(AssemblerError::SyntaxError { .. })));
        assert!(matches!(assemble("SWAB 2"), Err(AssemblerError::SyntaxError { .. })));
        assert!(matches!(assemble("DAT 1\nORG 0\nDAT 2"), Err(AssemblerError::Overlap { line: 3, address: 0 })));
        assert!(matches!(assemble("ORG 15\nHLT\nHLT"), Err(AssemblerError::AddressOutOfRange { line: 3, address: 16 })));
    }
}
