//! Disassembler for sap8 programs.
//!
//! Converts instruction bytes back to readable assembly.

use crate::binary::Byte;
use crate::cpu::decode::decode;
use crate::cpu::program::Program;

/// Disassemble a single byte to text.
pub fn disassemble_instruction(byte: Byte) -> String {
    match decode(byte) {
        Ok(decoded) => decoded.to_string(),
        Err(_) => "???".to_string(),
    }
}

/// Disassemble a memory image, one line per cell.
///
/// Data bytes decode as instructions too; the raw bits follow on each line.
pub fn disassemble(cells: &[Byte]) -> String {
    let mut output = String::new();
    output.push_str("; sap8 disassembly\n");
    output.push_str("; ----------------\n\n");

    for (addr, byte) in cells.iter().enumerate() {
        let line = disassemble_instruction(*byte);
        output.push_str(&format!("{:02}: {:<10}; {}\n", addr, line, byte));
    }

    output
}

/// Disassemble every cell a program touches.
pub fn disassemble_program(program: &Program) -> String {
    let cells: Vec<Byte> = match program.end() {
        Some(end) => (0..=end).map(|addr| program.byte_at(addr)).collect(),
        None => Vec::new(),
    };
    disassemble(&cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::{encode, Instruction, Opcode};

    #[test]
    fn test_disassemble_hlt() {
        let hlt = encode(&Instruction::new(Opcode::Hlt, 0));
        assert_eq!(disassemble_instruction(hlt), "HLT");
    }

    #[test]
    fn test_disassemble_operand() {
        let jmpz = encode(&Instruction::new(Opcode::Jmpz, 5));
        assert_eq!(disassemble_instruction(jmpz), "JMPZ 0x5");
    }

    #[test]
    fn test_undefined_opcode() {
        assert_eq!(disassemble_instruction(Byte::from_u8(0xE3)), "???");
    }

    #[test]
    fn test_listing() {
        let program = Program::new(vec![Byte::from_u8(0x0F), Byte::from_u8(0xC0)])
            .with_data(3, Byte::from_u8(0x05));
        let listing = disassemble_program(&program);
        assert!(listing.contains("00: LDA 0xF   ; 00001111"));
        assert!(listing.contains("01: HLT       ; 11000000"));
        assert!(listing.contains("03: LDA 0x5"));
        assert_eq!(listing.lines().filter(|l| !l.starts_with(';') && !l.is_empty()).count(), 4);
    }
}
