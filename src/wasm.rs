//! WebAssembly bindings for the sap8 emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.

use crate::asm::assembler::assemble;
use crate::asm::disasm::disassemble_instruction;
use crate::binary::Byte;
use crate::cpu::{Computer, Program};
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly machine wrapper.
#[wasm_bindgen]
pub struct WasmComputer {
    computer: Computer,
    program: Program,
}

#[wasm_bindgen]
impl WasmComputer {
    /// Create a machine with full-size memory.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            computer: Computer::default(),
            program: Program::default(),
        }
    }

    /// Assemble source code and load it into a fresh machine.
    ///
    /// Returns the number of bytes loaded.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let program = assemble(source).map_err(|e| JsError::new(&e.to_string()))?;

        let mut computer = Computer::default();
        computer.load_program(&program).map_err(|e| JsError::new(&e.to_string()))?;

        let len = program.instructions.len() + program.data.len();
        self.computer = computer;
        self.program = program;
        Ok(len)
    }

    /// Emit one clock edge. Returns "Rising", "Falling" or "Halted".
    #[wasm_bindgen]
    pub fn pulse(&mut self) -> Result<String, JsError> {
        let edge = self.computer.pulse().map_err(|e| JsError::new(&e.to_string()))?;
        Ok(match edge {
            Some(edge) => format!("{:?}", edge),
            None => "Halted".to_string(),
        })
    }

    /// Run one clock cycle.
    #[wasm_bindgen]
    pub fn cycle(&mut self) -> Result<(), JsError> {
        self.computer.cycle().map_err(|e| JsError::new(&e.to_string()))
    }

    /// Run one instruction. Returns the disassembled instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        if self.computer.is_halted() {
            return Err(JsError::new("machine is halted"));
        }
        self.computer.step_instruction().map_err(|e| JsError::new(&e.to_string()))?;
        Ok(disassemble_instruction(self.computer.control.current_instruction()))
    }

    /// Run until halt or `max_cycles` cycles. Returns the cycles run.
    ///
    /// Runs without sleeping; the page drives the pace.
    #[wasm_bindgen]
    pub fn run(&mut self, max_cycles: u32) -> Result<u32, JsError> {
        let mut cycles = 0;
        while cycles < max_cycles && !self.computer.is_halted() {
            self.computer.cycle().map_err(|e| JsError::new(&e.to_string()))?;
            cycles += 1;
        }
        Ok(cycles)
    }

    /// Reset to the loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<(), JsError> {
        let mut computer = Computer::default();
        computer.load_program(&self.program).map_err(|e| JsError::new(&e.to_string()))?;
        self.computer = computer;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.computer.is_halted()
    }

    #[wasm_bindgen]
    pub fn pc(&self) -> u8 {
        self.computer.pc()
    }

    #[wasm_bindgen]
    pub fn a(&self) -> u8 {
        self.computer.a().to_u8()
    }

    #[wasm_bindgen]
    pub fn b(&self) -> u8 {
        self.computer.b().to_u8()
    }

    #[wasm_bindgen]
    pub fn output(&self) -> u8 {
        self.computer.output().to_u8()
    }

    /// Get all memory cells.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> Vec<u8> {
        self.computer.datapath.memory.cells().iter().map(|b| b.to_u8()).collect()
    }

    /// Full machine state as JSON.
    #[wasm_bindgen]
    pub fn snapshot_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.computer.snapshot()).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Events since the last call, as JSON.
    #[wasm_bindgen]
    pub fn events_json(&mut self) -> Result<String, JsError> {
        serde_json::to_string(&self.computer.drain_events()).map_err(|e| JsError::new(&e.to_string()))
    }
}

impl Default for WasmComputer {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return the byte count.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<usize, JsError> {
    let program = assemble(source).map_err(|e| JsError::new(&e.to_string()))?;
    Ok(program.instructions.len() + program.data.len())
}

/// Disassemble a single byte.
#[wasm_bindgen]
pub fn wasm_disassemble(value: u8) -> String {
    disassemble_instruction(Byte::from_u8(value))
}
