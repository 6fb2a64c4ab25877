//! The machine as a whole.
//!
//! A [`Computer`] owns the datapath, the control unit and the clock and
//! turns clock edges into control unit and datapath activity:
//! - rising edge: the control unit asserts its next word, which is
//!   dispatched to the datapath (a yield word is not dispatched)
//! - falling edge: every pin drops and the datapath floats
//!
//! The HLT word and decode faults both halt the clock for good.

use crate::binary::{Bit, Byte};
use crate::cpu::alu::Flags;
use crate::cpu::clock::{Clock, ClockState, Edge};
use crate::cpu::control::{ControlUnit, Event, MicroStep};
use crate::cpu::datapath::Datapath;
use crate::cpu::decode::DecodeError;
use crate::cpu::device::{Device, DeviceId, TriState};
use crate::cpu::memory::{Memory, MemoryError, ADDRESS_WIDTH};
use crate::cpu::microcode::Pin;
use crate::cpu::program::Program;
use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, error, info};

/// The complete machine.
#[derive(Clone, Debug, Serialize)]
pub struct Computer {
    /// Bus and devices.
    pub datapath: Datapath,
    /// Microcode engine.
    pub control: ControlUnit,
    /// System clock.
    pub clock: Clock,
    pages: usize,
}

impl Computer {
    /// Build a machine with `2^pages` bytes of memory.
    pub fn new(pages: usize) -> Result<Self, MachineError> {
        let memory = Memory::new(pages)?;
        Ok(Self {
            datapath: Datapath::new(memory),
            control: ControlUnit::new(),
            clock: Clock::new(),
            pages,
        })
    }

    /// Return every component to its power-on state, keeping the memory size.
    pub fn reset(&mut self) -> Result<(), MachineError> {
        *self = Self::new(self.pages)?;
        Ok(())
    }

    /// Copy a program into memory. Only valid before the clock starts.
    pub fn load_program(&mut self, program: &Program) -> Result<(), MachineError> {
        program.load_into(&mut self.datapath.memory)?;
        debug!(
            instructions = program.instructions.len(),
            data = program.data.len(),
            "program loaded"
        );
        Ok(())
    }

    /// Emit a single clock edge.
    ///
    /// Returns `None` once the clock has halted. A decode fault halts the
    /// clock before the error is returned.
    pub fn pulse(&mut self) -> Result<Option<Edge>, MachineError> {
        let Some(edge) = self.clock.tick() else {
            return Ok(None);
        };
        match edge {
            Edge::Rising => self.rising_edge()?,
            Edge::Falling => {
                self.control.zero_pins();
                self.datapath.update_all_pins(&mut self.control);
            }
        }
        Ok(Some(edge))
    }

    fn rising_edge(&mut self) -> Result<(), MachineError> {
        match self.control.execute_micro_instruction() {
            Ok(MicroStep::Execute { halt }) => {
                self.datapath.update_all_pins(&mut self.control);
                if halt {
                    self.clock.halt();
                    self.control.record(Event::Halted);
                    info!(pc = self.datapath.pc.value(), "halted");
                }
                Ok(())
            }
            Ok(MicroStep::Yield) => {
                let pc = self.datapath.pc.value();
                debug!(pc, "instruction retired");
                self.control.record(Event::Retired { pc });
                Ok(())
            }
            Err(err) => {
                error!(error = %err, pc = self.datapath.pc.value(), "decode fault");
                self.clock.halt();
                self.control.record(Event::Faulted { message: err.to_string() });
                Err(err.into())
            }
        }
    }

    /// Run edges until the next falling edge, completing one clock cycle.
    pub fn cycle(&mut self) -> Result<(), MachineError> {
        loop {
            match self.pulse()? {
                Some(Edge::Falling) | None => return Ok(()),
                Some(Edge::Rising) => {}
            }
        }
    }

    /// Run cycles until the current instruction retires or the machine halts.
    pub fn step_instruction(&mut self) -> Result<(), MachineError> {
        loop {
            self.cycle()?;
            if self.clock.is_halted() || self.control.step() == 0 {
                return Ok(());
            }
        }
    }

    /// Oscillate the clock until the machine halts.
    ///
    /// Returns the number of complete cycles run.
    pub fn start(&mut self, period: Duration) -> Result<u64, MachineError> {
        self.run_limited(period, None)
    }

    /// Like [`start`](Self::start), but pause after `max_cycles` cycles.
    pub fn run_limited(&mut self, period: Duration, max_cycles: Option<u64>) -> Result<u64, MachineError> {
        if !self.clock.start(period) {
            return Err(MachineError::Halted);
        }
        let period = self.clock.period();
        info!(period_ms = period.as_millis() as u64, "clock started");

        let mut cycles = 0;
        while self.clock.is_running() {
            let between_cycles = self.clock.output() == Bit::Zero;
            if between_cycles && max_cycles.is_some_and(|max| cycles >= max) {
                self.clock.pause();
                info!(cycles, "cycle limit reached");
                break;
            }

            match self.pulse()? {
                Some(Edge::Falling) => cycles += 1,
                Some(Edge::Rising) => {}
                None => break,
            }
            if !period.is_zero() {
                thread::sleep(period);
            }
        }
        Ok(cycles)
    }

    /// Stop the clock permanently.
    pub fn halt(&mut self) {
        if !self.clock.is_halted() {
            self.clock.halt();
            self.control.record(Event::Halted);
            info!("halted by request");
        }
    }

    /// True once HLT, a fault or `halt()` stopped the clock.
    pub fn is_halted(&self) -> bool {
        self.clock.is_halted()
    }

    /// Contents of register A.
    pub fn a(&self) -> Byte {
        self.datapath.a.value()
    }

    /// Contents of register B.
    pub fn b(&self) -> Byte {
        self.datapath.b.value()
    }

    /// Contents of the output register.
    pub fn output(&self) -> Byte {
        self.datapath.output.value()
    }

    /// Program counter value.
    pub fn pc(&self) -> u8 {
        self.datapath.pc.value()
    }

    /// Flags from the last ALU computation.
    pub fn flags(&self) -> Flags {
        self.control.flags()
    }

    /// Take every event logged since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.control.drain_events()
    }

    /// Read-only view of the whole machine.
    pub fn snapshot(&self) -> Snapshot {
        let devices = DeviceId::FAN_OUT
            .iter()
            .map(|id| {
                let device = self.datapath.device(*id);
                (
                    id.name().to_string(),
                    DeviceSnapshot { mode: device.mode(), contents: device.contents() },
                )
            })
            .collect();

        let alu = &self.datapath.alu;
        let flags = self.control.flags();

        Snapshot {
            bus: self.datapath.bus.read(),
            devices,
            alu: AluSnapshot {
                subtract: alu.subtract(),
                carry_in: alu.carry_in(),
                carry_out: alu.carry_out(),
            },
            control: ControlSnapshot {
                pins: self.control.pins().pins().collect(),
                carry: flags.carry,
                zero: flags.zero,
                instruction: self.control.current_instruction(),
                step: self.control.step(),
            },
            clock: ClockSnapshot {
                state: self.clock.state(),
                output: self.clock.output(),
                edges: self.clock.edges(),
            },
            memory_address: self.datapath.memory.address(),
            memory: self.datapath.memory.cells().to_vec(),
        }
    }
}

impl Default for Computer {
    fn default() -> Self {
        Self {
            datapath: Datapath::new(Memory::full()),
            control: ControlUnit::new(),
            clock: Clock::new(),
            pages: ADDRESS_WIDTH,
        }
    }
}

/// Mode and contents of one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub mode: TriState,
    pub contents: Byte,
}

/// ALU arithmetic mode and carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AluSnapshot {
    pub subtract: Bit,
    pub carry_in: Bit,
    pub carry_out: Bit,
}

/// Control unit state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSnapshot {
    /// Asserted pins in word order.
    pub pins: Vec<Pin>,
    pub carry: Bit,
    pub zero: Bit,
    pub instruction: Byte,
    pub step: usize,
}

/// Clock state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    pub state: ClockState,
    pub output: Bit,
    pub edges: u64,
}

/// State of the whole machine at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub bus: Byte,
    /// Keyed by device name (`A`, `B`, `O`, `ALU`, `RAM`, `PC`, `ADR`, `IR`).
    pub devices: BTreeMap<String, DeviceSnapshot>,
    pub alu: AluSnapshot,
    pub control: ControlSnapshot,
    pub clock: ClockSnapshot,
    /// Cell selected by the address register.
    pub memory_address: usize,
    /// Every memory cell in address order.
    pub memory: Vec<Byte>,
}

/// Errors that stop the machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("the clock has halted")]
    Halted,
}
