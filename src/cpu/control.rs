//! The control unit.
//!
//! Holds the control pins, the status flags, the instruction currently in
//! the instruction register and the microcode step cursor. On a rising edge
//! it selects the next control word and asserts its pins; the datapath then
//! dispatches those pins to the devices. On a falling edge every pin drops.

use crate::binary::{Bit, Byte};
use crate::cpu::alu::Flags;
use crate::cpu::decode::{DecodeError, Opcode};
use crate::cpu::microcode::{self, ControlWord, Pin};
use serde::{Serialize, Deserialize};
use tracing::{debug, trace};

/// Entries in the machine's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// An instruction byte was latched into the instruction register.
    Fetched { instruction: u8 },
    /// The ALU produced a result.
    Computed { result: u8, carry: Bit, zero: Bit },
    /// An instruction finished; `pc` is the counter after it.
    Retired { pc: u8 },
    /// The HLT word stopped the clock.
    Halted,
    /// Decoding failed and the clock was stopped.
    Faulted { message: String },
}

/// What a rising edge asked the datapath to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroStep {
    /// Dispatch the asserted pins. `halt` is set for the HLT word.
    Execute { halt: bool },
    /// The instruction ended; the cursor is back at zero and nothing is dispatched.
    Yield,
}

/// Microcode engine: asserted pins, flags, step cursor and event log.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ControlUnit {
    pins: ControlWord,
    flags: Flags,
    current_instruction: Byte,
    step: usize,
    events: Vec<Event>,
}

impl ControlUnit {
    /// Create a control unit at step 0 with no pins asserted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag variant index: `CARRY * 2 + ZERO`.
    pub fn flag_variant(&self) -> usize {
        self.flags.carry.to_u8() as usize * 2 + self.flags.zero.to_u8() as usize
    }

    /// Assert the next control word of the current instruction.
    pub fn execute_micro_instruction(&mut self) -> Result<MicroStep, DecodeError> {
        let opcode = Opcode::from_nibble(self.current_instruction.high_nibble())?;
        let word = microcode::lookup(opcode, self.flag_variant(), self.step)?;

        debug!(opcode = %opcode, step = self.step, pins = %word, "microinstruction");
        self.pins = word;

        if word.asserts(Pin::Yld) {
            self.step = 0;
            return Ok(MicroStep::Yield);
        }

        self.step += 1;
        Ok(MicroStep::Execute { halt: word.asserts(Pin::Hlt) })
    }

    /// Drop every pin. The caller dispatches the result.
    pub fn zero_pins(&mut self) {
        self.pins = ControlWord::EMPTY;
    }

    /// Called by the datapath whenever the instruction register latches.
    pub fn publish_instruction(&mut self, instruction: Byte) {
        trace!(instruction = %instruction, "instruction published");
        self.current_instruction = instruction;
        self.events.push(Event::Fetched { instruction: instruction.to_u8() });
    }

    /// Called by the datapath after every ALU computation.
    pub fn record_compute(&mut self, result: Byte, flags: Flags) {
        debug!(result = result.to_u8(), carry = %flags.carry, zero = %flags.zero, "alu compute");
        self.flags = flags;
        self.events.push(Event::Computed {
            result: result.to_u8(),
            carry: flags.carry,
            zero: flags.zero,
        });
    }

    /// Append an event to the log.
    pub fn record(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Whether a pin is asserted.
    #[inline]
    pub fn pin(&self, pin: Pin) -> bool {
        self.pins.asserts(pin)
    }

    /// Deassert a single pin.
    pub fn clear_pin(&mut self, pin: Pin) {
        self.pins.set(pin, false);
    }

    /// Currently asserted pins.
    pub fn pins(&self) -> ControlWord {
        self.pins
    }

    /// Flags that select the microcode variant.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Last byte published by the instruction register.
    pub fn current_instruction(&self) -> Byte {
        self.current_instruction
    }

    /// Microcode step cursor.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Events recorded since the last drain.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Take every event logged so far.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(carry: bool, zero: bool) -> Flags {
        Flags { carry: Bit::from_bool(carry), zero: Bit::from_bool(zero) }
    }

    #[test]
    fn test_fetch_sequence() {
        let mut cu = ControlUnit::new();
        assert_eq!(cu.execute_micro_instruction(), Ok(MicroStep::Execute { halt: false }));
        assert!(cu.pin(Pin::Pco) && cu.pin(Pin::Mai));
        assert_eq!(cu.step(), 1);

        assert_eq!(cu.execute_micro_instruction(), Ok(MicroStep::Execute { halt: false }));
        assert!(cu.pin(Pin::Ro) && cu.pin(Pin::Ii) && cu.pin(Pin::Pcc));
        assert!(!cu.pin(Pin::Pco));
    }

    #[test]
    fn test_yield_resets_cursor() {
        // LDA: fetch, fetch, operand, load, yield
        let mut cu = ControlUnit::new();
        for _ in 0..4 {
            cu.execute_micro_instruction().unwrap();
        }
        assert_eq!(cu.step(), 4);
        assert_eq!(cu.execute_micro_instruction(), Ok(MicroStep::Yield));
        assert_eq!(cu.step(), 0);
    }

    #[test]
    fn test_hlt_word() {
        let mut cu = ControlUnit::new();
        cu.publish_instruction(Byte::from_u8(0b1100_0000));
        cu.execute_micro_instruction().unwrap();
        cu.execute_micro_instruction().unwrap();
        assert_eq!(cu.execute_micro_instruction(), Ok(MicroStep::Execute { halt: true }));
        assert!(cu.pin(Pin::Hlt));
        // Nothing follows HLT
        assert_eq!(
            cu.execute_micro_instruction(),
            Err(DecodeError::StepOutOfRange { opcode: Opcode::Hlt, step: 3 })
        );
    }

    #[test]
    fn test_undefined_opcode() {
        let mut cu = ControlUnit::new();
        cu.publish_instruction(Byte::from_u8(0xF0));
        assert_eq!(cu.execute_micro_instruction(), Err(DecodeError::UndefinedOpcode(15)));
    }

    #[test]
    fn test_flag_variant() {
        let mut cu = ControlUnit::new();
        assert_eq!(cu.flag_variant(), 0);
        cu.record_compute(Byte::zero(), flags(false, true));
        assert_eq!(cu.flag_variant(), 1);
        cu.record_compute(Byte::from_u8(1), flags(true, false));
        assert_eq!(cu.flag_variant(), 2);
    }

    #[test]
    fn test_both_flags_is_a_decode_error() {
        let mut cu = ControlUnit::new();
        cu.flags = flags(true, true);
        assert_eq!(
            cu.execute_micro_instruction(),
            Err(DecodeError::InvalidFlagVariant { carry: 1, zero: 1 })
        );
    }

    #[test]
    fn test_zero_pins() {
        let mut cu = ControlUnit::new();
        cu.execute_micro_instruction().unwrap();
        cu.zero_pins();
        assert!(cu.pins().is_empty());
    }

    #[test]
    fn test_event_log() {
        let mut cu = ControlUnit::new();
        cu.publish_instruction(Byte::from_u8(0x0F));
        cu.record(Event::Retired { pc: 1 });
        let events = cu.drain_events();
        assert_eq!(events, vec![Event::Fetched { instruction: 0x0F }, Event::Retired { pc: 1 }]);
        assert!(cu.events().is_empty());
    }
}
