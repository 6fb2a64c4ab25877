//! The datapath: the bus and every device attached to it.
//!
//! The datapath owns all devices and is the only code that moves bytes
//! between them. Control pins come in from the [`ControlUnit`] and are
//! dispatched to each device in [`DeviceId::FAN_OUT`] order. A device that
//! ends up reading latches the bus immediately; one that ends up writing
//! drives the bus, after which every attached reader latches the new value
//! before dispatch moves on.
//!
//! Latches with side effects reach back into the control unit, which is why
//! every dispatching method borrows it mutably.

use crate::binary::{Bit, Byte};
use crate::cpu::alu::Alu;
use crate::cpu::bus::Bus;
use crate::cpu::control::ControlUnit;
use crate::cpu::device::{Device, DeviceId, TriState};
use crate::cpu::memory::Memory;
use crate::cpu::microcode::Pin;
use crate::cpu::registers::{AddressRegister, InstructionRegister, ProgramCounter, Register};
use serde::Serialize;
use tracing::{trace, warn};

/// The bus and every device on it.
#[derive(Clone, Debug, Serialize)]
pub struct Datapath {
    /// Shared 8-bit bus.
    pub bus: Bus,
    /// Arithmetic unit wired to A and B.
    pub alu: Alu,
    /// Accumulator.
    pub a: Register,
    /// Second ALU operand.
    pub b: Register,
    /// Output register.
    pub output: Register,
    /// Main memory.
    pub memory: Memory,
    /// Program counter.
    pub pc: ProgramCounter,
    /// Memory address register.
    pub mar: AddressRegister,
    /// Instruction register.
    pub ir: InstructionRegister,
}

impl Datapath {
    /// Build the datapath around a memory and attach every device.
    pub fn new(memory: Memory) -> Self {
        let mut datapath = Self {
            bus: Bus::new(),
            alu: Alu::new(),
            a: Register::new(),
            b: Register::new(),
            output: Register::new(),
            memory,
            pc: ProgramCounter::new(),
            mar: AddressRegister::new(),
            ir: InstructionRegister::new(),
        };
        for id in DeviceId::ATTACH {
            datapath.bus.attach(id);
        }
        datapath
    }

    /// Borrow a device by id.
    pub fn device(&self, id: DeviceId) -> &dyn Device {
        match id {
            DeviceId::Alu => &self.alu,
            DeviceId::A => &self.a,
            DeviceId::B => &self.b,
            DeviceId::Output => &self.output,
            DeviceId::Memory => &self.memory,
            DeviceId::ProgramCounter => &self.pc,
            DeviceId::AddressRegister => &self.mar,
            DeviceId::InstructionRegister => &self.ir,
        }
    }

    /// Mutably borrow a device by id.
    pub fn device_mut(&mut self, id: DeviceId) -> &mut dyn Device {
        match id {
            DeviceId::Alu => &mut self.alu,
            DeviceId::A => &mut self.a,
            DeviceId::B => &mut self.b,
            DeviceId::Output => &mut self.output,
            DeviceId::Memory => &mut self.memory,
            DeviceId::ProgramCounter => &mut self.pc,
            DeviceId::AddressRegister => &mut self.mar,
            DeviceId::InstructionRegister => &mut self.ir,
        }
    }

    /// Dispatch the control unit's pins to every device in fan-out order.
    pub fn update_all_pins(&mut self, control: &mut ControlUnit) {
        for id in DeviceId::FAN_OUT {
            self.update_control_pins(id, control);
        }
    }

    /// Dispatch the pins that concern one device.
    pub fn update_control_pins(&mut self, id: DeviceId, control: &mut ControlUnit) {
        let mode = match id {
            DeviceId::Alu => {
                self.alu.set_subtract(Bit::from_bool(control.pin(Pin::Su)));
                if control.pin(Pin::So) {
                    let flags = self.alu.compute(&self.a.value(), &self.b.value());
                    control.record_compute(self.alu.output(), flags);
                    TriState::Write
                } else {
                    TriState::Float
                }
            }
            DeviceId::A => TriState::from_pins(control.pin(Pin::Ai), control.pin(Pin::Ao)),
            DeviceId::B => TriState::from_pins(control.pin(Pin::Bi), control.pin(Pin::Bo)),
            DeviceId::Output => TriState::from_pins(control.pin(Pin::Oi), control.pin(Pin::Oo)),
            DeviceId::Memory => TriState::from_pins(control.pin(Pin::Ri), control.pin(Pin::Ro)),
            DeviceId::ProgramCounter => {
                TriState::from_pins(control.pin(Pin::Pci), control.pin(Pin::Pco))
            }
            DeviceId::AddressRegister => TriState::from_pins(control.pin(Pin::Mai), false),
            DeviceId::InstructionRegister => {
                TriState::from_pins(control.pin(Pin::Ii), control.pin(Pin::Io))
            }
        };

        self.set_mode(id, mode, control);

        if id == DeviceId::ProgramCounter && control.pin(Pin::Pcc) {
            self.pc.increment();
            control.clear_pin(Pin::Pcc);
            trace!(pc = self.pc.value(), "pc count");
        }
    }

    /// Put a device in a mode and run the state update that follows.
    ///
    /// A rejected mode is logged and leaves the device as it was.
    pub fn set_mode(&mut self, id: DeviceId, mode: TriState, control: &mut ControlUnit) {
        if let Err(err) = self.device_mut(id).set_mode(mode) {
            warn!(device = %id, error = %err, "mode change rejected");
            return;
        }
        self.update_state(id, control);
    }

    /// READ latches the bus, WRITE drives it, FLOAT does nothing.
    pub fn update_state(&mut self, id: DeviceId, control: &mut ControlUnit) {
        match self.device(id).mode() {
            TriState::Read => {
                let value = self.bus.read();
                self.latch(id, value, control);
            }
            TriState::Write => {
                let data = self.device(id).drive();
                self.write_bus(&data, control);
            }
            TriState::Float => {}
        }
    }

    /// Drive the bus and let every reader latch the result.
    ///
    /// An overflowing write is logged; its low-order bits still land.
    pub fn write_bus(&mut self, data: &[Bit], control: &mut ControlUnit) {
        if let Err(err) = self.bus.write(data) {
            warn!(error = %err, "bus overflow");
        }
        trace!(bus = %self.bus.read(), "bus write");
        self.settle(control);
    }

    /// Latch the bus into every attached device in READ mode, in attachment order.
    fn settle(&mut self, control: &mut ControlUnit) {
        let value = self.bus.read();
        for index in 0..self.bus.attached().len() {
            let id = self.bus.attached()[index];
            if self.device(id).mode() == TriState::Read {
                self.latch(id, value, control);
            }
        }
    }

    fn latch(&mut self, id: DeviceId, value: Byte, control: &mut ControlUnit) {
        trace!(device = %id, value = %value, "latch");
        self.device_mut(id).latch(value);
        match id {
            DeviceId::AddressRegister => self.memory.select(self.mar.address()),
            DeviceId::InstructionRegister => control.publish_instruction(value),
            _ => {}
        }
    }
}

impl Default for Datapath {
    fn default() -> Self {
        Self::new(Memory::full())
    }
}
