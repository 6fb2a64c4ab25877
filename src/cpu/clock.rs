//! System clock.
//!
//! The clock alternates its output bit every tick. A tick that raises the
//! output is a rising edge (the control unit executes a microinstruction);
//! one that lowers it is a falling edge (the control unit releases every pin).

use crate::binary::Bit;
use std::time::Duration;
use serde::{Serialize, Deserialize};

/// Oscillation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClockState {
    /// Not oscillating; edges can still be pulsed by hand.
    #[default]
    Stopped,
    /// Oscillating at the configured period.
    Running,
    /// Permanently stopped by HLT or a fault.
    Halted,
}

/// Clock edge produced by a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    Rising,
    Falling,
}

/// Two-phase clock driving the control unit.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Clock {
    state: ClockState,
    output: Bit,
    period: Duration,
    edges: u64,
}

impl Clock {
    /// Create a stopped clock with its output low.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin oscillating with the given tick period.
    ///
    /// Returns false if the clock has already halted.
    pub fn start(&mut self, period: Duration) -> bool {
        if self.is_halted() {
            return false;
        }
        self.period = period;
        self.state = ClockState::Running;
        true
    }

    /// Stop oscillating but allow manual pulses.
    pub fn pause(&mut self) {
        if self.state == ClockState::Running {
            self.state = ClockState::Stopped;
        }
    }

    /// Stop for good.
    pub fn halt(&mut self) {
        self.state = ClockState::Halted;
    }

    /// Toggle the output and report which edge that was.
    ///
    /// A halted clock produces no more edges.
    pub fn tick(&mut self) -> Option<Edge> {
        if self.is_halted() {
            return None;
        }
        self.edges += 1;
        match self.output.toggle() {
            Bit::One => Some(Edge::Rising),
            Bit::Zero => Some(Edge::Falling),
        }
    }

    /// Current oscillation state.
    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    pub fn is_halted(&self) -> bool {
        self.state == ClockState::Halted
    }

    /// Current output level.
    pub fn output(&self) -> Bit {
        self.output
    }

    /// Time between edges while running.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Edges produced so far.
    pub fn edges(&self) -> u64 {
        self.edges
    }
}
