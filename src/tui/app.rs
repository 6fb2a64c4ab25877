//! Debugger application state and logic.

use crate::asm::disasm::disassemble_instruction;
use crate::cpu::{Computer, Event, MachineError};
use std::collections::{HashSet, VecDeque};

/// Most events the event panel keeps.
const EVENT_HISTORY: usize = 64;

/// Debugger application state.
pub struct DebuggerApp {
    /// The machine being debugged.
    pub computer: Computer,
    /// Machine as first loaded, for reset.
    initial: Computer,
    /// Breakpoints (by PC value, checked between instructions).
    pub breakpoints: HashSet<u8>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
    /// Recent events, oldest first.
    pub events: VecDeque<Event>,
}

impl DebuggerApp {
    /// Create a debugger around a machine with its program already loaded.
    pub fn new(computer: Computer) -> Self {
        Self {
            initial: computer.clone(),
            computer,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. 'e' edge, 's' cycle, 'i' instruction, 'r' run, 'q' quit.".into(),
            mem_scroll: 0,
            events: VecDeque::new(),
        }
    }

    /// Emit one clock edge.
    pub fn pulse(&mut self) {
        let result = self.computer.pulse().map(|edge| match edge {
            Some(edge) => format!("{:?} edge", edge),
            None => "Clock halted".to_string(),
        });
        self.finish(result);
    }

    /// Run one full clock cycle.
    pub fn cycle(&mut self) {
        let result = self.computer.cycle().map(|()| {
            format!("Step {}: {}", self.computer.control.step(), self.computer.control.pins())
        });
        self.finish(result);
    }

    /// Run until the current instruction retires.
    pub fn step_instruction(&mut self) {
        let result = self.computer.step_instruction().map(|()| {
            let instruction = self.computer.control.current_instruction();
            format!("PC={:02}: {}", self.computer.pc(), disassemble_instruction(instruction))
        });
        self.finish(result);
    }

    fn finish(&mut self, result: Result<String, MachineError>) {
        match result {
            Ok(message) => self.status = message,
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
        for event in self.computer.drain_events() {
            if self.events.len() == EVENT_HISTORY {
                self.events.pop_front();
            }
            self.events.push_back(event);
        }
    }

    /// Run until halt, breakpoint, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if self.computer.is_halted() {
            self.running = false;
            self.status = format!("Halted after {} edges", self.computer.clock.edges());
            return;
        }

        self.cycle();

        // Breakpoints only apply between instructions
        let pc = self.computer.pc();
        if self.computer.control.step() == 0 && self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={}", pc);
        }
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.computer.pc();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={}", pc);
        }
    }

    /// Return to the machine as first loaded.
    pub fn reset(&mut self) {
        self.computer = self.initial.clone();
        self.events.clear();
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Disassembly of every memory cell, marking the next instruction.
    pub fn get_disassembly(&self) -> Vec<(usize, String, bool)> {
        let memory = &self.computer.datapath.memory;
        let next = self.computer.pc() as usize % memory.len();

        memory
            .cells()
            .iter()
            .enumerate()
            .map(|(addr, byte)| (addr, disassemble_instruction(*byte), addr == next))
            .collect()
    }
}

/// Run the debugger on a loaded machine.
pub fn run_debugger(computer: Computer) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(computer);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('e') => {
                            app.running = false;
                            app.pulse();
                        }
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.cycle();
                        }
                        KeyCode::Char('i') => {
                            app.running = false;
                            app.step_instruction();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => {
                            app.mem_scroll = app.mem_scroll.saturating_sub(1);
                        }
                        KeyCode::Down => {
                            if app.mem_scroll + 1 < app.computer.datapath.memory.len() {
                                app.mem_scroll += 1;
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    fn app(source: &str) -> DebuggerApp {
        let mut computer = Computer::default();
        computer.load_program(&assemble(source).unwrap()).unwrap();
        DebuggerApp::new(computer)
    }

    #[test]
    fn test_step_instruction_reports_pc() {
        let mut app = app("LDA X\nHLT\nX: DAT 4");
        app.step_instruction();
        assert_eq!(app.computer.a().to_u8(), 4);
        assert_eq!(app.status, "PC=01: LDA 0x2");
        assert!(matches!(app.events.back(), Some(Event::Retired { pc: 1 })));
    }

    #[test]
    fn test_breakpoint_stops_run() {
        let mut app = app("LDA X\nLDA X\nLDA X\nHLT\nX: DAT 1");
        app.computer.step_instruction().unwrap();
        app.toggle_breakpoint();
        app.reset();
        app.run();
        while app.running {
            app.tick();
        }
        assert_eq!(app.status, "Breakpoint at PC=1");
        assert!(!app.computer.is_halted());
    }

    #[test]
    fn test_run_to_halt_and_reset() {
        let mut app = app("LDA X\nHLT\nX: DAT 4");
        app.run();
        while app.running {
            app.tick();
        }
        assert!(app.computer.is_halted());
        assert!(app.status.starts_with("Halted"));

        app.reset();
        assert!(!app.computer.is_halted());
        assert_eq!(app.computer.a().to_u8(), 0);
        assert!(app.events.is_empty());
    }

    #[test]
    fn test_disassembly_marks_next_instruction() {
        let mut app = app("LDA X\nHLT\nX: DAT 4");
        app.step_instruction();
        let listing = app.get_disassembly();
        assert_eq!(listing.len(), 16);
        assert_eq!(listing[1], (1, "HLT".to_string(), true));
    }
}
