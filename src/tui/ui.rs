//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::binary::Bit;
use crate::cpu::{Device, DeviceId, Event, TriState};
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    // Left side: code, devices and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(14),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_devices(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: memory, events and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(10),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_events(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let items: Vec<ListItem> = app
        .get_disassembly()
        .into_iter()
        .map(|(addr, instr, is_next)| {
            let prefix = if is_next { "▶ " } else { "  " };
            let has_bp = app.breakpoints.contains(&(addr as u8));
            let bp = if has_bp { "●" } else { " " };

            let style = if is_next {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if has_bp {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}{:02}: {}", bp, prefix, addr, instr)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Every device with its mode, plus bus, flags and control state.
fn draw_devices(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let computer = &app.computer;
    let mut content: Vec<Line> = DeviceId::FAN_OUT
        .iter()
        .map(|id| {
            let device = computer.datapath.device(*id);
            Line::from(vec![
                Span::raw(format!("{:<4}", id.name())),
                Span::styled(format!("{:<6}", device.mode()), mode_style(device.mode())),
                Span::raw(format!("{} = {}", device.contents(), device.contents().to_u8())),
            ])
        })
        .collect();

    let flags = computer.flags();
    content.push(Line::from(vec![
        Span::raw("BUS "),
        Span::styled(format!("{}", computer.datapath.bus.read()), Style::default().fg(Color::White)),
        Span::raw("   CARRY "),
        Span::styled(format!("{}", flags.carry), bit_style(flags.carry)),
        Span::raw("  ZERO "),
        Span::styled(format!("{}", flags.zero), bit_style(flags.zero)),
    ]));
    content.push(Line::from(vec![
        Span::raw("Step "),
        Span::styled(format!("{}", computer.control.step()), Style::default().fg(Color::Cyan)),
        Span::raw("   Pins "),
        Span::styled(format!("{}", computer.control.pins()), Style::default().fg(Color::Yellow)),
    ]));
    content.push(Line::from(vec![
        Span::raw("Edges "),
        Span::styled(format!("{}", computer.clock.edges()), Style::default().fg(Color::Cyan)),
        Span::raw("   Clock: "),
        Span::styled(format!("{:?}", computer.clock.state()),
            if computer.is_halted() {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Green)
            }),
    ]));

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Devices ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let memory = &app.computer.datapath.memory;
    let visible_rows = (area.height as usize).saturating_sub(2);
    let start = app.mem_scroll.min(memory.len());
    let end = (start + visible_rows).min(memory.len());

    let items: Vec<ListItem> = memory.cells()[start..end]
        .iter()
        .enumerate()
        .map(|(offset, value)| {
            let addr = start + offset;
            let selected = addr == memory.address();
            let text = format!("{:02}: {} = {}", addr, value, value.to_u8());

            let style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if !value.is_zero() {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Most recent events, newest at the bottom.
fn draw_events(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let skip = app.events.len().saturating_sub(visible_rows);

    let items: Vec<ListItem> = app
        .events
        .iter()
        .skip(skip)
        .map(|event| {
            let (text, color) = match event {
                Event::Fetched { instruction } => (format!("fetch    {:08b}", instruction), Color::Cyan),
                Event::Computed { result, carry, zero } => {
                    (format!("compute  {} C={} Z={}", result, carry, zero), Color::White)
                }
                Event::Retired { pc } => (format!("retire   PC={}", pc), Color::Green),
                Event::Halted => ("halt".to_string(), Color::Yellow),
                Event::Faulted { message } => (format!("fault    {}", message), Color::Red),
            };
            ListItem::new(text).style(Style::default().fg(color))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Events ")
            .borders(Borders::ALL));

    frame.render_widget(list, area);
}

fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("e: Edge  s: Cycle  i: Instruction  r: Run  p: Pause"),
        Line::from("b: Breakpoint  x: Reset  ↑↓: Scroll memory  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

fn mode_style(mode: TriState) -> Style {
    match mode {
        TriState::Float => Style::default().fg(Color::DarkGray),
        TriState::Read => Style::default().fg(Color::Green),
        TriState::Write => Style::default().fg(Color::Red),
    }
}

fn bit_style(bit: Bit) -> Style {
    match bit {
        Bit::Zero => Style::default().fg(Color::Gray),
        Bit::One => Style::default().fg(Color::Green),
    }
}
