//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem, Wrap},
    style::{Color, Style, Modifier},
};
use crate::cpu::memory::ROW_WIDTH;
use crate::cpu::registers::Reg;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Percentage(55),
        ])
        .split(frame.area());

    // Left side: code and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(9),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: memory, output and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_output(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Draw disassembly view around the program counter.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "●" } else { " " };
            let text = format!("{}{:04X}: {}", prefix, addr, instr);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw the sixteen registers, the counters and the run state.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let width = app.radix.width();
    let mut content: Vec<Line> = Reg::all()
        .collect::<Vec<_>>()
        .chunks(4)
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .flat_map(|reg| {
                    let value = app.cpu.regs.read(*reg);
                    let style = if value.is_zero() {
                        Style::default().fg(Color::DarkGray)
                    } else {
                        Style::default().fg(Color::White)
                    };
                    [
                        Span::raw(format!("{:>3}: ", reg.to_string())),
                        Span::styled(format!("{:>width$}  ", value.format(app.radix), width = width), style),
                    ]
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    content.push(Line::from(vec![
        Span::raw("PC: "),
        Span::styled(app.cpu.mem.program_counter.format(app.radix), Style::default().fg(Color::Yellow)),
        Span::raw("   MC: "),
        Span::styled(app.cpu.mem.memory_counter.format(app.radix), Style::default().fg(Color::Magenta)),
    ]));
    content.push(Line::from(vec![
        Span::raw("Cycles: "),
        Span::styled(format!("{}", app.cpu.cycles), Style::default().fg(Color::Cyan)),
        Span::raw("   State: "),
        Span::styled(
            match app.cpu.exit_code() {
                Some(code) => format!("Halted ({})", code.to_word().format(app.radix)),
                None => "Running".to_string(),
            },
            if app.cpu.is_running() {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Red)
            }),
    ]));

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw memory view, one row of words per line.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let words = app.cpu.mem.words();
    let pc = app.pc();
    let mc = app.cpu.mem.memory_counter.get();

    let items: Vec<ListItem> = words
        .chunks(ROW_WIDTH)
        .enumerate()
        .skip(app.mem_scroll)
        .take(visible_rows)
        .map(|(row, cells)| {
            let base = row * ROW_WIDTH;
            let mut spans = vec![Span::raw(format!("{:04X}: ", base))];

            for (offset, word) in cells.iter().enumerate() {
                let addr = base + offset;
                let style = if addr == pc {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else if addr == mc {
                    Style::default().fg(Color::Magenta)
                } else if !word.is_zero() {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                spans.push(Span::styled(format!("{} ", word.format(app.radix)), style));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw peripheral output, keeping the tail visible.
fn draw_output(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let output = app.output();
    let visible = (area.height as usize).saturating_sub(2);
    let lines: Vec<&str> = output.lines().collect();
    let tail = lines[lines.len().saturating_sub(visible)..].join("\n");

    let paragraph = Paragraph::new(tail)
        .wrap(Wrap { trim: false })
        .block(Block::default()
            .title(" Output ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)));

    frame.render_widget(paragraph, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  ↑↓/PgUp/PgDn: Scroll memory  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
