//! Debugger application state and logic.

use crate::asm::disasm::{disassemble_word, format_instruction};
use crate::config::MachineConfig;
use crate::cpu::{Console, Cpu, MemoryError};
use crate::cpu::memory::ROW_WIDTH;
use crate::word::Radix;
use std::collections::HashSet;
use std::io::Empty;

/// The machine under the debugger: no input, output captured in memory.
pub type DebuggerCpu = Cpu<Console<Empty, Vec<u8>>>;

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged.
    pub cpu: DebuggerCpu,
    /// Program image, kept for resets.
    pub program: Vec<u8>,
    /// Memory size used for every reset.
    pub memory_bytes: usize,
    /// Base used for registers and memory.
    pub radix: Radix,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<usize>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset, in rows.
    pub mem_scroll: usize,
}

fn fresh_cpu(memory_bytes: usize, program: &[u8]) -> Result<DebuggerCpu, MemoryError> {
    let mut cpu = Cpu::new(memory_bytes, Console::new(std::io::empty(), Vec::new()))?;
    cpu.load_program(program)?;
    Ok(cpu)
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<u8>, config: &MachineConfig) -> Result<Self, MemoryError> {
        let cpu = fresh_cpu(config.memory_bytes, &program)?;

        Ok(Self {
            cpu,
            program,
            memory_bytes: config.memory_bytes,
            radix: config.base,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            mem_scroll: 0,
        })
    }

    /// Current program counter.
    pub fn pc(&self) -> usize {
        self.cpu.mem.program_counter.get()
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if let Some(code) = self.cpu.exit_code() {
            self.status = format!("CPU halted: {}", code);
            self.running = false;
            return;
        }

        let pc = self.pc();
        match self.cpu.step() {
            Ok(Some(instr)) => {
                self.status = format!("PC={:04X}: {}", pc, format_instruction(&instr));
            }
            Ok(None) => {}
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }

        if let Some(code) = self.cpu.exit_code() {
            self.running = false;
            self.status = format!("Halted after {} cycles: {}", self.cpu.cycles, code.reason());
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

        if !self.cpu.is_running() {
            self.running = false;
            self.status = format!("Halted after {} cycles", self.cpu.cycles);
            return;
        }

        self.step();

        // Stop before executing a breakpointed address
        let pc = self.pc();
        if self.running && self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={:04X}", pc);
        }
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.pc();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={:04X}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={:04X}", pc);
        }
    }

    /// Reset CPU to initial state. Breakpoints are kept.
    pub fn reset(&mut self) {
        match fresh_cpu(self.memory_bytes, &self.program) {
            Ok(cpu) => {
                self.cpu = cpu;
                self.status = "Reset. Ready.".into();
            }
            Err(e) => self.status = format!("Error: {}", e),
        }
        self.running = false;
    }

    /// Scroll the memory view by `delta` rows.
    pub fn scroll(&mut self, delta: isize) {
        let rows = self.cpu.mem.capacity().div_ceil(ROW_WIDTH);
        self.mem_scroll = self
            .mem_scroll
            .saturating_add_signed(delta)
            .min(rows.saturating_sub(1));
    }

    /// Everything the program has written through the peripheral.
    pub fn output(&self) -> String {
        String::from_utf8_lossy(self.cpu.piu.output()).into_owned()
    }

    /// Get disassembly around current PC.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(usize, String, bool)> {
        let pc = self.pc();
        let start = pc.saturating_sub(lines / 2);
        let words = self.cpu.mem.words();

        (start..words.len())
            .take(lines)
            .map(|addr| (addr, disassemble_word(words[addr]), addr == pc))
            .collect()
    }
}

/// Run the debugger until the user quits.
pub fn run_debugger(mut app: DebuggerApp) -> std::io::Result<()> {
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

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        // Handle input
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => app.scroll(-1),
                        KeyCode::Down => app.scroll(1),
                        KeyCode::PageUp => app.scroll(-8),
                        KeyCode::PageDown => app.scroll(8),
                        _ => {}
                    }
                }
            }
        }

        // Tick for continuous running
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
    use crate::asm::image::words_to_bytes;
    use crate::cpu::ExitCode;

    fn app_for(source: &str) -> DebuggerApp {
        let program = words_to_bytes(&assemble(source).unwrap());
        let config = MachineConfig { memory_bytes: 64, ..MachineConfig::default() };
        DebuggerApp::new(program, &config).unwrap()
    }

    #[test]
    fn test_step_to_halt() {
        let mut app = app_for("li r1, 7\npiu r1, 0\nhalt");
        app.step();
        assert_eq!(app.pc(), 1);
        app.step();
        app.step();
        assert_eq!(app.cpu.exit_code(), Some(ExitCode::NoInstructions));
        assert!(app.status.starts_with("Halted"));
        assert_eq!(app.output(), "7\n");
    }

    #[test]
    fn test_breakpoint_stops_run() {
        let mut app = app_for("li r1, 1\nli r2, 2\nli r3, 3\nhalt");
        app.step();
        app.step();
        app.toggle_breakpoint();
        app.reset();
        assert_eq!(app.pc(), 0);

        app.run();
        for _ in 0..10 {
            app.tick();
        }
        assert!(!app.running);
        assert_eq!(app.pc(), 2);
        assert!(app.status.starts_with("Breakpoint"));

        // Resuming leaves the breakpoint behind
        app.run();
        for _ in 0..10 {
            app.tick();
        }
        assert!(app.cpu.is_halted());
    }

    #[test]
    fn test_disassembly_window() {
        let app = app_for("li x, 5\nhalt");
        let lines = app.get_disassembly(4);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], (0, "li x, 5".to_string(), true));
        assert_eq!(lines[1].1, "halt");
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut app = app_for("halt");
        app.scroll(-3);
        assert_eq!(app.mem_scroll, 0);
        app.scroll(100);
        // 32 words in rows of 8
        assert_eq!(app.mem_scroll, 3);
    }
}
