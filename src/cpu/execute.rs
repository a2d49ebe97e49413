//! CPU execution engine.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::word::{Word, Radix};
use crate::cpu::{Memory, Registers};
use crate::cpu::decode::{self, Instruction, Opcode};
use crate::cpu::exit::ExitCode;
use crate::cpu::memory::MemoryError;
use crate::cpu::piu::{Peripheral, PeripheralError};
use crate::cpu::registers::Reg;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted with an exit code.
    Halted(ExitCode),
}

/// The processor: registers, memory and an attached peripheral.
pub struct Cpu<P> {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory, including the program and memory counters.
    pub mem: Memory,
    /// Device reached by `piu`.
    pub piu: P,
    /// Current execution state.
    pub state: CpuState,
    /// Instruction count (for profiling).
    pub cycles: u64,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

/// Serializable view of the machine after (or during) a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub program_counter: usize,
    pub memory_counter: usize,
    pub registers: Vec<i16>,
    pub exit_code: Option<u16>,
    pub exit_reason: Option<String>,
    pub cycles: u64,
}

impl<P: Peripheral> Cpu<P> {
    /// Create a CPU with `memory_bytes` bytes of zeroed memory.
    pub fn new(memory_bytes: usize, piu: P) -> Result<Self, MemoryError> {
        Ok(Self {
            regs: Registers::new(),
            mem: Memory::new(memory_bytes)?,
            piu,
            state: CpuState::Running,
            cycles: 0,
            last_instr: None,
        })
    }

    /// Load a binary program at address 0.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), MemoryError> {
        self.mem.load_program(program)
    }

    /// Execute a single cycle.
    ///
    /// Returns the instruction that was executed, or `None` if the fetched
    /// word was a halt sentinel.
    pub fn step(&mut self) -> Result<Option<Instruction>, CpuError> {
        if let CpuState::Halted(code) = self.state {
            return Err(CpuError::NotRunning(code));
        }

        // Fetch
        let pc = self.mem.program_counter.get();
        let raw = self.mem.load(pc)?;

        if let Some(code) = ExitCode::from_word(raw) {
            self.halt(code);
            return Ok(None);
        }

        // Decode
        let instr = decode::decode(raw);
        log::debug!("{:04X}: {:04X} {:?}", pc, raw, instr.opcode);

        // Execute
        self.execute(instr)?;

        self.cycles += 1;
        self.last_instr = Some(instr);

        Ok(Some(instr))
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.is_running() {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles + max_cycles;

        while self.is_running() && self.cycles < limit {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Execute a decoded instruction.
    fn execute(&mut self, instr: Instruction) -> Result<(), CpuError> {
        let Instruction { opcode, r1, r2, r3, immediate } = instr;

        match opcode {
            // ==================== Logic ====================

            Opcode::And => self.binary(r1, r2, r3, |a, b| a & b),
            Opcode::Or => self.binary(r1, r2, r3, |a, b| a | b),
            Opcode::Xor => self.binary(r1, r2, r3, |a, b| a ^ b),
            Opcode::Not => {
                let value = !self.regs.read(r2);
                self.regs.write(r1, value);
            }
            Opcode::Sh => self.binary(r1, r2, r3, Word::shift),

            // ==================== Arithmetic ====================

            Opcode::Add => self.binary(r1, r2, r3, |a, b| a + b),
            Opcode::Sub => self.binary(r1, r2, r3, |a, b| a - b),
            Opcode::Mul => self.binary(r1, r2, r3, |a, b| a * b),
            Opcode::Div => {
                let dividend = self.regs.read(r2);
                let divisor = self.regs.read(r3);
                match dividend.checked_div(divisor) {
                    Some(quotient) => self.regs.write(r1, quotient),
                    None => {
                        // Halts in place: no write, no advance
                        self.halt(ExitCode::DivisionByZero);
                        return Ok(());
                    }
                }
            }
            Opcode::Comp => self.binary(r1, r2, r3, |a, b| Word::new(a.cmp(&b) as i64)),

            // ==================== Data Transfer ====================

            Opcode::Li => self.regs.write(r2, immediate),
            Opcode::Amc => {
                let delta = self.regs.read(r2) + immediate;
                self.mem.memory_counter.add_word(delta);
            }
            Opcode::Lwmc => {
                let address = self.mem.memory_counter.offset(immediate.to_i64());
                let value = self.mem.load(address)?;
                self.regs.write(r2, value);
            }
            Opcode::Swmc => {
                let address = self.mem.memory_counter.offset(immediate.to_i64());
                self.mem.store(address, self.regs.read(r2))?;
            }

            // ==================== I/O ====================

            Opcode::Piu => {
                let request = self.piu.execute(immediate, r2, &mut self.regs)?;
                self.mem.program_counter.step();
                if let Some(code) = request {
                    self.halt(code);
                }
                return Ok(());
            }

            // ==================== Control Flow ====================

            Opcode::Apceq => {
                if self.regs.read(Reg::X).is_zero() {
                    let delta = immediate + self.regs.read(r2);
                    self.mem.program_counter.add_word(delta);
                    return Ok(());
                }
            }
        }

        self.mem.program_counter.step();
        Ok(())
    }

    /// `r1 = op(r2, r3)`.
    fn binary(&mut self, r1: Reg, r2: Reg, r3: Reg, op: impl FnOnce(Word, Word) -> Word) {
        let result = op(self.regs.read(r2), self.regs.read(r3));
        self.regs.write(r1, result);
    }

    fn halt(&mut self, code: ExitCode) {
        log::info!("halted at {:04X} after {} cycles: {}", self.mem.program_counter.get(), self.cycles, code);
        self.state = CpuState::Halted(code);
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }
}

impl<P> Cpu<P> {
    /// The exit code, once halted.
    pub fn exit_code(&self) -> Option<ExitCode> {
        match self.state {
            CpuState::Running => None,
            CpuState::Halted(code) => Some(code),
        }
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        matches!(self.state, CpuState::Halted(_))
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }

    /// Capture the registers, counters and exit state.
    pub fn snapshot(&self) -> Snapshot {
        let exit = self.exit_code();
        Snapshot {
            program_counter: self.mem.program_counter.get(),
            memory_counter: self.mem.memory_counter.get(),
            registers: self.regs.values().iter().map(|word| word.to_i16()).collect(),
            exit_code: exit.map(|code| code.to_word().to_bits()),
            exit_reason: exit.map(ExitCode::reason),
            cycles: self.cycles,
        }
    }

    /// Human-readable report of the whole machine.
    pub fn render_state(&self, radix: Radix) -> String {
        let exit = match self.exit_code() {
            Some(code) => format!("{}: {}", code.to_word().format(radix), code.reason()),
            None => "none (still running)".to_string(),
        };

        format!(
            "{rule}Memory state{rule}\n\
             Memory:\n{memory}\n\n\
             Exit code {exit}\n\n\
             Memory counter: {mc}\n\
             Program counter: {pc}\n\n\
             Registers:\n{registers}\n\
             {line}",
            rule = "-".repeat(25),
            memory = self.mem.render(radix),
            exit = exit,
            mc = self.mem.memory_counter.format(radix),
            pc = self.mem.program_counter.format(radix),
            registers = self.regs.render(radix),
            line = "-".repeat(62),
        )
    }
}

impl<P> std::fmt::Debug for Cpu<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("mem", &self.mem)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Error)]
pub enum CpuError {
    #[error("CPU not running: halted with {0}")]
    NotRunning(ExitCode),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("peripheral error: {0}")]
    Peripheral(#[from] PeripheralError),
}
