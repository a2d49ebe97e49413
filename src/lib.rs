//! # Zedecim
//!
//! An emulator of the Zedecim, a small 16-bit virtual processor.
//!
//! The machine has sixteen word registers, a word-addressable memory walked
//! by a program counter and a memory counter, sixteen instructions packed
//! into single words, and a peripherals interface unit for I/O. Programs are
//! flat big-endian binary images, or assembler sources turned into one.

pub mod word;
pub mod cpu;
pub mod asm;
pub mod config;
pub mod emulator;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types
pub use word::{Word, Counter, Radix};
pub use cpu::{Cpu, CpuState, CpuError, ExitCode, Memory, Registers, Instruction, Peripheral, Console};
pub use asm::{assemble, disassemble, AssemblerError};
pub use config::{MachineConfig, ConfigError};
pub use emulator::{Emulator, EmulatorError, RunReport};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
