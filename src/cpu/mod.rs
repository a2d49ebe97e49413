//! CPU emulation for the Zedecim machine.
//!
//! This module implements the complete architecture:
//! - word-addressable memory with program and memory counters
//! - 16 registers, `x` doubling as the branch flag
//! - a 16-instruction set in a single 16-bit word format
//! - a peripherals interface unit for I/O and custom exits

pub mod memory;
pub mod registers;
pub mod decode;
pub mod exit;
pub mod piu;
pub mod execute;

pub use memory::{Memory, MemoryError};
pub use registers::{Reg, Registers, RegisterError};
pub use decode::{Instruction, Opcode, Format, DecodeError, decode, encode};
pub use exit::ExitCode;
pub use piu::{Peripheral, PeripheralError, Console, StdConsole};
pub use execute::{Cpu, CpuError, CpuState, Snapshot};
