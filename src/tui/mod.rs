//! TUI debugger for the Zedecim emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register and counter view
//! - Memory view with the program counter highlighted
//! - Step/run/breakpoint controls
//! - Disassembly view and captured peripheral output

mod app;
mod ui;

pub use app::{DebuggerApp, DebuggerCpu, run_debugger};
