//! Peripherals interface unit.
//!
//! The `piu` instruction hands a command number and a register to a
//! [`Peripheral`]. The peripheral may read or write that register and may
//! ask the machine to halt with a custom exit code.

use std::io::{self, BufRead, Read, Write};
use crate::word::Word;
use crate::cpu::registers::{Reg, Registers};
use crate::cpu::exit::ExitCode;
use thiserror::Error;

/// Console command numbers understood by [`Console`].
pub mod commands {
    /// Write the register as a signed decimal line.
    pub const WRITE_INT: i16 = 0;
    /// Write the register's low byte as a character.
    pub const WRITE_CHAR: i16 = 1;
    /// Read a signed integer line into the register.
    pub const READ_INT: i16 = 2;
    /// Read one byte into the register, -1 at end of input.
    pub const READ_CHAR: i16 = 3;
    /// Halt with the custom exit code held in the register.
    pub const EXIT: i16 = 4;
}

/// A device reachable through the `piu` instruction.
pub trait Peripheral {
    /// Run `command` against `register`.
    ///
    /// Returning `Some(code)` halts the machine after the instruction.
    fn execute(
        &mut self,
        command: Word,
        register: Reg,
        registers: &mut Registers,
    ) -> Result<Option<ExitCode>, PeripheralError>;
}

/// Text console over any reader/writer pair.
#[derive(Debug)]
pub struct Console<R, W> {
    input: R,
    output: W,
}

/// A console attached to the process's standard streams.
pub type StdConsole = Console<io::StdinLock<'static>, io::Stdout>;

impl StdConsole {
    /// Console on stdin/stdout.
    pub fn stdio() -> Self {
        Console::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// Create a console.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Borrow the output sink.
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Split back into reader and writer.
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    fn read_int(&mut self) -> Result<Word, PeripheralError> {
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        let text = line.trim();
        text.parse::<i64>()
            .map(Word::new)
            .map_err(|_| PeripheralError::InvalidInput(text.to_string()))
    }

    fn read_char(&mut self) -> Result<Word, PeripheralError> {
        let mut byte = [0u8; 1];
        let read = self.input.read(&mut byte)?;
        Ok(if read == 0 { Word::new(-1) } else { Word::new(byte[0] as i64) })
    }
}

impl<R: BufRead, W: Write> Peripheral for Console<R, W> {
    fn execute(
        &mut self,
        command: Word,
        register: Reg,
        registers: &mut Registers,
    ) -> Result<Option<ExitCode>, PeripheralError> {
        let value = registers.read(register);

        match command.to_i16() {
            commands::WRITE_INT => {
                writeln!(self.output, "{}", value)?;
                self.output.flush()?;
            }
            commands::WRITE_CHAR => {
                self.output.write_all(&[value.to_bits() as u8])?;
                self.output.flush()?;
            }
            commands::READ_INT => {
                let word = self.read_int()?;
                registers.write(register, word);
            }
            commands::READ_CHAR => {
                let word = self.read_char()?;
                registers.write(register, word);
            }
            commands::EXIT => {
                return match ExitCode::from_word(value) {
                    Some(code @ ExitCode::Custom(_)) => Ok(Some(code)),
                    _ => Err(PeripheralError::InvalidExitCode(value)),
                };
            }
            other => return Err(PeripheralError::UnknownCommand(other)),
        }

        Ok(None)
    }
}

/// Errors raised by peripherals.
#[derive(Debug, Error)]
pub enum PeripheralError {
    #[error("unknown peripheral command: {0}")]
    UnknownCommand(i16),

    #[error("invalid input: {0:?}")]
    InvalidInput(String),

    #[error("0x{0:04X} is not a custom exit code")]
    InvalidExitCode(Word),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
