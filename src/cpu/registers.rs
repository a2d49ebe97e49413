//! The register bank.
//!
//! Sixteen word-sized slots, selected by a 4-bit field in the instruction:
//! - `r0`..`r14`: general purpose
//! - `x` (slot 15): the flag register tested by `apceq`

use std::fmt;
use std::str::FromStr;
use crate::word::{Word, Radix};
use thiserror::Error;

/// Number of register slots.
pub const REGISTER_COUNT: usize = 16;

/// A register selector (0-15).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Reg(u8);

impl Reg {
    /// The flag register tested by conditional branches.
    pub const X: Reg = Reg(15);

    /// Create a selector from its index, if in range.
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < REGISTER_COUNT {
            Some(Reg(index))
        } else {
            None
        }
    }

    /// Create a selector from the low 4 bits of `bits`.
    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        Reg((bits & 0xF) as u8)
    }

    /// Slot index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Selector bits as used by the instruction encoding.
    #[inline]
    pub const fn bits(self) -> u16 {
        self.0 as u16
    }

    /// Iterate over every register in slot order.
    pub fn all() -> impl Iterator<Item = Reg> {
        (0..REGISTER_COUNT as u8).map(Reg)
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Reg::X {
            write!(f, "x")
        } else {
            write!(f, "r{}", self.0)
        }
    }
}

impl fmt::Debug for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reg({})", self)
    }
}

impl FromStr for Reg {
    type Err = RegisterError;

    /// Parse `r0`..`r15` or `x`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if name == "x" {
            return Ok(Reg::X);
        }
        name.strip_prefix('r')
            .and_then(|digits| digits.parse::<u8>().ok())
            .and_then(Reg::new)
            .ok_or_else(|| RegisterError::UnknownName(s.trim().to_string()))
    }
}

/// Errors naming a register.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("unknown register: {0}")]
    UnknownName(String),
}

/// The register file.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Registers {
    slots: [Word; REGISTER_COUNT],
}

impl Registers {
    /// Create a register file with all slots zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a register.
    #[inline]
    pub fn read(&self, reg: Reg) -> Word {
        self.slots[reg.index()]
    }

    /// Write a register.
    #[inline]
    pub fn write(&mut self, reg: Reg, value: Word) {
        self.slots[reg.index()] = value;
    }

    /// All slot values in order.
    pub fn values(&self) -> &[Word; REGISTER_COUNT] {
        &self.slots
    }

    /// Render as `name: value` pairs, four per line.
    pub fn render(&self, radix: Radix) -> String {
        let entries: Vec<String> = Reg::all()
            .map(|reg| format!("{:>3}: {:>width$}", reg.to_string(), self.read(reg).format(radix), width = radix.width()))
            .collect();
        entries
            .chunks(4)
            .map(|row| row.join("  "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Debug for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only show non-zero registers
        let mut map = f.debug_map();
        for reg in Reg::all().filter(|reg| !self.read(*reg).is_zero()) {
            map.entry(&reg, &self.read(reg).to_i16());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reg_parse() {
        assert_eq!("r0".parse::<Reg>().unwrap(), Reg::new(0).unwrap());
        assert_eq!("R14".parse::<Reg>().unwrap(), Reg::new(14).unwrap());
        assert_eq!("x".parse::<Reg>().unwrap(), Reg::X);
        assert_eq!("r15".parse::<Reg>().unwrap(), Reg::X);
        assert!("r16".parse::<Reg>().is_err());
        assert!("y".parse::<Reg>().is_err());
        assert!("r".parse::<Reg>().is_err());
    }

    #[test]
    fn test_reg_display() {
        assert_eq!(Reg::new(3).unwrap().to_string(), "r3");
        assert_eq!(Reg::X.to_string(), "x");
    }

    #[test]
    fn test_read_write() {
        let mut regs = Registers::new();
        let r4 = Reg::new(4).unwrap();

        regs.write(r4, Word::new(-7));
        assert_eq!(regs.read(r4), Word::new(-7));
        assert_eq!(regs.read(Reg::X), Word::ZERO);
    }

    #[test]
    fn test_render() {
        let mut regs = Registers::new();
        regs.write(Reg::X, Word::new(5));

        let rendered = regs.render(Radix::Dec);
        assert_eq!(rendered.lines().count(), 4);
        assert!(rendered.contains("  x:      5"));
    }
}
