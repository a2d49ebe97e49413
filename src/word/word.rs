//! The 16-bit machine word.
//!
//! Every register, memory cell and instruction is a [`Word`]. Values are
//! signed and two's complement; constructing a word from any integer reduces
//! it modulo 2^16 first, so no conversion or arithmetic ever fails.

use std::fmt;
use serde::{Serialize, Deserialize};

/// A 16-bit signed machine word.
///
/// Stored in images as 2 bytes, most significant byte first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Word(i16);

/// Numeric base used to render words for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Radix {
    Bin,
    Oct,
    Dec,
    #[default]
    Hex,
}

impl Radix {
    /// Digits needed to show a full 16-bit pattern in this base.
    pub const fn width(self) -> usize {
        match self {
            Radix::Bin => 16,
            Radix::Oct => 6,
            Radix::Dec => 6,
            Radix::Hex => 4,
        }
    }
}

// ============================================================================
// Word Implementation
// ============================================================================

impl Word {
    /// Number of bits in a word.
    pub const BITS: u32 = 16;

    /// Largest representable value: +32,767
    pub const MAX: Word = Word(i16::MAX);

    /// Smallest representable value: -32,768
    pub const MIN: Word = Word(i16::MIN);

    /// The zero word.
    pub const ZERO: Word = Word(0);

    /// Create a word from any integer, wrapping into the signed 16-bit range.
    #[inline]
    pub const fn new(value: i64) -> Self {
        Self(value as i16)
    }

    /// Create a word from its raw bit pattern.
    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits as i16)
    }

    /// The raw bit pattern of this word.
    #[inline]
    pub const fn to_bits(self) -> u16 {
        self.0 as u16
    }

    /// The signed value of this word.
    #[inline]
    pub const fn to_i16(self) -> i16 {
        self.0
    }

    /// The signed value widened to `i64`.
    #[inline]
    pub const fn to_i64(self) -> i64 {
        self.0 as i64
    }

    /// Decode a word from its 2-byte big-endian form.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        Self(i16::from_be_bytes(bytes))
    }

    /// Encode this word as 2 big-endian bytes.
    #[inline]
    pub const fn to_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    /// Check if this word is zero.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Truncating division, `None` when dividing by zero.
    ///
    /// `MIN / -1` wraps back to `MIN`.
    pub fn checked_div(self, rhs: Word) -> Option<Word> {
        if rhs.is_zero() {
            return None;
        }
        Some(Word(self.0.wrapping_div(rhs.0)))
    }

    /// Shift by a signed amount.
    ///
    /// A positive amount shifts right (arithmetic, the sign is kept), a
    /// negative amount shifts left by its absolute value. Amounts of 16 or
    /// more shift every bit out.
    pub fn shift(self, amount: Word) -> Word {
        let amount = amount.to_i64();
        if amount >= 0 {
            let n = amount.min(Self::BITS as i64 - 1) as u32;
            Word(self.0 >> n)
        } else {
            let n = amount.unsigned_abs();
            if n >= Self::BITS as u64 {
                Word::ZERO
            } else {
                Word(((self.0 as u16) << n) as i16)
            }
        }
    }

    /// Sign of the value as a word: 1, -1 or 0.
    pub const fn signum(self) -> Word {
        Word(self.0.signum())
    }

    /// Render in the given base.
    ///
    /// Decimal shows the signed value; the other bases show the raw 16-bit
    /// pattern zero-padded to full width.
    pub fn format(self, radix: Radix) -> String {
        let bits = self.to_bits();
        match radix {
            Radix::Bin => format!("{:016b}", bits),
            Radix::Oct => format!("{:06o}", bits),
            Radix::Dec => format!("{}", self.0),
            Radix::Hex => format!("{:04X}", bits),
        }
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word(0x{:04X} = {})", self.to_bits(), self.0)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::UpperHex for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.to_bits(), f)
    }
}

impl fmt::LowerHex for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.to_bits(), f)
    }
}

impl fmt::Binary for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(&self.to_bits(), f)
    }
}

impl From<i16> for Word {
    fn from(value: i16) -> Self {
        Word(value)
    }
}

impl From<Word> for i16 {
    fn from(word: Word) -> Self {
        word.0
    }
}

impl From<Word> for i64 {
    fn from(word: Word) -> Self {
        word.0 as i64
    }
}

// ============================================================================
// Tests
// ============================================================================
