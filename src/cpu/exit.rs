//! Halt sentinels.
//!
//! Ten reserved words stop the machine when fetched as instructions. Each
//! maps to a reason reported once the run is over.

use std::fmt;
use crate::word::Word;

/// Why the machine halted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitCode {
    /// `0x0000`: fetched an empty cell.
    NoInstructions,
    /// `0x1000`: `div` with a zero divisor.
    DivisionByZero,
    /// `0x2000`..`0x9000`: program or peripheral requested exit. Holds the
    /// leading hex digit (2-9).
    Custom(u8),
}

impl ExitCode {
    /// Every exit code, in sentinel order.
    pub const ALL: [ExitCode; 10] = [
        ExitCode::NoInstructions,
        ExitCode::DivisionByZero,
        ExitCode::Custom(2),
        ExitCode::Custom(3),
        ExitCode::Custom(4),
        ExitCode::Custom(5),
        ExitCode::Custom(6),
        ExitCode::Custom(7),
        ExitCode::Custom(8),
        ExitCode::Custom(9),
    ];

    /// Recognize a sentinel word.
    pub fn from_word(word: Word) -> Option<ExitCode> {
        let bits = word.to_bits();
        if bits & 0x0FFF != 0 {
            return None;
        }
        match bits >> 12 {
            0 => Some(ExitCode::NoInstructions),
            1 => Some(ExitCode::DivisionByZero),
            n @ 2..=9 => Some(ExitCode::Custom(n as u8)),
            _ => None,
        }
    }

    /// Build a custom exit code from its digit, if in 2..=9.
    pub fn custom(digit: u8) -> Option<ExitCode> {
        (2..=9).contains(&digit).then_some(ExitCode::Custom(digit))
    }

    /// The sentinel word for this code.
    pub fn to_word(self) -> Word {
        let digit = match self {
            ExitCode::NoInstructions => 0,
            ExitCode::DivisionByZero => 1,
            ExitCode::Custom(n) => n as u16,
        };
        Word::from_bits(digit << 12)
    }

    /// Human-readable halt reason.
    pub fn reason(self) -> String {
        match self {
            ExitCode::NoInstructions => "No instructions left to execute.".to_string(),
            ExitCode::DivisionByZero => "Division by zero.".to_string(),
            ExitCode::Custom(n) => format!("Custom I/O exit code 0x{:X}000.", n),
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}: {}", self.to_word(), self.reason())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_roundtrip() {
        for code in ExitCode::ALL {
            assert_eq!(ExitCode::from_word(code.to_word()), Some(code));
        }
    }

    #[test]
    fn test_non_sentinels() {
        assert_eq!(ExitCode::from_word(Word::from_bits(0x0001)), None);
        assert_eq!(ExitCode::from_word(Word::from_bits(0xA000)), None);
        assert_eq!(ExitCode::from_word(Word::from_bits(0x2100)), None);
    }

    #[test]
    fn test_reasons() {
        assert_eq!(ExitCode::NoInstructions.reason(), "No instructions left to execute.");
        assert_eq!(ExitCode::DivisionByZero.reason(), "Division by zero.");
        assert_eq!(ExitCode::Custom(7).reason(), "Custom I/O exit code 0x7000.");
        assert_eq!(ExitCode::Custom(3).to_string(), "0x3000: Custom I/O exit code 0x3000.");
    }

    #[test]
    fn test_every_recognized_word_is_in_the_table() {
        let recognized: Vec<ExitCode> = (0..=u16::MAX)
            .filter_map(|bits| ExitCode::from_word(Word::from_bits(bits)))
            .collect();
        assert_eq!(recognized, ExitCode::ALL.to_vec());
    }

    #[test]
    fn test_custom_range() {
        assert_eq!(ExitCode::custom(2), Some(ExitCode::Custom(2)));
        assert_eq!(ExitCode::custom(1), None);
        assert_eq!(ExitCode::custom(10), None);
    }
}
