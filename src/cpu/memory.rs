//! Word-addressable main memory.
//!
//! Memory is sized in bytes at construction and holds `bytes / 2` words.
//! It also owns the two machine counters: the program counter starts at
//! address 0 and the memory counter starts in the middle of memory, where
//! the data segment begins.

use std::fmt;
use std::num::NonZeroUsize;
use crate::word::{Word, Counter, Radix};
use thiserror::Error;

/// Words shown per row by [`Memory::render`].
pub const ROW_WIDTH: usize = 8;

/// Main memory with its program and memory counters.
#[derive(Clone)]
pub struct Memory {
    cells: Vec<Word>,
    /// Address of the next instruction to fetch.
    pub program_counter: Counter,
    /// Base address for `lwmc`/`swmc` offsets.
    pub memory_counter: Counter,
}

impl Memory {
    /// Create a zeroed memory of `byte_size` bytes.
    ///
    /// The size must be a non-zero even number of bytes.
    pub fn new(byte_size: usize) -> Result<Self, MemoryError> {
        if byte_size % 2 != 0 {
            return Err(MemoryError::InvalidSize(byte_size));
        }
        let capacity = NonZeroUsize::new(byte_size / 2)
            .ok_or(MemoryError::InvalidSize(byte_size))?;

        Ok(Self {
            cells: vec![Word::ZERO; capacity.get()],
            program_counter: Counter::new(capacity, 0),
            memory_counter: Counter::new(capacity, capacity.get() / 2),
        })
    }

    /// Number of addressable words.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Read the word at `address`.
    pub fn load(&self, address: usize) -> Result<Word, MemoryError> {
        self.cells
            .get(address)
            .copied()
            .ok_or(MemoryError::IndexOutOfRange { address, capacity: self.capacity() })
    }

    /// Write `word` at `address`.
    pub fn store(&mut self, address: usize, word: Word) -> Result<(), MemoryError> {
        let capacity = self.capacity();
        let cell = self.cells
            .get_mut(address)
            .ok_or(MemoryError::IndexOutOfRange { address, capacity })?;
        *cell = word;
        Ok(())
    }

    /// Load a big-endian byte stream into memory starting at address 0.
    ///
    /// A trailing odd byte becomes the high byte of the last word. Cells past
    /// the end of the program keep their contents.
    pub fn load_program(&mut self, bytes: &[u8]) -> Result<(), MemoryError> {
        let available = self.capacity() * 2;
        if bytes.len() > available {
            return Err(MemoryError::Overflow { size: bytes.len(), available });
        }

        for (address, chunk) in bytes.chunks(2).enumerate() {
            let low = chunk.get(1).copied().unwrap_or(0);
            self.store(address, Word::from_bytes([chunk[0], low]))?;
        }

        Ok(())
    }

    /// Serialize every word in address order.
    pub fn dump(&self) -> Vec<u8> {
        self.cells.iter().flat_map(|word| word.to_bytes()).collect()
    }

    /// All words, in address order.
    pub fn words(&self) -> &[Word] {
        &self.cells
    }

    /// Render memory as rows of [`ROW_WIDTH`] words, each row prefixed with
    /// its starting address in hex.
    pub fn render(&self, radix: Radix) -> String {
        self.cells
            .chunks(ROW_WIDTH)
            .enumerate()
            .map(|(row, words)| {
                let values: Vec<String> = words
                    .iter()
                    .map(|word| format!("{:>width$}", word.format(radix), width = radix.width()))
                    .collect();
                format!("{:04X}: {}", row * ROW_WIDTH, values.join(" "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Radix::Hex))
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only count non-zero cells
        let non_zero = self.cells.iter().filter(|cell| !cell.is_zero()).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &self.capacity())
            .field("program_counter", &self.program_counter)
            .field("memory_counter", &self.memory_counter)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("{0} bytes is not a valid memory size (must be even and non-zero)")]
    InvalidSize(usize),

    #[error("word address {address} doesn't exist inside {capacity} words long memory")]
    IndexOutOfRange { address: usize, capacity: usize },

    #[error("program of {size} bytes doesn't fit inside {available} bytes of memory")]
    Overflow { size: usize, available: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_memory_sizes() {
        let mem = Memory::new(16).unwrap();
        assert_eq!(mem.capacity(), 8);
        assert_eq!(mem.program_counter.get(), 0);
        assert_eq!(mem.memory_counter.get(), 4);

        assert_eq!(Memory::new(0).unwrap_err(), MemoryError::InvalidSize(0));
        assert_eq!(Memory::new(7).unwrap_err(), MemoryError::InvalidSize(7));
    }

    #[test]
    fn test_memory_load_store() {
        let mut mem = Memory::new(16).unwrap();
        mem.store(3, Word::new(42)).unwrap();
        assert_eq!(mem.load(3).unwrap(), Word::new(42));
        assert_eq!(mem.load(4).unwrap(), Word::ZERO);
    }

    #[test]
    fn test_memory_bounds() {
        let mut mem = Memory::new(16).unwrap();
        assert!(mem.load(7).is_ok());
        assert_eq!(
            mem.load(8).unwrap_err(),
            MemoryError::IndexOutOfRange { address: 8, capacity: 8 }
        );
        assert!(mem.store(8, Word::new(1)).is_err());
    }

    #[test]
    fn test_load_program() {
        let mut mem = Memory::new(8).unwrap();
        mem.store(3, Word::new(99)).unwrap();
        mem.load_program(&[0x00, 0x01, 0xFF, 0xFF]).unwrap();

        assert_eq!(mem.load(0).unwrap(), Word::new(1));
        assert_eq!(mem.load(1).unwrap(), Word::new(-1));
        assert_eq!(mem.load(3).unwrap(), Word::new(99));
    }

    #[test]
    fn test_load_program_odd_length() {
        let mut mem = Memory::new(4).unwrap();
        mem.load_program(&[0x12, 0x34, 0x56]).unwrap();
        assert_eq!(mem.dump(), vec![0x12, 0x34, 0x56, 0x00]);
    }

    #[test]
    fn test_load_program_overflow() {
        let mut mem = Memory::new(4).unwrap();
        assert_eq!(
            mem.load_program(&[0; 5]).unwrap_err(),
            MemoryError::Overflow { size: 5, available: 4 }
        );
        assert!(mem.load_program(&[0; 4]).is_ok());
    }

    #[test]
    fn test_render_rows() {
        let mut mem = Memory::new(32).unwrap();
        mem.store(0, Word::new(-1)).unwrap();
        mem.store(8, Word::new(0x1A)).unwrap();

        let rendered = mem.render(Radix::Hex);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "0000: FFFF 0000 0000 0000 0000 0000 0000 0000");
        assert!(lines[1].starts_with("0008: 001A"));
    }

    proptest! {
        #[test]
        fn prop_dump_reproduces_loaded_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..=64)) {
            let mut mem = Memory::new(64).unwrap();
            mem.load_program(&bytes).unwrap();

            let mut expected = bytes.clone();
            expected.resize(64, 0);
            prop_assert_eq!(mem.dump(), expected);
        }
    }
}
