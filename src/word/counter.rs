//! Modular counters.
//!
//! The program counter and the memory counter are both [`Counter`]s bound
//! to the memory's word count. They never leave `[0, capacity)`: every
//! update wraps instead of failing.

use std::fmt;
use std::num::NonZeroUsize;
use crate::word::{Word, Radix};

/// An index in `[0, capacity)` with wrapping updates.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    capacity: NonZeroUsize,
    value: usize,
}

impl Counter {
    /// Create a counter; `initial` is reduced modulo `capacity`.
    pub fn new(capacity: NonZeroUsize, initial: usize) -> Self {
        Self {
            capacity,
            value: initial % capacity.get(),
        }
    }

    /// The current index.
    #[inline]
    pub fn get(&self) -> usize {
        self.value
    }

    /// The fixed modulus.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Index reached by moving `delta` from the current value, without
    /// updating the counter.
    pub fn offset(&self, delta: i64) -> usize {
        let capacity = self.capacity.get() as i128;
        (self.value as i128 + delta as i128).rem_euclid(capacity) as usize
    }

    /// Move by a signed delta, wrapping at both ends.
    pub fn add(&mut self, delta: i64) {
        self.value = self.offset(delta);
    }

    /// Move by a word-valued delta.
    pub fn add_word(&mut self, delta: Word) {
        self.add(delta.to_i64());
    }

    /// Advance by one.
    #[inline]
    pub fn step(&mut self) {
        self.add(1);
    }

    /// Render the index in the given base.
    pub fn format(&self, radix: Radix) -> String {
        match radix {
            Radix::Bin => format!("{:b}", self.value),
            Radix::Oct => format!("{:o}", self.value),
            Radix::Dec => format!("{}", self.value),
            Radix::Hex => format!("{:04X}", self.value),
        }
    }
}

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Counter({} mod {})", self.value, self.capacity)
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
