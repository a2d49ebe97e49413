//! Fixed-width machine values.
//!
//! This module provides the primitive types every other part of the
//! machine is built from:
//! - [`Word`] - a 16-bit signed value with wraparound arithmetic
//! - [`Counter`] - a modular index used for the program and memory counters
//! - [`Radix`] - the numeric bases used when rendering values for humans

mod word;
mod ops;
mod counter;

pub use word::{Word, Radix};
pub use counter::Counter;
