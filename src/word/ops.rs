//! Operator implementations for [`Word`].
//!
//! Arithmetic wraps modulo 2^16 and bitwise operators act on the raw
//! two's complement pattern, so every operator here is total. Division is
//! deliberately absent; see [`Word::checked_div`].

use std::ops::{Add, Sub, Mul, BitAnd, BitOr, BitXor, Not, Neg};
use crate::word::Word;

// Implement a binary operator on Word by delegating to an i16 method
macro_rules! impl_word_binop {
    ($trait:ident, $method:ident, $op:ident) => {
        impl $trait for Word {
            type Output = Word;

            #[inline]
            fn $method(self, rhs: Word) -> Word {
                Word::from(self.to_i16().$op(rhs.to_i16()))
            }
        }
    };
}

impl_word_binop!(Add, add, wrapping_add);
impl_word_binop!(Sub, sub, wrapping_sub);
impl_word_binop!(Mul, mul, wrapping_mul);
impl_word_binop!(BitAnd, bitand, bitand);
impl_word_binop!(BitOr, bitor, bitor);
impl_word_binop!(BitXor, bitxor, bitxor);

impl Not for Word {
    type Output = Word;

    #[inline]
    fn not(self) -> Word {
        Word::from(!self.to_i16())
    }
}

impl Neg for Word {
    type Output = Word;

    #[inline]
    fn neg(self) -> Word {
        Word::from(self.to_i16().wrapping_neg())
    }
}
