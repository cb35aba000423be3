//! Fixed-width torus elements stored in a machine word.
//!
//! `x ∈ [0, 1)` is stored as `x · 2^w`; wrapping integer arithmetic is the
//! reduction modulo 1.

use crate::torus::Torus;
use rand::Rng;

/// Precision descriptor of the native backends: the word width is implied
/// by the element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NativeWidth;

macro_rules! native_torus {
    ($(#[$meta:meta])* $name:ident, $word:ty, $signed:ty, $wide:ty, $bits:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub $word);

        impl Torus for $name {
            type Precision = NativeWidth;

            #[inline]
            fn precision_bits(_: &NativeWidth) -> u32 {
                $bits
            }

            fn precision_from_bits(bits: u32) -> Option<NativeWidth> {
                (bits == $bits).then_some(NativeWidth)
            }

            #[inline]
            fn zero(_: &NativeWidth) -> Self {
                Self(0)
            }

            #[inline]
            fn add_assign(&mut self, rhs: &Self, _: &NativeWidth) {
                self.0 = self.0.wrapping_add(rhs.0);
            }

            #[inline]
            fn sub_assign(&mut self, rhs: &Self, _: &NativeWidth) {
                self.0 = self.0.wrapping_sub(rhs.0);
            }

            #[inline]
            fn neg(&self, _: &NativeWidth) -> Self {
                Self(self.0.wrapping_neg())
            }

            #[inline]
            fn add_mul_int(&mut self, rhs: &Self, k: i64, _: &NativeWidth) {
                // Truncating k keeps it exact modulo 2^w.
                self.0 = self.0.wrapping_add(rhs.0.wrapping_mul(k as $word));
            }

            fn from_real(x: f64, _: &NativeWidth) -> Self {
                let frac = x - x.trunc();
                let scaled = (frac * (1u128 << $bits) as f64).round() as $wide;
                Self(scaled as $word)
            }

            fn to_real(&self, _: &NativeWidth) -> f64 {
                (self.0 as $signed) as f64 / (1u128 << $bits) as f64
            }

            #[inline]
            fn to_dyadic(&self, log_m: u32, _: &NativeWidth) -> u64 {
                assert!(
                    log_m <= $bits,
                    "dyadic exponent {log_m} exceeds torus precision {}",
                    $bits
                );
                if log_m == 0 {
                    0
                } else {
                    (self.0 >> ($bits - log_m)) as u64
                }
            }

            #[inline]
            fn from_dyadic(v: u64, log_m: u32, _: &NativeWidth) -> Self {
                assert!(
                    log_m <= $bits,
                    "dyadic exponent {log_m} exceeds torus precision {}",
                    $bits
                );
                if log_m == 0 {
                    Self(0)
                } else {
                    Self((v as $word).wrapping_shl($bits - log_m))
                }
            }

            fn uniform<R: Rng + ?Sized>(_: &NativeWidth, rng: &mut R) -> Self {
                Self(rng.random::<$word>())
            }

            fn word_count(_: &NativeWidth) -> usize {
                1
            }

            fn write_words(&self, out: &mut Vec<u64>) {
                out.push(self.0 as u64);
            }

            fn read_words(words: &[u64], _: &NativeWidth) -> Option<Self> {
                match words {
                    [w] => <$word>::try_from(*w).ok().map(Self),
                    _ => None,
                }
            }
        }
    };
}

native_torus!(
    /// Torus element with 32 bits of precision.
    Torus32, u32, i32, i64, 32
);
native_torus!(
    /// Torus element with 64 bits of precision.
    Torus64, u64, i64, i128, 64
);
