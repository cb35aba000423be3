//! Arbitrary-precision torus elements on `crypto_bigint::Uint`.
//!
//! A value `x` is stored as `x · 2^W` with `W = 64 · LIMBS`, so overflow of
//! the limb array is the reduction modulo 1 exactly as on the native
//! backends. The declared precision `bits ≤ W` is enforced by keeping the
//! `W - bits` low bits at zero.
//!
//! # Invariants
//!
//! - `1 ≤ precision.bits ≤ W`.
//! - `value & !precision.keep_mask == 0` for every element produced by this
//!   module. Addition, subtraction, negation and integer multiples preserve
//!   it because the low bits of both operands are zero.

use crate::errors::{TfheError, TfheResult};
use crate::torus::Torus;
use crypto_bigint::Uint;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BigTorus<const LIMBS: usize>(pub Uint<LIMBS>);

/// Runtime precision of a [`BigTorus`]: the modulus is `2^bits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BigPrecision<const LIMBS: usize> {
    bits: u32,
    keep_mask: Uint<LIMBS>,
}

impl<const LIMBS: usize> BigPrecision<LIMBS> {
    const WIDTH: u32 = Uint::<LIMBS>::BITS as u32;

    pub fn new(bits: u32) -> TfheResult<Self> {
        if bits == 0 || bits > Self::WIDTH {
            return Err(TfheError::invalid(format!(
                "torus precision must be in [1, {}] bits, got {bits}",
                Self::WIDTH
            )));
        }
        Ok(Self {
            bits,
            keep_mask: Uint::MAX << (Self::WIDTH - bits),
        })
    }

    /// Full-width precision (`bits = 64 · LIMBS`).
    pub fn full() -> Self {
        Self {
            bits: Self::WIDTH,
            keep_mask: Uint::MAX,
        }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    fn check_exponent(&self, log_m: u32) {
        assert!(
            log_m <= self.bits,
            "dyadic exponent {log_m} exceeds torus precision {}",
            self.bits
        );
    }
}

impl<const LIMBS: usize> BigTorus<LIMBS> {
    const WIDTH: u32 = Uint::<LIMBS>::BITS as u32;

    /// Top 64 bits of the stored value.
    #[inline]
    fn top_word(&self) -> u64 {
        (self.0 >> (Self::WIDTH - 64)).as_words()[0]
    }

    /// Mantissa/exponent placement of `mag ∈ [0, 1)` at full width,
    /// truncating below bit 0.
    fn place_fraction(mag: f64) -> Uint<LIMBS> {
        let raw = mag.to_bits();
        let exp_field = ((raw >> 52) & 0x7ff) as i32;
        let fraction = raw & ((1u64 << 52) - 1);
        let (mantissa, exponent) = if exp_field == 0 {
            (fraction, -1074)
        } else {
            (fraction | (1u64 << 52), exp_field - 1075)
        };
        // mag < 1 implies exponent <= -53, hence shift < WIDTH.
        let shift = Self::WIDTH as i32 + exponent;
        if shift >= 0 {
            Uint::from_u64(mantissa) << shift as u32
        } else if shift > -64 {
            Uint::from_u64(mantissa >> (-shift) as u32)
        } else {
            Uint::ZERO
        }
    }
}

impl<const LIMBS: usize> Torus for BigTorus<LIMBS> {
    type Precision = BigPrecision<LIMBS>;

    #[inline]
    fn precision_bits(precision: &Self::Precision) -> u32 {
        precision.bits
    }

    fn precision_from_bits(bits: u32) -> Option<Self::Precision> {
        BigPrecision::new(bits).ok()
    }

    #[inline]
    fn zero(_: &Self::Precision) -> Self {
        Self(Uint::ZERO)
    }

    #[inline]
    fn add_assign(&mut self, rhs: &Self, _: &Self::Precision) {
        self.0 = self.0.wrapping_add(&rhs.0);
    }

    #[inline]
    fn sub_assign(&mut self, rhs: &Self, _: &Self::Precision) {
        self.0 = self.0.wrapping_sub(&rhs.0);
    }

    #[inline]
    fn neg(&self, _: &Self::Precision) -> Self {
        Self(Uint::ZERO.wrapping_sub(&self.0))
    }

    fn add_mul_int(&mut self, rhs: &Self, k: i64, _: &Self::Precision) {
        // Two's-complement sign extension of k to the full limb width.
        let mut words = [(k >> 63) as u64; LIMBS];
        words[0] = k as u64;
        let factor = Uint::from_words(words);
        self.0 = self.0.wrapping_add(&rhs.0.wrapping_mul(&factor));
    }

    fn from_real(x: f64, precision: &Self::Precision) -> Self {
        let frac = x - x.trunc();
        let mut value = Self::place_fraction(frac.abs());
        if precision.bits < Self::WIDTH {
            let half_ulp = Uint::ONE << (Self::WIDTH - precision.bits - 1);
            value = value.wrapping_add(&half_ulp) & precision.keep_mask;
        }
        if frac < 0.0 {
            value = Uint::ZERO.wrapping_sub(&value);
        }
        Self(value)
    }

    fn to_real(&self, _: &Self::Precision) -> f64 {
        self.top_word() as i64 as f64 / 2f64.powi(64)
    }

    #[inline]
    fn to_dyadic(&self, log_m: u32, precision: &Self::Precision) -> u64 {
        precision.check_exponent(log_m);
        if log_m == 0 {
            0
        } else {
            (self.0 >> (Self::WIDTH - log_m)).as_words()[0]
        }
    }

    #[inline]
    fn from_dyadic(v: u64, log_m: u32, precision: &Self::Precision) -> Self {
        precision.check_exponent(log_m);
        if log_m == 0 {
            Self(Uint::ZERO)
        } else {
            Self(Uint::from_u64(v) << (Self::WIDTH - log_m))
        }
    }

    fn uniform<R: Rng + ?Sized>(precision: &Self::Precision, rng: &mut R) -> Self {
        let mut words = [0u64; LIMBS];
        for word in &mut words {
            *word = rng.random::<u64>();
        }
        Self(Uint::from_words(words) & precision.keep_mask)
    }

    fn word_count(_: &Self::Precision) -> usize {
        LIMBS
    }

    fn write_words(&self, out: &mut Vec<u64>) {
        out.extend_from_slice(self.0.as_words());
    }

    fn read_words(words: &[u64], precision: &Self::Precision) -> Option<Self> {
        let words: [u64; LIMBS] = words.try_into().ok()?;
        let value = Uint::from_words(words);
        ((value & !precision.keep_mask) == Uint::ZERO).then_some(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    type T2 = BigTorus<2>;

    fn low_bits_clear(x: &T2, p: &BigPrecision<2>) -> bool {
        (x.0 & !p.keep_mask) == Uint::ZERO
    }

    #[test]
    fn precision_rejects_out_of_range_bits() {
        assert!(BigPrecision::<2>::new(0).is_err());
        assert!(BigPrecision::<2>::new(129).is_err());
        assert_eq!(BigPrecision::<2>::new(128).unwrap(), BigPrecision::full());
        assert_eq!(BigPrecision::<2>::new(100).unwrap().bits(), 100);
    }

    #[test]
    fn from_real_rounds_to_declared_precision() {
        let p = BigPrecision::<2>::new(20).unwrap();
        let x = T2::from_real(0.3, &p);
        assert!(low_bits_clear(&x, &p));
        assert!((x.to_real(&p) - 0.3).abs() <= 2f64.powi(-21));

        let neg = T2::from_real(-0.3, &p);
        assert!(low_bits_clear(&neg, &p));
        assert!((neg.to_real(&p) + 0.3).abs() <= 2f64.powi(-21));
    }

    #[test]
    fn tiny_values_keep_their_magnitude() {
        let p = BigPrecision::<2>::full();
        let e = 2f64.powi(-90);
        let x = T2::from_real(e, &p);
        assert_eq!(x.0, Uint::ONE << 38);
        let neg = T2::from_real(-e, &p);
        let mut sum = x;
        sum.add_assign(&neg, &p);
        assert_eq!(sum, T2::zero(&p));
    }

    #[test]
    fn arithmetic_preserves_zero_low_bits() {
        let p = BigPrecision::<2>::new(72).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let a = T2::uniform(&p, &mut rng);
        let b = T2::uniform(&p, &mut rng);
        assert!(low_bits_clear(&a, &p) && low_bits_clear(&b, &p));

        let mut acc = a;
        acc.sub_assign(&b, &p);
        acc.add_mul_int(&b, -17, &p);
        assert!(low_bits_clear(&acc, &p));
        assert!(low_bits_clear(&acc.neg(&p), &p));
    }

    #[test]
    fn add_mul_int_matches_repeated_subtraction() {
        let p = BigPrecision::<2>::full();
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let base = T2::uniform(&p, &mut rng);
        let rhs = T2::uniform(&p, &mut rng);

        let mut fast = base;
        fast.add_mul_int(&rhs, -3, &p);
        let mut slow = base;
        for _ in 0..3 {
            slow.sub_assign(&rhs, &p);
        }
        assert_eq!(fast, slow);
    }

    #[test]
    fn dyadic_views_cross_limb_boundaries() {
        let p = BigPrecision::<2>::new(100).unwrap();
        let x = T2::from_dyadic(0b1011, 70, &p);
        assert_eq!(x.to_dyadic(70, &p), 0b1011);
        assert_eq!(x.to_dyadic(67, &p), 0b1);
        assert_eq!(x.to_dyadic(0, &p), 0);
        assert_eq!(T2::from_dyadic(1, 1, &p).to_real(&p), -0.5);
    }

    #[test]
    #[should_panic(expected = "dyadic exponent 101 exceeds torus precision 100")]
    fn from_dyadic_rejects_excess_precision() {
        let p = BigPrecision::<2>::new(100).unwrap();
        let _ = T2::from_dyadic(1, 101, &p);
    }

    #[test]
    fn word_view_enforces_precision() {
        let p = BigPrecision::<2>::new(64).unwrap();
        let x = T2::from_real(0.125, &p);
        let mut words = Vec::new();
        x.write_words(&mut words);
        assert_eq!(words.len(), T2::word_count(&p));
        assert_eq!(T2::read_words(&words, &p), Some(x));
        assert_eq!(T2::read_words(&[1, 0], &p), None);
        assert_eq!(T2::read_words(&[0], &p), None);
    }
}
