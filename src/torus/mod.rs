//! Torus arithmetic: real numbers modulo 1.
//!
//! Every backend stores `x · 2^w` in wrapping integer storage, so the
//! integer overflow of `add`/`sub` is exactly the reduction modulo 1. Two
//! primitives, [`Torus::to_dyadic`] and [`Torus::from_dyadic`], expose the
//! value at a chosen binary position; rounding, mod-switching, gadget
//! decomposition and key-switch digit extraction are all written once on top
//! of them.
//!
//! Rounding convention: round half up. `mod_switch_from_torus(x, M)` returns
//! `⌊M·x + 1/2⌋ mod M` for the `[0, 1)` representative of `x`, on every
//! backend. Encoding (`mod_switch_to_torus`) is exact, so encode and decode
//! never disagree on a tie.

pub mod backends;

pub use backends::{BigPrecision, BigTorus, NativeWidth, Torus32, Torus64};

use crate::errors::{TfheError, TfheResult};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::fmt::Debug;

/// An element of `R/Z` at a backend-specific precision.
///
/// All operations except trivial accessors take the precision descriptor
/// explicitly, so algorithms generic over `T: Torus` run unmodified on the
/// fixed-width and the arbitrary-precision backends.
pub trait Torus: Copy + Debug + PartialEq + Eq + Send + Sync + 'static {
    /// Precision descriptor (native word width or big-integer modulus).
    type Precision: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Number of significant fractional bits.
    fn precision_bits(precision: &Self::Precision) -> u32;

    /// Rebuilds a precision descriptor from its bit count, if supported.
    fn precision_from_bits(bits: u32) -> Option<Self::Precision>;

    fn zero(precision: &Self::Precision) -> Self;

    fn add_assign(&mut self, rhs: &Self, precision: &Self::Precision);

    fn sub_assign(&mut self, rhs: &Self, precision: &Self::Precision);

    fn neg(&self, precision: &Self::Precision) -> Self;

    /// `self += k · rhs`, without branching on the sign or value of `k`.
    fn add_mul_int(&mut self, rhs: &Self, k: i64, precision: &Self::Precision);

    /// Nearest torus element to the real `x` (debug/plaintext encoding).
    fn from_real(x: f64, precision: &Self::Precision) -> Self;

    /// Signed representative in `[-1/2, 1/2)`.
    fn to_real(&self, precision: &Self::Precision) -> f64;

    /// `⌊x · 2^log_m⌋ mod 2^64`.
    ///
    /// # Panics
    ///
    /// Panics if `log_m` exceeds the precision.
    fn to_dyadic(&self, log_m: u32, precision: &Self::Precision) -> u64;

    /// `v · 2^(-log_m) mod 1`.
    ///
    /// # Panics
    ///
    /// Panics if `log_m` exceeds the precision.
    fn from_dyadic(v: u64, log_m: u32, precision: &Self::Precision) -> Self;

    fn uniform<R: Rng + ?Sized>(precision: &Self::Precision, rng: &mut R) -> Self;

    /// Number of `u64` words in the flattened form of one element.
    fn word_count(precision: &Self::Precision) -> usize;

    fn write_words(&self, out: &mut Vec<u64>);

    /// Inverse of [`Torus::write_words`]; `None` if the words do not encode a
    /// value at this precision.
    fn read_words(words: &[u64], precision: &Self::Precision) -> Option<Self>;

    // ─── Provided algorithms ────────────────────────────────────────────────

    fn sub(&self, rhs: &Self, precision: &Self::Precision) -> Self {
        let mut out = *self;
        out.sub_assign(rhs, precision);
        out
    }

    /// Centered Gaussian sample of standard deviation `std_dev`.
    ///
    /// # Panics
    ///
    /// Panics if `std_dev` is negative or not finite.
    fn gaussian<R: Rng + ?Sized>(
        std_dev: f64,
        precision: &Self::Precision,
        rng: &mut R,
    ) -> Self {
        assert!(
            std_dev.is_finite() && std_dev >= 0.0,
            "gaussian: std_dev must be finite and non-negative"
        );
        if std_dev == 0.0 {
            return Self::zero(precision);
        }
        let normal = Normal::new(0.0, std_dev)
            .expect("gaussian: failed to create Normal distribution");
        Self::from_real(normal.sample(rng), precision)
    }

    /// `round(msize · x) mod msize`, round half up.
    ///
    /// # Panics
    ///
    /// Panics unless `msize` is a power of two no larger than `2^precision`.
    fn mod_switch_from_torus(&self, msize: u64, precision: &Self::Precision) -> u64 {
        let bits = Self::precision_bits(precision);
        let log_m = log2_message_space(msize, bits);
        let mut rounded = *self;
        if log_m < bits {
            rounded.add_assign(&Self::from_dyadic(1, log_m + 1, precision), precision);
        }
        rounded.to_dyadic(log_m, precision) & (msize - 1)
    }

    /// `mu / msize`; `mu` is taken modulo `msize`.
    fn mod_switch_to_torus(mu: u64, msize: u64, precision: &Self::Precision) -> Self {
        let log_m = log2_message_space(msize, Self::precision_bits(precision));
        Self::from_dyadic(mu & (msize - 1), log_m, precision)
    }

    /// Nearest multiple of `1/msize`.
    fn approx_phase(&self, msize: u64, precision: &Self::Precision) -> Self {
        let mu = self.mod_switch_from_torus(msize, precision);
        Self::mod_switch_to_torus(mu, msize, precision)
    }

    /// `|a - b|` measured on the signed representative.
    fn distance(&self, other: &Self, precision: &Self::Precision) -> f64 {
        self.sub(other, precision).to_real(precision).abs()
    }
}

fn log2_message_space(msize: u64, precision_bits: u32) -> u32 {
    assert!(
        msize.is_power_of_two(),
        "message space size {msize} must be a power of two"
    );
    let log_m = msize.trailing_zeros();
    assert!(
        log_m <= precision_bits,
        "message space 2^{log_m} exceeds torus precision 2^{precision_bits}"
    );
    log_m
}

/// Precision plus the admissible range of encryption noise.
#[derive(Debug, Clone, PartialEq)]
pub struct ModulusParams<T: Torus> {
    pub precision: T::Precision,
    pub alpha_min: f64,
    pub alpha_max: f64,
}

impl<T: Torus> ModulusParams<T> {
    pub fn new(
        precision: T::Precision,
        alpha_min: f64,
        alpha_max: f64,
    ) -> TfheResult<Self> {
        if !(alpha_min.is_finite() && alpha_max.is_finite()) {
            return Err(TfheError::invalid("noise bounds must be finite"));
        }
        if alpha_min < 0.0 || alpha_min > alpha_max {
            return Err(TfheError::invalid(format!(
                "noise bounds must satisfy 0 <= alpha_min <= alpha_max, \
                got [{alpha_min:e}, {alpha_max:e}]"
            )));
        }
        Ok(Self {
            precision,
            alpha_min,
            alpha_max,
        })
    }

    pub fn precision_bits(&self) -> u32 {
        T::precision_bits(&self.precision)
    }

    /// Rejects a noise standard deviation outside `[alpha_min, alpha_max]`.
    pub fn check_alpha(&self, alpha: f64) -> TfheResult<()> {
        if alpha >= self.alpha_min && alpha <= self.alpha_max {
            Ok(())
        } else {
            Err(TfheError::NoiseOutOfRange {
                alpha,
                min: self.alpha_min,
                max: self.alpha_max,
            })
        }
    }
}
