use crate::errors::{TfheError, TfheResult};
use crate::tlwe::TLweParams;
use crate::torus::Torus;
use std::sync::Arc;

/// Digits wider than this could overflow the `i32` digit polynomials once
/// multiplied by key coefficients.
const MAX_BGBIT: u32 = 30;

/// Gadget decomposition parameters over a TLWE instance.
///
/// # Invariants
///
/// - `1 ≤ l`, `1 ≤ bgbit ≤ 30`, `l · bgbit ≤ precision`.
/// - `gadget[i] = Bg^-(i+1)`.
/// - `offset = Σ_i (Bg/2 - 1) · Bg^-(i+1) + 2^-(l·bgbit+1)`, the last term
///   only when `l · bgbit` is below the precision.
#[derive(Debug, Clone, PartialEq)]
pub struct TGswParams<T: Torus> {
    l: usize,
    bgbit: u32,
    tlwe: Arc<TLweParams<T>>,
    kpl: usize,
    bg: i32,
    half_bg: i32,
    gadget: Vec<T>,
    offset: T,
}

impl<T: Torus> TGswParams<T> {
    pub fn new(l: usize, bgbit: u32, tlwe: Arc<TLweParams<T>>) -> TfheResult<Self> {
        if l == 0 || bgbit == 0 || bgbit > MAX_BGBIT {
            return Err(TfheError::invalid(format!(
                "TGSW needs l >= 1 and 1 <= Bgbit <= {MAX_BGBIT}, got l = {l}, Bgbit = {bgbit}"
            )));
        }
        let precision = tlwe.precision();
        let bits = T::precision_bits(precision);
        let total = l as u64 * u64::from(bgbit);
        if total > u64::from(bits) {
            return Err(TfheError::invalid(format!(
                "gadget precision l * Bgbit = {total} exceeds torus precision {bits}"
            )));
        }

        let bg = 1i32 << bgbit;
        let half_bg = bg / 2;
        let gadget: Vec<T> = (0..l)
            .map(|i| T::from_dyadic(1, (i as u32 + 1) * bgbit, precision))
            .collect();

        let mut offset = T::zero(precision);
        for i in 0..l {
            let position = (i as u32 + 1) * bgbit;
            offset.add_assign(&T::from_dyadic((half_bg - 1) as u64, position, precision), precision);
        }
        let total = total as u32;
        if total < bits {
            offset.add_assign(&T::from_dyadic(1, total + 1, precision), precision);
        }

        Ok(Self {
            l,
            bgbit,
            kpl: (tlwe.k() + 1) * l,
            tlwe,
            bg,
            half_bg,
            gadget,
            offset,
        })
    }

    pub fn l(&self) -> usize {
        self.l
    }

    pub fn bgbit(&self) -> u32 {
        self.bgbit
    }

    pub fn bg(&self) -> i32 {
        self.bg
    }

    pub fn half_bg(&self) -> i32 {
        self.half_bg
    }

    /// Number of TLWE rows, `(k + 1) · l`.
    pub fn kpl(&self) -> usize {
        self.kpl
    }

    pub fn tlwe_params(&self) -> &Arc<TLweParams<T>> {
        &self.tlwe
    }

    pub fn precision(&self) -> &T::Precision {
        self.tlwe.precision()
    }

    /// `h_i = Bg^-(i+1)`.
    pub fn gadget(&self) -> &[T] {
        &self.gadget
    }

    pub(crate) fn offset(&self) -> &T {
        &self.offset
    }

    /// Coefficient count of one TGSW sample.
    pub fn sample_len(&self) -> usize {
        self.kpl * self.tlwe.sample_len()
    }

    /// Largest decomposition error, `2^-(l·bgbit+1)`.
    pub fn epsilon(&self) -> f64 {
        2f64.powi(-((self.l as i32) * self.bgbit as i32 + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torus::{ModulusParams, NativeWidth, Torus32};

    fn tlwe() -> Arc<TLweParams<Torus32>> {
        let modulus = ModulusParams::new(NativeWidth, 0.0, 0.1).unwrap();
        Arc::new(TLweParams::new(1024, 1, modulus).unwrap())
    }

    #[test]
    fn derived_quantities() {
        let params = TGswParams::new(3, 10, tlwe()).unwrap();
        assert_eq!(params.kpl(), 6);
        assert_eq!(params.bg(), 1024);
        assert_eq!(params.half_bg(), 512);
        assert_eq!(params.gadget()[0], Torus32(1 << 22));
        assert_eq!(params.gadget()[2], Torus32(1 << 2));
        // 511 * (2^22 + 2^12 + 2^2) + 2^1
        assert_eq!(*params.offset(), Torus32(511 * ((1 << 22) + (1 << 12) + (1 << 2)) + 2));
    }

    #[test]
    fn rejects_excess_precision() {
        assert!(TGswParams::new(4, 9, tlwe()).is_err());
        assert!(TGswParams::new(0, 9, tlwe()).is_err());
        assert!(TGswParams::new(1, 31, tlwe()).is_err());
        assert!(TGswParams::new(2, 16, tlwe()).is_ok());
    }
}
