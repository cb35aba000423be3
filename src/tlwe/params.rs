use crate::errors::{TfheError, TfheResult};
use crate::lwe::LweParams;
use crate::rings::check_ring_degree;
use crate::torus::{ModulusParams, Torus};
use std::sync::Arc;

/// Ring dimension `N`, rank `k` and modulus of a TLWE instance.
///
/// # Invariants
///
/// - `N` is a power of two and `k ≥ 1`.
/// - `extracted` is the LWE instance of dimension `k · N` produced by sample
///   extraction, with the same modulus.
#[derive(Debug, Clone, PartialEq)]
pub struct TLweParams<T: Torus> {
    degree: usize,
    k: usize,
    modulus: ModulusParams<T>,
    extracted: Arc<LweParams<T>>,
}

impl<T: Torus> TLweParams<T> {
    pub fn new(degree: usize, k: usize, modulus: ModulusParams<T>) -> TfheResult<Self> {
        check_ring_degree(degree)?;
        if k == 0 {
            return Err(TfheError::invalid("TLWE rank k must be positive"));
        }
        let extracted = Arc::new(LweParams::new(k * degree, modulus.clone())?);
        Ok(Self {
            degree,
            k,
            modulus,
            extracted,
        })
    }

    /// Ring dimension `N`.
    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn modulus(&self) -> &ModulusParams<T> {
        &self.modulus
    }

    pub fn precision(&self) -> &T::Precision {
        &self.modulus.precision
    }

    pub fn alpha_min(&self) -> f64 {
        self.modulus.alpha_min
    }

    pub fn alpha_max(&self) -> f64 {
        self.modulus.alpha_max
    }

    pub fn extracted_lwe_params(&self) -> &Arc<LweParams<T>> {
        &self.extracted
    }

    /// Coefficient count of one sample, `(k + 1) · N`.
    pub fn sample_len(&self) -> usize {
        (self.k + 1) * self.degree
    }

    pub(crate) fn check_sample(&self, len: usize) -> TfheResult<()> {
        TfheError::check_dimension("TLWE sample", self.sample_len(), len)
    }

    pub(crate) fn check_polynomial(&self, len: usize) -> TfheResult<()> {
        TfheError::check_dimension("TLWE polynomial", self.degree, len)
    }
}
