use crate::errors::{TfheError, TfheResult};
use crate::torus::{ModulusParams, Torus};

/// Dimension and modulus of an LWE instance.
#[derive(Debug, Clone, PartialEq)]
pub struct LweParams<T: Torus> {
    n: usize,
    modulus: ModulusParams<T>,
}

impl<T: Torus> LweParams<T> {
    pub fn new(n: usize, modulus: ModulusParams<T>) -> TfheResult<Self> {
        if n == 0 {
            return Err(TfheError::invalid("LWE dimension must be positive"));
        }
        Ok(Self { n, modulus })
    }

    pub fn n(&self) -> usize {
        self.n
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

    /// Checks the mask length of a sample against `n`.
    pub(crate) fn check_sample(&self, mask_len: usize) -> TfheResult<()> {
        TfheError::check_dimension("LWE sample", self.n, mask_len)
    }
}
