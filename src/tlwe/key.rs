use crate::errors::{TfheError, TfheResult};
use crate::lwe::LweKey;
use crate::math::binary_coefficients;
use crate::tlwe::TLweParams;
use crate::torus::Torus;
use rand::Rng;
use std::sync::Arc;

/// `k` binary polynomials, stored flat (`k · N`).
#[derive(Debug, Clone, PartialEq)]
pub struct TLweKey<T: Torus> {
    params: Arc<TLweParams<T>>,
    key: Vec<i32>,
}

impl<T: Torus> TLweKey<T> {
    pub fn generate<R: Rng + ?Sized>(params: Arc<TLweParams<T>>, rng: &mut R) -> Self {
        let key = binary_coefficients(params.k() * params.degree(), rng);
        Self { params, key }
    }

    pub fn from_bits(params: Arc<TLweParams<T>>, key: Vec<i32>) -> TfheResult<Self> {
        TfheError::check_dimension("TLWE key", params.k() * params.degree(), key.len())?;
        if key.iter().any(|&b| b != 0 && b != 1) {
            return Err(TfheError::invalid("TLWE key coefficients must be binary"));
        }
        Ok(Self { params, key })
    }

    pub fn params(&self) -> &Arc<TLweParams<T>> {
        &self.params
    }

    pub fn bits(&self) -> &[i32] {
        &self.key
    }

    /// Key polynomial `s_i`.
    pub fn polynomial(&self, i: usize) -> &[i32] {
        let n = self.params.degree();
        &self.key[i * n..(i + 1) * n]
    }

    /// LWE key of dimension `k · N` matching [`super::TLweSample::extract_lwe_sample`]:
    /// `key[i · N + j] = s_i[j]`.
    pub fn extracted_lwe_key(&self) -> LweKey<T> {
        LweKey::from_bits_unchecked(
            self.params.extracted_lwe_params().clone(),
            self.key.clone(),
        )
    }
}
