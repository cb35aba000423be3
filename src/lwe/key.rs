use crate::errors::{TfheError, TfheResult};
use crate::lwe::LweParams;
use crate::math::binary_coefficients;
use crate::torus::Torus;
use rand::Rng;
use std::sync::Arc;

/// Binary LWE secret `s ∈ {0, 1}^n`.
#[derive(Debug, Clone, PartialEq)]
pub struct LweKey<T: Torus> {
    params: Arc<LweParams<T>>,
    key: Vec<i32>,
}

impl<T: Torus> LweKey<T> {
    pub fn generate<R: Rng + ?Sized>(params: Arc<LweParams<T>>, rng: &mut R) -> Self {
        let key = binary_coefficients(params.n(), rng);
        Self { params, key }
    }

    /// Wraps existing key bits; every entry must be 0 or 1.
    pub fn from_bits(params: Arc<LweParams<T>>, key: Vec<i32>) -> TfheResult<Self> {
        TfheError::check_dimension("LWE key", params.n(), key.len())?;
        if key.iter().any(|&b| b != 0 && b != 1) {
            return Err(TfheError::invalid("LWE key coefficients must be binary"));
        }
        Ok(Self { params, key })
    }

    /// Caller guarantees a binary key of length `params.n()`.
    pub(crate) fn from_bits_unchecked(params: Arc<LweParams<T>>, key: Vec<i32>) -> Self {
        debug_assert_eq!(params.n(), key.len());
        Self { params, key }
    }

    pub fn params(&self) -> &Arc<LweParams<T>> {
        &self.params
    }

    pub fn bits(&self) -> &[i32] {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torus::{ModulusParams, NativeWidth, Torus32};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn params(n: usize) -> Arc<LweParams<Torus32>> {
        let modulus = ModulusParams::new(NativeWidth, 0.0, 0.1).unwrap();
        Arc::new(LweParams::new(n, modulus).unwrap())
    }

    #[test]
    fn generated_key_has_parameter_dimension() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let key = LweKey::generate(params(500), &mut rng);
        assert_eq!(key.bits().len(), 500);
        assert!(key.bits().iter().all(|&b| b == 0 || b == 1));
    }

    #[test]
    fn from_bits_validates_input() {
        assert!(LweKey::from_bits(params(3), vec![0, 1, 1]).is_ok());
        assert_eq!(
            LweKey::from_bits(params(3), vec![0, 1]),
            Err(TfheError::DimensionMismatch {
                what: "LWE key",
                expected: 3,
                actual: 2
            })
        );
        assert!(LweKey::from_bits(params(2), vec![0, 2]).is_err());
    }
}
