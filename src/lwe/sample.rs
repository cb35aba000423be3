use crate::errors::TfheResult;
use crate::lwe::{LweKey, LweParams};
use crate::math::uniform_torus_coefficients;
use crate::torus::Torus;
use rand::Rng;

/// LWE ciphertext `(a, b = <a, s> + μ + e)`.
///
/// `current_variance` is the tracked upper bound on the variance of `e`.
#[derive(Debug, Clone, PartialEq)]
pub struct LweSample<T: Torus> {
    pub a: Vec<T>,
    pub b: T,
    pub current_variance: f64,
}

impl<T: Torus> LweSample<T> {
    /// All-zero sample of dimension `n`.
    pub fn new(params: &LweParams<T>) -> Self {
        Self::trivial(T::zero(params.precision()), params)
    }

    /// Noiseless encryption of `mu` (a = 0).
    pub fn trivial(mu: T, params: &LweParams<T>) -> Self {
        Self {
            a: vec![T::zero(params.precision()); params.n()],
            b: mu,
            current_variance: 0.0,
        }
    }

    pub fn dimension(&self) -> usize {
        self.a.len()
    }

    /// Encrypts `mu` with Gaussian noise of standard deviation `alpha`.
    pub fn encrypt<R: Rng + ?Sized>(
        key: &LweKey<T>,
        mu: T,
        alpha: f64,
        rng: &mut R,
    ) -> TfheResult<Self> {
        let params = key.params();
        params.modulus().check_alpha(alpha)?;
        let precision = params.precision();

        let a = uniform_torus_coefficients(params.n(), precision, rng);
        let mut b = T::gaussian(alpha, precision, rng);
        b.add_assign(&mu, precision);
        for (ai, &si) in a.iter().zip(key.bits()) {
            b.add_mul_int(ai, i64::from(si), precision);
        }
        Ok(Self {
            a,
            b,
            current_variance: alpha * alpha,
        })
    }

    /// Encrypts a boolean as `±1/8` with the minimal admissible noise.
    pub fn encrypt_bit<R: Rng + ?Sized>(
        key: &LweKey<T>,
        bit: bool,
        rng: &mut R,
    ) -> TfheResult<Self> {
        let params = key.params();
        let mu = T::mod_switch_to_torus(if bit { 1 } else { 7 }, 8, params.precision());
        Self::encrypt(key, mu, params.alpha_min(), rng)
    }

    /// `b - <a, s>`.
    pub fn phase(&self, key: &LweKey<T>) -> TfheResult<T> {
        let params = key.params();
        params.check_sample(self.a.len())?;
        let precision = params.precision();
        let mut phase = self.b;
        for (ai, &si) in self.a.iter().zip(key.bits()) {
            phase.add_mul_int(ai, -i64::from(si), precision);
        }
        Ok(phase)
    }

    /// Phase rounded to the nearest multiple of `1/msize`.
    pub fn decrypt(&self, key: &LweKey<T>, msize: u64) -> TfheResult<T> {
        let phase = self.phase(key)?;
        Ok(phase.approx_phase(msize, key.params().precision()))
    }

    /// Message index in `[0, msize)`.
    pub fn decrypt_message(&self, key: &LweKey<T>, msize: u64) -> TfheResult<u64> {
        let phase = self.phase(key)?;
        Ok(phase.mod_switch_from_torus(msize, key.params().precision()))
    }

    pub fn decrypt_bit(&self, key: &LweKey<T>) -> TfheResult<bool> {
        let phase = self.phase(key)?;
        Ok(phase.to_real(key.params().precision()) > 0.0)
    }

    fn check_pair(&self, rhs: &Self, params: &LweParams<T>) -> TfheResult<()> {
        params.check_sample(self.a.len())?;
        params.check_sample(rhs.a.len())
    }

    /// `self += k · rhs`; variance grows by `k² · var(rhs)`.
    pub fn add_mul_assign(
        &mut self,
        rhs: &Self,
        k: i64,
        params: &LweParams<T>,
    ) -> TfheResult<()> {
        self.check_pair(rhs, params)?;
        let precision = params.precision();
        for (x, y) in self.a.iter_mut().zip(&rhs.a) {
            x.add_mul_int(y, k, precision);
        }
        self.b.add_mul_int(&rhs.b, k, precision);
        let kf = k as f64;
        self.current_variance += kf * kf * rhs.current_variance;
        Ok(())
    }

    pub fn sub_mul_assign(
        &mut self,
        rhs: &Self,
        k: i64,
        params: &LweParams<T>,
    ) -> TfheResult<()> {
        self.add_mul_assign(rhs, k.wrapping_neg(), params)
    }

    pub fn add_assign(&mut self, rhs: &Self, params: &LweParams<T>) -> TfheResult<()> {
        self.check_pair(rhs, params)?;
        let precision = params.precision();
        for (x, y) in self.a.iter_mut().zip(&rhs.a) {
            x.add_assign(y, precision);
        }
        self.b.add_assign(&rhs.b, precision);
        self.current_variance += rhs.current_variance;
        Ok(())
    }

    pub fn sub_assign(&mut self, rhs: &Self, params: &LweParams<T>) -> TfheResult<()> {
        self.check_pair(rhs, params)?;
        let precision = params.precision();
        for (x, y) in self.a.iter_mut().zip(&rhs.a) {
            x.sub_assign(y, precision);
        }
        self.b.sub_assign(&rhs.b, precision);
        self.current_variance += rhs.current_variance;
        Ok(())
    }

    /// Negates the plaintext; the variance is unchanged.
    pub fn negate(&mut self, params: &LweParams<T>) -> TfheResult<()> {
        params.check_sample(self.a.len())?;
        let precision = params.precision();
        for x in self.a.iter_mut() {
            *x = x.neg(precision);
        }
        self.b = self.b.neg(precision);
        Ok(())
    }

    /// Adds a public constant to the plaintext.
    pub fn add_constant(&mut self, mu: T, params: &LweParams<T>) -> TfheResult<()> {
        params.check_sample(self.a.len())?;
        self.b.add_assign(&mu, params.precision());
        Ok(())
    }
}

/// `lhs + rhs` as a new sample.
pub fn add<T: Torus>(
    lhs: &LweSample<T>,
    rhs: &LweSample<T>,
    params: &LweParams<T>,
) -> TfheResult<LweSample<T>> {
    let mut out = lhs.clone();
    out.add_assign(rhs, params)?;
    Ok(out)
}

/// `lhs - rhs` as a new sample.
pub fn sub<T: Torus>(
    lhs: &LweSample<T>,
    rhs: &LweSample<T>,
    params: &LweParams<T>,
) -> TfheResult<LweSample<T>> {
    let mut out = lhs.clone();
    out.sub_assign(rhs, params)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TfheError;
    use crate::torus::{BigPrecision, BigTorus, ModulusParams, NativeWidth, Torus32};
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::sync::Arc;

    fn setup(n: usize, seed: u64) -> (Arc<LweParams<Torus32>>, LweKey<Torus32>, ChaCha20Rng) {
        let modulus = ModulusParams::new(NativeWidth, 2f64.powi(-15), 2f64.powi(-6)).unwrap();
        let params = Arc::new(LweParams::new(n, modulus).unwrap());
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let key = LweKey::generate(params.clone(), &mut rng);
        (params, key, rng)
    }

    // ── Encryption ──

    #[test]
    fn encrypt_decrypt_recovers_message() {
        let (_, key, mut rng) = setup(500, 1);
        let p = NativeWidth;
        for mu in 0..8 {
            let m = Torus32::mod_switch_to_torus(mu, 8, &p);
            let c = LweSample::encrypt(&key, m, 2f64.powi(-10), &mut rng).unwrap();
            assert_eq!(c.decrypt(&key, 8).unwrap(), m);
            assert_eq!(c.decrypt_message(&key, 8).unwrap(), mu);
            assert_relative_eq!(c.current_variance, 2f64.powi(-20));
        }
    }

    #[test]
    fn encrypt_rejects_noise_outside_bounds() {
        let (_, key, mut rng) = setup(16, 2);
        let err = LweSample::encrypt(&key, Torus32(0), 0.25, &mut rng).unwrap_err();
        assert!(matches!(err, TfheError::NoiseOutOfRange { .. }));
        let err = LweSample::encrypt(&key, Torus32(0), 2f64.powi(-20), &mut rng).unwrap_err();
        assert!(matches!(err, TfheError::NoiseOutOfRange { .. }));
    }

    #[test]
    fn bits_round_trip() {
        let (_, key, mut rng) = setup(200, 3);
        for &bit in &[true, false, true, true, false] {
            let c = LweSample::encrypt_bit(&key, bit, &mut rng).unwrap();
            assert_eq!(c.decrypt_bit(&key).unwrap(), bit);
        }
    }

    #[test]
    fn trivial_sample_is_noiseless() {
        let (params, key, _) = setup(32, 4);
        let mu = Torus32::from_real(0.3, &NativeWidth);
        let c = LweSample::trivial(mu, &params);
        assert_eq!(c.phase(&key).unwrap(), mu);
        assert_eq!(c.current_variance, 0.0);
    }

    #[test]
    fn big_backend_encrypts_with_tiny_noise() {
        let precision = BigPrecision::<2>::new(100).unwrap();
        let modulus = ModulusParams::new(precision, 2f64.powi(-80), 2f64.powi(-10)).unwrap();
        let params = Arc::new(LweParams::new(64, modulus).unwrap());
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let key = LweKey::generate(params, &mut rng);
        let m = BigTorus::mod_switch_to_torus(5, 1 << 40, &precision);
        let c = LweSample::encrypt(&key, m, 2f64.powi(-80), &mut rng).unwrap();
        assert_eq!(c.decrypt(&key, 1 << 40).unwrap(), m);
    }

    // ── Homomorphic operations ──

    #[test]
    fn linear_combination_tracks_variance() {
        let (params, key, mut rng) = setup(300, 6);
        let p = NativeWidth;
        let one = Torus32::mod_switch_to_torus(1, 16, &p);
        let two = Torus32::mod_switch_to_torus(2, 16, &p);
        let c1 = LweSample::encrypt(&key, one, 2f64.powi(-12), &mut rng).unwrap();
        let c2 = LweSample::encrypt(&key, two, 2f64.powi(-11), &mut rng).unwrap();

        let sum = add(&c1, &c2, &params).unwrap();
        assert_eq!(sum.current_variance, c1.current_variance + c2.current_variance);
        assert_eq!(sum.decrypt_message(&key, 16).unwrap(), 3);

        let diff = sub(&c1, &c2, &params).unwrap();
        assert_eq!(diff.decrypt_message(&key, 16).unwrap(), 15);

        let mut scaled = c1.clone();
        scaled.add_mul_assign(&c2, 3, &params).unwrap();
        assert_eq!(scaled.decrypt_message(&key, 16).unwrap(), 7);
        assert_relative_eq!(
            scaled.current_variance,
            c1.current_variance + 9.0 * c2.current_variance
        );

        scaled.sub_mul_assign(&c2, 3, &params).unwrap();
        assert_eq!(scaled.decrypt_message(&key, 16).unwrap(), 1);
    }

    #[test]
    fn negate_and_add_constant() {
        let (params, key, mut rng) = setup(100, 7);
        let p = NativeWidth;
        let mut c = LweSample::encrypt_bit(&key, true, &mut rng).unwrap();
        let variance = c.current_variance;
        c.negate(&params).unwrap();
        assert!(!c.decrypt_bit(&key).unwrap());
        assert_eq!(c.current_variance, variance);

        c.add_constant(Torus32::mod_switch_to_torus(2, 8, &p), &params).unwrap();
        assert!(c.decrypt_bit(&key).unwrap());
    }

    #[test]
    fn mismatched_dimension_leaves_destination_untouched() {
        let (params, key, mut rng) = setup(64, 8);
        let (_, short_key, _) = setup(32, 9);
        let mut c = LweSample::encrypt_bit(&key, true, &mut rng).unwrap();
        let other = LweSample::encrypt_bit(&short_key, true, &mut rng).unwrap();
        let before = c.clone();

        let err = c.add_assign(&other, &params).unwrap_err();
        assert_eq!(
            err,
            TfheError::DimensionMismatch {
                what: "LWE sample",
                expected: 64,
                actual: 32
            }
        );
        assert_eq!(c, before);
        assert!(other.phase(&key).is_err());
    }
}
