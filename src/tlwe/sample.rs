use crate::errors::{TfheError, TfheResult};
use crate::lwe::LweSample;
use crate::math::{gaussian_torus_coefficients, uniform_torus_coefficients};
use crate::rings::{RingMultiplier, TorusPolynomial, arithmetic};
use crate::tlwe::{TLweKey, TLweParams};
use crate::torus::Torus;
use rand::Rng;

/// TLWE ciphertext: `k` mask polynomials followed by the body, stored flat
/// in `(k + 1) · N` coefficients.
///
/// The phase is `body - Σ a_i · s_i`.
#[derive(Debug, Clone, PartialEq)]
pub struct TLweSample<T: Torus> {
    data: Vec<T>,
    degree: usize,
    pub current_variance: f64,
}

impl<T: Torus> TLweSample<T> {
    // ─── Constructors ───────────────────────────────────────────────────────

    /// All-zero sample.
    pub fn new(params: &TLweParams<T>) -> Self {
        Self {
            data: vec![T::zero(params.precision()); params.sample_len()],
            degree: params.degree(),
            current_variance: 0.0,
        }
    }

    /// Noiseless sample with zero mask and body `mu`.
    pub fn trivial(mu: &[T], params: &TLweParams<T>) -> TfheResult<Self> {
        params.check_polynomial(mu.len())?;
        let mut sample = Self::new(params);
        sample.body_mut().copy_from_slice(mu);
        Ok(sample)
    }

    /// Wraps an existing coefficient buffer.
    pub fn from_data(
        data: Vec<T>,
        current_variance: f64,
        params: &TLweParams<T>,
    ) -> TfheResult<Self> {
        params.check_sample(data.len())?;
        Ok(Self {
            data,
            degree: params.degree(),
            current_variance,
        })
    }

    /// Encrypts the polynomial `mu` with Gaussian noise of standard deviation
    /// `alpha` on every body coefficient.
    pub fn encrypt<M, R>(
        key: &TLweKey<T>,
        mu: &[T],
        alpha: f64,
        mul: &M,
        rng: &mut R,
    ) -> TfheResult<Self>
    where
        M: RingMultiplier<T>,
        R: Rng + ?Sized,
    {
        let params = key.params();
        params.check_polynomial(mu.len())?;
        let mut sample = Self::encrypt_zero(key, alpha, mul, rng)?;
        arithmetic::add_assign(sample.body_mut(), mu, params.precision());
        Ok(sample)
    }

    pub fn encrypt_zero<M, R>(
        key: &TLweKey<T>,
        alpha: f64,
        mul: &M,
        rng: &mut R,
    ) -> TfheResult<Self>
    where
        M: RingMultiplier<T>,
        R: Rng + ?Sized,
    {
        let params = key.params();
        params.modulus().check_alpha(alpha)?;
        let precision = params.precision();
        let (k, n) = (params.k(), params.degree());

        let mut data = uniform_torus_coefficients(k * n, precision, rng);
        data.extend(gaussian_torus_coefficients::<T, R>(n, alpha, precision, rng));
        let (masks, body) = data.split_at_mut(k * n);
        for (i, mask) in masks.chunks_exact(n).enumerate() {
            mul.add_mul(body, key.polynomial(i), mask, precision);
        }
        Ok(Self {
            data,
            degree: n,
            current_variance: alpha * alpha,
        })
    }

    /// Encrypts `mu` on the constant coefficient.
    pub fn encrypt_constant<M, R>(
        key: &TLweKey<T>,
        mu: T,
        alpha: f64,
        mul: &M,
        rng: &mut R,
    ) -> TfheResult<Self>
    where
        M: RingMultiplier<T>,
        R: Rng + ?Sized,
    {
        let mut sample = Self::encrypt_zero(key, alpha, mul, rng)?;
        let precision = key.params().precision();
        sample.body_mut()[0].add_assign(&mu, precision);
        Ok(sample)
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of mask polynomials.
    pub fn k(&self) -> usize {
        self.data.len() / self.degree - 1
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Polynomial `i`; `i = k` is the body.
    pub fn polynomial(&self, i: usize) -> &[T] {
        &self.data[i * self.degree..(i + 1) * self.degree]
    }

    pub fn polynomial_mut(&mut self, i: usize) -> &mut [T] {
        let n = self.degree;
        &mut self.data[i * n..(i + 1) * n]
    }

    pub fn body(&self) -> &[T] {
        self.polynomial(self.k())
    }

    pub fn body_mut(&mut self) -> &mut [T] {
        let k = self.k();
        self.polynomial_mut(k)
    }

    // ─── Decryption ─────────────────────────────────────────────────────────

    pub fn phase<M: RingMultiplier<T>>(
        &self,
        key: &TLweKey<T>,
        mul: &M,
    ) -> TfheResult<TorusPolynomial<T>> {
        let params = key.params();
        params.check_sample(self.data.len())?;
        let precision = params.precision();
        let mut phase = self.body().to_vec();
        for i in 0..params.k() {
            mul.sub_mul(&mut phase, key.polynomial(i), self.polynomial(i), precision);
        }
        TorusPolynomial::from_coefs(phase)
    }

    /// Phase with every coefficient rounded to a multiple of `1/msize`.
    pub fn approx_phase<M: RingMultiplier<T>>(
        &self,
        key: &TLweKey<T>,
        msize: u64,
        mul: &M,
    ) -> TfheResult<TorusPolynomial<T>> {
        let mut phase = self.phase(key, mul)?;
        let precision = key.params().precision();
        for c in phase.coefs.iter_mut() {
            *c = c.approx_phase(msize, precision);
        }
        Ok(phase)
    }

    // ─── Homomorphic operations ─────────────────────────────────────────────

    pub fn add_assign(&mut self, rhs: &Self, params: &TLweParams<T>) -> TfheResult<()> {
        params.check_sample(self.data.len())?;
        params.check_sample(rhs.data.len())?;
        arithmetic::add_assign(&mut self.data, &rhs.data, params.precision());
        self.current_variance += rhs.current_variance;
        Ok(())
    }

    pub fn sub_assign(&mut self, rhs: &Self, params: &TLweParams<T>) -> TfheResult<()> {
        params.check_sample(self.data.len())?;
        params.check_sample(rhs.data.len())?;
        arithmetic::sub_assign(&mut self.data, &rhs.data, params.precision());
        self.current_variance += rhs.current_variance;
        Ok(())
    }

    /// `self += k · rhs`.
    pub fn add_mul_int_assign(
        &mut self,
        rhs: &Self,
        k: i64,
        params: &TLweParams<T>,
    ) -> TfheResult<()> {
        params.check_sample(self.data.len())?;
        params.check_sample(rhs.data.len())?;
        arithmetic::add_mul_int_assign(&mut self.data, &rhs.data, k, params.precision());
        let kf = k as f64;
        self.current_variance += kf * kf * rhs.current_variance;
        Ok(())
    }

    /// `self += X^a · rhs` for `a ∈ [0, 2N)`.
    pub fn add_mul_by_xai(
        &mut self,
        a: usize,
        rhs: &Self,
        params: &TLweParams<T>,
    ) -> TfheResult<()> {
        params.check_sample(self.data.len())?;
        params.check_sample(rhs.data.len())?;
        let n = self.degree;
        let precision = params.precision();
        for (dst, src) in self.data.chunks_exact_mut(n).zip(rhs.data.chunks_exact(n)) {
            arithmetic::add_mul_by_xai(dst, a, src, precision);
        }
        self.current_variance += rhs.current_variance;
        Ok(())
    }

    /// `out = (X^a - 1) · self` for `a ∈ [0, 2N)`.
    pub fn mul_by_xai_minus_one_into(
        &self,
        out: &mut Self,
        a: usize,
        params: &TLweParams<T>,
    ) -> TfheResult<()> {
        params.check_sample(self.data.len())?;
        params.check_sample(out.data.len())?;
        let n = self.degree;
        let precision = params.precision();
        for (dst, src) in out.data.chunks_exact_mut(n).zip(self.data.chunks_exact(n)) {
            arithmetic::mul_by_xai_minus_one(dst, a, src, precision);
        }
        // ‖X^a - 1‖² ≤ 2
        out.current_variance = 2.0 * self.current_variance;
        Ok(())
    }

    // ─── Sample extraction ──────────────────────────────────────────────────

    /// LWE sample (dimension `k · N`) of coefficient `index` of the phase,
    /// under [`TLweKey::extracted_lwe_key`]. No noise is added.
    pub fn extract_lwe_sample(
        &self,
        index: usize,
        params: &TLweParams<T>,
    ) -> TfheResult<LweSample<T>> {
        let mut result = LweSample::new(params.extracted_lwe_params());
        self.extract_lwe_sample_into(&mut result, index, params)?;
        Ok(result)
    }

    pub fn extract_lwe_sample_into(
        &self,
        result: &mut LweSample<T>,
        index: usize,
        params: &TLweParams<T>,
    ) -> TfheResult<()> {
        params.check_sample(self.data.len())?;
        params.extracted_lwe_params().check_sample(result.a.len())?;
        let n = self.degree;
        if index >= n {
            return Err(TfheError::invalid(format!(
                "extraction index {index} outside ring dimension {n}"
            )));
        }
        let precision = params.precision();

        for (i, out) in result.a.chunks_exact_mut(n).enumerate() {
            let mask = self.polynomial(i);
            for (m, o) in out.iter_mut().enumerate() {
                *o = if m <= index {
                    mask[index - m]
                } else {
                    mask[n + index - m].neg(precision)
                };
            }
        }
        result.b = self.body()[index];
        result.current_variance = self.current_variance;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rings::Schoolbook;
    use crate::torus::{BigPrecision, BigTorus, ModulusParams, NativeWidth, Torus32, Torus64};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::sync::Arc;

    fn setup32(n: usize, k: usize, seed: u64) -> (Arc<TLweParams<Torus32>>, TLweKey<Torus32>, ChaCha20Rng) {
        let modulus = ModulusParams::new(NativeWidth, 2f64.powi(-25), 2f64.powi(-8)).unwrap();
        let params = Arc::new(TLweParams::new(n, k, modulus).unwrap());
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let key = TLweKey::generate(params.clone(), &mut rng);
        (params, key, rng)
    }

    fn message(n: usize, msize: u64) -> Vec<Torus32> {
        (0..n as u64)
            .map(|i| Torus32::mod_switch_to_torus(i * 3 + 1, msize, &NativeWidth))
            .collect()
    }

    // ── Encryption ──

    #[test]
    fn encrypt_round_trips_for_several_ranks() {
        for (n, k) in [(64, 1), (32, 2), (16, 3)] {
            let (_, key, mut rng) = setup32(n, k, n as u64);
            let mu = message(n, 16);
            let c = TLweSample::encrypt(&key, &mu, 2f64.powi(-15), &Schoolbook, &mut rng).unwrap();
            assert_eq!(c.k(), k);
            let decrypted = c.approx_phase(&key, 16, &Schoolbook).unwrap();
            assert_eq!(decrypted.coefs, mu, "N = {n}, k = {k}");
        }
    }

    #[test]
    fn encrypt_constant_touches_only_constant_coefficient() {
        let (_, key, mut rng) = setup32(32, 1, 1);
        let mu = Torus32::mod_switch_to_torus(3, 8, &NativeWidth);
        let c = TLweSample::encrypt_constant(&key, mu, 2f64.powi(-20), &Schoolbook, &mut rng).unwrap();
        let phase = c.approx_phase(&key, 8, &Schoolbook).unwrap();
        assert_eq!(phase.coefs[0], mu);
        assert!(phase.coefs[1..].iter().all(|&x| x == Torus32(0)));
    }

    #[test]
    fn trivial_sample_has_exact_phase() {
        let (params, key, _) = setup32(16, 2, 2);
        let mu = message(16, 1 << 20);
        let c = TLweSample::trivial(&mu, &params).unwrap();
        assert_eq!(c.phase(&key, &Schoolbook).unwrap().coefs, mu);
        assert!(TLweSample::trivial(&mu[..8], &params).is_err());
    }

    #[test]
    fn big_backend_round_trip() {
        let precision = BigPrecision::<2>::new(128).unwrap();
        let modulus = ModulusParams::new(precision, 2f64.powi(-90), 2f64.powi(-10)).unwrap();
        let params = Arc::new(TLweParams::new(32, 1, modulus).unwrap());
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let key = TLweKey::generate(params, &mut rng);
        let mu: Vec<BigTorus<2>> = (0..32)
            .map(|i| BigTorus::mod_switch_to_torus(i, 1 << 50, &precision))
            .collect();
        let c = TLweSample::encrypt(&key, &mu, 2f64.powi(-90), &Schoolbook, &mut rng).unwrap();
        assert_eq!(c.approx_phase(&key, 1 << 50, &Schoolbook).unwrap().coefs, mu);
    }

    // ── Homomorphic operations ──

    #[test]
    fn addition_and_rotation() {
        let (params, key, mut rng) = setup32(16, 1, 4);
        let p = NativeWidth;
        let mu = message(16, 32);
        let c = TLweSample::encrypt(&key, &mu, 2f64.powi(-20), &Schoolbook, &mut rng).unwrap();

        let mut sum = c.clone();
        sum.add_assign(&c, &params).unwrap();
        assert_eq!(sum.current_variance, 2.0 * c.current_variance);
        let mut doubled = mu.clone();
        arithmetic::add_assign(&mut doubled, &mu, &p);
        assert_eq!(sum.approx_phase(&key, 32, &Schoolbook).unwrap().coefs, doubled);

        let mut rotated = TLweSample::new(&params);
        c.mul_by_xai_minus_one_into(&mut rotated, 5, &params).unwrap();
        let mut expected = vec![Torus32(0); 16];
        arithmetic::mul_by_xai_minus_one(&mut expected, 5, &mu, &p);
        assert_eq!(rotated.approx_phase(&key, 32, &Schoolbook).unwrap().coefs, expected);

        let mut acc = TLweSample::new(&params);
        acc.add_mul_by_xai(21, &c, &params).unwrap();
        let mut expected = vec![Torus32(0); 16];
        arithmetic::mul_by_xai(&mut expected, 21, &mu, &p);
        assert_eq!(acc.approx_phase(&key, 32, &Schoolbook).unwrap().coefs, expected);

        let mut diff = c.clone();
        diff.add_mul_int_assign(&c, -1, &params).unwrap();
        assert!(diff.as_slice().iter().all(|&x| x == Torus32(0)));
        diff.sub_assign(&c, &params).unwrap();
        assert_eq!(diff.current_variance, 3.0 * c.current_variance);
    }

    // ── Sample extraction ──

    #[test]
    fn extraction_decrypts_every_coefficient() {
        for k in [1, 2] {
            let (params, key, mut rng) = setup32(32, k, 10 + k as u64);
            let mu = message(32, 64);
            let c = TLweSample::encrypt(&key, &mu, 2f64.powi(-20), &Schoolbook, &mut rng).unwrap();
            let lwe_key = key.extracted_lwe_key();
            for index in [0, 1, 17, 31] {
                let lwe = c.extract_lwe_sample(index, &params).unwrap();
                assert_eq!(lwe.dimension(), 32 * k);
                assert_eq!(lwe.current_variance, c.current_variance);
                assert_eq!(lwe.decrypt(&lwe_key, 64).unwrap(), mu[index]);
            }
        }
    }

    #[test]
    fn extraction_is_exact_on_phase() {
        let modulus = ModulusParams::new(NativeWidth, 2f64.powi(-40), 2f64.powi(-8)).unwrap();
        let params = Arc::new(TLweParams::<Torus64>::new(8, 2, modulus).unwrap());
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let key = TLweKey::generate(params.clone(), &mut rng);
        let mu = vec![Torus64(0); 8];
        let c = TLweSample::encrypt(&key, &mu, 2f64.powi(-40), &Schoolbook, &mut rng).unwrap();
        let phase = c.phase(&key, &Schoolbook).unwrap();
        let lwe_key = key.extracted_lwe_key();
        for index in 0..8 {
            let lwe = c.extract_lwe_sample(index, &params).unwrap();
            assert_eq!(lwe.phase(&lwe_key).unwrap(), phase.coefs[index]);
        }
    }

    #[test]
    fn extraction_rejects_out_of_range_index() {
        let (params, _, _) = setup32(16, 1, 5);
        let c = TLweSample::new(&params);
        assert!(matches!(
            c.extract_lwe_sample(16, &params),
            Err(TfheError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn noise_outside_bounds_is_rejected() {
        let (_, key, mut rng) = setup32(16, 1, 6);
        assert!(matches!(
            TLweSample::encrypt_zero(&key, 0.5, &Schoolbook, &mut rng),
            Err(TfheError::NoiseOutOfRange { .. })
        ));
    }
}
