//! Key switching between LWE keys.
//!
//! Entry `(i, j, h)` of the table is an encryption of `s_in[i] · h · base^-(j+1)`
//! under the output key. The table is stored flat: entry `(i, j, h)` lives at
//! index `(i · t + j) · base + h`, its mask at
//! `masks[index · n_out .. (index + 1) · n_out]`.

use crate::errors::{TfheError, TfheResult};
use crate::lwe::{LweKey, LweParams, LweSample};
use crate::torus::Torus;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct LweKeySwitchKey<T: Torus> {
    input_dimension: usize,
    t: usize,
    basebit: u32,
    base: usize,
    out_params: Arc<LweParams<T>>,
    masks: Vec<T>,
    bodies: Vec<T>,
    variances: Vec<f64>,
}

/// Largest supported digit width; the table holds `2^basebit` entries per digit.
const MAX_BASEBIT: u32 = 16;

pub(crate) fn check_decomposition(t: usize, basebit: u32, precision_bits: u32) -> TfheResult<()> {
    if t == 0 || basebit == 0 || basebit > MAX_BASEBIT {
        return Err(TfheError::invalid(format!(
            "key switch needs t >= 1 and 1 <= basebit <= {MAX_BASEBIT}, got t = {t}, basebit = {basebit}"
        )));
    }
    if t as u64 * u64::from(basebit) > u64::from(precision_bits) {
        return Err(TfheError::invalid(format!(
            "key switch precision t * basebit = {} exceeds torus precision {precision_bits}",
            t as u64 * u64::from(basebit)
        )));
    }
    Ok(())
}

impl<T: Torus> LweKeySwitchKey<T> {
    /// Builds the table translating samples under `in_key` to `out_key`,
    /// with noise `out_key.params().alpha_min()` on every entry.
    #[instrument(
        skip_all,
        fields(n_in = in_key.bits().len(), n_out = out_key.params().n(), t = t, basebit = basebit)
    )]
    pub fn generate<R: Rng + ?Sized>(
        in_key: &LweKey<T>,
        out_key: &LweKey<T>,
        t: usize,
        basebit: u32,
        rng: &mut R,
    ) -> TfheResult<Self> {
        let out_params = out_key.params().clone();
        let precision = out_params.precision();
        if in_key.params().precision() != precision {
            return Err(TfheError::invalid(
                "key switch input and output keys use different torus precisions",
            ));
        }
        check_decomposition(t, basebit, T::precision_bits(precision))?;

        let input_dimension = in_key.bits().len();
        let base = 1usize << basebit;
        let n_out = out_params.n();
        let entries = input_dimension * t * base;
        let alpha = out_params.alpha_min();

        let mut masks = Vec::with_capacity(entries * n_out);
        let mut bodies = Vec::with_capacity(entries);
        let mut variances = Vec::with_capacity(entries);

        for &bit in in_key.bits() {
            for j in 0..t {
                let log_m = (j as u32 + 1) * basebit;
                for h in 0..base as u64 {
                    let mu = T::from_dyadic(h * bit as u64, log_m, precision);
                    let sample = LweSample::encrypt(out_key, mu, alpha, rng)?;
                    masks.extend_from_slice(&sample.a);
                    bodies.push(sample.b);
                    variances.push(sample.current_variance);
                }
            }
        }
        debug!("generated key switch key with {} entries", entries);

        Ok(Self {
            input_dimension,
            t,
            basebit,
            base,
            out_params,
            masks,
            bodies,
            variances,
        })
    }

    /// Reassembles a key from flat tables, checking every element count.
    pub(crate) fn from_parts(
        input_dimension: usize,
        t: usize,
        basebit: u32,
        out_params: Arc<LweParams<T>>,
        masks: Vec<T>,
        bodies: Vec<T>,
        variances: Vec<f64>,
    ) -> TfheResult<Self> {
        check_decomposition(t, basebit, T::precision_bits(out_params.precision()))?;
        let base = 1usize << basebit;
        let entries = input_dimension * t * base;
        TfheError::check_dimension("key switch masks", entries * out_params.n(), masks.len())?;
        TfheError::check_dimension("key switch bodies", entries, bodies.len())?;
        TfheError::check_dimension("key switch variances", entries, variances.len())?;
        Ok(Self {
            input_dimension,
            t,
            basebit,
            base,
            out_params,
            masks,
            bodies,
            variances,
        })
    }

    pub fn input_dimension(&self) -> usize {
        self.input_dimension
    }

    pub fn t(&self) -> usize {
        self.t
    }

    pub fn basebit(&self) -> u32 {
        self.basebit
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn out_params(&self) -> &Arc<LweParams<T>> {
        &self.out_params
    }

    pub(crate) fn masks(&self) -> &[T] {
        &self.masks
    }

    pub(crate) fn bodies(&self) -> &[T] {
        &self.bodies
    }

    /// Entry `(i, j, h)` as an owned sample.
    pub fn entry(&self, i: usize, j: usize, h: usize) -> LweSample<T> {
        let index = self.index(i, j, h);
        let n = self.out_params.n();
        LweSample {
            a: self.masks[index * n..(index + 1) * n].to_vec(),
            b: self.bodies[index],
            current_variance: self.variances[index],
        }
    }

    #[inline]
    fn index(&self, i: usize, j: usize, h: usize) -> usize {
        (i * self.t + j) * self.base + h
    }

    /// Largest entry variance.
    pub fn max_variance(&self) -> f64 {
        self.variances.iter().copied().fold(0.0, f64::max)
    }

    /// Variance contributed by rounding every input coefficient to
    /// `t · basebit` bits.
    pub fn rounding_variance(&self) -> f64 {
        let eps = 2f64.powi(-((self.t as i32) * self.basebit as i32 + 1));
        self.input_dimension as f64 * eps * eps
    }

    /// Translates `sample` to the output key.
    pub fn key_switch(&self, sample: &LweSample<T>) -> TfheResult<LweSample<T>> {
        let mut result = LweSample::new(&self.out_params);
        self.key_switch_into(&mut result, sample)?;
        Ok(result)
    }

    /// Like [`Self::key_switch`], writing into an existing output sample.
    pub fn key_switch_into(
        &self,
        result: &mut LweSample<T>,
        sample: &LweSample<T>,
    ) -> TfheResult<()> {
        TfheError::check_dimension("key switch input", self.input_dimension, sample.a.len())?;
        self.out_params.check_sample(result.a.len())?;

        let precision = self.out_params.precision();
        let n = self.out_params.n();
        let total_bits = self.t as u32 * self.basebit;
        let round_offset = if total_bits < T::precision_bits(precision) {
            T::from_dyadic(1, total_bits + 1, precision)
        } else {
            T::zero(precision)
        };
        let digit_mask = self.base as u64 - 1;

        result.a.fill(T::zero(precision));
        result.b = sample.b;
        result.current_variance = sample.current_variance + self.rounding_variance();

        for (i, ai) in sample.a.iter().enumerate() {
            let mut rounded = *ai;
            rounded.add_assign(&round_offset, precision);
            for j in 0..self.t {
                let log_m = (j as u32 + 1) * self.basebit;
                let digit = (rounded.to_dyadic(log_m, precision) & digit_mask) as usize;
                let index = self.index(i, j, digit);
                for (r, m) in result.a.iter_mut().zip(&self.masks[index * n..(index + 1) * n]) {
                    r.sub_assign(m, precision);
                }
                result.b.sub_assign(&self.bodies[index], precision);
                result.current_variance += self.variances[index];
            }
        }
        Ok(())
    }
}

impl<T: Torus> PartialEq for LweKeySwitchKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.input_dimension == other.input_dimension
            && self.t == other.t
            && self.basebit == other.basebit
            && self.out_params == other.out_params
            && self.masks == other.masks
            && self.bodies == other.bodies
            && self.max_variance() == other.max_variance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torus::{ModulusParams, NativeWidth, Torus32};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn key(n: usize, rng: &mut ChaCha20Rng) -> LweKey<Torus32> {
        let modulus = ModulusParams::new(NativeWidth, 2f64.powi(-20), 2f64.powi(-6)).unwrap();
        LweKey::generate(Arc::new(LweParams::new(n, modulus).unwrap()), rng)
    }

    #[test]
    fn table_has_expected_layout() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let in_key = key(6, &mut rng);
        let out_key = key(10, &mut rng);
        let ks = LweKeySwitchKey::generate(&in_key, &out_key, 3, 2, &mut rng).unwrap();
        assert_eq!(ks.masks().len(), 6 * 3 * 4 * 10);
        assert_eq!(ks.bodies().len(), 6 * 3 * 4);

        let p = NativeWidth;
        for i in 0..6 {
            for j in 0..3 {
                for h in 0..4u64 {
                    let expected = Torus32::from_dyadic(
                        h * in_key.bits()[i] as u64,
                        (j as u32 + 1) * 2,
                        &p,
                    );
                    let phase = ks.entry(i, j, h as usize).phase(&out_key).unwrap();
                    assert!(phase.distance(&expected, &p) < 2f64.powi(-14));
                }
            }
        }
    }

    #[test]
    fn key_switch_preserves_message() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let in_key = key(64, &mut rng);
        let out_key = key(32, &mut rng);
        let ks = LweKeySwitchKey::generate(&in_key, &out_key, 8, 2, &mut rng).unwrap();

        for bit in [true, false, true] {
            let c = LweSample::encrypt_bit(&in_key, bit, &mut rng).unwrap();
            let switched = ks.key_switch(&c).unwrap();
            assert_eq!(switched.dimension(), 32);
            assert_eq!(switched.decrypt_bit(&out_key).unwrap(), bit);
        }
    }

    #[test]
    fn variance_counts_every_digit() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let in_key = key(16, &mut rng);
        let out_key = key(16, &mut rng);
        let ks = LweKeySwitchKey::generate(&in_key, &out_key, 4, 3, &mut rng).unwrap();
        let c = LweSample::trivial(Torus32(0), in_key.params());
        let switched = ks.key_switch(&c).unwrap();
        let expected = 16.0 * 4.0 * 2f64.powi(-40) + ks.rounding_variance();
        assert!((switched.current_variance - expected).abs() <= expected * 1e-12);
    }

    #[test]
    fn rejects_oversized_decomposition() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let in_key = key(4, &mut rng);
        let out_key = key(4, &mut rng);
        assert!(LweKeySwitchKey::generate(&in_key, &out_key, 17, 2, &mut rng).is_err());
        assert!(LweKeySwitchKey::generate(&in_key, &out_key, 0, 2, &mut rng).is_err());
    }

    #[test]
    fn rejects_wrong_input_dimension() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let in_key = key(8, &mut rng);
        let out_key = key(4, &mut rng);
        let ks = LweKeySwitchKey::generate(&in_key, &out_key, 2, 2, &mut rng).unwrap();
        let wrong = LweSample::trivial(Torus32(0), out_key.params());
        assert!(matches!(
            ks.key_switch(&wrong),
            Err(TfheError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn equality_compares_coefficients_and_max_variance() {
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let in_key = key(4, &mut rng);
        let out_key = key(4, &mut rng);
        let ks = LweKeySwitchKey::generate(&in_key, &out_key, 2, 2, &mut rng).unwrap();

        let mut flattened = ks.clone();
        let max = ks.max_variance();
        flattened.variances.iter_mut().for_each(|v| *v = max);
        assert_eq!(flattened, ks);

        let mut tampered = ks.clone();
        tampered.bodies[0].0 ^= 1;
        assert_ne!(tampered, ks);
    }
}
