use crate::bootstrap::GateBootstrappingParameterSet;
use crate::errors::{TfheError, TfheResult};
use crate::lwe::{LweKey, LweKeySwitchKey};
use crate::rings::RingMultiplier;
use crate::tgsw::{TGswKey, TGswSample, TGswView, external_product_variance};
use crate::torus::Torus;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, instrument};

/// TGSW encryptions of every LWE key bit, stored flat, plus the key switch
/// from the extracted TLWE key back to the LWE key.
///
/// TGSW sample `i` occupies coefficients `[i · S, (i + 1) · S)` with
/// `S = kpl · (k + 1) · N`, and variances `[i · kpl, (i + 1) · kpl)`.
#[derive(Debug, Clone)]
pub struct LweBootstrappingKey<T: Torus> {
    params: Arc<GateBootstrappingParameterSet<T>>,
    data: Vec<T>,
    variances: Vec<f64>,
    ks: LweKeySwitchKey<T>,
}

impl<T: Torus> LweBootstrappingKey<T> {
    /// Encrypts each bit of `lwe_key` under `tgsw_key` with the TLWE minimal
    /// noise.
    #[instrument(
        skip_all,
        fields(n = lwe_key.bits().len(), degree = tgsw_key.params().tlwe_params().degree())
    )]
    pub fn generate<M, R>(
        params: Arc<GateBootstrappingParameterSet<T>>,
        lwe_key: &LweKey<T>,
        tgsw_key: &TGswKey<T>,
        mul: &M,
        rng: &mut R,
    ) -> TfheResult<Self>
    where
        M: RingMultiplier<T>,
        R: Rng + ?Sized,
    {
        if lwe_key.params().as_ref() != params.in_out_params().as_ref() {
            return Err(TfheError::invalid(
                "LWE key does not match the parameter set",
            ));
        }
        if tgsw_key.params().as_ref() != params.tgsw_params().as_ref() {
            return Err(TfheError::invalid(
                "TGSW key does not match the parameter set",
            ));
        }

        let tgsw_params = params.tgsw_params();
        let alpha = tgsw_params.tlwe_params().alpha_min();
        let n = lwe_key.bits().len();
        let mut data = Vec::with_capacity(n * tgsw_params.sample_len());
        let mut variances = Vec::with_capacity(n * tgsw_params.kpl());
        for &bit in lwe_key.bits() {
            let sample = TGswSample::encrypt_int(tgsw_key, bit, alpha, mul, rng)?;
            data.extend_from_slice(sample.as_slice());
            variances.extend_from_slice(sample.variances());
        }
        debug!("encrypted {} key bits", n);

        let extracted_key = tgsw_key.tlwe_key().extracted_lwe_key();
        let ks = LweKeySwitchKey::generate(
            &extracted_key,
            lwe_key,
            params.ks_t(),
            params.ks_basebit(),
            rng,
        )?;

        Ok(Self {
            params,
            data,
            variances,
            ks,
        })
    }

    /// Reassembles a key from its flat tables, checking every count.
    pub fn from_parts(
        params: Arc<GateBootstrappingParameterSet<T>>,
        data: Vec<T>,
        variances: Vec<f64>,
        ks: LweKeySwitchKey<T>,
    ) -> TfheResult<Self> {
        let n = params.in_out_params().n();
        let tgsw = params.tgsw_params();
        TfheError::check_dimension("bootstrapping key", n * tgsw.sample_len(), data.len())?;
        TfheError::check_dimension("bootstrapping key variances", n * tgsw.kpl(), variances.len())?;
        TfheError::check_dimension(
            "bootstrapping key switch input",
            tgsw.tlwe_params().extracted_lwe_params().n(),
            ks.input_dimension(),
        )?;
        if ks.out_params().as_ref() != params.in_out_params().as_ref()
            || ks.t() != params.ks_t()
            || ks.basebit() != params.ks_basebit()
        {
            return Err(TfheError::invalid(
                "key switch key does not match the parameter set",
            ));
        }
        Ok(Self {
            params,
            data,
            variances,
            ks,
        })
    }

    pub fn params(&self) -> &Arc<GateBootstrappingParameterSet<T>> {
        &self.params
    }

    /// Number of TGSW samples (the LWE dimension).
    pub fn len(&self) -> usize {
        self.params.in_out_params().n()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// TGSW encryption of key bit `i`.
    pub fn tgsw(&self, i: usize) -> TGswView<'_, T> {
        let tgsw = self.params.tgsw_params();
        let (len, kpl) = (tgsw.sample_len(), tgsw.kpl());
        // Key bits are binary, so ‖m‖² ≤ 1.
        TGswView::new(
            &self.data[i * len..(i + 1) * len],
            &self.variances[i * kpl..(i + 1) * kpl],
            1.0,
        )
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn variances(&self) -> &[f64] {
        &self.variances
    }

    pub fn key_switch_key(&self) -> &LweKeySwitchKey<T> {
        &self.ks
    }

    pub fn max_variance(&self) -> f64 {
        self.variances.iter().copied().fold(0.0, f64::max)
    }

    /// Variance of the blind rotation output, before extraction.
    pub fn blind_rotation_variance(&self) -> f64 {
        let tgsw = self.params.tgsw_params();
        (0..self.len()).fold(0.0, |var, i| {
            var + external_product_variance(tgsw, self.tgsw(i).max_variance(), 0.0, 1.0)
        })
    }

    /// Variance of every bootstrap output under this key, whatever the
    /// input.
    pub fn output_variance(&self) -> f64 {
        let ks = &self.ks;
        self.blind_rotation_variance()
            + ks.rounding_variance()
            + (ks.input_dimension() * ks.t()) as f64 * ks.max_variance()
    }
}

impl<T: Torus> PartialEq for LweBootstrappingKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params
            && self.data == other.data
            && self.max_variance() == other.max_variance()
            && self.ks == other.ks
    }
}
