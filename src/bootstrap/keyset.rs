use crate::bootstrap::{GateBootstrappingParameterSet, LweBootstrappingKey};
use crate::errors::TfheResult;
use crate::lwe::{LweKey, LweSample};
use crate::rings::RingMultiplier;
use crate::tgsw::TGswKey;
use crate::torus::Torus;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;
use tracing::instrument;

/// Secret keys of one parameter set together with the public
/// bootstrapping key derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct GateBootstrappingSecretKeySet<T: Torus> {
    params: Arc<GateBootstrappingParameterSet<T>>,
    lwe_key: LweKey<T>,
    tgsw_key: TGswKey<T>,
    bootstrapping_key: Arc<LweBootstrappingKey<T>>,
}

impl<T: Torus> GateBootstrappingSecretKeySet<T> {
    #[instrument(skip_all, fields(n = params.in_out_params().n()))]
    pub fn generate<M, R>(
        params: Arc<GateBootstrappingParameterSet<T>>,
        mul: &M,
        rng: &mut R,
    ) -> TfheResult<Self>
    where
        M: RingMultiplier<T>,
        R: Rng + ?Sized,
    {
        let lwe_key = LweKey::generate(params.in_out_params().clone(), rng);
        let tgsw_key = TGswKey::generate(params.tgsw_params().clone(), rng);
        let bootstrapping_key =
            LweBootstrappingKey::generate(params.clone(), &lwe_key, &tgsw_key, mul, rng)?;
        Ok(Self {
            params,
            lwe_key,
            tgsw_key,
            bootstrapping_key: Arc::new(bootstrapping_key),
        })
    }

    /// Deterministic key generation from a ChaCha20 seed.
    pub fn from_seed<M: RingMultiplier<T>>(
        params: Arc<GateBootstrappingParameterSet<T>>,
        mul: &M,
        seed: u64,
    ) -> TfheResult<Self> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        Self::generate(params, mul, &mut rng)
    }

    pub fn params(&self) -> &Arc<GateBootstrappingParameterSet<T>> {
        &self.params
    }

    pub fn lwe_key(&self) -> &LweKey<T> {
        &self.lwe_key
    }

    pub fn tgsw_key(&self) -> &TGswKey<T> {
        &self.tgsw_key
    }

    /// Shared handle for the evaluating party.
    pub fn bootstrapping_key(&self) -> &Arc<LweBootstrappingKey<T>> {
        &self.bootstrapping_key
    }

    pub fn encrypt_bit<R: Rng + ?Sized>(&self, bit: bool, rng: &mut R) -> TfheResult<LweSample<T>> {
        LweSample::encrypt_bit(&self.lwe_key, bit, rng)
    }

    pub fn decrypt_bit(&self, sample: &LweSample<T>) -> TfheResult<bool> {
        sample.decrypt_bit(&self.lwe_key)
    }
}
