use crate::errors::{TfheError, TfheResult};
use crate::tgsw::TGswParams;
use crate::tlwe::TLweKey;
use crate::torus::Torus;
use rand::Rng;
use std::sync::Arc;

/// TGSW secret: a TLWE key paired with gadget parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TGswKey<T: Torus> {
    params: Arc<TGswParams<T>>,
    tlwe_key: TLweKey<T>,
}

impl<T: Torus> TGswKey<T> {
    pub fn generate<R: Rng + ?Sized>(params: Arc<TGswParams<T>>, rng: &mut R) -> Self {
        let tlwe_key = TLweKey::generate(params.tlwe_params().clone(), rng);
        Self { params, tlwe_key }
    }

    /// Wraps an existing TLWE key; its parameters must match `params`.
    pub fn from_tlwe_key(params: Arc<TGswParams<T>>, tlwe_key: TLweKey<T>) -> TfheResult<Self> {
        if tlwe_key.params().as_ref() != params.tlwe_params().as_ref() {
            return Err(TfheError::invalid(
                "TLWE key parameters do not match the TGSW parameters",
            ));
        }
        Ok(Self { params, tlwe_key })
    }

    pub fn params(&self) -> &Arc<TGswParams<T>> {
        &self.params
    }

    pub fn tlwe_key(&self) -> &TLweKey<T> {
        &self.tlwe_key
    }
}
