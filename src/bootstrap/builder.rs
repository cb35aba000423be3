use crate::bootstrap::GateBootstrappingParameterSet;
use crate::errors::{TfheError, TfheResult};
use crate::lwe::LweParams;
use crate::tgsw::TGswParams;
use crate::tlwe::TLweParams;
use crate::torus::{ModulusParams, Torus};
use std::sync::Arc;

/// Chained configuration for a [`GateBootstrappingParameterSet`].
///
/// Every setter is required; `build` reports the first missing one.
#[derive(Debug, Clone)]
pub struct ParameterSetBuilder<T: Torus> {
    precision: Option<T::Precision>,
    lwe: Option<(usize, f64, f64)>,
    tlwe: Option<(usize, usize, f64, f64)>,
    tgsw: Option<(usize, u32)>,
    key_switch: Option<(usize, u32)>,
}

impl<T: Torus> Default for ParameterSetBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Torus> ParameterSetBuilder<T> {
    pub fn new() -> Self {
        Self {
            precision: None,
            lwe: None,
            tlwe: None,
            tgsw: None,
            key_switch: None,
        }
    }

    /// Torus precision shared by every instance.
    pub fn precision(mut self, precision: T::Precision) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Gate-level LWE dimension and noise bounds.
    pub fn lwe(mut self, n: usize, alpha_min: f64, alpha_max: f64) -> Self {
        self.lwe = Some((n, alpha_min, alpha_max));
        self
    }

    /// Ring dimension, rank and noise bounds of the bootstrapping key.
    pub fn tlwe(mut self, degree: usize, k: usize, alpha_min: f64, alpha_max: f64) -> Self {
        self.tlwe = Some((degree, k, alpha_min, alpha_max));
        self
    }

    pub fn tgsw(mut self, l: usize, bgbit: u32) -> Self {
        self.tgsw = Some((l, bgbit));
        self
    }

    pub fn key_switch(mut self, t: usize, basebit: u32) -> Self {
        self.key_switch = Some((t, basebit));
        self
    }

    pub fn build(self) -> TfheResult<GateBootstrappingParameterSet<T>> {
        let precision = self.precision.ok_or_else(|| missing("precision"))?;
        let (n, lwe_min, lwe_max) = self.lwe.ok_or_else(|| missing("lwe"))?;
        let (degree, k, tlwe_min, tlwe_max) = self.tlwe.ok_or_else(|| missing("tlwe"))?;
        let (l, bgbit) = self.tgsw.ok_or_else(|| missing("tgsw"))?;
        let (t, basebit) = self.key_switch.ok_or_else(|| missing("key_switch"))?;

        let lwe = LweParams::new(n, ModulusParams::new(precision.clone(), lwe_min, lwe_max)?)?;
        let tlwe = TLweParams::new(degree, k, ModulusParams::new(precision, tlwe_min, tlwe_max)?)?;
        let tgsw = TGswParams::new(l, bgbit, Arc::new(tlwe))?;
        GateBootstrappingParameterSet::new(t, basebit, Arc::new(lwe), Arc::new(tgsw))
    }
}

fn missing(setting: &str) -> TfheError {
    TfheError::invalid(format!("parameter set builder is missing `{setting}`"))
}
