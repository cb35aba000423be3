use crate::bootstrap::ParameterSetBuilder;
use crate::errors::{TfheError, TfheResult};
use crate::lwe::LweParams;
use crate::lwe::keyswitch::check_decomposition;
use crate::tgsw::{TGswParams, external_product_variance};
use crate::torus::Torus;
use std::sync::Arc;
use tracing::warn;

/// Distance from a `±1/8` encoded bit to the nearest decision boundary.
const DECISION_MARGIN: f64 = 0.125;

/// Standard deviations of headroom below which a parameter set is reported.
const SAFETY_SIGMAS: f64 = 5.0;

/// Everything needed to generate keys and bootstrap: the LWE instance the
/// gates work in, the TGSW instance of the bootstrapping key and the
/// key-switch decomposition back to LWE.
#[derive(Debug, Clone, PartialEq)]
pub struct GateBootstrappingParameterSet<T: Torus> {
    ks_t: usize,
    ks_basebit: u32,
    in_out_params: Arc<LweParams<T>>,
    tgsw_params: Arc<TGswParams<T>>,
}

impl<T: Torus> GateBootstrappingParameterSet<T> {
    pub fn builder() -> ParameterSetBuilder<T> {
        ParameterSetBuilder::new()
    }

    pub fn new(
        ks_t: usize,
        ks_basebit: u32,
        in_out_params: Arc<LweParams<T>>,
        tgsw_params: Arc<TGswParams<T>>,
    ) -> TfheResult<Self> {
        if in_out_params.precision() != tgsw_params.precision() {
            return Err(TfheError::invalid(
                "LWE and TLWE parameters use different torus precisions",
            ));
        }
        check_decomposition(ks_t, ks_basebit, T::precision_bits(in_out_params.precision()))?;

        let params = Self {
            ks_t,
            ks_basebit,
            in_out_params,
            tgsw_params,
        };
        let sigma = params.estimated_output_variance().sqrt();
        if SAFETY_SIGMAS * sigma > DECISION_MARGIN {
            warn!(
                "bootstrap output noise {:e} leaves less than {} sigmas before the decision boundary",
                sigma, SAFETY_SIGMAS
            );
        }
        Ok(params)
    }

    pub fn ks_t(&self) -> usize {
        self.ks_t
    }

    pub fn ks_basebit(&self) -> u32 {
        self.ks_basebit
    }

    pub fn in_out_params(&self) -> &Arc<LweParams<T>> {
        &self.in_out_params
    }

    pub fn tgsw_params(&self) -> &Arc<TGswParams<T>> {
        &self.tgsw_params
    }

    pub fn precision(&self) -> &T::Precision {
        self.in_out_params.precision()
    }

    /// Bootstrap output variance for keys generated with the minimal noise
    /// of each instance.
    pub fn estimated_output_variance(&self) -> f64 {
        let tlwe = self.tgsw_params.tlwe_params();
        let bk_alpha = tlwe.alpha_min();
        let ks_alpha = self.in_out_params.alpha_min();
        let extracted = (tlwe.k() * tlwe.degree()) as f64;

        let rotation = self.in_out_params.n() as f64
            * external_product_variance(&self.tgsw_params, bk_alpha * bk_alpha, 0.0, 1.0);
        let eps = 2f64.powi(-((self.ks_t as i32) * self.ks_basebit as i32 + 1));
        let key_switch =
            extracted * (self.ks_t as f64 * ks_alpha * ks_alpha + eps * eps);
        rotation + key_switch
    }
}
