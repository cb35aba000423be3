//! External product `TGSW(m) ⊠ TLWE(μ) → TLWE(m · μ)` and CMux.

use crate::errors::{TfheError, TfheResult};
use crate::rings::RingMultiplier;
use crate::tgsw::{TGswParams, TGswSample, TGswView, decompose_sample};
use crate::tlwe::TLweSample;
use crate::torus::Torus;

/// Working buffers for one external product at a time.
#[derive(Debug, Clone)]
pub struct ExternalProductScratch<T: Torus> {
    digits: Vec<i32>,
    acc: TLweSample<T>,
}

impl<T: Torus> ExternalProductScratch<T> {
    pub fn new(params: &TGswParams<T>) -> Self {
        let tlwe = params.tlwe_params();
        Self {
            digits: vec![0; params.kpl() * tlwe.degree()],
            acc: TLweSample::new(tlwe),
        }
    }

    fn check(&self, params: &TGswParams<T>) -> TfheResult<()> {
        let tlwe = params.tlwe_params();
        TfheError::check_dimension(
            "external product digits",
            params.kpl() * tlwe.degree(),
            self.digits.len(),
        )?;
        tlwe.check_sample(self.acc.as_slice().len())
    }
}

/// Tracked variance of `TGSW(m) ⊠ TLWE`:
/// `var_tlwe · ‖m‖² + kpl · N · (Bg/2)² · var_tgsw + (1 + k·N) · ε²`.
pub fn external_product_variance<T: Torus>(
    params: &TGswParams<T>,
    var_tgsw: f64,
    var_tlwe: f64,
    message_norm2: f64,
) -> f64 {
    let tlwe = params.tlwe_params();
    let n = tlwe.degree() as f64;
    let half_bg = f64::from(params.half_bg());
    let eps = params.epsilon();
    var_tlwe * message_norm2
        + params.kpl() as f64 * n * half_bg * half_bg * var_tgsw
        + (1.0 + tlwe.k() as f64 * n) * eps * eps
}

fn check_tgsw<T: Torus>(tgsw: &TGswView<'_, T>, params: &TGswParams<T>) -> TfheResult<()> {
    TfheError::check_dimension("TGSW sample", params.sample_len(), tgsw.as_slice().len())?;
    TfheError::check_dimension("TGSW variances", params.kpl(), tgsw.rows())
}

/// `sample ← tgsw ⊠ sample`.
pub fn external_product_assign<T, M>(
    tgsw: TGswView<'_, T>,
    sample: &mut TLweSample<T>,
    params: &TGswParams<T>,
    mul: &M,
    scratch: &mut ExternalProductScratch<T>,
) -> TfheResult<()>
where
    T: Torus,
    M: RingMultiplier<T>,
{
    let tlwe = params.tlwe_params();
    check_tgsw(&tgsw, params)?;
    tlwe.check_sample(sample.as_slice().len())?;
    scratch.check(params)?;

    let n = tlwe.degree();
    let precision = params.precision();
    decompose_sample(&mut scratch.digits, sample, params);

    let acc = &mut scratch.acc;
    acc.as_mut_slice().fill(T::zero(precision));
    for (r, digits) in scratch.digits.chunks_exact(n).enumerate() {
        let row = tgsw.row(r);
        for (out, poly) in acc.as_mut_slice().chunks_exact_mut(n).zip(row.chunks_exact(n)) {
            mul.add_mul(out, digits, poly, precision);
        }
    }

    sample.as_mut_slice().copy_from_slice(acc.as_slice());
    sample.current_variance = external_product_variance(
        params,
        tgsw.max_variance(),
        sample.current_variance,
        tgsw.message_norm2(),
    );
    Ok(())
}

/// Allocating form of [`external_product_assign`].
pub fn external_product<T, M>(
    tgsw: &TGswSample<T>,
    sample: &TLweSample<T>,
    params: &TGswParams<T>,
    mul: &M,
) -> TfheResult<TLweSample<T>>
where
    T: Torus,
    M: RingMultiplier<T>,
{
    let mut result = sample.clone();
    let mut scratch = ExternalProductScratch::new(params);
    external_product_assign(tgsw.view(), &mut result, params, mul, &mut scratch)?;
    Ok(result)
}

/// `out ← c0 + selector ⊠ (c1 - c0)`, so `out` encrypts `c1` when the
/// selector encrypts 1 and `c0` when it encrypts 0.
pub fn cmux<T, M>(
    out: &mut TLweSample<T>,
    selector: TGswView<'_, T>,
    c0: &TLweSample<T>,
    c1: &TLweSample<T>,
    params: &TGswParams<T>,
    mul: &M,
    scratch: &mut ExternalProductScratch<T>,
) -> TfheResult<()>
where
    T: Torus,
    M: RingMultiplier<T>,
{
    let tlwe = params.tlwe_params();
    check_tgsw(&selector, params)?;
    tlwe.check_sample(out.as_slice().len())?;
    tlwe.check_sample(c0.as_slice().len())?;
    tlwe.check_sample(c1.as_slice().len())?;

    out.as_mut_slice().copy_from_slice(c1.as_slice());
    out.current_variance = 0.0;
    out.sub_assign(c0, tlwe)?;
    external_product_assign(selector, out, params, mul, scratch)?;
    out.add_assign(c0, tlwe)?;
    out.current_variance = c0.current_variance.max(c1.current_variance)
        + external_product_variance(params, selector.max_variance(), 0.0, 1.0);
    Ok(())
}
