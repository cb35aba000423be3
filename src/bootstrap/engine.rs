//! Gate bootstrapping: blind rotation, sample extraction and key switching.
//!
//! For an input of phase `φ`, the accumulator starts as `X^-b̄ · v` with the
//! test vector `v = μ · Σ X^j`, and each step multiplies it by `X^(ā_i s_i)`
//! through a CMux on the TGSW encryption of `s_i`. Coefficient 0 of
//! `X^-φ̄ · v` is `+μ` for `φ̄ ∈ [0, N)` and `-μ` otherwise.

use crate::bootstrap::{GateBootstrappingParameterSet, LweBootstrappingKey};
use crate::errors::{TfheError, TfheResult};
use crate::lwe::LweSample;
use crate::rings::{RingMultiplier, arithmetic};
use crate::tgsw::{
    ExternalProductScratch, TGswParams, external_product_assign, external_product_variance,
};
use crate::tlwe::TLweSample;
use crate::torus::Torus;
use tracing::{debug, instrument};

/// Buffers for [`blind_rotate`].
#[derive(Debug, Clone)]
pub struct RotationScratch<T: Torus> {
    tmp: TLweSample<T>,
    ext: ExternalProductScratch<T>,
}

impl<T: Torus> RotationScratch<T> {
    pub fn new(params: &TGswParams<T>) -> Self {
        Self {
            tmp: TLweSample::new(params.tlwe_params()),
            ext: ExternalProductScratch::new(params),
        }
    }
}

/// Every working buffer one bootstrap needs. Concurrent bootstraps each use
/// their own arena.
#[derive(Debug, Clone)]
pub struct BootstrapScratch<T: Torus> {
    acc: TLweSample<T>,
    rotation: RotationScratch<T>,
    bara: Vec<usize>,
    testvect: Vec<T>,
    extracted: LweSample<T>,
}

impl<T: Torus> BootstrapScratch<T> {
    pub fn new(params: &GateBootstrappingParameterSet<T>) -> Self {
        let tgsw = params.tgsw_params();
        let tlwe = tgsw.tlwe_params();
        Self {
            acc: TLweSample::new(tlwe),
            rotation: RotationScratch::new(tgsw),
            bara: vec![0; params.in_out_params().n()],
            testvect: vec![T::zero(params.precision()); tlwe.degree()],
            extracted: LweSample::new(tlwe.extracted_lwe_params()),
        }
    }

    fn check(&self, params: &GateBootstrappingParameterSet<T>) -> TfheResult<()> {
        let tlwe = params.tgsw_params().tlwe_params();
        tlwe.check_sample(self.acc.as_slice().len())?;
        tlwe.check_sample(self.rotation.tmp.as_slice().len())?;
        tlwe.check_polynomial(self.testvect.len())?;
        TfheError::check_dimension(
            "bootstrap rotation exponents",
            params.in_out_params().n(),
            self.bara.len(),
        )?;
        tlwe.extracted_lwe_params().check_sample(self.extracted.a.len())
    }
}

/// `acc ← X^(Σ bara_i · s_i) · acc`, one CMux per key bit.
///
/// Every step runs, including those with `bara_i = 0`, so the work done is
/// independent of the data.
pub fn blind_rotate<T, M>(
    acc: &mut TLweSample<T>,
    bk: &LweBootstrappingKey<T>,
    bara: &[usize],
    mul: &M,
    scratch: &mut RotationScratch<T>,
) -> TfheResult<()>
where
    T: Torus,
    M: RingMultiplier<T>,
{
    let tgsw = bk.params().tgsw_params();
    let tlwe = tgsw.tlwe_params();
    TfheError::check_dimension("blind rotation exponents", bk.len(), bara.len())?;
    tlwe.check_sample(acc.as_slice().len())?;
    tlwe.check_sample(scratch.tmp.as_slice().len())?;
    let two_n = 2 * tlwe.degree();
    if let Some(&a) = bara.iter().find(|&&a| a >= two_n) {
        return Err(TfheError::invalid(format!(
            "rotation exponent {a} outside [0, {two_n})"
        )));
    }

    for (i, &a) in bara.iter().enumerate() {
        let bk_i = bk.tgsw(i);
        let variance = acc.current_variance;
        acc.mul_by_xai_minus_one_into(&mut scratch.tmp, a, tlwe)?;
        external_product_assign(bk_i, &mut scratch.tmp, tgsw, mul, &mut scratch.ext)?;
        acc.add_assign(&scratch.tmp, tlwe)?;
        acc.current_variance =
            variance + external_product_variance(tgsw, bk_i.max_variance(), 0.0, 1.0);
    }
    Ok(())
}

/// Rotates the trivial accumulator `X^-barb · testvect` and extracts its
/// constant coefficient into `result` (dimension `k · N`).
pub fn blind_rotate_and_extract<T, M>(
    result: &mut LweSample<T>,
    testvect: &[T],
    barb: usize,
    bara: &[usize],
    bk: &LweBootstrappingKey<T>,
    mul: &M,
    scratch: &mut BootstrapScratch<T>,
) -> TfheResult<()>
where
    T: Torus,
    M: RingMultiplier<T>,
{
    let tlwe = bk.params().tgsw_params().tlwe_params();
    tlwe.check_polynomial(testvect.len())?;
    tlwe.extracted_lwe_params().check_sample(result.a.len())?;
    scratch.check(bk.params())?;
    rotate_and_extract(
        result,
        testvect,
        barb,
        bara,
        bk,
        mul,
        &mut scratch.acc,
        &mut scratch.rotation,
    )
}

#[allow(clippy::too_many_arguments)]
fn rotate_and_extract<T, M>(
    result: &mut LweSample<T>,
    testvect: &[T],
    barb: usize,
    bara: &[usize],
    bk: &LweBootstrappingKey<T>,
    mul: &M,
    acc: &mut TLweSample<T>,
    rotation: &mut RotationScratch<T>,
) -> TfheResult<()>
where
    T: Torus,
    M: RingMultiplier<T>,
{
    let tlwe = bk.params().tgsw_params().tlwe_params();
    let precision = tlwe.precision();
    let two_n = 2 * tlwe.degree();
    if barb >= two_n {
        return Err(TfheError::invalid(format!(
            "rotation exponent {barb} outside [0, {two_n})"
        )));
    }

    acc.as_mut_slice().fill(T::zero(precision));
    arithmetic::mul_by_xai(acc.body_mut(), (two_n - barb) % two_n, testvect, precision);
    acc.current_variance = 0.0;

    blind_rotate(acc, bk, bara, mul, rotation)?;
    acc.extract_lwe_sample_into(result, 0, tlwe)
}

fn check_input<T: Torus>(bk: &LweBootstrappingKey<T>, x: &LweSample<T>) -> TfheResult<()> {
    bk.params().in_out_params().check_sample(x.a.len())
}

/// Mod-switches `x` to `Z/2N` into `bara` and returns `b̄`.
fn mod_switch_input<T: Torus>(
    x: &LweSample<T>,
    two_n: u64,
    precision: &T::Precision,
    bara: &mut [usize],
) -> usize {
    for (bar, a) in bara.iter_mut().zip(&x.a) {
        *bar = a.mod_switch_from_torus(two_n, precision) as usize;
    }
    x.b.mod_switch_from_torus(two_n, precision) as usize
}

#[allow(clippy::too_many_arguments)]
fn bootstrap_core<T, M>(
    result: &mut LweSample<T>,
    bk: &LweBootstrappingKey<T>,
    mu: T,
    x: &LweSample<T>,
    mul: &M,
    acc: &mut TLweSample<T>,
    rotation: &mut RotationScratch<T>,
    bara: &mut [usize],
    testvect: &mut [T],
) -> TfheResult<()>
where
    T: Torus,
    M: RingMultiplier<T>,
{
    let tlwe = bk.params().tgsw_params().tlwe_params();
    let precision = tlwe.precision();
    let two_n = 2 * tlwe.degree() as u64;

    let barb = mod_switch_input(x, two_n, precision, bara);
    testvect.fill(mu);
    debug!("mod-switched input, barb = {}", barb);
    rotate_and_extract(result, testvect, barb, bara, bk, mul, acc, rotation)
}

/// Bootstraps `x` to an encryption of `+mu` (phase in `(0, 1/2)`) or
/// `-mu` under the extracted TLWE key, dimension `k · N`.
#[instrument(level = "debug", skip_all, fields(n = x.a.len()))]
pub fn bootstrap_without_keyswitch<T, M>(
    result: &mut LweSample<T>,
    bk: &LweBootstrappingKey<T>,
    mu: T,
    x: &LweSample<T>,
    mul: &M,
    scratch: &mut BootstrapScratch<T>,
) -> TfheResult<()>
where
    T: Torus,
    M: RingMultiplier<T>,
{
    check_input(bk, x)?;
    let tlwe = bk.params().tgsw_params().tlwe_params();
    tlwe.extracted_lwe_params().check_sample(result.a.len())?;
    scratch.check(bk.params())?;

    let BootstrapScratch {
        acc,
        rotation,
        bara,
        testvect,
        ..
    } = scratch;
    bootstrap_core(result, bk, mu, x, mul, acc, rotation, bara, testvect)
}

/// Full gate bootstrap: `result` encrypts `±mu` under the LWE key with the
/// constant variance [`LweBootstrappingKey::output_variance`].
#[instrument(level = "debug", skip_all, fields(n = x.a.len()))]
pub fn bootstrap<T, M>(
    result: &mut LweSample<T>,
    bk: &LweBootstrappingKey<T>,
    mu: T,
    x: &LweSample<T>,
    mul: &M,
    scratch: &mut BootstrapScratch<T>,
) -> TfheResult<()>
where
    T: Torus,
    M: RingMultiplier<T>,
{
    check_input(bk, x)?;
    bk.params().in_out_params().check_sample(result.a.len())?;
    scratch.check(bk.params())?;

    let BootstrapScratch {
        acc,
        rotation,
        bara,
        testvect,
        extracted,
    } = scratch;
    bootstrap_core(extracted, bk, mu, x, mul, acc, rotation, bara, testvect)?;
    bk.key_switch_key().key_switch_into(result, extracted)
}
