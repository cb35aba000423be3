//! Signed gadget decomposition.
//!
//! A torus value `x` is split into `l` digits `d_p ∈ (-Bg/2, Bg/2]` with
//! `Σ d_p · Bg^-(p+1)` equal to `x` rounded (half up) to `l · Bgbit` bits.
//! Adding the precomputed offset turns the signed split into an unsigned
//! digit extraction, so no digit needs a carry pass.

use crate::tgsw::TGswParams;
use crate::tlwe::TLweSample;
use crate::torus::Torus;

/// Writes the `l` digits of `x` into `out`.
#[inline]
pub fn decompose_coefficient<T: Torus>(x: &T, params: &TGswParams<T>, out: &mut [i32]) {
    assert_eq!(out.len(), params.l(), "digit buffer must hold l digits");
    let shifted = offset_value(x, params);
    for (p, digit) in out.iter_mut().enumerate() {
        *digit = signed_digit(&shifted, p, params);
    }
}

#[inline]
fn offset_value<T: Torus>(x: &T, params: &TGswParams<T>) -> T {
    let mut shifted = *x;
    shifted.add_assign(params.offset(), params.precision());
    shifted
}

#[inline]
fn signed_digit<T: Torus>(shifted: &T, p: usize, params: &TGswParams<T>) -> i32 {
    let position = (p as u32 + 1) * params.bgbit();
    let raw = shifted.to_dyadic(position, params.precision()) & (params.bg() as u64 - 1);
    raw as i32 - (params.half_bg() - 1)
}

/// Decomposes every coefficient of `poly` (length `N`) into `l` digit
/// polynomials: digit `p` of coefficient `j` lands at `out[p · N + j]`.
pub fn decompose_polynomial<T: Torus>(out: &mut [i32], poly: &[T], params: &TGswParams<T>) {
    let n = poly.len();
    assert_eq!(out.len(), params.l() * n, "digit buffer must hold l * N digits");
    for (j, x) in poly.iter().enumerate() {
        let shifted = offset_value(x, params);
        for (p, row) in out.chunks_exact_mut(n).enumerate() {
            row[j] = signed_digit(&shifted, p, params);
        }
    }
}

/// Decomposes the `k + 1` polynomials of a TLWE sample; row
/// `bloc · l + p` of `out` (each `N` long) holds digit `p` of polynomial
/// `bloc`.
pub fn decompose_sample<T: Torus>(out: &mut [i32], sample: &TLweSample<T>, params: &TGswParams<T>) {
    let n = sample.degree();
    let l = params.l();
    assert_eq!(
        out.len(),
        params.kpl() * n,
        "digit buffer must hold (k + 1) * l * N digits"
    );
    for (bloc, rows) in out.chunks_exact_mut(l * n).enumerate() {
        decompose_polynomial(rows, sample.polynomial(bloc), params);
    }
}

/// `Σ d_p · Bg^-(p+1)`.
pub fn recompose<T: Torus>(digits: &[i32], params: &TGswParams<T>) -> T {
    let precision = params.precision();
    let mut acc = T::zero(precision);
    for (d, h) in digits.iter().zip(params.gadget()) {
        acc.add_mul_int(h, i64::from(*d), precision);
    }
    acc
}
