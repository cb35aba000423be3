//! Slice-level arithmetic on torus polynomials modulo `X^N + 1`.
//!
//! The functions take plain slices so TLWE/TGSW samples stored as one flat
//! buffer can operate on their component polynomials in place. Length
//! agreement is a caller contract and is asserted.

use crate::torus::Torus;

#[inline]
fn check_lengths(a: usize, b: usize) {
    assert_eq!(a, b, "polynomial degree mismatch: {a} vs {b}");
}

pub fn add_assign<T: Torus>(dst: &mut [T], src: &[T], precision: &T::Precision) {
    check_lengths(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src) {
        d.add_assign(s, precision);
    }
}

pub fn sub_assign<T: Torus>(dst: &mut [T], src: &[T], precision: &T::Precision) {
    check_lengths(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src) {
        d.sub_assign(s, precision);
    }
}

/// `dst += k · src` coefficient-wise.
pub fn add_mul_int_assign<T: Torus>(
    dst: &mut [T],
    src: &[T],
    k: i64,
    precision: &T::Precision,
) {
    check_lengths(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src) {
        d.add_mul_int(s, k, precision);
    }
}

pub fn negate<T: Torus>(dst: &mut [T], precision: &T::Precision) {
    for d in dst.iter_mut() {
        *d = d.neg(precision);
    }
}

/// Coefficient `i` of `X^a · src`, for `a ∈ [0, 2N)`.
#[inline]
fn rotated<T: Torus>(src: &[T], a: usize, i: usize, precision: &T::Precision) -> T {
    let n = src.len();
    if a < n {
        if i < a {
            src[i + n - a].neg(precision)
        } else {
            src[i - a]
        }
    } else {
        let a = a - n;
        if i < a {
            src[i + n - a]
        } else {
            src[i - a].neg(precision)
        }
    }
}

#[inline]
fn check_rotation(n: usize, a: usize) {
    assert!(a < 2 * n, "rotation exponent {a} outside [0, {})", 2 * n);
}

/// `out = X^a · src`.
///
/// # Panics
///
/// Panics if the lengths differ or `a ≥ 2N`.
pub fn mul_by_xai<T: Torus>(out: &mut [T], a: usize, src: &[T], precision: &T::Precision) {
    check_lengths(out.len(), src.len());
    check_rotation(src.len(), a);
    for (i, o) in out.iter_mut().enumerate() {
        *o = rotated(src, a, i, precision);
    }
}

/// `out = (X^a - 1) · src`.
pub fn mul_by_xai_minus_one<T: Torus>(
    out: &mut [T],
    a: usize,
    src: &[T],
    precision: &T::Precision,
) {
    check_lengths(out.len(), src.len());
    check_rotation(src.len(), a);
    for (i, o) in out.iter_mut().enumerate() {
        let mut v = rotated(src, a, i, precision);
        v.sub_assign(&src[i], precision);
        *o = v;
    }
}

/// `dst += X^a · src`.
pub fn add_mul_by_xai<T: Torus>(
    dst: &mut [T],
    a: usize,
    src: &[T],
    precision: &T::Precision,
) {
    check_lengths(dst.len(), src.len());
    check_rotation(src.len(), a);
    for (i, d) in dst.iter_mut().enumerate() {
        d.add_assign(&rotated(src, a, i, precision), precision);
    }
}

/// Largest coefficient-wise torus distance.
pub fn norm_inf_dist<T: Torus>(a: &[T], b: &[T], precision: &T::Precision) -> f64 {
    check_lengths(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| x.distance(y, precision))
        .fold(0.0, f64::max)
}
