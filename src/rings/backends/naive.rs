use crate::rings::RingMultiplier;
use crate::torus::Torus;

/// Exact O(N²) negacyclic multiplication.
///
/// Every coefficient pair is visited regardless of its value, so the
/// running time depends only on `N`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Schoolbook;

impl Schoolbook {
    fn accumulate<T: Torus>(
        result: &mut [T],
        int_poly: &[i32],
        torus_poly: &[T],
        sign: i64,
        precision: &T::Precision,
    ) {
        let n = result.len();
        assert_eq!(int_poly.len(), n, "integer polynomial degree mismatch");
        assert_eq!(torus_poly.len(), n, "torus polynomial degree mismatch");

        for (i, &a) in int_poly.iter().enumerate() {
            let k = sign * i64::from(a);
            // X^i · X^j for j < N - i stays below degree N.
            for (r, b) in result[i..].iter_mut().zip(&torus_poly[..n - i]) {
                r.add_mul_int(b, k, precision);
            }
            // X^N = -1 for the wrapped part.
            for (r, b) in result[..i].iter_mut().zip(&torus_poly[n - i..]) {
                r.add_mul_int(b, -k, precision);
            }
        }
    }
}

impl<T: Torus> RingMultiplier<T> for Schoolbook {
    fn add_mul(
        &self,
        result: &mut [T],
        int_poly: &[i32],
        torus_poly: &[T],
        precision: &T::Precision,
    ) {
        Self::accumulate(result, int_poly, torus_poly, 1, precision);
    }

    fn sub_mul(
        &self,
        result: &mut [T],
        int_poly: &[i32],
        torus_poly: &[T],
        precision: &T::Precision,
    ) {
        Self::accumulate(result, int_poly, torus_poly, -1, precision);
    }
}
