use crate::torus::Torus;

/// Multiplication in `T[X]/(X^N + 1)` of an integer polynomial by a torus
/// polynomial.
///
/// Implementations must compute the exact negacyclic product: coefficient
/// `i + j ≥ N` folds onto `i + j - N` with its sign flipped. All three
/// slices have the same power-of-two length `N`. Fast backends (FFT, NTT)
/// plug in here; [`crate::rings::Schoolbook`] is the reference.
pub trait RingMultiplier<T: Torus>: Send + Sync {
    /// `result += int_poly · torus_poly`.
    fn add_mul(
        &self,
        result: &mut [T],
        int_poly: &[i32],
        torus_poly: &[T],
        precision: &T::Precision,
    );

    /// `result -= int_poly · torus_poly`.
    fn sub_mul(
        &self,
        result: &mut [T],
        int_poly: &[i32],
        torus_poly: &[T],
        precision: &T::Precision,
    );

    /// `result = int_poly · torus_poly`.
    fn mul(
        &self,
        result: &mut [T],
        int_poly: &[i32],
        torus_poly: &[T],
        precision: &T::Precision,
    ) {
        result.fill(T::zero(precision));
        self.add_mul(result, int_poly, torus_poly, precision);
    }
}
