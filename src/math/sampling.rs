use crate::torus::Torus;
use rand::Rng;

/// Samples a uniform binary vector (secret-key coefficients).
pub fn binary_coefficients<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<i32> {
    (0..len).map(|_| i32::from(rng.random_bool(0.5))).collect()
}

/// Samples `len` uniform torus elements.
pub fn uniform_torus_coefficients<T: Torus, R: Rng + ?Sized>(
    len: usize,
    precision: &T::Precision,
    rng: &mut R,
) -> Vec<T> {
    (0..len).map(|_| T::uniform(precision, rng)).collect()
}

/// Samples `len` centered Gaussian torus elements.
///
/// # Panics
///
/// Panics through [`Torus::gaussian`] if `len > 0` and `std_dev` is
/// negative or not finite.
pub fn gaussian_torus_coefficients<T: Torus, R: Rng + ?Sized>(
    len: usize,
    std_dev: f64,
    precision: &T::Precision,
    rng: &mut R,
) -> Vec<T> {
    (0..len).map(|_| T::gaussian(std_dev, precision, rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::{
        binary_coefficients, gaussian_torus_coefficients, uniform_torus_coefficients,
    };
    use crate::torus::{BigPrecision, BigTorus, NativeWidth, Torus, Torus32, Torus64};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn binary_coefficients_are_bits() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let key = binary_coefficients(512, &mut rng);
        assert_eq!(key.len(), 512);
        assert!(key.iter().all(|&b| b == 0 || b == 1));
    }

    #[test]
    fn binary_coefficients_are_roughly_balanced() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let key = binary_coefficients(8192, &mut rng);
        let ones = key.iter().filter(|&&b| b == 1).count() as f64;
        let expected = 4096.0;
        assert!(
            (ones - expected).abs() <= expected * 0.05,
            "weight {ones} too far from expected {expected}"
        );
    }

    #[test]
    fn uniform_torus_coefficients_cover_all_octants() {
        const OCTANTS: usize = 8;
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let coeffs =
            uniform_torus_coefficients::<Torus32, _>(8192, &NativeWidth, &mut rng);

        let mut buckets = [0usize; OCTANTS];
        for c in &coeffs {
            buckets[c.to_dyadic(3, &NativeWidth) as usize] += 1;
        }
        let expected = coeffs.len() as f64 / OCTANTS as f64;
        for &count in &buckets {
            let deviation = (count as f64 - expected).abs();
            assert!(
                deviation <= expected * 0.30,
                "bucket count {count} too far from expected {expected}"
            );
        }
    }

    #[test]
    fn gaussian_torus_coefficients_have_reasonable_mean_and_variance() {
        let std_dev = 2f64.powi(-12);
        let mut rng = ChaCha20Rng::seed_from_u64(99);
        let coeffs = gaussian_torus_coefficients::<Torus64, _>(
            16_384,
            std_dev,
            &NativeWidth,
            &mut rng,
        );
        let reals: Vec<f64> = coeffs.iter().map(|c| c.to_real(&NativeWidth)).collect();

        let mean = reals.iter().sum::<f64>() / reals.len() as f64;
        let variance = reals
            .iter()
            .map(|&x| (x - mean) * (x - mean))
            .sum::<f64>()
            / reals.len() as f64;

        let expected_variance = std_dev * std_dev;
        assert!(mean.abs() <= std_dev * 0.05, "mean too far from 0: {mean}");
        assert!(
            (variance - expected_variance).abs() <= expected_variance * 0.1,
            "variance {variance} too far from expected {expected_variance}"
        );
    }

    #[test]
    fn gaussian_torus_coefficients_respect_big_precision() {
        let precision = BigPrecision::<2>::new(80).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let coeffs = gaussian_torus_coefficients::<BigTorus<2>, _>(
            64,
            2f64.powi(-40),
            &precision,
            &mut rng,
        );
        let mut words = Vec::new();
        for c in &coeffs {
            words.clear();
            c.write_words(&mut words);
            assert_eq!(BigTorus::<2>::read_words(&words, &precision), Some(*c));
        }
    }

    #[test]
    #[should_panic(expected = "gaussian: std_dev must be finite and non-negative")]
    fn gaussian_torus_coefficients_panics_on_non_finite_std_dev() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let _ = gaussian_torus_coefficients::<Torus32, _>(
            8,
            f64::NAN,
            &NativeWidth,
            &mut rng,
        );
    }
}
