use crate::errors::{TfheError, TfheResult};
use crate::torus::Torus;

/// Rejects ring dimensions that are not a power of two.
pub fn check_ring_degree(degree: usize) -> TfheResult<()> {
    if degree.is_power_of_two() {
        Ok(())
    } else {
        Err(TfheError::invalid(format!(
            "ring dimension must be a power of two, got {degree}"
        )))
    }
}

/// Element of `(R/Z)[X]/(X^N + 1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorusPolynomial<T: Torus> {
    pub coefs: Vec<T>,
}

impl<T: Torus> TorusPolynomial<T> {
    pub fn zero(degree: usize, precision: &T::Precision) -> TfheResult<Self> {
        check_ring_degree(degree)?;
        Ok(Self {
            coefs: vec![T::zero(precision); degree],
        })
    }

    pub fn from_coefs(coefs: Vec<T>) -> TfheResult<Self> {
        check_ring_degree(coefs.len())?;
        Ok(Self { coefs })
    }

    /// `mu` on the constant coefficient, zero elsewhere.
    pub fn constant(mu: T, degree: usize, precision: &T::Precision) -> TfheResult<Self> {
        let mut poly = Self::zero(degree, precision)?;
        poly.coefs[0] = mu;
        Ok(poly)
    }

    pub fn degree(&self) -> usize {
        self.coefs.len()
    }
}

/// Element of `Z[X]/(X^N + 1)` with small coefficients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntPolynomial {
    pub coefs: Vec<i32>,
}

impl IntPolynomial {
    pub fn zero(degree: usize) -> TfheResult<Self> {
        check_ring_degree(degree)?;
        Ok(Self {
            coefs: vec![0; degree],
        })
    }

    pub fn from_coefs(coefs: Vec<i32>) -> TfheResult<Self> {
        check_ring_degree(coefs.len())?;
        Ok(Self { coefs })
    }

    pub fn constant(m: i32, degree: usize) -> TfheResult<Self> {
        let mut poly = Self::zero(degree)?;
        poly.coefs[0] = m;
        Ok(poly)
    }

    pub fn degree(&self) -> usize {
        self.coefs.len()
    }

    /// Squared Euclidean norm `Σ m_i²`.
    pub fn norm_squared(&self) -> f64 {
        self.coefs.iter().map(|&c| f64::from(c) * f64::from(c)).sum()
    }
}
