use crate::errors::{TfheError, TfheResult};
use crate::rings::{IntPolynomial, RingMultiplier};
use crate::tgsw::{TGswKey, TGswParams};
use crate::tlwe::TLweSample;
use crate::torus::Torus;
use rand::Rng;

/// TGSW ciphertext: `kpl` TLWE rows stored back to back.
///
/// Row `bloc · l + i` encrypts `m · h_i` on component `bloc` (`bloc = k` is
/// the body), so decomposing a TLWE sample against the rows recombines to
/// `m` times its phase. `message_norm2` is `‖m‖²`, which scales the TLWE
/// noise through an external product.
#[derive(Debug, Clone, PartialEq)]
pub struct TGswSample<T: Torus> {
    data: Vec<T>,
    variances: Vec<f64>,
    message_norm2: f64,
}

/// Borrowed rows of a TGSW sample, possibly living inside a larger table
/// such as a bootstrapping key.
#[derive(Debug, Clone, Copy)]
pub struct TGswView<'a, T: Torus> {
    data: &'a [T],
    variances: &'a [f64],
    message_norm2: f64,
}

impl<'a, T: Torus> TGswView<'a, T> {
    pub(crate) fn new(data: &'a [T], variances: &'a [f64], message_norm2: f64) -> Self {
        debug_assert!(!variances.is_empty() && data.len() % variances.len() == 0);
        Self {
            data,
            variances,
            message_norm2,
        }
    }

    pub fn rows(&self) -> usize {
        self.variances.len()
    }

    /// Row `r` as a flat TLWE coefficient slice.
    pub fn row(&self, r: usize) -> &'a [T] {
        let len = self.data.len() / self.variances.len();
        &self.data[r * len..(r + 1) * len]
    }

    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    pub fn variances(&self) -> &'a [f64] {
        self.variances
    }

    pub fn max_variance(&self) -> f64 {
        self.variances.iter().copied().fold(0.0, f64::max)
    }

    pub fn message_norm2(&self) -> f64 {
        self.message_norm2
    }
}

impl<T: Torus> TGswSample<T> {
    pub fn new(params: &TGswParams<T>) -> Self {
        Self {
            data: vec![T::zero(params.precision()); params.sample_len()],
            variances: vec![0.0; params.kpl()],
            message_norm2: 0.0,
        }
    }

    pub fn from_parts(
        data: Vec<T>,
        variances: Vec<f64>,
        message_norm2: f64,
        params: &TGswParams<T>,
    ) -> TfheResult<Self> {
        TfheError::check_dimension("TGSW sample", params.sample_len(), data.len())?;
        TfheError::check_dimension("TGSW variances", params.kpl(), variances.len())?;
        if !(message_norm2.is_finite() && message_norm2 >= 0.0) {
            return Err(TfheError::invalid(format!(
                "message norm {message_norm2} is not a non-negative real"
            )));
        }
        Ok(Self {
            data,
            variances,
            message_norm2,
        })
    }

    /// `kpl` independent TLWE encryptions of zero.
    pub fn encrypt_zero<M, R>(
        key: &TGswKey<T>,
        alpha: f64,
        mul: &M,
        rng: &mut R,
    ) -> TfheResult<Self>
    where
        M: RingMultiplier<T>,
        R: Rng + ?Sized,
    {
        let params = key.params();
        let mut sample = Self::new(params);
        let row_len = params.tlwe_params().sample_len();
        for (row, variance) in sample
            .data
            .chunks_exact_mut(row_len)
            .zip(sample.variances.iter_mut())
        {
            let zero = TLweSample::encrypt_zero(key.tlwe_key(), alpha, mul, rng)?;
            row.copy_from_slice(zero.as_slice());
            *variance = zero.current_variance;
        }
        Ok(sample)
    }

    /// Encrypts the integer constant `m`.
    pub fn encrypt_int<M, R>(
        key: &TGswKey<T>,
        m: i32,
        alpha: f64,
        mul: &M,
        rng: &mut R,
    ) -> TfheResult<Self>
    where
        M: RingMultiplier<T>,
        R: Rng + ?Sized,
    {
        let mut sample = Self::encrypt_zero(key, alpha, mul, rng)?;
        sample.add_gadget(&[m], key.params());
        sample.message_norm2 = f64::from(m) * f64::from(m);
        Ok(sample)
    }

    /// Encrypts the integer polynomial `m`.
    pub fn encrypt_poly<M, R>(
        key: &TGswKey<T>,
        m: &IntPolynomial,
        alpha: f64,
        mul: &M,
        rng: &mut R,
    ) -> TfheResult<Self>
    where
        M: RingMultiplier<T>,
        R: Rng + ?Sized,
    {
        let params = key.params();
        params.tlwe_params().check_polynomial(m.degree())?;
        let mut sample = Self::encrypt_zero(key, alpha, mul, rng)?;
        sample.add_gadget(&m.coefs, params);
        sample.message_norm2 = m.norm_squared();
        Ok(sample)
    }

    /// Adds `m · h_i` to component `bloc` of row `bloc · l + i`.
    fn add_gadget(&mut self, m: &[i32], params: &TGswParams<T>) {
        let tlwe = params.tlwe_params();
        let (n, l) = (tlwe.degree(), params.l());
        let row_len = tlwe.sample_len();
        let precision = params.precision();
        for bloc in 0..=tlwe.k() {
            for (i, h) in params.gadget().iter().enumerate() {
                let start = (bloc * l + i) * row_len + bloc * n;
                for (c, &mj) in self.data[start..start + n].iter_mut().zip(m) {
                    c.add_mul_int(h, i64::from(mj), precision);
                }
            }
        }
    }

    pub fn view(&self) -> TGswView<'_, T> {
        TGswView::new(&self.data, &self.variances, self.message_norm2)
    }

    pub fn row(&self, r: usize) -> &[T] {
        self.view().row(r)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn variances(&self) -> &[f64] {
        &self.variances
    }

    pub fn max_variance(&self) -> f64 {
        self.view().max_variance()
    }

    pub fn message_norm2(&self) -> f64 {
        self.message_norm2
    }
}
