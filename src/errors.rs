use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TfheError {
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("{what} dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Noise standard deviation {alpha:e} outside [{min:e}, {max:e}]")]
    NoiseOutOfRange { alpha: f64, min: f64, max: f64 },

    #[error("Malformed field view: {source}")]
    Format {
        #[from]
        source: crate::fields::FormatError,
    },
}

impl TfheError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Returns `Ok(())` when `actual == expected`.
    pub(crate) fn check_dimension(
        what: &'static str,
        expected: usize,
        actual: usize,
    ) -> TfheResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::DimensionMismatch {
                what,
                expected,
                actual,
            })
        }
    }
}

pub type TfheResult<T> = Result<T, TfheError>;
