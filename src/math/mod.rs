pub mod sampling;

pub use sampling::{
    binary_coefficients, gaussian_torus_coefficients, uniform_torus_coefficients,
};
