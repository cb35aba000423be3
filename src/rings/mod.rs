pub mod arithmetic;
pub mod backends;
pub mod polynomial;
pub mod traits;

pub use backends::Schoolbook;
pub use polynomial::{IntPolynomial, TorusPolynomial, check_ring_degree};
pub use traits::RingMultiplier;
