//! Ring LWE over `T[X]/(X^N + 1)` with `k` mask polynomials.

pub mod key;
pub mod params;
pub mod sample;

pub use key::TLweKey;
pub use params::TLweParams;
pub use sample::TLweSample;
