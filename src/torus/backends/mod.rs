//! Concrete torus representations.

pub mod bigint;
pub mod native;

pub use bigint::{BigPrecision, BigTorus};
pub use native::{NativeWidth, Torus32, Torus64};
