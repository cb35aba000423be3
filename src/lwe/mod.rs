//! Binary-secret LWE over the torus.

pub mod key;
pub mod keyswitch;
pub mod params;
pub mod sample;

pub use key::LweKey;
pub use keyswitch::LweKeySwitchKey;
pub use params::LweParams;
pub use sample::{LweSample, add, sub};
