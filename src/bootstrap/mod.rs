//! Gate bootstrapping: parameter sets, keys and the bootstrap itself.

pub mod builder;
pub mod engine;
pub mod key;
pub mod keyset;
pub mod params;

pub use builder::ParameterSetBuilder;
pub use engine::{
    BootstrapScratch, RotationScratch, blind_rotate, blind_rotate_and_extract, bootstrap,
    bootstrap_without_keyswitch,
};
pub use key::LweBootstrappingKey;
pub use keyset::GateBootstrappingSecretKeySet;
pub use params::GateBootstrappingParameterSet;
