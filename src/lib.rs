pub mod bootstrap;
pub mod errors;
pub mod fields;
pub mod lwe;
pub mod math;
pub mod rings;
pub mod tgsw;
pub mod tlwe;
pub mod torus;

pub use bootstrap::{
    BootstrapScratch, GateBootstrappingParameterSet, GateBootstrappingSecretKeySet,
    LweBootstrappingKey, ParameterSetBuilder, bootstrap, bootstrap_without_keyswitch,
};
pub use errors::{TfheError, TfheResult};
pub use fields::{FieldValue, FieldView, Fields, FormatError};
pub use lwe::{LweKey, LweKeySwitchKey, LweParams, LweSample};
pub use rings::{IntPolynomial, RingMultiplier, Schoolbook, TorusPolynomial};
pub use tgsw::{ExternalProductScratch, TGswKey, TGswParams, TGswSample};
pub use tlwe::{TLweKey, TLweParams, TLweSample};
pub use torus::{BigPrecision, BigTorus, ModulusParams, NativeWidth, Torus, Torus32, Torus64};

use crypto_bigint::nlimbs;

// Big torus aliases by bit width
macro_rules! big_torus_bits {
    ($name:ident, $bits:expr) => {
        pub type $name = BigTorus<{ nlimbs!($bits) }>;
    };
}

big_torus_bits!(BigTorus128, 128);
big_torus_bits!(BigTorus256, 256);
