//! Gadget (TGSW) encryption and the external product `TGSW ⊠ TLWE`.

pub mod decomposition;
pub mod external_product;
pub mod key;
pub mod params;
pub mod sample;

pub use decomposition::{decompose_coefficient, decompose_polynomial, decompose_sample, recompose};
pub use external_product::{
    ExternalProductScratch, cmux, external_product, external_product_assign,
    external_product_variance,
};
pub use key::TGswKey;
pub use params::TGswParams;
pub use sample::{TGswSample, TGswView};
