pub mod naive;

pub use naive::Schoolbook;
