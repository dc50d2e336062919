mod sample_store;

pub use sample_store::*;
