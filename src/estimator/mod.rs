mod drift;

pub use drift::*;
