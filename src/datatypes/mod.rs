mod attitude;
mod fragment;

pub use attitude::*;
pub use fragment::*;
