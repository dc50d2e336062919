pub mod core;
pub mod datatypes;
pub mod estimator;
pub mod link;
pub mod parameters;
pub mod session;
pub mod store;
pub mod utils;
