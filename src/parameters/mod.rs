pub mod parameters;

pub use parameters::{Error, Parameter, ParameterMap, ParameterTree, optional, parse_string};
