pub mod buffer;
pub mod capacity;
