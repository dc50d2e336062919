pub mod config;
mod controller;
mod observer;

pub use config::{ConfigError, DEFAULT_HOVER_THRUST, SetpointConfig, StabilizerConfig};
pub use controller::{LinkPublisher, SessionController, SessionError, SessionHandle, SessionSummary};
pub use observer::{LogObserver, SessionObserver};
