mod event;
mod replay;
mod simulated;
mod sink;
mod source;

pub use event::LinkEvent;
pub use replay::CsvReplay;
pub use simulated::{SimulatedLink, SimulationConfig};
pub use sink::{LogSink, SetpointSink, SinkError};
pub use source::{SourceError, TelemetrySource, pump};
