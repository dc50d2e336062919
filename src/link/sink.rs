use log::info;
use thiserror::Error;

use crate::datatypes::Setpoint;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("Setpoint sink is closed")]
    Closed,
}

/// Downstream consumer of corrective commands.
pub trait SetpointSink {
    fn send(&mut self, setpoint: Setpoint) -> Result<(), SinkError>;
}

/// Sink that only reports what would be transmitted
#[derive(Debug, Default)]
pub struct LogSink {
    sent: usize,
}

impl LogSink {
    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl SetpointSink for LogSink {
    fn send(&mut self, setpoint: Setpoint) -> Result<(), SinkError> {
        self.sent += 1;

        info!(
            "Send setpoint roll={:.3} pitch={:.3} yaw={:.3} thrust={}",
            setpoint.roll, setpoint.pitch, setpoint.yaw, setpoint.thrust
        );

        Ok(())
    }
}
