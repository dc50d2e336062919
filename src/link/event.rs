use strum::AsRefStr;

use crate::datatypes::{Fragment, Ts};

/// Everything the flight-control link reports, in arrival order.
#[derive(Debug, Clone, PartialEq, AsRefStr)]
pub enum LinkEvent {
    /// Link is up and the log groups are configured
    Connected { link_uri: String },
    Telemetry(Ts<Fragment>),
    /// A telemetry group reported an error; the link stays up
    TelemetryError { group: String, message: String },
    /// Link closed, on request or after a failure
    Disconnected { link_uri: String },
    /// Link dropped after having been connected
    ConnectionLost { link_uri: String, message: String },
    /// Link could not be opened at all
    ConnectionFailed { link_uri: String, message: String },
}

impl LinkEvent {
    pub fn telemetry(t: u64, fragment: Fragment) -> Self {
        LinkEvent::Telemetry(Ts::new(t, fragment))
    }
}
