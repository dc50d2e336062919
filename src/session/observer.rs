use log::{debug, info};

use super::controller::SessionSummary;
use crate::{
    datatypes::{Attitude, CorrectedOffset},
    estimator::SessionPhase,
};

/// Receives what a session produces. Injected per controller; every method
/// is optional.
pub trait SessionObserver {
    fn on_connected(&mut self, _link_uri: &str) {}

    fn on_phase_change(&mut self, _link_uri: &str, _from: SessionPhase, _to: SessionPhase) {}

    fn on_offset(&mut self, _t: u64, _offset: &CorrectedOffset, _baseline: &Attitude) {}

    fn on_closed(&mut self, _summary: &SessionSummary) {}
}

#[derive(Debug, Default, Clone)]
pub struct LogObserver;

impl SessionObserver for LogObserver {
    fn on_connected(&mut self, link_uri: &str) {
        info!("Session opened on {link_uri}");
    }

    fn on_phase_change(&mut self, link_uri: &str, from: SessionPhase, to: SessionPhase) {
        info!("[{link_uri}] {} -> {}", from.as_ref(), to.as_ref());
    }

    fn on_offset(&mut self, t: u64, offset: &CorrectedOffset, baseline: &Attitude) {
        debug!("[{t}] offset={offset} baseline={baseline}");
    }

    fn on_closed(&mut self, summary: &SessionSummary) {
        info!("{summary}");
    }
}
