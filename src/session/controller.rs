use std::{
    fmt,
    thread::{self, JoinHandle},
};

use log::{debug, error, info, warn};
use thiserror::Error;

use super::{
    config::StabilizerConfig,
    observer::{LogObserver, SessionObserver},
};
use crate::{
    datatypes::{Attitude, CorrectedOffset, Fragment, Setpoint, Ts},
    estimator::{DriftEstimator, SessionPhase},
    link::{LinkEvent, SetpointSink},
    store::SampleStore,
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session queue is closed")]
    QueueClosed,

    #[error("Could not start the session worker")]
    Spawn(#[from] std::io::Error),

    #[error("Session worker panicked")]
    WorkerPanicked,
}

/// Producer side of the session queue. Cheap to clone; every telemetry group
/// can publish from its own thread.
#[derive(Debug, Clone)]
pub struct LinkPublisher {
    tx: flume::Sender<LinkEvent>,
}

impl LinkPublisher {
    pub fn publish(&self, event: LinkEvent) -> Result<(), SessionError> {
        self.tx.send(event).map_err(|_| SessionError::QueueClosed)
    }

    pub fn fragment(&self, t: u64, fragment: Fragment) -> Result<(), SessionError> {
        self.publish(LinkEvent::telemetry(t, fragment))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub link_uri: String,
    pub records: usize,
    pub attitudes: usize,
    pub estimates: usize,
    pub forwarded: usize,
    pub phase: SessionPhase,
    pub baseline: Option<Attitude>,
    pub last_offset: Option<CorrectedOffset>,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session on {} closed while {}: {} records, {} attitudes, {} estimates, {} setpoints",
            self.link_uri,
            self.phase.as_ref(),
            self.records,
            self.attitudes,
            self.estimates,
            self.forwarded
        )?;

        if let Some(offset) = &self.last_offset {
            write!(f, ", last offset {offset}")?;
        }

        Ok(())
    }
}

/// State of one connection. Dropping it discards the store.
struct Session {
    link_uri: String,
    store: SampleStore,
    phase: SessionPhase,
    attitudes: usize,
    estimates: usize,
    forwarded: usize,
    last_offset: Option<CorrectedOffset>,
    /// A setpoint with thrust reached the sink
    armed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Teardown {
    /// Link still reachable, thrust is cut before letting go
    Orderly,
    /// Link already gone, nothing can be sent
    Lost,
}

impl Session {
    fn summary(&self) -> SessionSummary {
        SessionSummary {
            link_uri: self.link_uri.clone(),
            records: self.store.len(),
            attitudes: self.attitudes,
            estimates: self.estimates,
            forwarded: self.forwarded,
            phase: self.phase,
            baseline: self.store.baseline(),
            last_offset: self.last_offset,
        }
    }
}

/// Owns the sample store of the current connection and is its only mutator.
///
/// Events are handled strictly in the order they are received. The estimator
/// runs right after each attitude is ingested, on the same thread, so it
/// always sees the fragment that triggered it.
pub struct SessionController {
    config: StabilizerConfig,
    estimator: DriftEstimator,
    observer: Box<dyn SessionObserver + Send>,
    sink: Option<Box<dyn SetpointSink + Send>>,
    session: Option<Session>,
    summaries: Vec<SessionSummary>,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(StabilizerConfig::default(), Box::new(LogObserver), None)
    }
}

impl SessionController {
    pub fn new(
        config: StabilizerConfig,
        observer: Box<dyn SessionObserver + Send>,
        sink: Option<Box<dyn SetpointSink + Send>>,
    ) -> Self {
        Self {
            estimator: DriftEstimator::new(config.window),
            config,
            observer,
            sink,
            session: None,
            summaries: vec![],
        }
    }

    pub fn phase(&self) -> Option<SessionPhase> {
        self.session.as_ref().map(|s| s.phase)
    }

    pub fn store(&self) -> Option<&SampleStore> {
        self.session.as_ref().map(|s| &s.store)
    }

    pub fn handle(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Connected { link_uri } => self.open(link_uri),
            LinkEvent::Telemetry(ts) => self.on_telemetry(ts),
            LinkEvent::TelemetryError { group, message } => {
                error!("Error when logging {group}: {message}");
            }
            LinkEvent::Disconnected { link_uri } => {
                info!("Disconnected from {link_uri}");
                self.close(Teardown::Orderly);
            }
            LinkEvent::ConnectionLost { link_uri, message } => {
                error!("Connection to {link_uri} lost: {message}");
                self.close(Teardown::Lost);
            }
            LinkEvent::ConnectionFailed { link_uri, message } => {
                error!("Connection to {link_uri} failed: {message}");
            }
        }
    }

    /// Closes the open session, if any, and returns every session summary
    pub fn finish(mut self) -> Vec<SessionSummary> {
        self.close(Teardown::Orderly);
        self.summaries
    }

    /// Moves the controller to a worker thread fed by a new event queue. The
    /// worker stops once every publisher has been dropped and the queue is
    /// drained.
    pub fn spawn(self) -> Result<SessionHandle, SessionError> {
        let (tx, rx) = flume::unbounded();

        let worker = thread::Builder::new()
            .name("session".to_string())
            .spawn(move || self.run(rx))?;

        Ok(SessionHandle {
            publisher: LinkPublisher { tx },
            worker,
        })
    }

    fn run(mut self, rx: flume::Receiver<LinkEvent>) -> Vec<SessionSummary> {
        while let Ok(event) = rx.recv() {
            self.handle(event);
        }

        debug!("Session queue closed");
        self.finish()
    }

    fn open(&mut self, link_uri: String) {
        if let Some(session) = &self.session {
            warn!(
                "Connected to {link_uri} while a session on {} is still open",
                session.link_uri
            );
            self.close(Teardown::Lost);
        }

        self.observer.on_connected(&link_uri);

        if self.config.setpoint.unlock_on_connect {
            send_setpoint(&mut self.sink, Setpoint::idle());
        }

        let armed = self
            .config
            .setpoint
            .takeoff_thrust
            .is_some_and(|thrust| send_setpoint(&mut self.sink, Setpoint::takeoff(thrust)));

        self.session = Some(Session {
            link_uri,
            store: SampleStore::new(self.config.retention),
            phase: SessionPhase::AwaitingBaseline,
            attitudes: 0,
            estimates: 0,
            forwarded: 0,
            last_offset: None,
            armed,
        });
    }

    fn close(&mut self, teardown: Teardown) {
        let Some(session) = self.session.take() else {
            return;
        };

        if session.armed && teardown == Teardown::Orderly {
            info!("Cutting thrust on {}", session.link_uri);
            send_setpoint(&mut self.sink, Setpoint::idle());
        }

        let summary = session.summary();
        self.observer.on_closed(&summary);
        self.summaries.push(summary);
    }

    fn on_telemetry(&mut self, ts: Ts<Fragment>) {
        let Some(session) = self.session.as_mut() else {
            debug!(
                "Dropping {} fragment [{}] received outside a session",
                ts.v.source(),
                ts.t
            );
            return;
        };

        session.store.ingest(ts.v);

        if !matches!(ts.v, Fragment::Attitude(_)) {
            return;
        }

        session.attitudes += 1;

        let phase = self.estimator.phase(&session.store);
        if phase != session.phase {
            self.observer
                .on_phase_change(&session.link_uri, session.phase, phase);
            session.phase = phase;
        }

        let (Some(offset), Some(baseline)) = (
            self.estimator.estimate(&session.store),
            session.store.baseline(),
        ) else {
            return;
        };

        session.estimates += 1;
        session.last_offset = Some(offset);
        self.observer.on_offset(ts.t, &offset, &baseline);

        if !self.config.setpoint.forward {
            return;
        }

        if offset.is_finite() {
            let setpoint = Setpoint::correction(&offset, self.config.setpoint.hover_thrust);
            if send_setpoint(&mut self.sink, setpoint) {
                session.forwarded += 1;
                session.armed = true;
            }
        } else {
            warn!("[{}] Not forwarding non-finite offset {offset}", ts.t);
        }
    }
}

fn send_setpoint(sink: &mut Option<Box<dyn SetpointSink + Send>>, setpoint: Setpoint) -> bool {
    let Some(sink) = sink else {
        return false;
    };

    match sink.send(setpoint) {
        Ok(()) => true,
        Err(e) => {
            error!("Could not send setpoint: {e}");
            false
        }
    }
}

pub struct SessionHandle {
    publisher: LinkPublisher,
    worker: JoinHandle<Vec<SessionSummary>>,
}

impl SessionHandle {
    pub fn publisher(&self) -> LinkPublisher {
        self.publisher.clone()
    }

    /// Drops the handle's own publisher and waits for the worker to drain the
    /// queue. Publishers cloned from the handle must be dropped too, or this
    /// never returns.
    pub fn join(self) -> Result<Vec<SessionSummary>, SessionError> {
        let SessionHandle { publisher, worker } = self;
        drop(publisher);

        worker.join().map_err(|_| SessionError::WorkerPanicked)
    }
}
