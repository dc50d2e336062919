use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
use thiserror::Error;

use super::event::LinkEvent;
use crate::session::{LinkPublisher, SessionError};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Error reading telemetry file")]
    Io(#[from] std::io::Error),

    #[error("Malformed telemetry record")]
    Csv(#[from] csv::Error),

    #[error("Invalid noise parameter: {0}")]
    InvalidNoise(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Producer of link events. Returns `Ok(None)` once exhausted.
pub trait TelemetrySource {
    fn next_event(&mut self) -> Result<Option<LinkEvent>, SourceError>;
}

/// Forwards events from `source` to the session queue until the source is
/// exhausted or `stop` is raised. A link still open when stopping gets a
/// `Disconnected` event so the session is closed cleanly.
///
/// Returns the number of events published.
pub fn pump(
    source: &mut dyn TelemetrySource,
    publisher: &LinkPublisher,
    stop: &AtomicBool,
) -> Result<usize, SourceError> {
    let mut open_link: Option<String> = None;
    let mut published = 0;

    while !stop.load(Ordering::SeqCst) {
        let Some(event) = source.next_event()? else {
            debug!("Telemetry source exhausted after {published} events");
            return Ok(published);
        };

        match &event {
            LinkEvent::Connected { link_uri } => open_link = Some(link_uri.clone()),
            LinkEvent::Disconnected { .. } | LinkEvent::ConnectionLost { .. } => open_link = None,
            _ => {}
        }

        publisher.publish(event)?;
        published += 1;
    }

    if let Some(link_uri) = open_link {
        info!("Stop requested, closing link to {link_uri}");
        publisher.publish(LinkEvent::Disconnected { link_uri })?;
        published += 1;
    }

    Ok(published)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::{
        datatypes::{Attitude, Fragment},
        session::SessionController,
    };

    struct ScriptedSource {
        events: VecDeque<LinkEvent>,
        stop_after: Option<(usize, &'static AtomicBool)>,
        emitted: usize,
    }

    impl TelemetrySource for ScriptedSource {
        fn next_event(&mut self) -> Result<Option<LinkEvent>, SourceError> {
            if let Some((n, stop)) = self.stop_after {
                if self.emitted + 1 >= n {
                    stop.store(true, Ordering::SeqCst);
                }
            }
            self.emitted += 1;
            Ok(self.events.pop_front())
        }
    }

    fn script(n_attitudes: usize) -> VecDeque<LinkEvent> {
        let mut events = VecDeque::from([LinkEvent::Connected {
            link_uri: "test://0".to_string(),
        }]);
        for i in 0..n_attitudes {
            events.push_back(LinkEvent::telemetry(
                i as u64 * 10,
                Fragment::Attitude(Attitude::default()),
            ));
        }
        events
    }

    #[test]
    fn test_pump_until_exhausted() {
        let handle = SessionController::default().spawn().unwrap();
        let publisher = handle.publisher();

        let mut events = script(12);
        events.push_back(LinkEvent::Disconnected {
            link_uri: "test://0".to_string(),
        });
        let mut source = ScriptedSource {
            events,
            stop_after: None,
            emitted: 0,
        };

        let stop = AtomicBool::new(false);
        assert_eq!(pump(&mut source, &publisher, &stop).unwrap(), 14);

        drop(publisher);
        let summaries = handle.join().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].records, 12);
        assert_eq!(summaries[0].estimates, 2);
    }

    #[test]
    fn test_stop_closes_open_link() {
        static STOP: AtomicBool = AtomicBool::new(false);

        let handle = SessionController::default().spawn().unwrap();
        let publisher = handle.publisher();

        let mut source = ScriptedSource {
            events: script(50),
            stop_after: Some((5, &STOP)),
            emitted: 0,
        };

        // Connected + 4 attitudes, then the synthetic disconnect
        assert_eq!(pump(&mut source, &publisher, &STOP).unwrap(), 6);

        drop(publisher);
        let summaries = handle.join().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].link_uri, "test://0");
        assert_eq!(summaries[0].records, 4);
    }
}
