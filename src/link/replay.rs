use std::{fs::File, io::Read, path::Path};

use log::{info, warn};
use serde::Deserialize;

use super::{
    event::LinkEvent,
    source::{SourceError, TelemetrySource},
};
use crate::datatypes::{Fragment, SourceTag};

/// One row of a recorded flight log
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
struct ReplayRow {
    t: u64,
    source: SourceTag,
    a: f64,
    b: f64,
    c: f64,
}

/// Replays a recorded `t,source,a,b,c` log as a single link session.
pub struct CsvReplay<R: Read> {
    link_uri: String,
    rows: csv::DeserializeRecordsIntoIter<R, ReplayRow>,
    connected: bool,
    done: bool,
    replayed: usize,
}

impl CsvReplay<File> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = File::open(path)?;

        info!("Replaying telemetry from {}", path.display());
        Ok(Self::from_reader(
            format!("replay://{}", path.display()),
            file,
        ))
    }
}

impl<R: Read> CsvReplay<R> {
    pub fn from_reader(link_uri: impl Into<String>, reader: R) -> Self {
        let rows = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader)
            .into_deserialize();

        Self {
            link_uri: link_uri.into(),
            rows,
            connected: false,
            done: false,
            replayed: 0,
        }
    }

    pub fn replayed(&self) -> usize {
        self.replayed
    }
}

impl<R: Read> TelemetrySource for CsvReplay<R> {
    fn next_event(&mut self) -> Result<Option<LinkEvent>, SourceError> {
        if self.done {
            return Ok(None);
        }

        if !self.connected {
            self.connected = true;
            return Ok(Some(LinkEvent::Connected {
                link_uri: self.link_uri.clone(),
            }));
        }

        match self.rows.next() {
            Some(Ok(row)) => {
                self.replayed += 1;
                let fragment = Fragment::from_components(row.source, row.a, row.b, row.c);
                Ok(Some(LinkEvent::telemetry(row.t, fragment)))
            }
            Some(Err(e)) => {
                warn!(
                    "Replay of {} aborted after {} rows",
                    self.link_uri, self.replayed
                );
                self.done = true;
                Err(e.into())
            }
            None => {
                self.done = true;
                Ok(Some(LinkEvent::Disconnected {
                    link_uri: self.link_uri.clone(),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::datatypes::{Attitude, MotionVector};

    const LOG: &str = "\
t,source,a,b,c
0,attitude,0.5,-0.25,10.0
0,accel,0.0,0.0,1.0
10,gyro,0.1,0.2,0.3
10, attitude ,0.6,-0.2,10.1
";

    #[test]
    fn test_replay_sequence() {
        let mut replay = CsvReplay::from_reader("replay://test", LOG.as_bytes());

        let mut events = vec![];
        while let Some(event) = replay.next_event().unwrap() {
            events.push(event);
        }

        assert_eq!(
            events,
            vec![
                LinkEvent::Connected {
                    link_uri: "replay://test".to_string()
                },
                LinkEvent::telemetry(0, Fragment::Attitude(Attitude::new(0.5, -0.25, 10.0))),
                LinkEvent::telemetry(0, Fragment::Accel(MotionVector::new(0.0, 0.0, 1.0))),
                LinkEvent::telemetry(10, Fragment::Gyro(MotionVector::new(0.1, 0.2, 0.3))),
                LinkEvent::telemetry(10, Fragment::Attitude(Attitude::new(0.6, -0.2, 10.1))),
                LinkEvent::Disconnected {
                    link_uri: "replay://test".to_string()
                },
            ]
        );
        assert_eq!(replay.replayed(), 4);
        assert!(replay.next_event().unwrap().is_none());
    }

    #[test]
    fn test_unknown_source_is_an_error() {
        let log = "t,source,a,b,c\n0,baro,1.0,2.0,3.0\n";
        let mut replay = CsvReplay::from_reader("replay://bad", log.as_bytes());

        assert!(replay.next_event().unwrap().is_some());
        assert!(matches!(replay.next_event(), Err(SourceError::Csv(_))));
        assert!(replay.next_event().unwrap().is_none());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            CsvReplay::from_path("/nonexistent/flight.csv"),
            Err(SourceError::Io(_))
        ));
    }
}
