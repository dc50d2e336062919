use std::{thread, time::Instant};

use chrono::TimeDelta;

/// Time base used by telemetry producers to stamp link events.
pub trait Clock: Send {
    fn elapsed(&self) -> TimeDelta;

    fn advance(&mut self, delta: TimeDelta);
}

/// Wall clock. `advance` sleeps until the requested point in time, so a
/// producer stepping it by a fixed period keeps a steady cadence.
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
    target: TimeDelta,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
            target: TimeDelta::zero(),
        }
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> TimeDelta {
        TimeDelta::from_std(self.start.elapsed()).unwrap_or(TimeDelta::MAX)
    }

    fn advance(&mut self, delta: TimeDelta) {
        self.target += delta;

        if let Ok(remaining) = (self.target - self.elapsed()).to_std() {
            thread::sleep(remaining);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedClock {
    elapsed: TimeDelta,
}

impl SimulatedClock {
    pub fn new(elapsed: TimeDelta) -> SimulatedClock {
        SimulatedClock { elapsed }
    }
}

impl Clock for SimulatedClock {
    fn elapsed(&self) -> TimeDelta {
        self.elapsed
    }

    fn advance(&mut self, delta: TimeDelta) {
        self.elapsed += delta
    }
}

pub struct TD(pub TimeDelta);

impl TD {
    pub fn seconds(&self) -> f64 {
        self.0.num_seconds() as f64 + (self.0.subsec_nanos() as f64) / 1000000000.0
    }

    /// Link timestamps are whole milliseconds since the link was opened
    pub fn millis(&self) -> u64 {
        self.0.num_milliseconds().max(0) as u64
    }
}
