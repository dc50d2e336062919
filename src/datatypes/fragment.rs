use serde::Deserialize;
use strum::{AsRefStr, Display};

use super::attitude::{Attitude, MotionVector};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timestamped<T> {
    /// Link timestamp in milliseconds
    pub t: u64,
    pub v: T,
}

impl<T> Timestamped<T> {
    pub fn new(t: u64, v: T) -> Self {
        Timestamped { t, v }
    }
}

pub type Ts<T> = Timestamped<T>;

/// Telemetry group a fragment was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Attitude,
    Accel,
    Gyro,
}

/// A partial observation delivered by the link. Attitude and inertial
/// readings come from different log groups and are merged by the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fragment {
    Attitude(Attitude),
    Accel(MotionVector),
    Gyro(MotionVector),
}

impl Fragment {
    pub fn source(&self) -> SourceTag {
        match self {
            Fragment::Attitude(_) => SourceTag::Attitude,
            Fragment::Accel(_) => SourceTag::Accel,
            Fragment::Gyro(_) => SourceTag::Gyro,
        }
    }

    /// Builds a fragment from the three raw components of a log group
    pub fn from_components(source: SourceTag, a: f64, b: f64, c: f64) -> Self {
        match source {
            SourceTag::Attitude => Fragment::Attitude(Attitude::new(a, b, c)),
            SourceTag::Accel => Fragment::Accel(MotionVector::new(a, b, c)),
            SourceTag::Gyro => Fragment::Gyro(MotionVector::new(a, b, c)),
        }
    }
}
