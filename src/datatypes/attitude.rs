use std::{
    fmt,
    ops::{Add, Div},
};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Orientation triple reported by the flight controller, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Attitude {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Attitude {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    pub fn from_slice(v: &[f64]) -> Option<Self> {
        match v {
            [roll, pitch, yaw] => Some(Self::new(*roll, *pitch, *yaw)),
            _ => None,
        }
    }
}

impl Add for Attitude {
    type Output = Attitude;

    fn add(self, rhs: Attitude) -> Self::Output {
        Attitude {
            roll: self.roll + rhs.roll,
            pitch: self.pitch + rhs.pitch,
            yaw: self.yaw + rhs.yaw,
        }
    }
}

impl Div<f64> for Attitude {
    type Output = Attitude;

    fn div(self, rhs: f64) -> Self::Output {
        Attitude {
            roll: self.roll / rhs,
            pitch: self.pitch / rhs,
            yaw: self.yaw / rhs,
        }
    }
}

impl fmt::Display for Attitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{roll={:.3}, pitch={:.3}, yaw={:.3}}}",
            self.roll, self.pitch, self.yaw
        )
    }
}

/// Three-axis inertial reading. Used for both the accelerometer and the
/// gyroscope, which are always kept in separate fields.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MotionVector {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<Vector3<f64>> for MotionVector {
    fn from(v: Vector3<f64>) -> Self {
        MotionVector {
            x: v[0],
            y: v[1],
            z: v[2],
        }
    }
}

impl From<MotionVector> for Vector3<f64> {
    fn from(v: MotionVector) -> Self {
        Vector3::new(v.x, v.y, v.z)
    }
}

/// Averaged attitude minus the session baseline.
///
/// Components are not validated: a NaN or infinite sample inside the averaging
/// window surfaces here unchanged. Check [`CorrectedOffset::is_finite`] before
/// acting on it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CorrectedOffset {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl CorrectedOffset {
    pub fn between(mean: Attitude, baseline: Attitude) -> Self {
        CorrectedOffset {
            roll: mean.roll - baseline.roll,
            pitch: mean.pitch - baseline.pitch,
            yaw: mean.yaw - baseline.yaw,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.roll.is_finite() && self.pitch.is_finite() && self.yaw.is_finite()
    }
}

impl fmt::Display for CorrectedOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{roll={:.3}, pitch={:.3}, yaw={:.3}}}",
            self.roll, self.pitch, self.yaw
        )
    }
}

/// Command accepted by a [`crate::link::SetpointSink`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Setpoint {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub thrust: u16,
}

impl Setpoint {
    /// All zeroes. Sending it once after connecting releases the thrust lock.
    pub fn idle() -> Self {
        Setpoint::default()
    }

    /// Level attitude at the given thrust, used to spin up after unlocking
    pub fn takeoff(thrust: u16) -> Self {
        Setpoint {
            thrust,
            ..Setpoint::default()
        }
    }

    /// Counteracts the measured offset at the given thrust
    pub fn correction(offset: &CorrectedOffset, thrust: u16) -> Self {
        Setpoint {
            roll: -offset.roll,
            pitch: -offset.pitch,
            yaw: -offset.yaw,
            thrust,
        }
    }
}
