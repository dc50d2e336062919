use std::collections::VecDeque;

use chrono::TimeDelta;
use log::info;
use nalgebra::{UnitQuaternion, Vector3};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256StarStar;

use super::{
    event::LinkEvent,
    source::{SourceError, TelemetrySource},
};
use crate::{
    core::time::{Clock, SimulatedClock, SystemClock, TD},
    datatypes::{Attitude, Fragment, MotionVector},
    parameters::{Parameter, ParameterMap, optional},
    session::ConfigError,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub link_uri: String,
    pub period: TimeDelta,
    pub duration: TimeDelta,
    /// Random seed when `None`
    pub seed: Option<u64>,
    pub initial_attitude: Attitude,
    /// Attitude drift, degrees per second
    pub drift: Attitude,
    pub attitude_noise: f64,
    pub accel_noise: f64,
    pub gyro_noise: f64,
    /// Gravity magnitude, in the accelerometer units
    pub g: f64,
    /// Pace the events on the wall clock
    pub realtime: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            link_uri: "sim://0".to_string(),
            period: TimeDelta::milliseconds(10),
            duration: TimeDelta::seconds(5),
            seed: None,
            initial_attitude: Attitude::default(),
            drift: Attitude::new(0.2, -0.1, 0.0),
            attitude_noise: 0.05,
            accel_noise: 0.01,
            gyro_noise: 0.1,
            g: 1.0,
            realtime: false,
        }
    }
}

impl SimulationConfig {
    /// Reads the `sim` table. Missing entries keep their default value.
    pub fn from_parameters(params: &ParameterMap) -> Result<Self, ConfigError> {
        let mut config = SimulationConfig::default();

        let Some(sim) = optional(params.get_map("sim"))? else {
            return Ok(config);
        };

        if let Some(p) = optional(sim.get_param("link_uri"))? {
            config.link_uri = p.value_string()?.to_string();
        }

        if let Some(p) = optional(sim.get_param("period_ms"))? {
            let value = p.value_int()?;
            if value <= 0 {
                return Err(out_of_range(p, "a positive number of milliseconds", value));
            }
            config.period = TimeDelta::milliseconds(value);
        }

        if let Some(p) = optional(sim.get_param("duration_s"))? {
            let value = p.value_float()?;
            if !value.is_finite() || value < 0.0 {
                return Err(out_of_range(p, "a non-negative number of seconds", value));
            }
            config.duration = TimeDelta::milliseconds((value * 1000.0).round() as i64);
        }

        if let Some(p) = optional(sim.get_param("seed"))? {
            let value = p.value_int()?;
            config.seed = Some(
                u64::try_from(value).map_err(|_| out_of_range(p, "a non-negative integer", value))?,
            );
        }

        if let Some(p) = optional(sim.get_param("initial_attitude"))? {
            config.initial_attitude = attitude_param(p)?;
        }

        if let Some(p) = optional(sim.get_param("drift_deg_s"))? {
            config.drift = attitude_param(p)?;
        }

        if let Some(p) = optional(sim.get_param("attitude_noise_deg"))? {
            config.attitude_noise = p.value_float()?;
        }

        if let Some(p) = optional(sim.get_param("accel_noise"))? {
            config.accel_noise = p.value_float()?;
        }

        if let Some(p) = optional(sim.get_param("gyro_noise"))? {
            config.gyro_noise = p.value_float()?;
        }

        if let Some(p) = optional(sim.get_param("g"))? {
            config.g = p.value_float()?;
        }

        Ok(config)
    }

    /// Number of sampling periods that fit in the duration
    pub fn ticks(&self) -> u64 {
        let period = self.period.num_milliseconds();
        if period <= 0 {
            return 0;
        }

        (self.duration.num_milliseconds() / period).max(0) as u64
    }
}

fn out_of_range(p: &Parameter, expected: &str, value: impl ToString) -> ConfigError {
    ConfigError::OutOfRange {
        path: p.path().to_string(),
        expected: expected.to_string(),
        value: value.to_string(),
    }
}

fn attitude_param(p: &Parameter) -> Result<Attitude, ConfigError> {
    let values = p.value_float_arr()?;

    Attitude::from_slice(values)
        .ok_or_else(|| out_of_range(p, "[roll, pitch, yaw]", format!("{values:?}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Connect,
    Stream,
    Done,
}

/// Stand-in for a flight controller holding a hover while its attitude
/// estimate slowly drifts.
///
/// Every period it reports the drifting attitude, the accelerometer reading
/// of gravity in the body frame and the gyroscope reading of the drift rate.
pub struct SimulatedLink {
    config: SimulationConfig,
    clock: Box<dyn Clock>,
    rng: Xoshiro256StarStar,
    attitude_noise: Normal<f64>,
    accel_noise: Normal<f64>,
    gyro_noise: Normal<f64>,
    g_n: Vector3<f64>,
    stage: Stage,
    tick: u64,
    pending: VecDeque<LinkEvent>,
}

impl SimulatedLink {
    pub fn new(config: SimulationConfig) -> Result<Self, SourceError> {
        let seed = config.seed.unwrap_or_else(rand::random);
        info!("Simulated link {} using seed {seed}", config.link_uri);

        Ok(Self {
            attitude_noise: noise("attitude", config.attitude_noise)?,
            accel_noise: noise("accel", config.accel_noise)?,
            gyro_noise: noise("gyro", config.gyro_noise)?,
            g_n: Vector3::new(0.0, 0.0, config.g),
            rng: Xoshiro256StarStar::seed_from_u64(seed),
            clock: link_clock(config.realtime),
            config,
            stage: Stage::Connect,
            tick: 0,
            pending: VecDeque::new(),
        })
    }

    fn sample_vector(&mut self, dist: Normal<f64>) -> Vector3<f64> {
        Vector3::from_fn(|_, _| dist.sample(&mut self.rng))
    }

    /// Produces the three fragments of the current tick
    fn step(&mut self) -> [LinkEvent; 3] {
        let t = TD(self.clock.elapsed());
        let t_ms = t.millis();
        let secs = (self.tick * self.config.period.num_milliseconds() as u64) as f64 / 1000.0;

        let drift = self.config.drift;
        let true_attitude = self.config.initial_attitude
            + Attitude::new(drift.roll * secs, drift.pitch * secs, drift.yaw * secs);

        let noise = self.sample_vector(self.attitude_noise);
        let attitude = true_attitude + Attitude::new(noise.x, noise.y, noise.z);

        let quat_nb = UnitQuaternion::from_euler_angles(
            true_attitude.roll.to_radians(),
            true_attitude.pitch.to_radians(),
            true_attitude.yaw.to_radians(),
        );
        let accel: Vector3<f64> =
            quat_nb.inverse_transform_vector(&self.g_n) + self.sample_vector(self.accel_noise);

        let gyro: Vector3<f64> = Vector3::new(drift.roll, drift.pitch, drift.yaw)
            + self.sample_vector(self.gyro_noise);

        [
            LinkEvent::telemetry(t_ms, Fragment::Attitude(attitude)),
            LinkEvent::telemetry(t_ms, Fragment::Accel(MotionVector::from(accel))),
            LinkEvent::telemetry(t_ms, Fragment::Gyro(MotionVector::from(gyro))),
        ]
    }
}

/// Timestamps count from the moment the link reports itself connected
fn link_clock(realtime: bool) -> Box<dyn Clock> {
    if realtime {
        Box::new(SystemClock::default())
    } else {
        Box::new(SimulatedClock::default())
    }
}

fn noise(name: &str, std_dev: f64) -> Result<Normal<f64>, SourceError> {
    Normal::new(0.0, std_dev)
        .map_err(|e| SourceError::InvalidNoise(format!("{name} noise {std_dev}: {e}")))
}

impl TelemetrySource for SimulatedLink {
    fn next_event(&mut self) -> Result<Option<LinkEvent>, SourceError> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }

        let link_uri = self.config.link_uri.clone();

        let event = match self.stage {
            Stage::Connect => {
                self.clock = link_clock(self.config.realtime);
                self.stage = Stage::Stream;
                Some(LinkEvent::Connected { link_uri })
            }
            Stage::Stream if self.tick >= self.config.ticks() => {
                self.stage = Stage::Done;
                Some(LinkEvent::Disconnected { link_uri })
            }
            Stage::Stream => {
                if self.tick > 0 {
                    self.clock.advance(self.config.period);
                }

                let [attitude, accel, gyro] = self.step();
                self.pending.extend([accel, gyro]);
                self.tick += 1;

                Some(attitude)
            }
            Stage::Done => None,
        };

        Ok(event)
    }
}
