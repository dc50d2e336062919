use std::num::NonZero;

use thiserror::Error;

use crate::{
    estimator::DEFAULT_WINDOW,
    parameters::{self, Parameter, ParameterMap, optional},
    utils::capacity::Capacity,
};

/// Thrust used while holding a hover with corrections forwarded
pub const DEFAULT_HOVER_THRUST: u16 = 33500;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error(transparent)]
    Parameter(#[from] parameters::Error),

    #[error("Parameter '{path}' must be {expected} (got {value})")]
    OutOfRange {
        path: String,
        expected: String,
        value: String,
    },

    #[error("Store retention ({retention}) must hold at least {required} records")]
    RetentionTooSmall { retention: usize, required: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetpointConfig {
    /// Send the negated offset to the sink after every estimate
    pub forward: bool,
    pub hover_thrust: u16,
    /// Send an idle setpoint as soon as the link connects
    pub unlock_on_connect: bool,
    /// Spin-up thrust sent right after connecting (and unlocking)
    pub takeoff_thrust: Option<u16>,
}

impl Default for SetpointConfig {
    fn default() -> Self {
        Self {
            forward: false,
            hover_thrust: DEFAULT_HOVER_THRUST,
            unlock_on_connect: false,
            takeoff_thrust: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StabilizerConfig {
    pub window: NonZero<usize>,
    pub retention: Capacity,
    pub setpoint: SetpointConfig,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            retention: Capacity::Unbounded,
            setpoint: SetpointConfig::default(),
        }
    }
}

impl StabilizerConfig {
    /// Reads the `estimator`, `store` and `setpoint` tables. Missing entries
    /// keep their default value.
    pub fn from_parameters(params: &ParameterMap) -> Result<Self, ConfigError> {
        let mut config = StabilizerConfig::default();

        if let Some(window) = optional(params.get_param("estimator.window"))? {
            let value = window.value_int()?;
            config.window = usize::try_from(value)
                .ok()
                .and_then(NonZero::new)
                .ok_or_else(|| ConfigError::OutOfRange {
                    path: window.path().to_string(),
                    expected: "a positive integer".to_string(),
                    value: value.to_string(),
                })?;
        }

        if let Some(retention) = optional(params.get_param("store.retention"))? {
            let value = retention.value_int()?;
            config.retention = usize::try_from(value)
                .map_err(|_| ConfigError::OutOfRange {
                    path: retention.path().to_string(),
                    expected: "zero (unbounded) or a positive integer".to_string(),
                    value: value.to_string(),
                })?
                .into();
        }

        if let Some(forward) = optional(params.get_param("setpoint.forward"))? {
            config.setpoint.forward = forward.value_bool()?;
        }

        if let Some(thrust) = optional(params.get_param("setpoint.hover_thrust"))? {
            config.setpoint.hover_thrust = thrust_param(thrust)?;
        }

        if let Some(unlock) = optional(params.get_param("setpoint.unlock_on_connect"))? {
            config.setpoint.unlock_on_connect = unlock.value_bool()?;
        }

        if let Some(thrust) = optional(params.get_param("setpoint.takeoff_thrust"))? {
            config.setpoint.takeoff_thrust = Some(thrust_param(thrust)?);
        }

        config.validate()?;

        Ok(config)
    }

    /// The estimator needs the window plus the newest record in the store
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = self.window.get() + 1;

        match self.retention {
            Capacity::Bounded(cap) if !self.retention.holds(required) => {
                Err(ConfigError::RetentionTooSmall {
                    retention: cap.get(),
                    required,
                })
            }
            _ => Ok(()),
        }
    }
}

fn thrust_param(param: &Parameter) -> Result<u16, ConfigError> {
    let value = param.value_int()?;

    u16::try_from(value).map_err(|_| ConfigError::OutOfRange {
        path: param.path().to_string(),
        expected: format!("between 0 and {}", u16::MAX),
        value: value.to_string(),
    })
}
