//! # Tuner Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;

use serde::{Deserialize, Serialize};
use util::time::seconds_to_std_duration;

use crate::pose::{StepSizeError, StepSizes, DEFAULT_POSITION_STEP_M, DEFAULT_ROTATION_STEP_RAD};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerExecParams {
    /// Endpoint the transform `PUB` socket binds to
    pub tf_endpoint: String,

    /// Topic prefixed to every transform message
    pub tf_topic: String,

    /// Period between published transforms
    pub publish_period_s: f64,

    /// Maximum time to wait for a key before redrawing the prompt
    pub idle_period_s: f64,

    /// Position step in use at startup, meters
    pub default_position_step: f64,

    /// Rotation step in use at startup, radians
    pub default_rotation_step: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("{0} must be a positive number of seconds, got {1}")]
    InvalidPeriod(&'static str, f64),

    #[error("Invalid default step size: {0}")]
    InvalidStep(StepSizeError),

    #[error("The transform topic must not be empty or contain spaces")]
    InvalidTopic,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TunerExecParams {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), ParamsError> {
        self.publish_period()?;
        self.idle_period()?;
        self.default_steps()?;

        if self.tf_topic.is_empty() || self.tf_topic.contains(' ') {
            return Err(ParamsError::InvalidTopic);
        }

        Ok(())
    }

    pub fn publish_period(&self) -> Result<Duration, ParamsError> {
        positive_period("publish_period_s", self.publish_period_s)
    }

    pub fn idle_period(&self) -> Result<Duration, ParamsError> {
        positive_period("idle_period_s", self.idle_period_s)
    }

    pub fn default_steps(&self) -> Result<StepSizes, ParamsError> {
        StepSizes::new(self.default_position_step, self.default_rotation_step)
            .map_err(ParamsError::InvalidStep)
    }
}

impl Default for TunerExecParams {
    fn default() -> Self {
        Self {
            tf_endpoint: "tcp://*:5010".into(),
            tf_topic: "tf".into(),
            publish_period_s: 0.1,
            idle_period_s: 0.2,
            default_position_step: DEFAULT_POSITION_STEP_M,
            default_rotation_step: DEFAULT_ROTATION_STEP_RAD,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn positive_period(name: &'static str, seconds: f64) -> Result<Duration, ParamsError> {
    match seconds_to_std_duration(seconds) {
        Some(d) if d > Duration::from_secs(0) => Ok(d),
        _ => Err(ParamsError::InvalidPeriod(name, seconds)),
    }
}
