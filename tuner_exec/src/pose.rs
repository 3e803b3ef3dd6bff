//! # Pose state
//!
//! The transform being tuned, the step sizes used to tune it, and which half of it the operator
//! is currently editing.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use comms_if::tf::TransformMessage;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default step applied to the position axes, in meters.
pub const DEFAULT_POSITION_STEP_M: f64 = 0.05;

/// Default step applied to the rotation axes, in radians.
pub const DEFAULT_ROTATION_STEP_RAD: f64 = 0.05;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Position and orientation of the child frame in the parent frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,

    /// Rotation about the parent X axis, radians
    pub roll: f64,

    /// Rotation about the parent Y axis, radians
    pub pitch: f64,

    /// Rotation about the parent Z axis, radians
    pub yaw: f64,
}

/// The pose which is shared between the interpreter and the publisher.
pub type SharedPose = Arc<Mutex<Pose>>;

/// Increments used when tuning the pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSizes {
    /// Position increment, meters
    pub position_step: f64,

    /// Rotation increment, radians
    pub rotation_step: f64,
}

/// The pair of frames the transform links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLink {
    pub parent: String,
    pub child: String,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Which three fields of the pose the axis commands act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Position,
    Rotation,
}

/// Errors produced when building step sizes from operator input.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StepSizeError {
    #[error("\"{0}\" is not a number")]
    NotANumber(String),

    #[error("Step sizes must be positive and finite, got {0}")]
    NotPositive(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose {
    /// Position component as an array.
    pub fn translation(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Orientation component as an array.
    pub fn rpy(&self) -> [f64; 3] {
        [self.roll, self.pitch, self.yaw]
    }

    /// Build the transform message for this pose at the given time.
    pub fn to_transform(&self, frames: &FrameLink, stamp: DateTime<Utc>) -> TransformMessage {
        TransformMessage::from_rpy(
            stamp,
            &frames.parent,
            &frames.child,
            self.translation(),
            self.rpy(),
        )
    }

    /// Wrap the pose for sharing with the publisher.
    pub fn into_shared(self) -> SharedPose {
        Arc::new(Mutex::new(self))
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  x = {}", self.x)?;
        writeln!(f, "  y = {}", self.y)?;
        writeln!(f, "  z = {}", self.z)?;
        writeln!(f, "  R = {}", self.roll)?;
        writeln!(f, "  P = {}", self.pitch)?;
        write!(f, "  Y = {}", self.yaw)
    }
}

impl StepSizes {
    /// Create new step sizes, checking both are positive.
    pub fn new(position_step: f64, rotation_step: f64) -> Result<Self, StepSizeError> {
        Ok(Self {
            position_step: check_step(position_step)?,
            rotation_step: check_step(rotation_step)?,
        })
    }
}

impl Default for StepSizes {
    fn default() -> Self {
        Self {
            position_step: DEFAULT_POSITION_STEP_M,
            rotation_step: DEFAULT_ROTATION_STEP_RAD,
        }
    }
}

impl EditMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            EditMode::Position => EditMode::Rotation,
            EditMode::Rotation => EditMode::Position,
        }
    }

    /// Prompt shown while waiting for a key in this mode.
    pub fn prompt(self) -> &'static str {
        match self {
            EditMode::Position => "position <-: ",
            EditMode::Rotation => "rotation <-: ",
        }
    }
}

impl Default for EditMode {
    fn default() -> Self {
        EditMode::Rotation
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Lock the shared pose.
///
/// The pose is plain data which is always left consistent, so a lock poisoned by a panicking
/// holder is still used.
pub fn lock_pose(pose: &SharedPose) -> MutexGuard<'_, Pose> {
    pose.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Parse a single step size typed by the operator.
pub fn parse_step(s: &str) -> Result<f64, StepSizeError> {
    let s = s.trim();
    let step = s
        .parse::<f64>()
        .map_err(|_| StepSizeError::NotANumber(s.to_string()))?;

    check_step(step)
}

fn check_step(step: f64) -> Result<f64, StepSizeError> {
    if step.is_finite() && step > 0.0 {
        Ok(step)
    }
    else {
        Err(StepSizeError::NotPositive(step))
    }
}
