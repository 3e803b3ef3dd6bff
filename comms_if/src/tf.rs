//! # Transform Interface
//!
//! Defines the transform message which is broadcast to consumers, and how it is framed on the
//! network.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt;

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A timestamped transform from the parent frame to the child frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformMessage {
    /// UTC timestamp at which the transform was sampled
    #[serde(rename = "stamp_ms", with = "ts_milliseconds")]
    pub stamp: DateTime<Utc>,

    /// Name of the frame the transform is expressed in
    pub parent_frame: String,

    /// Name of the frame being positioned
    pub child_frame: String,

    /// Translation of the child frame origin in the parent frame, in meters.
    pub translation: [f64; 3],

    /// Rotation of the child frame as a unit quaternion, ordered `[x, y, z, w]`.
    pub rotation: [f64; 4],

    /// The roll, pitch, and yaw the rotation was built from, in radians.
    pub rpy: [f64; 3],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur while decoding a transform from the network.
#[derive(Debug, thiserror::Error)]
pub enum TfDecodeError {
    #[error("Message is not valid UTF-8")]
    NotUtf8,

    #[error("Message does not start with the topic \"{0}\"")]
    WrongTopic(String),

    #[error("Could not deserialize the transform: {0}")]
    DeserializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TransformMessage {
    /// Build a transform from a translation and roll/pitch/yaw angles.
    pub fn from_rpy(
        stamp: DateTime<Utc>,
        parent_frame: &str,
        child_frame: &str,
        translation: [f64; 3],
        rpy: [f64; 3],
    ) -> Self {
        Self {
            stamp,
            parent_frame: parent_frame.into(),
            child_frame: child_frame.into(),
            translation,
            rotation: rpy_to_quat(rpy),
            rpy,
        }
    }

    /// Encode the message as a single topic-prefixed frame.
    pub fn encode(&self, topic: &str) -> Result<String, serde_json::Error> {
        Ok(format!("{} {}", topic, serde_json::to_string(self)?))
    }

    /// Decode a message previously produced by [`TransformMessage::encode`].
    pub fn decode(topic: &str, bytes: &[u8]) -> Result<Self, TfDecodeError> {
        let s = std::str::from_utf8(bytes).map_err(|_| TfDecodeError::NotUtf8)?;

        let json = s
            .strip_prefix(topic)
            .and_then(|rest| rest.strip_prefix(' '))
            .ok_or_else(|| TfDecodeError::WrongTopic(topic.into()))?;

        serde_json::from_str(json).map_err(TfDecodeError::DeserializationError)
    }
}

impl fmt::Display for TransformMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} -> {}", self.parent_frame, self.child_frame)?;
        writeln!(f, "  translation:")?;
        writeln!(f, "    x: {}", self.translation[0])?;
        writeln!(f, "    y: {}", self.translation[1])?;
        writeln!(f, "    z: {}", self.translation[2])?;
        writeln!(f, "  rotation:")?;
        writeln!(f, "    x: {}", self.rotation[0])?;
        writeln!(f, "    y: {}", self.rotation[1])?;
        writeln!(f, "    z: {}", self.rotation[2])?;
        write!(f, "    w: {}", self.rotation[3])
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert roll, pitch, and yaw (rotations about the fixed X, Y, Z axes) into a `[x, y, z, w]`
/// quaternion.
pub fn rpy_to_quat(rpy: [f64; 3]) -> [f64; 4] {
    let q = UnitQuaternion::from_euler_angles(rpy[0], rpy[1], rpy[2]);
    let c = q.coords;
    [c[0], c[1], c[2], c[3]]
}
