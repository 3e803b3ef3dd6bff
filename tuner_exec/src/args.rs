//! # Startup arguments
//!
//! The tuner takes exactly eight positional arguments: the six pose values followed by the parent
//! and child frame names.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::pose::{FrameLink, Pose};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of positional arguments expected, not counting the executable name.
pub const NUM_ARGS: usize = 8;

/// Names of the positional arguments, in order.
const ARG_NAMES: [&str; NUM_ARGS] = ["x", "y", "z", "R", "P", "Y", "parent_frame", "child_frame"];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The parsed startup arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct StartupArgs {
    pub pose: Pose,
    pub frames: FrameLink,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ArgsError {
    #[error("Invalid amount of input arguments, expected {} found {0}", NUM_ARGS)]
    WrongCount(usize),

    #[error("Argument '{0}' must be a number, found \"{1}\"")]
    NotANumber(&'static str, String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StartupArgs {
    /// Parse the arguments, excluding the executable name.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, ArgsError> {
        if args.len() != NUM_ARGS {
            return Err(ArgsError::WrongCount(args.len()));
        }

        let mut values = [0f64; 6];
        for (i, v) in values.iter_mut().enumerate() {
            let s = args[i].as_ref();
            *v = s
                .trim()
                .parse()
                .map_err(|_| ArgsError::NotANumber(ARG_NAMES[i], s.to_string()))?;
        }

        Ok(Self {
            pose: Pose {
                x: values[0],
                y: values[1],
                z: values[2],
                roll: values[3],
                pitch: values[4],
                yaw: values[5],
            },
            frames: FrameLink {
                parent: args[6].as_ref().to_string(),
                child: args[7].as_ref().to_string(),
            },
        })
    }
}

/// Usage line for the executable.
pub fn usage(exec_name: &str) -> String {
    let names: Vec<String> = ARG_NAMES.iter().map(|n| format!("'{}'", n)).collect();
    format!("Usage: {} {}", exec_name, names.join(" "))
}
