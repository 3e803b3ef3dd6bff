//! # Tuner library.
//!
//! Allows the tuner's modules to be used and tested outside of the executable.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Startup argument parsing
pub mod args;

/// Keystroke to command mapping
pub mod cmd;

/// Executable parameters
pub mod params;

/// The pose being tuned and the step sizes used to tune it
pub mod pose;

/// Background thread publishing the current transform
pub mod publisher;

/// Terminal mode control and the operator console
pub mod terminal;

/// Transform broadcast over the network
pub mod tf_server;

/// The command interpreter
pub mod tuner;
