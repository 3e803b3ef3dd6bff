//! # Keyboard commands
//!
//! Maps single keystrokes onto the commands the tuner understands.

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command issued by a single keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Switch between position and rotation editing (`c`)
    ToggleMode,

    /// Print the current transform (`p`)
    Print,

    /// Read new step sizes from the operator (`m`)
    Reconfigure,

    /// Return the pose to the initial pose (`r`)
    Reset,

    /// Leave the tuner (`e`)
    Exit,

    /// Move one axis of the pose by one step
    Tune(Axis, Direction),

    /// Any key without a binding
    Unknown(char),
}

/// One of the three axes a tuning command acts on.
///
/// Which pose field the axis maps to depends on the edit mode: `First` is x or roll, `Second` is
/// y or pitch, `Third` is z or yaw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    First,
    Second,
    Third,
}

/// Direction of a tuning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Command {
    /// Get the command bound to a key. Bindings are case sensitive.
    pub fn from_char(c: char) -> Self {
        match c {
            'c' => Command::ToggleMode,
            'p' => Command::Print,
            'm' => Command::Reconfigure,
            'r' => Command::Reset,
            'e' => Command::Exit,
            'w' => Command::Tune(Axis::First, Direction::Increase),
            'q' => Command::Tune(Axis::First, Direction::Decrease),
            's' => Command::Tune(Axis::Second, Direction::Increase),
            'a' => Command::Tune(Axis::Second, Direction::Decrease),
            'x' => Command::Tune(Axis::Third, Direction::Increase),
            'z' => Command::Tune(Axis::Third, Direction::Decrease),
            c => Command::Unknown(c),
        }
    }
}

impl Direction {
    /// Sign applied to the step size.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Increase => 1.0,
            Direction::Decrease => -1.0,
        }
    }
}

/// Help text describing the key layout.
pub const KEY_LAYOUT: &[&str] = &[
    "Key layout:",
    "",
    "  * q/w: decrease/increase x/roll",
    "  * a/s: decrease/increase y/pitch",
    "  * z/x: decrease/increase z/yaw",
    "",
    "  * c: toggle between position/rotation modes",
    "  * p: print out the transformation",
    "  * r: reset the transformation",
    "  * m: change step sizes",
    "  * e: exit the program",
    "",
];

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_char() {
        assert_eq!(Command::from_char('c'), Command::ToggleMode);
        assert_eq!(Command::from_char('e'), Command::Exit);
        assert_eq!(
            Command::from_char('z'),
            Command::Tune(Axis::Third, Direction::Decrease)
        );

        // Case sensitive
        assert_eq!(Command::from_char('W'), Command::Unknown('W'));
        assert_eq!(Command::from_char('k'), Command::Unknown('k'));
    }
}
