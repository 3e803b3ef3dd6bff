//! # Tuner
//!
//! The command interpreter. Owns the pose being tuned and applies one keystroke at a time to it.
//!
//! Generic commands (`c`, `p`, `m`, `r`) change the mode, step sizes or whole pose, never one axis.
//! `e` ends the session. Reset and exit are independent, resetting does not exit.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::io;

use chrono::Utc;
use log::{debug, info, trace, warn};

use crate::{
    cmd::{Axis, Command, Direction},
    pose::{lock_pose, parse_step, EditMode, FrameLink, Pose, SharedPose, StepSizes},
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The operator the tuner talks to.
pub trait Operator {
    /// Show a line of text to the operator.
    fn say(&mut self, line: &str);

    /// Prompt for and block on a line of text typed by the operator.
    ///
    /// The implementor must switch the terminal into line mode for the duration of the read and
    /// back to raw mode afterwards.
    fn ask(&mut self, prompt: &str) -> io::Result<String>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The interactive tuning state machine.
pub struct Tuner {
    /// Pose given at startup, never modified
    initial: Pose,

    /// Pose being tuned, shared with the publisher
    current: SharedPose,

    steps: StepSizes,

    mode: EditMode,

    frames: FrameLink,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// What the input loop should do after a command has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Tuner {
    /// Create a new tuner, the current pose starts equal to the initial pose.
    pub fn new(initial: Pose, frames: FrameLink, steps: StepSizes) -> Self {
        Self {
            initial,
            current: initial.into_shared(),
            steps,
            mode: EditMode::default(),
            frames,
        }
    }

    /// Handle to the current pose, for the publisher.
    pub fn shared_pose(&self) -> SharedPose {
        self.current.clone()
    }

    /// Copy of the current pose.
    pub fn current(&self) -> Pose {
        *lock_pose(&self.current)
    }

    pub fn initial(&self) -> Pose {
        self.initial
    }

    pub fn steps(&self) -> StepSizes {
        self.steps
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn frames(&self) -> &FrameLink {
        &self.frames
    }

    /// Handle a single keystroke.
    pub fn handle_key(&mut self, key: char, op: &mut dyn Operator) -> io::Result<Flow> {
        self.handle(Command::from_char(key), op)
    }

    /// Handle a single command.
    ///
    /// Generic commands (`c`, `p`, `m`, `r`) never move the pose by a step.
    pub fn handle(&mut self, cmd: Command, op: &mut dyn Operator) -> io::Result<Flow> {
        trace!("Handling {:?} in {:?} mode", cmd, self.mode);

        match cmd {
            // Generic commands
            Command::ToggleMode => {
                self.mode = self.mode.toggled();
                debug!("Edit mode is now {:?}", self.mode);
            }
            Command::Print => self.print(op),
            Command::Reconfigure => self.reconfigure(op)?,
            Command::Reset => {
                op.say("resetting the x y z R P Y");
                *lock_pose(&self.current) = self.initial;
                debug!("Pose reset to {:?}", self.initial);
            }

            Command::Exit => {
                op.say("Exiting");
                info!("Exit requested");
                return Ok(Flow::Exit);
            }
            Command::Tune(axis, direction) => self.tune(axis, direction),
            Command::Unknown(c) => {
                op.say("Received an unknown character");
                debug!("Unknown key {:?}", c);
            }
        }

        Ok(Flow::Continue)
    }

    /// Dump the current transform to the operator.
    fn print(&self, op: &mut dyn Operator) {
        let pose = self.current();
        let tf = pose.to_transform(&self.frames, Utc::now());

        op.say("Printing the transform:");
        for line in tf.to_string().lines() {
            op.say(line);
        }
        op.say("Rotation in RPY:");
        op.say(&format!("  r: {}", pose.roll));
        op.say(&format!("  p: {}", pose.pitch));
        op.say(&format!("  y: {}", pose.yaw));
    }

    /// Read new step sizes from the operator.
    ///
    /// The step sizes only change if both values are valid.
    fn reconfigure(&mut self, op: &mut dyn Operator) -> io::Result<()> {
        let position_step = match parse_step(&op.ask("enter position step size (m): ")?) {
            Ok(s) => s,
            Err(e) => {
                self.reject_steps(op, e);
                return Ok(());
            }
        };
        let rotation_step = match parse_step(&op.ask("enter rotation step size (rad): ")?) {
            Ok(s) => s,
            Err(e) => {
                self.reject_steps(op, e);
                return Ok(());
            }
        };

        self.steps = StepSizes {
            position_step,
            rotation_step,
        };

        op.say(&format!(
            "Step sizes set to {} m and {} rad",
            position_step, rotation_step
        ));
        debug!("Step sizes changed to {:?}", self.steps);

        Ok(())
    }

    fn reject_steps(&self, op: &mut dyn Operator, err: impl std::fmt::Display) {
        op.say(&format!("Invalid input, better luck next time ({})", err));
        warn!("Step sizes left unchanged at {:?}: {}", self.steps, err);
    }

    /// Step one axis of the pose.
    fn tune(&mut self, axis: Axis, direction: Direction) {
        let mut pose = lock_pose(&self.current);

        let (field, step) = match (self.mode, axis) {
            (EditMode::Position, Axis::First) => (&mut pose.x, self.steps.position_step),
            (EditMode::Position, Axis::Second) => (&mut pose.y, self.steps.position_step),
            (EditMode::Position, Axis::Third) => (&mut pose.z, self.steps.position_step),
            (EditMode::Rotation, Axis::First) => (&mut pose.roll, self.steps.rotation_step),
            (EditMode::Rotation, Axis::Second) => (&mut pose.pitch, self.steps.rotation_step),
            (EditMode::Rotation, Axis::Third) => (&mut pose.yaw, self.steps.rotation_step),
        };

        *field += direction.sign() * step;

        trace!("Pose is now {:?}", *pose);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::VecDeque;

    /// Operator which answers prompts from a script and records everything said.
    #[derive(Default)]
    struct ScriptedOperator {
        answers: VecDeque<String>,
        said: Vec<String>,
        asked: usize,
    }

    impl ScriptedOperator {
        fn answering(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    impl Operator for ScriptedOperator {
        fn say(&mut self, line: &str) {
            self.said.push(line.into());
        }

        fn ask(&mut self, _prompt: &str) -> io::Result<String> {
            self.asked += 1;
            Ok(self.answers.pop_front().unwrap_or_default())
        }
    }

    fn start_pose() -> Pose {
        Pose {
            x: 1.0,
            y: -2.0,
            z: 0.25,
            roll: 0.1,
            pitch: -0.2,
            yaw: 3.0,
        }
    }

    fn tuner(initial: Pose) -> Tuner {
        Tuner::new(
            initial,
            FrameLink {
                parent: "base_link".into(),
                child: "camera".into(),
            },
            StepSizes::default(),
        )
    }

    fn press(tuner: &mut Tuner, op: &mut ScriptedOperator, keys: &str) {
        for k in keys.chars() {
            assert_eq!(tuner.handle_key(k, op).unwrap(), Flow::Continue);
        }
    }

    #[test]
    fn test_initial_equals_current() {
        let t = tuner(start_pose());

        assert_eq!(t.current(), t.initial());
        assert_eq!(t.current().x.to_bits(), start_pose().x.to_bits());
        assert_eq!(t.current().yaw.to_bits(), start_pose().yaw.to_bits());
        assert_eq!(t.steps(), StepSizes::default());
    }

    #[test]
    fn test_position_steps() {
        let mut t = tuner(Pose::default());
        let mut op = ScriptedOperator::default();

        // Starts in rotation mode
        press(&mut t, &mut op, "c");
        assert_eq!(t.mode(), EditMode::Position);

        press(&mut t, &mut op, "www");
        assert!((t.current().x - 0.15).abs() < 1e-6);

        press(&mut t, &mut op, "q");
        assert!((t.current().x - 0.10).abs() < 1e-6);

        press(&mut t, &mut op, "sxz");
        let p = t.current();
        assert!((p.y - 0.05).abs() < 1e-6);
        assert!(p.z.abs() < 1e-6);
        assert_eq!(p.roll, 0.0);
    }

    #[test]
    fn test_rotation_steps() {
        let mut t = tuner(Pose::default());
        let mut op = ScriptedOperator::default();

        press(&mut t, &mut op, "wsaxx");
        let p = t.current();
        assert!((p.roll - 0.05).abs() < 1e-6);
        assert!(p.pitch.abs() < 1e-6);
        assert!((p.yaw - 0.10).abs() < 1e-6);
        assert_eq!(p.translation(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_step_then_inverse() {
        let mut t = tuner(start_pose());
        let mut op = ScriptedOperator::default();

        for mode_keys in &["", "c"] {
            press(&mut t, &mut op, mode_keys);
            for pair in &["wq", "sa", "xz"] {
                let before = t.current();
                press(&mut t, &mut op, pair);
                let after = t.current();
                for (a, b) in before
                    .translation()
                    .iter()
                    .chain(before.rpy().iter())
                    .zip(after.translation().iter().chain(after.rpy().iter()))
                {
                    assert!((a - b).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_toggle_twice() {
        let mut t = tuner(start_pose());
        let mut op = ScriptedOperator::default();
        let mode = t.mode();

        press(&mut t, &mut op, "cc");
        assert_eq!(t.mode(), mode);
        assert_eq!(t.current(), start_pose());
    }

    #[test]
    fn test_generic_keys_never_step() {
        let mut t = tuner(start_pose());
        let mut op = ScriptedOperator::answering(&["0.1", "0.2"]);

        for mode_keys in &["", "c"] {
            press(&mut t, &mut op, mode_keys);
            press(&mut t, &mut op, "cpmr");
            assert_eq!(t.current(), start_pose());
        }
    }

    #[test]
    fn test_reset() {
        let mut t = tuner(start_pose());
        let mut op = ScriptedOperator::default();

        press(&mut t, &mut op, "wwwsxcqqazzzz");
        assert_ne!(t.current(), t.initial());

        // Reset keeps running, it does not fall through into exit
        assert_eq!(t.handle_key('r', &mut op).unwrap(), Flow::Continue);
        assert_eq!(t.current(), start_pose());
        assert_eq!(t.initial(), start_pose());
    }

    #[test]
    fn test_reconfigure() {
        let mut t = tuner(Pose::default());
        let mut op = ScriptedOperator::answering(&["0.1", "0.2"]);

        press(&mut t, &mut op, "m");
        assert_eq!(op.asked, 2);
        assert_eq!(
            t.steps(),
            StepSizes {
                position_step: 0.1,
                rotation_step: 0.2
            }
        );

        // Reconfigure is generic, the pose must not move
        assert_eq!(t.current(), Pose::default());

        press(&mut t, &mut op, "w");
        assert!((t.current().roll - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_reconfigure_invalid() {
        let mut t = tuner(Pose::default());

        let mut op = ScriptedOperator::answering(&["fast", "0.2"]);
        press(&mut t, &mut op, "m");
        assert_eq!(op.asked, 1);
        assert_eq!(t.steps(), StepSizes::default());
        assert!(op.said.iter().any(|l| l.starts_with("Invalid input")));

        // A bad second value must not leave the first one applied
        let mut op = ScriptedOperator::answering(&["0.3", "-1"]);
        press(&mut t, &mut op, "m");
        assert_eq!(op.asked, 2);
        assert_eq!(t.steps(), StepSizes::default());
    }

    #[test]
    fn test_unknown_key() {
        let mut t = tuner(start_pose());
        let mut op = ScriptedOperator::default();

        press(&mut t, &mut op, "k");
        assert_eq!(t.current(), start_pose());
        assert_eq!(t.steps(), StepSizes::default());
        assert_eq!(t.mode(), EditMode::Rotation);
        assert_eq!(op.said, vec!["Received an unknown character".to_string()]);
    }

    #[test]
    fn test_print() {
        let mut t = tuner(start_pose());
        let mut op = ScriptedOperator::default();

        press(&mut t, &mut op, "p");
        assert_eq!(t.current(), start_pose());
        assert_eq!(op.said[0], "Printing the transform:");
        assert!(op.said.iter().any(|l| l == "base_link -> camera"));
        assert!(op.said.iter().any(|l| l == "  y: 3"));
    }

    #[test]
    fn test_exit() {
        let mut t = tuner(start_pose());
        let mut op = ScriptedOperator::default();

        assert_eq!(t.handle_key('e', &mut op).unwrap(), Flow::Exit);
        assert_eq!(t.current(), start_pose());
    }
}
