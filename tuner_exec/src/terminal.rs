//! # Terminal
//!
//! Switching the terminal between raw and line modes, reading single keys, and talking to the
//! operator.
//!
//! Raw mode disables output processing as well as input buffering and echo, so every line written
//! by this module is terminated with `\r\n`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    io::{self, BufRead, Write},
    panic,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use log::{debug, warn};

use crate::tuner::Operator;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Control over how the terminal delivers input.
pub trait TerminalMode {
    /// Capture the original settings and switch to unbuffered input without echo.
    fn enter_raw(&mut self) -> io::Result<()>;

    /// Temporarily return to canonical, line-buffered input.
    fn enter_line(&mut self) -> io::Result<()>;

    /// Reinstall the originally captured settings. Does nothing if they are already in place.
    fn restore(&mut self) -> io::Result<()>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The process' controlling terminal.
///
/// The original settings are restored when this is dropped.
#[derive(Debug, Default)]
pub struct CrosstermMode {
    raw: bool,
}

/// The operator's console: a terminal mode plus an input and output stream.
pub struct Console<M, R, W>
where
    M: TerminalMode,
    R: BufRead,
    W: Write,
{
    mode: M,
    input: R,
    output: W,
}

/// The console on the real terminal.
pub type StdConsole = Console<CrosstermMode, io::StdinLock<'static>, io::Stdout>;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A key read from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character
    Char(char),

    /// Ctrl+C, which raw mode delivers as a key instead of a signal, or a termination signal sent
    /// to the process
    Interrupt,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CrosstermMode {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TerminalMode for CrosstermMode {
    fn enter_raw(&mut self) -> io::Result<()> {
        // crossterm keeps the settings in place before the first raw switch and reinstalls them
        // on disable
        enable_raw_mode()?;
        self.raw = true;
        Ok(())
    }

    fn enter_line(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        self.raw = false;
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        if self.raw {
            self.enter_line()?;
            debug!("Terminal settings restored");
        }
        Ok(())
    }
}

impl Drop for CrosstermMode {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!("Could not restore the terminal settings: {}", e);
        }
    }
}

impl StdConsole {
    /// Open the console on stdin and stdout.
    pub fn stdio() -> Self {
        Console::new(CrosstermMode::new(), io::stdin().lock(), io::stdout())
    }
}

impl<M, R, W> Console<M, R, W>
where
    M: TerminalMode,
    R: BufRead,
    W: Write,
{
    pub fn new(mode: M, input: R, output: W) -> Self {
        Self {
            mode,
            input,
            output,
        }
    }

    pub fn mode(&mut self) -> &mut M {
        &mut self.mode
    }

    /// Write text without a line ending, for prompts.
    pub fn prompt(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        write!(self.output, "{}\r\n", line)?;
        self.output.flush()
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        self.prompt(prompt)?;

        // Invalid UTF-8 is kept as replacement characters and rejected by the caller's parse
        let mut line = Vec::new();
        self.input.read_until(b'\n', &mut line)?;

        Ok(String::from_utf8_lossy(&line)
            .trim_end_matches(&['\r', '\n'][..])
            .to_string())
    }
}

impl<M, R, W> Operator for Console<M, R, W>
where
    M: TerminalMode,
    R: BufRead,
    W: Write,
{
    fn say(&mut self, line: &str) {
        if let Err(e) = self.write_line(line) {
            warn!("Could not write to the console: {}", e);
        }
    }

    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        self.mode.enter_line()?;

        let line = self.read_line(prompt);

        // Always go back to raw mode, even if the read failed
        self.mode.enter_raw()?;

        line
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Wait up to `timeout` for a key press.
///
/// Returns `None` if no key was pressed in time, or the event was not a usable key (releases,
/// resizes, arrows, and so on).
pub fn poll_key(timeout: Duration) -> io::Result<Option<Key>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }

    Ok(match event::read()? {
        Event::Key(key) => key_from_event(key),
        _ => None,
    })
}

/// Like [`poll_key`], but reports [`Key::Interrupt`] without waiting once `stop` is set.
pub fn next_key(stop: &AtomicBool, timeout: Duration) -> io::Result<Option<Key>> {
    if stop.load(Ordering::SeqCst) {
        return Ok(Some(Key::Interrupt));
    }

    poll_key(timeout)
}

/// Install a handler for `SIGINT`, `SIGTERM` and `SIGHUP`.
///
/// The returned flag is set when one arrives, so the input loop can shut down normally and
/// restore the terminal. Can only be called once per process.
pub fn install_signal_handler() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_clone = stop.clone();

    ctrlc::set_handler(move || {
        stop_clone.store(true, Ordering::SeqCst);
    })?;

    Ok(stop)
}

/// Chain a panic hook which restores the terminal before the existing hook reports the panic.
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        original_hook(panic_info);
    }));
}

fn key_from_event(key: KeyEvent) -> Option<Key> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Key::Interrupt),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => Some(Key::Char(c)),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        pose::{FrameLink, Pose, StepSizes},
        tuner::{Flow, Tuner},
    };
    use std::io::Cursor;

    /// Terminal mode which records every switch.
    #[derive(Default)]
    struct FakeMode {
        calls: Vec<&'static str>,
    }

    impl TerminalMode for FakeMode {
        fn enter_raw(&mut self) -> io::Result<()> {
            self.calls.push("raw");
            Ok(())
        }

        fn enter_line(&mut self) -> io::Result<()> {
            self.calls.push("line");
            Ok(())
        }

        fn restore(&mut self) -> io::Result<()> {
            self.calls.push("restore");
            Ok(())
        }
    }

    #[test]
    fn test_ask_switches_modes() {
        let mut console = Console::new(
            FakeMode::default(),
            Cursor::new(b"0.1\n0.2\r\n".to_vec()),
            Vec::new(),
        );

        assert_eq!(console.ask("first: ").unwrap(), "0.1");
        assert_eq!(console.ask("second: ").unwrap(), "0.2");
        assert_eq!(console.mode().calls, vec!["line", "raw", "line", "raw"]);

        // Input exhausted reads as an empty line
        assert_eq!(console.ask("third: ").unwrap(), "");

        assert_eq!(
            String::from_utf8(console.output).unwrap(),
            "first: second: third: "
        );
    }

    #[test]
    fn test_invalid_utf8_step_is_rejected() {
        let mut tuner = Tuner::new(
            Pose::default(),
            FrameLink {
                parent: "base_link".into(),
                child: "camera".into(),
            },
            StepSizes::default(),
        );
        let mut console = Console::new(
            FakeMode::default(),
            Cursor::new(b"0.\xe91\n0.2\n".to_vec()),
            Vec::new(),
        );

        assert_eq!(tuner.handle_key('m', &mut console).unwrap(), Flow::Continue);
        assert_eq!(tuner.steps(), StepSizes::default());
        assert_eq!(console.mode().calls, vec!["line", "raw"]);

        let output = String::from_utf8(console.output).unwrap();
        assert!(output.contains("Invalid input"));
    }

    #[test]
    fn test_say_uses_crlf() {
        let mut console = Console::new(FakeMode::default(), Cursor::new(Vec::new()), Vec::new());

        console.say("Exiting");
        console.say("");

        assert_eq!(String::from_utf8(console.output).unwrap(), "Exiting\r\n\r\n");
        assert!(console.mode.calls.is_empty());
    }

    #[test]
    fn test_next_key_after_stop() {
        let stop = AtomicBool::new(true);

        // Returns straight away, without touching the terminal
        assert_eq!(
            next_key(&stop, Duration::from_secs(10)).unwrap(),
            Some(Key::Interrupt)
        );
    }

    #[test]
    fn test_key_from_event() {
        let press = |code, modifiers| KeyEvent::new(code, modifiers);

        assert_eq!(
            key_from_event(press(KeyCode::Char('w'), KeyModifiers::NONE)),
            Some(Key::Char('w'))
        );
        assert_eq!(
            key_from_event(press(KeyCode::Char('W'), KeyModifiers::SHIFT)),
            Some(Key::Char('W'))
        );
        assert_eq!(
            key_from_event(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Key::Interrupt)
        );
        assert_eq!(key_from_event(press(KeyCode::Up, KeyModifiers::NONE)), None);

        let mut release = press(KeyCode::Char('w'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(key_from_event(release), None);
    }
}
