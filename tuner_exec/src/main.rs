//! Keyboard TF tuner executable entry point.
//!
//! # Architecture
//!
//! The execution consists of:
//!
//!     - Parse the startup pose and frame names from the command line
//!     - Initialise the session, logging, parameters, and the TF server
//!     - Switch the terminal to raw mode and start publishing the transform
//!     - Main loop:
//!         - Wait a short time for a key
//!         - Pass any key to the tuner, which updates the pose or runs a command
//!     - On exit, Ctrl+C, or a termination signal stop publishing and restore the terminal

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use comms_if::net::zmq;
use log::info;
use std::{env, path::Path, process};

// Internal
use tuner_lib::{
    args::{usage, StartupArgs},
    cmd::{Command, KEY_LAYOUT},
    params::TunerExecParams,
    publisher::Publisher,
    terminal::{
        install_panic_hook, install_signal_handler, next_key, Key, StdConsole, TerminalMode,
    },
    tf_server::TfServer,
    tuner::{Flow, Operator, Tuner},
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- ARGUMENTS ----

    // Checked before anything else so a bad invocation leaves no trace
    let args: Vec<String> = env::args().collect();
    let exec_name = args
        .first()
        .and_then(|a| Path::new(a).file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("tuner_exec");

    let startup = match StartupArgs::parse(args.get(1..).unwrap_or(&[])) {
        Ok(a) => a,
        Err(e) => {
            println!("{}", e);
            println!("{}", usage(exec_name));
            process::exit(1);
        }
    };

    color_eyre::install()?;
    install_panic_hook();
    let stop = install_signal_handler().wrap_err("Failed to install the signal handler")?;

    // ---- EARLY INITIALISATION ----

    let session = Session::new("tuner_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    info!("Keyboard TF Tuner\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: TunerExecParams = util::params::load_or_default("tuner_exec.toml")
        .wrap_err("Could not load tuner_exec params")?;
    params.validate().wrap_err("Invalid tuner_exec params")?;

    let publish_period = params.publish_period()?;
    let idle_period = params.idle_period()?;
    let steps = params.default_steps()?;

    info!("Exec parameters loaded");

    // ---- INITIALISE NETWORK ----

    let zmq_ctx = zmq::Context::new();

    let tf_server = TfServer::new(&zmq_ctx, &params).wrap_err("Failed to initialise TfServer")?;
    info!("TfServer initialised on {}", params.tf_endpoint);

    // ---- INITIALISE TUNER ----

    let mut tuner = Tuner::new(startup.pose, startup.frames, steps);
    let mut console = StdConsole::stdio();

    console.say(&format!("parent frame = {}", tuner.frames().parent));
    console.say(&format!("child frame = {}", tuner.frames().child));
    for line in tuner.initial().to_string().lines() {
        console.say(line);
    }
    console.say("");
    for line in KEY_LAYOUT {
        console.say(line);
    }

    console
        .mode()
        .enter_raw()
        .wrap_err("Failed to switch the terminal to raw mode")?;

    let mut publisher = Publisher::start(
        tuner.shared_pose(),
        tuner.frames().clone(),
        publish_period,
        Box::new(tf_server),
    )
    .wrap_err("Failed to start the publisher")?;

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut prompted = false;

    loop {
        // One prompt per wait, not one per poll
        if !prompted {
            console.prompt(tuner.mode().prompt())?;
            prompted = true;
        }

        let key = match next_key(&stop, idle_period)
            .wrap_err("Failed to read from the terminal")?
        {
            Some(k) => k,
            None => continue,
        };

        // New line, otherwise the output runs on from the prompt
        console.say("");

        let flow = match key {
            Key::Char(c) => tuner.handle_key(c, &mut console),
            Key::Interrupt => tuner.handle(Command::Exit, &mut console),
        }
        .wrap_err("Failed to handle command")?;

        prompted = false;

        if flow == Flow::Exit {
            break;
        }
    }

    // ---- SHUTDOWN ----

    publisher.stop();
    console
        .mode()
        .restore()
        .wrap_err("Failed to restore the terminal")?;

    info!("Published {} transforms", publisher.num_sent());

    Ok(())
}
