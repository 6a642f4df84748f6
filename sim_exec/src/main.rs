//! Path following simulator executable entry point.
//!
//! # Architecture
//!
//! The executable runs headless:
//!
//!     - Initialise the session and logging
//!     - Load the parameters and build the simulation
//!     - Main loop, once per cycle period:
//!         - Follower update (closest point, controllers, accel limit)
//!         - Robot integration
//!         - Telemetry archiving
//!     - Save a run summary into the session directory
//!
//! An optional single argument gives the parameter file to use, relative to
//! the `params` directory. Without it `sim_exec.toml` is used.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use sim_lib::{params::SimExecParams, sim::Simulation};
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Parameter file used when none is given on the command line.
const DEFAULT_PARAMS_FILE: &str = "sim_exec.toml";

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("sim_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Path Following Simulator\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    let params_file = match args.len() {
        1 => DEFAULT_PARAMS_FILE,
        2 => args[1].as_str(),
        n => {
            return Err(eyre!(
                "Expected either zero or one argument, found {}",
                n - 1
            ))
        }
    };

    let params: SimExecParams = util::params::load(params_file)
        .wrap_err_with(|| format!("Could not load parameters from {:?}", params_file))?;

    info!("Exec parameters loaded from {:?}", params_file);

    if !(params.cycle_period_s.is_finite() && params.cycle_period_s > 0.0) {
        return Err(eyre!(
            "The cycle period must be positive, got {}",
            params.cycle_period_s
        ));
    }
    if (params.cycle_period_s - params.robot.period_s).abs() > 1e-9 {
        warn!(
            "Cycle period ({} s) differs from the robot integration period ({} s), \
            the simulation will not run in real time",
            params.cycle_period_s, params.robot.period_s
        );
    }

    // ---- INITIALISE SIMULATION ----

    let mut sim = Simulation::new(&params).wrap_err("Failed to initialise the simulation")?;
    sim.archive_to(&session)
        .map_err(|e| eyre!("Failed to initialise the telemetry archive: {}", e))?;

    info!("Simulation initialised\n");

    // ---- MAIN LOOP ----

    let cycle_frequency_hz = 1.0 / params.cycle_period_s;
    let mut num_cycles: u64 = 0;

    info!("Beginning main loop\n");

    while num_cycles < params.num_cycles {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- SIMULATION ----

        let record = sim.step_at(cycle_start_instant);

        // ---- WRITE ARCHIVES ----

        if let Err(e) = sim.write() {
            warn!("Could not write telemetry: {}", e);
        }

        // Status output once per second
        if num_cycles % (cycle_frequency_hz.round().max(1.0) as u64) == 0 {
            info!(
                "t = {:.03}, pos = ({:.03}, {:.03}) m, heading = {:.01} deg, speed = {:.03} m/s",
                record.t, record.pos_x_m, record.pos_y_m, record.heading_deg, record.speed_ms
            );
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(params.cycle_period_s).checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - params.cycle_period_s
            ),
        }

        // Increment cycle counter
        num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    let summary = sim.summary();
    info!("Run summary: {:#?}", summary);

    session
        .save_json("summary.json", &summary)
        .wrap_err("Failed to save the run summary")?;

    info!("End of execution");

    Ok(())
}
