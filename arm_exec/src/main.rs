//! Main arm executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging, parameters and modules
//!     - Main loop:
//!         - Telecommand processing and handling
//!         - Arm control processing
//!         - Safe mode handling
//!         - Simulated arm step
//!         - Archiving
//!         - Cycle management
//!
//! Telecommands come either from a script, if a path is given as the only
//! argument, or from lines typed on standard input. Both sources post into a
//! single [`CmdSlot`], and the main loop executes one command per cycle.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use arm_lib::{
    arm_ctrl::{self, ArmCtrl},
    cmd_slot::CmdSlot,
    data_store::{DataStore, SafeModeCause},
    params::ArmExecParams,
    sim::{SimActuator, SimArm, SimSensor},
    stdin_client::StdinClient,
};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    archive::Archiver,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Arm Executable\n");
    info!(
        "Software root: {:?}",
        host::get_arm_sw_root().wrap_err("Failed to get the software root")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let arm_ctrl_params: arm_ctrl::Params =
        util::params::load("arm_ctrl.toml").wrap_err("Could not load ArmCtrl params")?;
    let exec_params: ArmExecParams =
        util::params::load("arm_exec.toml").wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    save_params_snapshot(&session, &arm_ctrl_params, &exec_params)
        .wrap_err("Failed to save the parameter snapshot")?;

    let cycle_period_s = arm_ctrl_params.control_period_s;

    // ---- INITIALISE TC SOURCE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let slot = CmdSlot::new();

    let mut tc_source = match args.len() {
        // If we have a single argument use it as the script path
        2 => {
            info!("Loading script from \"{}\"", &args[1]);

            let si = ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} TCs\n",
                si.get_duration(),
                si.get_num_tcs()
            );

            TcSource::Script(si)
        }
        // If no arguments read commands from the terminal
        1 => {
            info!("No script provided, commands will be read from stdin\n");

            let client =
                StdinClient::start(slot.clone()).wrap_err("Failed to start the StdinClient")?;

            TcSource::Stdin(client)
        }
        n => return Err(eyre!("Expected either zero or one argument, found {}", n - 1)),
    };

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    let geometry = arm_ctrl_params
        .geometry()
        .wrap_err("Invalid arm geometry")?;
    let sim_arm = SimArm::new(&geometry, exec_params.sim.clone())
        .wrap_err("Failed to initialise the simulated arm")?
        .into_shared();
    info!("SimArm init complete");

    let mut arm_ctrl = ArmCtrl::new(
        arm_ctrl_params,
        SimSensor::new(sim_arm.clone()),
        SimActuator::new(sim_arm.clone()),
    )
    .wrap_err("Failed to initialise ArmCtrl")?;
    info!("ArmCtrl init complete");

    let mut archiver = if exec_params.archive_enabled {
        Some(Archiver::from_path(&session, "arm_ctrl.csv").wrap_err("Failed to create archive")?)
    } else {
        None
    };

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start();

        // ---- TELECOMMAND PROCESSING ----

        let source_closed = match tc_source {
            TcSource::Stdin(ref client) => !client.is_open(),

            TcSource::Script(ref mut si) => match si.get_pending_tcs() {
                PendingTcs::None => false,
                PendingTcs::Some(tc_vec) => {
                    for tc in tc_vec {
                        slot.post(tc);
                    }
                    false
                }
                PendingTcs::EndOfScript => true,
            },
        };

        // Commands due together are spread over consecutive cycles so that a
        // stop always reaches ArmCtrl before any goal posted after it
        if let Some(tc) = slot.take() {
            tc_processor::exec(&mut ds, &tc);
        } else if source_closed {
            info!("Command input finished, stopping");
            break;
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        match arm_ctrl.proc(&ds.arm_ctrl_input) {
            Ok((o, r)) => {
                ds.arm_ctrl_output = o;
                ds.arm_ctrl_status_rpt = r;
            }
            Err(e) => {
                error!("Error during ArmCtrl processing: {}", e);
                ds.make_safe(SafeModeCause::ArmCtrlFault);
            }
        };

        // ---- SAFE MODE ----

        if ds.arm_ctrl_make_safe {
            match arm_ctrl.make_safe() {
                Ok(()) => ds.arm_ctrl_output = Some(arm_ctrl::ArmVoltages::zero()),
                Err(e) => error!("Could not make ArmCtrl safe: {}", e),
            }
            ds.arm_ctrl_make_safe = false;
        }

        // ---- SIMULATION ----

        sim_arm
            .borrow_mut()
            .step(cycle_period_s)
            .wrap_err("Simulated arm step failed")?;

        // ---- WRITE ARCHIVES ----

        if let Some(ref mut a) = archiver {
            let record = ds.cycle_record(sim_arm.borrow().state());
            if let Err(e) = a.serialise(record) {
                warn!("Could not archive cycle {}: {}", ds.num_cycles, e);
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(cycle_period_s).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period_s
                );
                ds.num_consec_cycle_overruns += 1;

                let limit = exec_params.max_consec_cycle_overruns;
                if limit > 0 && ds.num_consec_cycle_overruns > limit && !ds.safe {
                    error!("More than {} consecutive cycle overruns", limit);
                    ds.make_safe(SafeModeCause::ArmCtrlFault);
                }
            }
        }

        ds.cycle_end();
    }

    // ---- SHUTDOWN ----

    arm_ctrl
        .make_safe()
        .wrap_err("Failed to make ArmCtrl safe on shutdown")?;

    info!("End of execution after {} cycles", ds.num_cycles);

    Ok(())
}

/// Write the parameters this session was run with into the session root.
fn save_params_snapshot(
    session: &Session,
    arm_ctrl_params: &arm_ctrl::Params,
    exec_params: &ArmExecParams,
) -> Result<(), Report> {
    #[derive(Serialize)]
    struct Snapshot<'a> {
        arm_ctrl: &'a arm_ctrl::Params,
        arm_exec: &'a ArmExecParams,
    }

    let mut path = session.session_root.clone();
    path.push("params.json");

    let json = serde_json::to_string_pretty(&Snapshot {
        arm_ctrl: arm_ctrl_params,
        arm_exec: exec_params,
    })?;
    std::fs::write(&path, json).wrap_err_with(|| format!("Could not write {:?}", path))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for the telecommands incoming to the exec.
enum TcSource {
    Stdin(StdinClient),
    Script(ScriptInterpreter),
}
