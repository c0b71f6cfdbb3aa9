//! # Planner Executable
//!
//! This executable drives a vehicle along a simulated highway. Every telemetry frame received from
//! the simulator is answered with the trajectory the vehicle must follow next.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::{debug, info, trace, warn};
use std::time::Instant;

// Internal
use comms_if::{net::NetParams, sim::{Control, SimEvent}};
use plan_lib::{
    cycle::{CycleInput, Planner, PlannerInit},
    params::PlanExecParams,
    plan_server::PlanServer,
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    // ---- EARLY INITIALISATION ----

    let session = Session::new("plan_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Info, LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Highway Planner Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let exec_params: PlanExecParams = util::params::load("plan_exec.toml")
        .wrap_err("Could not load the executable parameters")?;
    let net_params: NetParams = util::params::load("net.toml")
        .wrap_err("Could not load the network parameters")?;

    info!("Parameters loaded");

    // ---- MODULE INITIALISATION ----

    let mut planner = Planner::default();
    planner
        .init(
            PlannerInit {
                params_file: "planner.toml".into(),
                map_file: exec_params.map_file.clone(),
                archive: exec_params.archive_reports,
            },
            &session,
        )
        .wrap_err("Failed to initialise the planner")?;

    info!("Planner initialised");

    let cycle_period_s = planner.params().time_step_s;

    // ---- SERVER INITIALISATION ----

    let mut server = PlanServer::new(&net_params)
        .wrap_err("Failed to initialise the server")?;

    info!("Server listening on {}", net_params.planner_endpoint);

    // ---- MAIN LOOP ----

    info!("Initialisation complete, waiting for the simulator");

    let mut sim_connected = false;

    loop {
        let event = server.get_event();

        match (sim_connected, server.peer_connected()) {
            (false, true) => {
                info!("Simulator connected");
                sim_connected = true;
            }
            (true, false) => {
                warn!("Simulator disconnected");
                sim_connected = false;
            }
            _ => (),
        }

        let event = match event {
            Some(e) => e,
            None => continue,
        };

        let cycle_start = Instant::now();

        let telemetry = match event {
            Ok(SimEvent::Telemetry(tm)) => tm,
            Ok(SimEvent::Manual) => {
                trace!("Simulator in manual mode");
                server.send_manual().wrap_err("Failed to reply to the simulator")?;
                continue;
            }
            Ok(SimEvent::Other(name)) => {
                debug!("Ignoring \"{}\" event", name);
                server.send_manual().wrap_err("Failed to reply to the simulator")?;
                continue;
            }
            Err(e) => {
                warn!("Could not decode the simulator frame: {}", e);
                server.send_manual().wrap_err("Failed to reply to the simulator")?;
                continue;
            }
        };

        let input = match CycleInput::from_telemetry(&telemetry) {
            Ok(i) => i,
            Err(e) => {
                warn!("{}, skipping the cycle", e);
                server.send_manual().wrap_err("Failed to reply to the simulator")?;
                continue;
            }
        };

        let (trajectory, _report) = match planner.proc(&input) {
            Ok(o) => o,
            Err(e) => {
                warn!("Planning failed: {}", e);
                server.send_manual().wrap_err("Failed to reply to the simulator")?;
                continue;
            }
        };

        let control = Control::from_points(trajectory.iter().map(|p| (p.x, p.y)));

        if let Err(e) = server.send_control(&control) {
            warn!("Could not send the trajectory: {}", e);
        }

        let cycle_time_s = cycle_start.elapsed().as_secs_f64();
        if cycle_time_s > cycle_period_s {
            warn!(
                "Cycle overran by {:.6} s ({:.6} s)",
                cycle_time_s - cycle_period_s,
                cycle_time_s
            );
        }
    }
}
