//! # Planner library.
//!
//! This library holds the planning pipeline of the planner executable, so that the pipeline can be
//! tested and benchmarked without a simulator connection.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Lane-decision strategies - choose the lane the vehicle should drive in
pub mod behaviour;

/// Planning cycle - sequences the pipeline and keeps the state between ticks
pub mod cycle;

/// Following controller - keeps a safe gap to the vehicle ahead
pub mod follow;

/// Planner parameters
pub mod params;

/// Planner server - receives telemetry from and sends trajectories to the simulator
pub mod plan_server;

/// Road model - centerline table, road to world conversion and lanes
pub mod road;

/// Vehicle tracks - kinematic state of the vehicles along the road
pub mod track;

/// Trajectory synthesizer - builds the trajectory sent to the simulator
pub mod traj_synth;
