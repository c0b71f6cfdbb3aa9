//! # Planner Parameters
//!
//! Tunable constants of the planning pipeline. Every value has a default, so a parameter file
//! only needs to list the values it changes.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the planning cycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlannerParams {
    /// Length of the closed track, arc-length wraps back to 0 here.
    pub max_s_m: f64,

    /// Width of a single lane.
    pub lane_width_m: f64,

    /// Lane the vehicle is asked to drive in at start-up (0 is the leftmost lane).
    pub start_lane: usize,

    /// Time between two consecutive trajectory points.
    pub time_step_s: f64,

    /// Number of points in every output trajectory.
    pub horizon_len: usize,

    /// Speed the vehicle accelerates to when nothing is in the way.
    pub cruise_speed_mph: f64,

    /// Reference speed increase per planning cycle.
    pub speed_increment_mph: f64,

    /// Reference speed decrease per planning cycle when following.
    pub speed_decrement_mph: f64,

    /// Conversion factor from m/s to the reference speed unit (mph).
    pub mph_per_ms: f64,

    /// A vehicle ahead in the same lane closer than this forces a slow down.
    pub safety_gap_m: f64,

    /// Arc-length offsets of the far-field anchors from the planning position.
    pub anchor_offsets_m: [f64; 3],

    /// Distance along the local x axis used to space the resampled points.
    pub lookahead_m: f64,

    /// Distance behind the vehicle of the synthetic anchor used when there is no path history.
    pub synthetic_anchor_step_m: f64,

    /// Number of forecast points produced for each vehicle.
    pub forecast_steps: usize,

    /// Time between two forecast points.
    pub forecast_step_s: f64,
}

/// Parameters for the planner executable
#[derive(Debug, Clone, Deserialize)]
pub struct PlanExecParams {
    /// Path to the centerline waypoint table, relative to the software root.
    pub map_file: String,

    /// If true a status report is archived every cycle.
    #[serde(default)]
    pub archive_reports: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for PlannerParams {
    fn default() -> Self {
        Self {
            max_s_m: 6945.554,
            lane_width_m: 4.0,
            start_lane: 1,
            time_step_s: 0.02,
            horizon_len: 50,
            cruise_speed_mph: 49.5,
            speed_increment_mph: 0.224,
            speed_decrement_mph: 0.224,
            mph_per_ms: 2.24,
            safety_gap_m: 30.0,
            anchor_offsets_m: [30.0, 60.0, 90.0],
            lookahead_m: 30.0,
            synthetic_anchor_step_m: 1.0,
            forecast_steps: 2,
            forecast_step_s: 1.0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_params_file() {
        let p: PlannerParams =
            util::params::parse("cruise_speed_mph = 45.0\nanchor_offsets_m = [35.0, 70.0, 105.0]")
                .unwrap();

        assert_eq!(p.cruise_speed_mph, 45.0);
        assert_eq!(p.anchor_offsets_m, [35.0, 70.0, 105.0]);
        assert_eq!(p.horizon_len, PlannerParams::default().horizon_len);
    }

    #[test]
    fn test_shipped_params_files() {
        let p: PlannerParams =
            util::params::parse(include_str!("../../params/planner.toml")).unwrap();
        assert_eq!(p, PlannerParams::default());

        let e: PlanExecParams =
            util::params::parse(include_str!("../../params/plan_exec.toml")).unwrap();
        assert!(e.archive_reports);

        let n: comms_if::net::NetParams =
            util::params::parse(include_str!("../../params/net.toml")).unwrap();
        assert_eq!(n.planner_endpoint, "tcp://*:4567");
    }
}
