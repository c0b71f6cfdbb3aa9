//! # Vehicle tracks
//!
//! Kinematic state of the ego vehicle and of every vehicle reported by sensor fusion, expressed
//! along the road. Tracks are rebuilt every tick from telemetry.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

use comms_if::sim::{SensedVehicle, Telemetry};
use util::maths::deg_to_rad;

use crate::road::lane_of;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Metres per second in one mile per hour.
pub const MS_PER_MPH: f64 = 0.44704;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Pose of the ego vehicle at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f64,
    pub y: f64,

    /// Heading in radians, anticlockwise from the world x axis
    pub heading_rad: f64,

    pub s: f64,
    pub d: f64,

    /// Speed in m/s
    pub speed_ms: f64,
}

/// One vehicle's state along the road.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VehicleTrack {
    /// Lane index, 0 is the leftmost lane
    pub lane: usize,

    /// Arc-length position
    pub s: f64,

    /// Speed in m/s
    pub speed: f64,

    /// Acceleration in m/s^2, zero for sensed vehicles
    pub accel: f64,

    /// Manoeuvre the vehicle is performing
    pub state: BehaviourState,

    /// Arc-length the vehicle is driving towards
    pub goal_s: f64,

    /// Speed the vehicle is trying to reach in m/s
    pub target_speed: f64,
}

/// A sensed vehicle with its track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedVehicle {
    pub id: u32,
    pub track: VehicleTrack,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Manoeuvres of the lane-change state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BehaviourState {
    KeepLane,
    ConstantSpeed,
    PrepareLaneChangeLeft,
    PrepareLaneChangeRight,
    LaneChangeLeft,
    LaneChangeRight,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose {
    /// Build the ego pose from telemetry, converting the heading to radians and speed to m/s.
    pub fn from_telemetry(tm: &Telemetry) -> Self {
        Self {
            x: tm.x,
            y: tm.y,
            heading_rad: deg_to_rad(tm.yaw),
            s: tm.s,
            d: tm.d,
            speed_ms: tm.speed * MS_PER_MPH,
        }
    }
}

impl VehicleTrack {
    /// A track with no acceleration in the given state.
    pub fn new(lane: usize, s: f64, speed: f64, state: BehaviourState) -> Self {
        Self {
            lane,
            s,
            speed,
            accel: 0.0,
            state,
            goal_s: s,
            target_speed: speed,
        }
    }

    /// Arc-length reached after `t` seconds.
    pub fn position_at(&self, t: f64) -> f64 {
        self.s + self.speed * t + 0.5 * self.accel * t * t
    }

    /// Forecast the track over `steps` points spaced `step_s` seconds apart, starting now.
    ///
    /// The vehicle keeps its lane and acceleration.
    pub fn forecast(&self, steps: usize, step_s: f64) -> Vec<VehicleTrack> {
        (0..steps)
            .map(|i| {
                let t = i as f64 * step_s;
                VehicleTrack {
                    s: self.position_at(t),
                    speed: self.speed + self.accel * t,
                    ..*self
                }
            })
            .collect()
    }
}

impl TrackedVehicle {
    /// Build the track of a sensed vehicle, assumed to be cruising at constant speed.
    pub fn from_sensed(vehicle: &SensedVehicle, lane_width: f64) -> Self {
        Self {
            id: vehicle.id,
            track: VehicleTrack::new(
                lane_of(vehicle.d, lane_width),
                vehicle.s,
                vehicle.speed(),
                BehaviourState::ConstantSpeed,
            ),
        }
    }
}

impl BehaviourState {
    /// Short label used in logs and archives.
    pub fn label(&self) -> &'static str {
        match self {
            BehaviourState::KeepLane => "KL",
            BehaviourState::ConstantSpeed => "CS",
            BehaviourState::PrepareLaneChangeLeft => "PLCL",
            BehaviourState::PrepareLaneChangeRight => "PLCR",
            BehaviourState::LaneChangeLeft => "LCL",
            BehaviourState::LaneChangeRight => "LCR",
        }
    }
}

impl Default for BehaviourState {
    fn default() -> Self {
        BehaviourState::KeepLane
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
