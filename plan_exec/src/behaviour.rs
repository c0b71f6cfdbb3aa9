//! # Lane decision
//!
//! Once the vehicle has finished its initial acceleration the planner asks a lane-decision
//! strategy which lane to drive in. The strategy sees the ego track and a short forecast of every
//! sensed vehicle and returns the manoeuvre to perform along with its target lane.
//!
//! A strategy implementing lane changes plugs in through [`LaneDecision`]. The only strategy
//! provided, [`KeepLane`], never leaves the current lane.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::BTreeMap;

use crate::track::{BehaviourState, VehicleTrack};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Forecast tracks of every sensed vehicle, keyed by vehicle id.
pub type Predictions = BTreeMap<u32, Vec<VehicleTrack>>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The manoeuvre chosen for the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub state: BehaviourState,
    pub target_lane: usize,
}

/// Strategy that always keeps the current lane.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepLane;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

pub trait LaneDecision {
    /// Choose the next manoeuvre.
    ///
    /// `current` is the decision in force, `num_lanes` bounds the lanes that may be targeted.
    fn decide(
        &mut self,
        ego: &VehicleTrack,
        current: Decision,
        predictions: &Predictions,
        num_lanes: usize,
    ) -> Decision;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LaneDecision for KeepLane {
    fn decide(
        &mut self,
        _ego: &VehicleTrack,
        current: Decision,
        _predictions: &Predictions,
        num_lanes: usize,
    ) -> Decision {
        Decision {
            state: BehaviourState::KeepLane,
            target_lane: current.target_lane.min(num_lanes.saturating_sub(1)),
        }
    }
}
