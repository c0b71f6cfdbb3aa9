//! # Following controller
//!
//! Adapts the reference speed so the vehicle never closes within the safety gap of a slower
//! vehicle ahead in its lane. The reference speed changes by at most one increment per tick, which
//! bounds the acceleration of the trajectories built from it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, trace};
use serde::Serialize;

use util::maths::{clamp, rem_euclid};

use crate::{params::PlannerParams, track::TrackedVehicle};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Input to a reference speed update.
#[derive(Debug, Clone, Copy)]
pub struct FollowInput<'a> {
    /// Arc-length the new trajectory segment starts from
    pub ego_s: f64,

    /// Lane the vehicle is driving in
    pub ego_lane: usize,

    /// Reference speed in mph
    pub ref_speed: f64,

    /// True once the initial acceleration to cruise speed has completed
    pub ramp_complete: bool,

    /// Number of points of the previous trajectory still to be driven
    pub prev_size: usize,

    pub vehicles: &'a [TrackedVehicle],
}

/// Result of a reference speed update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedUpdate {
    pub ref_speed: f64,
    pub ramp_complete: bool,
    pub action: SpeedAction,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Action taken on the reference speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SpeedAction {
    /// A vehicle is too close ahead, slow down
    Decelerate { lead_id: u32, gap_m: f64 },

    /// Below cruise speed with nothing in the way
    Accelerate,

    /// At cruise speed with nothing in the way
    Maintain,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SpeedAction {
    pub fn label(&self) -> &'static str {
        match self {
            SpeedAction::Decelerate { .. } => "decelerate",
            SpeedAction::Accelerate => "accelerate",
            SpeedAction::Maintain => "maintain",
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Find the first vehicle in the ego lane that will be closer than the safety gap ahead of the
/// ego vehicle once the previous trajectory has been driven.
///
/// Each vehicle is projected forward at constant speed over the time covered by the previous
/// trajectory. Returns the vehicle id and its projected gap.
pub fn find_lead(input: &FollowInput, params: &PlannerParams) -> Option<(u32, f64)> {
    let horizon_s = input.prev_size as f64 * params.time_step_s;

    input
        .vehicles
        .iter()
        .filter(|v| v.track.lane == input.ego_lane)
        .find_map(|v| {
            let projected_s = v.track.s + horizon_s * v.track.speed;
            let gap = rem_euclid(projected_s - input.ego_s, params.max_s_m);

            trace!("Vehicle {} in ego lane, projected gap {:.2} m", v.id, gap);

            if gap > 0.0 && gap < params.safety_gap_m {
                Some((v.id, gap))
            } else {
                None
            }
        })
}

/// Compute the reference speed for this tick.
pub fn update_ref_speed(input: &FollowInput, params: &PlannerParams) -> SpeedUpdate {
    if let Some((lead_id, gap_m)) = find_lead(input, params) {
        return SpeedUpdate {
            ref_speed: clamp(
                input.ref_speed - params.speed_decrement_mph,
                0.0,
                params.cruise_speed_mph,
            ),
            ramp_complete: input.ramp_complete,
            action: SpeedAction::Decelerate { lead_id, gap_m },
        };
    }

    let (ref_speed, action) = if input.ref_speed < params.cruise_speed_mph {
        (
            clamp(
                input.ref_speed + params.speed_increment_mph,
                0.0,
                params.cruise_speed_mph,
            ),
            SpeedAction::Accelerate,
        )
    } else {
        (input.ref_speed, SpeedAction::Maintain)
    };

    let ramp_complete = input.ramp_complete || ref_speed >= params.cruise_speed_mph;

    if ramp_complete && !input.ramp_complete {
        info!("Initial acceleration complete at {:.2} mph", ref_speed);
    }

    SpeedUpdate {
        ref_speed,
        ramp_complete,
        action,
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::track::{BehaviourState, VehicleTrack};

    fn vehicle(id: u32, lane: usize, s: f64, speed: f64) -> TrackedVehicle {
        TrackedVehicle {
            id,
            track: VehicleTrack::new(lane, s, speed, BehaviourState::ConstantSpeed),
        }
    }

    fn input(ref_speed: f64, vehicles: &[TrackedVehicle]) -> FollowInput {
        FollowInput {
            ego_s: 500.0,
            ego_lane: 1,
            ref_speed,
            ramp_complete: false,
            prev_size: 0,
            vehicles,
        }
    }

    #[test]
    fn test_convergence() {
        let params = PlannerParams::default();
        let ticks = (params.cruise_speed_mph / params.speed_increment_mph).ceil() as usize;
        assert_eq!(ticks, 221);

        let mut update = SpeedUpdate {
            ref_speed: 0.0,
            ramp_complete: false,
            action: SpeedAction::Maintain,
        };

        for tick in 0..ticks {
            let mut i = input(update.ref_speed, &[]);
            i.ramp_complete = update.ramp_complete;
            update = update_ref_speed(&i, &params);

            if tick < ticks - 1 {
                assert!(!update.ramp_complete);
                assert_eq!(update.action, SpeedAction::Accelerate);
            }
        }

        assert_eq!(update.ref_speed, params.cruise_speed_mph);
        assert!(update.ramp_complete);

        let i = FollowInput {
            ramp_complete: true,
            ..input(update.ref_speed, &[])
        };
        let next = update_ref_speed(&i, &params);
        assert_eq!(next.action, SpeedAction::Maintain);
        assert_eq!(next.ref_speed, params.cruise_speed_mph);
    }

    #[test]
    fn test_following_trigger() {
        let params = PlannerParams::default();

        let close = [vehicle(3, 1, 520.0, 0.0)];
        let update = update_ref_speed(&input(40.0, &close), &params);
        assert!(update.ref_speed < 40.0);
        assert_eq!(
            update.action,
            SpeedAction::Decelerate {
                lead_id: 3,
                gap_m: 20.0
            }
        );

        let far = [vehicle(3, 1, 600.0, 0.0)];
        let update = update_ref_speed(&input(40.0, &far), &params);
        assert!(update.ref_speed > 40.0);

        // Same gap but in another lane, or behind the vehicle
        let other = [vehicle(3, 0, 520.0, 0.0), vehicle(4, 1, 490.0, 0.0)];
        let update = update_ref_speed(&input(40.0, &other), &params);
        assert_eq!(update.action, SpeedAction::Accelerate);
    }

    #[test]
    fn test_projection() {
        let params = PlannerParams::default();

        // 50 points left at 0.02 s at 10 m/s moves the vehicle 10 m further
        let vehicles = [vehicle(9, 1, 515.0, 10.0)];
        let mut i = input(40.0, &vehicles);
        assert!(find_lead(&i, &params).is_some());

        i.prev_size = 50;
        let (_, gap) = find_lead(&i, &params).unwrap();
        assert!((gap - 25.0).abs() < 1e-9);

        i.prev_size = 100;
        assert!(find_lead(&i, &params).is_none());
    }

    #[test]
    fn test_first_vehicle_considered() {
        let params = PlannerParams::default();

        // Only the first vehicle in the list is close
        let vehicles = [vehicle(0, 1, 510.0, 0.0), vehicle(1, 2, 510.0, 0.0)];
        let update = update_ref_speed(&input(10.0, &vehicles), &params);
        assert!(matches!(update.action, SpeedAction::Decelerate { lead_id: 0, .. }));
    }

    #[test]
    fn test_gap_across_track_end() {
        let params = PlannerParams::default();

        let vehicles = [vehicle(2, 1, 10.0, 0.0)];
        let i = FollowInput {
            ego_s: params.max_s_m - 5.0,
            ..input(40.0, &vehicles)
        };

        let (_, gap) = find_lead(&i, &params).unwrap();
        assert!((gap - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_decrement_clamped() {
        let params = PlannerParams::default();

        let vehicles = [vehicle(1, 1, 505.0, 0.0)];
        let update = update_ref_speed(&input(0.1, &vehicles), &params);
        assert_eq!(update.ref_speed, 0.0);

        let update = update_ref_speed(&input(0.0, &vehicles), &params);
        assert_eq!(update.ref_speed, 0.0);
    }
}
