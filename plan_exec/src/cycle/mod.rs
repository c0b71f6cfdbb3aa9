//! # Planning cycle
//!
//! Sequences one planning tick:
//!
//! 1. Classify the lane of the ego vehicle and of every sensed vehicle.
//! 2. Once the initial acceleration is over, ask the lane-decision strategy for the target lane.
//! 3. Update the reference speed with the following controller.
//! 4. Synthesize the trajectory towards the target lane at the reference speed.
//!
//! The only state kept between ticks is the [`ReferenceState`], which is passed into and returned
//! from [`plan_cycle`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod state;

pub use state::{Planner, PlannerInit, PlannerInitError};

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, trace, warn};
use nalgebra::Point2;
use serde::Serialize;

use comms_if::sim::{SensedVehicle, Telemetry};

use crate::{
    behaviour::{Decision, LaneDecision, Predictions},
    follow::{update_ref_speed, FollowInput, SpeedAction},
    params::PlannerParams,
    road::{lane_of, CenterlineTable, NUM_LANES},
    track::{BehaviourState, Pose, TrackedVehicle, VehicleTrack, MS_PER_MPH},
    traj_synth::{synthesize, SynthInput},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// State carried from one tick to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceState {
    /// Number of ticks planned so far
    pub cycle: u64,

    /// Lane the trajectory is built towards
    pub lane: usize,

    /// Reference speed in mph
    pub ref_speed_mph: f64,

    /// True once the vehicle first reached cruise speed
    pub ramp_complete: bool,

    /// Manoeuvre chosen by the lane-decision strategy
    pub behaviour: BehaviourState,
}

/// Validated input to a planning tick.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleInput {
    pub pose: Pose,

    /// Points of the previous trajectory the vehicle has not driven yet
    pub prev_path: Vec<Point2<f64>>,

    /// Arc-length of the last point of `prev_path`
    pub end_path_s: f64,

    pub vehicles: Vec<SensedVehicle>,
}

/// Output of a planning tick.
#[derive(Debug, Clone)]
pub struct CycleOutput {
    pub trajectory: Vec<Point2<f64>>,
    pub report: CycleReport,
}

/// Summary of a planning tick.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub ref_speed_mph: f64,
    pub ramp_complete: bool,
    pub ego_lane: usize,
    pub target_lane: usize,
    pub behaviour: &'static str,
    pub action: &'static str,
    pub lead_id: Option<u32>,
    pub lead_gap_m: Option<f64>,
    pub prev_size: usize,
    pub num_new_points: usize,

    /// True if no curve could be fitted and only the previous trajectory was sent
    pub fallback: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("Invalid telemetry: {0}")]
    InvalidTelemetry(TelemetryError),

    #[error("The planner has not been initialised")]
    NotInit,
}

/// Problems found while validating telemetry.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TelemetryError {
    #[error("The previous path has {x} x values but {y} y values")]
    PrevPathMismatch { x: usize, y: usize },

    #[error("The {0} value is not finite")]
    NonFinite(&'static str),

    #[error("Previous path point {0} is not finite")]
    NonFinitePathPoint(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ReferenceState {
    /// State at the start of a session: stopped in the start lane.
    pub fn initial(params: &PlannerParams) -> Self {
        Self {
            cycle: 0,
            lane: params.start_lane.min(NUM_LANES - 1),
            ref_speed_mph: 0.0,
            ramp_complete: false,
            behaviour: BehaviourState::KeepLane,
        }
    }
}

impl CycleInput {
    /// Validate telemetry and extract the tick input from it.
    ///
    /// Sensed vehicles with non-finite values are dropped.
    pub fn from_telemetry(tm: &Telemetry) -> Result<Self, CycleError> {
        let invalid = CycleError::InvalidTelemetry;

        if tm.previous_path_x.len() != tm.previous_path_y.len() {
            return Err(invalid(TelemetryError::PrevPathMismatch {
                x: tm.previous_path_x.len(),
                y: tm.previous_path_y.len(),
            }));
        }

        let fields = [
            ("x", tm.x),
            ("y", tm.y),
            ("s", tm.s),
            ("d", tm.d),
            ("yaw", tm.yaw),
            ("speed", tm.speed),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(invalid(TelemetryError::NonFinite(*name)));
        }

        let prev_path: Vec<_> = tm
            .previous_path_x
            .iter()
            .zip(tm.previous_path_y.iter())
            .map(|(&x, &y)| Point2::new(x, y))
            .collect();

        if let Some(i) = prev_path
            .iter()
            .position(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(invalid(TelemetryError::NonFinitePathPoint(i)));
        }

        if !prev_path.is_empty() && !tm.end_path_s.is_finite() {
            return Err(invalid(TelemetryError::NonFinite("end_path_s")));
        }

        let vehicles = tm
            .sensor_fusion
            .iter()
            .filter(|v| {
                let ok = [v.x, v.y, v.vx, v.vy, v.s, v.d].iter().all(|f| f.is_finite());
                if !ok {
                    debug!("Dropping sensed vehicle {} with non-finite state", v.id);
                }
                ok
            })
            .copied()
            .collect();

        Ok(Self {
            pose: Pose::from_telemetry(tm),
            prev_path,
            end_path_s: tm.end_path_s,
            vehicles,
        })
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Plan one tick.
///
/// Returns the state for the next tick and this tick's trajectory. If no curve can be fitted the
/// trajectory is the previous one, truncated to the horizon, and the report flags the fallback.
pub fn plan_cycle(
    state: ReferenceState,
    input: &CycleInput,
    table: &CenterlineTable,
    params: &PlannerParams,
    strategy: &mut dyn LaneDecision,
) -> (ReferenceState, CycleOutput) {
    let cycle = state.cycle + 1;
    let prev_size = input.prev_path.len();

    // New points continue from the end of the previous trajectory
    let plan_s = if prev_size > 0 {
        input.end_path_s
    } else {
        input.pose.s
    };

    let ego_lane = lane_of(input.pose.d, params.lane_width_m);
    let vehicles: Vec<_> = input
        .vehicles
        .iter()
        .map(|v| TrackedVehicle::from_sensed(v, params.lane_width_m))
        .collect();

    // ---- LANE DECISION ----

    let current = Decision {
        state: state.behaviour,
        target_lane: state.lane,
    };

    let decision = if state.ramp_complete {
        let ego = VehicleTrack {
            lane: ego_lane,
            s: plan_s,
            speed: input.pose.speed_ms,
            accel: 0.0,
            state: state.behaviour,
            goal_s: params.max_s_m,
            target_speed: state.ref_speed_mph * MS_PER_MPH,
        };

        let predictions: Predictions = vehicles
            .iter()
            .map(|v| {
                (
                    v.id,
                    v.track.forecast(params.forecast_steps, params.forecast_step_s),
                )
            })
            .collect();

        let mut decision = strategy.decide(&ego, current, &predictions, NUM_LANES);

        if decision.target_lane >= NUM_LANES {
            warn!(
                "Lane decision targets lane {} which does not exist, keeping lane {}",
                decision.target_lane, state.lane
            );
            decision.target_lane = state.lane;
        }

        decision
    } else {
        current
    };

    if decision != current {
        info!(
            "Behaviour {} (lane {}) -> {} (lane {})",
            current.state.label(),
            current.target_lane,
            decision.state.label(),
            decision.target_lane
        );
    }

    // ---- REFERENCE SPEED ----

    let speed = update_ref_speed(
        &FollowInput {
            ego_s: plan_s,
            ego_lane: decision.target_lane,
            ref_speed: state.ref_speed_mph,
            ramp_complete: state.ramp_complete,
            prev_size,
            vehicles: &vehicles,
        },
        params,
    );

    trace!(
        "Cycle {}: {} to {:.3} mph",
        cycle,
        speed.action.label(),
        speed.ref_speed
    );

    // ---- TRAJECTORY ----

    let synth_input = SynthInput {
        pose: input.pose,
        prev_path: &input.prev_path,
        plan_s,
        target_lane: decision.target_lane,
        ref_speed_mph: speed.ref_speed,
    };

    let (trajectory, fallback) = match synthesize(&synth_input, table, params) {
        Ok(t) => (t, false),
        Err(e) => {
            warn!("Cycle {}: {}, reusing the previous trajectory", cycle, e);
            let keep = prev_size.min(params.horizon_len);
            (input.prev_path[..keep].to_vec(), true)
        }
    };

    let (lead_id, lead_gap_m) = match speed.action {
        SpeedAction::Decelerate { lead_id, gap_m } => (Some(lead_id), Some(gap_m)),
        _ => (None, None),
    };

    let report = CycleReport {
        cycle,
        ref_speed_mph: speed.ref_speed,
        ramp_complete: speed.ramp_complete,
        ego_lane,
        target_lane: decision.target_lane,
        behaviour: decision.state.label(),
        action: speed.action.label(),
        lead_id,
        lead_gap_m,
        prev_size,
        num_new_points: trajectory.len().saturating_sub(prev_size),
        fallback,
    };

    debug!("{:?}", report);

    let next = ReferenceState {
        cycle,
        lane: decision.target_lane,
        ref_speed_mph: speed.ref_speed,
        ramp_complete: speed.ramp_complete,
        behaviour: decision.state,
    };

    (next, CycleOutput { trajectory, report })
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{behaviour::KeepLane, road::test_tracks};
    use std::f64::consts::FRAC_PI_2;

    /// Strategy recording how often it is asked and always moving one lane left.
    struct MoveLeft {
        calls: usize,
        ego_s: Option<f64>,
    }

    impl LaneDecision for MoveLeft {
        fn decide(
            &mut self,
            ego: &VehicleTrack,
            current: Decision,
            predictions: &Predictions,
            _num_lanes: usize,
        ) -> Decision {
            self.calls += 1;
            self.ego_s = Some(ego.s);
            assert!(predictions.values().all(|p| p.len() == 2));
            Decision {
                state: BehaviourState::LaneChangeLeft,
                target_lane: current.target_lane.saturating_sub(1),
            }
        }
    }

    /// Strategy asking for a lane that does not exist.
    struct OffRoad;

    impl LaneDecision for OffRoad {
        fn decide(
            &mut self,
            _ego: &VehicleTrack,
            current: Decision,
            _predictions: &Predictions,
            _num_lanes: usize,
        ) -> Decision {
            Decision {
                target_lane: 7,
                ..current
            }
        }
    }

    fn start_input() -> CycleInput {
        CycleInput {
            pose: Pose {
                x: 1006.0,
                y: 0.0,
                heading_rad: FRAC_PI_2,
                s: 0.0,
                d: 6.0,
                speed_ms: 0.0,
            },
            prev_path: vec![],
            end_path_s: 0.0,
            vehicles: vec![],
        }
    }

    /// Input of the next tick once the vehicle has driven `consumed` points of `trajectory`.
    fn next_input(
        table: &CenterlineTable,
        trajectory: &[Point2<f64>],
        consumed: usize,
        vehicles: Vec<SensedVehicle>,
    ) -> CycleInput {
        let car = trajectory[consumed - 1];
        let prev_path = trajectory[consumed..].to_vec();
        let end = prev_path[prev_path.len() - 1];

        CycleInput {
            pose: Pose {
                x: car.x,
                y: car.y,
                heading_rad: car.y.atan2(car.x) + FRAC_PI_2,
                s: test_tracks::circle_s(table, &car),
                d: car.coords.norm() - 1000.0,
                speed_ms: 0.0,
            },
            end_path_s: test_tracks::circle_s(table, &end),
            prev_path,
            vehicles,
        }
    }

    #[test]
    fn test_first_cycle() {
        let table = test_tracks::circle(1000.0, 360);
        let params = PlannerParams::default();
        let state = ReferenceState::initial(&params);

        assert_eq!(state.lane, 1);
        assert_eq!(state.ref_speed_mph, 0.0);

        let (state, output) = plan_cycle(state, &start_input(), &table, &params, &mut KeepLane);

        assert_eq!(state.cycle, 1);
        assert!((state.ref_speed_mph - params.speed_increment_mph).abs() < 1e-12);
        assert!(!state.ramp_complete);
        assert_eq!(output.trajectory.len(), params.horizon_len);
        assert_eq!(output.report.num_new_points, params.horizon_len);
        assert_eq!(output.report.action, "accelerate");
        assert!(!output.report.fallback);
    }

    #[test]
    fn test_ramp_then_decide() {
        let table = test_tracks::circle(1000.0, 360);
        let params = PlannerParams::default();
        let mut strategy = MoveLeft {
            calls: 0,
            ego_s: None,
        };

        let mut state = ReferenceState::initial(&params);
        let (s, mut output) = plan_cycle(state, &start_input(), &table, &params, &mut strategy);
        state = s;

        let sensed = SensedVehicle {
            id: 11,
            x: -1006.0,
            y: 0.0,
            vx: 0.0,
            vy: -10.0,
            s: table.max_s() / 2.0,
            d: 6.0,
        };

        let mut ticks = 1;
        while !state.ramp_complete {
            let input = next_input(&table, &output.trajectory, 3, vec![sensed]);
            let (s, o) = plan_cycle(state, &input, &table, &params, &mut strategy);

            assert_eq!(o.trajectory.len(), params.horizon_len);
            assert!(!o.report.fallback);

            state = s;
            output = o;
            ticks += 1;
            assert!(ticks <= 221);
        }

        assert_eq!(ticks, 221);
        assert_eq!(state.ref_speed_mph, params.cruise_speed_mph);
        assert_eq!(strategy.calls, 0);
        assert_eq!(state.lane, 1);

        // The strategy takes over once cruise speed is reached
        let input = next_input(&table, &output.trajectory, 3, vec![sensed]);
        let (mut state, mut output) =
            plan_cycle(state, &input, &table, &params, &mut strategy);

        assert_eq!(strategy.calls, 1);
        assert_eq!(strategy.ego_s, Some(input.end_path_s));
        assert_eq!(state.lane, 0);
        assert_eq!(state.behaviour, BehaviourState::LaneChangeLeft);
        assert_eq!(output.report.target_lane, 0);
        assert_eq!(output.report.ego_lane, 1);
        assert_eq!(output.report.action, "maintain");

        // The trajectory converges on the centre of lane 0
        for _ in 0..100 {
            let input = next_input(&table, &output.trajectory, 3, vec![sensed]);
            let (s, o) = plan_cycle(state, &input, &table, &params, &mut strategy);

            assert_eq!(o.trajectory.len(), params.horizon_len);
            assert!(!o.report.fallback);

            state = s;
            output = o;
        }

        let r = output.trajectory[params.horizon_len - 1].coords.norm();
        assert!((r - 1002.0).abs() < 0.5, "r = {}", r);
        assert_eq!(output.report.ego_lane, 0);
    }

    #[test]
    fn test_invalid_lane_decision() {
        let table = test_tracks::circle(1000.0, 360);
        let params = PlannerParams::default();

        let state = ReferenceState {
            ref_speed_mph: params.cruise_speed_mph,
            ramp_complete: true,
            ..ReferenceState::initial(&params)
        };

        let (state, output) = plan_cycle(state, &start_input(), &table, &params, &mut OffRoad);

        assert_eq!(state.lane, 1);
        assert!(!output.report.fallback);
    }

    #[test]
    fn test_follows_lead() {
        let table = test_tracks::circle(1000.0, 360);
        let params = PlannerParams::default();

        let state = ReferenceState {
            ref_speed_mph: 30.0,
            ..ReferenceState::initial(&params)
        };

        let lead = SensedVehicle {
            id: 4,
            x: 1005.8,
            y: 20.0,
            vx: 0.0,
            vy: 0.0,
            s: 20.0,
            d: 5.8,
        };

        let mut input = start_input();
        input.vehicles = vec![lead];

        let (state, output) = plan_cycle(state, &input, &table, &params, &mut KeepLane);

        assert!((state.ref_speed_mph - (30.0 - params.speed_decrement_mph)).abs() < 1e-12);
        assert_eq!(output.report.action, "decelerate");
        assert_eq!(output.report.lead_id, Some(4));
        assert_eq!(output.report.lead_gap_m, Some(20.0));
    }

    #[test]
    fn test_curve_fit_fallback() {
        let table = test_tracks::circle(1000.0, 360);
        let params = PlannerParams::default();
        let state = ReferenceState::initial(&params);

        // Facing against the direction of travel with no history
        let mut input = start_input();
        input.pose.heading_rad = -FRAC_PI_2;

        let (next, output) = plan_cycle(state, &input, &table, &params, &mut KeepLane);
        assert!(output.report.fallback);
        assert!(output.trajectory.is_empty());
        assert_eq!(next.cycle, 1);

        // History pointing backwards is re-sent unchanged
        input.prev_path = (0..60)
            .map(|i| Point2::new(1006.0, -(i as f64) * 0.3))
            .collect();
        input.end_path_s = 0.0;

        let (_, output) = plan_cycle(next, &input, &table, &params, &mut KeepLane);
        assert!(output.report.fallback);
        assert_eq!(output.trajectory, input.prev_path[..params.horizon_len].to_vec());
        assert_eq!(output.report.num_new_points, 0);
    }

    #[test]
    fn test_telemetry_validation() {
        let mut tm = Telemetry {
            x: 909.48,
            y: 1128.67,
            s: 124.834,
            d: 6.16483,
            yaw: 0.0,
            speed: 0.0,
            previous_path_x: vec![910.0, 910.5],
            previous_path_y: vec![1128.7, 1128.7],
            end_path_s: 126.0,
            end_path_d: 6.0,
            sensor_fusion: vec![SensedVehicle {
                id: 0,
                x: 1000.0,
                y: 1128.0,
                vx: 20.0,
                vy: 0.0,
                s: 200.0,
                d: f64::NAN,
            }],
        };

        let input = CycleInput::from_telemetry(&tm).unwrap();
        assert_eq!(input.prev_path.len(), 2);
        assert!(input.vehicles.is_empty());

        tm.previous_path_y.pop();
        assert!(matches!(
            CycleInput::from_telemetry(&tm),
            Err(CycleError::InvalidTelemetry(TelemetryError::PrevPathMismatch { x: 2, y: 1 }))
        ));

        tm.previous_path_y.push(f64::INFINITY);
        assert!(matches!(
            CycleInput::from_telemetry(&tm),
            Err(CycleError::InvalidTelemetry(TelemetryError::NonFinitePathPoint(1)))
        ));

        tm.previous_path_y[1] = 1128.7;
        tm.yaw = f64::NAN;
        assert!(matches!(
            CycleInput::from_telemetry(&tm),
            Err(CycleError::InvalidTelemetry(TelemetryError::NonFinite("yaw")))
        ));
    }
}
