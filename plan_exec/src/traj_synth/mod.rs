//! # Trajectory synthesizer
//!
//! Builds the trajectory sent to the simulator each tick. The points of the previous trajectory
//! the vehicle has not yet driven are kept unchanged, and new points are appended until the
//! trajectory holds `horizon_len` points.
//!
//! The new points follow a cubic spline fitted through five anchors:
//!
//! - the last two points of the previous trajectory, or a point just behind the vehicle and the
//!   vehicle itself when there is not enough history,
//! - three far-field points at the centre of the target lane.
//!
//! The spline is fitted in a local frame whose origin is the last history anchor and whose x axis
//! points along the heading between the two history anchors. Because the next tick fits its
//! spline starting from the same points, the path position and heading stay continuous across the
//! splice between old and new points.
//!
//! The spline is then sampled so that consecutive points are one time step apart at the reference
//! speed.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod local_frame;

pub use local_frame::LocalFrame;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use nalgebra::{distance, Point2, Vector2};

use util::spline::{CubicSpline, SplineError};

use crate::{
    params::PlannerParams,
    road::{lane_center, to_cartesian, CenterlineTable},
    track::Pose,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of anchors the spline is fitted through.
pub const NUM_ANCHORS: usize = 5;

/// History points closer than this to the end of the previous trajectory do not give a heading.
const MIN_HISTORY_SEPARATION_M: f64 = 1e-6;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Input to the synthesizer for one tick.
#[derive(Debug, Clone, Copy)]
pub struct SynthInput<'a> {
    /// Current pose of the vehicle
    pub pose: Pose,

    /// Points of the previous trajectory not yet driven
    pub prev_path: &'a [Point2<f64>],

    /// Arc-length the new points continue from, the end of the previous trajectory when there is
    /// one, otherwise the vehicle's own position
    pub plan_s: f64,

    /// Lane the far-field anchors are placed in
    pub target_lane: usize,

    /// Reference speed in mph
    pub ref_speed_mph: f64,
}

/// The anchors of a tick along with the local frame they are fitted in.
#[derive(Debug, Clone, Copy)]
pub struct AnchorSet {
    pub frame: LocalFrame,

    /// Anchors in the world frame, in order along the path
    pub world: [Point2<f64>; NUM_ANCHORS],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    #[error("Cannot fit the trajectory curve through the anchors: {0}")]
    CurveFit(SplineError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AnchorSet {
    /// The anchors in the local frame, as separate x and y arrays.
    pub fn local(&self) -> ([f64; NUM_ANCHORS], [f64; NUM_ANCHORS]) {
        let mut x = [0f64; NUM_ANCHORS];
        let mut y = [0f64; NUM_ANCHORS];

        for (i, p) in self.world.iter().enumerate() {
            let local = self.frame.to_local(p);
            x[i] = local.x;
            y[i] = local.y;
        }

        (x, y)
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build the anchors and local frame for this tick.
///
/// The history anchors are the last point of `input.prev_path` and the closest point before it
/// that is apart from it. A stopped vehicle leaves a tail of repeated points, in which case the
/// points are skipped back to where the vehicle was still moving. Without such a point the pose
/// heading is used along with a synthetic anchor behind the reference point, which is the pose
/// itself when there are fewer than two history points.
pub fn build_anchors(
    input: &SynthInput,
    table: &CenterlineTable,
    params: &PlannerParams,
) -> AnchorSet {
    let history = input.prev_path.split_last().and_then(|(last, rest)| {
        rest.iter()
            .rev()
            .find(|p| distance(p, last) > MIN_HISTORY_SEPARATION_M)
            .map(|prev| (*prev, *last))
    });

    let (prev, reference, heading) = match history {
        Some((prev, last)) => {
            let dir = last - prev;
            (prev, last, dir.y.atan2(dir.x))
        }
        None => {
            // A stopped tail is continued from its end, short histories from the pose
            let reference = match input.prev_path {
                [_, .., last] => *last,
                _ => Point2::new(input.pose.x, input.pose.y),
            };
            let heading = input.pose.heading_rad;
            let behind = reference
                - params.synthetic_anchor_step_m * Vector2::new(heading.cos(), heading.sin());
            (behind, reference, heading)
        }
    };

    let d = lane_center(input.target_lane, params.lane_width_m);
    let [o0, o1, o2] = params.anchor_offsets_m;

    AnchorSet {
        frame: LocalFrame::new(reference, heading),
        world: [
            prev,
            reference,
            to_cartesian(input.plan_s + o0, d, table),
            to_cartesian(input.plan_s + o1, d, table),
            to_cartesian(input.plan_s + o2, d, table),
        ],
    }
}

/// Build this tick's trajectory.
///
/// The result starts with the previous trajectory, truncated to the horizon, followed by the new
/// points. If the anchors do not run forward in the local frame no curve can be fitted and an
/// error is returned.
pub fn synthesize(
    input: &SynthInput,
    table: &CenterlineTable,
    params: &PlannerParams,
) -> Result<Vec<Point2<f64>>, SynthError> {
    let carried = &input.prev_path[..input.prev_path.len().min(params.horizon_len)];
    let num_new = params.horizon_len - carried.len();

    let anchors = build_anchors(&SynthInput { prev_path: carried, ..*input }, table, params);
    let (x, y) = anchors.local();

    trace!("Local anchors x: {:?}, y: {:?}", x, y);

    let spline = CubicSpline::new(&x, &y).map_err(SynthError::CurveFit)?;

    let mut trajectory = Vec::with_capacity(params.horizon_len);
    trajectory.extend_from_slice(carried);
    trajectory.extend(resample(&spline, &anchors.frame, input.ref_speed_mph, num_new, params));

    Ok(trajectory)
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Sample `num_points` points along the spline, one time step apart at `ref_speed_mph`.
///
/// The spacing along local x is chosen so that the straight line to the lookahead point is covered
/// in whole time steps, which approximates uniform spacing along the curve.
fn resample(
    spline: &CubicSpline,
    frame: &LocalFrame,
    ref_speed_mph: f64,
    num_points: usize,
    params: &PlannerParams,
) -> Vec<Point2<f64>> {
    let step_m = params.time_step_s * ref_speed_mph / params.mph_per_ms;

    // A stopped vehicle stays on the reference point
    if step_m.is_nan() || step_m <= 0.0 {
        return vec![frame.origin(); num_points];
    }

    let target_x = params.lookahead_m;
    let target_dist = target_x.hypot(spline.eval(target_x));
    let num_steps = target_dist / step_m;
    let dx = target_x / num_steps;

    (1..=num_points)
        .map(|i| {
            let x = i as f64 * dx;
            frame.to_world(&Point2::new(x, spline.eval(x)))
        })
        .collect()
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
