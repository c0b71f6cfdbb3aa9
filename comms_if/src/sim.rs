//! # Simulator messages
//!
//! The simulator exchanges socket.io style event frames: the two character prefix `42` followed
//! by a JSON array `[event_name, payload]`. Each telemetry event received must be answered with
//! either a control event holding the next trajectory or a manual event handing control back to
//! the simulator.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Prefix of a websocket message event.
pub const EVENT_PREFIX: &str = "42";

/// Name of the telemetry event.
pub const TELEMETRY_EVENT: &str = "telemetry";

/// Reply returning control of the vehicle to the simulator.
pub const MANUAL_FRAME: &str = "42[\"manual\",{}]";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telemetry sent by the simulator once per planning tick.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Telemetry {
    /// Ego world x position
    pub x: f64,

    /// Ego world y position
    pub y: f64,

    /// Ego road arc-length
    pub s: f64,

    /// Ego lateral offset from the road centerline
    pub d: f64,

    /// Ego heading in degrees
    pub yaw: f64,

    /// Ego speed in mph
    pub speed: f64,

    /// World x of the points of the last trajectory not yet consumed
    pub previous_path_x: Vec<f64>,

    /// World y of the points of the last trajectory not yet consumed
    pub previous_path_y: Vec<f64>,

    /// Arc-length of the last point of the previous path
    pub end_path_s: f64,

    /// Lateral offset of the last point of the previous path
    pub end_path_d: f64,

    /// Other vehicles on the same side of the road
    pub sensor_fusion: Vec<SensedVehicle>,
}

/// A vehicle reported by sensor fusion.
///
/// On the wire this is the array `[id, x, y, vx, vy, s, d]`, velocities in m/s.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(from = "[f64; 7]", into = "[f64; 7]")]
pub struct SensedVehicle {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub s: f64,
    pub d: f64,
}

/// The trajectory sent back to the simulator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Control {
    pub next_x: Vec<f64>,
    pub next_y: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A decoded simulator frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// A telemetry event with its payload
    Telemetry(Box<Telemetry>),

    /// An event without data, the simulator expects a manual reply
    Manual,

    /// Any other named event
    Other(String),
}

#[derive(Debug, Error)]
pub enum SimMsgError {
    #[error("The frame is not a message event (expected prefix \"42\")")]
    NotAnEvent,

    #[error("The event array is malformed")]
    MalformedEvent,

    #[error("Could not parse the event JSON: {0}")]
    Json(serde_json::Error),

    #[error("Could not serialize the control message: {0}")]
    Serialize(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl From<[f64; 7]> for SensedVehicle {
    fn from(v: [f64; 7]) -> Self {
        Self {
            id: v[0] as u32,
            x: v[1],
            y: v[2],
            vx: v[3],
            vy: v[4],
            s: v[5],
            d: v[6],
        }
    }
}

impl From<SensedVehicle> for [f64; 7] {
    fn from(v: SensedVehicle) -> Self {
        [v.id as f64, v.x, v.y, v.vx, v.vy, v.s, v.d]
    }
}

impl SensedVehicle {
    /// Magnitude of the velocity vector.
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }
}

impl Control {
    /// Build a control message from a sequence of world points.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>
    {
        let (next_x, next_y) = points.into_iter().unzip();
        Self { next_x, next_y }
    }

    /// Number of points in the trajectory.
    pub fn len(&self) -> usize {
        self.next_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next_x.is_empty()
    }

    /// Frame the message as a control event.
    pub fn to_frame(&self) -> Result<String, SimMsgError> {
        let body = serde_json::to_string(self).map_err(SimMsgError::Serialize)?;
        Ok(format!("{}[\"control\",{}]", EVENT_PREFIX, body))
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Decode a frame received from the simulator.
pub fn parse_frame(frame: &str) -> Result<SimEvent, SimMsgError> {
    let body = frame
        .strip_prefix(EVENT_PREFIX)
        .ok_or(SimMsgError::NotAnEvent)?;

    // Events carrying null data mean the simulator is in manual mode
    if body.contains("null") {
        return Ok(SimEvent::Manual);
    }

    let array = match (body.find('['), body.rfind(']')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => return Ok(SimEvent::Manual),
    };

    let mut items: Vec<Value> = serde_json::from_str(array).map_err(SimMsgError::Json)?;

    if items.is_empty() {
        return Err(SimMsgError::MalformedEvent);
    }

    let name = match items[0].as_str() {
        Some(n) => n.to_owned(),
        None => return Err(SimMsgError::MalformedEvent),
    };

    if name != TELEMETRY_EVENT {
        return Ok(SimEvent::Other(name));
    }

    if items.len() < 2 {
        return Ok(SimEvent::Manual);
    }

    let telemetry: Telemetry = serde_json::from_value(items.swap_remove(1))
        .map_err(SimMsgError::Json)?;

    Ok(SimEvent::Telemetry(Box::new(telemetry)))
}
