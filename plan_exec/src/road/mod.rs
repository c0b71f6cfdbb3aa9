//! # Road module
//!
//! The road is described by a table of waypoints along its centerline. Each waypoint carries its
//! world position, its arc-length `s` along the road and the unit normal pointing towards
//! increasing lateral offset `d`. The track is a closed loop, so `s` wraps back to zero at the
//! track length `max_s`.
//!
//! The table is loaded once at start-up and never modified afterwards.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod frame;
pub mod lane;

pub use frame::to_cartesian;
pub use lane::{lane_center, lane_of, NUM_LANES};

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{fs::File, io::Read, path::Path};

use csv::{ReaderBuilder, Trim};
use log::debug;
use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single centerline waypoint.
///
/// In the waypoint file this is one row `x y s dx dy`.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub s: f64,
    pub dx: f64,
    pub dy: f64,
}

/// The centerline of a closed track.
#[derive(Debug, Clone)]
pub struct CenterlineTable {
    waypoints: Vec<Waypoint>,
    max_s: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RoadError {
    #[error("Cannot open the waypoint file: {0}")]
    FileError(std::io::Error),

    #[error("Cannot read the waypoint file: {0}")]
    CsvError(csv::Error),

    #[error("The track length must be positive and finite, found {0}")]
    InvalidTrackLength(f64),

    #[error("At least 2 waypoints are needed to describe the road, found {0}")]
    TooFewWaypoints(usize),

    #[error("Waypoint {0} contains a non-finite value")]
    NonFiniteWaypoint(usize),

    #[error("Waypoint arc-lengths must be strictly increasing, waypoint {0} is not")]
    NonMonotonicS(usize),

    #[error("Waypoint {index} has arc-length {s} outside of the track length {max_s}")]
    BeyondTrackLength { index: usize, s: f64, max_s: f64 },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CenterlineTable {
    /// Build a table from waypoints ordered along the direction of travel.
    pub fn new(waypoints: Vec<Waypoint>, max_s: f64) -> Result<Self, RoadError> {
        if !max_s.is_finite() || max_s <= 0.0 {
            return Err(RoadError::InvalidTrackLength(max_s));
        }

        if waypoints.len() < 2 {
            return Err(RoadError::TooFewWaypoints(waypoints.len()));
        }

        for (i, wp) in waypoints.iter().enumerate() {
            if ![wp.x, wp.y, wp.s, wp.dx, wp.dy].iter().all(|v| v.is_finite()) {
                return Err(RoadError::NonFiniteWaypoint(i));
            }
            if wp.s < 0.0 || wp.s >= max_s {
                return Err(RoadError::BeyondTrackLength { index: i, s: wp.s, max_s });
            }
            if i > 0 && wp.s <= waypoints[i - 1].s {
                return Err(RoadError::NonMonotonicS(i));
            }
        }

        Ok(Self { waypoints, max_s })
    }

    /// Load the table from a whitespace separated waypoint file.
    pub fn load<P: AsRef<Path>>(path: P, max_s: f64) -> Result<Self, RoadError> {
        let file = File::open(path.as_ref()).map_err(RoadError::FileError)?;
        let table = Self::from_reader(file, max_s)?;

        debug!(
            "Loaded {} waypoints from {:?}",
            table.len(),
            path.as_ref()
        );

        Ok(table)
    }

    /// Read the table from any source of waypoint rows.
    pub fn from_reader<R: Read>(reader: R, max_s: f64) -> Result<Self, RoadError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b' ')
            .trim(Trim::All)
            .from_reader(reader);

        let waypoints = rdr
            .deserialize()
            .collect::<Result<Vec<Waypoint>, _>>()
            .map_err(RoadError::CsvError)?;

        Self::new(waypoints, max_s)
    }

    /// The waypoints of the table, in order of increasing arc-length.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Length of the track.
    pub fn max_s(&self) -> f64 {
        self.max_s
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Index of the last waypoint whose arc-length is at or before `s`.
    ///
    /// `s` is wrapped onto the track first. Positions before the first waypoint belong to the
    /// segment joining the last waypoint back to the first one.
    pub fn segment_index(&self, s: f64) -> usize {
        let s = util::maths::wrap(s, self.max_s);

        match self.waypoints.partition_point(|wp| wp.s <= s) {
            0 => self.waypoints.len() - 1,
            n => n - 1,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TEST HELPERS
// ------------------------------------------------------------------------------------------------
