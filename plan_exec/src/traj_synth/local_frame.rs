//! # Local frame
//!
//! Vehicle-relative frame the trajectory curve is fitted in. Its origin is the reference point of
//! the tick and its x axis is aligned with the reference heading, so the path ahead runs along
//! increasing local x.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Isometry2, Point2, Translation2, UnitComplex};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    /// Transform from the local frame to the world frame
    local_to_world: Isometry2<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LocalFrame {
    pub fn new(origin: Point2<f64>, heading_rad: f64) -> Self {
        Self {
            local_to_world: Isometry2::from_parts(
                Translation2::from(origin.coords),
                UnitComplex::from_angle(heading_rad),
            ),
        }
    }

    /// Express a world point in the local frame.
    pub fn to_local(&self, world: &Point2<f64>) -> Point2<f64> {
        self.local_to_world.inverse_transform_point(world)
    }

    /// Express a local point in the world frame.
    pub fn to_world(&self, local: &Point2<f64>) -> Point2<f64> {
        self.local_to_world.transform_point(local)
    }

    pub fn origin(&self) -> Point2<f64> {
        Point2::from(self.local_to_world.translation.vector)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::distance;
    use std::f64::consts::{FRAC_PI_2, TAU};

    #[test]
    fn test_round_trip() {
        let origin = Point2::new(909.48, 1128.67);
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(1000.0, 1000.0),
            Point2::new(-35.2, 4420.1),
            Point2::new(912.0, 1127.5),
        ];

        for i in 0..64 {
            let frame = LocalFrame::new(origin, i as f64 * TAU / 64.0);

            for p in points.iter() {
                let back = frame.to_world(&frame.to_local(p));
                assert!(distance(p, &back) < 1e-9);
            }
        }
    }

    #[test]
    fn test_axes() {
        let frame = LocalFrame::new(Point2::new(10.0, 5.0), FRAC_PI_2);

        assert!(distance(&frame.to_local(&Point2::new(10.0, 5.0)), &Point2::origin()) < 1e-12);

        // Straight ahead along the heading is local +x, to the left is local +y
        let ahead = frame.to_local(&Point2::new(10.0, 8.0));
        assert!(distance(&ahead, &Point2::new(3.0, 0.0)) < 1e-12);

        let left = frame.to_local(&Point2::new(8.0, 5.0));
        assert!(distance(&left, &Point2::new(0.0, 2.0)) < 1e-12);

        assert_eq!(frame.origin(), Point2::new(10.0, 5.0));
    }
}
