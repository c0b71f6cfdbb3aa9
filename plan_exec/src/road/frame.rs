//! # Road frame conversion
//!
//! Converts road-relative coordinates (arc-length `s`, lateral offset `d`) into world Cartesian
//! coordinates.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;
use std::f64::consts::FRAC_PI_2;

use super::CenterlineTable;
use util::maths::wrap;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert the road position `(s, d)` into a world position.
///
/// The position is found by moving along the centerline segment that contains `s` and then
/// stepping `d` along the right-hand perpendicular of that segment. Any `s` is accepted, it is
/// wrapped onto the track first.
pub fn to_cartesian(s: f64, d: f64, table: &CenterlineTable) -> Point2<f64> {
    let waypoints = table.waypoints();
    let s = wrap(s, table.max_s());

    let i = table.segment_index(s);
    let wp = &waypoints[i];
    let next = &waypoints[(i + 1) % waypoints.len()];

    let heading = (next.y - wp.y).atan2(next.x - wp.x);

    // Distance along the segment, positions before the first waypoint sit on the closing segment
    let seg_s = wrap(s - wp.s, table.max_s());

    let perp = heading - FRAC_PI_2;

    Point2::new(
        wp.x + seg_s * heading.cos() + d * perp.cos(),
        wp.y + seg_s * heading.sin() + d * perp.sin(),
    )
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::road::test_tracks;
    use nalgebra::distance;

    #[test]
    fn test_on_centerline() {
        let table = test_tracks::circle(1000.0, 360);

        for wp in table.waypoints() {
            let p = to_cartesian(wp.s, 0.0, &table);
            assert!(distance(&p, &Point2::new(wp.x, wp.y)) < 1e-9);
        }
    }

    #[test]
    fn test_lateral_offset() {
        let table = test_tracks::straight(30.0, 10);

        let p = to_cartesian(45.0, 6.0, &table);
        assert!((p.x - 45.0).abs() < 1e-9);
        assert!((p.y + 6.0).abs() < 1e-9);

        // The offset follows the stored normal on a straight road
        let wp = table.waypoints()[2];
        let p = to_cartesian(wp.s, 2.0, &table);
        assert!((p.x - (wp.x + 2.0 * wp.dx)).abs() < 1e-9);
        assert!((p.y - (wp.y + 2.0 * wp.dy)).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_continuity() {
        let table = test_tracks::circle(1000.0, 360);
        let max_s = table.max_s();

        for &d in &[0.0, 2.0, 6.0, 10.0] {
            let before = to_cartesian(max_s - 0.001, d, &table);
            let after = to_cartesian(0.001, d, &table);
            let wrapped = to_cartesian(max_s, d, &table);

            assert!(distance(&before, &after) < 0.2, "d = {}", d);
            assert!(distance(&to_cartesian(0.0, d, &table), &wrapped) < 1e-9);
        }

        // Whole laps and negative arc-lengths land on the same point
        let p = to_cartesian(123.4, 6.0, &table);
        assert!(distance(&p, &to_cartesian(123.4 + 2.0 * max_s, 6.0, &table)) < 1e-6);
        assert!(distance(&p, &to_cartesian(123.4 - max_s, 6.0, &table)) < 1e-6);
    }

    #[test]
    fn test_stays_on_circle() {
        let table = test_tracks::circle(1000.0, 360);

        // Between waypoints the point lies on the chord, slightly inside the circle
        for i in 0..100 {
            let s = i as f64 * 61.3;
            let p = to_cartesian(s, 6.0, &table);
            let r = p.coords.norm();
            assert!(r > 1005.8 && r < 1006.01, "r = {} at s = {}", r, s);
        }
    }
}
