//! # Lane classification

/// Number of lanes on the road, lane 0 is the leftmost.
pub const NUM_LANES: usize = 3;

/// Lane occupied by an object at lateral offset `d`.
///
/// Lanes are half-open intervals `[k * lane_width, (k + 1) * lane_width)`, so an offset exactly on
/// a boundary belongs to the higher lane. Offsets left of the road map to lane 0 and offsets
/// beyond the last boundary map to the last lane.
pub fn lane_of(d: f64, lane_width: f64) -> usize {
    (1..NUM_LANES).take_while(|&k| d >= k as f64 * lane_width).count()
}

/// Lateral offset of the centre of `lane`.
pub fn lane_center(lane: usize, lane_width: f64) -> f64 {
    lane_width / 2.0 + lane_width * lane as f64
}
