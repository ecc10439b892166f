//! Bearing and orientation math (spec.md §4.4).
//!
//! No teacher file in this workspace computes bearing-between-two-points:
//! `valhalla-graphtile::spatial` uses `geo::Haversine`'s `distance` and
//! `destination` (distance *and* destination-from-a-bearing), not the
//! inverse operation this module needs. These functions are grounded
//! directly in the literal formulas spec.md §4.4 states, using `geo::Point`
//! for coordinates as the rest of the workspace does.

use crate::graph::LatLon;
use std::f64::consts::PI;

/// Coarse classification of a turn angle's magnitude, used to pick an
/// instruction sign (spec.md §4.2 step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleBand {
    Straight,
    Slight,
    Normal,
    Sharp,
    UTurn,
}

/// Bucket thresholds in radians, spec.md §4.2 step 2.
const SLIGHT_THRESHOLD: f64 = 0.2;
const NORMAL_THRESHOLD: f64 = 0.8;
const SHARP_THRESHOLD: f64 = 2.3;
const UTURN_THRESHOLD: f64 = 2.9;

/// Classifies the magnitude of a turn angle (radians) into a band.
#[must_use]
pub fn classify_angle(delta: f64) -> AngleBand {
    let magnitude = delta.abs();
    if magnitude < SLIGHT_THRESHOLD {
        AngleBand::Straight
    } else if magnitude < NORMAL_THRESHOLD {
        AngleBand::Slight
    } else if magnitude < SHARP_THRESHOLD {
        AngleBand::Normal
    } else if magnitude < UTURN_THRESHOLD {
        AngleBand::Sharp
    } else {
        AngleBand::UTurn
    }
}

/// Orientation of the segment `from -> to`, in `(-pi, pi]`, relative to due
/// east, increasing clockwise (so a right turn yields a positive delta and a
/// left turn a negative one, matching spec.md §4.2 step 2's sign convention).
#[must_use]
pub fn calc_orientation(from: LatLon, to: LatLon) -> f64 {
    let dlat = to.lat() - from.lat();
    let dlon = to.lon() - from.lon();
    (-dlat).atan2(dlon)
}

/// Shifts `x` by a multiple of 2*pi so that `|reference - x| <= pi`.
#[must_use]
pub fn align_orientation(reference: f64, x: f64) -> f64 {
    let mut aligned = x;
    while reference - aligned > PI {
        aligned += 2.0 * PI;
    }
    while aligned - reference > PI {
        aligned -= 2.0 * PI;
    }
    aligned
}

/// Signed turn angle at a junction: the change in heading from `in_bearing`
/// (the incoming tangent) to `out_bearing` (the outgoing tangent),
/// normalized to `(-pi, pi]`. Negative is left, positive is right.
#[must_use]
pub fn turn_angle(in_bearing: f64, out_bearing: f64) -> f64 {
    align_orientation(in_bearing, out_bearing) - in_bearing
}

/// Turn angle for a completed roundabout traversal (spec.md §4.4): clockwise
/// roundabouts use `pi + delta`, counter-clockwise use `-(pi - delta)`, where
/// `delta` is the aligned orientation difference between the roundabout's
/// entry tangent and its exit tangent.
#[must_use]
pub fn roundabout_turn_angle(clockwise: bool, delta: f64) -> f64 {
    if clockwise {
        PI + delta
    } else {
        -(PI - delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_due_east_is_zero() {
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(0.0, 1.0);
        assert!((calc_orientation(a, b) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn orientation_due_north_is_negative_half_pi() {
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(1.0, 0.0);
        assert!((calc_orientation(a, b) - (-PI / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn align_orientation_picks_nearest_representative() {
        let reference = 3.0;
        let x = -3.1; // same heading as 2pi - 3.1, nearer to 3.0 once shifted
        let aligned = align_orientation(reference, x);
        assert!((reference - aligned).abs() <= PI);
    }

    #[test]
    fn turn_angle_is_zero_for_straight_continuation() {
        let bearing = 1.2;
        assert!((turn_angle(bearing, bearing)).abs() < 1e-9);
    }

    #[test]
    fn classify_angle_bands() {
        assert_eq!(classify_angle(0.05), AngleBand::Straight);
        assert_eq!(classify_angle(0.5), AngleBand::Slight);
        assert_eq!(classify_angle(-0.5), AngleBand::Slight);
        assert_eq!(classify_angle(1.5), AngleBand::Normal);
        assert_eq!(classify_angle(2.5), AngleBand::Sharp);
        assert_eq!(classify_angle(3.1), AngleBand::UTurn);
    }
}
