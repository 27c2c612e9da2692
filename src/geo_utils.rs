// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pure geodesy helpers: haversine distance, bearing projection, compass
//! naming and straight-line interpolation.
//!
//! Malformed input (NaN, out-of-range coordinates) is not validated and
//! propagates into the results.

use crate::models::Location;
use geo::{Destination, Distance, Haversine, Point};
use std::f64::consts::PI;

/// Eight compass buckets, clockwise from north.
const COMPASS_NAMES: [&str; 8] = [
    "North",
    "North-East",
    "East",
    "South-East",
    "South",
    "South-West",
    "West",
    "North-West",
];

/// Great-circle distance between two locations in meters.
pub fn distance(a: Location, b: Location) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}

/// Project `distance_km` from `origin` along `bearing_deg` (clockwise from north).
pub fn destination(origin: Location, distance_km: f64, bearing_deg: f64) -> Location {
    Haversine
        .destination(Point::from(origin), bearing_deg, distance_km * 1000.0)
        .into()
}

/// Compass name for a bearing given in radians.
pub fn direction_name(bearing_rad: f64) -> &'static str {
    let normalized = bearing_rad.rem_euclid(2.0 * PI);
    let bucket = ((normalized / (PI / 4.0)).round() as usize) % COMPASS_NAMES.len();
    COMPASS_NAMES[bucket]
}

/// Straight-line path from `start` to `end` with `steps` segments.
///
/// Returns `steps + 1` points; the first is `start` and the last is `end`.
pub fn interpolate_path(start: Location, end: Location, steps: usize) -> Vec<Location> {
    let steps = steps.max(1);
    (0..=steps)
        .map(|i| {
            if i == steps {
                return end;
            }
            let t = i as f64 / steps as f64;
            Location::new(
                start.lat + (end.lat - start.lat) * t,
                start.lng + (end.lng - start.lng) * t,
            )
        })
        .collect()
}

/// Segment-wise interpolation through every point in `points`.
///
/// Shared vertices are emitted once.
pub fn interpolate_waypoints(points: &[Location], steps_per_segment: usize) -> Vec<Location> {
    let mut path = Vec::new();
    for pair in points.windows(2) {
        let segment = interpolate_path(pair[0], pair[1], steps_per_segment);
        let skip = usize::from(!path.is_empty());
        path.extend(segment.into_iter().skip(skip));
    }
    if path.is_empty() {
        path.extend(points.first().copied());
    }
    path
}

/// Total haversine length of a path in meters.
pub fn path_length_m(path: &[Location]) -> f64 {
    path.windows(2).map(|w| distance(w[0], w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEOUL: Location = Location::new(37.5665, 126.978);

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(distance(SEOUL, SEOUL), 0.0);
        let origin = Location::new(0.0, 0.0);
        assert_eq!(distance(origin, origin), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            (SEOUL, Location::new(35.1796, 129.0756)),
            (Location::new(0.0, 0.0), Location::new(0.0, 1.0)),
            (Location::new(-33.86, 151.21), Location::new(51.5, -0.12)),
        ];
        for (a, b) in pairs {
            let ab = distance(a, b);
            let ba = distance(b, a);
            assert!((ab - ba).abs() < 1e-6, "{} vs {}", ab, ba);
        }
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let d = distance(Location::new(0.0, 0.0), Location::new(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 100.0, "got {}", d);
    }

    #[test]
    fn test_destination_round_trips_distance() {
        for bearing in [0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0] {
            for km in [0.5, 1.5, 3.0, 5.0] {
                let dest = destination(SEOUL, km, bearing);
                let measured = distance(SEOUL, dest);
                let expected = km * 1000.0;
                assert!(
                    (measured - expected).abs() / expected < 0.01,
                    "bearing {} km {}: measured {}",
                    bearing,
                    km,
                    measured
                );
            }
        }
    }

    #[test]
    fn test_destination_north_increases_latitude() {
        let dest = destination(SEOUL, 1.0, 0.0);
        assert!(dest.lat > SEOUL.lat);
        assert!((dest.lng - SEOUL.lng).abs() < 1e-9);
    }

    #[test]
    fn test_direction_name_buckets() {
        assert_eq!(direction_name(0.0), "North");
        assert_eq!(direction_name(PI / 4.0), "North-East");
        assert_eq!(direction_name(PI / 2.0), "East");
        assert_eq!(direction_name(PI), "South");
        assert_eq!(direction_name(3.0 * PI / 2.0), "West");
        assert_eq!(direction_name(2.0 * PI - 0.1), "North");
        assert_eq!(direction_name(-PI / 2.0), "West");
    }

    #[test]
    fn test_interpolate_path_shape() {
        let start = Location::new(0.0, 0.0);
        let end = Location::new(0.0, 1.0);
        let path = interpolate_path(start, end, 10);

        assert_eq!(path.len(), 11);
        assert_eq!(path[0], start);
        assert_eq!(path[10], end);
        for pair in path.windows(2) {
            assert!(pair[1].lng > pair[0].lng);
        }
    }

    #[test]
    fn test_interpolate_waypoints_dedups_vertices() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(0.0, 1.0);
        let c = Location::new(1.0, 1.0);
        let path = interpolate_waypoints(&[a, b, c], 4);

        assert_eq!(path.len(), 9);
        assert_eq!(path[0], a);
        assert_eq!(path[4], b);
        assert_eq!(path[8], c);
    }

    #[test]
    fn test_interpolate_waypoints_single_point() {
        let a = Location::new(1.0, 2.0);
        assert_eq!(interpolate_waypoints(&[a], 4), vec![a]);
        assert!(interpolate_waypoints(&[], 4).is_empty());
    }

    #[test]
    fn test_path_length_sums_segments() {
        let path = interpolate_path(Location::new(0.0, 0.0), Location::new(0.0, 1.0), 10);
        let total = path_length_m(&path);
        let direct = distance(path[0], path[10]);
        assert!((total - direct).abs() < 1.0);
    }
}
