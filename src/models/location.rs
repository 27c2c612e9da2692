// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! WGS84 locations and timestamped GPS fixes.

use chrono::{DateTime, Utc};
use geo::{Coord, Point};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A WGS84 coordinate as the SPA and Firestore documents carry it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// `lat,lng` as expected by Google query parameters.
    pub fn to_query_param(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

impl From<Location> for Point<f64> {
    fn from(loc: Location) -> Self {
        Point::new(loc.lng, loc.lat)
    }
}

impl From<Point<f64>> for Location {
    fn from(p: Point<f64>) -> Self {
        Self::new(p.y(), p.x())
    }
}

impl From<Location> for Coord<f64> {
    fn from(loc: Location) -> Self {
        Coord {
            x: loc.lng,
            y: loc.lat,
        }
    }
}

impl From<Coord<f64>> for Location {
    fn from(c: Coord<f64>) -> Self {
        Self::new(c.y, c.x)
    }
}

/// A single position sample reported by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TimedLocation {
    #[serde(flatten)]
    pub location: Location,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub timestamp: DateTime<Utc>,
    /// Reported horizontal accuracy in meters
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}
