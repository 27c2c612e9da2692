// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Completed workout records.

use crate::models::{ActivityType, Location};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Workout result stored in Firestore.
///
/// Stored at: `workouts/{uid}_{timestamp_ms}`. Written once when a tracking
/// session stops and never updated afterwards. Field names are camelCase so
/// documents written by the web client stay readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutResult {
    /// Firebase uid of the owner
    pub user_id: String,
    #[serde(default)]
    pub activity_type: ActivityType,
    /// Distance in kilometers
    #[serde(rename = "distance")]
    pub distance_km: f64,
    /// Moving time in seconds
    #[serde(rename = "time")]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub time_seconds: u64,
    pub calories: f64,
    #[serde(rename = "avgSpeed")]
    pub avg_speed_kmh: f64,
    pub route: Vec<Location>,
    #[serde(default)]
    pub achievements: Vec<String>,
    /// When the workout finished (RFC 3339)
    pub timestamp: String,
}

impl WorkoutResult {
    /// Firestore document ID for this workout.
    pub fn document_id(&self, finished_at_ms: i64) -> String {
        format!("{}_{}", urlencoding::encode(&self.user_id), finished_at_ms)
    }
}
