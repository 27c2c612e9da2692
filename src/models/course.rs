// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Generated course candidates.
//!
//! Courses are transient: they are built per generation request, returned to
//! the client and never stored.

use crate::models::Location;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Kind of workout a course is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ActivityType {
    #[default]
    Running,
    Cycling,
}

impl ActivityType {
    /// Nominal speed used for course time estimates (km/h).
    pub fn nominal_speed_kmh(self) -> f64 {
        match self {
            ActivityType::Running => 6.0,
            ActivityType::Cycling => 15.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Running => "running",
            ActivityType::Cycling => "cycling",
        }
    }
}

/// Difficulty tier of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Difficulty implied by a target distance.
    pub fn for_distance_km(distance_km: f64) -> Self {
        if distance_km <= 3.0 {
            Difficulty::Beginner
        } else if distance_km <= 6.0 {
            Difficulty::Intermediate
        } else {
            Difficulty::Advanced
        }
    }

    /// Map stroke color used by the client.
    pub fn color(self) -> &'static str {
        match self {
            Difficulty::Beginner => "#4CAF50",
            Difficulty::Intermediate => "#FF9800",
            Difficulty::Advanced => "#F44336",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

/// A target distance bucket for which one best course is selected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourseTier {
    pub index: usize,
    pub distance_km: f64,
    pub difficulty: Difficulty,
}

impl CourseTier {
    pub fn new(index: usize, distance_km: f64) -> Self {
        Self {
            index,
            distance_km,
            difficulty: Difficulty::for_distance_km(distance_km),
        }
    }
}

/// A proposed route offered to the user before selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Course {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub difficulty: Difficulty,
    pub distance_km: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub estimated_time_sec: u64,
    pub elevation_gain_m: f64,
    pub coordinates: Vec<Location>,
    pub color: String,
    pub features: BTreeSet<String>,
    pub is_real_road: bool,
}

impl Course {
    /// Render the course as a GeoJSON LineString feature.
    pub fn to_geojson_feature(&self) -> geojson::Feature {
        let line: Vec<Vec<f64>> = self
            .coordinates
            .iter()
            .map(|loc| vec![loc.lng, loc.lat])
            .collect();

        let mut properties = geojson::JsonObject::new();
        properties.insert("name".to_string(), self.name.clone().into());
        properties.insert("type".to_string(), self.activity_type.as_str().into());
        properties.insert("difficulty".to_string(), self.difficulty.as_str().into());
        properties.insert("distanceKm".to_string(), self.distance_km.into());
        properties.insert(
            "estimatedTimeSec".to_string(),
            self.estimated_time_sec.into(),
        );
        properties.insert("elevationGainM".to_string(), self.elevation_gain_m.into());
        properties.insert("color".to_string(), self.color.clone().into());
        properties.insert("isRealRoad".to_string(), self.is_real_road.into());
        properties.insert(
            "features".to_string(),
            serde_json::Value::from(self.features.iter().cloned().collect::<Vec<_>>()),
        );

        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::LineString(line))),
            id: Some(geojson::feature::Id::String(self.id.clone())),
            properties: Some(properties),
            foreign_members: None,
        }
    }
}
