// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model for storage and API.

use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Self-reported gender, used only for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

/// Self-assessed fitness level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum FitnessLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// User profile stored in Firestore at `users/{uid}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    pub display_name: String,
    pub email: Option<String>,
    /// Height in centimeters
    #[serde(rename = "height")]
    pub height_cm: f64,
    /// Weight in kilograms
    #[serde(rename = "weight")]
    pub weight_kg: f64,
    pub age: u32,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub fitness_level: FitnessLevel,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl UserProfile {
    /// Profile created on first login.
    pub fn with_defaults(display_name: String, email: Option<String>, now: &str) -> Self {
        Self {
            display_name,
            email,
            height_cm: 170.0,
            weight_kg: 70.0,
            age: 30,
            gender: Gender::Other,
            fitness_level: FitnessLevel::Beginner,
            goals: Vec::new(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    /// Apply a validated profile form submission.
    pub fn apply_update(&mut self, update: ProfileUpdate, now: &str) {
        self.display_name = update.display_name;
        self.height_cm = update.height;
        self.weight_kg = update.weight;
        self.age = update.age;
        self.gender = update.gender;
        self.fitness_level = update.fitness_level;
        self.goals = update.goals;
        self.updated_at = now.to_string();
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::with_defaults(String::new(), None, "")
    }
}

/// Profile form payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 50))]
    pub display_name: String,
    /// Height in centimeters
    #[validate(range(min = 50.0, max = 250.0))]
    pub height: f64,
    /// Weight in kilograms
    #[validate(range(min = 20.0, max = 300.0))]
    pub weight: f64,
    #[validate(range(min = 5, max = 120))]
    pub age: u32,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub fitness_level: FitnessLevel,
    #[serde(default)]
    #[validate(length(max = 10))]
    pub goals: Vec<String>,
}
