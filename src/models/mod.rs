// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod course;
pub mod location;
pub mod user;
pub mod workout;

pub use course::{ActivityType, Course, CourseTier, Difficulty};
pub use location::{Location, TimedLocation};
pub use user::{FitnessLevel, Gender, ProfileUpdate, UserProfile};
pub use workout::WorkoutResult;
