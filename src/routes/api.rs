// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users: profile and workout history.

use crate::db::firestore::MAX_WORKOUT_PAGE;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ProfileUpdate, UserProfile, WorkoutResult};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via Firebase ID token).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profile", get(get_profile).put(update_profile))
        .route("/api/workouts", get(list_workouts))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user's profile, created with defaults on first access.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let profile = state
        .db
        .get_or_create_profile(&user.uid, user.name.as_deref(), user.email.as_deref())
        .await?;
    Ok(Json(profile))
}

/// Save the profile form.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>> {
    update
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut profile = state
        .db
        .get_or_create_profile(&user.uid, user.name.as_deref(), user.email.as_deref())
        .await?;
    profile.apply_update(update, &format_utc_rfc3339(chrono::Utc::now()));
    state.db.upsert_user_profile(&user.uid, &profile).await?;

    tracing::info!(uid = %user.uid, "Profile updated");
    Ok(Json(profile))
}

// ─── Workouts ────────────────────────────────────────────────

/// Query parameters for workout history.
#[derive(Debug, Deserialize)]
pub struct WorkoutsQuery {
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    20
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutsResponse {
    pub workouts: Vec<WorkoutResult>,
    pub limit: u32,
}

/// Most recent workouts, newest first.
async fn list_workouts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<WorkoutsQuery>,
) -> Result<Json<WorkoutsResponse>> {
    if params.limit == 0 || params.limit > MAX_WORKOUT_PAGE {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_WORKOUT_PAGE
        )));
    }

    tracing::debug!(uid = %user.uid, limit = params.limit, "Fetching workouts");
    let workouts = state.db.list_workouts(&user.uid, params.limit).await?;
    Ok(Json(WorkoutsResponse {
        workouts,
        limit: params.limit,
    }))
}
