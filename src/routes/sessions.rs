// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live tracking session routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityType, TimedLocation, UserProfile, WorkoutResult};
use crate::services::tracking::{SampleOutcome, SessionSnapshot};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Session routes (require authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sessions/start", post(start_session))
        .route("/api/sessions/sample", post(record_sample))
        .route("/api/sessions/pause", post(pause_session))
        .route("/api/sessions/resume", post(resume_session))
        .route("/api/sessions/stop", post(stop_session))
        .route("/api/sessions/current", get(current_session))
}

/// Profile used for live metrics.
///
/// Live metrics should not fail because Firestore is unavailable, so a read
/// error falls back to default body measurements.
async fn metrics_profile(state: &AppState, user: &AuthUser) -> UserProfile {
    match state.db.get_user_profile(&user.uid).await {
        Ok(Some(profile)) => profile,
        Ok(None) => UserProfile::default(),
        Err(e) => {
            tracing::warn!(uid = %user.uid, error = %e, "Profile unavailable; using defaults");
            UserProfile::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    #[serde(default)]
    pub activity_type: ActivityType,
}

async fn start_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<StartRequest>,
) -> Result<Json<SessionSnapshot>> {
    let profile = metrics_profile(&state, &user).await;
    let snapshot = state
        .tracking
        .start(&user.uid, request.activity_type, &profile)?;
    Ok(Json(snapshot))
}

async fn record_sample(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(sample): Json<TimedLocation>,
) -> Result<Json<SampleOutcome>> {
    if !sample.location.is_valid() {
        return Err(AppError::BadRequest(
            "Coordinates must be finite and within WGS84 bounds".to_string(),
        ));
    }
    Ok(Json(state.tracking.record_sample(&user.uid, sample).await?))
}

async fn pause_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SessionSnapshot>> {
    let profile = metrics_profile(&state, &user).await;
    Ok(Json(state.tracking.pause(&user.uid, &profile).await?))
}

async fn resume_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SessionSnapshot>> {
    let profile = metrics_profile(&state, &user).await;
    Ok(Json(state.tracking.resume(&user.uid, &profile).await?))
}

async fn current_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SessionSnapshot>> {
    let profile = metrics_profile(&state, &user).await;
    Ok(Json(state.tracking.snapshot(&user.uid, &profile).await?))
}

/// Stop tracking and store the workout.
async fn stop_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WorkoutResult>> {
    let profile = metrics_profile(&state, &user).await;
    let workout = state.tracking.finish(&user.uid, &profile, &state.db).await?;
    Ok(Json(workout))
}
