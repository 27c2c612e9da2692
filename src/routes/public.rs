// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Routes available before sign-in (map bootstrap).

use crate::services::geolocation::{resolve_location, GeolocationReport, ResolvedLocation};
use crate::services::MapSdkConfig;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/map-config", get(map_config))
        .route("/api/location/resolve", post(resolve))
}

/// Map SDK script URLs for the configured vendors.
async fn map_config(State(state): State<Arc<AppState>>) -> Json<MapSdkConfig> {
    Json(state.map_sdk.clone())
}

/// Turn a browser geolocation result into a map center.
async fn resolve(Json(report): Json<GeolocationReport>) -> Json<ResolvedLocation> {
    Json(resolve_location(report.location, report.error_code))
}
