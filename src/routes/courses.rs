// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Course generation, road snapping and geocoding routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityType, Course, Location};
use crate::services::routing::kakao::KakaoPlace;
use crate::services::routing::osm::GeocodedPlace;
use crate::services::routing::{route_or_fallback, RouteRequest, RoutedPath, TravelMode};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Distances offered when the client does not choose.
const DEFAULT_DISTANCES_KM: [f64; 3] = [3.0, 5.0, 8.0];
const MIN_DISTANCE_KM: f64 = 0.5;
const MAX_DISTANCE_KM: f64 = 50.0;
const MAX_SNAP_POINTS: usize = 1000;
/// Google Directions accepts at most 25 intermediate waypoints.
const MAX_WAYPOINTS: usize = 25;
const DEFAULT_SEARCH_LIMIT: u32 = 5;
const DEFAULT_NEARBY_RADIUS_M: u32 = 2000;

/// Course routes (require authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/courses/generate", post(generate_courses))
        .route("/api/courses/generate/geojson", post(generate_courses_geojson))
        .route("/api/routes/directions", post(directions))
        .route("/api/roads/snap", post(snap_to_roads))
        .route("/api/geocode/reverse", get(reverse_geocode))
        .route("/api/geocode/search", get(search_places))
        .route("/api/places/nearby", get(nearby_places))
}

fn default_distances() -> Vec<f64> {
    DEFAULT_DISTANCES_KM.to_vec()
}

fn require_valid_location(location: &Location) -> Result<()> {
    if location.is_valid() {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Coordinates must be finite and within WGS84 bounds".to_string(),
        ))
    }
}

// ─── Course Generation ───────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCoursesRequest {
    pub center: Location,
    #[serde(default = "default_distances")]
    #[validate(length(min = 1, max = 5))]
    pub distances_km: Vec<f64>,
    #[serde(default)]
    pub activity_type: ActivityType,
}

impl GenerateCoursesRequest {
    fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        require_valid_location(&self.center)?;
        if let Some(bad) = self
            .distances_km
            .iter()
            .find(|d| !(MIN_DISTANCE_KM..=MAX_DISTANCE_KM).contains(*d))
        {
            return Err(AppError::BadRequest(format!(
                "Distance {} km is outside {}..{} km",
                bad, MIN_DISTANCE_KM, MAX_DISTANCE_KM
            )));
        }
        Ok(())
    }
}

async fn run_generation(
    state: &AppState,
    user: &AuthUser,
    request: &GenerateCoursesRequest,
) -> Result<Vec<Course>> {
    request.check()?;

    tracing::info!(
        uid = %user.uid,
        lat = request.center.lat,
        lng = request.center.lng,
        distances = ?request.distances_km,
        activity = request.activity_type.as_str(),
        "Generating courses"
    );

    Ok(state
        .course_service
        .generate_courses(request.center, &request.distances_km, request.activity_type)
        .await)
}

/// Best course per requested distance. An empty list means no vendor route
/// could be produced.
async fn generate_courses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<GenerateCoursesRequest>,
) -> Result<Json<Vec<Course>>> {
    Ok(Json(run_generation(&state, &user, &request).await?))
}

/// Same as [`generate_courses`], as a GeoJSON FeatureCollection.
async fn generate_courses_geojson(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<GenerateCoursesRequest>,
) -> Result<Json<geojson::FeatureCollection>> {
    let courses = run_generation(&state, &user, &request).await?;
    Ok(Json(geojson::FeatureCollection {
        bbox: None,
        features: courses.iter().map(Course::to_geojson_feature).collect(),
        foreign_members: None,
    }))
}

// ─── Directions ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionsRequest {
    pub origin: Location,
    pub destination: Location,
    #[serde(default)]
    pub waypoints: Vec<Location>,
    #[serde(default)]
    pub activity_type: ActivityType,
}

/// Route between points. Falls back to a straight interpolated path
/// (`isRealRoad: false`) when the provider cannot answer.
async fn directions(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DirectionsRequest>,
) -> Result<Json<RoutedPath>> {
    if request.waypoints.len() > MAX_WAYPOINTS {
        return Err(AppError::BadRequest(format!(
            "At most {} waypoints are allowed",
            MAX_WAYPOINTS
        )));
    }
    require_valid_location(&request.origin)?;
    require_valid_location(&request.destination)?;
    request.waypoints.iter().try_for_each(require_valid_location)?;

    let route_request = RouteRequest {
        origin: request.origin,
        destination: request.destination,
        waypoints: request.waypoints,
        mode: TravelMode::from(request.activity_type),
    };
    let provider = state.course_service.provider();
    Ok(Json(route_or_fallback(provider, &route_request).await))
}

// ─── Roads ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapRequest {
    pub path: Vec<Location>,
    #[serde(default)]
    pub activity_type: ActivityType,
}

/// Snap a recorded path to roads, returning it unchanged if snapping fails.
async fn snap_to_roads(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SnapRequest>,
) -> Result<Json<RoutedPath>> {
    if request.path.is_empty() || request.path.len() > MAX_SNAP_POINTS {
        return Err(AppError::BadRequest(format!(
            "Path must contain 1..={} points",
            MAX_SNAP_POINTS
        )));
    }
    request.path.iter().try_for_each(require_valid_location)?;

    let mode = TravelMode::from(request.activity_type);
    Ok(Json(state.roads.snap_or_fallback(&request.path, mode).await))
}

// ─── Geocoding ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct ReverseResponse {
    pub address: Option<String>,
    pub source: &'static str,
}

/// Address for a coordinate. Kakao is preferred (Korean road addresses);
/// Nominatim answers when Kakao is unavailable or has no result.
async fn reverse_geocode(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReverseQuery>,
) -> Result<Json<ReverseResponse>> {
    let location = Location::new(query.lat, query.lng);
    require_valid_location(&location)?;

    if state.kakao.is_configured() {
        match state.kakao.coord_to_address(location).await {
            Ok(Some(address)) => {
                return Ok(Json(ReverseResponse {
                    address: Some(address),
                    source: "kakao",
                }))
            }
            Ok(None) => tracing::debug!("Kakao returned no address; trying Nominatim"),
            Err(e) => tracing::warn!(error = %e, "Kakao reverse geocoding failed"),
        }
    }

    let address = state.osm.reverse(location).await?;
    Ok(Json(ReverseResponse {
        address,
        source: "nominatim",
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchQuery {
    #[validate(length(min = 1, max = 200))]
    pub q: String,
    #[validate(range(min = 1, max = 20))]
    pub limit: Option<u32>,
}

/// Free-text place search via Nominatim.
async fn search_places(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<GeocodedPlace>>> {
    query
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let places = state
        .osm
        .search(query.q.trim(), query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
        .await?;
    Ok(Json(places))
}

#[derive(Debug, Deserialize, Validate)]
pub struct NearbyQuery {
    #[validate(length(min = 1, max = 100))]
    pub q: String,
    pub lat: f64,
    pub lng: f64,
    #[validate(range(min = 1, max = 20000))]
    pub radius: Option<u32>,
}

/// Keyword search around a point via Kakao Local.
async fn nearby_places(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<KakaoPlace>>> {
    query
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let center = Location::new(query.lat, query.lng);
    require_valid_location(&center)?;

    let places = state
        .kakao
        .search_keyword(
            query.q.trim(),
            center,
            query.radius.unwrap_or(DEFAULT_NEARBY_RADIUS_M),
        )
        .await?;
    Ok(Json(places))
}
