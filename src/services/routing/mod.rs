// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Vendor routing and geocoding adapters.
//!
//! Every adapter normalizes its vendor response into a [`RoutedPath`].
//! `fetch_route` only ever reports what the vendor said; the silent
//! degradation to an interpolated path lives in [`route_or_fallback`] so that
//! callers that need to know whether the vendor answered (course scoring) can
//! still tell.

pub mod google_directions;
pub mod google_roads;
pub mod kakao;
pub mod osm;

pub use google_directions::GoogleDirectionsClient;
pub use google_roads::GoogleRoadsClient;
pub use kakao::KakaoLocalClient;
pub use osm::OsmClient;

use crate::config::{Config, RoutingProviderKind};
use crate::geo_utils::{interpolate_waypoints, path_length_m};
use crate::models::{ActivityType, Location};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Timeout for a single vendor HTTP request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
/// Segments per leg when interpolating a fallback path.
pub const FALLBACK_STEPS_PER_SEGMENT: usize = 10;

/// Travel mode passed to routing vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Walking,
    Bicycling,
}

impl TravelMode {
    /// Google `mode` query value.
    pub fn as_google_str(self) -> &'static str {
        match self {
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
        }
    }

    /// Speed assumed when a vendor gives no duration (m/s).
    pub fn fallback_speed_mps(self) -> f64 {
        match self {
            TravelMode::Walking => 6.0 / 3.6,
            TravelMode::Bicycling => 15.0 / 3.6,
        }
    }
}

impl From<ActivityType> for TravelMode {
    fn from(activity: ActivityType) -> Self {
        match activity {
            ActivityType::Running => TravelMode::Walking,
            ActivityType::Cycling => TravelMode::Bicycling,
        }
    }
}

/// A route query: origin, optional intermediate waypoints, destination.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub origin: Location,
    pub destination: Location,
    pub waypoints: Vec<Location>,
    pub mode: TravelMode,
}

impl RouteRequest {
    pub fn new(origin: Location, destination: Location, mode: TravelMode) -> Self {
        Self {
            origin,
            destination,
            waypoints: Vec::new(),
            mode,
        }
    }

    /// Out-and-back route from `center` through `turnaround`.
    pub fn round_trip(center: Location, turnaround: Location, mode: TravelMode) -> Self {
        Self {
            origin: center,
            destination: center,
            waypoints: vec![turnaround],
            mode,
        }
    }

    /// Origin, waypoints and destination in travel order.
    pub fn stops(&self) -> Vec<Location> {
        let mut stops = Vec::with_capacity(self.waypoints.len() + 2);
        stops.push(self.origin);
        stops.extend(self.waypoints.iter().copied());
        stops.push(self.destination);
        stops
    }
}

/// Normalized route geometry returned by every adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RoutedPath {
    pub path: Vec<Location>,
    pub distance_m: f64,
    pub duration_s: f64,
    /// Number of turn-by-turn steps (or distinct roads) in the route
    pub steps: u32,
    /// False when the geometry was interpolated locally instead of coming
    /// from road data.
    pub is_real_road: bool,
}

impl RoutedPath {
    /// Locally interpolated path through `stops`, used when a vendor fails.
    pub fn interpolated(stops: &[Location], mode: TravelMode) -> Self {
        let path = interpolate_waypoints(stops, FALLBACK_STEPS_PER_SEGMENT);
        let distance_m = path_length_m(&path);
        Self {
            duration_s: distance_m / mode.fallback_speed_mps(),
            steps: stops.len().saturating_sub(1) as u32,
            distance_m,
            path,
            is_real_road: false,
        }
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }
}

/// Errors from vendor adapters.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("{0} API key is not configured")]
    MissingApiKey(&'static str),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("API returned status {status}: {message}")]
    Status { status: String, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("No route found")]
    NoRoute,

    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),
}

impl From<reqwest::Error> for RoutingError {
    fn from(err: reqwest::Error) -> Self {
        RoutingError::Http(err.to_string())
    }
}

/// A vendor that can produce road geometry between locations.
pub trait RouteProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Ask the vendor for a route. Never falls back.
    fn fetch_route(
        &self,
        request: &RouteRequest,
    ) -> impl Future<Output = Result<RoutedPath, RoutingError>> + Send;

    /// Elevation in meters sampled along `path`.
    fn elevation_profile(
        &self,
        path: &[Location],
    ) -> impl Future<Output = Result<Vec<f64>, RoutingError>> + Send {
        let _ = path;
        async { Err(RoutingError::Unsupported("elevation")) }
    }
}

/// Route via `provider`, degrading to an interpolated path on any failure.
pub async fn route_or_fallback<P: RouteProvider>(provider: &P, request: &RouteRequest) -> RoutedPath {
    match provider.fetch_route(request).await {
        Ok(route) => route,
        Err(e) => {
            tracing::warn!(
                provider = provider.name(),
                error = %e,
                "Routing failed; using interpolated path"
            );
            RoutedPath::interpolated(&request.stops(), request.mode)
        }
    }
}

/// Provider selected by configuration.
#[derive(Clone)]
pub enum RoutingBackend {
    Google(GoogleDirectionsClient),
    Osm(OsmClient),
}

impl RoutingBackend {
    /// Build the configured provider. The OSM client is shared with the
    /// geocoding endpoints so both go through one rate limiter.
    pub fn from_config(config: &Config, osm: OsmClient) -> anyhow::Result<Self> {
        Ok(match config.routing_provider {
            RoutingProviderKind::Google => Self::Google(GoogleDirectionsClient::new(
                config.google_maps_api_key.clone(),
            )?),
            RoutingProviderKind::Osm => Self::Osm(osm),
        })
    }
}

impl RouteProvider for RoutingBackend {
    fn name(&self) -> &'static str {
        match self {
            RoutingBackend::Google(client) => client.name(),
            RoutingBackend::Osm(client) => client.name(),
        }
    }

    async fn fetch_route(&self, request: &RouteRequest) -> Result<RoutedPath, RoutingError> {
        match self {
            RoutingBackend::Google(client) => client.fetch_route(request).await,
            RoutingBackend::Osm(client) => client.fetch_route(request).await,
        }
    }

    async fn elevation_profile(&self, path: &[Location]) -> Result<Vec<f64>, RoutingError> {
        match self {
            RoutingBackend::Google(client) => client.elevation_profile(path).await,
            RoutingBackend::Osm(client) => client.elevation_profile(path).await,
        }
    }
}

/// Check response status and parse the JSON body.
pub(crate) async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, RoutingError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            tracing::warn!("Vendor rate limit hit (429)");
        }

        return Err(RoutingError::Status {
            status: status.as_u16().to_string(),
            message: body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| RoutingError::Parse(e.to_string()))
}

/// Build a reqwest client with the adapter timeout and User-Agent.
pub(crate) fn http_client(timeout: Duration, user_agent: &str) -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;

    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .context("failed building vendor HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingProvider;

    impl RouteProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch_route(&self, _request: &RouteRequest) -> Result<RoutedPath, RoutingError> {
            Err(RoutingError::Http("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_fallback_is_flagged_and_spans_stops() {
        let center = Location::new(37.5665, 126.978);
        let turn = Location::new(37.5765, 126.978);
        let request = RouteRequest::round_trip(center, turn, TravelMode::Walking);

        let route = route_or_fallback(&FailingProvider, &request).await;

        assert!(!route.is_real_road);
        assert_eq!(route.path.first(), Some(&center));
        assert_eq!(route.path.last(), Some(&center));
        assert!(route.path.contains(&turn));
        assert_eq!(route.path.len(), 2 * FALLBACK_STEPS_PER_SEGMENT + 1);
        // ~1.1 km each way
        assert!((route.distance_m - 2224.0).abs() < 20.0, "{}", route.distance_m);
        assert!(route.duration_s > 0.0);
    }

    #[tokio::test]
    async fn test_default_elevation_is_unsupported() {
        let result = FailingProvider.elevation_profile(&[]).await;
        assert!(matches!(result, Err(RoutingError::Unsupported(_))));
    }

    #[test]
    fn test_request_stops_order() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(1.0, 1.0);
        let request = RouteRequest::round_trip(a, b, TravelMode::Bicycling);
        assert_eq!(request.stops(), vec![a, b, a]);
    }

    #[test]
    fn test_travel_mode_from_activity() {
        assert_eq!(TravelMode::from(ActivityType::Running), TravelMode::Walking);
        assert_eq!(TravelMode::from(ActivityType::Cycling), TravelMode::Bicycling);
    }
}
