// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Directions and Elevation API client.

use super::{check_response_json, http_client, RouteProvider, RouteRequest, RoutedPath, RoutingError};
use crate::models::Location;
use geo::Coord;
use serde::de::IgnoredAny;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
/// Maximum samples the Elevation API accepts per request.
const MAX_ELEVATION_SAMPLES: usize = 512;

/// Google Maps Platform client for Directions and Elevation.
#[derive(Clone)]
pub struct GoogleDirectionsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleDirectionsClient {
    /// Create a client. A missing key is allowed; every call then fails with
    /// [`RoutingError::MissingApiKey`].
    pub fn new(api_key: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client(super::DEFAULT_HTTP_TIMEOUT, "fitcourse")?,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        })
    }

    /// Point the client at a different endpoint (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn api_key(&self) -> Result<&str, RoutingError> {
        self.api_key
            .as_deref()
            .ok_or(RoutingError::MissingApiKey("Google Maps"))
    }

    /// Request directions and normalize the first route.
    pub async fn directions(&self, request: &RouteRequest) -> Result<RoutedPath, RoutingError> {
        let key = self.api_key()?;
        let url = format!("{}/directions/json", self.base_url);

        let mut query = vec![
            ("origin", request.origin.to_query_param()),
            ("destination", request.destination.to_query_param()),
            ("mode", request.mode.as_google_str().to_string()),
            ("key", key.to_string()),
        ];
        if !request.waypoints.is_empty() {
            let waypoints: Vec<String> = request
                .waypoints
                .iter()
                .map(Location::to_query_param)
                .collect();
            query.push(("waypoints", waypoints.join("|")));
        }

        let response = self.http.get(&url).query(&query).send().await?;
        let body: DirectionsResponse = check_response_json(response).await?;

        body.into_routed_path()
    }

    /// Sample elevations along a path via the Elevation API.
    pub async fn elevation_along(&self, path: &[Location]) -> Result<Vec<f64>, RoutingError> {
        let key = self.api_key()?;
        if path.len() < 2 {
            return Err(RoutingError::NoRoute);
        }

        let encoded = polyline::encode_coordinates(path.iter().map(|loc| Coord::from(*loc)), 5)
            .map_err(|e| RoutingError::Parse(e.to_string()))?;
        let samples = path.len().clamp(2, MAX_ELEVATION_SAMPLES);

        let url = format!("{}/elevation/json", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("path", format!("enc:{}", encoded)),
                ("samples", samples.to_string()),
                ("key", key.to_string()),
            ])
            .send()
            .await?;

        let body: ElevationResponse = check_response_json(response).await?;
        if body.status != "OK" {
            return Err(RoutingError::Status {
                status: body.status,
                message: body.error_message.unwrap_or_default(),
            });
        }

        Ok(body.results.into_iter().map(|r| r.elevation).collect())
    }
}

impl RouteProvider for GoogleDirectionsClient {
    fn name(&self) -> &'static str {
        "google-directions"
    }

    async fn fetch_route(&self, request: &RouteRequest) -> Result<RoutedPath, RoutingError> {
        self.directions(request).await
    }

    async fn elevation_profile(&self, path: &[Location]) -> Result<Vec<f64>, RoutingError> {
        self.elevation_along(path).await
    }
}

/// Directions API response.
#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    overview_polyline: EncodedPolyline,
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct EncodedPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    distance: ValueField,
    duration: ValueField,
    #[serde(default)]
    steps: Vec<IgnoredAny>,
}

#[derive(Debug, Deserialize)]
struct ValueField {
    value: f64,
}

impl DirectionsResponse {
    fn into_routed_path(self) -> Result<RoutedPath, RoutingError> {
        if self.status != "OK" {
            return Err(RoutingError::Status {
                status: self.status,
                message: self.error_message.unwrap_or_default(),
            });
        }

        let route = self.routes.into_iter().next().ok_or(RoutingError::NoRoute)?;

        let line = polyline::decode_polyline(&route.overview_polyline.points, 5)
            .map_err(|e| RoutingError::Parse(format!("polyline: {}", e)))?;
        let path: Vec<Location> = line.0.into_iter().map(Location::from).collect();
        if path.is_empty() {
            return Err(RoutingError::NoRoute);
        }

        Ok(RoutedPath {
            path,
            distance_m: route.legs.iter().map(|l| l.distance.value).sum(),
            duration_s: route.legs.iter().map(|l| l.duration.value).sum(),
            steps: route.legs.iter().map(|l| l.steps.len() as u32).sum(),
            is_real_road: true,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<ElevationResult>,
}

#[derive(Debug, Deserialize)]
struct ElevationResult {
    elevation: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::routing::TravelMode;

    // Google's documented example polyline: (38.5,-120.2) (40.7,-120.95) (43.252,-126.453)
    const SAMPLE_POLYLINE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn parse(json: serde_json::Value) -> Result<RoutedPath, RoutingError> {
        serde_json::from_value::<DirectionsResponse>(json)
            .unwrap()
            .into_routed_path()
    }

    #[test]
    fn test_ok_response_is_normalized() {
        let route = parse(serde_json::json!({
            "status": "OK",
            "routes": [{
                "overview_polyline": { "points": SAMPLE_POLYLINE },
                "legs": [
                    { "distance": { "value": 1500, "text": "1.5 km" },
                      "duration": { "value": 900, "text": "15 mins" },
                      "steps": [{}, {}, {}] },
                    { "distance": { "value": 1400 },
                      "duration": { "value": 840 },
                      "steps": [{}, {}] }
                ]
            }]
        }))
        .unwrap();

        assert_eq!(route.path.len(), 3);
        assert!((route.path[0].lat - 38.5).abs() < 1e-6);
        assert!((route.path[0].lng + 120.2).abs() < 1e-6);
        assert_eq!(route.distance_m, 2900.0);
        assert_eq!(route.duration_s, 1740.0);
        assert_eq!(route.steps, 5);
        assert!(route.is_real_road);
    }

    #[test]
    fn test_non_ok_status_is_error() {
        let err = parse(serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "routes": []
        }))
        .unwrap_err();

        match err {
            RoutingError::Status { status, message } => {
                assert_eq!(status, "REQUEST_DENIED");
                assert!(message.contains("invalid"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_ok_without_routes_is_no_route() {
        let err = parse(serde_json::json!({ "status": "OK", "routes": [] })).unwrap_err();
        assert!(matches!(err, RoutingError::NoRoute));
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let client = GoogleDirectionsClient::new(None)
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let request = RouteRequest::new(
            Location::new(0.0, 0.0),
            Location::new(0.0, 1.0),
            TravelMode::Walking,
        );
        let err = client.fetch_route(&request).await.unwrap_err();
        assert!(matches!(err, RoutingError::MissingApiKey(_)));
    }
}
