// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Roads API client (snap-to-roads).

use super::{check_response_json, http_client, RoutedPath, RoutingError, TravelMode};
use crate::geo_utils::path_length_m;
use crate::models::Location;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://roads.googleapis.com/v1";
/// snapToRoads accepts at most 100 points per request.
const MAX_POINTS_PER_REQUEST: usize = 100;

/// Google Roads API client.
#[derive(Clone)]
pub struct GoogleRoadsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleRoadsClient {
    pub fn new(api_key: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client(super::DEFAULT_HTTP_TIMEOUT, "fitcourse")?,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Snap a raw path onto roads, interpolating along the road geometry.
    pub async fn snap_to_roads(
        &self,
        path: &[Location],
        mode: TravelMode,
    ) -> Result<RoutedPath, RoutingError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(RoutingError::MissingApiKey("Google Maps"))?;

        if path.is_empty() {
            return Err(RoutingError::NoRoute);
        }

        let mut snapped = Vec::with_capacity(path.len());
        for chunk in path.chunks(MAX_POINTS_PER_REQUEST) {
            snapped.extend(self.snap_chunk(chunk, key).await?);
        }
        snapped.dedup();

        if snapped.is_empty() {
            return Err(RoutingError::NoRoute);
        }

        let distance_m = path_length_m(&snapped);
        Ok(RoutedPath {
            duration_s: distance_m / mode.fallback_speed_mps(),
            steps: 0,
            distance_m,
            path: snapped,
            is_real_road: true,
        })
    }

    /// Snap, or return the input unchanged (flagged as not on a road) on failure.
    pub async fn snap_or_fallback(&self, path: &[Location], mode: TravelMode) -> RoutedPath {
        match self.snap_to_roads(path, mode).await {
            Ok(snapped) => snapped,
            Err(e) => {
                tracing::warn!(error = %e, points = path.len(), "Snap to roads failed; keeping raw path");
                let distance_m = path_length_m(path);
                RoutedPath {
                    path: path.to_vec(),
                    distance_m,
                    duration_s: distance_m / mode.fallback_speed_mps(),
                    steps: 0,
                    is_real_road: false,
                }
            }
        }
    }

    async fn snap_chunk(&self, chunk: &[Location], key: &str) -> Result<Vec<Location>, RoutingError> {
        let path_param: Vec<String> = chunk.iter().map(Location::to_query_param).collect();
        let url = format!("{}/snapToRoads", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("path", path_param.join("|")),
                ("interpolate", "true".to_string()),
                ("key", key.to_string()),
            ])
            .send()
            .await?;

        let body: SnapResponse = check_response_json(response).await?;
        Ok(body.into_locations())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapResponse {
    #[serde(default)]
    snapped_points: Vec<SnappedPoint>,
}

#[derive(Debug, Deserialize)]
struct SnappedPoint {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

impl SnapResponse {
    fn into_locations(self) -> Vec<Location> {
        self.snapped_points
            .into_iter()
            .map(|p| Location::new(p.location.latitude, p.location.longitude))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_response_parsing() {
        let body: SnapResponse = serde_json::from_value(serde_json::json!({
            "snappedPoints": [
                { "location": { "latitude": 37.5, "longitude": 127.0 }, "originalIndex": 0, "placeId": "a" },
                { "location": { "latitude": 37.6, "longitude": 127.1 }, "placeId": "b" }
            ]
        }))
        .unwrap();

        let locations = body.into_locations();
        assert_eq!(
            locations,
            vec![Location::new(37.5, 127.0), Location::new(37.6, 127.1)]
        );
    }

    #[test]
    fn test_empty_response_parses() {
        let body: SnapResponse = serde_json::from_str("{}").unwrap();
        assert!(body.into_locations().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_keeps_raw_path() {
        let client = GoogleRoadsClient::new(None).unwrap();
        let raw = vec![Location::new(0.0, 0.0), Location::new(0.0, 0.01)];

        let result = client.snap_or_fallback(&raw, TravelMode::Walking).await;

        assert_eq!(result.path, raw);
        assert!(!result.is_real_road);
        assert!(result.distance_m > 1000.0);
    }
}
