// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OpenStreetMap adapters: Nominatim geocoding and Overpass road data.
//!
//! Both endpoints are public and ask clients to identify themselves and to
//! keep request rates low. Each client instance owns its rate limiters;
//! clones share them.

use super::{
    check_response_json, http_client, RouteProvider, RouteRequest, RoutedPath, RoutingError,
    FALLBACK_STEPS_PER_SEGMENT,
};
use crate::geo_utils::{distance, interpolate_waypoints, path_length_m};
use crate::models::Location;
use crate::services::RateLimiter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
/// Minimum gap between Overpass calls.
pub const OVERPASS_MIN_INTERVAL: Duration = Duration::from_secs(2);
/// Nominatim usage policy: at most one request per second.
pub const NOMINATIM_MIN_INTERVAL: Duration = Duration::from_secs(1);
/// Server-side Overpass query timeout (seconds).
const OVERPASS_QUERY_TIMEOUT_SECS: u32 = 25;
/// Client-side timeout; must exceed the server-side query timeout.
const OVERPASS_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// A fallback point snaps only to road nodes closer than this.
const SNAP_RADIUS_M: f64 = 50.0;
/// Bounding-box padding around the requested route (degrees, ~500 m).
const BBOX_PADDING_DEG: f64 = 0.005;
/// Largest box diagonal sent to Overpass. Longer routes are left to the
/// caller's fallback rather than downloading a region's road network.
pub const MAX_ROUTE_SPAN_M: f64 = 25_000.0;
/// Highway classes usable on foot or by bike.
const HIGHWAY_FILTER: &str = "^(footway|path|pedestrian|cycleway|living_street|residential|service|track|unclassified|tertiary|secondary|steps)$";

/// A geocoding hit from Nominatim.
#[derive(Debug, Clone, Serialize)]
pub struct GeocodedPlace {
    pub name: String,
    pub location: Location,
}

/// A road way returned by Overpass.
#[derive(Debug, Clone)]
pub struct RoadWay {
    pub id: u64,
    pub name: Option<String>,
    pub highway: String,
    pub geometry: Vec<Location>,
}

/// South-west / north-east bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Smallest box covering `points`, grown by `padding_deg` on every side.
    pub fn around(points: &[Location], padding_deg: f64) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            south: first.lat,
            west: first.lng,
            north: first.lat,
            east: first.lng,
        };
        let bbox = points.iter().fold(init, |b, p| Self {
            south: b.south.min(p.lat),
            west: b.west.min(p.lng),
            north: b.north.max(p.lat),
            east: b.east.max(p.lng),
        });
        Some(Self {
            south: bbox.south - padding_deg,
            west: bbox.west - padding_deg,
            north: bbox.north + padding_deg,
            east: bbox.east + padding_deg,
        })
    }

    /// South-west to north-east corner distance in meters.
    pub fn diagonal_m(&self) -> f64 {
        distance(
            Location::new(self.south, self.west),
            Location::new(self.north, self.east),
        )
    }
}

/// Nominatim + Overpass client.
#[derive(Clone)]
pub struct OsmClient {
    http: reqwest::Client,
    overpass_http: reqwest::Client,
    nominatim_url: String,
    overpass_url: String,
    overpass_limiter: Arc<RateLimiter>,
    nominatim_limiter: Arc<RateLimiter>,
}

impl OsmClient {
    pub fn new(user_agent: &str) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client(super::DEFAULT_HTTP_TIMEOUT, user_agent)?,
            overpass_http: http_client(OVERPASS_HTTP_TIMEOUT, user_agent)?,
            nominatim_url: DEFAULT_NOMINATIM_URL.to_string(),
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            overpass_limiter: Arc::new(RateLimiter::new(OVERPASS_MIN_INTERVAL)),
            nominatim_limiter: Arc::new(RateLimiter::new(NOMINATIM_MIN_INTERVAL)),
        })
    }

    pub fn with_nominatim_url(mut self, url: impl Into<String>) -> Self {
        self.nominatim_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_overpass_url(mut self, url: impl Into<String>) -> Self {
        self.overpass_url = url.into();
        self
    }

    // ─── Nominatim ───────────────────────────────────────────────

    /// Forward geocode free text.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<GeocodedPlace>, RoutingError> {
        self.nominatim_limiter.await_slot().await;

        let url = format!("{}/search", self.nominatim_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("q", query.to_string()),
                ("format", "jsonv2".to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;

        let hits: Vec<NominatimPlace> = check_response_json(response).await?;
        Ok(hits.into_iter().filter_map(NominatimPlace::into_place).collect())
    }

    /// Reverse geocode a location to a display name.
    pub async fn reverse(&self, location: Location) -> Result<Option<String>, RoutingError> {
        self.nominatim_limiter.await_slot().await;

        let url = format!("{}/reverse", self.nominatim_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", location.lat.to_string()),
                ("lon", location.lng.to_string()),
                ("format", "jsonv2".to_string()),
            ])
            .send()
            .await?;

        let body: NominatimReverse = check_response_json(response).await?;
        if let Some(error) = body.error {
            tracing::debug!(error = %error, "Nominatim reverse returned no result");
            return Ok(None);
        }
        Ok(body.display_name)
    }

    // ─── Overpass ────────────────────────────────────────────────

    /// Fetch walkable/rideable road ways inside a bounding box.
    pub async fn roads_in(&self, bbox: BoundingBox) -> Result<Vec<RoadWay>, RoutingError> {
        self.overpass_limiter.await_slot().await;

        let query = overpass_road_query(bbox);
        tracing::debug!(?bbox, "Querying Overpass for roads");

        let response = self
            .overpass_http
            .post(&self.overpass_url)
            .form(&[("data", query)])
            .send()
            .await?;

        let body: OverpassResponse = check_response_json(response).await?;
        Ok(body.into_roads())
    }
}

impl RouteProvider for OsmClient {
    fn name(&self) -> &'static str {
        "osm-overpass"
    }

    /// Interpolate the requested legs and snap each point to the nearest
    /// road node. Fails when less than half of the points land on a road.
    async fn fetch_route(&self, request: &RouteRequest) -> Result<RoutedPath, RoutingError> {
        let stops = request.stops();
        let raw = interpolate_waypoints(&stops, FALLBACK_STEPS_PER_SEGMENT * 2);
        let bbox = BoundingBox::around(&raw, BBOX_PADDING_DEG).ok_or(RoutingError::NoRoute)?;
        let span_m = bbox.diagonal_m();
        if span_m > MAX_ROUTE_SPAN_M {
            tracing::debug!(span_m, "Route area too large for Overpass");
            return Err(RoutingError::NoRoute);
        }

        let roads = self.roads_in(bbox).await?;
        if roads.is_empty() {
            return Err(RoutingError::NoRoute);
        }

        let snapped = snap_to_ways(&raw, &roads, SNAP_RADIUS_M);
        if snapped.snapped_points * 2 < raw.len() {
            tracing::debug!(
                snapped = snapped.snapped_points,
                total = raw.len(),
                "Too few points near OSM roads"
            );
            return Err(RoutingError::NoRoute);
        }

        let distance_m = path_length_m(&snapped.path);
        Ok(RoutedPath {
            duration_s: distance_m / request.mode.fallback_speed_mps(),
            distance_m,
            path: snapped.path,
            steps: snapped.way_changes,
            is_real_road: true,
        })
    }
}

fn overpass_road_query(bbox: BoundingBox) -> String {
    format!(
        "[out:json][timeout:{}];way[\"highway\"~\"{}\"]({},{},{},{});out geom;",
        OVERPASS_QUERY_TIMEOUT_SECS, HIGHWAY_FILTER, bbox.south, bbox.west, bbox.north, bbox.east
    )
}

/// Outcome of snapping an interpolated path onto OSM ways.
#[derive(Debug)]
struct SnappedPath {
    path: Vec<Location>,
    snapped_points: usize,
    /// Times the nearest way changed along the path
    way_changes: u32,
}

fn snap_to_ways(raw: &[Location], roads: &[RoadWay], radius_m: f64) -> SnappedPath {
    let mut path = Vec::with_capacity(raw.len());
    let mut snapped_points = 0;
    let mut way_changes = 0;
    let mut current_way: Option<u64> = None;

    for point in raw {
        let nearest = roads
            .iter()
            .flat_map(|way| way.geometry.iter().map(move |node| (way.id, *node)))
            .map(|(way_id, node)| (way_id, node, distance(*point, node)))
            .filter(|(_, _, d)| *d <= radius_m)
            .min_by(|a, b| a.2.total_cmp(&b.2));

        match nearest {
            Some((way_id, node, _)) => {
                snapped_points += 1;
                if current_way.is_some_and(|w| w != way_id) {
                    way_changes += 1;
                }
                current_way = Some(way_id);
                path.push(node);
            }
            None => path.push(*point),
        }
    }
    path.dedup();

    SnappedPath {
        path,
        snapped_points,
        way_changes,
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

impl NominatimPlace {
    fn into_place(self) -> Option<GeocodedPlace> {
        Some(GeocodedPlace {
            location: Location::new(self.lat.parse().ok()?, self.lon.parse().ok()?),
            name: self.display_name,
        })
    }
}

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    display_name: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: u64,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    geometry: Vec<OverpassNode>,
}

#[derive(Debug, Deserialize)]
struct OverpassNode {
    lat: f64,
    lon: f64,
}

impl OverpassResponse {
    fn into_roads(self) -> Vec<RoadWay> {
        self.elements
            .into_iter()
            .filter(|e| e.kind == "way" && !e.geometry.is_empty())
            .map(|mut e| RoadWay {
                id: e.id,
                name: e.tags.remove("name"),
                highway: e.tags.remove("highway").unwrap_or_default(),
                geometry: e
                    .geometry
                    .into_iter()
                    .map(|n| Location::new(n.lat, n.lon))
                    .collect(),
            })
            .collect()
    }
}
