// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kakao Local REST API client (reverse geocoding and keyword search).

use super::{check_response_json, http_client, RoutingError};
use crate::models::Location;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://dapi.kakao.com/v2/local";
/// Kakao caps keyword search radius at 20 km.
const MAX_SEARCH_RADIUS_M: u32 = 20_000;

/// A place returned by keyword search.
#[derive(Debug, Clone, Serialize)]
pub struct KakaoPlace {
    pub name: String,
    pub category: String,
    pub location: Location,
    pub distance_m: Option<f64>,
}

/// Kakao Local API client.
#[derive(Clone)]
pub struct KakaoLocalClient {
    http: reqwest::Client,
    base_url: String,
    rest_api_key: Option<String>,
}

impl KakaoLocalClient {
    pub fn new(rest_api_key: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client(super::DEFAULT_HTTP_TIMEOUT, "fitcourse")?,
            base_url: DEFAULT_BASE_URL.to_string(),
            rest_api_key,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.rest_api_key.is_some()
    }

    fn authorization(&self) -> Result<String, RoutingError> {
        self.rest_api_key
            .as_deref()
            .map(|key| format!("KakaoAK {}", key))
            .ok_or(RoutingError::MissingApiKey("Kakao REST"))
    }

    /// Road address (or lot address) at a coordinate.
    pub async fn coord_to_address(&self, location: Location) -> Result<Option<String>, RoutingError> {
        let auth = self.authorization()?;
        let url = format!("{}/geo/coord2address.json", self.base_url);

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .query(&[("x", location.lng.to_string()), ("y", location.lat.to_string())])
            .send()
            .await?;

        let body: Documents<AddressDocument> = check_response_json(response).await?;
        Ok(body.documents.into_iter().next().and_then(AddressDocument::best_name))
    }

    /// Keyword search ordered by distance from `center`.
    pub async fn search_keyword(
        &self,
        query: &str,
        center: Location,
        radius_m: u32,
    ) -> Result<Vec<KakaoPlace>, RoutingError> {
        let auth = self.authorization()?;
        let url = format!("{}/search/keyword.json", self.base_url);

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .query(&[
                ("query", query.to_string()),
                ("x", center.lng.to_string()),
                ("y", center.lat.to_string()),
                ("radius", radius_m.min(MAX_SEARCH_RADIUS_M).to_string()),
                ("sort", "distance".to_string()),
            ])
            .send()
            .await?;

        let body: Documents<PlaceDocument> = check_response_json(response).await?;
        Ok(body
            .documents
            .into_iter()
            .filter_map(PlaceDocument::into_place)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct Documents<T> {
    #[serde(default = "Vec::new")]
    documents: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct AddressDocument {
    road_address: Option<AddressName>,
    address: Option<AddressName>,
}

#[derive(Debug, Deserialize)]
struct AddressName {
    address_name: String,
}

impl AddressDocument {
    fn best_name(self) -> Option<String> {
        self.road_address
            .or(self.address)
            .map(|a| a.address_name)
            .filter(|name| !name.is_empty())
    }
}

/// Kakao returns coordinates and distance as strings.
#[derive(Debug, Deserialize)]
struct PlaceDocument {
    place_name: String,
    #[serde(default)]
    category_name: String,
    x: String,
    y: String,
    #[serde(default)]
    distance: String,
}

impl PlaceDocument {
    fn into_place(self) -> Option<KakaoPlace> {
        let lng: f64 = self.x.parse().ok()?;
        let lat: f64 = self.y.parse().ok()?;
        Some(KakaoPlace {
            name: self.place_name,
            category: self.category_name,
            location: Location::new(lat, lng),
            distance_m: self.distance.parse().ok(),
        })
    }
}
