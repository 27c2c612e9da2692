// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! FitCourse: running and cycling course generation with live tracking
//!
//! This crate provides the backend API for the FitCourse web app. It
//! generates round-trip courses near the user from vendor routing services,
//! tracks exercise sessions, and stores profiles and workouts in Firestore.

pub mod config;
pub mod db;
pub mod error;
pub mod geo_utils;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::tracking::TICK_INTERVAL;
use services::{
    CourseService, FirebaseAuthVerifier, GoogleRoadsClient, KakaoLocalClient, MapSdkConfig,
    OsmClient, RouteProvider, RoutingBackend, TrackingService,
};
use std::time::Duration;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub auth_verifier: FirebaseAuthVerifier,
    pub course_service: CourseService<RoutingBackend>,
    pub roads: GoogleRoadsClient,
    pub osm: OsmClient,
    pub kakao: KakaoLocalClient,
    pub tracking: TrackingService,
    pub map_sdk: MapSdkConfig,
}

impl AppState {
    /// Build all vendor clients from configuration.
    pub fn from_config(
        config: Config,
        db: FirestoreDb,
        auth_verifier: FirebaseAuthVerifier,
    ) -> anyhow::Result<Self> {
        let osm = OsmClient::new(&config.osm_user_agent)?;
        let backend = RoutingBackend::from_config(&config, osm.clone())?;
        tracing::info!(provider = backend.name(), "Course routing provider selected");

        Ok(Self {
            auth_verifier,
            course_service: CourseService::new(backend),
            roads: GoogleRoadsClient::new(config.google_maps_api_key.clone())?,
            kakao: KakaoLocalClient::new(config.kakao_rest_api_key.clone())?,
            osm,
            tracking: TrackingService::new(
                TICK_INTERVAL,
                Duration::from_secs(config.session_idle_timeout_secs),
            ),
            map_sdk: MapSdkConfig::from_config(&config),
            config,
            db,
        })
    }
}
