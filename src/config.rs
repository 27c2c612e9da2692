// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Vendor API keys are optional: a missing key is logged at startup and the
//! affected adapter degrades to its fallback behaviour.

use std::env;

/// Default User-Agent sent to Nominatim/Overpass (their usage policy requires one).
pub const DEFAULT_OSM_USER_AGENT: &str = "fitcourse/0.1 (+https://github.com/fitcourse)";
/// Tracking sessions with no client activity for this long are discarded.
pub const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: u64 = 3600;

/// Which vendor produces course geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingProviderKind {
    Google,
    Osm,
}

impl RoutingProviderKind {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "osm" | "openstreetmap" => Ok(Self::Osm),
            _ => Err(ConfigError::Invalid("ROUTING_PROVIDER", raw.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP / Firebase project ID (Firestore + ID token audience)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,

    // --- Vendor keys ---
    /// Google Maps key (Directions, Roads, Elevation and the JS SDK)
    pub google_maps_api_key: Option<String>,
    /// Kakao JavaScript SDK key (public, browser)
    pub kakao_javascript_key: Option<String>,
    /// Kakao Local REST API key
    pub kakao_rest_api_key: Option<String>,
    /// Naver Maps client ID (public, browser)
    pub naver_client_id: Option<String>,
    /// User-Agent for OpenStreetMap endpoints
    pub osm_user_agent: String,
    /// Course geometry provider
    pub routing_provider: RoutingProviderKind,
    /// Idle limit for tracking sessions, in seconds
    pub session_idle_timeout_secs: u64,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            google_maps_api_key: None,
            kakao_javascript_key: None,
            kakao_rest_api_key: None,
            naver_client_id: None,
            osm_user_agent: DEFAULT_OSM_USER_AGENT.to_string(),
            routing_provider: RoutingProviderKind::Osm,
            session_idle_timeout_secs: DEFAULT_SESSION_IDLE_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Each vendor key is also accepted under its `REACT_APP_` name so the
    /// web client's `.env` can be shared as-is.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let google_maps_api_key =
            env_any(&["GOOGLE_MAPS_API_KEY", "REACT_APP_GOOGLE_MAPS_API_KEY"]);

        let routing_provider = match env::var("ROUTING_PROVIDER") {
            Ok(raw) => RoutingProviderKind::parse(&raw)?,
            Err(_) if google_maps_api_key.is_some() => RoutingProviderKind::Google,
            Err(_) => RoutingProviderKind::Osm,
        };

        if routing_provider == RoutingProviderKind::Google && google_maps_api_key.is_none() {
            return Err(ConfigError::Missing("GOOGLE_MAPS_API_KEY"));
        }

        let config = Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env_any(&["GCP_PROJECT_ID", "FIREBASE_PROJECT_ID"])
                .unwrap_or_else(|| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            google_maps_api_key,
            kakao_javascript_key: env_any(&[
                "KAKAO_JAVASCRIPT_KEY",
                "REACT_APP_KAKAO_JAVASCRIPT_KEY",
            ]),
            kakao_rest_api_key: env_any(&["KAKAO_REST_API_KEY", "REACT_APP_KAKAO_REST_API_KEY"]),
            naver_client_id: env_any(&["NAVER_CLIENT_ID", "REACT_APP_NAVER_CLIENT_ID"]),
            osm_user_agent: env::var("OSM_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_OSM_USER_AGENT.to_string()),
            routing_provider,
            session_idle_timeout_secs: env::var("SESSION_IDLE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&secs| secs > 0)
                .unwrap_or(DEFAULT_SESSION_IDLE_TIMEOUT_SECS),
        };

        config.log_missing_keys();
        Ok(config)
    }

    fn log_missing_keys(&self) {
        let keys = [
            ("GOOGLE_MAPS_API_KEY", self.google_maps_api_key.is_some()),
            ("KAKAO_JAVASCRIPT_KEY", self.kakao_javascript_key.is_some()),
            ("KAKAO_REST_API_KEY", self.kakao_rest_api_key.is_some()),
            ("NAVER_CLIENT_ID", self.naver_client_id.is_some()),
        ];
        for (name, present) in keys {
            if !present {
                tracing::warn!(key = name, "API key not configured; dependent features degrade");
            }
        }
    }
}

/// First non-empty value among `names`.
fn env_any(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
