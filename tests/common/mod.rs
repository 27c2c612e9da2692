// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use fitcourse::config::Config;
use fitcourse::db::FirestoreDb;
use fitcourse::routes::create_router;
use fitcourse::services::{
    CourseService, FirebaseAuthVerifier, GoogleRoadsClient, KakaoLocalClient, MapSdkConfig,
    OsmClient, RoutingBackend, TrackingService,
};
use fitcourse::AppState;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[allow(dead_code)]
pub const TEST_SIGNING_KEY: &[u8] = b"integration-test-signing-key";
#[allow(dead_code)]
pub const TEST_KID: &str = "integration-kid";
/// Nothing listens here; vendor calls fail fast.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Sign an ID token the test verifier accepts.
#[allow(dead_code)]
pub fn create_test_token(uid: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = serde_json::json!({
        "iss": "https://securetoken.google.com/test-project",
        "aud": "test-project",
        "sub": uid,
        "iat": now,
        "auth_time": now,
        "exp": now + 3600,
        "email": format!("{}@example.com", uid),
        "name": "Test Runner"
    });

    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(TEST_KID.to_string());
    encode(&header, &claims, &EncodingKey::from_secret(TEST_SIGNING_KEY)).unwrap()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let db = test_db_offline();
    let auth_verifier = FirebaseAuthVerifier::new_with_static_key(
        &config.gcp_project_id,
        TEST_KID,
        Algorithm::HS256,
        DecodingKey::from_secret(TEST_SIGNING_KEY),
    )
    .unwrap();

    let osm = OsmClient::new(&config.osm_user_agent)
        .unwrap()
        .with_nominatim_url(UNREACHABLE_URL)
        .with_overpass_url(UNREACHABLE_URL);

    let state = Arc::new(AppState {
        auth_verifier,
        course_service: CourseService::new(RoutingBackend::Osm(osm.clone())),
        roads: GoogleRoadsClient::new(None).unwrap(),
        kakao: KakaoLocalClient::new(None).unwrap(),
        osm,
        tracking: TrackingService::default(),
        map_sdk: MapSdkConfig::from_config(&config),
        config,
        db,
    });

    (create_router(state.clone()), state)
}
