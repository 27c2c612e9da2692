// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live tracking session API tests (offline database).

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

mod common;

async fn call(app: &Router, uid: &str, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let token = common::create_test_token(uid);
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn sample(lat: f64, lng: f64) -> Value {
    serde_json::json!({
        "lat": lat,
        "lng": lng,
        "timestamp": "2026-01-01T00:00:00Z",
        "accuracy_m": 5.0
    })
}

#[tokio::test]
async fn test_session_lifecycle() {
    let (app, state) = common::create_test_app();

    let (status, body) = call(
        &app,
        "athlete",
        "POST",
        "/api/sessions/start",
        Some(serde_json::json!({ "activityType": "cycling" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "running");
    assert_eq!(body["activityType"], "cycling");

    let (status, body) = call(&app, "athlete", "POST", "/api/sessions/sample", Some(sample(37.5, 127.0))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "anchored");

    let (_, body) = call(&app, "athlete", "POST", "/api/sessions/sample", Some(sample(37.5001, 127.0))).await;
    assert_eq!(body["outcome"], "accepted");

    // ~1.1 km jump
    let (_, body) = call(&app, "athlete", "POST", "/api/sessions/sample", Some(sample(37.51, 127.0))).await;
    assert_eq!(body["outcome"], "rejected_noise");

    let (status, body) = call(&app, "athlete", "POST", "/api/sessions/pause", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "paused");

    let (_, body) = call(&app, "athlete", "POST", "/api/sessions/sample", Some(sample(37.6, 127.0))).await;
    assert_eq!(body["outcome"], "ignored");

    let (status, body) = call(&app, "athlete", "GET", "/api/sessions/current", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["samples"], 2);
    let distance = body["metrics"]["distanceKm"].as_f64().unwrap();
    assert!((distance - 0.0111).abs() < 0.001, "{}", distance);
    assert_eq!(body["metrics"]["heartRateBpm"], 70);

    let (status, body) = call(&app, "athlete", "POST", "/api/sessions/resume", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "running");

    // Offline Firestore: the workout cannot be stored and the session is dropped.
    let (status, _) = call(&app, "athlete", "POST", "/api/sessions/stop", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(state.tracking.active_sessions(), 0);

    let (status, _) = call(&app, "athlete", "GET", "/api/sessions/current", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_second_start_conflicts() {
    let (app, _) = common::create_test_app();
    let start = serde_json::json!({ "activityType": "running" });

    let (status, _) = call(&app, "a", "POST", "/api/sessions/start", Some(start.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, "a", "POST", "/api/sessions/start", Some(start.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    // Sessions are per user.
    let (status, _) = call(&app, "b", "POST", "/api/sessions/start", Some(start)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_transition_conflicts() {
    let (app, _) = common::create_test_app();

    call(&app, "c", "POST", "/api/sessions/start", Some(serde_json::json!({}))).await;
    let (status, _) = call(&app, "c", "POST", "/api/sessions/resume", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_actions_without_session_are_not_found() {
    let (app, _) = common::create_test_app();

    for uri in ["/api/sessions/pause", "/api/sessions/resume", "/api/sessions/stop"] {
        let (status, _) = call(&app, "nobody", "POST", uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }
    let (status, _) = call(&app, "nobody", "POST", "/api/sessions/sample", Some(sample(37.5, 127.0))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
