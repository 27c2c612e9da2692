// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.
//!
//! Every request here is rejected before any vendor or database call.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use tower::ServiceExt;

mod common;

async fn send(method: &str, uri: &str, body: Option<serde_json::Value>) -> Response {
    let (app, _) = common::create_test_app();
    let token = common::create_test_token("validator");

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

    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

#[tokio::test]
async fn test_profile_weight_out_of_range() {
    let response = send(
        "PUT",
        "/api/profile",
        Some(serde_json::json!({
            "displayName": "Runner",
            "height": 175.0,
            "weight": 5.0,
            "age": 30
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_empty_display_name() {
    let response = send(
        "PUT",
        "/api/profile",
        Some(serde_json::json!({
            "displayName": "",
            "height": 175.0,
            "weight": 70.0,
            "age": 30
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_course_distance_out_of_range() {
    let response = send(
        "POST",
        "/api/courses/generate",
        Some(serde_json::json!({
            "center": { "lat": 37.5665, "lng": 126.978 },
            "distancesKm": [3.0, 500.0]
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_course_center_out_of_range() {
    let response = send(
        "POST",
        "/api/courses/generate/geojson",
        Some(serde_json::json!({
            "center": { "lat": 137.0, "lng": 126.978 },
            "distancesKm": [3.0]
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_snap_empty_path() {
    let response = send(
        "POST",
        "/api/roads/snap",
        Some(serde_json::json!({ "path": [] })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_workouts_limit_too_large() {
    let response = send("GET", "/api/workouts?limit=1000", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reverse_geocode_bad_coordinates() {
    let response = send("GET", "/api/geocode/reverse?lat=95&lng=10", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_empty_query() {
    let response = send("GET", "/api/geocode/search?q=", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_nearby_without_kakao_key_is_upstream_error() {
    let response = send("GET", "/api/places/nearby?q=park&lat=37.5&lng=127.0", None).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_sample_out_of_range() {
    let response = send(
        "POST",
        "/api/sessions/sample",
        Some(serde_json::json!({
            "lat": 37.5,
            "lng": 500.0,
            "timestamp": "2026-01-01T00:00:00Z"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
