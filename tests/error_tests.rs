// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use fitcourse::error::AppError;
use fitcourse::services::routing::RoutingError;
use fitcourse::services::tracking::{SessionError, SessionState};

async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_session_errors_map_to_http() {
    let (status, body) = body_json(SessionError::NoActiveSession.into()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = body_json(
        SessionError::InvalidTransition {
            from: SessionState::Paused,
            action: "pause",
        }
        .into(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"], "cannot pause a session that is paused");

    let (status, _) = body_json(SessionError::AlreadyActive.into()).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_routing_errors_are_upstream() {
    let (status, body) = body_json(RoutingError::MissingApiKey("Kakao REST").into()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream_error");
    assert_eq!(body["details"], "Kakao REST API key is not configured");

    let (status, _) = body_json(RoutingError::NoRoute.into()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_internal_details_are_hidden() {
    let (status, body) = body_json(AppError::Database("connection string leaked".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("details").is_none());

    let (status, body) = body_json(anyhow::anyhow!("secret").into()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert!(body.get("details").is_none());
}
