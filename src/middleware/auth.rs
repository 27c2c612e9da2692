// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase ID token authentication middleware.

use crate::services::AuthError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated user extracted from a Firebase ID token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Middleware that requires a valid Firebase ID token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_string();

    let user = match state.auth_verifier.verify_id_token(&token).await {
        Ok(user) => user,
        Err(AuthError::Invalid(reason)) => {
            tracing::debug!(reason = %reason, "Rejected ID token");
            return Err(StatusCode::UNAUTHORIZED);
        }
        Err(AuthError::Transient(reason)) => {
            tracing::error!(reason = %reason, "Could not verify ID token");
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
    };

    request.extensions_mut().insert(AuthUser {
        uid: user.uid,
        email: user.email,
        name: user.name,
    });

    Ok(next.run(request).await)
}
