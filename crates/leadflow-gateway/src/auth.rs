// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token authentication middleware for the admin API.
//!
//! The visitor-facing conversation and subscription endpoints stay open;
//! only the admin surface (`/v1/leads`) passes through this middleware.
//! When no token is configured, auth is disabled and requests pass.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

/// Authentication configuration for the admin routes.
#[derive(Clone)]
pub struct AuthConfig {
    /// Expected bearer token. If `None`, auth is disabled.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Middleware that validates `Authorization: Bearer <token>` when a token
/// is configured.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(ref expected_token) = auth.bearer_token else {
        return Ok(next.run(request).await);
    };

    let supplied = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match supplied {
        Some(token) if token == expected_token => Ok(next.run(request).await),
        _ => {
            tracing::warn!("rejected admin request with missing or bad bearer token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
