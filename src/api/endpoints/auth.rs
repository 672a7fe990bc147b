//! Demo login and logout against the in-memory credential table.

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{AppState, SESSION_COOKIE};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let email = req.email.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    if !state.config.check_credentials(&email, &password) {
        tracing::info!(email = %email, "Rejected login");
        return Err(ApiError::InvalidCredentials);
    }

    let session_id = state.lock_sessions()?.open();
    tracing::info!(email = %email, "Logged in");

    let cookie = format!("{SESSION_COOKIE}={session_id}; HttpOnly; Path=/; SameSite=Lax");
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            success: true,
            message: "Logged in!",
        }),
    )
        .into_response())
}

/// `POST /logout`. Succeeds whether or not a session was open.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    if let Some(id) = session_id(&headers) {
        if state.lock_sessions()?.close(&id) {
            tracing::info!("Logged out");
        }
    }

    let cookie = format!("{SESSION_COOKIE}=; Max-Age=0; HttpOnly; Path=/; SameSite=Lax");
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            success: true,
            message: "Logged out",
        }),
    )
        .into_response())
}

/// Session id from the `Cookie` header, if any
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
