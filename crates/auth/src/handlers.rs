//! HTTP handlers for auth routes.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use peeth_core::users::User;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::extractors::CurrentUser;
use crate::service::LoginResponse;
use crate::AuthState;

#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpVerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRequested {
    pub email: String,
    pub expires_in_seconds: u64,
}

/// Creates the auth router with all authentication routes.
///
/// Routes:
/// - `POST /auth/otp/request` - Send a login code to an email address
/// - `POST /auth/otp/verify` - Exchange a code for a session token
/// - `GET /auth/me` - Get current authenticated user
pub fn auth_routes() -> Router<AuthState> {
    Router::new()
        .route("/auth/otp/request", post(request_otp))
        .route("/auth/otp/verify", post(verify_otp))
        .route("/auth/me", get(me))
}

async fn request_otp(
    State(state): State<AuthState>,
    Json(body): Json<OtpRequest>,
) -> Result<(StatusCode, Json<OtpRequested>), AuthError> {
    state.service.request_otp(&body.email).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(OtpRequested {
            email: body.email.trim().to_lowercase(),
            expires_in_seconds: state.config().otp_ttl.as_secs(),
        }),
    ))
}

async fn verify_otp(
    State(state): State<AuthState>,
    Json(body): Json<OtpVerifyRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let login = state.service.verify_otp(&body.email, &body.code).await?;
    Ok(Json(login))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
