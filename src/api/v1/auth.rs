//! Mobile OTP login handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::api::AppState;
use crate::db::Database;
use crate::otp::{OtpError, VerifiedLogin};

use super::{AdminUserResponse, ErrorReply, ErrorResponse, db_error, error_reply};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendOtpRequest {
    #[schema(example = "+919812345678")]
    pub mobile: String,
}

#[derive(Serialize, ToSchema)]
pub struct SendOtpResponse {
    pub success: bool,
    #[schema(example = "2026-01-01 10:05:00")]
    pub expires_at: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    #[schema(example = "+919812345678")]
    pub mobile: String,
    #[schema(example = "0427")]
    pub otp: String,
}

/// Login session descriptor
#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub mobile: String,
    pub issued_at: String,
    /// 24 hours after issue
    pub expires_at: String,
}

#[derive(Serialize, ToSchema)]
pub struct VerifyOtpResponse {
    pub success: bool,
    pub user: AdminUserResponse,
    pub session: SessionResponse,
}

impl From<VerifiedLogin> for VerifyOtpResponse {
    fn from(login: VerifiedLogin) -> Self {
        Self {
            success: true,
            user: AdminUserResponse::from(login.user),
            session: SessionResponse {
                mobile: login.session.mobile,
                issued_at: login.session.issued_at,
                expires_at: login.session.expires_at,
            },
        }
    }
}

fn otp_error(e: OtpError) -> ErrorReply {
    let status = match e {
        OtpError::Database(e) => return db_error(e),
        OtpError::UnknownMobile { .. } => StatusCode::NOT_FOUND,
        OtpError::NotRequested | OtpError::Expired | OtpError::Invalid => StatusCode::BAD_REQUEST,
        OtpError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
        OtpError::Delivery { .. } => StatusCode::BAD_GATEWAY,
    };
    error_reply(status, e.to_string())
}

/// Send a login code
///
/// The mobile must belong to an admin user. The code is valid for five
/// minutes.
#[utoipa::path(
    post,
    path = "/send-otp",
    tag = "auth",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "Code issued", body = SendOtpResponse),
        (status = 404, description = "Unknown mobile", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn send_otp<D: Database>(
    State(state): State<AppState<D>>,
    Json(req): Json<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>, ErrorReply> {
    let issued = state.otp().send(&req.mobile).await.map_err(otp_error)?;
    Ok(Json(SendOtpResponse {
        success: true,
        expires_at: issued.expires_at,
    }))
}

/// Verify a login code
#[utoipa::path(
    post,
    path = "/verify-otp",
    tag = "auth",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Code accepted", body = VerifyOtpResponse),
        (status = 400, description = "No OTP requested, OTP expired or Invalid OTP", body = ErrorResponse),
        (status = 429, description = "Too many failed attempts", body = ErrorResponse)
    )
)]
#[instrument(skip(state, req), fields(mobile = %req.mobile))]
pub async fn verify_otp<D: Database>(
    State(state): State<AppState<D>>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, ErrorReply> {
    let login = state
        .otp()
        .verify(&req.mobile, &req.otp)
        .await
        .map_err(otp_error)?;
    Ok(Json(VerifyOtpResponse::from(login)))
}
