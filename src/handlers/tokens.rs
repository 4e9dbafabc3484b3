//! # Token API Handlers
//!
//! Username/password login issuing JWT access and refresh tokens, plus refresh
//! and verification endpoints.

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::types::FieldErrors;
use crate::auth::{TokenPair, TokenType, authenticate};
use crate::error::{ApiError, unauthorized};
use crate::repositories::AccountRepository;
use crate::server::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenObtainRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRefreshRequest {
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessTokenResponse {
    pub access: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenVerifyRequest {
    pub token: Option<String>,
}

/// Empty JSON object returned by a successful verification
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenVerifyResponse {}

/// Exchange credentials for an access/refresh token pair
#[utoipa::path(
    post,
    path = "/api/token/",
    request_body = TokenObtainRequest,
    responses(
        (status = 200, description = "Token pair", body = TokenPair),
        (status = 400, description = "Missing credentials", body = ApiError),
        (status = 401, description = "Invalid credentials", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn obtain_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenObtainRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let Json(request) = payload?;
    tracing::info!(username = ?request.username, "POST token");

    let mut errors = FieldErrors::new();
    let username = errors.required("username", request.username.as_deref());
    let password = errors.required("password", request.password.as_deref());
    let (Some(username), Some(password)) = (username, password) else {
        return Err(errors
            .into_result()
            .err()
            .unwrap_or_else(|| unauthorized(None)));
    };

    let account = authenticate(&state.db, username, password).await?;
    let pair = state.tokens.issue_pair(&account.username)?;

    tracing::info!(username = %account.username, "Issued token pair");
    Ok(Json(pair))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/token/refresh/",
    request_body = TokenRefreshRequest,
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 400, description = "Missing refresh token", body = ApiError),
        (status = 401, description = "Invalid or expired refresh token", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRefreshRequest>, JsonRejection>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let Json(request) = payload?;

    let mut errors = FieldErrors::new();
    let Some(refresh) = errors.required("refresh", request.refresh.as_deref()) else {
        return Err(errors
            .into_result()
            .err()
            .unwrap_or_else(|| unauthorized(None)));
    };

    let claims = state.tokens.decode_as(refresh, TokenType::Refresh)?;
    if AccountRepository::new(&state.db)
        .find(&claims.sub)
        .await?
        .is_none()
    {
        return Err(unauthorized(Some("User not found")));
    }

    let access = state.tokens.issue_access(&claims.sub)?;
    tracing::info!(username = %claims.sub, "Refreshed access token");
    Ok(Json(AccessTokenResponse { access }))
}

/// Check that a token is well-formed, correctly signed and unexpired
#[utoipa::path(
    post,
    path = "/api/token/verify/",
    request_body = TokenVerifyRequest,
    responses(
        (status = 200, description = "Token is valid", body = TokenVerifyResponse),
        (status = 400, description = "Missing token", body = ApiError),
        (status = 401, description = "Token is invalid or expired", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn verify_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenVerifyRequest>, JsonRejection>,
) -> Result<Json<TokenVerifyResponse>, ApiError> {
    let Json(request) = payload?;

    let mut errors = FieldErrors::new();
    let Some(token) = errors.required("token", request.token.as_deref()) else {
        return Err(errors
            .into_result()
            .err()
            .unwrap_or_else(|| unauthorized(None)));
    };

    state.tokens.decode_validated(token)?;
    Ok(Json(TokenVerifyResponse {}))
}
