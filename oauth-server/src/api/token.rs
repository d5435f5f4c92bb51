use crate::auth::TokenParams;
use crate::models::AccessToken;
use crate::openapi::OAUTH_TAG;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http::HeaderMap;
use log::info;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Token response per RFC 6749 Section 5.1.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct TokenResponse {
    /// The access token string
    pub access_token: String,
    /// Refresh token, absent for the client_credentials grant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Token type - always "Bearer"
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
    /// Granted scope (space-separated)
    pub scope: String,
}

impl From<AccessToken> for TokenResponse {
    fn from(token: AccessToken) -> Self {
        Self {
            access_token: token.token,
            refresh_token: token.refresh_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
            scope: token.scope,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidateQuery {
    token: String,
}

/// Revocation request body.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct RevokeRequest {
    /// The access token to revoke
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct RevokeResponse {
    pub revoked: bool,
}

/// Extract client credentials from an HTTP Basic Authorization header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let header = headers.get(http::header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = header
        .strip_prefix("Basic ")
        .or_else(|| header.strip_prefix("basic "))?;
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (client_id, client_secret) = decoded.split_once(':')?;
    Some((client_id.to_string(), client_secret.to_string()))
}

/// Token endpoint (RFC 6749 Section 3.2), dispatching on grant_type.
/// Client credentials may arrive in the form body or as HTTP Basic
/// authentication; body parameters win when both are present.
#[utoipa::path(
    post,
    path = "/oauth20/token",
    tag = OAUTH_TAG,
    request_body(content = TokenParams, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Access token issued", body = TokenResponse),
        (status = 400, description = "Invalid request or grant", body = crate::errors::ErrorBody),
        (status = 401, description = "Client authentication failed", body = crate::errors::ErrorBody)
    )
)]
pub(super) async fn token_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(mut params): Form<TokenParams>,
) -> Response {
    if params.client_id.is_none() || params.client_secret.is_none() {
        if let Some((client_id, client_secret)) = basic_credentials(&headers) {
            params.client_id.get_or_insert(client_id);
            params.client_secret.get_or_insert(client_secret);
        }
    }

    match state.auth.issue_access_token(&params).await {
        Ok(token) => {
            info!(
                target: "access_tokens",
                "access token issued: client_id={}, grant_type={}, scope='{}', expires_in={}",
                token.client_id, params.grant_type, token.scope, token.expires_in
            );
            Json(TokenResponse::from(token)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// Token validation endpoint for resource servers. Returns the stored
/// token record while the token is live, 401 otherwise.
#[utoipa::path(
    get,
    path = "/oauth20/token/validate",
    tag = OAUTH_TAG,
    params(
        ("token" = String, Query, description = "The bearer token to validate")
    ),
    responses(
        (status = 200, description = "Token is valid", body = AccessToken),
        (status = 401, description = "Token is invalid or expired", body = crate::errors::ErrorBody)
    )
)]
pub(super) async fn validate_handler(
    State(state): State<AppState>,
    Query(query): Query<ValidateQuery>,
) -> Response {
    match state.auth.validate_token(&query.token).await {
        Ok(token) => Json(token).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Token revocation endpoint. Never fails on the OAuth level: the body
/// reports whether this call revoked a live token.
#[utoipa::path(
    post,
    path = "/oauth20/token/revoke",
    tag = OAUTH_TAG,
    request_body = RevokeRequest,
    responses(
        (status = 200, description = "Revocation outcome", body = RevokeResponse)
    )
)]
pub(super) async fn revoke_handler(
    State(state): State<AppState>,
    Json(request): Json<RevokeRequest>,
) -> Response {
    match state.auth.revoke_token(&request.token).await {
        Ok(revoked) => {
            if revoked {
                info!(target: "access_tokens", "access token revoked");
            }
            Json(RevokeResponse { revoked }).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/oauth20/token", post(token_handler))
        .route("/oauth20/token/validate", get(validate_handler))
        .route("/oauth20/token/revoke", post(revoke_handler))
}
