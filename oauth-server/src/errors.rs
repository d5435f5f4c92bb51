use crate::storage::StorageError;
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use log::error;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Typed failures of the authorization engine.
///
/// Every engine operation returns one of these instead of a transport
/// response; the `IntoResponse` impl below is the only place where they are
/// mapped to HTTP statuses and RFC 6749-style machine-readable codes.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or missing request parameters
    #[error("{0}")]
    InvalidRequest(String),
    /// Unknown or inactive client_id on the authorize endpoint
    #[error("invalid client_id")]
    InvalidClientId,
    /// Client authentication failed
    #[error("invalid client credentials")]
    InvalidClient,
    /// Authorization code or refresh token invalid, expired or already used
    #[error("{0}")]
    InvalidGrant(&'static str),
    /// Requested scope unregistered or outside the client's entitlement
    #[error("scope not valid")]
    InvalidScope,
    #[error("unsupported grant_type")]
    UnsupportedGrantType,
    #[error("unsupported response_type")]
    UnsupportedResponseType,
    /// Supplied redirect_uri does not match the registered/bound one
    #[error("redirect_uri mismatch")]
    RedirectUriMismatch,
    #[error("scope not found")]
    ScopeNotFound,
    /// Bearer token validation failed
    #[error("invalid or expired access token")]
    InvalidToken,
    /// Persistence failure; not a client-facing OAuth error
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidClientId
            | Self::InvalidGrant(_)
            | Self::InvalidScope
            | Self::UnsupportedGrantType
            | Self::UnsupportedResponseType
            | Self::RedirectUriMismatch => StatusCode::BAD_REQUEST,
            Self::InvalidClient | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::ScopeNotFound => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code per RFC 6749 §5.2 where one exists.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidClientId => "invalid_client_id",
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant(_) => "invalid_grant",
            Self::InvalidScope => "invalid_scope",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::RedirectUriMismatch => "redirect_uri_mismatch",
            Self::ScopeNotFound => "scope_not_found",
            Self::InvalidToken => "invalid_token",
            Self::Storage(_) => "server_error",
        }
    }
}

/// RFC 6749 error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code
    pub error: &'static str,
    /// Human-readable error description
    pub error_description: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let description = if let Self::Storage(err) = &self {
            // surface internals to the log, not to the caller
            error!("storage failure: {}", err);
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorBody {
            error: self.error_code(),
            error_description: description,
        };
        (status, Json(body)).into_response()
    }
}
