use crate::auth::AuthorizeParams;
use crate::openapi::OAUTH_TAG;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::info;
use serde::Serialize;
use utoipa::ToSchema;

/// Successful authorization response: the registered redirect URI with the
/// code (and state, when given) appended as query parameters.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct AuthorizeResponse {
    pub redirect_uri: String,
}

/// Authorization endpoint (RFC 6749 Section 4.1.1). Consent is assumed to
/// be carried by the request itself; there is no interactive login step.
#[utoipa::path(
    get,
    path = "/oauth20/authorize",
    tag = OAUTH_TAG,
    params(
        ("response_type" = String, Query, description = "Must be 'code'"),
        ("client_id" = String, Query, description = "Client identifier"),
        ("redirect_uri" = String, Query, description = "Must exactly match the registered redirect URI"),
        ("scope" = Option<String>, Query, description = "Requested scope; defaults to the client's registered scope"),
        ("state" = Option<String>, Query, description = "Opaque value echoed back on the redirect")
    ),
    responses(
        (status = 200, description = "Authorization code issued", body = AuthorizeResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorBody)
    )
)]
pub(super) async fn authorize_handler(
    State(state): State<AppState>,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    match state.auth.issue_authorization_code(&params).await {
        Ok(redirect_uri) => {
            info!(
                target: "access_tokens",
                "authorization code issued to client {}", params.client_id
            );
            Json(AuthorizeResponse { redirect_uri }).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/oauth20/authorize", get(authorize_handler))
}
