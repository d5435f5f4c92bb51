use crate::api::StatusMessage;
use crate::models::{ApplicationInfo, ClientApplication};
use crate::openapi::APPLICATION_TAG;
use crate::registry::clients::{RegisterClientRequest, UpdateClientRequest};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use log::info;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ApplicationQuery {
    client_id: Option<String>,
}

/// Register a new client application. The response is the only place the
/// generated client_secret is ever returned.
#[utoipa::path(
    post,
    path = "/oauth20/application",
    tag = APPLICATION_TAG,
    request_body = RegisterClientRequest,
    responses(
        (status = 200, description = "Application registered", body = ClientApplication),
        (status = 400, description = "Invalid registration request", body = crate::errors::ErrorBody)
    )
)]
pub(super) async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterClientRequest>,
) -> Response {
    match state
        .auth
        .clients()
        .register(&request, state.auth.scopes())
        .await
    {
        Ok(client) => {
            info!("client application {} registered", client.client_id);
            Json(client).into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// Application introspection: metadata for one client when `client_id` is
/// given, the full list otherwise. Secrets are never included.
#[utoipa::path(
    get,
    path = "/oauth20/application",
    tag = APPLICATION_TAG,
    params(
        ("client_id" = Option<String>, Query, description = "Client to look up; omit to list all applications")
    ),
    responses(
        (status = 200, description = "Application metadata", body = ApplicationInfo),
        (status = 400, description = "Unknown client_id", body = crate::errors::ErrorBody)
    )
)]
pub(super) async fn info_handler(
    State(state): State<AppState>,
    Query(query): Query<ApplicationQuery>,
) -> Response {
    match query.client_id.as_deref().filter(|id| !id.is_empty()) {
        Some(client_id) => match state.auth.get_application_info(client_id).await {
            Ok(info) => Json(info).into_response(),
            Err(err) => err.into_response(),
        },
        // no client_id: administrative enumeration
        None => match state.auth.list_applications().await {
            Ok(all) => Json(all).into_response(),
            Err(err) => err.into_response(),
        },
    }
}

/// Update a client application, authenticated with its own credentials.
#[utoipa::path(
    put,
    path = "/oauth20/application",
    tag = APPLICATION_TAG,
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Application updated", body = StatusMessage),
        (status = 400, description = "Invalid update request", body = crate::errors::ErrorBody),
        (status = 401, description = "Client authentication failed", body = crate::errors::ErrorBody)
    )
)]
pub(super) async fn update_handler(
    State(state): State<AppState>,
    Json(request): Json<UpdateClientRequest>,
) -> Response {
    match state.auth.update_client_application(&request).await {
        Ok(client) => {
            info!("client application {} updated", client.client_id);
            Json(StatusMessage {
                status: "client application updated",
            })
            .into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(super) fn router() -> Router<AppState> {
    Router::new().route(
        "/oauth20/application",
        post(register_handler).get(info_handler).put(update_handler),
    )
}
