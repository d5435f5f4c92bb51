use crate::openapi::HEALTH_TAG;
use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use http::StatusCode;
use serde_json::json;

/// Liveness/readiness probe covering the storage backend.
#[utoipa::path(
    get,
    path = "/healthy",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Server is healthy"),
        (status = 503, description = "Storage backend is unavailable")
    )
)]
pub(super) async fn health_handler(State(state): State<AppState>) -> Response {
    if state.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable" })),
        )
            .into_response()
    }
}

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/healthy", get(health_handler))
}
