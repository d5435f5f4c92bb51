pub(crate) mod application;
pub(crate) mod authorize;
pub(crate) mod health;
pub(crate) mod scope;
pub(crate) mod token;

use crate::hooks::lifecycle_middleware;
use crate::state::AppState;
use axum::{middleware, Router};
use serde::Serialize;
use utoipa::ToSchema;

/// Status-message response body used by administrative endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct StatusMessage {
    pub status: &'static str,
}

/// Combines all API routes into a single router, with the lifecycle hook
/// chain layered around every route.
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(authorize::router())
        .merge(token::router())
        .merge(application::router())
        .merge(scope::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            lifecycle_middleware,
        ))
}
