use crate::api::StatusMessage;
use crate::models::Scope;
use crate::openapi::SCOPE_TAG;
use crate::registry::scopes::UpdateScopeRequest;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::info;

/// Register a new scope definition.
#[utoipa::path(
    post,
    path = "/oauth20/scope",
    tag = SCOPE_TAG,
    request_body = Scope,
    responses(
        (status = 200, description = "Scope registered", body = StatusMessage),
        (status = 400, description = "Invalid or duplicate scope", body = crate::errors::ErrorBody)
    )
)]
pub(super) async fn register_handler(
    State(state): State<AppState>,
    Json(scope): Json<Scope>,
) -> Response {
    match state.auth.scopes().register(&scope).await {
        Ok(()) => {
            info!("scope {} registered", scope.name);
            Json(StatusMessage {
                status: "scope added successfully",
            })
            .into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// Update an existing scope definition.
#[utoipa::path(
    put,
    path = "/oauth20/scope",
    tag = SCOPE_TAG,
    request_body = UpdateScopeRequest,
    responses(
        (status = 200, description = "Scope updated", body = StatusMessage),
        (status = 400, description = "Update would leave the scope invalid", body = crate::errors::ErrorBody),
        (status = 404, description = "No scope with that name", body = crate::errors::ErrorBody)
    )
)]
pub(super) async fn update_handler(
    State(state): State<AppState>,
    Json(request): Json<UpdateScopeRequest>,
) -> Response {
    match state.auth.scopes().update(&request).await {
        Ok(scope) => {
            info!("scope {} updated", scope.name);
            Json(StatusMessage {
                status: "scope updated successfully",
            })
            .into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// List every registered scope.
#[utoipa::path(
    get,
    path = "/oauth20/scope",
    tag = SCOPE_TAG,
    responses(
        (status = 200, description = "All registered scopes", body = [Scope])
    )
)]
pub(super) async fn list_handler(State(state): State<AppState>) -> Response {
    match state.auth.scopes().get_all().await {
        Ok(scopes) => Json(scopes).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Fetch a single scope by name.
#[utoipa::path(
    get,
    path = "/oauth20/scope/{name}",
    tag = SCOPE_TAG,
    params(
        ("name" = String, Path, description = "Scope name")
    ),
    responses(
        (status = 200, description = "The scope definition", body = Scope),
        (status = 404, description = "No scope with that name", body = crate::errors::ErrorBody)
    )
)]
pub(super) async fn get_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    match state.auth.scopes().get(&name).await {
        Ok(scope) => Json(scope).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Delete a scope by name. Tokens already issued under it are unaffected.
#[utoipa::path(
    delete,
    path = "/oauth20/scope/{name}",
    tag = SCOPE_TAG,
    params(
        ("name" = String, Path, description = "Scope name")
    ),
    responses(
        (status = 200, description = "Scope deleted", body = StatusMessage),
        (status = 404, description = "No scope with that name", body = crate::errors::ErrorBody)
    )
)]
pub(super) async fn delete_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    match state.auth.scopes().delete(&name).await {
        Ok(()) => {
            info!("scope {} deleted", name);
            Json(StatusMessage {
                status: "scope deleted successfully",
            })
            .into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/oauth20/scope",
            get(list_handler).post(register_handler).put(update_handler),
        )
        .route(
            "/oauth20/scope/{name}",
            get(get_handler).delete(delete_handler),
        )
}

#[cfg(test)]
mod tests {
    use crate::test_utils::TestFixture;
    use http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_scope_crud_roundtrip() {
        let fixture = TestFixture::new().await;

        let response = fixture
            .post(
                "/oauth20/scope",
                &json!({
                    "name": "basic",
                    "description": "some description",
                    "cc_expires_in": 300,
                    "pass_expires_in": 100
                }),
            )
            .await;
        response.assert_ok();
        assert_eq!(response.json["status"], "scope added successfully");

        let response = fixture.get("/oauth20/scope/basic").await;
        response.assert_ok();
        assert_eq!(response.json["cc_expires_in"], 300);

        let response = fixture
            .put(
                "/oauth20/scope",
                &json!({ "name": "basic", "cc_expires_in": 900 }),
            )
            .await;
        response.assert_ok();

        let response = fixture.get("/oauth20/scope").await;
        response.assert_ok();
        assert_eq!(response.json.as_array().unwrap().len(), 1);
        assert_eq!(response.json[0]["cc_expires_in"], 900);

        let response = fixture.delete("/oauth20/scope/basic").await;
        response.assert_ok();
        assert_eq!(response.json["status"], "scope deleted successfully");

        let response = fixture.get("/oauth20/scope/basic").await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_scope_is_rejected() {
        let fixture = TestFixture::new().await;

        // cc_expires_in of zero violates the scope invariant
        let response = fixture
            .post(
                "/oauth20/scope",
                &json!({
                    "name": "basic",
                    "description": "some description",
                    "cc_expires_in": 0,
                    "pass_expires_in": 100
                }),
            )
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json["error"], "invalid_request");
    }

    #[tokio::test]
    async fn test_duplicate_scope_is_rejected() {
        let fixture = TestFixture::new().await;
        fixture.register_scope("basic", 300, 100).await;

        let response = fixture
            .post(
                "/oauth20/scope",
                &json!({
                    "name": "basic",
                    "description": "again",
                    "cc_expires_in": 1,
                    "pass_expires_in": 1
                }),
            )
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_unknown_scope_is_not_found() {
        let fixture = TestFixture::new().await;

        let response = fixture.delete("/oauth20/scope/missing").await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json["error"], "scope_not_found");
    }
}
