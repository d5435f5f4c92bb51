use utoipa::OpenApi;

pub(crate) const OAUTH_TAG: &str = "OAuth 2.0 API";
pub(crate) const APPLICATION_TAG: &str = "Application API";
pub(crate) const SCOPE_TAG: &str = "Scope API";
pub(crate) const HEALTH_TAG: &str = "Health API";

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = OAUTH_TAG, description = "Authorization code, token, validation and revocation endpoints"),
        (name = APPLICATION_TAG, description = "Client application registration and introspection"),
        (name = SCOPE_TAG, description = "Scope administration endpoints"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    ),
    info(
        title = "OAuth 2.0 Authorization Server",
        description = "Issues, validates and revokes access tokens per RFC 6749 grant flows",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;
