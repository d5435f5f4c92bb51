use crate::api::token::TokenResponse;
use crate::create_app;
use crate::models::ClientApplication;
use crate::state::tests::create_test_state;
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tower::ServiceExt;
use url::form_urlencoded;

/// Test fixture wrapping a complete application over in-memory storage.
///
/// Provides request helpers plus shortcuts for the registration steps most
/// flow tests need (a scope, a client, a first token).
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// The state behind the router
    pub state: AppState,
}

impl TestFixture {
    pub async fn new() -> Self {
        // Initialize test logger
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();

        let state = create_test_state();
        let app = create_app(state.clone()).await;

        Self { app, state }
    }

    /// Sends a request and returns a TestResponse.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| json!({}))
        } else {
            json!({})
        };

        TestResponse { status, json }
    }

    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri.as_ref())
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn post<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        self.send_json(Method::POST, uri, body).await
    }

    pub async fn put<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        self.send_json(Method::PUT, uri, body).await
    }

    pub async fn delete(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri(uri.as_ref())
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    async fn send_json<T: Serialize>(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        body: &T,
    ) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = Request::builder()
            .method(method)
            .uri(uri.as_ref())
            .header("Content-Type", "application/json")
            .body(Body::from(json_body))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a POST request with a form-encoded body, as the token
    /// endpoint expects.
    pub async fn post_form(&self, uri: impl AsRef<str>, fields: &[(&str, &str)]) -> TestResponse {
        self.post_form_with_headers(uri, fields, &[]).await
    }

    /// Form-encoded POST with additional headers (e.g. Basic authentication).
    pub async fn post_form_with_headers(
        &self,
        uri: impl AsRef<str>,
        fields: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in fields {
            serializer.append_pair(name, value);
        }
        let body = serializer.finish();

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri.as_ref())
            .header("Content-Type", "application/x-www-form-urlencoded");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = builder
            .body(Body::from(body))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Register a scope with the given grant-specific expiries.
    pub async fn register_scope(&self, name: &str, cc_expires_in: u64, pass_expires_in: u64) {
        self.post(
            "/oauth20/scope",
            &json!({
                "name": name,
                "description": "some description",
                "cc_expires_in": cc_expires_in,
                "pass_expires_in": pass_expires_in
            }),
        )
        .await
        .assert_ok();
    }

    /// Register a client application entitled to the given scope.
    pub async fn register_client(&self, scope: &str) -> ClientApplication {
        let response = self
            .post(
                "/oauth20/application",
                &json!({
                    "name": "Test App",
                    "description": "a test application",
                    "redirect_uri": "https://example.com/callback",
                    "scope": scope
                }),
            )
            .await;
        response.assert_ok();
        response.json_as()
    }

    /// Issue an authorization code for the client and extract it from the
    /// returned redirect URI.
    pub async fn issue_code(&self, client: &ClientApplication) -> String {
        let response = self
            .get(format!(
                "/oauth20/authorize?response_type=code&client_id={}&redirect_uri={}",
                client.client_id, client.redirect_uri
            ))
            .await;
        response.assert_ok();

        let redirect_uri = response.json["redirect_uri"]
            .as_str()
            .expect("missing redirect_uri");
        let url = url::Url::parse(redirect_uri).expect("redirect_uri is not a URL");
        url.query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned())
            .expect("redirect_uri carries no code")
    }

    /// Obtain a token through the client_credentials grant.
    pub async fn client_credentials_token(&self, client: &ClientApplication) -> TokenResponse {
        let response = self
            .post_form(
                "/oauth20/token",
                &[
                    ("grant_type", "client_credentials"),
                    ("client_id", &client.client_id),
                    ("client_secret", &client.client_secret),
                ],
            )
            .await;
        response.assert_ok();
        response.json_as()
    }
}

/// Response from a test request with convenient access to status and JSON
/// body.
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
}

impl TestResponse {
    /// Asserts that the response has the expected status code.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    /// Asserts that the response status is OK (200).
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Converts the response body to the specified type.
    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}
