//! The authorization engine: the state machine behind the grant flows.
//!
//! Every protocol operation is a method on [`AuthorizationServer`], which
//! orchestrates the client/scope registries and the code/token stores and
//! returns either a value or a typed [`AuthError`]. The transport layer
//! only decodes requests, calls one method and serializes the outcome.

pub(crate) mod introspect;

use crate::config::OAuthConfig;
use crate::errors::AuthError;
use crate::models::{is_subset, AccessToken, ClientApplication};
use crate::registry::clients::UpdateClientRequest;
use crate::registry::scopes::GrantClass;
use crate::registry::{ClientRegistry, CodeStore, ScopeRegistry, TokenStore};
use crate::storage::Storage;
use log::debug;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;
use utoipa::ToSchema;

pub const RESPONSE_TYPE_CODE: &str = "code";
pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";
pub const GRANT_CLIENT_CREDENTIALS: &str = "client_credentials";
pub const GRANT_PASSWORD: &str = "password";
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

/// Query parameters of an authorization request.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeParams {
    pub response_type: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: Option<String>,
    pub state: Option<String>,
}

/// Parameters of a token request, the union of all grant types' fields.
/// Which fields are required depends on `grant_type`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TokenParams {
    /// One of authorization_code, client_credentials, password, refresh_token
    pub grant_type: String,
    /// Client identifier; may instead arrive via HTTP Basic authentication
    pub client_id: Option<String>,
    /// Client secret; may instead arrive via HTTP Basic authentication
    pub client_secret: Option<String>,
    /// Authorization code (authorization_code grant)
    pub code: Option<String>,
    /// Redirect URI bound to the code (authorization_code grant)
    pub redirect_uri: Option<String>,
    /// Resource-owner identifier (password grant)
    pub username: Option<String>,
    /// Resource-owner password (password grant)
    pub password: Option<String>,
    /// Refresh token to exchange (refresh_token grant)
    pub refresh_token: Option<String>,
    /// Requested scope, defaults per grant when absent
    pub scope: Option<String>,
}

/// The engine owning all protocol state transitions.
pub struct AuthorizationServer {
    clients: ClientRegistry,
    scopes: ScopeRegistry,
    codes: CodeStore,
    tokens: TokenStore,
}

impl AuthorizationServer {
    pub fn new(storage: Arc<Storage>, config: &OAuthConfig) -> Self {
        Self {
            clients: ClientRegistry::new(storage.clone()),
            scopes: ScopeRegistry::new(storage.clone(), config.token.default_expires_in),
            codes: CodeStore::new(storage.clone(), config.token.code_ttl),
            tokens: TokenStore::new(storage),
        }
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub fn scopes(&self) -> &ScopeRegistry {
        &self.scopes
    }

    /// Issue an authorization code and return the client's redirect URI
    /// with `code` (and `state`, when given) appended as query parameters.
    pub async fn issue_authorization_code(
        &self,
        params: &AuthorizeParams,
    ) -> Result<String, AuthError> {
        if params.response_type != RESPONSE_TYPE_CODE {
            return Err(AuthError::UnsupportedResponseType);
        }

        let client = self
            .clients
            .lookup(&params.client_id)
            .await?
            .filter(ClientApplication::is_active)
            .ok_or(AuthError::InvalidClientId)?;

        if params.redirect_uri != client.redirect_uri {
            return Err(AuthError::RedirectUriMismatch);
        }

        let scope = self
            .scopes
            .valid_scope_for_client(params.scope.as_deref(), &client)
            .await?;

        let code = self
            .codes
            .issue(
                &client.client_id,
                &client.redirect_uri,
                &scope,
                params.state.clone(),
            )
            .await?;

        let mut redirect = Url::parse(&client.redirect_uri).map_err(|_| {
            AuthError::InvalidRequest("registered redirect_uri is not a valid URL".to_string())
        })?;
        redirect.query_pairs_mut().append_pair("code", &code.code);
        if let Some(state) = &code.state {
            redirect.query_pairs_mut().append_pair("state", state);
        }
        Ok(redirect.to_string())
    }

    /// Update a client application: a thin pass-through to the client
    /// registry, gated by the client's own credentials in the request.
    pub async fn update_client_application(
        &self,
        request: &UpdateClientRequest,
    ) -> Result<ClientApplication, AuthError> {
        self.clients.update(request, &self.scopes).await
    }

    /// Issue an access token, dispatching on `grant_type`.
    pub async fn issue_access_token(&self, params: &TokenParams) -> Result<AccessToken, AuthError> {
        match params.grant_type.as_str() {
            GRANT_AUTHORIZATION_CODE => self.authorization_code_grant(params).await,
            GRANT_CLIENT_CREDENTIALS => self.client_credentials_grant(params).await,
            GRANT_PASSWORD => self.password_grant(params).await,
            GRANT_REFRESH_TOKEN => self.refresh_token_grant(params).await,
            other => {
                debug!("rejected unsupported grant_type '{}'", other);
                Err(AuthError::UnsupportedGrantType)
            }
        }
    }

    /// Authenticate the client named in the token request.
    async fn authenticate_client(
        &self,
        params: &TokenParams,
    ) -> Result<ClientApplication, AuthError> {
        match (&params.client_id, &params.client_secret) {
            (Some(client_id), Some(client_secret)) => {
                self.clients.authenticate(client_id, client_secret).await
            }
            _ => Err(AuthError::InvalidClient),
        }
    }

    /// Redeem an authorization code for a token.
    ///
    /// The storage-level take is the atomic single-use step: once client
    /// authentication has succeeded, a redemption attempt consumes the code
    /// even when a later binding check fails, so a leaked code cannot be
    /// retried into a success.
    async fn authorization_code_grant(
        &self,
        params: &TokenParams,
    ) -> Result<AccessToken, AuthError> {
        let code_value = params
            .code
            .as_deref()
            .ok_or_else(|| AuthError::InvalidRequest("code is required".to_string()))?;
        let redirect_uri = params
            .redirect_uri
            .as_deref()
            .ok_or_else(|| AuthError::InvalidRequest("redirect_uri is required".to_string()))?;
        let client = self.authenticate_client(params).await?;

        let code = self
            .codes
            .consume(code_value)
            .await?
            .ok_or(AuthError::InvalidGrant(
                "authorization code is invalid or already used",
            ))?;

        if code.client_id != client.client_id {
            return Err(AuthError::InvalidGrant(
                "authorization code was issued to another client",
            ));
        }
        if !code.valid || code.is_expired() {
            return Err(AuthError::InvalidGrant("authorization code has expired"));
        }
        if code.redirect_uri != redirect_uri {
            return Err(AuthError::RedirectUriMismatch);
        }

        let expires_in = self
            .scopes
            .expires_in_for(GrantClass::ClientCredentials, &code.scope)
            .await?;
        self.tokens
            .issue(&client.client_id, &code.scope, expires_in, true, None)
            .await
    }

    /// Direct token issuance against the client's own credentials. No
    /// refresh token: the client can always re-request.
    async fn client_credentials_grant(
        &self,
        params: &TokenParams,
    ) -> Result<AccessToken, AuthError> {
        let client = self.authenticate_client(params).await?;
        let scope = self
            .scopes
            .valid_scope_for_client(params.scope.as_deref(), &client)
            .await?;
        let expires_in = self
            .scopes
            .expires_in_for(GrantClass::ClientCredentials, &scope)
            .await?;
        self.tokens
            .issue(&client.client_id, &scope, expires_in, false, None)
            .await
    }

    /// Resource-owner password flow. Credentials arrive directly in the
    /// request; the resource-owner identifier is recorded on the token.
    async fn password_grant(&self, params: &TokenParams) -> Result<AccessToken, AuthError> {
        let client = self.authenticate_client(params).await?;
        let username = params
            .username
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| AuthError::InvalidRequest("username is required".to_string()))?;
        if params
            .password
            .as_deref()
            .map_or(true, |p| p.is_empty())
        {
            return Err(AuthError::InvalidRequest("password is required".to_string()));
        }

        let scope = self
            .scopes
            .valid_scope_for_client(params.scope.as_deref(), &client)
            .await?;
        let expires_in = self
            .scopes
            .expires_in_for(GrantClass::Password, &scope)
            .await?;
        self.tokens
            .issue(
                &client.client_id,
                &scope,
                expires_in,
                true,
                Some(username.to_string()),
            )
            .await
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// Rotation policy: the refresh token is consumed atomically and a new
    /// one is minted with the new access token; the parent access token is
    /// invalidated. A replayed refresh token, or the loser of a concurrent
    /// exchange, fails with invalid_grant.
    async fn refresh_token_grant(&self, params: &TokenParams) -> Result<AccessToken, AuthError> {
        let refresh_token = params
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthError::InvalidRequest("refresh_token is required".to_string()))?;
        let client = self.authenticate_client(params).await?;

        let parent = self
            .tokens
            .consume_refresh(refresh_token)
            .await?
            .ok_or(AuthError::InvalidGrant(
                "refresh token is invalid or already used",
            ))?;

        if parent.client_id != client.client_id {
            return Err(AuthError::InvalidGrant(
                "refresh token was issued to another client",
            ));
        }
        if !parent.valid {
            return Err(AuthError::InvalidGrant(
                "parent access token has been revoked",
            ));
        }

        let scope = match params.scope.as_deref() {
            None => parent.scope.clone(),
            Some(requested) if is_subset(requested, &parent.scope) => requested.to_string(),
            Some(_) => return Err(AuthError::InvalidScope),
        };

        self.tokens.invalidate(&parent.token).await?;
        let expires_in = self
            .scopes
            .expires_in_for(GrantClass::Password, &scope)
            .await?;
        self.tokens
            .issue(
                &client.client_id,
                &scope,
                expires_in,
                true,
                parent.user_id.clone(),
            )
            .await
    }
}
