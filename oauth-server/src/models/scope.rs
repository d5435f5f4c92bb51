use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

/// A named permission bundle with grant-specific token lifetimes.
///
/// The scope name doubles as the registry key; the two expiry fields
/// parameterize every token issued under the scope, depending on the
/// grant that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Scope {
    /// Scope name, unique, at least two characters
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Token lifetime in seconds under the client_credentials grant
    #[serde(default)]
    pub cc_expires_in: u64,
    /// Token lifetime in seconds under the password/refresh_token grants
    #[serde(default)]
    pub pass_expires_in: u64,
}

impl Scope {
    /// A scope is valid iff the name has at least two characters, the
    /// description is present and both expiry fields are positive.
    pub fn validate(&self) -> bool {
        self.name.len() >= 2
            && !self.description.is_empty()
            && self.cc_expires_in > 0
            && self.pass_expires_in > 0
    }
}

/// Split a space-separated scope string into its names.
pub fn scope_names(scope: &str) -> Vec<&str> {
    scope.split_whitespace().collect()
}

/// Whether every name in `requested` appears in `entitled`.
///
/// An empty request is NOT a subset here: callers that want to default an
/// absent scope to the client's registered one must do so before calling.
pub fn is_subset(requested: &str, entitled: &str) -> bool {
    let entitled: HashSet<&str> = scope_names(entitled).into_iter().collect();
    let requested = scope_names(requested);
    !requested.is_empty() && requested.iter().all(|name| entitled.contains(name))
}
