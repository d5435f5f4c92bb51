use serde::Deserialize;

/// Token and authorization-code policy.
///
/// Scope definitions carry the grant-specific token lifetimes; these are
/// the process-wide constants that are not scope-derived.
#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    /// Authorization code lifetime in seconds (default: 10 minutes)
    #[serde(default = "default_code_ttl")]
    pub code_ttl: u64,

    /// Token lifetime in seconds used when no named scope resolves to a
    /// registered definition (default: 30 minutes)
    #[serde(default = "default_expires_in")]
    pub default_expires_in: u64,
}

fn default_code_ttl() -> u64 {
    600
}

fn default_expires_in() -> u64 {
    1800
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            code_ttl: default_code_ttl(),
            default_expires_in: default_expires_in(),
        }
    }
}
