//! Registries and stores layered on top of the storage backend: one per
//! record kind, each owning the domain rules for its records. The
//! authorization engine orchestrates grant flows across them.

pub(crate) mod clients;
pub(crate) mod codes;
pub(crate) mod scopes;
pub(crate) mod tokens;

pub(crate) use clients::ClientRegistry;
pub(crate) use codes::CodeStore;
pub(crate) use scopes::ScopeRegistry;
pub(crate) use tokens::TokenStore;
