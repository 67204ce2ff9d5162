//! Session and identity value objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix reserved for identities synthesized on this device.
///
/// Provider-issued identities never start with it, which keeps the two
/// namespaces disjoint.
pub const LOCAL_IDENTITY_PREFIX: &str = "local-";

/// A stable opaque identifier scoping a user's private history (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    /// Wrap an identifier issued by an identity provider.
    ///
    /// Returns `None` for blank ids and for ids inside the reserved local
    /// namespace.
    pub fn from_provider(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() || trimmed.starts_with(LOCAL_IDENTITY_PREFIX) {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Synthesize a fresh, locally unique identity.
    pub fn generate_local() -> Self {
        Self(format!("{}{}", LOCAL_IDENTITY_PREFIX, uuid::Uuid::new_v4()))
    }

    /// Whether this identity was synthesized locally.
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_IDENTITY_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a session's identity came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityOrigin {
    /// Issued by the anonymous sign-in provider
    Provider,
    /// Synthesized locally because the provider failed or returned nothing
    LocalFallback,
}

impl IdentityOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityOrigin::Provider => "provider",
            IdentityOrigin::LocalFallback => "local_fallback",
        }
    }
}

/// One running client instance (Value Object)
///
/// A session starts unresolved and becomes ready exactly once, when identity
/// bootstrap produces a resolved value. Components receive it explicitly and
/// refuse history and submission work while it is not ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    identity: Option<(IdentityId, IdentityOrigin)>,
}

impl Session {
    /// A session whose identity has not been resolved yet.
    pub fn unresolved() -> Self {
        Self { identity: None }
    }

    /// A ready session bound to `identity`.
    pub fn resolved(identity: IdentityId, origin: IdentityOrigin) -> Self {
        Self {
            identity: Some((identity, origin)),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.identity.is_some()
    }

    /// The identity, only once the session is ready.
    pub fn identity(&self) -> Option<&IdentityId> {
        self.identity.as_ref().map(|(id, _)| id)
    }

    pub fn origin(&self) -> Option<IdentityOrigin> {
        self.identity.as_ref().map(|(_, origin)| *origin)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::unresolved()
    }
}
