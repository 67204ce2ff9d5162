//! Identity provider port

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the identity provider
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("Identity storage error: {0}")]
    Storage(String),
}

/// Anonymous sign-in primitive
///
/// Returns a stable identifier, or `None` when the provider has no identity
/// to offer. Identity bootstrap falls back to a locally generated id in both
/// the `None` and the error case.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_anonymously(&self) -> Result<Option<String>, IdentityError>;
}

/// Provider that never signs in, forcing the local fallback
pub struct NoIdentityProvider;

#[async_trait]
impl IdentityProvider for NoIdentityProvider {
    async fn sign_in_anonymously(&self) -> Result<Option<String>, IdentityError> {
        Ok(None)
    }
}
