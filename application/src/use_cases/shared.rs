//! Shared utilities for use cases.
//!
//! Session gating used by the submission orchestrator and the history view.

use pestwatch_domain::{IdentityId, Session, ValidationError};
use thiserror::Error;
use tracing::error;

/// Rejected attempts to rebind a component to another session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionBindError {
    #[error("Identity switched mid-session from {current} to {proposed}")]
    IdentityMismatch {
        current: IdentityId,
        proposed: IdentityId,
    },

    #[error("A ready session cannot be replaced by an unresolved one")]
    Unresolved,
}

/// Identity of a ready session, or `IdentityNotReady`.
pub(crate) fn require_identity(session: &Session) -> Result<&IdentityId, ValidationError> {
    session.identity().ok_or(ValidationError::IdentityNotReady)
}

/// Decide whether `proposed` may replace `current`.
///
/// Moving from unresolved to ready is allowed, as is rebinding the same
/// identity. Switching identities or going back to unresolved is a defect and
/// is reported, never tolerated.
pub(crate) fn rebind(current: &Session, proposed: Session) -> Result<Session, SessionBindError> {
    match (current.identity(), proposed.identity()) {
        (None, _) => Ok(proposed),
        (Some(_), None) => Err(SessionBindError::Unresolved),
        (Some(cur), Some(new)) if cur == new => Ok(proposed),
        (Some(cur), Some(new)) => {
            error!("Identity switched mid-session: {} -> {}", cur, new);
            Err(SessionBindError::IdentityMismatch {
                current: cur.clone(),
                proposed: new.clone(),
            })
        }
    }
}
