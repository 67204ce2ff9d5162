//! Domain error types

use thiserror::Error;

/// Local validation failures.
///
/// These are detected before any network or storage call is made and never
/// reach the transport layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please provide an image to classify")]
    MissingImage,

    #[error("Identity is not ready yet; history and submissions are disabled")]
    IdentityNotReady,

    #[error("Question cannot be empty")]
    EmptyQuestion,

    #[error("Confidence {0} is outside the range [0, 1]")]
    ConfidenceOutOfRange(String),

    #[error("'{0}' is not a valid MIME type")]
    InvalidMimeType(String),
}

impl ValidationError {
    /// Whether the failure is resolved by waiting for identity bootstrap
    /// rather than by changing the input.
    pub fn is_identity_gate(&self) -> bool {
        matches!(self, ValidationError::IdentityNotReady)
    }
}
