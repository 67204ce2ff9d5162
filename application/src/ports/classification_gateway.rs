//! Classification gateway port
//!
//! Defines the interface for calling the remote pest classifier.

use async_trait::async_trait;
use pestwatch_domain::{PredictionRequest, PredictionResult};
use thiserror::Error;

/// Errors from a remote call (classification or chat)
///
/// A transport error never carries a partial result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Service unreachable: {0}")]
    Unreachable(String),

    #[error("Service responded with HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    #[error("Request could not be encoded: {0}")]
    InvalidRequest(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request cancelled")]
    Cancelled,
}

impl TransportError {
    /// Whether resubmitting the same request can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Unreachable(_) | TransportError::Timeout => true,
            TransportError::Status { status, .. } => *status >= 500 || *status == 429,
            TransportError::MalformedBody(_)
            | TransportError::InvalidRequest(_)
            | TransportError::Cancelled => false,
        }
    }
}

/// Gateway to the remote classifier
///
/// Implementations make exactly one network call per invocation and never
/// retry. A blank request text is omitted from the outbound call, and a
/// confidence the service does not report stays `None`.
#[async_trait]
pub trait ClassificationGateway: Send + Sync {
    async fn classify(&self, request: &PredictionRequest)
    -> Result<PredictionResult, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(TransportError::Timeout.is_retryable());
        assert!(TransportError::Unreachable("refused".into()).is_retryable());
        assert!(
            TransportError::Status {
                status: 503,
                detail: String::new()
            }
            .is_retryable()
        );
        assert!(
            !TransportError::Status {
                status: 422,
                detail: String::new()
            }
            .is_retryable()
        );
        assert!(!TransportError::MalformedBody("eof".into()).is_retryable());
        assert!(!TransportError::InvalidRequest("bad mime".into()).is_retryable());
    }
}
