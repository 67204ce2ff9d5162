//! Preview store port
//!
//! A preview is a stored copy of a submitted image that history records can
//! reference instead of embedding the raw bytes.

use async_trait::async_trait;
use pestwatch_domain::{ImagePayload, PreviewRef};
use thiserror::Error;

/// Errors from preview storage
#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("Preview storage error: {0}")]
    Storage(String),
}

/// Store for transient image previews
#[async_trait]
pub trait PreviewStore: Send + Sync {
    /// Store a preview of `image` and return a reference to it.
    async fn create(&self, image: &ImagePayload) -> Result<PreviewRef, PreviewError>;

    /// Release a preview no record references. Releasing twice is a no-op.
    async fn release(&self, preview: &PreviewRef);
}

/// Store that keeps no previews; records carry no preview reference
pub struct NoPreviewStore;

#[async_trait]
impl PreviewStore for NoPreviewStore {
    async fn create(&self, _image: &ImagePayload) -> Result<PreviewRef, PreviewError> {
        Err(PreviewError::Storage("previews disabled".to_string()))
    }

    async fn release(&self, _preview: &PreviewRef) {}
}
