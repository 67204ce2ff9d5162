//! Filesystem preview store
//!
//! Writes each submitted image into a preview directory and hands out a
//! `file://` reference to it.

use async_trait::async_trait;
use pestwatch_application::{PreviewError, PreviewStore};
use pestwatch_domain::{ImagePayload, PreviewRef};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SCHEME: &str = "file://";

/// Preview store writing image copies to a directory
pub struct FsPreviewStore {
    dir: PathBuf,
}

impl FsPreviewStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Local path behind a reference, only if it points into this store.
    fn resolve(&self, preview: &PreviewRef) -> Option<PathBuf> {
        let path = PathBuf::from(preview.as_str().strip_prefix(SCHEME)?);
        let dir = std::path::absolute(&self.dir).ok()?;
        (path.parent() == Some(dir.as_path())).then_some(path)
    }
}

#[async_trait]
impl PreviewStore for FsPreviewStore {
    async fn create(&self, image: &ImagePayload) -> Result<PreviewRef, PreviewError> {
        let dir = std::path::absolute(&self.dir)
            .map_err(|e| PreviewError::Storage(format!("{}: {}", self.dir.display(), e)))?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PreviewError::Storage(format!("{}: {}", dir.display(), e)))?;

        let path = dir.join(format!(
            "{}.{}",
            uuid::Uuid::new_v4().simple(),
            image.extension()
        ));
        tokio::fs::write(&path, image.bytes())
            .await
            .map_err(|e| PreviewError::Storage(format!("{}: {}", path.display(), e)))?;

        debug!("Stored preview {}", path.display());
        Ok(PreviewRef::new(format!("{}{}", SCHEME, path.display())))
    }

    async fn release(&self, preview: &PreviewRef) {
        let Some(path) = self.resolve(preview) else {
            warn!("Refusing to release foreign preview {}", preview);
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!("Released preview {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not release preview {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> ImagePayload {
        ImagePayload::new(vec![0x89, b'P', b'N', b'G', 1, 2], "leaf.png")
    }

    #[tokio::test]
    async fn test_create_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPreviewStore::new(dir.path().join("previews"));

        let preview = store.create(&png()).await.unwrap();
        assert!(preview.as_str().starts_with("file://"));
        assert!(preview.as_str().ends_with(".png"));

        let path = PathBuf::from(preview.as_str().strip_prefix(SCHEME).unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), png().bytes());

        store.release(&preview).await;
        assert!(!path.exists());

        // Second release is a no-op
        store.release(&preview).await;
    }

    #[tokio::test]
    async fn test_release_ignores_foreign_refs() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("keep.png");
        std::fs::write(&outside, b"x").unwrap();
        let store = FsPreviewStore::new(dir.path().join("previews"));

        store
            .release(&PreviewRef::new(format!("file://{}", outside.display())))
            .await;
        store.release(&PreviewRef::new("https://example.org/a.png")).await;

        assert!(outside.exists());
    }
}
