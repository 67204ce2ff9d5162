//! Device identity provider
//!
//! Signs in "anonymously" by issuing a random device id on first use and
//! persisting it, so the same device keeps the same history across runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pestwatch_application::{IdentityError, IdentityProvider};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Serialize, Deserialize)]
struct DeviceIdentityFile {
    device_id: String,
    created_at: DateTime<Utc>,
}

/// Identity provider backed by a JSON file on this device
pub struct DeviceIdentityProvider {
    path: PathBuf,
}

impl DeviceIdentityProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_existing(&self) -> Result<Option<String>, IdentityError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(IdentityError::Storage(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )));
            }
        };
        let stored: DeviceIdentityFile = serde_json::from_str(&content).map_err(|e| {
            IdentityError::Storage(format!("{} is corrupt: {}", self.path.display(), e))
        })?;
        Ok(Some(stored.device_id))
    }

    async fn issue(&self) -> Result<String, IdentityError> {
        let stored = DeviceIdentityFile {
            device_id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| IdentityError::Storage(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| IdentityError::Storage(format!("{}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| IdentityError::Storage(format!("{}: {}", self.path.display(), e)))?;

        info!("Issued new device identity ({})", self.path.display());
        Ok(stored.device_id)
    }
}

#[async_trait]
impl IdentityProvider for DeviceIdentityProvider {
    async fn sign_in_anonymously(&self) -> Result<Option<String>, IdentityError> {
        if let Some(id) = self.read_existing().await? {
            debug!("Using device identity from {}", self.path.display());
            return Ok(Some(id));
        }
        self.issue().await.map(Some)
    }
}
