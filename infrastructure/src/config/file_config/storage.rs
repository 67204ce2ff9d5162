//! Storage configuration from TOML (`[history]`, `[identity]`, `[previews]`)

use super::expand_path;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw history configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHistoryConfig {
    /// Application namespace for history collections
    pub namespace: String,
    /// JSON file holding all collections (defaults to the data directory)
    pub file: Option<String>,
    /// Keep history in memory only; nothing survives the process
    pub in_memory: bool,
}

impl Default for FileHistoryConfig {
    fn default() -> Self {
        Self {
            namespace: "pestpredictionapp".to_string(),
            file: None,
            in_memory: false,
        }
    }
}

impl FileHistoryConfig {
    /// Resolved history file, `None` when history is memory-only
    pub fn file_path(&self) -> Option<PathBuf> {
        if self.in_memory {
            return None;
        }
        self.file
            .as_deref()
            .map(expand_path)
            .or_else(|| default_data_path("history.json"))
    }
}

/// Raw identity configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileIdentityConfig {
    /// Sign in through the device identity provider; when false every run
    /// gets a fresh local identity
    pub anonymous_sign_in: bool,
    /// File holding the device identity
    pub file: Option<String>,
}

impl Default for FileIdentityConfig {
    fn default() -> Self {
        Self {
            anonymous_sign_in: true,
            file: None,
        }
    }
}

impl FileIdentityConfig {
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file
            .as_deref()
            .map(expand_path)
            .or_else(|| default_data_path("identity.json"))
    }
}

/// Raw preview storage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePreviewsConfig {
    /// Directory for stored image previews
    pub dir: Option<String>,
    /// Disable previews; records carry no preview reference
    pub disabled: bool,
}

impl FilePreviewsConfig {
    pub fn dir_path(&self) -> Option<PathBuf> {
        if self.disabled {
            return None;
        }
        self.dir
            .as_deref()
            .map(expand_path)
            .or_else(|| default_data_path("previews"))
    }
}

fn default_data_path(name: &str) -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("pestwatch").join(name))
}
