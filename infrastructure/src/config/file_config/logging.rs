//! Logging configuration from TOML (`[logging]` section)

use super::expand_path;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL activity log; disabled when unset
    pub activity_log: Option<String>,
    /// Diagnostic log file; stderr only when unset
    pub file: Option<String>,
}

impl FileLoggingConfig {
    pub fn activity_log_path(&self) -> Option<PathBuf> {
        self.activity_log.as_deref().map(expand_path)
    }

    pub fn file_path(&self) -> Option<PathBuf> {
        self.file.as_deref().map(expand_path)
    }
}
