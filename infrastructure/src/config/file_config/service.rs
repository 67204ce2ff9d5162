//! Service configuration from TOML (`[service]` section)

use serde::{Deserialize, Serialize};

/// Remote classification service endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServiceConfig {
    /// Base URL of the classification service
    pub base_url: String,
    /// Path of the image classification endpoint
    pub predict_path: String,
    /// Path of the assistant endpoint
    pub chat_path: String,
    /// Request timeout in seconds (0 disables the client-side deadline)
    pub timeout_secs: u64,
}

impl Default for FileServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            predict_path: "/predict-all/".to_string(),
            chat_path: "/chat/".to_string(),
            timeout_secs: 60,
        }
    }
}

impl FileServiceConfig {
    pub fn predict_url(&self) -> String {
        join_url(&self.base_url, &self.predict_path)
    }

    pub fn chat_url(&self) -> String {
        join_url(&self.base_url, &self.chat_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
