//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod logging;
mod output;
mod service;
mod storage;

pub use logging::FileLoggingConfig;
pub use output::{FileOutputConfig, WatchRedraw};
pub use service::FileServiceConfig;
pub use storage::{FileHistoryConfig, FileIdentityConfig, FilePreviewsConfig};

use pestwatch_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Remote classification service
    pub service: FileServiceConfig,
    /// History storage
    pub history: FileHistoryConfig,
    /// Identity resolution
    pub identity: FileIdentityConfig,
    /// Image previews
    pub previews: FilePreviewsConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Checks:
    /// 1. `service.base_url` uses http or https (error)
    /// 2. `history.namespace` is not empty (error)
    /// 3. `service.timeout_secs` is not zero (warning)
    /// 4. Configured paths are absolute or home-relative (warning)
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        let base_url = self.service.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidUrl {
                    field: "service.base_url".to_string(),
                    value: self.service.base_url.clone(),
                },
                format!(
                    "service.base_url: '{}' is not an http(s) URL",
                    self.service.base_url
                ),
            ));
        }

        if self.history.namespace.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyValue {
                    field: "history.namespace".to_string(),
                },
                "history.namespace cannot be empty",
            ));
        }

        if self.service.timeout_secs == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ZeroValue {
                    field: "service.timeout_secs".to_string(),
                },
                "service.timeout_secs is 0; requests wait without a client-side deadline",
            ));
        }

        let paths = [
            ("history.file", &self.history.file),
            ("identity.file", &self.identity.file),
            ("previews.dir", &self.previews.dir),
            ("logging.activity_log", &self.logging.activity_log),
            ("logging.file", &self.logging.file),
        ];
        for (field, value) in paths {
            if let Some(value) = value
                && !(value.starts_with('/') || value.starts_with("~/"))
            {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::RelativePath {
                        field: field.to_string(),
                        value: value.clone(),
                    },
                    format!(
                        "{}: '{}' is relative and resolves against the working directory",
                        field, value
                    ),
                ));
            }
        }

        issues
    }
}

/// Expand a leading `~/` to the home directory.
pub(crate) fn expand_path(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pestwatch_domain::{OutputFormat, Severity};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[service]
base_url = "https://pests.example.org"
timeout_secs = 15

[history]
namespace = "orchard"
file = "/var/lib/pestwatch/history.json"

[identity]
anonymous_sign_in = false

[output]
format = "json"
color = false

[logging]
activity_log = "~/.local/share/pestwatch/activity.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.service.base_url, "https://pests.example.org");
        assert_eq!(config.service.timeout_secs, 15);
        assert_eq!(config.service.predict_path, "/predict-all/");
        assert_eq!(config.history.namespace, "orchard");
        assert!(!config.identity.anonymous_sign_in);
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert!(!config.output.color);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[service]
chat_path = "/assistant/"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.service.chat_path, "/assistant/");
        // Defaults should apply
        assert_eq!(config.service.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.history.namespace, "pestpredictionapp");
        assert!(config.identity.anonymous_sign_in);
        assert!(config.output.color);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_errors() {
        let mut config = FileConfig::default();
        config.service.base_url = "ftp://files.example.org".to_string();
        config.history.namespace = "  ".to_string();

        let issues = config.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.is_error()));
        assert!(matches!(issues[0].code, ConfigIssueCode::InvalidUrl { .. }));
        assert!(matches!(issues[1].code, ConfigIssueCode::EmptyValue { .. }));
    }

    #[test]
    fn test_validate_reports_warnings() {
        let mut config = FileConfig::default();
        config.service.timeout_secs = 0;
        config.previews.dir = Some("previews".to_string());

        let issues = config.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.severity == Severity::Warning));
        assert!(issues.iter().any(|i| matches!(
            &i.code,
            ConfigIssueCode::RelativePath { field, .. } if field == "previews.dir"
        )));
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path("/abs/file"), PathBuf::from("/abs/file"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/x.json"), home.join("x.json"));
        }
    }
}
