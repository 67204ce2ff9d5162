//! Presentation-level configuration
//!
//! Resolved output settings: the configured defaults with CLI flags applied.

use pestwatch_domain::OutputFormat;
use serde::{Deserialize, Serialize};

/// Output configuration for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format for predictions and history
    pub format: OutputFormat,
    /// Enable colored terminal output
    pub color: bool,
    /// Show a spinner while waiting for the classifier
    pub show_progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Full,
            color: true,
            show_progress: true,
        }
    }
}

impl OutputConfig {
    /// Apply a per-command `--output` flag
    pub fn with_format_override(mut self, format: Option<OutputFormat>) -> Self {
        if let Some(format) = format {
            self.format = format;
        }
        self
    }

    /// Progress goes to stderr; JSON output stays clean of it
    pub fn wants_progress(&self) -> bool {
        self.show_progress && self.format != OutputFormat::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_override() {
        let config = OutputConfig::default().with_format_override(Some(OutputFormat::Label));
        assert_eq!(config.format, OutputFormat::Label);

        let config = OutputConfig::default().with_format_override(None);
        assert_eq!(config.format, OutputFormat::Full);
    }

    #[test]
    fn test_no_progress_for_json() {
        let config = OutputConfig::default().with_format_override(Some(OutputFormat::Json));
        assert!(!config.wants_progress());
        assert!(OutputConfig::default().wants_progress());
    }
}
