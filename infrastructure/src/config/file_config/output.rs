//! `[output]` section: how predictions and history are rendered

use pestwatch_domain::OutputFormat;
use serde::{Deserialize, Serialize};

/// When `history watch` redraws the screen instead of appending snapshots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchRedraw {
    /// Only when stdout is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl WatchRedraw {
    pub fn redraws(self, stdout_is_terminal: bool) -> bool {
        match self {
            WatchRedraw::Auto => stdout_is_terminal,
            WatchRedraw::Always => true,
            WatchRedraw::Never => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Default rendering for `predict` and `history list`; `--output` wins
    pub format: Option<OutputFormat>,
    pub color: bool,
    /// Spinner or status lines on stderr while a submission is in flight
    pub progress: bool,
    pub watch_redraw: WatchRedraw,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
            progress: true,
            watch_redraw: WatchRedraw::Auto,
        }
    }
}

impl FileOutputConfig {
    /// Progress is shown unless disabled here or silenced with `--quiet`.
    pub fn shows_progress(&self, quiet: bool) -> bool {
        self.progress && !quiet
    }
}
