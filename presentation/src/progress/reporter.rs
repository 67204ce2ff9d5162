//! Progress reporting for prediction submissions

use crate::output::sanitize::sanitize_inline;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use pestwatch_application::ports::progress::SubmissionProgress;
use pestwatch_application::{TransportError, WriteError};
use pestwatch_domain::{Generation, PredictionResult, RecordId};
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress with a spinner while the classifier works
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Clear the spinner if one is still running.
    pub fn finish(&self) {
        if let Some(pb) = self.take() {
            pb.finish_and_clear();
        }
    }

    fn take(&self) -> Option<ProgressBar> {
        self.spinner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionProgress for ProgressReporter {
    fn on_submit_start(&self, generation: Generation) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_prefix(format!("Prediction {}", generation));
        pb.set_message("Classifying image...");
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Some(previous) = self
            .spinner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(pb)
        {
            previous.finish_and_clear();
        }
    }

    fn on_prediction(&self, _result: &PredictionResult) {
        self.finish();
    }

    fn on_prediction_failed(&self, _error: &TransportError) {
        self.finish();
    }

    fn on_history_save_failed(&self, error: &WriteError) {
        eprintln!("{} {}", "!".yellow(), error);
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl SubmissionProgress for SimpleProgress {
    fn on_submit_start(&self, generation: Generation) {
        eprintln!(
            "{} {} {}",
            "->".cyan(),
            format!("Prediction {}", generation).bold(),
            "classifying image..."
        );
    }

    fn on_prediction(&self, result: &PredictionResult) {
        eprintln!("  {} {}", "v".green(), sanitize_inline(&result.label));
    }

    fn on_prediction_failed(&self, error: &TransportError) {
        eprintln!("  {} {}", "x".red(), error);
    }

    fn on_history_saved(&self, id: &RecordId) {
        eprintln!("  {} saved as {}", "v".green(), id);
    }

    fn on_history_save_failed(&self, error: &WriteError) {
        eprintln!("  {} {}", "!".yellow(), error);
    }
}
