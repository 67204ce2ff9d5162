//! Submission progress port
//!
//! Defines the interface for reporting progress while a prediction is
//! submitted and persisted.

use super::classification_gateway::TransportError;
use super::history_store::WriteError;
use pestwatch_domain::{Generation, PredictionResult, RecordId};

/// Callback for progress updates during a submission
///
/// Implementations live in the presentation layer.
pub trait SubmissionProgress: Send + Sync {
    /// Called once the submission is accepted and the call is about to start
    fn on_submit_start(&self, _generation: Generation) {}

    /// Called when the classification succeeded
    fn on_prediction(&self, result: &PredictionResult);

    /// Called when the classification failed
    fn on_prediction_failed(&self, error: &TransportError);

    /// Called when the result was written to history
    fn on_history_saved(&self, _id: &RecordId) {}

    /// Called when the history write failed; the prediction still stands
    fn on_history_save_failed(&self, _error: &WriteError) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl SubmissionProgress for NoProgress {
    fn on_prediction(&self, _result: &PredictionResult) {}
    fn on_prediction_failed(&self, _error: &TransportError) {}
}
