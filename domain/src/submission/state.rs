//! Submission state machine entities

use crate::history::record::RecordId;
use crate::prediction::result::PredictionResult;
use serde::{Deserialize, Serialize};

/// Tag distinguishing successive orchestrator cycles.
///
/// Every classification call is issued under the generation current at submit
/// time. `reset()` advances the generation, so a response tagged with an older
/// value is stale and must be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Persistence outcome of a successful prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Persistence {
    /// Append has not completed yet
    Pending,
    /// Append succeeded
    Saved(RecordId),
    /// Append was not attempted (history disabled for this submission)
    Skipped,
    /// Append failed; the prediction itself still stands
    Failed(String),
}

impl Persistence {
    pub fn is_saved(&self) -> bool {
        matches!(self, Persistence::Saved(_))
    }
}

/// Observable state of a submission orchestrator
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmissionState {
    /// Ready to accept a new request
    #[default]
    Idle,
    /// One classification call is in flight
    Submitting { generation: Generation },
    /// Classification succeeded
    Succeeded {
        generation: Generation,
        result: PredictionResult,
        persistence: Persistence,
    },
    /// Classification failed; the user may resubmit
    Failed { generation: Generation, error: String },
}

impl SubmissionState {
    pub fn as_str(&self) -> &str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Submitting { .. } => "submitting",
            SubmissionState::Succeeded { .. } => "succeeded",
            SubmissionState::Failed { .. } => "failed",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            SubmissionState::Idle => "Idle",
            SubmissionState::Submitting { .. } => "Predicting...",
            SubmissionState::Succeeded { .. } => "Prediction ready",
            SubmissionState::Failed { .. } => "Prediction failed",
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, SubmissionState::Submitting { .. })
    }

    /// Whether a new request may be submitted without a reset.
    ///
    /// `Failed` counts as idle so the user can retry directly.
    pub fn accepts_submission(&self) -> bool {
        matches!(self, SubmissionState::Idle | SubmissionState::Failed { .. })
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        match self {
            SubmissionState::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn persistence(&self) -> Option<&Persistence> {
        match self {
            SubmissionState::Succeeded { persistence, .. } => Some(persistence),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SubmissionState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
