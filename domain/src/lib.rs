//! Domain layer for pestwatch
//!
//! This crate contains the core entities, value objects and invariants.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Session
//!
//! A [`Session`] carries the identity that scopes a user's history. It starts
//! unresolved and becomes ready exactly once; nothing touches history or
//! submits a prediction while it is not ready.
//!
//! ## Prediction
//!
//! A [`PredictionRequest`] (image plus optional text) is classified remotely
//! into a [`PredictionResult`]. A missing confidence stays missing.
//!
//! ## History
//!
//! Each successful prediction becomes an immutable [`HistoryRecord`] in the
//! identity's collection. Snapshots are always presented newest first.

pub mod chat;
pub mod config;
pub mod core;
pub mod history;
pub mod identity;
pub mod prediction;
pub mod submission;

// Re-export commonly used types
pub use chat::{ChatReply, Question};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use core::error::ValidationError;
pub use history::{
    ordering::{newest_first, sort_newest_first},
    record::{HistoryRecord, NewHistoryRecord, PreviewRef, RecordId, collection_path},
};
pub use identity::session::{IdentityId, IdentityOrigin, LOCAL_IDENTITY_PREFIX, Session};
pub use prediction::{
    request::{ImagePayload, PredictionRequest},
    result::{Confidence, PredictionResult},
};
pub use submission::state::{Generation, Persistence, SubmissionState};
