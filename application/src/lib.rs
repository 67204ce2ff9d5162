//! Application layer for pestwatch
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::BehaviorConfig;
pub use ports::{
    activity_logger::{ActivityEvent, ActivityLogger, NoActivityLogger},
    chat_gateway::ChatGateway,
    classification_gateway::{ClassificationGateway, TransportError},
    history_store::{
        HistoryStore, ListenError, SnapshotEvent, Subscription, UnsubscribeHandle, WriteError,
    },
    identity_provider::{IdentityError, IdentityProvider, NoIdentityProvider},
    preview_store::{NoPreviewStore, PreviewError, PreviewStore},
    progress::{NoProgress, SubmissionProgress},
};
pub use use_cases::bootstrap_identity::IdentityBootstrap;
pub use use_cases::history_view::{HistoryView, HistoryViewState};
pub use use_cases::run_ask::{RunAskError, RunAskUseCase};
pub use use_cases::shared::SessionBindError;
pub use use_cases::submit_prediction::{
    SubmissionInput, SubmissionOrchestrator, SubmissionOutcome, SubmitError,
};
