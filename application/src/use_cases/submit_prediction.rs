//! Submit prediction use case
//!
//! The state machine a UI surface drives: validates input, issues one
//! classification call at a time, and writes successful results to history.
//!
//! ```text
//! Idle ──submit──▶ Submitting ──ok──▶ Succeeded ──reset──▶ Idle
//!   ▲                  │
//!   │                  └──err──▶ Failed ──submit──▶ Submitting
//!   └──────────reset (from any state)──────────────┘
//! ```

use crate::config::BehaviorConfig;
use crate::ports::activity_logger::{ActivityEvent, ActivityLogger, NoActivityLogger};
use crate::ports::classification_gateway::{ClassificationGateway, TransportError};
use crate::ports::history_store::HistoryStore;
use crate::ports::preview_store::{NoPreviewStore, PreviewStore};
use crate::ports::progress::{NoProgress, SubmissionProgress};
use crate::use_cases::shared::{SessionBindError, rebind, require_identity};
use pestwatch_domain::{
    Generation, ImagePayload, NewHistoryRecord, Persistence, PredictionRequest, PredictionResult,
    PreviewRef, Session, SubmissionState, ValidationError,
};
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors returned by [`SubmissionOrchestrator::submit`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("A prediction is already in progress")]
    AlreadyInFlight,

    #[error("Reset before submitting another prediction")]
    ResetRequired,

    #[error("Failed to get prediction: {0}")]
    Transport(#[from] TransportError),

    #[error("Submission was reset before the prediction arrived")]
    Superseded,
}

/// Input for one submission
#[derive(Debug, Clone, Default)]
pub struct SubmissionInput {
    /// The selected image, `None` when the user has not picked one
    pub image: Option<ImagePayload>,
    /// Optional free text (symptoms, observations)
    pub text: Option<String>,
}

impl SubmissionInput {
    pub fn new(image: ImagePayload) -> Self {
        Self {
            image: Some(image),
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Output of a successful submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub generation: Generation,
    pub result: PredictionResult,
    pub persistence: Persistence,
}

struct HeldPreview {
    preview: PreviewRef,
    /// Handed to a history append; reset must not release it.
    handed_off: bool,
}

struct Inner {
    generation: Generation,
    state: SubmissionState,
    cancel: Option<CancellationToken>,
    preview: Option<HeldPreview>,
}

/// Submission state machine
///
/// At most one classification call is in flight per orchestrator. Every call
/// is tagged with the generation current when it was issued; `reset()`
/// advances the generation and cancels the call, so a response that arrives
/// afterwards is discarded.
pub struct SubmissionOrchestrator<C: ClassificationGateway + 'static, H: HistoryStore + 'static> {
    classifier: Arc<C>,
    history: Arc<H>,
    previews: Arc<dyn PreviewStore>,
    activity: Arc<dyn ActivityLogger>,
    config: BehaviorConfig,
    session: Mutex<Session>,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<SubmissionState>,
}

impl<C: ClassificationGateway + 'static, H: HistoryStore + 'static> SubmissionOrchestrator<C, H> {
    pub fn new(classifier: Arc<C>, history: Arc<H>, session: Session) -> Self {
        let (state_tx, _) = watch::channel(SubmissionState::Idle);
        Self {
            classifier,
            history,
            previews: Arc::new(NoPreviewStore),
            activity: Arc::new(NoActivityLogger),
            config: BehaviorConfig::default(),
            session: Mutex::new(session),
            inner: Mutex::new(Inner {
                generation: Generation::default(),
                state: SubmissionState::Idle,
                cancel: None,
                preview: None,
            }),
            state_tx,
        }
    }

    pub fn with_previews(mut self, previews: Arc<dyn PreviewStore>) -> Self {
        self.previews = previews;
        self
    }

    pub fn with_activity_logger(mut self, activity: Arc<dyn ActivityLogger>) -> Self {
        self.activity = activity;
        self
    }

    pub fn with_config(mut self, config: BehaviorConfig) -> Self {
        self.config = config;
        self
    }

    /// Bind the session produced by identity bootstrap.
    ///
    /// An orchestrator created before bootstrap finished starts unresolved and
    /// is bound here once. Switching to a different identity is refused.
    pub fn bind_session(&self, session: Session) -> Result<(), SessionBindError> {
        let mut current = self.session.lock().unwrap_or_else(|e| e.into_inner());
        *current = rebind(&current, session)?;
        Ok(())
    }

    pub fn session(&self) -> Session {
        self.session
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Current state snapshot
    pub fn state(&self) -> SubmissionState {
        self.state_tx.borrow().clone()
    }

    /// Receiver that observes every state transition
    pub fn subscribe_state(&self) -> watch::Receiver<SubmissionState> {
        self.state_tx.subscribe()
    }

    /// Submit with default (no-op) progress
    pub async fn submit(&self, input: SubmissionInput) -> Result<SubmissionOutcome, SubmitError> {
        self.submit_with_progress(input, &NoProgress).await
    }

    /// Submit with progress callbacks
    ///
    /// Returns `Ok` whenever the classification succeeded, even if the
    /// history write failed; the outcome's `persistence` tells which.
    pub async fn submit_with_progress(
        &self,
        input: SubmissionInput,
        progress: &dyn SubmissionProgress,
    ) -> Result<SubmissionOutcome, SubmitError> {
        // Local validation: nothing below this point runs on invalid input.
        let image = input.image.ok_or(ValidationError::MissingImage)?;
        let request = PredictionRequest::new(image, input.text)?;
        let session = self.session();
        require_identity(&session)?;

        let (generation, token, leftover) = self.begin()?;
        if let Some(preview) = leftover {
            self.previews.release(&preview).await;
        }
        info!(
            "Submitting prediction {} ({}, {} bytes)",
            generation,
            request.image().file_name(),
            request.image().len()
        );
        progress.on_submit_start(generation);

        if !self.hold_preview(generation, &request).await {
            debug!("Submission {} reset while storing preview", generation);
            return Err(SubmitError::Superseded);
        }

        let outcome = self.classify(&request, &token).await;

        if !self.finish_classification(generation, &outcome) {
            debug!("Discarding stale response for submission {}", generation);
            return Err(SubmitError::Superseded);
        }

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!("Prediction {} failed: {}", generation, e);
                progress.on_prediction_failed(&e);
                self.activity.log(ActivityEvent::new(
                    "prediction_failed",
                    json!({
                        "generation": generation.value(),
                        "error": e.to_string(),
                    }),
                ));
                return Err(SubmitError::Transport(e));
            }
        };

        info!("Prediction {} succeeded: {}", generation, result.label);
        progress.on_prediction(&result);
        self.activity.log(ActivityEvent::new(
            "prediction_succeeded",
            json!({
                "generation": generation.value(),
                "label": result.label,
                "confidence": result.confidence.map(|c| c.value()),
            }),
        ));

        let persistence = if self.config.save_history {
            self.persist(generation, &session, &request, &result, progress)
                .await
        } else {
            Persistence::Skipped
        };

        Ok(SubmissionOutcome {
            generation,
            result,
            persistence,
        })
    }

    /// Return to `Idle` from any state.
    ///
    /// Cancels an in-flight call, discards whatever it eventually returns, and
    /// releases the held preview unless a history record references it.
    pub async fn reset(&self) {
        let preview = {
            let mut inner = self.lock();
            inner.generation = inner.generation.next();
            if let Some(token) = inner.cancel.take() {
                token.cancel();
            }
            inner.state = SubmissionState::Idle;
            self.publish(&inner);
            inner.preview.take()
        };
        debug!("Submission orchestrator reset");

        if let Some(held) = preview
            && !held.handed_off
        {
            self.previews.release(&held.preview).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, inner: &Inner) {
        self.state_tx.send_replace(inner.state.clone());
    }

    /// Enter `Submitting`, or refuse. Returns the new generation, its
    /// cancellation token, and any preview left over from a failed attempt.
    fn begin(&self) -> Result<(Generation, CancellationToken, Option<PreviewRef>), SubmitError> {
        let mut inner = self.lock();
        match &inner.state {
            SubmissionState::Submitting { .. } => {
                debug!("Rejecting submit: a prediction is already in flight");
                return Err(SubmitError::AlreadyInFlight);
            }
            SubmissionState::Succeeded { .. } => return Err(SubmitError::ResetRequired),
            SubmissionState::Idle | SubmissionState::Failed { .. } => {}
        }

        let generation = inner.generation.next();
        let token = CancellationToken::new();
        inner.generation = generation;
        inner.cancel = Some(token.clone());
        let leftover = inner
            .preview
            .take()
            .filter(|held| !held.handed_off)
            .map(|held| held.preview);
        inner.state = SubmissionState::Submitting { generation };
        self.publish(&inner);

        Ok((generation, token, leftover))
    }

    /// Store a preview of the image for this generation. Returns `false` if
    /// the submission was reset meanwhile.
    async fn hold_preview(&self, generation: Generation, request: &PredictionRequest) -> bool {
        let preview = match self.previews.create(request.image()).await {
            Ok(preview) => Some(preview),
            Err(e) => {
                debug!("No preview for submission {}: {}", generation, e);
                None
            }
        };

        let current = {
            let mut inner = self.lock();
            let current = inner.generation == generation;
            if current && let Some(preview) = &preview {
                inner.preview = Some(HeldPreview {
                    preview: preview.clone(),
                    handed_off: false,
                });
            }
            current
        };

        if !current && let Some(preview) = preview {
            self.previews.release(&preview).await;
        }
        current
    }

    async fn classify(
        &self,
        request: &PredictionRequest,
        token: &CancellationToken,
    ) -> Result<PredictionResult, TransportError> {
        let call = async {
            match self.config.classify_timeout {
                Some(deadline) => tokio::time::timeout(deadline, self.classifier.classify(request))
                    .await
                    .unwrap_or(Err(TransportError::Timeout)),
                None => self.classifier.classify(request).await,
            }
        };

        tokio::select! {
            outcome = call => outcome,
            _ = token.cancelled() => Err(TransportError::Cancelled),
        }
    }

    /// Apply a classification outcome. Returns `false` when the outcome
    /// belongs to a stale generation and was discarded.
    fn finish_classification(
        &self,
        generation: Generation,
        outcome: &Result<PredictionResult, TransportError>,
    ) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        inner.cancel = None;
        inner.state = match outcome {
            Ok(result) => SubmissionState::Succeeded {
                generation,
                result: result.clone(),
                persistence: if self.config.save_history {
                    Persistence::Pending
                } else {
                    Persistence::Skipped
                },
            },
            Err(e) => SubmissionState::Failed {
                generation,
                error: e.to_string(),
            },
        };
        self.publish(&inner);
        true
    }

    async fn persist(
        &self,
        generation: Generation,
        session: &Session,
        request: &PredictionRequest,
        result: &PredictionResult,
        progress: &dyn SubmissionProgress,
    ) -> Persistence {
        let preview = self.hand_off_preview(generation);
        let fields = NewHistoryRecord::from_prediction(result, request.text(), preview.clone());

        let persistence = match self.history.append(session, fields).await {
            Ok(id) => {
                info!("Prediction {} saved to history as {}", generation, id);
                progress.on_history_saved(&id);
                self.activity.log(ActivityEvent::new(
                    "history_saved",
                    json!({
                        "generation": generation.value(),
                        "id": id.as_str(),
                    }),
                ));
                Persistence::Saved(id)
            }
            Err(e) => {
                warn!("Saving prediction {} to history failed: {}", generation, e);
                progress.on_history_save_failed(&e);
                self.activity.log(ActivityEvent::new(
                    "history_save_failed",
                    json!({
                        "generation": generation.value(),
                        "error": e.to_string(),
                    }),
                ));
                if let Some(preview) = preview
                    && !self.reclaim_preview(generation)
                {
                    self.previews.release(&preview).await;
                }
                Persistence::Failed(e.to_string())
            }
        };

        let mut inner = self.lock();
        if inner.generation == generation
            && let SubmissionState::Succeeded {
                persistence: current,
                ..
            } = &mut inner.state
        {
            *current = persistence.clone();
            self.publish(&inner);
        }
        persistence
    }

    fn hand_off_preview(&self, generation: Generation) -> Option<PreviewRef> {
        let mut inner = self.lock();
        if inner.generation != generation {
            return None;
        }
        inner.preview.as_mut().map(|held| {
            held.handed_off = true;
            held.preview.clone()
        })
    }

    /// Take a handed-off preview back after a failed append. Returns `false`
    /// if a reset already dropped it, leaving the release to the caller.
    fn reclaim_preview(&self, generation: Generation) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        match inner.preview.as_mut() {
            Some(held) => {
                held.handed_off = false;
                true
            }
            None => false,
        }
    }
}
