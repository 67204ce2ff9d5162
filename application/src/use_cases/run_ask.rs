//! Run Ask use case.
//!
//! Sends a free-form question to the remote agronomy assistant and returns
//! its answer. One call per question; blank questions never leave the client.

use crate::ports::activity_logger::{ActivityEvent, ActivityLogger, NoActivityLogger};
use crate::ports::chat_gateway::ChatGateway;
use crate::ports::classification_gateway::TransportError;
use pestwatch_domain::core::text::preview_line;
use pestwatch_domain::{ChatReply, Question, ValidationError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur during Ask execution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunAskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Assistant request failed: {0}")]
    Transport(#[from] TransportError),
}

/// Use case for asking the assistant a question.
#[derive(Clone)]
pub struct RunAskUseCase {
    gateway: Arc<dyn ChatGateway>,
    activity: Arc<dyn ActivityLogger>,
}

impl RunAskUseCase {
    pub fn new(gateway: Arc<dyn ChatGateway>) -> Self {
        Self {
            gateway,
            activity: Arc::new(NoActivityLogger),
        }
    }

    pub fn with_activity_logger(mut self, activity: Arc<dyn ActivityLogger>) -> Self {
        self.activity = activity;
        self
    }

    /// Ask a question.
    ///
    /// The returned reply is raw markup from the remote and must be escaped
    /// before rendering.
    pub async fn execute(&self, question: &str) -> Result<ChatReply, RunAskError> {
        let question = Question::new(question)?;
        info!("Asking assistant: {}", preview_line(question.content(), 80));

        match self.gateway.ask(&question).await {
            Ok(reply) => {
                info!("Assistant answered ({} bytes)", reply.markup.len());
                self.activity.log(ActivityEvent::new(
                    "ask_answered",
                    serde_json::json!({
                        "question": question.content(),
                        "bytes": reply.markup.len(),
                    }),
                ));
                Ok(reply)
            }
            Err(e) => {
                warn!("Assistant request failed: {}", e);
                Err(RunAskError::Transport(e))
            }
        }
    }
}
