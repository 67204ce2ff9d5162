//! Agronomy chat value objects

use crate::core::error::ValidationError;
use serde::{Deserialize, Serialize};

/// A free-text question for the agronomy assistant (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    content: String,
}

impl Question {
    /// Create a question, rejecting empty or whitespace-only content.
    pub fn new(content: impl Into<String>) -> Result<Self, ValidationError> {
        let content = content.into();
        let trimmed = content.trim();
        if trimmed.is_empty() {
            Err(ValidationError::EmptyQuestion)
        } else {
            Ok(Self {
                content: trimmed.to_string(),
            })
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

/// The assistant's answer: raw markup, escaped before display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub markup: String,
}

impl ChatReply {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }
}
