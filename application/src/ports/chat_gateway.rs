//! Chat gateway port
//!
//! Defines the interface for the remote agronomy assistant.

use super::classification_gateway::TransportError;
use async_trait::async_trait;
use pestwatch_domain::{ChatReply, Question};

/// Gateway to the remote agronomy assistant
///
/// One network call per question, no retries.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn ask(&self, question: &Question) -> Result<ChatReply, TransportError>;
}
