//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod activity_logger;
pub mod chat_gateway;
pub mod classification_gateway;
pub mod history_store;
pub mod identity_provider;
pub mod preview_store;
pub mod progress;
