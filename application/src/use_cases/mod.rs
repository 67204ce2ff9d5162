//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod bootstrap_identity;
pub mod history_view;
pub mod run_ask;
pub(crate) mod shared;
pub mod submit_prediction;
