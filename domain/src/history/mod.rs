//! Prediction history: durable, per-identity records.

pub mod ordering;
pub mod record;
