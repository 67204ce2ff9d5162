//! Submission state machine types.

pub mod state;
