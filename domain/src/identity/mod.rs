//! Identity and session concepts.

pub mod session;
