//! Core domain concepts shared across all subdomains.
//!
//! - [`error::ValidationError`]: local validation failures
//! - [`text`]: helpers for single-line previews of free text

pub mod error;
pub mod text;
