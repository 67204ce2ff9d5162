//! Classification input and output.

pub mod request;
pub mod result;
