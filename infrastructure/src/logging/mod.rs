//! Logging infrastructure: structured activity logging.
//!
//! Provides [`JsonlActivityLogger`], a JSONL file writer that implements
//! the [`ActivityLogger`](pestwatch_application::ActivityLogger) port.

mod activity_log;

pub use activity_log::JsonlActivityLogger;
