//! Presentation layer for pestwatch
//!
//! This crate contains CLI definitions, output formatters, safe rendering of
//! remote markup, progress reporters and the live history watcher.

pub mod cli;
pub mod config;
pub mod history;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, HistoryCommand, OutputFormat, question_text};
pub use config::OutputConfig;
pub use history::HistoryWatcher;
pub use output::console::ConsoleFormatter;
pub use output::sanitize::{sanitize_inline, sanitize_markup};
pub use progress::reporter::{ProgressReporter, SimpleProgress};
