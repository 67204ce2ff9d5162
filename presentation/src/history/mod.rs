//! Live history display

mod watcher;

pub use watcher::HistoryWatcher;
