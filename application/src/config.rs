//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases
//! behave, such as the classification deadline and whether results are
//! written to history.

use std::time::Duration;

/// Application behavior configuration.
#[derive(Debug, Clone)]
pub struct BehaviorConfig {
    /// Maximum time to wait for a classification before failing it with
    /// a timeout. `None` leaves the deadline to the transport.
    pub classify_timeout: Option<Duration>,
    /// Write successful predictions to history.
    pub save_history: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            classify_timeout: None,
            save_history: true,
        }
    }
}

impl BehaviorConfig {
    /// Creates a BehaviorConfig from an optional timeout in seconds.
    ///
    /// If `seconds` is `None` or zero, no deadline is applied.
    pub fn from_timeout_seconds(seconds: Option<u64>) -> Self {
        Self {
            classify_timeout: seconds.filter(|s| *s > 0).map(Duration::from_secs),
            ..Self::default()
        }
    }

    pub fn without_history(mut self) -> Self {
        self.save_history = false;
        self
    }
}
