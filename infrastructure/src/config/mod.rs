//! Configuration file loading for pestwatch
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `PESTWATCH_` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./pestwatch.toml` or `./.pestwatch.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/pestwatch/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileConfig, FileHistoryConfig, FileIdentityConfig, FileLoggingConfig, FileOutputConfig,
    FilePreviewsConfig, FileServiceConfig, WatchRedraw,
};
pub use loader::ConfigLoader;
