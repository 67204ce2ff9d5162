//! Infrastructure layer for pestwatch
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod history;
pub mod http;
pub mod identity;
pub mod logging;
pub mod previews;

// Re-export commonly used types
pub use config::{
    ConfigLoader, FileConfig, FileHistoryConfig, FileIdentityConfig, FileLoggingConfig,
    FileOutputConfig, FilePreviewsConfig, FileServiceConfig, WatchRedraw,
};
pub use history::{MemoryHistoryStore, StoreOpenError};
pub use http::{HttpChatGateway, HttpClassificationGateway, build_client};
pub use identity::DeviceIdentityProvider;
pub use logging::JsonlActivityLogger;
pub use previews::FsPreviewStore;
