//! Core system types and foundations
//!
//! Error handling, configuration and logging shared by every other module.

pub mod error;
pub mod config;
pub mod logging;

// Re-export commonly used items
pub use error::{Error, Result, StorageError, StorageResult};
pub use config::{Config, EngineConfig, LoggingConfig};
