//! Privacy Graph - locator-graph traversal for data-subject requests
//!
//! Privacy Graph answers access and erasure requests against document
//! stores. The caller supplies a root locator for the data subject and
//! handlers that know each record kind; the engine walks the locators the
//! handlers return, assembles a nested access report or a change set of
//! updates and deletions, and applies change sets atomically.
//!
//! ```no_run
//! use privacy_graph::{AccessFields, Client, DocumentPath, Locator, MemDocumentStore, Record};
//!
//! fn access(
//!     _subject: &str,
//!     _locator: &Locator<DocumentPath>,
//!     record: &Record,
//! ) -> anyhow::Result<AccessFields<DocumentPath>> {
//!     Ok(AccessFields::new().with("name", record.get("name").cloned()))
//! }
//!
//! # async fn run() -> privacy_graph::Result<()> {
//! let client = Client::new(MemDocumentStore::new());
//! let root = Locator::single("user", DocumentPath::new(["users"], ["u1"]));
//! let _report = client.process_access_request(&access, root, "u1").await?;
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]

// Core foundational modules
pub mod core;
pub mod types;

// Main functional modules
pub mod storage;
pub mod engine;
pub mod system;

// Re-export commonly used items for convenience
pub use crate::core::{Config, EngineConfig, Error, LoggingConfig, Result, StorageError};
pub use engine::{AccessHandler, Client, DeletionHandler};
pub use storage::{MemCollectionStore, MemDocumentStore, StorageAdapter};
pub use types::{
    AccessFields, Address, ApplyResult, ChangeSet, CollectionQuery, DeletionDecision,
    DeletionOutcome, DocumentPath, Field, FieldUpdate, FilterOp, Locator, Record, Report,
};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging and metrics from `config`
pub fn init(config: &Config) -> Result<()> {
    crate::core::logging::init(&config.logging)?;

    tracing::info!("Initializing {} v{}", NAME, VERSION);

    system::metrics::init_registry()
}
