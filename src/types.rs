//! Type definitions for the privacy graph engine
//!
//! Locators and their backend addresses, fetched records, handler outputs,
//! reports and change sets.

/// Locator and the backend address trait
pub mod locator;
/// Hierarchical document-store addresses, filters and field updates
pub mod document_path;
/// Flat collection-store addresses and update documents
pub mod collection_query;
/// Dotted field paths and value ordering
pub mod field_path;
/// Fetched records
pub mod record;
/// Access handler output and reports
pub mod report;
/// Deletion decisions and change sets
pub mod change_set;

// Re-export commonly used types for convenience
pub use locator::{Address, Locator};
pub use document_path::{DocumentPath, FieldTransform, FieldUpdate, Filter, FilterOp};
pub use collection_query::{CollectionQuery, UpdateDocument};
pub use record::{Record, ID_FIELD};
pub use report::{AccessFields, Field, Report};
pub use change_set::{ApplyResult, ChangeSet, DeletionDecision, DeletionOutcome, DocumentUpdate};
