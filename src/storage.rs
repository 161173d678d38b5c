//! Storage layer for the privacy graph engine
//!
//! The engine talks to a backend only through [`StorageAdapter`]: fetch one
//! record, fetch a set of records, and atomically apply a change set. The
//! adapter is chosen once, when the client is built, and its associated
//! [`Address`] type fixes which locators it accepts.
//!
//! Two in-memory adapters ship with the crate:
//! - [`MemDocumentStore`]: hierarchical collections and sub-collections
//! - [`MemCollectionStore`]: flat named collections queried by filter

use crate::core::StorageResult;
use crate::types::{Address, ApplyResult, ChangeSet, Locator, Record};
use async_trait::async_trait;

/// Backend operations consumed by the traversal engine
///
/// Implementations must annotate every returned record with its durable
/// identifier (see [`Record::new`]).
#[async_trait]
pub trait StorageAdapter: Send + Sync + 'static {
    /// Locator addressing understood by this backend
    type Address: Address;

    /// Short backend name used in logs
    fn backend_name(&self) -> &'static str;

    /// Fetch the record named by a validated single-document locator
    ///
    /// Returns `Ok(None)` when nothing matches; the engine turns that into
    /// a not-found error uniformly for every backend.
    async fn fetch_one(&self, locator: &Locator<Self::Address>) -> StorageResult<Option<Record>>;

    /// Fetch all records matched by a validated multi-document locator
    ///
    /// An empty result is not an error. Records come back in backend order.
    async fn fetch_many(&self, locator: &Locator<Self::Address>) -> StorageResult<Vec<Record>>;

    /// Apply every update and deletion as one atomic unit
    ///
    /// If any operation fails, none of them takes effect.
    async fn apply_change_set(
        &self,
        change_set: &ChangeSet<Self::Address>,
    ) -> StorageResult<ApplyResult>;
}

/// Staged transactions for the in-memory adapters
pub mod transaction;

/// Flat-store filter matching and update operators
pub mod query;

/// Hierarchical in-memory document store
pub mod document_store;

/// Flat in-memory collection store
pub mod collection_store;

/// Re-export main storage types
pub use document_store::MemDocumentStore;
pub use collection_store::MemCollectionStore;
pub use transaction::Transaction;
