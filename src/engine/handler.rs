//! User-supplied record handlers
//!
//! Handlers hold the domain knowledge: which fields of a record are
//! personal data, which related records to follow, and what to do with a
//! record on erasure. The engine treats them as opaque and propagates
//! their errors unchanged.
//!
//! Plain functions and closures with the matching signature implement the
//! traits directly. Implement the traits by hand when a handler needs to
//! await something of its own.

use crate::types::{AccessFields, Address, DeletionDecision, Locator, Record};
use async_trait::async_trait;

/// Maps a fetched record to the fields disclosed in an access report
#[async_trait]
pub trait AccessHandler<A: Address>: Send + Sync {
    /// Report fields for `record`, which `locator` identifies exactly
    async fn access(
        &self,
        subject_id: &str,
        locator: &Locator<A>,
        record: &Record,
    ) -> anyhow::Result<AccessFields<A>>;
}

/// Decides what happens to a fetched record on erasure
#[async_trait]
pub trait DeletionHandler<A: Address>: Send + Sync {
    /// Disposition of `record`, which `locator` identifies exactly
    async fn delete(
        &self,
        subject_id: &str,
        locator: &Locator<A>,
        record: &Record,
    ) -> anyhow::Result<DeletionDecision<A>>;
}

#[async_trait]
impl<A, F> AccessHandler<A> for F
where
    A: Address,
    F: Fn(&str, &Locator<A>, &Record) -> anyhow::Result<AccessFields<A>> + Send + Sync,
{
    async fn access(
        &self,
        subject_id: &str,
        locator: &Locator<A>,
        record: &Record,
    ) -> anyhow::Result<AccessFields<A>> {
        self(subject_id, locator, record)
    }
}

#[async_trait]
impl<A, F> DeletionHandler<A> for F
where
    A: Address,
    F: Fn(&str, &Locator<A>, &Record) -> anyhow::Result<DeletionDecision<A>> + Send + Sync,
{
    async fn delete(
        &self,
        subject_id: &str,
        locator: &Locator<A>,
        record: &Record,
    ) -> anyhow::Result<DeletionDecision<A>> {
        self(subject_id, locator, record)
    }
}
