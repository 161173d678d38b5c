//! Deletion walk: compute the change set of an erasure request
//!
//! For every fetched record the handler's traversal targets are walked
//! first, and only then is the record's own update or deletion queued, so
//! children's entries always precede their parent's. Nothing is applied
//! here.

use crate::core::{EngineConfig, Error, Result};
use crate::engine::fetch_records;
use crate::engine::handler::DeletionHandler;
use crate::engine::lineage::Lineage;
use crate::storage::StorageAdapter;
use crate::system::metrics;
use crate::types::{ChangeSet, Locator, Record};
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{self, StreamExt, TryStreamExt};

pub(crate) struct DeletionWalk<'a, S: StorageAdapter, H> {
    pub storage: &'a S,
    pub handler: &'a H,
    pub subject_id: &'a str,
    pub config: &'a EngineConfig,
}

impl<'a, S, H> DeletionWalk<'a, S, H>
where
    S: StorageAdapter,
    H: DeletionHandler<S::Address>,
{
    /// Change set for everything reachable from `root`
    pub async fn run(&self, root: Locator<S::Address>) -> Result<ChangeSet<S::Address>> {
        self.resolve(root, Lineage::root()).await
    }

    fn resolve(
        &self,
        locator: Locator<S::Address>,
        lineage: Lineage,
    ) -> BoxFuture<'_, Result<ChangeSet<S::Address>>> {
        async move {
            locator.validate()?;
            let lineage = lineage.enter(&locator, self.config)?;
            tracing::debug!(locator = %locator, depth = lineage.depth(), "Resolving for deletion");

            let records = fetch_records(self.storage, &locator).await?;
            let per_record: Vec<ChangeSet<S::Address>> = stream::iter(records.into_iter().map(|record| {
                let narrowed = locator.narrow(record.id());
                self.resolve_record(narrowed, record, lineage.clone())
            }))
            .buffered(self.config.max_concurrency)
            .try_collect()
            .await?;

            let mut change_set = ChangeSet::new();
            for entries in per_record {
                change_set.merge(entries);
            }
            Ok(change_set)
        }
        .boxed()
    }

    fn resolve_record(
        &self,
        locator: Locator<S::Address>,
        record: Record,
        lineage: Lineage,
    ) -> BoxFuture<'_, Result<ChangeSet<S::Address>>> {
        async move {
            let lineage = lineage.enter_record(&locator, self.config)?;

            metrics::record_callback("deletion");
            let decision = self
                .handler
                .delete(self.subject_id, &locator, &record)
                .await
                .map_err(Error::Callback)?;

            let children: Vec<ChangeSet<S::Address>> = stream::iter(
                decision
                    .nodes_to_traverse
                    .into_iter()
                    .map(|child| self.resolve(child, lineage.clone())),
            )
            .buffered(self.config.max_concurrency)
            .try_collect()
            .await?;

            let mut change_set = ChangeSet::new();
            for child in children {
                change_set.merge(child);
            }

            if decision.delete_node {
                tracing::trace!(locator = %locator, "Queued deletion");
                change_set.push_delete(locator);
            } else if let Some(update) = decision.fields_to_update {
                tracing::trace!(locator = %locator, "Queued update");
                change_set.push_update(locator, update);
            }
            Ok(change_set)
        }
        .boxed()
    }
}
