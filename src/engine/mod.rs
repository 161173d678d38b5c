//! Locator-graph traversal engine
//!
//! [`Client`] owns one storage adapter and runs access and deletion
//! requests against it. A request starts from a root locator, fetches the
//! record(s) it names, hands each record to the caller's handler and
//! follows whatever locators the handler returns. Every failure aborts the
//! whole request.

pub mod handler;
pub mod lineage;

mod access;
mod deletion;

pub use handler::{AccessHandler, DeletionHandler};
pub use lineage::Lineage;

use crate::core::{EngineConfig, Error, Result};
use crate::storage::StorageAdapter;
use crate::system::metrics;
use crate::types::{ApplyResult, ChangeSet, DeletionOutcome, Locator, Record, Report};
use access::AccessWalk;
use deletion::DeletionWalk;
use tracing::{info, warn};

/// Privacy request engine bound to one storage backend
pub struct Client<S: StorageAdapter> {
    storage: S,
    config: EngineConfig,
}

impl<S: StorageAdapter> Client<S> {
    /// Create a client with the default engine configuration
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, EngineConfig::default())
    }

    /// Create a client with an explicit engine configuration
    ///
    /// A `max_concurrency` or `max_depth` of zero is treated as one.
    pub fn with_config(storage: S, mut config: EngineConfig) -> Self {
        config.max_concurrency = config.max_concurrency.max(1);
        config.max_depth = config.max_depth.max(1);
        Self { storage, config }
    }

    /// Storage backend
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the access report for `subject_id` starting at `root`
    ///
    /// `root` must address a single document.
    pub async fn process_access_request<H>(
        &self,
        handler: &H,
        root: Locator<S::Address>,
        subject_id: &str,
    ) -> Result<Report>
    where
        H: AccessHandler<S::Address>,
    {
        info!(subject_id, root = %root, backend = self.storage.backend_name(), "Processing access request");

        let result = if root.single_document {
            let walk = AccessWalk {
                storage: &self.storage,
                handler,
                subject_id,
                config: &self.config,
            };
            walk.run(root).await
        } else {
            Err(Error::validation(
                "access request root locator must address a single document",
            ))
        };

        metrics::record_request("access", result.is_ok());
        match &result {
            Ok(report) => info!(subject_id, fields = report.len(), "Access request completed"),
            Err(e) => warn!(subject_id, error = %e, "Access request failed"),
        }
        result
    }

    /// Run a deletion request; apply the change set only if `commit`
    ///
    /// The computed change set is returned either way, so a dry run
    /// (`commit == false`) shows exactly what a commit would do.
    pub async fn process_deletion_request<H>(
        &self,
        handler: &H,
        root: Locator<S::Address>,
        subject_id: &str,
        commit: bool,
    ) -> Result<DeletionOutcome<S::Address>>
    where
        H: DeletionHandler<S::Address>,
    {
        let change_set = self.compute_change_set(handler, root, subject_id).await?;
        let applied = if commit {
            Some(self.apply_change_set(&change_set).await?)
        } else {
            info!(subject_id, entries = change_set.len(), "Dry run, change set not applied");
            None
        };

        Ok(DeletionOutcome { change_set, applied })
    }

    /// Compute the change set of a deletion request without applying it
    pub async fn compute_change_set<H>(
        &self,
        handler: &H,
        root: Locator<S::Address>,
        subject_id: &str,
    ) -> Result<ChangeSet<S::Address>>
    where
        H: DeletionHandler<S::Address>,
    {
        info!(subject_id, root = %root, backend = self.storage.backend_name(), "Processing deletion request");

        let walk = DeletionWalk {
            storage: &self.storage,
            handler,
            subject_id,
            config: &self.config,
        };
        let result = walk.run(root).await;

        metrics::record_request("deletion", result.is_ok());
        match &result {
            Ok(change_set) => info!(
                subject_id,
                updates = change_set.documents_to_update.len(),
                deletes = change_set.nodes_to_delete.len(),
                "Change set computed"
            ),
            Err(e) => warn!(subject_id, error = %e, "Deletion request failed"),
        }
        result
    }

    /// Apply a change set atomically
    ///
    /// Every entry must address a single document. On failure nothing is
    /// applied and [`Error::TransactionAborted`] is returned.
    pub async fn apply_change_set(&self, change_set: &ChangeSet<S::Address>) -> Result<ApplyResult> {
        let entries = change_set
            .documents_to_update
            .iter()
            .map(|update| &update.locator)
            .chain(&change_set.nodes_to_delete);
        for locator in entries {
            if !locator.single_document {
                return Err(Error::validation(format!(
                    "change set entry {} does not address a single document",
                    locator
                )));
            }
            locator.validate()?;
        }

        if change_set.is_empty() {
            return Ok(ApplyResult::default());
        }

        let result = self
            .storage
            .apply_change_set(change_set)
            .await
            .map_err(Error::TransactionAborted);

        metrics::record_request("apply", result.is_ok());
        match &result {
            Ok(applied) => {
                metrics::record_applied(applied);
                info!(
                    updated = applied.documents_updated,
                    deleted = applied.documents_deleted,
                    "Change set applied"
                );
            }
            Err(e) => tracing::error!(error = %e, "Change set rolled back"),
        }
        result
    }
}

/// Fetch what `locator` names; a single-document miss is an error
pub(crate) async fn fetch_records<S: StorageAdapter>(
    storage: &S,
    locator: &Locator<S::Address>,
) -> Result<Vec<Record>> {
    if locator.single_document {
        let record = storage
            .fetch_one(locator)
            .await
            .map_err(|e| Error::backend("fetch_one", locator.identity(), e))?
            .ok_or_else(|| Error::NotFound {
                locator: locator.identity(),
            })?;
        metrics::record_fetch("one", 1);
        Ok(vec![record])
    } else {
        let records = storage
            .fetch_many(locator)
            .await
            .map_err(|e| Error::backend("fetch_many", locator.identity(), e))?;
        metrics::record_fetch("many", records.len());
        Ok(records)
    }
}
