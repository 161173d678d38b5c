//! Access walk: resolve locators into a nested report
//!
//! A single-document locator resolves to the report object of its record,
//! a multi-document locator to an array of report objects in backend
//! order. Locator fields inside a report are replaced by what they resolve
//! to; sibling resolutions run concurrently and are reassembled in their
//! original positions.

use crate::core::{EngineConfig, Error, Result};
use crate::engine::handler::AccessHandler;
use crate::engine::lineage::Lineage;
use crate::engine::fetch_records;
use crate::storage::StorageAdapter;
use crate::system::metrics;
use crate::types::{Field, Locator, Record, Report};
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde_json::{Map, Value};

pub(crate) struct AccessWalk<'a, S: StorageAdapter, H> {
    pub storage: &'a S,
    pub handler: &'a H,
    pub subject_id: &'a str,
    pub config: &'a EngineConfig,
}

impl<'a, S, H> AccessWalk<'a, S, H>
where
    S: StorageAdapter,
    H: AccessHandler<S::Address>,
{
    /// Resolve a single-document root into its report
    pub async fn run(&self, root: Locator<S::Address>) -> Result<Report> {
        let reports = self.resolve_records(root, Lineage::root()).await?;
        Ok(reports.into_iter().next().unwrap_or_default())
    }

    fn resolve(&self, locator: Locator<S::Address>, lineage: Lineage) -> BoxFuture<'_, Result<Value>> {
        async move {
            let single = locator.single_document;
            let mut reports = self.resolve_records(locator, lineage).await?;

            if single {
                Ok(Value::Object(reports.pop().unwrap_or_default()))
            } else {
                Ok(Value::Array(reports.into_iter().map(Value::Object).collect()))
            }
        }
        .boxed()
    }

    async fn resolve_records(&self, locator: Locator<S::Address>, lineage: Lineage) -> Result<Vec<Report>> {
        locator.validate()?;
        let lineage = lineage.enter(&locator, self.config)?;
        tracing::debug!(locator = %locator, depth = lineage.depth(), "Resolving for access");

        let records = fetch_records(self.storage, &locator).await?;
        stream::iter(records.into_iter().map(|record| {
            let narrowed = locator.narrow(record.id());
            self.resolve_record(narrowed, record, lineage.clone())
        }))
        .buffered(self.config.max_concurrency)
        .try_collect()
        .await
    }

    fn resolve_record(
        &self,
        locator: Locator<S::Address>,
        record: Record,
        lineage: Lineage,
    ) -> BoxFuture<'_, Result<Report>> {
        async move {
            let lineage = lineage.enter_record(&locator, self.config)?;

            metrics::record_callback("access");
            let fields = self
                .handler
                .access(self.subject_id, &locator, &record)
                .await
                .map_err(Error::Callback)?;

            let resolved: Vec<(String, Option<Value>)> = stream::iter(fields.into_iter().map(|(key, field)| {
                let lineage = lineage.clone();
                async move { Ok::<_, Error>((key, self.resolve_field(field, lineage).await?)) }
            }))
            .buffered(self.config.max_concurrency)
            .try_collect()
            .await?;

            Ok(resolved
                .into_iter()
                .filter_map(|(key, value)| value.map(|value| (key, value)))
                .collect())
        }
        .boxed()
    }

    async fn resolve_field(&self, field: Field<S::Address>, lineage: Lineage) -> Result<Option<Value>> {
        let value = match field {
            Field::Absent => return Ok(None),
            Field::Value(value) => value,
            Field::Locator(locator) => self.resolve(locator, lineage).await?,
            Field::Locators(locators) => {
                let reports: Vec<Value> = stream::iter(
                    locators
                        .into_iter()
                        .map(|locator| self.resolve(locator, lineage.clone())),
                )
                .buffered(self.config.max_concurrency)
                .try_collect()
                .await?;
                Value::Array(reports)
            }
            Field::LocatorMap(locators) => {
                let entries: Vec<(String, Value)> = stream::iter(locators.into_iter().map(|(key, locator)| {
                    let report = self.resolve(locator, lineage.clone());
                    async move { Ok::<_, Error>((key, report.await?)) }
                }))
                .buffered(self.config.max_concurrency)
                .try_collect()
                .await?;
                Value::Object(entries.into_iter().collect::<Map<String, Value>>())
            }
        };
        Ok(Some(value))
    }
}
