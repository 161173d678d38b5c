//! Flat in-memory collection store
//!
//! Named collections of JSON records selected by query documents. Records
//! keep insertion order and always carry a string `_id`. Change-set entries
//! act on the first matching record, and an entry that matches nothing
//! fails the whole apply.

use crate::core::{StorageError, StorageResult};
use crate::storage::query;
use crate::storage::transaction::Transaction;
use crate::storage::StorageAdapter;
use crate::types::{ApplyResult, ChangeSet, CollectionQuery, Locator, Record, ID_FIELD};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

type Collections = BTreeMap<String, Vec<Map<String, Value>>>;

/// In-memory flat collection store
#[derive(Debug, Default)]
pub struct MemCollectionStore {
    collections: RwLock<Collections>,
    offline: AtomicBool,
}

impl MemCollectionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record and return its `_id`
    ///
    /// A random id is assigned when the record has none.
    pub fn insert(&self, collection: &str, record: Value) -> StorageResult<String> {
        let Value::Object(mut record) = record else {
            return Err(StorageError::InvalidUpdate("record must be an object".into()));
        };

        let id = match record.get(ID_FIELD) {
            None => Uuid::new_v4().to_string(),
            Some(Value::String(id)) => id.clone(),
            Some(other) => {
                return Err(StorageError::InvalidUpdate(format!(
                    "_id must be a string, got {}",
                    other
                )))
            }
        };

        let mut collections = self.collections.write();
        let records = collections.entry(collection.to_string()).or_default();
        if records.iter().any(|r| record_id(r) == Some(id.as_str())) {
            return Err(StorageError::Conflict(format!("duplicate _id {} in {}", id, collection)));
        }
        record.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        records.push(record);
        Ok(id)
    }

    /// Records of `collection` matching `filter`, in insertion order
    pub fn find(&self, collection: &str, filter: Value) -> StorageResult<Vec<Map<String, Value>>> {
        let query = CollectionQuery::new(collection, filter);
        let collections = self.collections.read();
        let Some(records) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let mut found = Vec::new();
        for record in records {
            if query::matches(&query.filter, record)? {
                found.push(record.clone());
            }
        }
        Ok(found)
    }

    /// Record of `collection` with `_id` equal to `id`
    pub fn get(&self, collection: &str, id: &str) -> Option<Map<String, Value>> {
        self.collections
            .read()
            .get(collection)?
            .iter()
            .find(|r| record_id(r) == Some(id))
            .cloned()
    }

    /// Number of records in `collection`
    pub fn count(&self, collection: &str) -> usize {
        self.collections.read().get(collection).map_or(0, Vec::len)
    }

    /// Simulate a lost connection: every operation fails while offline
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("collection store is offline".into()));
        }
        Ok(())
    }
}

fn record_id(record: &Map<String, Value>) -> Option<&str> {
    record.get(ID_FIELD).and_then(Value::as_str)
}

fn to_record(record: &Map<String, Value>) -> Record {
    let id = record_id(record).unwrap_or_default().to_string();
    Record::new(id, record.clone())
}

fn first_match(records: &[Map<String, Value>], query: &CollectionQuery) -> StorageResult<Option<usize>> {
    for (index, record) in records.iter().enumerate() {
        if query::matches(&query.filter, record)? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

fn not_found(query: &CollectionQuery) -> StorageError {
    StorageError::NotFound(format!(
        "{} matching {}",
        query.collection,
        Value::Object(query.filter.clone())
    ))
}

#[async_trait]
impl StorageAdapter for MemCollectionStore {
    type Address = CollectionQuery;

    fn backend_name(&self) -> &'static str {
        "mem-collection"
    }

    async fn fetch_one(&self, locator: &Locator<CollectionQuery>) -> StorageResult<Option<Record>> {
        self.ensure_online()?;
        let query = &locator.address;
        let collections = self.collections.read();
        let Some(records) = collections.get(&query.collection) else {
            return Ok(None);
        };

        Ok(first_match(records, query)?.map(|index| to_record(&records[index])))
    }

    async fn fetch_many(&self, locator: &Locator<CollectionQuery>) -> StorageResult<Vec<Record>> {
        self.ensure_online()?;
        let query = &locator.address;
        let collections = self.collections.read();
        let Some(records) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let mut found = Vec::new();
        for record in records {
            if query::matches(&query.filter, record)? {
                found.push(to_record(record));
            }
        }
        Ok(found)
    }

    async fn apply_change_set(&self, change_set: &ChangeSet<CollectionQuery>) -> StorageResult<ApplyResult> {
        self.ensure_online()?;
        let mut tx = Transaction::begin(&self.collections);

        for update in &change_set.documents_to_update {
            let query = &update.locator.address;
            let records = tx
                .staged()
                .get_mut(&query.collection)
                .ok_or_else(|| not_found(query))?;
            let index = first_match(records, query)?.ok_or_else(|| not_found(query))?;
            query::apply_update(&mut records[index], &update.fields_to_update)?;
        }

        for locator in &change_set.nodes_to_delete {
            let query = &locator.address;
            let records = tx
                .staged()
                .get_mut(&query.collection)
                .ok_or_else(|| not_found(query))?;
            let index = first_match(records, query)?.ok_or_else(|| not_found(query))?;
            records.remove(index);
        }

        tx.commit();
        Ok(ApplyResult::counting(change_set))
    }
}
