//! Hierarchical in-memory document store
//!
//! Documents live in collections, and every document may own named
//! sub-collections: `gcs/g1/messages/m1`. Documents within a collection are
//! ordered by id. A document can exist purely as the parent of
//! sub-collections without fields of its own; such a document is not
//! returned by fetches, exactly like a deleted one.

use crate::core::{StorageError, StorageResult};
use crate::storage::transaction::Transaction;
use crate::storage::StorageAdapter;
use crate::types::field_path;
use crate::types::{ApplyResult, ChangeSet, DocumentPath, FieldTransform, FieldUpdate, Locator, Record};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

type Collections = BTreeMap<String, CollectionNode>;

#[derive(Debug, Clone, Default)]
struct CollectionNode {
    documents: BTreeMap<String, DocumentNode>,
}

#[derive(Debug, Clone, Default)]
struct DocumentNode {
    fields: Option<Map<String, Value>>,
    subcollections: Collections,
}

/// In-memory hierarchical document store
#[derive(Debug, Default)]
pub struct MemDocumentStore {
    collections: RwLock<Collections>,
    offline: AtomicBool,
}

impl MemDocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite the document at `path`
    pub fn insert(&self, path: DocumentPath, fields: Value) -> StorageResult<()> {
        check_single(&path)?;
        let Value::Object(fields) = fields else {
            return Err(StorageError::InvalidUpdate("document fields must be an object".into()));
        };

        let mut collections = self.collections.write();
        document_entry(&mut collections, &path).fields = Some(fields);
        Ok(())
    }

    /// Stored fields of the document at `path`, without the `_id` annotation
    pub fn get(&self, path: &DocumentPath) -> Option<Map<String, Value>> {
        let collections = self.collections.read();
        find_document(&collections, path)?.fields.clone()
    }

    /// Check if a document exists
    pub fn exists(&self, path: &DocumentPath) -> bool {
        self.get(path).is_some()
    }

    /// Number of documents with fields, across every collection level
    pub fn document_count(&self) -> usize {
        fn count(collections: &Collections) -> usize {
            collections
                .values()
                .flat_map(|c| c.documents.values())
                .map(|d| usize::from(d.fields.is_some()) + count(&d.subcollections))
                .sum()
        }
        count(&self.collections.read())
    }

    /// Simulate a lost connection: every operation fails while offline
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("document store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for MemDocumentStore {
    type Address = DocumentPath;

    fn backend_name(&self) -> &'static str {
        "mem-document"
    }

    async fn fetch_one(&self, locator: &Locator<DocumentPath>) -> StorageResult<Option<Record>> {
        self.ensure_online()?;
        let path = &locator.address;
        let collections = self.collections.read();

        let record = find_document(&collections, path)
            .and_then(|doc| doc.fields.clone())
            .zip(path.doc_ids.last())
            .map(|(fields, id)| Record::new(id.clone(), fields));
        Ok(record)
    }

    async fn fetch_many(&self, locator: &Locator<DocumentPath>) -> StorageResult<Vec<Record>> {
        self.ensure_online()?;
        let path = &locator.address;
        let collections = self.collections.read();

        let Some(collection) = find_collection(&collections, &path.collection_path, &path.doc_ids) else {
            return Ok(Vec::new());
        };

        let records = collection
            .documents
            .iter()
            .filter_map(|(id, doc)| doc.fields.as_ref().map(|fields| (id, fields)))
            .filter(|(_, fields)| path.filters.iter().all(|filter| filter.matches(fields)))
            .map(|(id, fields)| Record::new(id.clone(), fields.clone()))
            .collect();
        Ok(records)
    }

    async fn apply_change_set(&self, change_set: &ChangeSet<DocumentPath>) -> StorageResult<ApplyResult> {
        self.ensure_online()?;
        let mut tx = Transaction::begin(&self.collections);

        for update in &change_set.documents_to_update {
            let path = &update.locator.address;
            check_single(path)?;
            let fields = find_document_mut(tx.staged(), path)
                .and_then(|doc| doc.fields.as_mut())
                .ok_or_else(|| StorageError::NotFound(path.display_path()))?;
            for field_update in &update.fields_to_update {
                apply_field_update(fields, field_update)?;
            }
        }

        for locator in &change_set.nodes_to_delete {
            check_single(&locator.address)?;
            delete_document(tx.staged(), &locator.address)?;
        }

        tx.commit();
        Ok(ApplyResult::counting(change_set))
    }
}

fn check_single(path: &DocumentPath) -> StorageResult<()> {
    if path.collection_path.is_empty() || path.collection_path.len() != path.doc_ids.len() {
        return Err(StorageError::InvalidUpdate(format!(
            "{} does not name a single document",
            path.display_path()
        )));
    }
    Ok(())
}

fn find_collection<'a>(
    collections: &'a Collections,
    collection_path: &[String],
    parent_ids: &[String],
) -> Option<&'a CollectionNode> {
    let (first, rest) = collection_path.split_first()?;
    if rest.len() != parent_ids.len() {
        return None;
    }
    let mut collection = collections.get(first)?;
    for (name, id) in rest.iter().zip(parent_ids) {
        collection = collection.documents.get(id)?.subcollections.get(name)?;
    }
    Some(collection)
}

fn find_document<'a>(collections: &'a Collections, path: &DocumentPath) -> Option<&'a DocumentNode> {
    let (id, parent_ids) = path.doc_ids.split_last()?;
    find_collection(collections, &path.collection_path, parent_ids)?
        .documents
        .get(id)
}

fn find_collection_mut<'a>(
    collections: &'a mut Collections,
    collection_path: &[String],
    parent_ids: &[String],
) -> Option<&'a mut CollectionNode> {
    let (first, rest) = collection_path.split_first()?;
    if rest.len() != parent_ids.len() {
        return None;
    }
    let mut collection = collections.get_mut(first)?;
    for (name, id) in rest.iter().zip(parent_ids) {
        collection = collection.documents.get_mut(id)?.subcollections.get_mut(name)?;
    }
    Some(collection)
}

fn find_document_mut<'a>(
    collections: &'a mut Collections,
    path: &DocumentPath,
) -> Option<&'a mut DocumentNode> {
    let (id, parent_ids) = path.doc_ids.split_last()?;
    find_collection_mut(collections, &path.collection_path, parent_ids)?
        .documents
        .get_mut(id)
}

// Caller guarantees a single-document path.
fn document_entry<'a>(collections: &'a mut Collections, path: &DocumentPath) -> &'a mut DocumentNode {
    let mut names = path.collection_path.iter();
    let mut ids = path.doc_ids.iter();

    let first = names.next().cloned().unwrap_or_default();
    let mut collection = collections.entry(first).or_default();
    let mut id = ids.next().cloned().unwrap_or_default();

    for name in names {
        collection = collection
            .documents
            .entry(id)
            .or_default()
            .subcollections
            .entry(name.clone())
            .or_default();
        id = ids.next().cloned().unwrap_or_default();
    }
    collection.documents.entry(id).or_default()
}

fn delete_document(collections: &mut Collections, path: &DocumentPath) -> StorageResult<()> {
    let not_found = || StorageError::NotFound(path.display_path());
    let (id, parent_ids) = path.doc_ids.split_last().ok_or_else(not_found)?;
    let collection =
        find_collection_mut(collections, &path.collection_path, parent_ids).ok_or_else(not_found)?;
    let doc = collection.documents.get_mut(id).ok_or_else(not_found)?;

    if doc.fields.take().is_none() {
        return Err(not_found());
    }
    // Sub-collections outlive their parent document.
    if doc.subcollections.is_empty() {
        collection.documents.remove(id);
    }
    Ok(())
}

fn apply_field_update(fields: &mut Map<String, Value>, update: &FieldUpdate) -> StorageResult<()> {
    let path = update.path.as_str();
    if path.is_empty() {
        return Err(StorageError::InvalidUpdate("empty field path".into()));
    }
    let unaddressable = || StorageError::InvalidUpdate(format!("cannot address field {}", path));

    match &update.transform {
        FieldTransform::Set { value } => {
            if !field_path::set(fields, path, value.clone()) {
                return Err(unaddressable());
            }
        }
        FieldTransform::Delete => {
            field_path::remove(fields, path);
        }
        FieldTransform::ArrayUnion { values } => {
            let slot = field_path::entry(fields, path).ok_or_else(unaddressable)?;
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            if let Value::Array(items) = slot {
                for value in values {
                    if !items.contains(value) {
                        items.push(value.clone());
                    }
                }
            }
        }
        FieldTransform::ArrayRemove { values } => {
            let slot = field_path::entry(fields, path).ok_or_else(unaddressable)?;
            match slot {
                Value::Array(items) => items.retain(|item| !values.contains(item)),
                other => *other = Value::Array(Vec::new()),
            }
        }
        FieldTransform::Increment { by } => {
            if !by.is_number() {
                return Err(StorageError::InvalidUpdate(format!(
                    "increment of {} by non-numeric {}",
                    path, by
                )));
            }
            let slot = field_path::entry(fields, path).ok_or_else(unaddressable)?;
            *slot = field_path::add_numbers(slot, by).unwrap_or_else(|| by.clone());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FilterOp;
    use serde_json::json;

    fn store() -> MemDocumentStore {
        let store = MemDocumentStore::new();
        store
            .insert(DocumentPath::new(["gcs"], ["g1"]), json!({"owner": "u1", "users": ["u1", "u2"]}))
            .unwrap();
        for (id, author) in [("m2", "u2"), ("m1", "u1"), ("m3", "u1")] {
            store
                .insert(
                    DocumentPath::new(["gcs", "messages"], ["g1", id]),
                    json!({"userId": author, "content": format!("hello from {}", author)}),
                )
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_fetch_one_annotates_id() {
        let store = store();
        let locator = Locator::single("groupChat", DocumentPath::new(["gcs"], ["g1"]));
        let record = store.fetch_one(&locator).await.unwrap().unwrap();
        assert_eq!(record.id(), "g1");
        assert_eq!(record.str_field("_id"), Some("g1"));
        assert_eq!(record.str_field("owner"), Some("u1"));
    }

    #[tokio::test]
    async fn test_fetch_one_missing_is_none() {
        let store = store();
        let locator = Locator::single("groupChat", DocumentPath::new(["gcs"], ["nope"]));
        assert!(store.fetch_one(&locator).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_many_filters_and_orders_by_id() {
        let store = store();
        let locator = Locator::many(
            "message",
            DocumentPath::new(["gcs", "messages"], ["g1"]).with_filter("userId", FilterOp::Eq, json!("u1")),
        );
        let ids: Vec<_> = store
            .fetch_many(&locator)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["m1", "m3"]);
    }

    #[tokio::test]
    async fn test_fetch_many_missing_collection_is_empty() {
        let store = store();
        let locator = Locator::many("message", DocumentPath::new(["gcs", "messages"], ["g9"]));
        assert!(store.fetch_many(&locator).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_keeps_subcollections() {
        let store = store();
        let mut change_set = ChangeSet::new();
        change_set.push_delete(Locator::single("groupChat", DocumentPath::new(["gcs"], ["g1"])));
        let result = store.apply_change_set(&change_set).await.unwrap();

        assert_eq!(result.documents_deleted, 1);
        assert!(!store.exists(&DocumentPath::new(["gcs"], ["g1"])));
        assert!(store.exists(&DocumentPath::new(["gcs", "messages"], ["g1", "m1"])));
        assert_eq!(store.document_count(), 3);
    }

    #[tokio::test]
    async fn test_failed_apply_rolls_back() {
        let store = store();
        let mut change_set = ChangeSet::new();
        change_set.push_update(
            Locator::single("groupChat", DocumentPath::new(["gcs"], ["g1"])),
            vec![FieldUpdate::array_remove("users", vec![json!("u1")])],
        );
        change_set.push_delete(Locator::single("groupChat", DocumentPath::new(["gcs"], ["missing"])));

        let err = store.apply_change_set(&change_set).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        let chat = store.get(&DocumentPath::new(["gcs"], ["g1"])).unwrap();
        assert_eq!(chat["users"], json!(["u1", "u2"]));
    }

    #[tokio::test]
    async fn test_field_transforms() {
        let store = store();
        let chat = DocumentPath::new(["gcs"], ["g1"]);
        let mut change_set = ChangeSet::new();
        change_set.push_update(
            Locator::single("groupChat", chat.clone()),
            vec![
                FieldUpdate::set("owner", json!("u2")),
                FieldUpdate::array_union("users", vec![json!("u3"), json!("u2")]),
                FieldUpdate::increment("stats.edits", json!(1)),
                FieldUpdate::delete("missing"),
            ],
        );
        store.apply_change_set(&change_set).await.unwrap();

        let fields = store.get(&chat).unwrap();
        assert_eq!(
            Value::Object(fields),
            json!({"owner": "u2", "users": ["u1", "u2", "u3"], "stats": {"edits": 1}})
        );
    }

    #[tokio::test]
    async fn test_repeated_updates_count_one_document() {
        let store = store();
        let chat = Locator::single("groupChat", DocumentPath::new(["gcs"], ["g1"]));
        let mut change_set = ChangeSet::new();
        change_set.push_update(chat.clone(), vec![FieldUpdate::set("owner", json!("u2"))]);
        change_set.push_update(chat, vec![FieldUpdate::array_remove("users", vec![json!("u1")])]);

        let result = store.apply_change_set(&change_set).await.unwrap();
        assert_eq!(result, ApplyResult { documents_updated: 1, documents_deleted: 0 });
        let fields = store.get(&DocumentPath::new(["gcs"], ["g1"])).unwrap();
        assert_eq!(Value::Object(fields), json!({"owner": "u2", "users": ["u2"]}));
    }

    #[tokio::test]
    async fn test_offline_store_fails() {
        let store = store();
        store.set_offline(true);
        let locator = Locator::single("groupChat", DocumentPath::new(["gcs"], ["g1"]));
        assert!(matches!(
            store.fetch_one(&locator).await,
            Err(StorageError::Unavailable(_))
        ));
    }

    #[test]
    fn test_insert_rejects_collection_path() {
        let store = MemDocumentStore::new();
        assert!(store.insert(DocumentPath::new(["gcs", "messages"], ["g1"]), json!({})).is_err());
        assert!(store.insert(DocumentPath::new(["gcs"], ["g1"]), json!([1])).is_err());
    }
}
