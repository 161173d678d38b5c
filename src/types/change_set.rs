//! Deletion decisions and the aggregated change set

use crate::types::locator::{Address, Locator};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A deletion handler's verdict for one record
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionDecision<A: Address> {
    /// Locators to walk before this record's own disposition is queued
    pub nodes_to_traverse: Vec<Locator<A>>,
    /// Delete the record; takes precedence over `fields_to_update`
    pub delete_node: bool,
    /// Partial update applied when the record is kept
    pub fields_to_update: Option<A::Update>,
}

impl<A: Address> Default for DeletionDecision<A> {
    fn default() -> Self {
        Self {
            nodes_to_traverse: Vec::new(),
            delete_node: false,
            fields_to_update: None,
        }
    }
}

impl<A: Address> DeletionDecision<A> {
    /// Leave the record untouched
    pub fn keep() -> Self {
        Self::default()
    }

    /// Delete the record
    pub fn delete() -> Self {
        Self {
            delete_node: true,
            ..Self::default()
        }
    }

    /// Keep the record but apply `update`
    pub fn update(update: A::Update) -> Self {
        Self {
            fields_to_update: Some(update),
            ..Self::default()
        }
    }

    /// Walk `locators` first
    pub fn traverse(mut self, locators: impl IntoIterator<Item = Locator<A>>) -> Self {
        self.nodes_to_traverse.extend(locators);
        self
    }
}

/// Pending partial update of one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "A: Address")]
pub struct DocumentUpdate<A: Address> {
    /// Single-document locator of the record
    pub locator: Locator<A>,
    /// Backend-specific partial update
    pub fields_to_update: A::Update,
}

/// Updates and deletions computed by a deletion walk, not yet applied
///
/// Deserializing rebuilds the duplicate-delete index, so a decoded change
/// set collapses repeated deletions exactly like a freshly computed one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    rename_all = "camelCase",
    bound = "A: Address",
    from = "ChangeSetRepr<A>"
)]
pub struct ChangeSet<A: Address> {
    /// Records to update, in walk order
    pub documents_to_update: Vec<DocumentUpdate<A>>,
    /// Records to delete, children before parents
    pub nodes_to_delete: Vec<Locator<A>>,
    #[serde(skip)]
    queued_deletes: HashSet<String>,
}

/// Wire form of [`ChangeSet`]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", bound = "A: Address")]
struct ChangeSetRepr<A: Address> {
    #[serde(default)]
    documents_to_update: Vec<DocumentUpdate<A>>,
    #[serde(default)]
    nodes_to_delete: Vec<Locator<A>>,
}

impl<A: Address> From<ChangeSetRepr<A>> for ChangeSet<A> {
    fn from(repr: ChangeSetRepr<A>) -> Self {
        let mut change_set = Self {
            documents_to_update: repr.documents_to_update,
            ..Self::default()
        };
        for locator in repr.nodes_to_delete {
            change_set.push_delete(locator);
        }
        change_set
    }
}

impl<A: Address> Default for ChangeSet<A> {
    fn default() -> Self {
        Self {
            documents_to_update: Vec::new(),
            nodes_to_delete: Vec::new(),
            queued_deletes: HashSet::new(),
        }
    }
}

impl<A: Address> PartialEq for ChangeSet<A> {
    fn eq(&self, other: &Self) -> bool {
        self.documents_to_update == other.documents_to_update
            && self.nodes_to_delete == other.nodes_to_delete
    }
}

impl<A: Address> ChangeSet<A> {
    /// Empty change set
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a record update
    pub fn push_update(&mut self, locator: Locator<A>, fields_to_update: A::Update) {
        self.documents_to_update.push(DocumentUpdate {
            locator,
            fields_to_update,
        });
    }

    /// Queue a record deletion; a record already queued is not queued again
    pub fn push_delete(&mut self, locator: Locator<A>) {
        if self.queued_deletes.insert(locator.address.identity()) {
            self.nodes_to_delete.push(locator);
        }
    }

    /// Append `other` after the entries already queued
    pub fn merge(&mut self, other: ChangeSet<A>) {
        self.documents_to_update.extend(other.documents_to_update);
        for locator in other.nodes_to_delete {
            self.push_delete(locator);
        }
    }

    /// True if applying would change nothing
    pub fn is_empty(&self) -> bool {
        self.documents_to_update.is_empty() && self.nodes_to_delete.is_empty()
    }

    /// Total number of queued operations
    pub fn len(&self) -> usize {
        self.documents_to_update.len() + self.nodes_to_delete.len()
    }
}

/// Counts reported by a successful apply
///
/// Each document is counted once, however many updates target it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResult {
    /// Distinct records updated
    pub documents_updated: usize,
    /// Distinct records deleted
    pub documents_deleted: usize,
}

impl ApplyResult {
    /// Distinct documents touched by `change_set`, keyed by address identity
    pub fn counting<A: Address>(change_set: &ChangeSet<A>) -> Self {
        Self {
            documents_updated: distinct_documents(change_set.documents_to_update.iter().map(|u| &u.locator)),
            documents_deleted: distinct_documents(change_set.nodes_to_delete.iter()),
        }
    }
}

fn distinct_documents<'a, A: Address + 'a>(locators: impl Iterator<Item = &'a Locator<A>>) -> usize {
    locators
        .map(|locator| locator.address.identity())
        .collect::<HashSet<_>>()
        .len()
}

/// Result of a deletion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "A: Address")]
pub struct DeletionOutcome<A: Address> {
    /// The computed change set, always returned
    pub change_set: ChangeSet<A>,
    /// Present iff the request was committed
    pub applied: Option<ApplyResult>,
}

impl<A: Address> DeletionOutcome<A> {
    /// True if the change set was applied to the backend
    pub fn is_committed(&self) -> bool {
        self.applied.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CollectionQuery, DocumentPath};
    use serde_json::json;

    fn message(id: &str) -> Locator<DocumentPath> {
        Locator::single("message", DocumentPath::new(["gcs", "messages"], ["g1", id]))
    }

    #[test]
    fn test_merge_preserves_order_and_collapses_duplicate_deletes() {
        let mut parent = ChangeSet::new();
        parent.push_delete(message("m1"));

        let mut child = ChangeSet::new();
        child.push_delete(message("m2"));
        child.push_delete(message("m1"));

        parent.merge(child);
        let ids: Vec<_> = parent
            .nodes_to_delete
            .iter()
            .map(|l| l.address.doc_ids[1].clone())
            .collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[test]
    fn test_change_set_serializes_for_audit() {
        let mut change_set: ChangeSet<CollectionQuery> = ChangeSet::new();
        change_set.push_update(
            Locator::single("groupChat", CollectionQuery::by_id("gcs", "g1")),
            json!({"$pull": {"users": "u1"}}).as_object().cloned().unwrap(),
        );
        change_set.push_delete(Locator::single("user", CollectionQuery::by_id("users", "u1")));

        let encoded = serde_json::to_value(&change_set).unwrap();
        assert_eq!(encoded["nodesToDelete"][0]["collection"], json!("users"));
        assert_eq!(encoded["documentsToUpdate"][0]["locator"]["dataType"], json!("groupChat"));
        assert_eq!(
            encoded["documentsToUpdate"][0]["fieldsToUpdate"],
            json!({"$pull": {"users": "u1"}})
        );

        let decoded: ChangeSet<CollectionQuery> = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, change_set);
        assert_eq!(decoded.len(), 2);
    }

    #[test]
    fn test_decoded_change_set_still_collapses_duplicate_deletes() {
        let mut change_set: ChangeSet<DocumentPath> = ChangeSet::new();
        change_set.push_delete(message("m1"));

        let encoded = serde_json::to_string(&change_set).unwrap();
        let mut decoded: ChangeSet<DocumentPath> = serde_json::from_str(&encoded).unwrap();
        decoded.push_delete(message("m1"));
        decoded.merge({
            let mut other = ChangeSet::new();
            other.push_delete(message("m1"));
            other.push_delete(message("m2"));
            other
        });

        let ids: Vec<_> = decoded
            .nodes_to_delete
            .iter()
            .map(|l| l.address.doc_ids[1].clone())
            .collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[test]
    fn test_decoding_collapses_repeated_deletes() {
        let encoded = json!({
            "documentsToUpdate": [],
            "nodesToDelete": [
                {"dataType": "user", "singleDocument": true, "collection": "users", "filter": {"_id": "u1"}},
                {"dataType": "user", "singleDocument": true, "collection": "users", "filter": {"_id": "u1"}}
            ]
        });
        let decoded: ChangeSet<CollectionQuery> = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded.nodes_to_delete.len(), 1);
    }

    #[test]
    fn test_apply_result_counts_each_document_once() {
        let mut change_set: ChangeSet<DocumentPath> = ChangeSet::new();
        change_set.push_update(message("m1"), Vec::new());
        change_set.push_update(message("m1"), Vec::new());
        change_set.push_update(message("m2"), Vec::new());
        change_set.push_delete(message("m3"));

        let counts = ApplyResult::counting(&change_set);
        assert_eq!(counts, ApplyResult { documents_updated: 2, documents_deleted: 1 });
    }

    #[test]
    fn test_decision_builders() {
        let decision: DeletionDecision<DocumentPath> =
            DeletionDecision::delete().traverse(vec![message("m1")]);
        assert!(decision.delete_node);
        assert_eq!(decision.nodes_to_traverse.len(), 1);
        assert!(DeletionDecision::<DocumentPath>::keep().fields_to_update.is_none());
    }
}
