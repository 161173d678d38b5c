//! Hierarchical document-store addressing
//!
//! A document lives at an alternating path of collection names and document
//! ids: `users/u1/chats/c7`. A [`DocumentPath`] stores the two halves
//! separately, so a multi-document path simply has one id fewer than it has
//! collections and names the trailing collection.

use crate::core::{Error, Result};
use crate::types::field_path;
use crate::types::locator::Address;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Address in a hierarchical document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPath {
    /// Collection names from the root, e.g. `["gcs", "messages"]`
    pub collection_path: Vec<String>,

    /// Document ids in the order of `collection_path`
    pub doc_ids: Vec<String>,

    /// Predicates restricting a collection query; ignored for single documents
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
}

/// Comparison operator of a [`Filter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    /// Field equals value
    #[serde(rename = "==")]
    Eq,
    /// Field differs from value
    #[serde(rename = "!=")]
    NotEq,
    /// Field is less than value
    #[serde(rename = "<")]
    Lt,
    /// Field is less than or equal to value
    #[serde(rename = "<=")]
    Lte,
    /// Field is greater than value
    #[serde(rename = ">")]
    Gt,
    /// Field is greater than or equal to value
    #[serde(rename = ">=")]
    Gte,
    /// Array field contains value
    #[serde(rename = "array-contains")]
    ArrayContains,
    /// Array field contains any element of the value array
    #[serde(rename = "array-contains-any")]
    ArrayContainsAny,
    /// Field equals one element of the value array
    #[serde(rename = "in")]
    In,
    /// Field equals no element of the value array
    #[serde(rename = "not-in")]
    NotIn,
}

/// Predicate on a (dotted) field path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Dotted field path
    pub path: String,
    /// Comparison operator
    pub op: FilterOp,
    /// Operand
    pub value: Value,
}

/// One field-level change in a hierarchical update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    /// Dotted field path
    pub path: String,
    /// What to do with the field
    #[serde(flatten)]
    pub transform: FieldTransform,
}

/// Field transform applied by a [`FieldUpdate`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum FieldTransform {
    /// Overwrite the field
    Set {
        /// New value
        value: Value,
    },
    /// Remove the field
    Delete,
    /// Append elements not already present
    ArrayUnion {
        /// Elements to add
        values: Vec<Value>,
    },
    /// Remove every occurrence of the given elements
    ArrayRemove {
        /// Elements to remove
        values: Vec<Value>,
    },
    /// Add a number to the field
    Increment {
        /// Amount to add
        by: Value,
    },
}

impl DocumentPath {
    /// Path to a single document or a collection, depending on id count
    pub fn new<P, I>(collection_path: P, doc_ids: I) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            collection_path: collection_path.into_iter().map(Into::into).collect(),
            doc_ids: doc_ids.into_iter().map(Into::into).collect(),
            filters: Vec::new(),
        }
    }

    /// Add a predicate to a collection query
    pub fn with_filter(mut self, path: impl Into<String>, op: FilterOp, value: Value) -> Self {
        self.filters.push(Filter {
            path: path.into(),
            op,
            value,
        });
        self
    }

    /// Path of sub-collection `name` beneath the document this path names
    pub fn child_collection(&self, name: impl Into<String>) -> Self {
        let mut collection_path = self.collection_path.clone();
        collection_path.push(name.into());
        Self {
            collection_path,
            doc_ids: self.doc_ids.clone(),
            filters: Vec::new(),
        }
    }

    /// Alternating `collection/id/...` rendering
    pub fn display_path(&self) -> String {
        let mut parts = Vec::with_capacity(self.collection_path.len() + self.doc_ids.len());
        for (i, collection) in self.collection_path.iter().enumerate() {
            parts.push(collection.as_str());
            if let Some(id) = self.doc_ids.get(i) {
                parts.push(id.as_str());
            }
        }
        parts.join("/")
    }
}

impl Address for DocumentPath {
    type Update = Vec<FieldUpdate>;

    fn validate(&self, single_document: bool) -> Result<()> {
        if self.collection_path.is_empty() {
            return Err(Error::validation("collection path must have at least one element"));
        }
        if single_document && self.doc_ids.len() != self.collection_path.len() {
            return Err(Error::validation(format!(
                "single document locator must have as many document ids as collection path elements ({} ids, {} collections)",
                self.doc_ids.len(),
                self.collection_path.len()
            )));
        }
        if !single_document && self.doc_ids.len() + 1 != self.collection_path.len() {
            return Err(Error::validation(format!(
                "collection locator must have one less document id than collection path elements ({} ids, {} collections)",
                self.doc_ids.len(),
                self.collection_path.len()
            )));
        }
        Ok(())
    }

    fn narrow(&self, single_document: bool, record_id: &str) -> Self {
        let mut doc_ids = self.doc_ids.clone();
        if !single_document {
            doc_ids.push(record_id.to_string());
        }
        Self {
            collection_path: self.collection_path.clone(),
            doc_ids,
            filters: Vec::new(),
        }
    }

    fn identity(&self) -> String {
        let mut identity = self.display_path();
        for filter in &self.filters {
            identity.push_str(&format!("?{}{}{}", filter.path, filter.op.symbol(), filter.value));
        }
        identity
    }
}

impl FilterOp {
    /// Operator as written in queries
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::NotEq => "!=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::ArrayContains => "array-contains",
            FilterOp::ArrayContainsAny => "array-contains-any",
            FilterOp::In => "in",
            FilterOp::NotIn => "not-in",
        }
    }
}

impl Filter {
    /// Evaluate the predicate against a document
    ///
    /// A missing field never matches, not even for `!=` / `not-in`.
    pub fn matches(&self, doc: &Map<String, Value>) -> bool {
        let Some(field) = field_path::lookup(doc, &self.path) else {
            return false;
        };

        match self.op {
            FilterOp::Eq => field == &self.value,
            FilterOp::NotEq => field != &self.value,
            FilterOp::Lt => field_path::compare(field, &self.value) == Some(Ordering::Less),
            FilterOp::Lte => matches!(
                field_path::compare(field, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::Gt => field_path::compare(field, &self.value) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(
                field_path::compare(field, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::ArrayContains => field
                .as_array()
                .is_some_and(|items| items.contains(&self.value)),
            FilterOp::ArrayContainsAny => match (field.as_array(), self.value.as_array()) {
                (Some(items), Some(wanted)) => wanted.iter().any(|w| items.contains(w)),
                _ => false,
            },
            FilterOp::In => self
                .value
                .as_array()
                .is_some_and(|options| options.contains(field)),
            FilterOp::NotIn => self
                .value
                .as_array()
                .is_some_and(|options| !options.contains(field)),
        }
    }
}

impl FieldUpdate {
    /// Overwrite `path` with `value`
    pub fn set(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            transform: FieldTransform::Set { value },
        }
    }

    /// Remove `path`
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            transform: FieldTransform::Delete,
        }
    }

    /// Remove `values` from the array at `path`
    pub fn array_remove(path: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            path: path.into(),
            transform: FieldTransform::ArrayRemove { values },
        }
    }

    /// Add missing `values` to the array at `path`
    pub fn array_union(path: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            path: path.into(),
            transform: FieldTransform::ArrayUnion { values },
        }
    }

    /// Add `by` to the number at `path`
    pub fn increment(path: impl Into<String>, by: Value) -> Self {
        Self {
            path: path.into(),
            transform: FieldTransform::Increment { by },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_document_validation() {
        assert!(DocumentPath::new(["users"], ["u1"]).validate(true).is_ok());
        assert!(DocumentPath::new(["users"], Vec::<String>::new()).validate(true).is_err());
        assert!(DocumentPath::new(["users", "gcs"], ["u1"]).validate(true).is_err());
    }

    #[test]
    fn test_collection_validation() {
        assert!(DocumentPath::new(["users", "gcs"], ["u1"]).validate(false).is_ok());
        assert!(DocumentPath::new(["users"], Vec::<String>::new()).validate(false).is_ok());
        assert!(DocumentPath::new(["users"], ["u1"]).validate(false).is_err());
    }

    #[test]
    fn test_empty_path_rejected() {
        let path = DocumentPath::new(Vec::<String>::new(), Vec::<String>::new());
        let err = path.validate(false).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_narrow_appends_record_id_and_drops_filters() {
        let path = DocumentPath::new(["gcs", "messages"], ["g1"]).with_filter(
            "userId",
            FilterOp::Eq,
            json!("u1"),
        );
        let narrowed = path.narrow(false, "m7");
        assert_eq!(narrowed.doc_ids, vec!["g1", "m7"]);
        assert!(narrowed.filters.is_empty());
        assert!(narrowed.validate(true).is_ok());

        let single = DocumentPath::new(["users"], ["u1"]);
        assert_eq!(single.narrow(true, "u1"), single);
    }

    #[test]
    fn test_display_path_alternates() {
        let path = DocumentPath::new(["gcs", "messages"], ["g1"]);
        assert_eq!(path.display_path(), "gcs/g1/messages");
        assert_eq!(path.child_collection("reactions").collection_path.len(), 3);
    }

    #[test]
    fn test_filter_matching() {
        let doc = json!({"userId": "u1", "likes": 3, "tags": ["a", "b"]});
        let doc = doc.as_object().unwrap();

        let eq = Filter { path: "userId".into(), op: FilterOp::Eq, value: json!("u1") };
        let gt = Filter { path: "likes".into(), op: FilterOp::Gt, value: json!(2) };
        let contains = Filter { path: "tags".into(), op: FilterOp::ArrayContains, value: json!("b") };
        let not_in = Filter { path: "userId".into(), op: FilterOp::NotIn, value: json!(["u2"]) };
        let missing = Filter { path: "owner".into(), op: FilterOp::NotEq, value: json!("u1") };

        assert!(eq.matches(doc));
        assert!(gt.matches(doc));
        assert!(contains.matches(doc));
        assert!(not_in.matches(doc));
        assert!(!missing.matches(doc));
    }

    #[test]
    fn test_field_update_serialization() {
        let update = FieldUpdate::array_remove("users", vec![json!("u1")]);
        let encoded = serde_json::to_value(&update).unwrap();
        assert_eq!(encoded, json!({"path": "users", "op": "arrayRemove", "values": ["u1"]}));
    }
}
