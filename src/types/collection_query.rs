//! Flat collection-store addressing
//!
//! Records live in named collections and are selected with a query
//! document in the usual `{"field": value, "n": {"$gt": 3}}` style.

use crate::core::Result;
use crate::types::locator::Address;
use crate::types::record::ID_FIELD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Operator update document, e.g. `{"$pull": {"users": "u1"}}`
pub type UpdateDocument = Map<String, Value>;

/// Address in a flat collection store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionQuery {
    /// Collection name
    pub collection: String,

    /// Query document; empty matches every record
    #[serde(default)]
    pub filter: Map<String, Value>,
}

impl CollectionQuery {
    /// Query `collection` with `filter`
    ///
    /// A filter that is not a JSON object is treated as empty.
    pub fn new(collection: impl Into<String>, filter: Value) -> Self {
        let filter = match filter {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            collection: collection.into(),
            filter,
        }
    }

    /// Query matching the record with durable id `id`
    pub fn by_id(collection: impl Into<String>, id: impl Into<String>) -> Self {
        let mut filter = Map::new();
        filter.insert(ID_FIELD.to_string(), Value::String(id.into()));
        Self {
            collection: collection.into(),
            filter,
        }
    }
}

impl Address for CollectionQuery {
    type Update = UpdateDocument;

    fn validate(&self, _single_document: bool) -> Result<()> {
        Ok(())
    }

    fn narrow(&self, _single_document: bool, record_id: &str) -> Self {
        Self::by_id(self.collection.clone(), record_id)
    }

    fn identity(&self) -> String {
        format!("{}{}", self.collection, Value::Object(self.filter.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_is_noop() {
        let query = CollectionQuery::new("messages", json!({"userId": "u1"}));
        assert!(query.validate(true).is_ok());
        assert!(query.validate(false).is_ok());
    }

    #[test]
    fn test_narrow_selects_by_id() {
        let query = CollectionQuery::new("messages", json!({"chatId": "g1"}));
        let narrowed = query.narrow(false, "m1");
        assert_eq!(narrowed, CollectionQuery::by_id("messages", "m1"));
    }

    #[test]
    fn test_identity_is_order_independent() {
        let a = CollectionQuery::new("messages", json!({"a": 1, "b": 2}));
        let b = CollectionQuery::new("messages", json!({"b": 2, "a": 1}));
        assert_eq!(a.identity(), b.identity());
    }
}
