//! Records returned by storage adapters

use serde::Serialize;
use serde_json::{Map, Value};
use std::ops::Deref;

/// Field holding a record's durable identifier
pub const ID_FIELD: &str = "_id";

/// A fetched record, annotated with its backend-assigned identifier
///
/// The identifier is both available through [`Record::id`] and stored in
/// the `_id` field so handlers can read it like any other field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
    #[serde(skip)]
    id: String,
}

impl Record {
    /// Annotate `fields` with `id`
    pub fn new(id: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        let id = id.into();
        fields.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        Self { fields, id }
    }

    /// Durable identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Top-level fields, including `_id`
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Top-level field as a string
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Consume the record
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

impl Deref for Record {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.fields
    }
}
