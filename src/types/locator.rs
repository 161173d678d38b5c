//! Locators: references to one record or a homogeneous set of records
//!
//! A locator is a pure reference. It never carries a copy of the data it
//! names, only the backend address plus a `data_type` tag that handlers use
//! for dispatch. The backend kind is the type parameter `A`, so a client
//! bound to one backend can only be handed locators for that backend.

use crate::core::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Backend-specific addressing carried by a [`Locator`]
pub trait Address:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Partial-update payload understood by the backend
    type Update: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Check structural consistency of the address
    fn validate(&self, single_document: bool) -> Result<()>;

    /// Address of exactly the fetched record with durable id `record_id`
    fn narrow(&self, single_document: bool, record_id: &str) -> Self;

    /// Canonical string form, stable for equal addresses
    fn identity(&self) -> String;
}

/// Reference to one record (`single_document`) or a set of records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "A: Address")]
pub struct Locator<A: Address> {
    /// Opaque tag identifying the record kind; only handlers interpret it
    pub data_type: String,

    /// True if this locator addresses exactly one record
    pub single_document: bool,

    /// Backend addressing fields
    #[serde(flatten)]
    pub address: A,

    /// Opaque payload passed from a parent handler to the child's handler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl<A: Address> Locator<A> {
    /// Locator addressing exactly one record
    pub fn single(data_type: impl Into<String>, address: A) -> Self {
        Self {
            data_type: data_type.into(),
            single_document: true,
            address,
            context: None,
        }
    }

    /// Locator addressing zero or more records
    pub fn many(data_type: impl Into<String>, address: A) -> Self {
        Self {
            data_type: data_type.into(),
            single_document: false,
            address,
            context: None,
        }
    }

    /// Attach an opaque context payload
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Validate the address against the `single_document` flag
    pub fn validate(&self) -> Result<()> {
        self.address.validate(self.single_document)
    }

    /// Single-document locator for one record fetched through `self`
    ///
    /// Keeps `data_type` and `context` so the record's handler sees what
    /// the parent asked for.
    pub fn narrow(&self, record_id: &str) -> Self {
        Self {
            data_type: self.data_type.clone(),
            single_document: true,
            address: self.address.narrow(self.single_document, record_id),
            context: self.context.clone(),
        }
    }

    /// Canonical identity: data type plus address
    pub fn identity(&self) -> String {
        format!("{}:{}", self.data_type, self.address.identity())
    }
}

impl<A: Address> fmt::Display for Locator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity())
    }
}
