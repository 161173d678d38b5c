//! Access handler output and the resolved report

use crate::types::locator::{Address, Locator};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Fully resolved access report: handler keys mapped to disclosed values
pub type Report = Map<String, Value>;

/// One field of an access handler's output
///
/// Locators are marked explicitly; the engine never guesses whether a
/// value "looks like" a locator.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<A: Address> {
    /// Nothing to disclose; the key is dropped from the report
    Absent,
    /// Directly disclosable value, copied verbatim
    Value(Value),
    /// Resolved and substituted by its sub-report
    Locator(Locator<A>),
    /// Each resolved independently; order is preserved
    Locators(Vec<Locator<A>>),
    /// Each resolved by key
    LocatorMap(BTreeMap<String, Locator<A>>),
}

impl<A: Address> From<Value> for Field<A> {
    fn from(value: Value) -> Self {
        Field::Value(value)
    }
}

impl<A: Address> From<Option<Value>> for Field<A> {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Field::Absent, Field::Value)
    }
}

impl<A: Address> From<Locator<A>> for Field<A> {
    fn from(locator: Locator<A>) -> Self {
        Field::Locator(locator)
    }
}

impl<A: Address> From<Vec<Locator<A>>> for Field<A> {
    fn from(locators: Vec<Locator<A>>) -> Self {
        Field::Locators(locators)
    }
}

impl<A: Address> From<BTreeMap<String, Locator<A>>> for Field<A> {
    fn from(locators: BTreeMap<String, Locator<A>>) -> Self {
        Field::LocatorMap(locators)
    }
}

/// Output of an access handler for one record
#[derive(Debug, Clone, PartialEq)]
pub struct AccessFields<A: Address> {
    fields: BTreeMap<String, Field<A>>,
}

impl<A: Address> Default for AccessFields<A> {
    fn default() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }
}

impl<A: Address> AccessFields<A> {
    /// Empty output
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, field: impl Into<Field<A>>) -> Self {
        self.insert(key, field);
        self
    }

    /// Insert or replace a field
    pub fn insert(&mut self, key: impl Into<String>, field: impl Into<Field<A>>) {
        self.fields.insert(key.into(), field.into());
    }

    /// Number of fields, absent ones included
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if no field was set
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field
    pub fn get(&self, key: &str) -> Option<&Field<A>> {
        self.fields.get(key)
    }
}

impl<A: Address> IntoIterator for AccessFields<A> {
    type Item = (String, Field<A>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Field<A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<A: Address, K: Into<String>, F: Into<Field<A>>> FromIterator<(K, F)> for AccessFields<A> {
    fn from_iter<T: IntoIterator<Item = (K, F)>>(iter: T) -> Self {
        let mut fields = Self::new();
        for (key, field) in iter {
            fields.insert(key, field);
        }
        fields
    }
}
