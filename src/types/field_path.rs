//! Dotted field paths and value ordering
//!
//! Both in-memory backends address nested fields as `a.b.c` and need a
//! total-enough ordering over JSON values for range predicates.

use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Look up a dotted path inside a document
pub fn lookup<'a>(doc: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Mutable lookup of a dotted path, creating intermediate objects
///
/// Returns `None` when an intermediate segment exists but is not an object.
pub fn entry<'a>(doc: &'a mut Map<String, Value>, path: &str) -> Option<&'a mut Value> {
    let mut segments: Vec<&str> = path.split('.').collect();
    let last = segments.pop()?;

    let mut current = doc;
    for segment in segments {
        current = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()?;
    }
    Some(current.entry(last.to_string()).or_insert(Value::Null))
}

/// Set a dotted path, creating intermediate objects
pub fn set(doc: &mut Map<String, Value>, path: &str, value: Value) -> bool {
    match entry(doc, path) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

/// Remove a dotted path; returns the removed value
pub fn remove(doc: &mut Map<String, Value>, path: &str) -> Option<Value> {
    match path.rsplit_once('.') {
        None => doc.remove(path),
        Some((parent, last)) => {
            let mut current = doc;
            for segment in parent.split('.') {
                current = current.get_mut(segment)?.as_object_mut()?;
            }
            current.remove(last)
        }
    }
}

/// Compare two JSON values of the same kind
///
/// Values of different kinds (or arrays/objects) are unordered.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return Some(x.cmp(&y));
            }
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Numeric addition used by increment operators
pub fn add_numbers(current: &Value, by: &Value) -> Option<Value> {
    let by_num = match by {
        Value::Number(n) => n,
        _ => return None,
    };
    let current_num = match current {
        Value::Null => return Some(by.clone()),
        Value::Number(n) => n,
        _ => return None,
    };

    if let (Some(a), Some(b)) = (current_num.as_i64(), by_num.as_i64()) {
        if let Some(sum) = a.checked_add(b) {
            return Some(Value::from(sum));
        }
    }
    let sum = current_num.as_f64()? + by_num.as_f64()?;
    serde_json::Number::from_f64(sum).map(Value::Number)
}
