//! Query documents and update operators for the flat collection store
//!
//! Supported filter forms:
//! - `{"field": value}`: equality, or membership when the field is an array
//! - `{"field": {"$eq" | "$ne" | "$gt" | "$gte" | "$lt" | "$lte": v}}`
//! - `{"field": {"$in" | "$nin": [..]}}`, `{"field": {"$exists": bool}}`
//! - top-level `{"$and": [..]}` and `{"$or": [..]}`
//!
//! Supported update operators: `$set`, `$unset`, `$inc`, `$push`,
//! `$addToSet`, `$pull`.

use crate::core::{StorageError, StorageResult};
use crate::types::field_path;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Evaluate a query document against a record
pub fn matches(filter: &Map<String, Value>, doc: &Map<String, Value>) -> StorageResult<bool> {
    for (key, condition) in filter {
        let matched = match key.as_str() {
            "$and" => all_of(condition, doc)?,
            "$or" => any_of(condition, doc)?,
            op if op.starts_with('$') => {
                return Err(StorageError::InvalidFilter(format!(
                    "unsupported top-level operator {}",
                    op
                )))
            }
            path => field_matches(field_path::lookup(doc, path), condition)?,
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn sub_filters(condition: &Value) -> StorageResult<impl Iterator<Item = &Map<String, Value>>> {
    let clauses = condition
        .as_array()
        .ok_or_else(|| StorageError::InvalidFilter("$and/$or expects an array".into()))?;
    if clauses.iter().any(|c| !c.is_object()) {
        return Err(StorageError::InvalidFilter(
            "$and/$or clauses must be objects".into(),
        ));
    }
    Ok(clauses.iter().filter_map(Value::as_object))
}

fn all_of(condition: &Value, doc: &Map<String, Value>) -> StorageResult<bool> {
    for clause in sub_filters(condition)? {
        if !matches(clause, doc)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn any_of(condition: &Value, doc: &Map<String, Value>) -> StorageResult<bool> {
    for clause in sub_filters(condition)? {
        if matches(clause, doc)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn is_operator_object(condition: &Value) -> bool {
    condition
        .as_object()
        .is_some_and(|map| !map.is_empty() && map.keys().all(|k| k.starts_with('$')))
}

fn equals(field: Option<&Value>, expected: &Value) -> bool {
    match field {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => items.contains(expected),
        Some(value) => value == expected,
    }
}

fn ordered(field: Option<&Value>, operand: &Value, accept: fn(Ordering) -> bool) -> bool {
    field
        .and_then(|value| field_path::compare(value, operand))
        .is_some_and(accept)
}

fn field_matches(field: Option<&Value>, condition: &Value) -> StorageResult<bool> {
    if !is_operator_object(condition) {
        return Ok(equals(field, condition));
    }

    let Some(operators) = condition.as_object() else {
        return Ok(false);
    };
    for (op, operand) in operators {
        let matched = match op.as_str() {
            "$eq" => equals(field, operand),
            "$ne" => !equals(field, operand),
            "$gt" => ordered(field, operand, Ordering::is_gt),
            "$gte" => ordered(field, operand, Ordering::is_ge),
            "$lt" => ordered(field, operand, Ordering::is_lt),
            "$lte" => ordered(field, operand, Ordering::is_le),
            "$in" => options(op, operand)?.iter().any(|o| equals(field, o)),
            "$nin" => !options(op, operand)?.iter().any(|o| equals(field, o)),
            "$exists" => field.is_some() == operand.as_bool().unwrap_or(true),
            other => {
                return Err(StorageError::InvalidFilter(format!(
                    "unsupported operator {}",
                    other
                )))
            }
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn options<'a>(op: &str, operand: &'a Value) -> StorageResult<&'a Vec<Value>> {
    operand
        .as_array()
        .ok_or_else(|| StorageError::InvalidFilter(format!("{} expects an array", op)))
}

/// Apply an operator update document to a record in place
///
/// The `_id` field cannot be modified.
pub fn apply_update(doc: &mut Map<String, Value>, update: &Map<String, Value>) -> StorageResult<()> {
    if update.is_empty() {
        return Err(StorageError::InvalidUpdate("update document is empty".into()));
    }

    for (op, fields) in update {
        let fields = fields.as_object().ok_or_else(|| {
            StorageError::InvalidUpdate(format!("{} expects an object of fields", op))
        })?;

        for (path, operand) in fields {
            if path == crate::types::ID_FIELD {
                return Err(StorageError::InvalidUpdate("_id is immutable".into()));
            }
            apply_operator(doc, op, path, operand)?;
        }
    }
    Ok(())
}

fn apply_operator(
    doc: &mut Map<String, Value>,
    op: &str,
    path: &str,
    operand: &Value,
) -> StorageResult<()> {
    match op {
        "$set" => {
            if !field_path::set(doc, path, operand.clone()) {
                return Err(StorageError::InvalidUpdate(format!("cannot set {}", path)));
            }
        }
        "$unset" => {
            field_path::remove(doc, path);
        }
        "$inc" => {
            let slot = array_or_slot(doc, path)?;
            *slot = field_path::add_numbers(slot, operand).ok_or_else(|| {
                StorageError::InvalidUpdate(format!("cannot increment non-numeric {}", path))
            })?;
        }
        "$push" => {
            array_at(doc, path)?.push(operand.clone());
        }
        "$addToSet" => {
            let items = array_at(doc, path)?;
            if !items.contains(operand) {
                items.push(operand.clone());
            }
        }
        "$pull" => {
            if let Some(Value::Array(items)) = field_path::lookup(doc, path).cloned() {
                let kept: Vec<Value> = items
                    .into_iter()
                    .map(|item| -> StorageResult<Option<Value>> {
                        let drop = pull_matches(&item, operand)?;
                        Ok((!drop).then_some(item))
                    })
                    .collect::<StorageResult<Vec<_>>>()?
                    .into_iter()
                    .flatten()
                    .collect();
                field_path::set(doc, path, Value::Array(kept));
            }
        }
        other => {
            return Err(StorageError::InvalidUpdate(format!(
                "unsupported update operator {}",
                other
            )))
        }
    }
    Ok(())
}

fn pull_matches(item: &Value, operand: &Value) -> StorageResult<bool> {
    match (item, operand) {
        (Value::Object(item), Value::Object(filter)) if !is_operator_object(operand) => {
            matches(filter, item)
        }
        _ if is_operator_object(operand) => field_matches(Some(item), operand),
        _ => Ok(item == operand),
    }
}

fn array_or_slot<'a>(doc: &'a mut Map<String, Value>, path: &str) -> StorageResult<&'a mut Value> {
    field_path::entry(doc, path)
        .ok_or_else(|| StorageError::InvalidUpdate(format!("cannot address {}", path)))
}

fn array_at<'a>(doc: &'a mut Map<String, Value>, path: &str) -> StorageResult<&'a mut Vec<Value>> {
    let slot = array_or_slot(doc, path)?;
    if slot.is_null() {
        *slot = Value::Array(Vec::new());
    }
    slot.as_array_mut()
        .ok_or_else(|| StorageError::InvalidUpdate(format!("{} is not an array", path)))
}
