//! Ordered lists of metadata records, such as the `captures` and `annotations`
//! arrays of a SigMF file. Lists are kept sorted by one field of each record,
//! usually a sample index.

use crate::merge::merge_into;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::cmp::Ordering;
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug, PartialEq)]
pub enum RecordError {
    #[error("Record has no field {0:?}")]
    MissingKey(String),
    #[error("Entry {0} is not a metadata record")]
    NotARecord(String),
    #[error("Cannot order key {0} against key {1}")]
    Incomparable(String, String),
}

/// Where [`RecordList::insert_or_merge`] put the record.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Placement {
    /// Merged into the existing entry at this index, list length unchanged
    Merged(usize),
    /// Inserted at this index, in front of the first entry with a greater key
    Inserted(usize),
    /// Appended at this index, the end of the list
    Appended(usize),
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordList {
    entries: Vec<Value>,
}

impl RecordList {
    pub fn new() -> Self {
        RecordList::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.entries
    }

    pub fn into_inner(self) -> Vec<Value> {
        self.entries
    }

    /// Puts `new_record` in its place, assuming the list is already sorted by
    /// `key_field`. Falsy entries (`null`, `{}`, `false`, ...) are skipped.
    ///
    /// If an entry with an equal key exists, `new_record` is merged on top of it.
    /// With `force_insert` the record is instead inserted as a separate entry after
    /// the ones with an equal key, so duplicates are kept rather than overwritten.
    pub fn insert_or_merge(
        &mut self,
        new_record: Value,
        key_field: &str,
        force_insert: bool,
    ) -> Result<Placement, RecordError> {
        let placement = self.find_slot(&new_record, key_field, force_insert)?;
        match placement {
            Placement::Merged(index) => {
                trace!(index, "Merging record into existing entry");
                merge_into(&mut self.entries[index], &new_record);
            }
            Placement::Inserted(index) => {
                trace!(index, "Inserting record");
                self.entries.insert(index, new_record);
            }
            Placement::Appended(_) => self.entries.push(new_record),
        }
        Ok(placement)
    }

    fn find_slot(
        &self,
        new_record: &Value,
        key_field: &str,
        force_insert: bool,
    ) -> Result<Placement, RecordError> {
        for (index, entry) in self.entries.iter().enumerate() {
            if is_falsy(entry) {
                continue;
            }
            let existing = key_of(entry, key_field)?;
            let new_key = key_of(new_record, key_field)?;

            if !force_insert && keys_equal(existing, new_key) {
                return Ok(Placement::Merged(index));
            }
            if ordering_of(existing, new_key)? == Ordering::Greater {
                return Ok(Placement::Inserted(index));
            }
        }
        Ok(Placement::Appended(self.entries.len()))
    }

    /// True if the non-falsy entries are non-decreasing by `key_field`.
    pub fn is_sorted_by(&self, key_field: &str) -> bool {
        let keys: Result<Vec<&Value>, RecordError> = self
            .entries
            .iter()
            .filter(|entry| !is_falsy(entry))
            .map(|entry| key_of(entry, key_field))
            .collect();
        let Ok(keys) = keys else {
            return false;
        };
        keys.windows(2)
            .all(|pair| matches!(ordering_of(pair[0], pair[1]), Ok(Ordering::Less | Ordering::Equal)))
    }
}

impl From<Vec<Value>> for RecordList {
    fn from(entries: Vec<Value>) -> Self {
        RecordList { entries }
    }
}

impl IntoIterator for RecordList {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordList {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Inserts `new_record` into `records` and hands the list back.
/// See [`RecordList::insert_or_merge`].
pub fn insert_sorted(
    mut records: RecordList,
    new_record: Value,
    key_field: &str,
    force_insert: bool,
) -> Result<RecordList, RecordError> {
    records.insert_or_merge(new_record, key_field, force_insert)?;
    Ok(records)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn key_of<'a>(record: &'a Value, key_field: &str) -> Result<&'a Value, RecordError> {
    match record {
        Value::Object(fields) => fields
            .get(key_field)
            .ok_or_else(|| RecordError::MissingKey(key_field.to_owned())),
        other => Err(RecordError::NotARecord(other.to_string())),
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return Some(a.cmp(&b));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

// 1 and 1.0 are the same key, also inside arrays
fn keys_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) | (Value::Array(_), Value::Array(_)) => {
            compare_keys(a, b) == Some(Ordering::Equal) || a == b
        }
        _ => a == b,
    }
}

fn compare_keys(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Array(a), Value::Array(b)) => {
            for (x, y) in a.iter().zip(b) {
                match compare_keys(x, y)? {
                    Ordering::Equal => continue,
                    unequal => return Some(unequal),
                }
            }
            Some(a.len().cmp(&b.len()))
        }
        _ => None,
    }
}

fn ordering_of(a: &Value, b: &Value) -> Result<Ordering, RecordError> {
    compare_keys(a, b).ok_or_else(|| RecordError::Incomparable(a.to_string(), b.to_string()))
}
