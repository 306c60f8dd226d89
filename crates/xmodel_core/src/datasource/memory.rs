//! In-process data source over attribute snapshots.

use super::{DataSource, DispatchError, DispatchResult, FIND_EXISTING, USED};
use crate::model::account::reference_id;
use crate::model::record::{Attributes, Record, RecordId};
use log::debug;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct StoredRecord {
    id: RecordId,
    attributes: Attributes,
}

/// Answers `findExisting` and `used` from records held in memory.
///
/// Records are kept per class name in insertion order.
#[derive(Debug, Default)]
pub struct MemoryDataSource {
    records: BTreeMap<String, Vec<StoredRecord>>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a snapshot of `record`, replacing any earlier snapshot.
    pub fn insert(&mut self, record: &Record) {
        let rows = self
            .records
            .entry(record.class_name().to_string())
            .or_default();
        let stored = StoredRecord {
            id: record.id(),
            attributes: record.attributes().clone(),
        };
        match rows.iter_mut().find(|row| row.id == stored.id) {
            Some(row) => *row = stored,
            None => rows.push(stored),
        }
    }

    /// Removes a snapshot. Returns whether one was present.
    pub fn remove(&mut self, class_name: &str, id: RecordId) -> bool {
        let Some(rows) = self.records.get_mut(class_name) else {
            return false;
        };
        let before = rows.len();
        rows.retain(|row| row.id != id);
        rows.len() != before
    }

    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn find_existing(&self, record_type: &str, params: &Value) -> DispatchResult<Value> {
        let (key, value, exclude) = match params.as_array().map(Vec::as_slice) {
            Some([Value::String(key), value, exclude]) => (key, value, exclude),
            _ => {
                return Err(invalid_params(
                    FIND_EXISTING,
                    "expected [key, value, excludeId]",
                ))
            }
        };
        let exclude = match exclude {
            Value::String(text) => Some(text.as_str()),
            Value::Number(number) if number.as_i64() == Some(-1) => None,
            _ => {
                return Err(invalid_params(
                    FIND_EXISTING,
                    "excludeId must be an id string or -1",
                ))
            }
        };

        let found = self
            .records
            .get(record_type)
            .into_iter()
            .flatten()
            .filter(|row| exclude != Some(row.id.to_string().as_str()))
            .find(|row| row.attributes.get(key.as_str()) == Some(value));

        debug!(
            "event=dispatch module=datasource method={} record_type={} status=ok found={}",
            FIND_EXISTING,
            record_type,
            found.is_some()
        );
        Ok(found.map_or(Value::from(0), |row| Value::String(row.id.to_string())))
    }

    fn used(&self, params: &Value) -> DispatchResult<Value> {
        let Some(target) = reference_id(params) else {
            return Err(invalid_params(USED, "expected an id"));
        };
        let used = self
            .records
            .values()
            .flatten()
            .filter(|row| row.id.to_string() != target)
            .any(|row| {
                row.attributes
                    .values()
                    .any(|value| references(value, &target))
            });

        debug!(
            "event=dispatch module=datasource method={} status=ok used={}",
            USED, used
        );
        Ok(Value::Bool(used))
    }
}

impl DataSource for MemoryDataSource {
    fn dispatch(&self, record_type: &str, method: &str, params: &Value) -> DispatchResult<Value> {
        match method {
            FIND_EXISTING => self.find_existing(record_type, params),
            USED => self.used(params),
            other => Err(DispatchError::UnknownMethod {
                record_type: record_type.to_string(),
                method: other.to_string(),
            }),
        }
    }
}

fn references(value: &Value, target: &str) -> bool {
    match value {
        Value::Object(map) => map
            .get("id")
            .and_then(reference_id)
            .is_some_and(|id| id == target),
        Value::Array(items) => items.iter().any(|item| references(item, target)),
        _ => false,
    }
}

fn invalid_params(method: &str, message: &str) -> DispatchError {
    DispatchError::InvalidParams {
        method: method.to_string(),
        message: message.to_string(),
    }
}
