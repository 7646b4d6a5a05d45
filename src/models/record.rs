//! Record model shared by students and faculty.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::{ARCHIVED_STATUS, STATUS_FIELD};

/// Placeholder rendered for a field with no value.
pub const PLACEHOLDER: &str = "N/A";

/// One student or faculty record as returned by the backend.
///
/// Fields are kept as raw JSON scalars so that anything the backend sends
/// (including fields the console does not know about) goes back unchanged on
/// update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identity; absent until the backend creates the record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style setter used by fixtures and the archive action.
    pub fn set(mut self, field: &str, value: impl Into<String>) -> Self {
        self.fields
            .insert(field.to_string(), Value::String(value.into()));
        self
    }

    /// Scalar value of a field as display text. `null` and missing are `None`.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn is_archived(&self) -> bool {
        self.text(STATUS_FIELD)
            .is_some_and(|s| s.eq_ignore_ascii_case(ARCHIVED_STATUS))
    }

    /// Overlay string values onto a copy of this record.
    pub fn merged<'a, I>(&self, overlay: I) -> Record
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut merged = self.clone();
        for (field, value) in overlay {
            merged
                .fields
                .insert(field.clone(), Value::String(value.clone()));
        }
        merged
    }

    /// Copy without the identity, as sent on create.
    pub fn without_id(&self) -> Record {
        Record {
            id: None,
            fields: self.fields.clone(),
        }
    }

    /// Parse a collection payload. Anything but a JSON array is an empty
    /// collection; array entries that are not records are skipped.
    pub fn collection_from_json(payload: Value) -> Vec<Record> {
        match payload {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match serde_json::from_value::<Record>(item) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::warn!("Skipping malformed record in collection: {}", e);
                        None
                    }
                })
                .collect(),
            other => {
                tracing::warn!(
                    "Collection payload is not an array ({}), treating as empty",
                    json_kind(&other)
                );
                Vec::new()
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
