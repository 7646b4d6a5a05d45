//! Pending-edit buffer: the uncommitted draft of one open record.

use std::collections::BTreeMap;

use crate::errors::ConsoleError;
use crate::models::EntitySchema;

/// Field edits confirmed in a panel but not yet saved.
///
/// Keys are always field names of the owning schema.
#[derive(Debug)]
pub struct PendingEdits {
    schema: &'static EntitySchema,
    edits: BTreeMap<String, String>,
}

impl PendingEdits {
    pub fn new(schema: &'static EntitySchema) -> Self {
        Self {
            schema,
            edits: BTreeMap::new(),
        }
    }

    /// Stage a value. Returns `true` when this made the buffer non-empty.
    pub fn stage(&mut self, field: &str, value: String) -> Result<bool, ConsoleError> {
        if self.schema.field(field).is_none() {
            return Err(ConsoleError::InvalidState(format!(
                "{} has no field named {}",
                self.schema.noun, field
            )));
        }
        let was_empty = self.edits.is_empty();
        self.edits.insert(field.to_string(), value);
        Ok(was_empty)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.edits.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Drop every edit. Clearing an empty buffer is a no-op.
    pub fn clear(&mut self) {
        self.edits.clear();
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.edits.clone()
    }

    /// Remove the edits that a successful save sent, keeping anything staged
    /// (or changed) while the request was in flight.
    pub fn settle(&mut self, sent: &BTreeMap<String, String>) {
        self.edits
            .retain(|field, value| sent.get(field) != Some(value));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.edits.iter()
    }
}
