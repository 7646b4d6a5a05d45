//! Record list view: fetch, filter, archive requests and detail panels.
//!
//! The list never patches its collection locally. Every successful mutation
//! is followed by a full re-fetch, so what is shown is always what the
//! backend last returned.

use chrono::{SecondsFormat, Utc};

use super::Synchronizer;
use crate::edit::{RecordDetailPanel, SaveRequest};
use crate::errors::ConsoleError;
use crate::models::{
    Entity, EntitySchema, Record, ARCHIVED_AT_FIELD, ARCHIVED_STATUS, STATUS_FIELD,
};

/// Lower-cased, space-joined searchable fields of a record.
pub fn search_text(record: &Record, schema: &EntitySchema) -> String {
    schema
        .searchable()
        .filter_map(|spec| record.text(spec.name))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Non-archived records whose search text contains `term`, case-insensitively.
/// An empty term keeps every non-archived record.
pub fn filter_records<'a>(
    records: &'a [Record],
    schema: &EntitySchema,
    term: &str,
) -> Vec<&'a Record> {
    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|record| !record.is_archived())
        .filter(|record| needle.is_empty() || search_text(record, schema).contains(&needle))
        .collect()
}

/// A collection fetch in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub entity: Entity,
    seq: u64,
}

#[derive(Debug)]
pub struct RecordListView {
    schema: &'static EntitySchema,
    records: Vec<Record>,
    search: String,
    issued: u64,
    loading: bool,
    notice: Option<String>,
    sync: Synchronizer,
}

impl RecordListView {
    pub fn new(entity: Entity, sync: Synchronizer) -> Self {
        Self {
            schema: entity.schema(),
            records: Vec::new(),
            search: String::new(),
            issued: 0,
            loading: false,
            notice: None,
            sync,
        }
    }

    pub fn entity(&self) -> Entity {
        self.schema.entity
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
    }

    /// Rows to display, re-derived from the collection and the search term.
    pub fn rows(&self) -> Vec<&Record> {
        filter_records(&self.records, self.schema, &self.search)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        self.loading = true;
        FetchTicket {
            entity: self.entity(),
            seq: self.issued,
        }
    }

    /// Apply a fetch result. Returns `false` when a newer fetch has been
    /// issued since, in which case the result is dropped.
    pub fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Record>, ConsoleError>,
    ) -> bool {
        if ticket.entity != self.entity() || ticket.seq != self.issued {
            tracing::debug!("Dropping stale {} fetch #{}", ticket.entity, ticket.seq);
            return false;
        }
        self.loading = false;

        match result {
            Ok(records) => {
                tracing::debug!("Fetched {} {}", records.len(), self.entity());
                self.records = records;
                self.notice = None;
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", self.entity(), e);
                self.records.clear();
                self.notice = Some(format!("Could not load {}: {}", self.entity(), e.message()));
            }
        }
        true
    }

    /// Visible (non-archived) record by id.
    pub fn find(&self, id: i64) -> Option<&Record> {
        self.records
            .iter()
            .find(|r| r.id == Some(id) && !r.is_archived())
    }

    /// Open a detail panel with a fresh, empty edit buffer.
    pub fn open(&self, id: i64) -> Result<RecordDetailPanel, ConsoleError> {
        let record = self.find(id).ok_or_else(|| self.not_found(id))?;
        Ok(RecordDetailPanel::open(self.schema, record.clone()))
    }

    pub fn create_form(&self) -> RecordDetailPanel {
        RecordDetailPanel::create_form(self.schema)
    }

    /// Soft delete: the full record with `status` set to archived and an
    /// archive timestamp, sent as an update.
    pub fn archive_request(&self, id: i64) -> Result<SaveRequest, ConsoleError> {
        let record = self.find(id).ok_or_else(|| self.not_found(id))?;
        let body = record
            .clone()
            .set(STATUS_FIELD, ARCHIVED_STATUS)
            .set(
                ARCHIVED_AT_FIELD,
                Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            );
        Ok(SaveRequest::Update {
            entity: self.entity(),
            id,
            body,
        })
    }

    /// Bookkeeping after a successful create/update/archive: notify the
    /// synchronizer once and start a re-fetch.
    pub fn mutation_committed(&mut self) -> FetchTicket {
        self.sync.notify();
        self.begin_fetch()
    }

    fn not_found(&self, id: i64) -> ConsoleError {
        ConsoleError::InvalidState(format!("No {} with id {}", self.schema.noun, id))
    }
}
