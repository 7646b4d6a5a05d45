//! Detail/edit panel over one record.
//!
//! The panel owns the record as last fetched, the pending edits overlaid on
//! it and at most one open inline editor. Nothing reaches the backend until
//! `begin_save`, which batches every staged field into a single request.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::api::RecordStore;
use crate::errors::ConsoleError;
use crate::models::{Entity, EntitySchema, Record, PLACEHOLDER};

use super::{FieldEditCell, PendingEdits};

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Identity of one panel instance. Reopening a record yields a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelSession(u64);

impl PanelSession {
    fn next() -> Self {
        PanelSession(NEXT_SESSION.fetch_add(1, Ordering::Relaxed))
    }
}

/// The single network call a save turns into.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveRequest {
    Create { entity: Entity, body: Record },
    Update { entity: Entity, id: i64, body: Record },
}

impl SaveRequest {
    pub fn entity(&self) -> Entity {
        match self {
            SaveRequest::Create { entity, .. } | SaveRequest::Update { entity, .. } => *entity,
        }
    }

    pub fn body(&self) -> &Record {
        match self {
            SaveRequest::Create { body, .. } | SaveRequest::Update { body, .. } => body,
        }
    }

    pub async fn dispatch<S: RecordStore>(&self, store: &S) -> Result<Option<Record>, ConsoleError> {
        match self {
            SaveRequest::Create { entity, body } => store.create(*entity, body).await,
            SaveRequest::Update { entity, id, body } => {
                store.update(*entity, *id, body).await.map(|_| None)
            }
        }
    }
}

/// An in-flight save, handed back to `finish_save` with the response.
#[derive(Debug, Clone)]
pub struct SaveTicket {
    pub session: PanelSession,
    pub request: SaveRequest,
    sent: BTreeMap<String, String>,
}

#[derive(Debug, PartialEq)]
pub enum SaveOutcome {
    /// Backend accepted the save; `created` is the new record for creates.
    Saved { created: Option<Record> },
    /// Edits are kept so the user can correct and retry.
    Failed(ConsoleError),
    /// Response for a panel that is no longer this one.
    Stale,
}

/// What a field displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveValue {
    pub text: String,
    /// Staged locally, not yet saved
    pub pending: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct RecordDetailPanel {
    session: PanelSession,
    schema: &'static EntitySchema,
    record: Record,
    edits: PendingEdits,
    editor: Option<FieldEditCell>,
    field_errors: BTreeMap<String, String>,
    notice: Option<String>,
    saving: bool,
}

impl RecordDetailPanel {
    /// Open a panel over a fetched record with an empty edit buffer.
    pub fn open(schema: &'static EntitySchema, record: Record) -> Self {
        Self {
            session: PanelSession::next(),
            schema,
            record,
            edits: PendingEdits::new(schema),
            editor: None,
            field_errors: BTreeMap::new(),
            notice: None,
            saving: false,
        }
    }

    /// Blank form whose save creates a record.
    pub fn create_form(schema: &'static EntitySchema) -> Self {
        Self::open(schema, Record::default())
    }

    pub fn session(&self) -> PanelSession {
        self.session
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    pub fn entity(&self) -> Entity {
        self.schema.entity
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn is_new(&self) -> bool {
        self.record.id.is_none()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.edits.is_empty()
    }

    pub fn pending(&self) -> &PendingEdits {
        &self.edits
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn editor(&self) -> Option<&FieldEditCell> {
        self.editor.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Buffer value, else fetched value, else the placeholder.
    pub fn effective(&self, field: &str) -> EffectiveValue {
        let error = self.field_errors.get(field).cloned();
        if let Some(value) = self.edits.get(field) {
            return EffectiveValue {
                text: value.to_string(),
                pending: true,
                error,
            };
        }
        EffectiveValue {
            text: self
                .record
                .text(field)
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            pending: false,
            error,
        }
    }

    fn effective_seed(&self, field: &str) -> Option<String> {
        self.edits
            .get(field)
            .map(str::to_string)
            .or_else(|| self.record.text(field))
    }

    /// Open the inline editor on `field`. An editor already open elsewhere is
    /// committed when its value is valid and cancelled otherwise.
    pub fn begin_edit(&mut self, field: &str) -> Result<(), ConsoleError> {
        let spec = self.schema.field(field).ok_or_else(|| {
            ConsoleError::InvalidState(format!("{} has no field named {}", self.schema.noun, field))
        })?;

        if let Some(previous) = self.editor.take() {
            if previous.field() == spec.name {
                self.editor = Some(previous);
                return Ok(());
            }
            self.settle_previous(previous);
        }

        self.editor = Some(FieldEditCell::open(spec, self.effective_seed(spec.name)));
        Ok(())
    }

    /// Editor still showing the value it was seeded with.
    fn untouched(&self, editor: &FieldEditCell) -> bool {
        editor.value() == self.effective_seed(editor.field()).unwrap_or_default()
    }

    fn settle_previous(&mut self, previous: FieldEditCell) {
        if self.untouched(&previous) {
            tracing::debug!("Closing unchanged editor on {}", previous.field());
            return;
        }
        match previous.confirm() {
            Ok(value) => {
                tracing::debug!("Auto-committing open editor on {}", previous.field());
                self.stage(previous.field(), value);
            }
            Err(e) => {
                tracing::info!(
                    "Dropping invalid edit on {} to open another field: {}",
                    previous.field(),
                    e
                );
                self.notice = Some(format!(
                    "Discarded invalid edit on {}: {}",
                    previous.spec().label,
                    e.message()
                ));
            }
        }
    }

    /// Replace the open editor's text.
    pub fn type_text(&mut self, text: &str) -> Result<(), ConsoleError> {
        let editor = self
            .editor
            .as_mut()
            .ok_or_else(|| ConsoleError::InvalidState("No field is being edited".to_string()))?;
        editor.input(text);
        Ok(())
    }

    /// Confirm the open editor into the buffer. An invalid value keeps the
    /// editor open.
    pub fn commit_edit(&mut self) -> Result<(), ConsoleError> {
        let editor = self
            .editor
            .as_ref()
            .ok_or_else(|| ConsoleError::InvalidState("No field is being edited".to_string()))?;

        match editor.confirm() {
            Ok(value) => {
                let field = editor.field();
                self.editor = None;
                self.stage(field, value);
                Ok(())
            }
            Err(e) => {
                self.field_errors.extend(e.field_errors());
                Err(e)
            }
        }
    }

    /// Drop the open editor's value; the buffer is unchanged.
    pub fn cancel_edit(&mut self) {
        if let Some(editor) = self.editor.take() {
            tracing::debug!("Cancelled edit on {}", editor.field());
        }
    }

    fn stage(&mut self, field: &'static str, value: String) {
        match self.edits.stage(field, value) {
            Ok(first) => {
                if first {
                    tracing::debug!("Panel {:?} now has unsaved changes", self.session);
                }
                self.field_errors.remove(field);
            }
            Err(e) => tracing::error!("Failed to stage {}: {}", field, e),
        }
    }

    /// Throw away every staged edit and any open editor. Idempotent.
    pub fn discard_all(&mut self) {
        self.editor = None;
        self.edits.clear();
        self.field_errors.clear();
        self.notice = None;
    }

    /// Commit any open editor, then turn the buffer into one request.
    pub fn begin_save(&mut self) -> Result<SaveTicket, ConsoleError> {
        if self.saving {
            return Err(ConsoleError::InvalidState(
                "A save is already in progress".to_string(),
            ));
        }
        let untouched = self.editor.as_ref().map(|editor| self.untouched(editor));
        match untouched {
            Some(true) => self.editor = None,
            Some(false) => self.commit_edit()?,
            None => {}
        }
        if self.edits.is_empty() {
            return Err(ConsoleError::InvalidState("No changes to save".to_string()));
        }
        self.check_required()?;

        let body = self.record.merged(self.edits.iter());
        let entity = self.entity();
        let request = match self.record.id {
            Some(id) => SaveRequest::Update { entity, id, body },
            None => SaveRequest::Create { entity, body },
        };

        self.saving = true;
        tracing::info!(
            "Saving {} field(s) of {} {:?}",
            self.edits.len(),
            self.schema.noun,
            self.record.id
        );

        Ok(SaveTicket {
            session: self.session,
            request,
            sent: self.edits.snapshot(),
        })
    }

    /// A new record needs every required field; an existing one may not have
    /// a required field cleared.
    fn check_required(&mut self) -> Result<(), ConsoleError> {
        let is_new = self.is_new();
        let missing: BTreeMap<String, String> = self
            .schema
            .fields
            .iter()
            .filter(|spec| spec.required)
            .filter(|spec| match self.edits.get(spec.name) {
                Some(value) => value.trim().is_empty(),
                None => {
                    is_new
                        && self
                            .record
                            .text(spec.name)
                            .map_or(true, |value| value.trim().is_empty())
                }
            })
            .map(|spec| {
                (
                    spec.name.to_string(),
                    format!("The {} field is required.", spec.label.to_lowercase()),
                )
            })
            .collect();

        if missing.is_empty() {
            return Ok(());
        }
        let message = format!("{} required field(s) are empty", missing.len());
        self.field_errors.extend(missing.clone());
        self.notice = Some(message.clone());
        Err(ConsoleError::Validation {
            message,
            fields: missing,
        })
    }

    /// Apply the backend's answer to a save started by this panel.
    pub fn finish_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<Option<Record>, ConsoleError>,
    ) -> SaveOutcome {
        if ticket.session != self.session {
            tracing::debug!("Ignoring save response for closed panel {:?}", ticket.session);
            return SaveOutcome::Stale;
        }
        self.saving = false;

        match result {
            Ok(created) => {
                self.edits.settle(&ticket.sent);
                self.record = created
                    .clone()
                    .unwrap_or_else(|| ticket.request.body().clone());
                self.field_errors.clear();
                self.notice = None;
                SaveOutcome::Saved { created }
            }
            Err(e) => {
                tracing::warn!("Save of {} failed: {}", self.schema.noun, e);
                self.field_errors = e.field_errors();
                self.notice = Some(e.message());
                SaveOutcome::Failed(e)
            }
        }
    }

    /// Close the panel. Unsaved edits are discarded, never persisted.
    pub fn close(self) -> usize {
        let dropped = self.edits.len();
        if dropped > 0 {
            tracing::info!(
                "Closed {} panel discarding {} unsaved edit(s)",
                self.schema.noun,
                dropped
            );
        }
        dropped
    }
}
