//! In-memory collaborator for unit tests. Records every call it receives.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{AccountService, PasswordChange, RecordStore};
use crate::errors::ConsoleError;
use crate::models::{Entity, Record};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(Entity),
    Create(Entity, Record),
    Update(Entity, i64, Record),
    ChangePassword(PasswordChange),
    Logout,
}

#[derive(Default)]
struct State {
    records: HashMap<Entity, Vec<Record>>,
    calls: Vec<Call>,
    next_error: Option<ConsoleError>,
    next_id: i64,
}

#[derive(Clone, Default)]
pub struct FakeStore {
    state: Arc<Mutex<State>>,
}

impl FakeStore {
    pub fn with_records(entity: Entity, records: Vec<Record>) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().unwrap();
            state.next_id = records.iter().filter_map(|r| r.id).max().unwrap_or(0) + 1;
            state.records.insert(entity, records);
        }
        store
    }

    /// Make the next mutating call fail with `err`.
    pub fn fail_next(&self, err: ConsoleError) {
        self.state.lock().unwrap().next_error = Some(err);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn updates(&self) -> Vec<(Entity, i64, Record)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Update(entity, id, record) => Some((entity, id, record)),
                _ => None,
            })
            .collect()
    }

    pub fn mutation_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| !matches!(call, Call::List(_)))
            .count()
    }
}

impl RecordStore for FakeStore {
    async fn list(&self, entity: Entity) -> Result<Vec<Record>, ConsoleError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List(entity));
        Ok(state.records.get(&entity).cloned().unwrap_or_default())
    }

    async fn create(&self, entity: Entity, record: &Record) -> Result<Option<Record>, ConsoleError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create(entity, record.clone()));
        if let Some(err) = state.next_error.take() {
            return Err(err);
        }
        let mut created = record.without_id();
        created.id = Some(state.next_id.max(1));
        state.next_id = created.id.unwrap_or(0) + 1;
        state
            .records
            .entry(entity)
            .or_default()
            .push(created.clone());
        Ok(Some(created))
    }

    async fn update(&self, entity: Entity, id: i64, record: &Record) -> Result<(), ConsoleError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Update(entity, id, record.clone()));
        if let Some(err) = state.next_error.take() {
            return Err(err);
        }
        let records = state.records.entry(entity).or_default();
        match records.iter_mut().find(|r| r.id == Some(id)) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(ConsoleError::Rejected {
                status: 404,
                message: "Not found".to_string(),
            }),
        }
    }
}

impl AccountService for FakeStore {
    async fn change_password(&self, request: &PasswordChange) -> Result<(), ConsoleError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ChangePassword(request.clone()));
        match state.next_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn logout(&self) {
        self.state.lock().unwrap().calls.push(Call::Logout);
    }
}
