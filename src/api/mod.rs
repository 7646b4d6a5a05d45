//! Backend collaborator interface.
//!
//! The console only ever talks to the records backend through these traits.
//! `HttpStore` is the production implementation over the REST contract.

mod http;

#[cfg(test)]
pub mod fake;

pub use http::*;

use std::future::Future;

use serde::Serialize;

use crate::errors::ConsoleError;
use crate::models::{Entity, Record};

/// CRUD access to the student and faculty collections.
pub trait RecordStore {
    /// GET the whole collection. Non-array payloads yield an empty list.
    fn list(&self, entity: Entity)
        -> impl Future<Output = Result<Vec<Record>, ConsoleError>> + Send;

    /// POST a new record (sent without `id`). Returns the created record when
    /// the backend echoes one back.
    fn create(
        &self,
        entity: Entity,
        record: &Record,
    ) -> impl Future<Output = Result<Option<Record>, ConsoleError>> + Send;

    /// PUT the full record.
    fn update(
        &self,
        entity: Entity,
        id: i64,
        record: &Record,
    ) -> impl Future<Output = Result<(), ConsoleError>> + Send;
}

/// Session-level actions of the settings panel.
pub trait AccountService {
    fn change_password(
        &self,
        request: &PasswordChange,
    ) -> impl Future<Output = Result<(), ConsoleError>> + Send;

    /// Ends the session. Never fails: the local session is cleared whatever
    /// the backend answers.
    fn logout(&self) -> impl Future<Output = ()> + Send;
}

/// Request body for `POST /change-password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirmation: String,
}
