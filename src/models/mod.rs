//! Data models for the records console.
//!
//! Records mirror the backend's JSON; schemas describe how each entity type
//! is listed, searched and edited.

mod record;
pub mod schedule;
mod schema;

pub use record::*;
pub use schema::*;
