//! Student and faculty records administration over a REST backend.
//!
//! Records are browsed in list views and edited in detail panels that buffer
//! field edits locally and save them in a single request.

pub mod api;
pub mod config;
pub mod console;
pub mod edit;
pub mod errors;
pub mod models;
pub mod views;
