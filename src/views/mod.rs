//! Views hosting the record panels: lists, dashboard, settings, and the
//! change notification that ties them together.

mod dashboard;
mod list;
pub mod settings;
mod sync;

pub use dashboard::*;
pub use list::*;
pub use sync::*;
