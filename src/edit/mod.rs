//! Pending-edit record viewer: inline field editors, the draft buffer they
//! write into, and the panel that saves the buffer in one request.

mod buffer;
mod cell;
mod panel;

pub use buffer::*;
pub use cell::*;
pub use panel::*;
