//! Cross-view change notification.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Optional no-argument callback a parent view hands to its children so it
/// hears about successful mutations.
#[derive(Clone, Default)]
pub struct Synchronizer {
    callback: Option<Callback>,
}

impl Synchronizer {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            callback: Some(Arc::new(callback)),
        }
    }

    /// A synchronizer that notifies nobody.
    pub fn none() -> Self {
        Self::default()
    }

    /// Invoke the callback. A panicking callback is logged and swallowed so
    /// the mutation that triggered it stands.
    pub fn notify(&self) {
        let Some(callback) = &self.callback else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
            tracing::warn!("Change listener panicked; mutation is unaffected");
        }
    }
}

impl fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synchronizer")
            .field("registered", &self.callback.is_some())
            .finish()
    }
}
