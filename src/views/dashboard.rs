//! Dashboard summary: active record counts per entity.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::Synchronizer;
use crate::errors::ConsoleError;
use crate::models::{Entity, Record};

#[derive(Debug)]
pub struct Dashboard {
    counts: HashMap<Entity, Option<usize>>,
    stale: Arc<AtomicBool>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    /// Starts stale so the first render fetches.
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
            stale: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Synchronizer for child views; any mutation marks the counts stale.
    pub fn sync_handle(&self) -> Synchronizer {
        let stale = self.stale.clone();
        Synchronizer::new(move || stale.store(true, Ordering::SeqCst))
    }

    /// Clear the stale flag, returning whether it was set.
    pub fn take_stale(&self) -> bool {
        self.stale.swap(false, Ordering::SeqCst)
    }

    /// Active (non-archived) count; `None` if never loaded or the last load failed.
    pub fn count(&self, entity: Entity) -> Option<usize> {
        self.counts.get(&entity).copied().flatten()
    }

    pub fn apply(&mut self, entity: Entity, result: Result<Vec<Record>, ConsoleError>) {
        let count = match result {
            Ok(records) => Some(records.iter().filter(|r| !r.is_archived()).count()),
            Err(e) => {
                tracing::warn!("Dashboard could not count {}: {}", entity, e);
                None
            }
        };
        self.counts.insert(entity, count);
    }
}
