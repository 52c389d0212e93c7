//! Per-lesson "sentences completed" counters.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::StorageError;
use crate::storage::{load_json_or_default, save_json, StorageBackend, StorageContext, PROGRESS_KEY};

/// Lesson id -> completed sentence count
pub struct ProgressTracker {
    backend: Arc<dyn StorageBackend>,
    completed: BTreeMap<String, u64>,
}

impl ProgressTracker {
    pub fn load(storage: &StorageContext) -> Self {
        let backend = Arc::clone(&storage.local);
        let completed = load_json_or_default(backend.as_ref(), PROGRESS_KEY);
        ProgressTracker { backend, completed }
    }

    pub fn reload(&mut self) {
        self.completed = load_json_or_default(self.backend.as_ref(), PROGRESS_KEY);
    }

    /// Completed sentences for a lesson, 0 if never recorded
    pub fn get(&self, lesson_id: i64) -> u64 {
        self.completed.get(&lesson_id.to_string()).copied().unwrap_or(0)
    }

    /// Store `max(0, completed)`.
    ///
    /// No monotonicity check against the stored value: callers only
    /// advance.
    pub fn set(&mut self, lesson_id: i64, completed: i64) -> Result<(), StorageError> {
        let key = lesson_id.to_string();
        let value = completed.max(0) as u64;
        let previous = self.completed.insert(key.clone(), value);
        if let Err(e) = save_json(self.backend.as_ref(), PROGRESS_KEY, &self.completed) {
            match previous {
                Some(prev) => self.completed.insert(key, prev),
                None => self.completed.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Sentence index to reopen a lesson at
    pub fn resume_index(&self, lesson_id: i64, total: usize) -> usize {
        resume_index(self.get(lesson_id), total)
    }
}

/// `min(total - 1, max(0, completed - 1))`: the last completed sentence is
/// shown again rather than skipped
pub fn resume_index(completed: u64, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let last_done = usize::try_from(completed.saturating_sub(1)).unwrap_or(usize::MAX);
    last_done.min(total - 1)
}

/// Completed fraction as a whole percentage
pub fn percent_complete(completed: u64, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (completed as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}
