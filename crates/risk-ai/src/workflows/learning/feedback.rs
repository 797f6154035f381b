use std::path::PathBuf;
use std::sync::Mutex;

use crate::storage::{self, StoreError};

use super::domain::{FeedbackEntry, FeedbackId};

/// Persistence seam for user feedback awaiting (or consumed by) training.
pub trait FeedbackStore: Send + Sync {
    fn append(&self, entry: FeedbackEntry) -> Result<(), StoreError>;
    fn all(&self) -> Result<Vec<FeedbackEntry>, StoreError>;
    /// Flags the given entries as consumed so the next run does not count
    /// them as new signal again; reports how many entries changed.
    fn mark_used(&self, ids: &[FeedbackId]) -> Result<usize, StoreError>;
}

/// Whole-file JSON store, same shape as the analysis repository: take the
/// mutex, reload the snapshot, apply, rewrite.
pub struct JsonFileFeedbackStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileFeedbackStore {
    pub const FILE_NAME: &'static str = "feedback_data.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir.into().join(Self::FILE_NAME))
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>, StoreError> {
        self.lock
            .lock()
            .map_err(|_| StoreError::Unavailable("feedback store lock poisoned".to_string()))
    }
}

impl FeedbackStore for JsonFileFeedbackStore {
    fn append(&self, entry: FeedbackEntry) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut all: Vec<FeedbackEntry> = storage::load_collection(&self.path)?;
        all.push(entry);
        storage::save_collection(&self.path, &all)
    }

    fn all(&self) -> Result<Vec<FeedbackEntry>, StoreError> {
        let _guard = self.guard()?;
        storage::load_collection(&self.path)
    }

    fn mark_used(&self, ids: &[FeedbackId]) -> Result<usize, StoreError> {
        let _guard = self.guard()?;
        let mut all: Vec<FeedbackEntry> = storage::load_collection(&self.path)?;
        let mut changed = 0;
        for entry in &mut all {
            if !entry.used_for_training && ids.contains(&entry.id) {
                entry.used_for_training = true;
                changed += 1;
            }
        }
        if changed > 0 {
            storage::save_collection(&self.path, &all)?;
        }
        Ok(changed)
    }
}
