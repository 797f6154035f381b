//! Serializes training runs. A mutex makes sure only one retrain touches the
//! artifact at a time; the atomic flag lets status endpoints and non-forced
//! runs observe "busy" without ever blocking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

#[derive(Debug, Default)]
pub struct TrainingGuard {
    busy: AtomicBool,
    lock: Mutex<()>,
}

/// Held for the duration of one training run; dropping it clears the busy
/// flag before the mutex is released.
pub struct TrainingPermit<'a> {
    busy: &'a AtomicBool,
    _serialized: MutexGuard<'a, ()>,
}

impl TrainingGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-blocking acquisition for regular runs: `None` means another run
    /// is already in flight and the caller should report busy.
    pub fn try_acquire(&self) -> Option<TrainingPermit<'_>> {
        if self.busy.load(Ordering::Acquire) {
            return None;
        }
        let serialized = match self.lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return None,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        self.busy.store(true, Ordering::Release);
        Some(TrainingPermit { busy: &self.busy, _serialized: serialized })
    }

    /// Blocking acquisition for forced runs: waits for the in-flight run to
    /// finish instead of reporting busy.
    pub fn acquire(&self) -> TrainingPermit<'_> {
        let serialized = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.busy.store(true, Ordering::Release);
        TrainingPermit { busy: &self.busy, _serialized: serialized }
    }

    pub fn is_training(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for TrainingPermit<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
