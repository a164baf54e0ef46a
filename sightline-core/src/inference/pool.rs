use std::sync::{
    Mutex, TryLockError,
    atomic::{AtomicUsize, Ordering},
};

use snafu::ResultExt;
use tracing::{trace, warn};

use crate::error::{DetectError, EngineFailureSnafu, PanickedSnafu};

/// Fixed set of engine handles, each usable by one caller at a time.
///
/// Only the forward pass is run under a slot lock; everything around it is
/// lock-free. A pool with a single slot behaves like a plain mutex.
pub struct EnginePool<E> {
    slots: Vec<Mutex<E>>,
    next: AtomicUsize,
}

impl<E> EnginePool<E> {
    /// # Panics
    /// If `engines` is empty.
    pub fn new(engines: Vec<E>) -> Self {
        assert!(!engines.is_empty(), "engine pool needs at least one engine");
        Self {
            slots: engines.into_iter().map(Mutex::new).collect(),
            next: AtomicUsize::new(0),
        }
    }

    pub fn single(engine: E) -> Self {
        Self::new(vec![engine])
    }

    /// Runs `f` with exclusive access to a free engine.
    ///
    /// Slots are probed without blocking starting at a round-robin offset.
    /// Slots whose previous holder panicked are skipped; when every healthy
    /// slot is busy the call waits on the first busy one. Only a pool with no
    /// healthy slot left fails with `EngineIssue::Panicked`.
    pub fn with_engine<R>(
        &self,
        f: impl FnOnce(&mut E) -> Result<R, DetectError>,
    ) -> Result<R, DetectError> {
        let len = self.slots.len();
        let start = self.next.fetch_add(1, Ordering::Relaxed) % len;

        loop {
            let mut busy = None;
            for offset in 0..len {
                let slot = (start + offset) % len;
                match self.slots[slot].try_lock() {
                    Ok(mut engine) => {
                        trace!(slot, "acquired idle engine");
                        return f(&mut engine);
                    }
                    Err(TryLockError::Poisoned(_)) => {
                        trace!(slot, "skipping poisoned engine");
                    }
                    Err(TryLockError::WouldBlock) => {
                        busy.get_or_insert(slot);
                    }
                }
            }

            let Some(slot) = busy else {
                return PanickedSnafu { slot: start }
                    .fail()
                    .context(EngineFailureSnafu);
            };

            trace!(slot, "all healthy engines busy, waiting");
            if let Ok(mut engine) = self.slots[slot].lock() {
                return f(&mut engine);
            }
            // poisoned while we waited, probe the remaining slots again
            warn!(slot, "engine poisoned while waiting");
        }
    }
}
