//! Wake lock reference counting
//!
//! One logical wake lock is shared by every sub-HAL. Each batch that carries
//! wake-up events holds one reference through a [`ScopedWakelock`] until the
//! batch has been handed to the client.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

/// Reference counter behind [`ScopedWakelock`]
pub trait WakeLockRefCounter: Send + Sync {
    /// Add `delta` references. Returns `false` if the lock could not be taken.
    fn increment(&self, delta: usize) -> bool;

    /// Drop `delta` references.
    fn decrement(&self, delta: usize);
}

/// Atomic wake lock reference counter
///
/// The lock is held while the count is non-zero.
#[derive(Debug, Default)]
pub struct RefCountedWakeLock {
    count: AtomicUsize,
}

impl RefCountedWakeLock {
    /// Create an unheld lock
    pub fn new() -> Self {
        Self::default()
    }

    /// Current reference count
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Whether any reference is outstanding
    pub fn is_held(&self) -> bool {
        self.count() > 0
    }
}

impl WakeLockRefCounter for RefCountedWakeLock {
    fn increment(&self, delta: usize) -> bool {
        let previous = self.count.fetch_add(delta, Ordering::AcqRel);
        if previous == 0 && delta > 0 {
            debug!(refs = delta, "Wake lock acquired");
        }
        true
    }

    fn decrement(&self, delta: usize) {
        let result = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_sub(delta))
            });
        if let Ok(previous) = result {
            if previous > 0 && previous <= delta {
                debug!("Wake lock released");
            }
        }
    }
}

/// Scoped wake lock reference
///
/// Holds one reference while locked and gives it back when dropped. The
/// guard is move-only: whoever owns it last is the one that releases it.
pub struct ScopedWakelock {
    counter: Arc<dyn WakeLockRefCounter>,
    locked: bool,
}

impl ScopedWakelock {
    /// Create a guard, taking a reference when `lock` is set.
    pub fn new(counter: Arc<dyn WakeLockRefCounter>, lock: bool) -> Self {
        let locked = lock && counter.increment(1);
        Self { counter, locked }
    }

    /// Whether this guard holds a reference
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl fmt::Debug for ScopedWakelock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedWakelock")
            .field("locked", &self.locked)
            .finish()
    }
}

impl Drop for ScopedWakelock {
    fn drop(&mut self) {
        if self.locked {
            self.counter.decrement(1);
            self.locked = false;
        }
    }
}
