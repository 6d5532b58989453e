//! Process-wide refresh mutual exclusion.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, MutexGuard};

/// Guards the single in-flight token refresh.
///
/// Holding a [`RefreshGuard`] means owning the current refresh cycle.
/// Dropping it, on any path, releases every waiter. Only owners mark the
/// lock as in flight; waiting never does.
#[derive(Debug, Default)]
pub struct RefreshLock {
    inner: Mutex<()>,
    in_flight: AtomicBool,
}

/// Ownership of the current refresh cycle.
#[derive(Debug)]
pub struct RefreshGuard<'a> {
    in_flight: &'a AtomicBool,
    _guard: MutexGuard<'a, ()>,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

impl RefreshLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the current owner, if any, then own the next cycle.
    pub async fn acquire(&self) -> RefreshGuard<'_> {
        let guard = self.inner.lock().await;
        self.in_flight.store(true, Ordering::SeqCst);
        RefreshGuard {
            in_flight: &self.in_flight,
            _guard: guard,
        }
    }

    /// Whether a refresh cycle is owned right now.
    pub fn is_locked(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Wait for the in-flight refresh (if any) to resolve without owning it.
    pub async fn wait_for_unlock(&self) {
        if self.is_locked() {
            drop(self.inner.lock().await);
        }
    }
}
