use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Counting gate bounding how many frames the GPU may hold at once.
///
/// The frame producer takes a permit before writing a frame; the GPU
/// completion callback gives it back. Permits never exceed `limit`.
#[derive(Debug)]
pub struct InFlight {
    available: Mutex<usize>,
    released: Condvar,
    limit: usize,
}

impl InFlight {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            available: Mutex::new(limit),
            released: Condvar::new(),
            limit,
        }
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn available(&self) -> usize {
        *self.lock()
    }

    /// Frames currently holding a permit.
    pub fn in_flight(&self) -> usize {
        self.limit - self.available()
    }

    /// Takes a permit, blocking until one is released.
    pub fn acquire(&self) {
        let mut available = self.lock();
        while *available == 0 {
            available = self
                .released
                .wait(available)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *available -= 1;
    }

    pub fn try_acquire(&self) -> bool {
        let mut available = self.lock();
        if *available == 0 {
            return false;
        }
        *available -= 1;
        true
    }

    /// Like [`acquire`](Self::acquire) but gives up after `timeout`.
    pub fn acquire_timeout(&self, timeout: Duration) -> bool {
        let available = self.lock();
        let (mut available, result) = self
            .released
            .wait_timeout_while(available, timeout, |n| *n == 0)
            .unwrap_or_else(PoisonError::into_inner);
        if result.timed_out() && *available == 0 {
            return false;
        }
        *available -= 1;
        true
    }

    /// Returns a permit. Extra releases are ignored.
    pub fn release(&self) {
        let mut available = self.lock();
        if *available >= self.limit {
            log::warn!("in-flight gate released more often than acquired");
            return;
        }
        *available += 1;
        self.released.notify_one();
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.available.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
