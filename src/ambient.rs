//! Process-wide ambient thread-count state.

use std::sync::atomic::{AtomicUsize, Ordering};

/// The ambient thread count consulted by default CPU actions.
///
/// This is deliberately shared, mutable, process-scoped state: whenever any
/// region dispatches a parallel action, it stores the chosen thread count
/// here, and that value persists as the configuration a later `Default`
/// action (from the same region or any other) inherits. Configuration
/// stickiness across invocations is the point, not an accident.
///
/// # Ordering contract
///
/// Last writer wins. `set` is a release store and `get` an acquire load, so
/// a reader observes some value that was actually written (never a torn or
/// invented one), but two racing writers are resolved arbitrarily. Callers
/// must not assume a `get` after their own `set` returns their value once
/// other threads are dispatching.
#[derive(Debug)]
pub struct AmbientThreads {
    threads: AtomicUsize,
}

impl AmbientThreads {
    /// Create ambient state seeded with the configured default thread count.
    pub fn new(seed: usize) -> Self {
        Self {
            threads: AtomicUsize::new(seed.max(1)),
        }
    }

    /// Read the current ambient thread count.
    pub fn get(&self) -> usize {
        self.threads.load(Ordering::Acquire)
    }

    /// Overwrite the ambient thread count (last writer wins).
    pub fn set(&self, threads: usize) {
        self.threads.store(threads.max(1), Ordering::Release);
    }
}
