//! Process-wide bound on concurrent thumbnail generation.

use parking_lot::{Condvar, Mutex};
use tracing::trace;

/// Default number of transcoder processes allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 1;

/// Counting gate limiting how many generations run at the same time.
///
/// With a capacity of one, every transcoder invocation in the process is
/// serialized.
pub struct GenerationGate {
    capacity: usize,
    active: Mutex<usize>,
    released: Condvar,
}

/// Held for the duration of one generation; frees its slot on drop.
pub struct GenerationPermit<'a> {
    gate: &'a GenerationGate,
}

impl GenerationGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            active: Mutex::new(0),
            released: Condvar::new(),
        }
    }

    /// Blocks until a slot is free.
    pub fn acquire(&self) -> GenerationPermit<'_> {
        let mut active = self.active.lock();
        while *active >= self.capacity {
            trace!(active = *active, "Waiting for generation slot");
            self.released.wait(&mut active);
        }
        *active += 1;
        GenerationPermit { gate: self }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active(&self) -> usize {
        *self.active.lock()
    }
}

impl Default for GenerationGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

impl Drop for GenerationPermit<'_> {
    fn drop(&mut self) {
        let mut active = self.gate.active.lock();
        *active = active.saturating_sub(1);
        self.gate.released.notify_one();
    }
}
