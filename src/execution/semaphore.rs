use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Blocking counting semaphore bounding how many chunks run at once.
pub struct ChunkGate {
    permits: Mutex<usize>,
    cv: Condvar,
}

/// A held permit; released on drop, including when the chunk's work panics.
pub struct ChunkPermit<'a> {
    gate: &'a ChunkGate,
    /// Time spent blocked before the permit was granted.
    pub waited: Duration,
}

impl ChunkGate {
    pub fn new(permits: usize) -> Self {
        assert!(permits > 0, "permits must be > 0");
        Self {
            permits: Mutex::new(permits),
            cv: Condvar::new(),
        }
    }

    /// Block until a permit is free.
    pub fn acquire(&self) -> ChunkPermit<'_> {
        let start = Instant::now();
        let mut blocked = false;
        let mut free = self.lock();
        while *free == 0 {
            blocked = true;
            free = self.cv.wait(free).unwrap_or_else(PoisonError::into_inner);
        }
        *free -= 1;
        ChunkPermit {
            gate: self,
            waited: if blocked { start.elapsed() } else { Duration::ZERO },
        }
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.permits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ChunkPermit<'_> {
    fn drop(&mut self) {
        *self.gate.lock() += 1;
        self.gate.cv.notify_one();
    }
}
