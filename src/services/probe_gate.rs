//! Run-wide probe concurrency gate
//!
//! A single gate is created per run and cloned into every channel's probe
//! tasks, so the ceiling holds across channels, not just within one.

use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tracing::trace;

#[derive(Debug, Clone)]
pub struct ProbeGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// Slot held for the duration of one probe; released on drop
#[derive(Debug)]
pub struct ProbePermit {
    _permit: OwnedSemaphorePermit,
}

impl ProbeGate {
    pub fn new(max_concurrent_probes: usize) -> Self {
        let capacity = max_concurrent_probes.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot.
    ///
    /// Only fails if the gate was closed, which this crate never does.
    pub async fn acquire(&self) -> Result<ProbePermit, AcquireError> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;
        trace!("Probe slot acquired ({} in flight)", self.in_flight());
        Ok(ProbePermit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held
    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }
}
