//! Live buffer tracker.
//!
//! Records the address and size of every live pinned buffer. Overlapping
//! registrations and deregistration of unknown buffers indicate a bug that
//! compromises memory safety, so both panic.
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Thread safe record of live buffers.
///
/// Clones share the same underlying record.
#[derive(Clone, Debug, Default)]
pub struct BufferTracker(Arc<Mutex<TrackerImpl>>);

#[derive(Debug, Default)]
struct TrackerImpl {
    /// Map from allocation start address to allocation size
    allocations: BTreeMap<usize, usize>,
    /// Number of registrations since creation
    total: usize,
}

impl BufferTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new buffer.
    ///
    /// # Arguments
    /// * `buf` - The buffer to be registered
    pub fn register_alloc(&self, buf: &[u8]) {
        let mut inner = self.lock();
        inner.total += 1;
        let size = buf.len();
        if size > 0 {
            let address = buf.as_ptr() as usize;
            // This shouldn't happen unless there is a bug which compromises
            // safety. So, kaboom!
            assert!(
                !inner.has_overlap(address, size),
                "Allocation at 0x{:x} (size {}) overlaps with existing memory",
                address,
                size
            );
            inner.allocations.insert(address, size);
        }
    }

    /// Removes a buffer record.
    ///
    /// # Arguments
    /// * `buf`: The buffer to deregister
    pub fn deregister_alloc(&self, buf: &[u8]) {
        if !buf.is_empty() {
            let address = buf.as_ptr() as usize;
            if self.lock().allocations.remove(&address).is_none() {
                panic!("No allocation found at address 0x{:x}", address);
            }
        }
    }

    /// Checks if a memory range is entirely contained within a single live buffer.
    pub fn contains(&self, address: usize, size: usize) -> bool {
        let inner = self.lock();
        if let Some((&start, &alloc_size)) = inner.allocations.range(..=address).next_back() {
            address + size <= start + alloc_size
        } else {
            false
        }
    }

    /// Number of non-empty buffers currently registered.
    pub fn live_allocations(&self) -> usize {
        self.lock().allocations.len()
    }

    /// Number of registrations since the tracker was created.
    pub fn total_allocations(&self) -> usize {
        self.lock().total
    }

    fn lock(&self) -> MutexGuard<'_, TrackerImpl> {
        // Poisoning only happens after one of the integrity panics above.
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TrackerImpl {
    fn has_overlap(&self, address: usize, size: usize) -> bool {
        let end = address + size;
        // Two ranges [a1,a2) and [b1,b2) overlap if: a1 < b2 && b1 < a2
        self.allocations
            .iter()
            .any(|(&start, &alloc_size)| address < start + alloc_size && start < end)
    }
}
