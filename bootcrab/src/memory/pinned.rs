//! Pinned byte buffers for platform calls.

use super::BufferTracker;
use std::pin::Pin;

/// Zeroed byte buffer whose address stays fixed until it is dropped.
///
/// The buffer is registered with a tracker on creation and deregistered on
/// drop, so every exit path of the owning scope releases it.
#[derive(Debug)]
pub struct PinnedBuffer {
    /// We require this data to stay in the same location
    data: Pin<Box<[u8]>>,
    tracker: BufferTracker,
}

impl PinnedBuffer {
    pub fn new(size: usize, tracker: &BufferTracker) -> Self {
        // We should replace this with Box::new_zeroed_slice once it's stable.
        let data = Box::into_pin(vec![0u8; size].into_boxed_slice());
        tracker.register_alloc(&data);
        Self {
            data,
            tracker: tracker.clone(),
        }
    }

    /// Address of the first byte, valid for the whole buffer while `self` lives.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        // `[u8]` is Unpin, so this never moves the allocation.
        self.data.as_mut().get_mut().as_mut_ptr()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Drop for PinnedBuffer {
    fn drop(&mut self) {
        self.tracker.deregister_alloc(&self.data);
    }
}
