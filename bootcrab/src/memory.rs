//! Tracking of buffers handed to platform calls.
//!
//! Buffers whose address is passed across the FFI boundary are pinned and
//! registered with a [`BufferTracker`] for as long as they are alive.

mod pinned;
mod tracker;

pub use pinned::PinnedBuffer;
pub use tracker::BufferTracker;
