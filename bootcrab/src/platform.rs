//! Executable path discovery.
//!
//! On Darwin the dynamic loader is asked for the executable path with a
//! size-then-fetch protocol: a first call with no buffer reports the required
//! size (terminator included), a second call fills a buffer of exactly that
//! size. The answer is then canonicalized with `realpath`.

#[cfg(target_os = "macos")]
pub mod darwin;
#[cfg(target_os = "linux")]
pub mod linux;

use crate::error::RuntimeError;
use crate::memory::{BufferTracker, PinnedBuffer};
use anyhow::Result;
use std::ffi::{CStr, c_char, c_int};
use std::io;
use std::path::{Path, PathBuf};
use std::ptr;
use tracing::{debug, warn};

/// Status returned by the loader when the supplied buffer is too small.
pub const BUFFER_TOO_SMALL: c_int = -1;

/// The dynamic loader entry points the resolver relies on.
pub trait DynamicLoader {
    /// Copies the executable path into `buf`.
    ///
    /// Returns 0 on success. Returns [`BUFFER_TOO_SMALL`] if `*size` is not
    /// enough, and updates `*size` to the required size including the
    /// terminator.
    ///
    /// # Safety
    /// `buf` must be null or valid for writes of `*size` bytes.
    unsafe fn get_executable_path(&self, buf: *mut c_char, size: &mut u32) -> c_int;

    /// Resolves `path` to its canonical absolute form.
    fn realpath(&self, path: &Path) -> io::Result<PathBuf> {
        // Delegates to the platform `realpath`.
        std::fs::canonicalize(path)
    }
}

/// Asks a [`DynamicLoader`] for the canonical path of the running executable.
#[derive(Debug)]
pub struct ExecutablePathResolver<L> {
    loader: L,
    tracker: BufferTracker,
}

impl<L: DynamicLoader> ExecutablePathResolver<L> {
    pub fn new(loader: L) -> Self {
        Self::with_tracker(loader, BufferTracker::new())
    }

    /// Creates a resolver that registers its buffers with `tracker`.
    pub fn with_tracker(loader: L, tracker: BufferTracker) -> Self {
        Self { loader, tracker }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn tracker(&self) -> &BufferTracker {
        &self.tracker
    }

    /// Returns the canonical executable path.
    ///
    /// # Returns
    /// * `Ok(Some(path))` - Absolute, symlink-free path of the executable
    /// * `Ok(None)` - The loader failed even though the buffer had the size it asked for
    /// * `Err(anyhow::Error)` - [`RuntimeError::Unreachable`] on a protocol violation,
    ///   [`RuntimeError::Io`] if canonicalization failed
    pub fn executable_path(&self) -> Result<Option<PathBuf>> {
        let mut size: u32 = 0;
        // SAFETY: a null buffer is never written to.
        let status = unsafe { self.loader.get_executable_path(ptr::null_mut(), &mut size) };
        if status != BUFFER_TOO_SMALL {
            return Err(RuntimeError::unreachable("executable path length is 0?").into());
        }
        if size == 0 {
            return Err(RuntimeError::unreachable("loader asked for an empty buffer").into());
        }
        debug!("Executable path needs {size} bytes");

        // Released when `buffer` goes out of scope, on every path below.
        let mut buffer = PinnedBuffer::new(size as usize, &self.tracker);
        let address = buffer.as_mut_ptr();
        // The loader may write `size` bytes, all of which must be live and tracked.
        assert!(
            self.tracker.contains(address as usize, size as usize),
            "Buffer at 0x{:x} (size {}) is not tracked",
            address as usize,
            size
        );
        // SAFETY: `buffer` is pinned and valid for `size` bytes until the end of this scope.
        let status = unsafe {
            self.loader
                .get_executable_path(address.cast::<c_char>(), &mut size)
        };
        if status == BUFFER_TOO_SMALL {
            warn!("Dynamic loader failed to report the executable path");
            return Ok(None);
        }

        let raw = CStr::from_bytes_until_nul(buffer.as_bytes()).map_err(|_| {
            RuntimeError::unreachable("executable path is not NUL terminated")
        })?;
        let path = path_from_bytes(raw.to_bytes());
        debug!("Loader reported executable path {}", path.display());

        let canonical = self
            .loader
            .realpath(&path)
            .map_err(|source| RuntimeError::Io { path, source })?;
        if !canonical.is_absolute() {
            return Err(RuntimeError::unreachable(format!(
                "canonical path {} is not absolute",
                canonical.display()
            ))
            .into());
        }
        debug!("Canonical executable path {}", canonical.display());
        Ok(Some(canonical))
    }
}

/// Returns the canonical path of the running executable on this host.
///
/// Hosts without a supported discovery mechanism return `Ok(None)`.
pub fn executable_path() -> Result<Option<PathBuf>> {
    #[cfg(target_os = "macos")]
    {
        ExecutablePathResolver::new(darwin::DarwinLoader).executable_path()
    }
    #[cfg(target_os = "linux")]
    {
        linux::proc_self_exe()
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        debug!("No executable path discovery on this host");
        Ok(None)
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}
