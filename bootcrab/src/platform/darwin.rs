//! Darwin dynamic loader bindings.

use super::DynamicLoader;
use std::ffi::{c_char, c_int};

unsafe extern "C" {
    /// Provided by libSystem, which every Darwin executable links against.
    fn _NSGetExecutablePath(buf: *mut c_char, bufsize: *mut u32) -> c_int;
}

/// The `dyld` loader of the running process.
#[derive(Debug, Default, Clone, Copy)]
pub struct DarwinLoader;

impl DynamicLoader for DarwinLoader {
    unsafe fn get_executable_path(&self, buf: *mut c_char, size: &mut u32) -> c_int {
        // SAFETY: the caller guarantees `buf` is null or valid for `*size` bytes.
        unsafe { _NSGetExecutablePath(buf, size) }
    }
}
