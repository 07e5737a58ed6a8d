//! Linux executable path discovery through procfs.

use crate::error::RuntimeError;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PROC_SELF_EXE: &str = "/proc/self/exe";

/// Reads the `/proc/self/exe` link and canonicalizes its target.
///
/// Returns `Ok(None)` if procfs is not available.
pub fn proc_self_exe() -> Result<Option<PathBuf>> {
    read_exe_link(Path::new(PROC_SELF_EXE))
}

fn read_exe_link(link: &Path) -> Result<Option<PathBuf>> {
    let target = match std::fs::read_link(link) {
        Ok(target) => target,
        Err(e) => {
            warn!("Cannot read {}: {}", link.display(), e);
            return Ok(None);
        }
    };
    debug!("{} points to {}", link.display(), target.display());
    let canonical =
        std::fs::canonicalize(&target).map_err(|source| RuntimeError::Io { path: target, source })?;
    Ok(Some(canonical))
}
