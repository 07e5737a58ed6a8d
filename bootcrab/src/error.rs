//! Error kinds raised by the runtime support code.
//!
//! These are carried inside [`anyhow::Error`] so callers can either bubble
//! them up with `?` or `downcast_ref::<RuntimeError>()` to branch on the kind.
//! Errors raised by child expression nodes are never wrapped in this type.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A root was installed with an incompatible frame layout or arguments.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A platform call answered in a way its protocol forbids.
    #[error("Should not reach here: {0}")]
    Unreachable(String),
    /// Path canonicalization failed.
    #[error("Failed to canonicalize {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RuntimeError {
    pub fn configuration(message: impl Into<String>) -> Self {
        RuntimeError::Configuration(message.into())
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        RuntimeError::Unreachable(message.into())
    }
}
