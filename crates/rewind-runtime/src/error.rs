#![forbid(unsafe_code)]

//! Error types shared by the engine and its host boundary.
//!
//! None of these ever reach callers of the stack-mutating operations: a
//! failed capture turns `save`/`update` into a quiet no-op. They exist so the
//! host can say *why* it could not produce content and so the reason shows
//! up in logs.

/// Failure reported by a host document while capturing content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HostError {
    message: String,
}

impl HostError {
    /// Create a host error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The host-supplied message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Why a snapshot could not be taken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// The host cannot produce content right now (e.g. not mounted).
    #[error("host document cannot produce content right now")]
    Unavailable,
    /// The host failed while producing content.
    #[error("host failed to capture content: {0}")]
    Host(#[from] HostError),
}
