#![forbid(unsafe_code)]

//! Rewind Runtime
//!
//! Snapshot-based undo/redo for an editable document. The engine decides when
//! to capture a recoverable state (content plus selection), how to coalesce
//! rapid edits into a bounded number of steps, and how to restore a prior
//! state without content and selection drifting apart.
//!
//! # Key Components
//!
//! - [`UndoManager`] - the state machine: save, update, undo, redo, lock
//! - [`HistoryStack`] - bounded linear history with a cursor
//! - [`Snapshot`] - immutable captured state
//! - [`InputHandler`] - classifies host input events into manager calls
//! - [`HostDocument`] - what the engine needs from the editing surface
//! - [`Notifier`] - synchronous notification fan-out
//!
//! # How it fits in the system
//! Hosts translate native input into [`rewind_core::InputEvent`]s and feed
//! them to an [`InputHandler`]. The handler drives the [`UndoManager`], which
//! talks back to the host only through [`HostDocument`] and notifications.
//! Toolbar state reads [`UndoManager::undoable`] and
//! [`UndoManager::redoable`].

pub mod config;
pub mod error;
pub mod host;
pub mod input;
pub mod notify;
pub mod undo;

#[cfg(test)]
mod test_support;

pub use config::EngineConfig;
#[cfg(feature = "config-file")]
pub use config::ConfigError;
pub use error::{CaptureError, HostError};
pub use host::HostDocument;
pub use input::{InputConfig, InputHandler, KeyDisposition};
pub use notify::{Notification, Notifier, Subscription};
pub use undo::{
    Bookmark, Direction, HistoryConfig, HistoryStack, LockMode, Snapshot, TypingConfig,
    UndoManager,
};
