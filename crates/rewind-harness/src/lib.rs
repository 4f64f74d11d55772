#![forbid(unsafe_code)]

//! Harness: an in-memory host document, a rig that drives the engine the
//! way an editing surface does, and scripted trace replay.
//!
//! # Role in rewind
//! `rewind-harness` is the outermost layer. It implements
//! [`rewind_runtime::HostDocument`] over a plain text buffer so the engine
//! can be exercised without a real editor, and ships the `rewind-replay`
//! binary for replaying JSON traces.

pub mod cli;
pub mod document;
pub mod rig;
pub mod trace;

pub use document::MemoryDocument;
pub use rig::Rig;
pub use trace::{EntrySummary, ReplayError, Step, Summary, Trace, replay};
