#![forbid(unsafe_code)]

//! Snapshot-based undo/redo.
//!
//! Instead of recording reversible commands, the engine records whole
//! document states. Each history entry is a [`Snapshot`] of the serialized
//! content plus, usually, the selection. Undo and redo load a previous
//! snapshot back into the host.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      UndoManager<H>                      │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐  │
//! │  │ HistoryStack │   │  LockState   │   │ TypingState  │  │
//! │  │ [s0 s1 s2]   │   │ depth +      │   │ run counters │  │
//! │  │      ▲ index │   │ reconcile    │   │ + last group │  │
//! │  └──────────────┘   └──────────────┘   └──────────────┘  │
//! │          │ capture / load                                │
//! │          ▼                                               │
//! │     HostDocument ──────────► Notifier ──► subscribers    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Structure
//!
//! - [`snapshot`]: immutable captured state and its equality rules
//! - [`stack`]: bounded history with a cursor
//! - [`lock`]: nested snapshot suppression
//! - [`typing`]: keystroke run counters
//! - [`manager`]: the state machine tying them together
//!
//! # Design Notes
//!
//! Two snapshots with equal content but different selections are the same
//! undo step. Undo and redo skip over such neighbours so every step is a
//! visible content change, while the selection stored in the landing entry
//! is still restored.

pub mod lock;
pub mod manager;
pub mod snapshot;
pub mod stack;
pub mod typing;

pub use lock::{LockMode, LockState, Reconcile};
pub use manager::UndoManager;
pub use snapshot::{Bookmark, Snapshot, strip_attribute};
pub use stack::{DEFAULT_LIMIT, Direction, HistoryConfig, HistoryStack};
pub use typing::{Boundary, DEFAULT_THRESHOLD, KeyGroup, Stroke, TypingConfig, TypingState};
