#![forbid(unsafe_code)]

//! Core: input vocabulary for the rewind undo engine.
//!
//! # Role in rewind
//! `rewind-core` is the input layer. It owns the pre-classified input events
//! a host delivers (key-down, key-up, text input, paste, drop, click) and the
//! immutable tables that sort key codes into navigation, functional-delete
//! and typing classes.
//!
//! # How it fits in the system
//! The runtime (`rewind-runtime`) consumes [`event::InputEvent`] values in its
//! input classifier and drives the undo manager from them. Nothing in this
//! crate holds history state.

pub mod event;
pub mod key_class;
pub mod keybinding;

pub use event::{InputEvent, KeyCode, KeyStroke, Modifiers};
pub use key_class::{KeyClass, KeyClassError, KeyClasses, KeyClassesBuilder};
pub use keybinding::{HistoryAction, HistoryKeys};
