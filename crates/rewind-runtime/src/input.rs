#![forbid(unsafe_code)]

//! Input classifier: turns host input events into undo manager calls.
//!
//! # Event Flow
//!
//! ```text
//! KeyDown ──► history key? ──yes──► undo()/redo(), Consumed
//!                 │ no
//!                 ▼
//!         capture pre-edit image ──► navigation? ──► close typing run
//!
//! Input ───► pending += 1            (skipped once after Paste/Drop)
//!
//! KeyUp ───► pending > 0 ? ──yes──► type_key(code)
//!                 │ no
//!                 ▼
//!            navigation? ──► on_navigation_key
//!
//! Click ───► on_navigation_key
//! ```
//!
//! Text input is reported by the host before the matching key-up, so the
//! key-up can tell whether the keystroke actually produced text.
//!
//! # Failure Modes
//!
//! - **Input without key-up** (IME composition, autocorrect): the pending
//!   counter stays raised until the next key-up consumes it. Hosts that know
//!   a composition was cancelled call [`InputHandler::reset_counter`].

use rewind_core::event::{InputEvent, KeyCode, KeyStroke};
use rewind_core::keybinding::{HistoryAction, HistoryKeys};

use crate::host::HostDocument;
use crate::undo::manager::UndoManager;

/// What the host should do with the native event after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Let the host apply its default behaviour.
    Pass,
    /// The event was handled here; the host must suppress its default.
    Consumed,
}

/// Input classifier configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InputConfig {
    /// Keystrokes that run undo/redo and are swallowed.
    pub history_keys: HistoryKeys,
    /// Skip functional keys whose key-up finds the content unchanged. Some
    /// hosts report a text change for Backspace at the start of the
    /// document even though nothing was deleted.
    pub ignore_unchanged_functional_keys: bool,
}

/// Stateful classifier for one document's input stream.
#[derive(Debug, Clone, Default)]
pub struct InputHandler {
    config: InputConfig,
    pending_inputs: u32,
    ignore_next_input: bool,
}

impl InputHandler {
    /// Create a classifier.
    #[must_use]
    pub fn new(config: InputConfig) -> Self {
        Self {
            config,
            pending_inputs: 0,
            ignore_next_input: false,
        }
    }

    /// The classifier configuration.
    #[must_use]
    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// Route one event to the manager.
    pub fn handle<H: HostDocument>(
        &mut self,
        manager: &mut UndoManager<H>,
        event: &InputEvent,
    ) -> KeyDisposition {
        match event {
            InputEvent::KeyDown(stroke) => return self.on_key_down(manager, stroke),
            InputEvent::Input => self.on_input(),
            InputEvent::KeyUp { code, text_changed } => {
                self.on_key_up(manager, *code, *text_changed);
            }
            InputEvent::Paste | InputEvent::Drop => self.on_paste_or_drop(),
            InputEvent::Click => self.on_click(manager),
        }
        KeyDisposition::Pass
    }

    /// Key pressed, before the host applies it.
    pub fn on_key_down<H: HostDocument>(
        &mut self,
        manager: &mut UndoManager<H>,
        stroke: &KeyStroke,
    ) -> KeyDisposition {
        if let Some(action) = self.config.history_keys.action(stroke) {
            let done = match action {
                HistoryAction::Undo => manager.undo(),
                HistoryAction::Redo => manager.redo(),
            };
            tracing::debug!(target: "rewind.input", ?action, done, "history keystroke");
            return KeyDisposition::Consumed;
        }

        manager.capture_keydown_image();
        if manager.key_classes().is_navigation(stroke.code) && manager.commit_typing_run() {
            tracing::trace!(target: "rewind.input", code = ?stroke.code, "typing run closed by navigation");
        }
        KeyDisposition::Pass
    }

    /// The host saw text change.
    pub fn on_input(&mut self) {
        if self.ignore_next_input {
            self.ignore_next_input = false;
            tracing::trace!(target: "rewind.input", "input ignored after paste/drop");
            return;
        }
        self.pending_inputs = self.pending_inputs.saturating_add(1);
    }

    /// Key released.
    pub fn on_key_up<H: HostDocument>(
        &mut self,
        manager: &mut UndoManager<H>,
        code: KeyCode,
        text_changed: bool,
    ) {
        if text_changed {
            self.on_input();
        }

        if self.config.ignore_unchanged_functional_keys
            && manager.key_classes().is_functional(code)
            && manager.keydown_matches_live_content()
        {
            self.pending_inputs = self.pending_inputs.saturating_sub(1);
            tracing::trace!(target: "rewind.input", ?code, "functional key changed nothing");
            return;
        }

        if self.pending_inputs > 0 {
            self.pending_inputs -= 1;
            manager.type_key(code);
        } else if manager.key_classes().is_navigation(code) {
            manager.on_navigation_key(false);
        }
    }

    /// Paste or drop: the next input signal belongs to it, not to a key.
    pub fn on_paste_or_drop(&mut self) {
        self.ignore_next_input = true;
    }

    /// Pointer click moves the caret.
    pub fn on_click<H: HostDocument>(&mut self, manager: &mut UndoManager<H>) {
        manager.on_navigation_key(false);
    }

    /// Forget pending input signals.
    pub fn reset_counter(&mut self) {
        self.pending_inputs = 0;
    }

    /// Input signals not yet matched to a key-up.
    #[must_use]
    pub fn pending_inputs(&self) -> u32 {
        self.pending_inputs
    }
}
