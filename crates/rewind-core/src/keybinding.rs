#![forbid(unsafe_code)]

//! Undo/redo keystroke mapping.
//!
//! The input classifier checks every key-down against [`HistoryKeys`] before
//! anything else. A matching keystroke runs the history action and is
//! swallowed, so the host never applies it as an edit and no pre-edit image
//! is captured for it.
//!
//! Defaults: `Ctrl+Z` undoes, `Ctrl+Y` and `Ctrl+Shift+Z` redo.

use crate::event::{KeyCode, KeyStroke, Modifiers};

/// A history command bound to a keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HistoryAction {
    /// Step back to the previous distinct content state.
    Undo,
    /// Step forward again after an undo.
    Redo,
}

/// Keystrokes that trigger undo or redo.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HistoryKeys {
    /// Keystrokes mapped to [`HistoryAction::Undo`].
    pub undo: Vec<KeyStroke>,
    /// Keystrokes mapped to [`HistoryAction::Redo`].
    pub redo: Vec<KeyStroke>,
}

impl Default for HistoryKeys {
    fn default() -> Self {
        Self {
            undo: vec![KeyStroke::ctrl(KeyCode::Char('z'))],
            redo: vec![
                KeyStroke::ctrl(KeyCode::Char('y')),
                KeyStroke::new(KeyCode::Char('z')).with_modifiers(Modifiers::CTRL | Modifiers::SHIFT),
            ],
        }
    }
}

impl HistoryKeys {
    /// No history keystrokes at all; every key-down reaches the classifier.
    #[must_use]
    pub fn none() -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    /// Resolve a keystroke to a history action.
    ///
    /// Undo bindings win if a stroke is (mis)configured for both.
    #[must_use]
    pub fn action(&self, stroke: &KeyStroke) -> Option<HistoryAction> {
        if self.undo.contains(stroke) {
            Some(HistoryAction::Undo)
        } else if self.redo.contains(stroke) {
            Some(HistoryAction::Redo)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings() {
        let keys = HistoryKeys::default();
        assert_eq!(
            keys.action(&KeyStroke::ctrl(KeyCode::Char('z'))),
            Some(HistoryAction::Undo)
        );
        assert_eq!(
            keys.action(&KeyStroke::ctrl(KeyCode::Char('y'))),
            Some(HistoryAction::Redo)
        );
        let ctrl_shift_z = KeyStroke::new(KeyCode::Char('z'))
            .with_modifiers(Modifiers::CTRL | Modifiers::SHIFT);
        assert_eq!(keys.action(&ctrl_shift_z), Some(HistoryAction::Redo));
    }

    #[test]
    fn plain_keys_are_not_history_keys() {
        let keys = HistoryKeys::default();
        assert_eq!(keys.action(&KeyStroke::new(KeyCode::Char('z'))), None);
        assert_eq!(keys.action(&KeyStroke::ctrl(KeyCode::Char('x'))), None);
    }

    #[test]
    fn none_disables_everything() {
        let keys = HistoryKeys::none();
        assert_eq!(keys.action(&KeyStroke::ctrl(KeyCode::Char('z'))), None);
    }

    #[test]
    fn undo_wins_on_conflict() {
        let stroke = KeyStroke::ctrl(KeyCode::Char('u'));
        let keys = HistoryKeys {
            undo: vec![stroke],
            redo: vec![stroke],
        };
        assert_eq!(keys.action(&stroke), Some(HistoryAction::Undo));
    }
}
