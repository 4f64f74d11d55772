#![forbid(unsafe_code)]

//! Canonical input/event types.
//!
//! Hosts translate their native input signals into these types before handing
//! them to the input classifier. All events derive `Clone`, `PartialEq`, and
//! `Eq` for use in tests and pattern matching.
//!
//! # Design Notes
//!
//! - Events are already *classified* by the host: a key-up carries whether
//!   the host saw the text change, paste/drop are bare markers.
//! - `KeyCode::Raw` carries host-specific codes that have no named variant;
//!   [`KeyCode::from_legacy_code`] maps the common numeric codes used by
//!   browser-style hosts.
//! - `Modifiers` use bitflags for easy combination.

use bitflags::bitflags;

/// Classified input signal delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum InputEvent {
    /// A key was pressed, before the host applied any edit.
    KeyDown(KeyStroke),

    /// The host observed a text change caused by the pending keystroke.
    Input,

    /// A key was released.
    KeyUp {
        /// The released key.
        code: KeyCode,
        /// `true` when the host itself correlated this key-up with a text
        /// change; equivalent to an [`InputEvent::Input`] right before it.
        #[cfg_attr(feature = "serde", serde(default))]
        text_changed: bool,
    },

    /// Content was pasted.
    Paste,

    /// Content was dropped.
    Drop,

    /// The pointer was clicked inside the document.
    Click,
}

impl InputEvent {
    /// Key-down event for a bare key.
    #[must_use]
    pub const fn key_down(code: KeyCode) -> Self {
        Self::KeyDown(KeyStroke::new(code))
    }

    /// Key-up event that did not change text on its own.
    #[must_use]
    pub const fn key_up(code: KeyCode) -> Self {
        Self::KeyUp {
            code,
            text_changed: false,
        }
    }

    /// Key-up event the host already correlated with a text change.
    #[must_use]
    pub const fn key_up_changed(code: KeyCode) -> Self {
        Self::KeyUp {
            code,
            text_changed: true,
        }
    }
}

/// A key together with the modifiers held while it was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyStroke {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    #[cfg_attr(feature = "serde", serde(default))]
    pub modifiers: Modifiers,
}

impl KeyStroke {
    /// Create a new keystroke with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
        }
    }

    /// Create a keystroke with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Shorthand for `Ctrl` + `code`.
    #[must_use]
    pub const fn ctrl(code: KeyCode) -> Self {
        Self::new(code).with_modifiers(Modifiers::CTRL)
    }

    /// Check if Ctrl modifier is held.
    #[must_use]
    pub const fn has_ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Shift modifier is held.
    #[must_use]
    pub const fn has_shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

impl From<KeyCode> for KeyStroke {
    fn from(code: KeyCode) -> Self {
        Self::new(code)
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum KeyCode {
    /// A regular character key.
    Char(char),

    /// Enter/Return key.
    Enter,

    /// Escape key.
    Escape,

    /// Backspace key.
    Backspace,

    /// Tab key.
    Tab,

    /// Delete key.
    Delete,

    /// Insert key.
    Insert,

    /// Home key.
    Home,

    /// End key.
    End,

    /// Page Up key.
    PageUp,

    /// Page Down key.
    PageDown,

    /// Up arrow key.
    Up,

    /// Down arrow key.
    Down,

    /// Left arrow key.
    Left,

    /// Right arrow key.
    Right,

    /// Function key (F1-F24).
    F(u8),

    /// Host-specific code with no named variant.
    Raw(u32),
}

impl KeyCode {
    /// Map a legacy numeric key code (as reported by browser-style hosts)
    /// to a [`KeyCode`].
    ///
    /// Letters map to their lowercase character; unknown codes are kept as
    /// [`KeyCode::Raw`].
    #[must_use]
    pub fn from_legacy_code(code: u32) -> Self {
        match code {
            8 => Self::Backspace,
            9 => Self::Tab,
            13 => Self::Enter,
            27 => Self::Escape,
            32 => Self::Char(' '),
            33 => Self::PageUp,
            34 => Self::PageDown,
            35 => Self::End,
            36 => Self::Home,
            37 => Self::Left,
            38 => Self::Up,
            39 => Self::Right,
            40 => Self::Down,
            45 => Self::Insert,
            46 => Self::Delete,
            48..=57 | 65..=90 => char::from_u32(code)
                .map(|c| Self::Char(c.to_ascii_lowercase()))
                .unwrap_or(Self::Raw(code)),
            // F1..F24
            112..=135 => Self::F((code - 111) as u8),
            _ => Self::Raw(code),
        }
    }

    /// Whether this is one of the four arrow keys.
    #[must_use]
    pub const fn is_arrow(self) -> bool {
        matches!(self, Self::Up | Self::Down | Self::Left | Self::Right)
    }
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}
