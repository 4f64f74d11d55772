#![forbid(unsafe_code)]

//! Key classification tables.
//!
//! The undo engine sorts every key code into exactly one of three disjoint
//! classes:
//!
//! - **Navigation**: moves the caret without editing (arrows, Home/End,
//!   Page Up/Down). Closes a typing run before the caret moves.
//! - **Functional**: deletes content (Backspace, Delete). Forms its own
//!   typing group so switching between typing and deleting starts a new step.
//! - **Typing**: everything else.
//!
//! [`KeyClasses`] is an immutable value injected into the classifier at
//! construction, so tests can run against synthetic key sets.
//!
//! # Example
//!
//! ```
//! use rewind_core::event::KeyCode;
//! use rewind_core::key_class::{KeyClass, KeyClasses};
//!
//! let classes = KeyClasses::standard();
//! assert_eq!(classes.classify(KeyCode::Left), KeyClass::Navigation);
//! assert_eq!(classes.classify(KeyCode::Backspace), KeyClass::Functional);
//! assert_eq!(classes.classify(KeyCode::Char('a')), KeyClass::Typing);
//! ```

use ahash::AHashSet;

use crate::event::KeyCode;

/// The class a key code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyClass {
    /// Caret movement only.
    Navigation,
    /// Content deletion (Backspace/Delete).
    Functional,
    /// Anything else; treated as plain typing.
    Typing,
}

/// Errors raised while building a [`KeyClasses`] table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyClassError {
    /// A key code was listed as both navigation and functional.
    #[error("key {0:?} is listed as both navigation and functional")]
    Overlap(KeyCode),
}

/// Immutable navigation/functional key sets.
///
/// # Invariants
///
/// The navigation and functional sets are disjoint; [`KeyClassesBuilder`]
/// refuses to build a table that violates this.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "KeyClassTable", into = "KeyClassTable")
)]
pub struct KeyClasses {
    navigation: AHashSet<KeyCode>,
    functional: AHashSet<KeyCode>,
}

impl Default for KeyClasses {
    fn default() -> Self {
        Self::standard()
    }
}

impl KeyClasses {
    /// Arrows, Home/End and Page Up/Down navigate; Backspace and Delete are
    /// functional.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            navigation: [
                KeyCode::Left,
                KeyCode::Up,
                KeyCode::Right,
                KeyCode::Down,
                KeyCode::Home,
                KeyCode::End,
                KeyCode::PageUp,
                KeyCode::PageDown,
            ]
            .into_iter()
            .collect(),
            functional: [KeyCode::Backspace, KeyCode::Delete].into_iter().collect(),
        }
    }

    /// Start building a custom table.
    #[must_use]
    pub fn builder() -> KeyClassesBuilder {
        KeyClassesBuilder::default()
    }

    /// Classify a key code.
    #[must_use]
    pub fn classify(&self, code: KeyCode) -> KeyClass {
        if self.navigation.contains(&code) {
            KeyClass::Navigation
        } else if self.functional.contains(&code) {
            KeyClass::Functional
        } else {
            KeyClass::Typing
        }
    }

    /// Whether `code` moves the caret without editing.
    #[must_use]
    pub fn is_navigation(&self, code: KeyCode) -> bool {
        self.navigation.contains(&code)
    }

    /// Whether `code` deletes content.
    #[must_use]
    pub fn is_functional(&self, code: KeyCode) -> bool {
        self.functional.contains(&code)
    }

    /// Number of navigation keys in the table.
    #[must_use]
    pub fn navigation_len(&self) -> usize {
        self.navigation.len()
    }

    /// Number of functional keys in the table.
    #[must_use]
    pub fn functional_len(&self) -> usize {
        self.functional.len()
    }
}

/// Builder for [`KeyClasses`].
#[derive(Debug, Clone, Default)]
pub struct KeyClassesBuilder {
    navigation: Vec<KeyCode>,
    functional: Vec<KeyCode>,
}

impl KeyClassesBuilder {
    /// Add a navigation key.
    #[must_use]
    pub fn navigation(mut self, code: KeyCode) -> Self {
        self.navigation.push(code);
        self
    }

    /// Add a functional (delete) key.
    #[must_use]
    pub fn functional(mut self, code: KeyCode) -> Self {
        self.functional.push(code);
        self
    }

    /// Build the table.
    ///
    /// # Errors
    ///
    /// Returns [`KeyClassError::Overlap`] for the first key present in both
    /// sets.
    pub fn build(self) -> Result<KeyClasses, KeyClassError> {
        let navigation: AHashSet<KeyCode> = self.navigation.into_iter().collect();
        let mut functional = AHashSet::with_capacity(self.functional.len());
        for code in self.functional {
            if navigation.contains(&code) {
                return Err(KeyClassError::Overlap(code));
            }
            functional.insert(code);
        }
        Ok(KeyClasses {
            navigation,
            functional,
        })
    }
}

/// Flat list form of [`KeyClasses`], used for (de)serialization.
#[cfg(feature = "serde")]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct KeyClassTable {
    #[serde(default)]
    navigation: Vec<KeyCode>,
    #[serde(default)]
    functional: Vec<KeyCode>,
}

#[cfg(feature = "serde")]
impl TryFrom<KeyClassTable> for KeyClasses {
    type Error = KeyClassError;

    fn try_from(table: KeyClassTable) -> Result<Self, Self::Error> {
        KeyClassesBuilder {
            navigation: table.navigation,
            functional: table.functional,
        }
        .build()
    }
}

#[cfg(feature = "serde")]
impl From<KeyClasses> for KeyClassTable {
    fn from(classes: KeyClasses) -> Self {
        Self {
            navigation: classes.navigation.into_iter().collect(),
            functional: classes.functional.into_iter().collect(),
        }
    }
}
