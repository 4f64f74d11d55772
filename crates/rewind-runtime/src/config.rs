#![forbid(unsafe_code)]

//! Engine configuration as data.
//!
//! [`EngineConfig`] groups every tunable of the engine: history capacity,
//! the typing-run threshold, the key classification table and the input
//! classifier options. With the `config-file` feature it loads from TOML or
//! JSON.
//!
//! # Loading
//!
//! ```toml
//! # rewind.toml
//! [history]
//! limit = 50
//!
//! [typing]
//! threshold = 25
//!
//! [keys]
//! navigation = ["left", "right", "up", "down", "home", "end"]
//! functional = ["backspace", "delete"]
//!
//! [input]
//! ignore_unchanged_functional_keys = true
//! ```
//!
//! ```rust,ignore
//! let config = EngineConfig::from_toml_file("rewind.toml")?;
//! let manager = UndoManager::with_config(host, &config);
//! let input = InputHandler::new(config.input.clone());
//! ```
//!
//! # Defaults
//!
//! `EngineConfig::default()` keeps 20 history entries, forces a step every
//! 25 same-group keystrokes and uses [`KeyClasses::standard`].

#[cfg(feature = "config-file")]
use std::path::Path;

use rewind_core::key_class::KeyClasses;

use crate::input::InputConfig;
use crate::undo::stack::HistoryConfig;
use crate::undo::typing::TypingConfig;

/// All engine tunables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// History stack capacity.
    pub history: HistoryConfig,
    /// Typing-run coalescing.
    pub typing: TypingConfig,
    /// Navigation and functional key sets.
    pub keys: KeyClasses,
    /// Input classifier options.
    pub input: InputConfig,
}

impl EngineConfig {
    /// Load from a TOML string and validate.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.checked()
    }

    /// Load from a TOML file on disk and validate.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string and validate.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.checked()
    }

    /// Load from a JSON file on disk and validate.
    #[cfg(feature = "config-file")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Render as TOML.
    #[cfg(feature = "config-file")]
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    #[cfg(feature = "config-file")]
    fn checked(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Check every parameter is in range.
    ///
    /// Returns one message per problem; an empty list means the config is
    /// valid. Out-of-range values are still usable (the history limit is
    /// clamped), but almost always a mistake.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.history.limit == 0 {
            errors.push("history.limit must be > 0".into());
        }
        if self.typing.threshold == 0 {
            errors.push("typing.threshold must be > 0".into());
        }
        errors
    }
}

/// Errors that can occur when loading an engine configuration.
#[cfg(feature = "config-file")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// TOML render error.
    #[error("TOML render error: {0}")]
    TomlRender(#[from] toml::ser::Error),
    /// JSON parse error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// Validation errors.
    #[error("validation errors: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewind_core::event::KeyCode;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.history.limit, 20);
        assert_eq!(config.typing.threshold, 25);
        assert_eq!(config.keys, KeyClasses::standard());
        assert!(!config.input.ignore_unchanged_functional_keys);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn validate_reports_each_problem() {
        let config = EngineConfig {
            history: HistoryConfig::new(0),
            typing: TypingConfig { threshold: 0 },
            ..EngineConfig::default()
        };
        let errors = config.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("history.limit"));
        assert!(errors[1].contains("typing.threshold"));
    }

    #[test]
    fn custom_keys_reach_the_manager() {
        use crate::test_support::TestDoc;
        use crate::undo::manager::UndoManager;

        let keys = KeyClasses::builder()
            .navigation(KeyCode::Tab)
            .functional(KeyCode::Char('x'))
            .build()
            .unwrap();
        let config = EngineConfig {
            keys,
            ..EngineConfig::default()
        };
        let m = UndoManager::with_config(TestDoc::new(""), &config);
        assert!(m.key_classes().is_navigation(KeyCode::Tab));
        assert!(!m.key_classes().is_navigation(KeyCode::Left));
        assert!(m.key_classes().is_functional(KeyCode::Char('x')));
    }
}
