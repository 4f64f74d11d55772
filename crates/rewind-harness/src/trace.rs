#![forbid(unsafe_code)]

//! Scripted editing sessions.
//!
//! A [`Trace`] is a JSON document: an engine configuration, the initial
//! text, and a list of [`Step`]s. [`replay`] runs the steps against a
//! [`Rig`] and reports the resulting history as a [`Summary`].
//!
//! ```json
//! {
//!   "initial": "",
//!   "config": { "history": { "limit": 5 } },
//!   "steps": [
//!     { "op": "text", "text": "hello" },
//!     { "op": "key", "code": "left" },
//!     { "op": "key", "code": { "char": "z" }, "modifiers": "CTRL" }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use rewind_core::{KeyCode, KeyStroke, Modifiers};
use rewind_runtime::undo::LockMode;
use rewind_runtime::{EngineConfig, Notification};
use serde::{Deserialize, Serialize};

use crate::document::MemoryDocument;
use crate::rig::Rig;

// ============================================================================
// Trace format
// ============================================================================

/// One scripted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    /// Engine configuration; missing sections use defaults.
    #[serde(default)]
    pub config: EngineConfig,
    /// Document text before the first step.
    #[serde(default)]
    pub initial: String,
    /// Save the initial state before replaying.
    #[serde(default = "default_true")]
    pub save_initial: bool,
    /// Steps, in order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_true() -> bool {
    true
}

/// A single scripted action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Press and release one key.
    Key {
        code: KeyCode,
        #[serde(default)]
        modifiers: Modifiers,
    },
    /// Type each character as a keystroke.
    Text { text: String },
    /// Paste at the caret.
    Paste { text: String },
    /// Drop at a byte offset.
    Drop { text: String, offset: usize },
    /// Click at a byte offset.
    Click { offset: usize },
    /// Replace the text programmatically, bypassing input events.
    Edit { text: String },
    Save,
    SaveContentOnly,
    Update,
    Undo,
    Redo,
    Lock {
        #[serde(default)]
        mode: LockMode,
    },
    Unlock,
}

impl Trace {
    /// Parse a trace from JSON.
    pub fn from_json_str(s: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Read and parse a trace file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Why a trace could not be replayed.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to read trace {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed trace: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),
}

impl ReplayError {
    /// Process exit code for the replay CLI.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Read { .. } => 3,
            Self::Parse(_) | Self::InvalidConfig(_) => 2,
        }
    }
}

// ============================================================================
// Replay
// ============================================================================

/// History after a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Every history entry, oldest first.
    pub entries: Vec<EntrySummary>,
    /// History cursor.
    pub index: Option<usize>,
    pub undoable: bool,
    pub redoable: bool,
    /// Live document text.
    pub content: String,
    /// Notifications in emission order.
    pub notifications: Vec<String>,
}

/// One history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    pub content: String,
    /// First selection range as byte offsets, if one was captured.
    pub selection: Option<(usize, usize)>,
}

/// Run `trace` and summarize the outcome.
pub fn replay(trace: &Trace) -> Result<Summary, ReplayError> {
    let errors = trace.config.validate();
    if !errors.is_empty() {
        return Err(ReplayError::InvalidConfig(errors));
    }

    let mut rig = Rig::new(MemoryDocument::new(&trace.initial), &trace.config);
    if trace.save_initial {
        rig.manager_mut().save();
    }

    let _span = tracing::debug_span!("replay", steps = trace.steps.len()).entered();
    for (i, step) in trace.steps.iter().enumerate() {
        tracing::debug!(target: "rewind.replay", step = i, ?step, "replaying step");
        apply(&mut rig, step);
    }

    let manager = rig.manager();
    let entries = manager
        .snapshots()
        .map(|s| EntrySummary {
            content: s.content().to_string(),
            selection: s
                .bookmarks()
                .and_then(|b| b.first())
                .map(|b| (b.start_offset, b.end_offset)),
        })
        .collect();

    Ok(Summary {
        entries,
        index: manager.index(),
        undoable: manager.undoable(),
        redoable: manager.redoable(),
        content: rig.text().to_string(),
        notifications: rig.notifications().iter().map(label).collect(),
    })
}

fn apply(rig: &mut Rig, step: &Step) {
    match step {
        Step::Key { code, modifiers } => {
            rig.key(KeyStroke::new(*code).with_modifiers(*modifiers));
        }
        Step::Text { text } => rig.type_text(text),
        Step::Paste { text } => rig.paste(text),
        Step::Drop { text, offset } => rig.drop_text(text, *offset),
        Step::Click { offset } => rig.click(*offset),
        Step::Edit { text } => rig.doc_mut().set_text(text),
        Step::Save => {
            rig.manager_mut().save();
        }
        Step::SaveContentOnly => {
            rig.manager_mut().save_content_only();
        }
        Step::Update => rig.manager_mut().update(None),
        Step::Undo => {
            rig.manager_mut().undo();
        }
        Step::Redo => {
            rig.manager_mut().redo();
        }
        Step::Lock { mode } => rig.manager_mut().lock(*mode),
        Step::Unlock => rig.manager_mut().unlock(),
    }
}

fn label(n: &Notification) -> String {
    match n {
        Notification::BeforeCapture => "before_capture".to_string(),
        Notification::AfterCapture => "after_capture".to_string(),
        Notification::ContentChanged => "content_changed".to_string(),
        Notification::HistoryChanged { undoable, redoable } => {
            format!("history_changed(undo={undoable},redo={redoable})")
        }
        Notification::Restored(direction) => format!("restored({direction:?})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let trace = Trace::from_json_str("{}").unwrap();
        assert!(trace.save_initial);
        assert!(trace.initial.is_empty());
        assert!(trace.steps.is_empty());
        assert_eq!(trace.config, EngineConfig::default());
    }

    #[test]
    fn steps_parse_with_tags() {
        let trace = Trace::from_json_str(
            r#"{ "steps": [
                { "op": "key", "code": "left" },
                { "op": "key", "code": { "char": "z" }, "modifiers": "CTRL" },
                { "op": "lock", "mode": "dont_update" },
                { "op": "lock" },
                { "op": "save_content_only" }
            ] }"#,
        )
        .unwrap();
        assert_eq!(
            trace.steps,
            [
                Step::Key {
                    code: KeyCode::Left,
                    modifiers: Modifiers::NONE
                },
                Step::Key {
                    code: KeyCode::Char('z'),
                    modifiers: Modifiers::CTRL
                },
                Step::Lock {
                    mode: LockMode::DontUpdate
                },
                Step::Lock {
                    mode: LockMode::Default
                },
                Step::SaveContentOnly,
            ]
        );
    }

    #[test]
    fn unknown_op_is_parse_error() {
        let err = Trace::from_json_str(r#"{ "steps": [{ "op": "explode" }] }"#).unwrap_err();
        assert!(matches!(err, ReplayError::Parse(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn empty_trace_summarizes_initial_state() {
        let trace = Trace {
            config: EngineConfig::default(),
            initial: "abc".to_string(),
            save_initial: true,
            steps: Vec::new(),
        };
        let summary = replay(&trace).unwrap();
        assert_eq!(
            summary.entries,
            [EntrySummary {
                content: "abc".to_string(),
                selection: Some((3, 3)),
            }]
        );
        assert_eq!(summary.index, Some(0));
        assert!(!summary.undoable);
        assert_eq!(summary.content, "abc");
    }

    #[test]
    fn unsaved_initial_state_has_empty_history() {
        let trace = Trace {
            config: EngineConfig::default(),
            initial: "abc".to_string(),
            save_initial: false,
            steps: Vec::new(),
        };
        let summary = replay(&trace).unwrap();
        assert!(summary.entries.is_empty());
        assert_eq!(summary.index, None);
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(label(&Notification::ContentChanged), "content_changed");
        assert_eq!(
            label(&Notification::HistoryChanged {
                undoable: true,
                redoable: false
            }),
            "history_changed(undo=true,redo=false)"
        );
    }
}
