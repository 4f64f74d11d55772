#![forbid(unsafe_code)]

//! Host document capability interface.
//!
//! The engine never touches document content directly. Everything it needs
//! from the editing surface goes through [`HostDocument`]: serialize the
//! content, describe the selection as bookmarks, load content back, put the
//! selection back, and report whether the document is currently editable.
//!
//! Implementations live with the host (a DOM bridge, a text buffer, the
//! in-memory document in `rewind-harness`).

use crate::error::HostError;
use crate::undo::snapshot::Bookmark;

/// Capabilities the undo engine consumes from the host document.
pub trait HostDocument {
    /// Serialize the current document content.
    ///
    /// `Ok(None)` means the content is unavailable right now; the engine
    /// treats it (and `Err`) as an invalid capture that never enters history.
    fn capture_content(&mut self) -> Result<Option<String>, HostError>;

    /// Describe the current selection as bookmarks, or `None` when there is
    /// no selection to record.
    fn capture_selection(&mut self) -> Option<Vec<Bookmark>>;

    /// Replace the document content with previously captured content.
    fn load_content(&mut self, content: &str);

    /// Re-apply a selection described by bookmarks.
    fn restore_selection(&mut self, bookmarks: &[Bookmark]);

    /// Collapse the selection to a deterministic default position. Called
    /// after restoring a snapshot that carries no bookmarks.
    fn collapse_selection(&mut self) {}

    /// Bring the document into a focused, selectable state. Called before a
    /// restore that will apply bookmarks.
    fn focus(&mut self) {}

    /// Whether the document is mounted, in its editable mode and ready.
    fn is_editable_and_ready(&self) -> bool;

    /// Whether the document is read-only.
    fn is_read_only(&self) -> bool {
        false
    }

    /// Strip ephemeral, host-injected markup from captured content so that
    /// content comparison only sees what the user edited.
    ///
    /// See [`strip_attribute`](crate::undo::snapshot::strip_attribute) for a
    /// ready-made normalizer.
    fn normalize_content(&self, raw: String) -> String {
        raw
    }
}

impl<H: HostDocument + ?Sized> HostDocument for Box<H> {
    fn capture_content(&mut self) -> Result<Option<String>, HostError> {
        (**self).capture_content()
    }

    fn capture_selection(&mut self) -> Option<Vec<Bookmark>> {
        (**self).capture_selection()
    }

    fn load_content(&mut self, content: &str) {
        (**self).load_content(content);
    }

    fn restore_selection(&mut self, bookmarks: &[Bookmark]) {
        (**self).restore_selection(bookmarks);
    }

    fn collapse_selection(&mut self) {
        (**self).collapse_selection();
    }

    fn focus(&mut self) {
        (**self).focus();
    }

    fn is_editable_and_ready(&self) -> bool {
        (**self).is_editable_and_ready()
    }

    fn is_read_only(&self) -> bool {
        (**self).is_read_only()
    }

    fn normalize_content(&self, raw: String) -> String {
        (**self).normalize_content(raw)
    }
}
