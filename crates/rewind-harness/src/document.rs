#![forbid(unsafe_code)]

//! Single-line in-memory host document.
//!
//! [`MemoryDocument`] is a plain text buffer with a caret and an optional
//! selection anchor. Caret movement and deletion work on grapheme clusters,
//! so undoing a Backspace over `é` or an emoji restores the whole cluster.
//!
//! Selections are exported as one [`Bookmark`] whose offsets are byte
//! offsets into the text, addressed through the single-element path `[0]`.

use rewind_runtime::undo::{Bookmark, strip_attribute};
use rewind_runtime::{HostDocument, HostError};
use unicode_segmentation::UnicodeSegmentation;

/// Text buffer implementing [`HostDocument`].
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    text: String,
    cursor: usize,
    anchor: Option<usize>,
    ready: bool,
    read_only: bool,
    transient_attribute: Option<String>,
    loads: usize,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new("")
    }
}

impl MemoryDocument {
    /// A ready, writable document with the caret at the end of `text`.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.len(),
            anchor: None,
            ready: true,
            read_only: false,
            transient_attribute: None,
            loads: 0,
        }
    }

    /// Strip `name="…"` attributes from captured content.
    #[must_use]
    pub fn with_transient_attribute(mut self, name: &str) -> Self {
        self.transient_attribute = Some(name.to_string());
        self
    }

    /// Current text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Caret byte offset.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Selected byte range, ordered; empty when collapsed.
    #[must_use]
    pub fn selection(&self) -> (usize, usize) {
        let anchor = self.anchor.unwrap_or(self.cursor);
        (anchor.min(self.cursor), anchor.max(self.cursor))
    }

    /// How often content was loaded back by undo/redo.
    #[must_use]
    pub fn loads(&self) -> usize {
        self.loads
    }

    /// Mark the document (not) ready for editing.
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Toggle read-only mode.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Replace the whole text programmatically; the caret goes to the end.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.len();
        self.anchor = None;
    }

    /// Place the caret, snapping back to a grapheme boundary.
    pub fn set_cursor(&mut self, offset: usize) {
        self.cursor = self.snap(offset);
        self.anchor = None;
    }

    /// Select from `start` to `end` (caret at `end`).
    pub fn select(&mut self, start: usize, end: usize) {
        self.anchor = Some(self.snap(start));
        self.cursor = self.snap(end);
    }

    /// Insert at the caret, replacing the selection.
    pub fn insert(&mut self, s: &str) {
        self.delete_selection();
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    /// Delete the selection or the grapheme before the caret.
    pub fn backspace(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        let Some((start, _)) = self.text[..self.cursor].grapheme_indices(true).next_back() else {
            return false;
        };
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
        true
    }

    /// Delete the selection or the grapheme after the caret.
    pub fn delete_forward(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        let Some(next) = self.text[self.cursor..].graphemes(true).next() else {
            return false;
        };
        let end = self.cursor + next.len();
        self.text.replace_range(self.cursor..end, "");
        true
    }

    /// Move the caret one grapheme left.
    pub fn move_left(&mut self) {
        let to = self.text[..self.cursor]
            .grapheme_indices(true)
            .next_back()
            .map_or(0, |(i, _)| i);
        self.set_cursor(to);
    }

    /// Move the caret one grapheme right.
    pub fn move_right(&mut self) {
        let to = self.text[self.cursor..]
            .graphemes(true)
            .next()
            .map_or(self.cursor, |g| self.cursor + g.len());
        self.set_cursor(to);
    }

    /// Move the caret to the start.
    pub fn home(&mut self) {
        self.set_cursor(0);
    }

    /// Move the caret to the end.
    pub fn end(&mut self) {
        self.set_cursor(self.text.len());
    }

    fn delete_selection(&mut self) -> bool {
        let (start, end) = self.selection();
        self.anchor = None;
        if start == end {
            return false;
        }
        self.text.replace_range(start..end, "");
        self.cursor = start;
        true
    }

    fn snap(&self, offset: usize) -> usize {
        if offset >= self.text.len() {
            return self.text.len();
        }
        self.text
            .grapheme_indices(true)
            .map(|(i, _)| i)
            .take_while(|&i| i <= offset)
            .last()
            .unwrap_or(0)
    }
}

impl HostDocument for MemoryDocument {
    fn capture_content(&mut self) -> Result<Option<String>, HostError> {
        Ok(self.ready.then(|| self.text.clone()))
    }

    fn capture_selection(&mut self) -> Option<Vec<Bookmark>> {
        let (start, end) = self.selection();
        Some(vec![Bookmark::range(vec![0], start, vec![0], end)])
    }

    fn load_content(&mut self, content: &str) {
        self.text = content.to_string();
        self.cursor = self.snap(self.cursor);
        self.anchor = None;
        self.loads += 1;
    }

    fn restore_selection(&mut self, bookmarks: &[Bookmark]) {
        if let Some(b) = bookmarks.first() {
            self.select(b.start_offset, b.end_offset);
            if self.anchor == Some(self.cursor) {
                self.anchor = None;
            }
        }
    }

    fn collapse_selection(&mut self) {
        self.set_cursor(0);
    }

    fn is_editable_and_ready(&self) -> bool {
        self.ready
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn normalize_content(&self, raw: String) -> String {
        match &self.transient_attribute {
            Some(name) => strip_attribute(&raw, name).into_owned(),
            None => raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_backspace_graphemes() {
        let mut doc = MemoryDocument::new("ab");
        doc.insert("e\u{301}");
        assert_eq!(doc.text(), "abe\u{301}");
        assert!(doc.backspace());
        assert_eq!(doc.text(), "ab");
        assert!(doc.backspace());
        assert!(doc.backspace());
        assert!(!doc.backspace());
        assert_eq!(doc.cursor(), 0);
    }

    #[test]
    fn delete_forward_and_movement() {
        let mut doc = MemoryDocument::new("x👍🏽y");
        doc.home();
        doc.move_right();
        assert_eq!(doc.cursor(), 1);
        assert!(doc.delete_forward());
        assert_eq!(doc.text(), "xy");
        doc.end();
        assert!(!doc.delete_forward());
        doc.move_left();
        assert_eq!(doc.cursor(), 1);
    }

    #[test]
    fn selection_is_replaced_by_insert() {
        let mut doc = MemoryDocument::new("hello world");
        doc.select(0, 5);
        doc.insert("bye");
        assert_eq!(doc.text(), "bye world");
        assert_eq!(doc.selection(), (3, 3));
    }

    #[test]
    fn cursor_snaps_to_grapheme_boundary() {
        let mut doc = MemoryDocument::new("ae\u{301}b");
        doc.set_cursor(2);
        assert_eq!(doc.cursor(), 1);
        doc.set_cursor(99);
        assert_eq!(doc.cursor(), doc.text().len());
    }

    #[test]
    fn host_round_trip() {
        let mut doc = MemoryDocument::new("abc");
        doc.select(1, 2);
        let content = doc.capture_content().unwrap().unwrap();
        let bookmarks = doc.capture_selection().unwrap();

        doc.set_text("zzzz");
        doc.load_content(&content);
        doc.restore_selection(&bookmarks);
        assert_eq!(doc.text(), "abc");
        assert_eq!(doc.selection(), (1, 2));
        assert_eq!(doc.loads(), 1);
    }

    #[test]
    fn not_ready_document_has_no_content() {
        let mut doc = MemoryDocument::new("abc");
        doc.set_ready(false);
        assert_eq!(doc.capture_content(), Ok(None));
        assert!(!doc.is_editable_and_ready());
    }

    #[test]
    fn transient_attribute_is_normalized() {
        let doc = MemoryDocument::new("").with_transient_attribute("data-id");
        assert_eq!(
            doc.normalize_content(r#"<b data-id="3">x</b>"#.to_string()),
            "<b>x</b>"
        );
    }
}
