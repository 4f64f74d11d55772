//! In-crate host fixture for unit tests.

use crate::error::HostError;
use crate::host::HostDocument;
use crate::undo::snapshot::Bookmark;

/// Scriptable in-memory host document.
#[derive(Debug, Clone)]
pub(crate) struct TestDoc {
    pub content: String,
    pub selection: Option<Vec<Bookmark>>,
    pub ready: bool,
    pub read_only: bool,
    pub unavailable: bool,
    pub fail_next: Option<HostError>,
    pub loads: Vec<String>,
    pub focus_calls: usize,
    pub collapse_calls: usize,
}

impl TestDoc {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            selection: Some(vec![Bookmark::caret(vec![0], 0)]),
            ready: true,
            read_only: false,
            unavailable: false,
            fail_next: None,
            loads: Vec::new(),
            focus_calls: 0,
            collapse_calls: 0,
        }
    }

    /// Replace the content and put the caret at its end.
    pub fn set(&mut self, content: &str) {
        self.content = content.to_string();
        self.caret(content.len());
    }

    /// Move the caret without touching content.
    pub fn caret(&mut self, offset: usize) {
        self.selection = Some(vec![Bookmark::caret(vec![0], offset)]);
    }

    pub fn caret_offset(&self) -> Option<usize> {
        self.selection
            .as_ref()
            .and_then(|s| s.first())
            .map(|b| b.start_offset)
    }
}

impl HostDocument for TestDoc {
    fn capture_content(&mut self) -> Result<Option<String>, HostError> {
        if let Some(err) = self.fail_next.take() {
            return Err(err);
        }
        if self.unavailable {
            return Ok(None);
        }
        Ok(Some(self.content.clone()))
    }

    fn capture_selection(&mut self) -> Option<Vec<Bookmark>> {
        self.selection.clone()
    }

    fn load_content(&mut self, content: &str) {
        self.content = content.to_string();
        self.loads.push(content.to_string());
    }

    fn restore_selection(&mut self, bookmarks: &[Bookmark]) {
        self.selection = Some(bookmarks.to_vec());
    }

    fn collapse_selection(&mut self) {
        self.collapse_calls += 1;
        self.selection = Some(vec![Bookmark::caret(vec![0], 0)]);
    }

    fn focus(&mut self) {
        self.focus_calls += 1;
    }

    fn is_editable_and_ready(&self) -> bool {
        self.ready
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}
