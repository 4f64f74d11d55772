#![forbid(unsafe_code)]

//! Immutable document snapshots.
//!
//! A [`Snapshot`] captures the serialized document content and, unless it is
//! content-only, the selection as a list of [`Bookmark`]s. Both live behind
//! [`Arc`] so cloning a snapshot (into the history stack, into
//! `current_image`, into the key-down slot) never copies the document.
//!
//! # Equality
//!
//! - [`equals_content`](Snapshot::equals_content) compares the normalized
//!   content. Normalization happens once, at capture time, through
//!   [`HostDocument::normalize_content`].
//! - [`equals_selection`](Snapshot::equals_selection) compares bookmark lists
//!   element-wise. Two content-only snapshots are vacuously equal; a snapshot
//!   with bookmarks never equals one without.
//!
//! # Invariants
//!
//! 1. A `Snapshot` value is always valid: failed captures are reported as
//!    [`CaptureError`] and never produce a value that could enter history.
//! 2. Snapshots are never mutated after construction.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::error::CaptureError;
use crate::host::HostDocument;
use crate::notify::{Notification, Notifier};

/// Serializable description of one selection range.
///
/// Offsets and paths address positions in a form that survives a
/// serialize/load cycle of the document (child-index paths from the root plus
/// an offset inside the addressed node).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bookmark {
    /// Offset inside the start node.
    pub start_offset: usize,
    /// Offset inside the end node.
    pub end_offset: usize,
    /// Child-index path from the root to the start node.
    pub start_path: Vec<usize>,
    /// Child-index path from the root to the end node.
    pub end_path: Vec<usize>,
}

impl Bookmark {
    /// A collapsed caret at `offset` inside the node at `path`.
    #[must_use]
    pub fn caret(path: Vec<usize>, offset: usize) -> Self {
        Self {
            start_offset: offset,
            end_offset: offset,
            start_path: path.clone(),
            end_path: path,
        }
    }

    /// A range between two positions.
    #[must_use]
    pub fn range(
        start_path: Vec<usize>,
        start_offset: usize,
        end_path: Vec<usize>,
        end_offset: usize,
    ) -> Self {
        Self {
            start_offset,
            end_offset,
            start_path,
            end_path,
        }
    }

    /// Whether start and end coincide.
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.start_offset == self.end_offset && self.start_path == self.end_path
    }
}

/// Document content plus optional selection at one instant.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    content: Arc<str>,
    bookmarks: Option<Arc<[Bookmark]>>,
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("content_len", &self.content.len())
            .field("bookmarks", &self.bookmarks.as_deref())
            .finish()
    }
}

impl Snapshot {
    /// Build a snapshot from already-normalized content and bookmarks.
    #[must_use]
    pub fn new(content: impl Into<Arc<str>>, bookmarks: Option<Vec<Bookmark>>) -> Self {
        Self {
            content: content.into(),
            bookmarks: bookmarks.map(Arc::from),
        }
    }

    /// Build a content-only snapshot.
    #[must_use]
    pub fn content_only(content: impl Into<Arc<str>>) -> Self {
        Self::new(content, None)
    }

    /// Capture the live state of `host`.
    ///
    /// Emits [`Notification::BeforeCapture`] and
    /// [`Notification::AfterCapture`] around the capture (the latter also on
    /// failure). Selection is skipped when `content_only` is set.
    ///
    /// # Errors
    ///
    /// [`CaptureError::Unavailable`] when the host has no content to offer,
    /// [`CaptureError::Host`] when the host failed while producing it.
    pub fn capture<H: HostDocument + ?Sized>(
        host: &mut H,
        notifier: &Notifier,
        content_only: bool,
    ) -> Result<Self, CaptureError> {
        notifier.emit(&Notification::BeforeCapture);
        let result = Self::capture_inner(host, content_only);
        notifier.emit(&Notification::AfterCapture);
        result
    }

    fn capture_inner<H: HostDocument + ?Sized>(
        host: &mut H,
        content_only: bool,
    ) -> Result<Self, CaptureError> {
        let raw = host.capture_content()?.ok_or(CaptureError::Unavailable)?;
        let content = host.normalize_content(raw);
        let bookmarks = if content_only {
            None
        } else {
            host.capture_selection()
        };
        Ok(Self::new(content, bookmarks))
    }

    /// The normalized serialized content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The selection bookmarks, if this is not a content-only snapshot.
    #[must_use]
    pub fn bookmarks(&self) -> Option<&[Bookmark]> {
        self.bookmarks.as_deref()
    }

    /// Whether the snapshot carries selection bookmarks.
    #[must_use]
    pub fn has_selection(&self) -> bool {
        self.bookmarks.is_some()
    }

    /// Compare normalized content only.
    #[must_use]
    pub fn equals_content(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.content, &other.content) || self.content == other.content
    }

    /// Compare selections element-wise.
    #[must_use]
    pub fn equals_selection(&self, other: &Self) -> bool {
        match (&self.bookmarks, &other.bookmarks) {
            (None, None) => true,
            (Some(a), Some(b)) => a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y),
            _ => false,
        }
    }
}

/// Remove every whitespace-prefixed `name="…"` attribute from `content`.
///
/// Hosts that inject transient attributes while serializing (expando ids,
/// temporary markers) can call this from
/// [`HostDocument::normalize_content`]. Occurrences not preceded by
/// whitespace belong to a longer attribute name and are left alone; an
/// unterminated value stops the scan.
#[must_use]
pub fn strip_attribute<'a>(content: &'a str, name: &str) -> Cow<'a, str> {
    let needle = format!("{name}=\"");
    if !content.contains(&needle) {
        return Cow::Borrowed(content);
    }

    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(pos) = rest.find(&needle) {
        let value_start = pos + needle.len();
        let Some(close) = rest[value_start..].find('"') else {
            break;
        };
        let attr_end = value_start + close + 1;
        let before = &rest[..pos];
        let trimmed = before.trim_end_matches(char::is_whitespace);
        if trimmed.len() == before.len() {
            out.push_str(&rest[..attr_end]);
        } else {
            out.push_str(trimmed);
        }
        rest = &rest[attr_end..];
    }
    out.push_str(rest);
    Cow::Owned(out)
}
