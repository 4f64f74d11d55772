#![forbid(unsafe_code)]

//! The undo manager state machine.
//!
//! [`UndoManager`] owns the [`HistoryStack`] and the host document. Every
//! mutation of history goes through one of its operations; the input
//! classifier and the host only call the public methods here.
//!
//! # Operations
//!
//! | Operation                  | Stack effect                                         |
//! |----------------------------|------------------------------------------------------|
//! | [`save`](UndoManager::save)     | push a distinct state, or replace the current entry on a selection-only change |
//! | [`update`](UndoManager::update) | fold the live state into the current entry            |
//! | [`undo`](UndoManager::undo) / [`redo`](UndoManager::redo) | move to the nearest content-distinct neighbour |
//! | [`lock`](UndoManager::lock) / [`unlock`](UndoManager::unlock) | suppress saves, reconcile once at the end |
//! | [`type_key`](UndoManager::type_key) | coalesce keystrokes into typing runs         |
//!
//! # Invariants
//!
//! 1. `current_image()` equals the entry under the cursor whenever history is
//!    non-empty, and is `None` when it is empty.
//! 2. While locked, `save`, `update` and selection amendment leave history
//!    untouched.
//! 3. A failed capture never enters history.
//!
//! # Failure Modes
//!
//! - **Host not ready**: `save` returns `false`.
//! - **Host capture error**: logged at `warn` under `rewind.undo`, the
//!   operation degrades to a no-op.
//! - **Unbalanced unlock**: ignored.

use std::fmt;

use rewind_core::event::KeyCode;
use rewind_core::key_class::KeyClasses;
use web_time::Instant;

use super::lock::{LockMode, LockState, Reconcile};
use super::snapshot::Snapshot;
use super::stack::{Direction, HistoryStack};
use super::typing::{Boundary, KeyGroup, TypingConfig, TypingState};
use crate::config::EngineConfig;
use crate::error::CaptureError;
use crate::host::HostDocument;
use crate::notify::{Notification, Notifier, Subscription};

/// Snapshot-based undo/redo engine for one host document.
pub struct UndoManager<H> {
    host: H,
    stack: HistoryStack,
    current_image: Option<Snapshot>,
    has_undo: bool,
    has_redo: bool,
    lock: LockState,
    typing: TypingState,
    typing_config: TypingConfig,
    keys: KeyClasses,
    last_keydown_image: Option<Snapshot>,
    notifier: Notifier,
}

impl<H> fmt::Debug for UndoManager<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoManager")
            .field("len", &self.stack.len())
            .field("index", &self.stack.index())
            .field("limit", &self.stack.limit())
            .field("has_undo", &self.has_undo)
            .field("has_redo", &self.has_redo)
            .field("lock_depth", &self.lock.depth())
            .field("typing", &self.typing)
            .finish_non_exhaustive()
    }
}

impl<H: HostDocument> UndoManager<H> {
    /// Create a manager with default configuration.
    #[must_use]
    pub fn new(host: H) -> Self {
        Self::with_config(host, &EngineConfig::default())
    }

    /// Create a manager from an engine configuration.
    ///
    /// History starts empty; hosts usually call [`save`](Self::save) once the
    /// document is ready to record the initial state.
    #[must_use]
    pub fn with_config(host: H, config: &EngineConfig) -> Self {
        Self {
            host,
            stack: HistoryStack::new(config.history),
            current_image: None,
            has_undo: false,
            has_redo: false,
            lock: LockState::Unlocked,
            typing: TypingState::default(),
            typing_config: config.typing,
            keys: config.keys.clone(),
            last_keydown_image: None,
            notifier: Notifier::new(),
        }
    }

    // ========================================================================
    // Host access
    // ========================================================================

    /// The host document.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host document.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Register a notification callback.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&Notification) + 'static) -> Subscription {
        self.notifier.subscribe(callback)
    }

    fn capture_image(&mut self, content_only: bool) -> Option<Snapshot> {
        match Snapshot::capture(&mut self.host, &self.notifier, content_only) {
            Ok(image) => Some(image),
            Err(CaptureError::Unavailable) => {
                tracing::trace!(target: "rewind.undo", content_only, "capture unavailable");
                None
            }
            Err(err) => {
                tracing::warn!(target: "rewind.undo", error = %err, content_only, "capture failed");
                None
            }
        }
    }

    // ========================================================================
    // Save / update
    // ========================================================================

    /// Save the live state as a new step. Returns whether history changed.
    pub fn save(&mut self) -> bool {
        self.save_with(false, None, true)
    }

    /// Save only if the content changed; selection-only changes are ignored.
    pub fn save_content_only(&mut self) -> bool {
        self.save_with(true, None, true)
    }

    /// Save `image` (or a fresh full capture) against the current entry.
    ///
    /// - same content and selection: no-op;
    /// - same content, different selection: no-op when `content_only`,
    ///   otherwise the current entry is replaced in place;
    /// - different content: the redo future is dropped and `image` is pushed.
    ///
    /// With `auto_fire_change` the undo/redo flags are recomputed, the typing
    /// run is reset and observers are notified.
    pub fn save_with(
        &mut self,
        content_only: bool,
        image: Option<Snapshot>,
        auto_fire_change: bool,
    ) -> bool {
        if self.lock.is_locked() {
            tracing::trace!(target: "rewind.undo", "save skipped: locked");
            return false;
        }
        if !self.host.is_editable_and_ready() {
            tracing::trace!(target: "rewind.undo", "save skipped: host not ready");
            return false;
        }
        let _span = tracing::trace_span!("undo.save", content_only).entered();

        let Some(image) = image.or_else(|| self.capture_image(false)) else {
            return false;
        };

        if let Some(current) = &self.current_image {
            if image.equals_content(current) {
                if content_only || image.equals_selection(current) {
                    return false;
                }
                self.stack.replace_current(image.clone());
                self.current_image = Some(image);
                tracing::debug!(
                    target: "rewind.undo",
                    index = ?self.stack.index(),
                    outcome = "replaced",
                    "selection-only save"
                );
                if auto_fire_change {
                    self.fire_change();
                }
                return true;
            }
            if auto_fire_change {
                self.notifier.emit(&Notification::ContentChanged);
            }
        }

        self.stack.push(image.clone());
        self.current_image = Some(image);
        tracing::debug!(
            target: "rewind.undo",
            index = ?self.stack.index(),
            len = self.stack.len(),
            content_only,
            outcome = "pushed",
            "snapshot saved"
        );
        if auto_fire_change {
            self.fire_change();
        }
        true
    }

    /// Fold `image` (or a fresh full capture) into the current entry,
    /// collapsing the trailing run of entries with the current content.
    ///
    /// No-op while locked or when history is empty.
    pub fn update(&mut self, image: Option<Snapshot>) {
        if self.lock.is_locked() {
            return;
        }
        let (Some(index), Some(current)) = (self.stack.index(), self.current_image.clone()) else {
            tracing::trace!(target: "rewind.undo", "update skipped: empty history");
            return;
        };
        let Some(image) = image.or_else(|| self.capture_image(false)) else {
            return;
        };
        if let Some(at) = self.stack.amend(image.clone(), index, &current) {
            self.current_image = Some(image);
            tracing::debug!(
                target: "rewind.undo",
                from = index,
                index = at,
                len = self.stack.len(),
                "current entry updated"
            );
        }
    }

    /// [`update`](Self::update) the current entry if there is one.
    pub fn update_snapshot(&mut self) {
        if self.current_image.is_some() {
            self.update(None);
        }
    }

    fn fire_change(&mut self) {
        let (has_undo, has_redo) = match &self.current_image {
            Some(current) => (
                self.stack.nearest_distinct(Direction::Undo, current).is_some(),
                self.stack.nearest_distinct(Direction::Redo, current).is_some(),
            ),
            None => (false, false),
        };
        self.has_undo = has_undo;
        self.has_redo = has_redo;
        self.typing.reset();
        self.emit_history_changed();
    }

    fn emit_history_changed(&self) {
        self.notifier.emit(&Notification::HistoryChanged {
            undoable: self.undoable(),
            redoable: self.redoable(),
        });
    }

    // ========================================================================
    // Undo / redo
    // ========================================================================

    /// Whether [`undo`](Self::undo) would do something.
    #[must_use]
    pub fn undoable(&self) -> bool {
        self.is_enabled() && self.has_undo
    }

    /// Whether [`redo`](Self::redo) would do something.
    #[must_use]
    pub fn redoable(&self) -> bool {
        self.is_enabled() && self.has_redo
    }

    /// Step back to the nearest entry with different content.
    ///
    /// Unsaved live content is saved first so it can be redone.
    pub fn undo(&mut self) -> bool {
        if !self.undoable() {
            return false;
        }
        self.save_with(true, None, true);
        match self.neighbour(Direction::Undo) {
            Some(position) => self.restore(position, Direction::Undo),
            None => false,
        }
    }

    /// Step forward to the nearest entry with different content.
    ///
    /// Refused when the live content changed since the last step, since that
    /// change drops the redo future.
    pub fn redo(&mut self) -> bool {
        if !self.redoable() {
            return false;
        }
        self.save_with(true, None, true);
        if !self.redoable() {
            return false;
        }
        match self.neighbour(Direction::Redo) {
            Some(position) => self.restore(position, Direction::Redo),
            None => false,
        }
    }

    fn neighbour(&self, direction: Direction) -> Option<usize> {
        let current = self.current_image.as_ref()?;
        self.stack
            .nearest_distinct(direction, current)
            .map(|(position, _)| position)
    }

    fn restore(&mut self, position: usize, direction: Direction) -> bool {
        debug_assert!(
            position < self.stack.len(),
            "restore target {position} out of range (len {})",
            self.stack.len()
        );
        let Some(target) = self.stack.get(position).cloned() else {
            return false;
        };

        let start = Instant::now();
        let from = self.stack.index();
        let span = tracing::debug_span!(
            "undo.restore",
            ?direction,
            from = ?from,
            to = position,
            duration_us = tracing::field::Empty,
        )
        .entered();

        if target.has_selection() {
            self.host.focus();
        }

        // Loading content may make the host report edits; keep them out of
        // history until the target is in place. An outer lock survives.
        let outer = std::mem::replace(
            &mut self.lock,
            LockState::Locked {
                depth: 1,
                reconcile: Reconcile::Never,
            },
        );
        self.host.load_content(target.content());
        match target.bookmarks() {
            Some(bookmarks) => self.host.restore_selection(bookmarks),
            None => self.host.collapse_selection(),
        }
        self.lock = outer;

        self.stack.set_index(position);
        self.current_image = Some(target);
        self.update(None);
        self.fire_change();

        let duration_us = start.elapsed().as_micros() as u64;
        span.record("duration_us", duration_us);
        tracing::debug!(
            target: "rewind.undo",
            ?direction,
            index = ?self.stack.index(),
            duration_us,
            "snapshot restored"
        );

        self.notifier.emit(&Notification::ContentChanged);
        self.notifier.emit(&Notification::Restored(direction));
        true
    }

    // ========================================================================
    // Locking
    // ========================================================================

    /// Suppress snapshots until the matching [`unlock`](Self::unlock).
    ///
    /// Only the outermost call's `mode` is honoured.
    pub fn lock(&mut self, mode: LockMode) {
        if self.lock.is_locked() {
            self.lock.acquire(|| Reconcile::Never);
        } else {
            let reconcile = self.reconcile_for(mode);
            self.lock.acquire(move || reconcile);
        }
        tracing::trace!(target: "rewind.undo", depth = self.lock.depth(), ?mode, "lock");
    }

    fn reconcile_for(&mut self, mode: LockMode) -> Reconcile {
        match mode {
            LockMode::DontUpdate => Reconcile::Never,
            LockMode::ForceUpdate => Reconcile::Always,
            LockMode::Default => match (self.capture_image(true), &self.current_image) {
                (Some(before), Some(current)) if current.equals_content(&before) => {
                    Reconcile::IfChanged(before)
                }
                _ => Reconcile::Never,
            },
        }
    }

    /// Release one lock level; the last release reconciles the current entry
    /// as decided by the outermost [`lock`](Self::lock).
    pub fn unlock(&mut self) {
        let Some(reconcile) = self.lock.release() else {
            tracing::trace!(target: "rewind.undo", depth = self.lock.depth(), "unlock");
            return;
        };
        tracing::trace!(target: "rewind.undo", ?reconcile, "final unlock");
        match reconcile {
            Reconcile::Never => {}
            Reconcile::Always => self.update(None),
            Reconcile::IfChanged(before) => {
                if self
                    .capture_image(true)
                    .is_some_and(|after| !before.equals_content(&after))
                {
                    self.update(None);
                }
            }
        }
    }

    /// Run `f` with the manager locked in `mode`.
    pub fn with_lock<R>(&mut self, mode: LockMode, f: impl FnOnce(&mut Self) -> R) -> R {
        self.lock(mode);
        let result = f(self);
        self.unlock();
        result
    }

    /// Whether any lock is outstanding.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    /// Number of outstanding locks.
    #[must_use]
    pub fn lock_depth(&self) -> u32 {
        self.lock.depth()
    }

    // ========================================================================
    // Typing and navigation
    // ========================================================================

    /// Record one text-changing keystroke.
    ///
    /// Switching between typing and deleting saves the pre-edit image from
    /// the last key-down. Reaching the run threshold saves the post-edit
    /// state.
    pub fn type_key(&mut self, code: KeyCode) {
        let group = if self.keys.is_functional(code) {
            KeyGroup::Functional
        } else {
            KeyGroup::Type
        };

        if !self.typing.is_typing() {
            self.on_typing_start();
        }

        let stroke = self.typing.begin(group, self.typing_config.threshold);
        match stroke.boundary {
            Some(Boundary::GroupChanged) => {
                let image = self.last_keydown_image.clone();
                if !self.save_with(false, image, false) {
                    self.stack.truncate_future();
                }
            }
            Some(Boundary::Threshold) => {
                self.save();
                self.typing.start();
            }
            None => {}
        }
        tracing::trace!(
            target: "rewind.undo",
            ?code,
            ?group,
            count = stroke.count,
            boundary = ?stroke.boundary,
            "keystroke"
        );

        self.typing.commit(group, stroke.count);
        self.notifier.emit(&Notification::ContentChanged);
    }

    fn on_typing_start(&mut self) {
        self.typing.start();
        self.has_undo = true;
        self.has_redo = false;
        self.emit_history_changed();
    }

    /// Handle cursor movement.
    ///
    /// Unless `skip_content_compare` is set, a content change is saved as a
    /// new step first. Otherwise the current entry's selection is amended.
    /// The typing run ends either way.
    pub fn on_navigation_key(&mut self, skip_content_compare: bool) {
        if !skip_content_compare && self.save_with(true, None, false) {
            self.fire_change();
        } else if let Some(image) = self.capture_image(false) {
            self.amend_selection(image);
        }
        self.typing.reset();
    }

    /// Replace the current entry with `image` if it has the same content but
    /// a different selection.
    pub fn amend_selection(&mut self, image: Snapshot) -> bool {
        if self.lock.is_locked() {
            return false;
        }
        let Some(current) = self.stack.current() else {
            return false;
        };
        if !current.equals_content(&image) || current.equals_selection(&image) {
            return false;
        }
        self.stack.replace_current(image.clone());
        self.current_image = Some(image);
        tracing::trace!(target: "rewind.undo", index = ?self.stack.index(), "selection amended");
        true
    }

    /// Capture the pre-edit image for the keystroke being pressed.
    pub fn capture_keydown_image(&mut self) {
        self.last_keydown_image = self.capture_image(false);
    }

    /// Close a running typing run by saving the last key-down image.
    ///
    /// Returns `false` when no keystrokes were pending.
    pub fn commit_typing_run(&mut self) -> bool {
        if !self.typing.has_strokes() {
            return false;
        }
        let image = self.last_keydown_image.clone();
        let saved = self.save_with(false, image, true);
        self.typing.reset();
        saved
    }

    /// Whether the live content still equals the last key-down image.
    pub fn keydown_matches_live_content(&mut self) -> bool {
        let Some(before) = self.last_keydown_image.clone() else {
            return false;
        };
        self.capture_image(true)
            .is_some_and(|now| before.equals_content(&now))
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Drop all history and transient state.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.current_image = None;
        self.has_undo = false;
        self.has_redo = false;
        self.lock = LockState::Unlocked;
        self.typing.reset();
        self.last_keydown_image = None;
        tracing::debug!(target: "rewind.undo", "history reset");
    }

    /// [`reset`](Self::reset), then record the live state as the first step.
    pub fn reset_undo(&mut self) -> bool {
        self.reset();
        self.save()
    }

    /// Save around a host command. Commands that opt out of undo, or a
    /// disabled manager, record nothing.
    pub fn record_command(&mut self, can_undo: bool) -> bool {
        self.is_enabled() && can_undo && self.save()
    }

    /// Announce undo/redo availability after the host toggled its editable
    /// mode or read-only state.
    pub fn refresh_enabled(&mut self) {
        tracing::debug!(target: "rewind.undo", enabled = self.is_enabled(), "enabled refreshed");
        self.emit_history_changed();
    }

    /// Save unsaved content before the host leaves its editable mode.
    pub fn before_mode_unload(&mut self) -> bool {
        self.host.is_editable_and_ready() && self.save_content_only()
    }

    /// Whether undo/redo are currently allowed by the host: it is in its
    /// editable mode and not read-only. Read live on every call.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.host.is_read_only() && self.host.is_editable_and_ready()
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Number of history entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Whether history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Cursor position.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.stack.index()
    }

    /// History capacity.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.stack.limit()
    }

    /// The entry the document currently corresponds to.
    #[must_use]
    pub fn current_image(&self) -> Option<&Snapshot> {
        self.current_image.as_ref()
    }

    /// History entries from oldest to newest.
    pub fn snapshots(&self) -> impl ExactSizeIterator<Item = &Snapshot> + '_ {
        self.stack.iter()
    }

    /// Keystroke coalescing state.
    #[must_use]
    pub fn typing_state(&self) -> &TypingState {
        &self.typing
    }

    /// Key classification table in use.
    #[must_use]
    pub fn key_classes(&self) -> &KeyClasses {
        &self.keys
    }

    /// Image captured at the last key-down.
    #[must_use]
    pub fn last_keydown_image(&self) -> Option<&Snapshot> {
        self.last_keydown_image.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::test_support::TestDoc;
    use crate::undo::stack::HistoryConfig;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Manager = UndoManager<TestDoc>;

    fn manager(content: &str) -> Manager {
        UndoManager::new(TestDoc::new(content))
    }

    fn saved(content: &str) -> Manager {
        let mut m = manager(content);
        assert!(m.save());
        m
    }

    fn edit(m: &mut Manager, content: &str) {
        m.host_mut().set(content);
    }

    fn commit(m: &mut Manager, content: &str) {
        edit(m, content);
        assert!(m.save(), "save of {content:?} should push");
    }

    fn contents(m: &Manager) -> Vec<String> {
        m.snapshots().map(|s| s.content().to_string()).collect()
    }

    fn live(m: &Manager) -> &str {
        &m.host().content
    }

    /// Key-down capture, host edit, key-up classification.
    fn keystroke(m: &mut Manager, code: KeyCode) {
        m.capture_keydown_image();
        let mut next = m.host().content.clone();
        match code {
            KeyCode::Char(c) => next.push(c),
            KeyCode::Backspace => {
                next.pop();
            }
            _ => {}
        }
        edit(m, &next);
        m.type_key(code);
    }

    fn record(m: &Manager) -> (Rc<RefCell<Vec<Notification>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let sub = m.subscribe(move |n| l.borrow_mut().push(*n));
        (log, sub)
    }

    fn assert_current_matches_index(m: &Manager) {
        match m.index() {
            None => assert!(m.current_image().is_none()),
            Some(i) => assert_eq!(m.snapshots().nth(i), m.current_image()),
        }
    }

    // =====================================================================
    // Save
    // =====================================================================

    #[test]
    fn first_save_records_initial_state() {
        let m = saved("A");
        assert_eq!(contents(&m), ["A"]);
        assert_eq!(m.index(), Some(0));
        assert!(!m.undoable());
        assert!(!m.redoable());
        assert_current_matches_index(&m);
    }

    #[test]
    fn distinct_content_pushes() {
        let mut m = saved("A");
        commit(&mut m, "B");
        assert_eq!(contents(&m), ["A", "B"]);
        assert!(m.undoable());
        assert!(!m.redoable());
    }

    #[test]
    fn duplicate_save_is_noop() {
        let mut m = saved("A");
        let before: Vec<Snapshot> = m.snapshots().cloned().collect();
        assert!(!m.save());
        let after: Vec<Snapshot> = m.snapshots().cloned().collect();
        assert_eq!(before, after);
        assert_eq!(m.index(), Some(0));
    }

    #[test]
    fn selection_only_full_save_replaces_in_place() {
        let mut m = saved("A");
        m.host_mut().caret(1);
        assert!(m.save());
        assert_eq!(m.len(), 1);
        let top = m.current_image().unwrap();
        assert_eq!(top.bookmarks().unwrap()[0].start_offset, 1);
        assert_current_matches_index(&m);
    }

    #[test]
    fn selection_only_content_save_is_noop() {
        let mut m = saved("A");
        m.host_mut().caret(1);
        assert!(!m.save_content_only());
        assert_eq!(m.current_image().unwrap().bookmarks().unwrap()[0].start_offset, 0);
    }

    #[test]
    fn save_respects_host_state() {
        let mut m = manager("A");
        m.host_mut().ready = false;
        assert!(!m.save());
        m.host_mut().ready = true;
        m.host_mut().unavailable = true;
        assert!(!m.save());
        m.host_mut().unavailable = false;
        m.host_mut().fail_next = Some(HostError::new("detached"));
        assert!(!m.save());
        assert!(m.is_empty());
        assert!(m.save());
        assert_eq!(contents(&m), ["A"]);
    }

    #[test]
    fn save_notifies_content_then_history() {
        let mut m = saved("A");
        let (log, _sub) = record(&m);
        commit(&mut m, "B");
        assert_eq!(
            *log.borrow(),
            vec![
                Notification::BeforeCapture,
                Notification::AfterCapture,
                Notification::ContentChanged,
                Notification::HistoryChanged {
                    undoable: true,
                    redoable: false
                },
            ]
        );
    }

    #[test]
    fn precomputed_content_only_image_is_accepted() {
        let mut m = manager("live");
        assert!(m.save_with(false, Some(Snapshot::content_only("given")), true));
        assert_eq!(contents(&m), ["given"]);
        assert!(!m.current_image().unwrap().has_selection());
    }

    // =====================================================================
    // Bounded history
    // =====================================================================

    #[test]
    fn limit_three_scenario() {
        let config = EngineConfig {
            history: HistoryConfig::new(3),
            ..EngineConfig::default()
        };
        let mut m = UndoManager::with_config(TestDoc::new("A"), &config);
        assert!(m.save());
        for s in ["B", "C", "D"] {
            commit(&mut m, s);
        }
        assert_eq!(contents(&m), ["B", "C", "D"]);
        assert_eq!(m.index(), Some(2));
        assert!(m.undoable());

        assert!(m.undo());
        assert!(m.undo());
        assert_eq!(live(&m), "B");
        assert_eq!(m.current_image().unwrap().content(), "B");
        assert!(!m.undoable());
        assert_current_matches_index(&m);
    }

    // =====================================================================
    // Undo / redo
    // =====================================================================

    #[test]
    fn undo_redo_round_trip() {
        let mut m = saved("A");
        commit(&mut m, "B");
        commit(&mut m, "C");

        assert!(m.undo());
        assert!(m.undo());
        assert_eq!(live(&m), "A");
        assert!(!m.undoable());
        assert!(!m.undo());

        assert!(m.redo());
        assert!(m.redo());
        assert_eq!(live(&m), "C");
        assert!(!m.redoable());
        assert!(!m.redo());
        assert_eq!(contents(&m), ["A", "B", "C"]);
    }

    #[test]
    fn new_edit_after_undo_drops_redo() {
        let mut m = saved("A");
        commit(&mut m, "B");
        commit(&mut m, "C");
        assert!(m.undo());
        commit(&mut m, "X");
        assert_eq!(contents(&m), ["A", "B", "X"]);
        assert!(!m.redoable());
    }

    #[test]
    fn redo_refused_after_live_change() {
        let mut m = saved("A");
        commit(&mut m, "B");
        assert!(m.undo());
        edit(&mut m, "Z");
        assert!(!m.redo());
        assert_eq!(contents(&m), ["A", "Z"]);
        assert_eq!(live(&m), "Z");
    }

    #[test]
    fn undo_saves_unsaved_edit_for_redo() {
        let mut m = saved("A");
        commit(&mut m, "B");
        edit(&mut m, "BC");
        assert!(m.undo());
        assert_eq!(live(&m), "B");
        assert!(m.redo());
        assert_eq!(live(&m), "BC");
    }

    #[test]
    fn restore_focuses_and_applies_bookmarks() {
        let mut m = saved("A");
        commit(&mut m, "BB");
        assert!(m.undo());
        let host = m.host();
        assert_eq!(host.loads, ["A"]);
        assert_eq!(host.focus_calls, 1);
        assert_eq!(host.collapse_calls, 0);
        assert_eq!(host.caret_offset(), Some(0));
    }

    #[test]
    fn restore_without_bookmarks_collapses_selection() {
        let mut m = manager("live");
        assert!(m.save_with(false, Some(Snapshot::content_only("X")), true));
        commit(&mut m, "Y");
        assert!(m.undo());
        assert_eq!(m.host().focus_calls, 0);
        assert_eq!(m.host().collapse_calls, 1);
        assert_eq!(live(&m), "X");
    }

    #[test]
    fn undo_notification_sequence() {
        let mut m = saved("A");
        commit(&mut m, "B");
        let (log, _sub) = record(&m);
        assert!(m.undo());
        assert_eq!(
            *log.borrow(),
            vec![
                Notification::BeforeCapture,
                Notification::AfterCapture,
                Notification::BeforeCapture,
                Notification::AfterCapture,
                Notification::HistoryChanged {
                    undoable: false,
                    redoable: true
                },
                Notification::ContentChanged,
                Notification::Restored(Direction::Undo),
            ]
        );
    }

    #[test]
    fn undo_ignores_selection_of_current_entry() {
        let mut m = saved("A");
        commit(&mut m, "B");
        let variant = Snapshot::new("B", Some(vec![]));
        assert!(m.save_with(false, Some(variant), true));
        assert_eq!(m.len(), 2);
        assert!(m.undo());
        assert_eq!(live(&m), "A");
    }

    #[test]
    fn read_only_host_disables_undo() {
        let mut doc = TestDoc::new("A");
        doc.read_only = true;
        let mut m = UndoManager::new(doc);
        assert!(m.save());
        commit(&mut m, "B");
        assert!(!m.is_enabled());
        assert!(!m.undoable());
        assert!(!m.undo());
        assert_eq!(live(&m), "B");

        let (log, _sub) = record(&m);
        m.host_mut().read_only = false;
        assert!(m.undoable());
        m.refresh_enabled();
        assert_eq!(
            *log.borrow(),
            vec![Notification::HistoryChanged {
                undoable: true,
                redoable: false
            }]
        );
    }

    #[test]
    fn host_turning_read_only_blocks_undo_and_redo() {
        let mut m = saved("A");
        commit(&mut m, "B");
        m.host_mut().read_only = true;
        assert!(!m.undoable());
        assert!(!m.undo());
        assert_eq!(live(&m), "B");
        assert_eq!(m.index(), Some(1));

        m.host_mut().read_only = false;
        assert!(m.undo());
        m.host_mut().read_only = true;
        assert!(!m.redoable());
        assert!(!m.redo());
        assert_eq!(live(&m), "A");
        assert_eq!(m.index(), Some(0));
    }

    #[test]
    fn host_leaving_editable_mode_blocks_undo_and_redo() {
        let mut m = saved("A");
        commit(&mut m, "B");
        m.host_mut().ready = false;
        assert!(!m.is_enabled());
        assert!(!m.undo());
        assert_eq!(m.host().loads, Vec::<String>::new());

        m.host_mut().ready = true;
        assert!(m.undo());
        m.host_mut().ready = false;
        assert!(!m.redo());
        assert_eq!(m.host().loads, ["A"]);
        assert_eq!(live(&m), "A");
    }

    // =====================================================================
    // Update
    // =====================================================================

    #[test]
    fn update_folds_live_state_into_current_entry() {
        let mut m = saved("A");
        commit(&mut m, "B");
        edit(&mut m, "B2");
        m.update(None);
        assert_eq!(contents(&m), ["A", "B2"]);
        assert_eq!(m.index(), Some(1));
        assert_current_matches_index(&m);
    }

    #[test]
    fn update_on_empty_history_is_noop() {
        let mut m = manager("A");
        m.update(None);
        m.update_snapshot();
        assert!(m.is_empty());
        assert!(m.current_image().is_none());
    }

    #[test]
    fn update_snapshot_amends_when_history_exists() {
        let mut m = saved("A");
        edit(&mut m, "A+");
        m.update_snapshot();
        assert_eq!(contents(&m), ["A+"]);
    }

    // =====================================================================
    // Locking
    // =====================================================================

    #[test]
    fn lock_suppresses_save_and_update() {
        let mut m = saved("A");
        m.lock(LockMode::Default);
        edit(&mut m, "B");
        assert!(!m.save());
        m.update(None);
        m.host_mut().caret(0);
        m.on_navigation_key(true);
        assert_eq!(contents(&m), ["A"]);
        assert_eq!(m.current_image().unwrap().bookmarks().unwrap()[0].start_offset, 0);
        m.unlock();
        assert_eq!(contents(&m), ["B"]);
        assert!(!m.is_locked());
    }

    #[test]
    fn default_lock_without_change_leaves_history() {
        let mut m = saved("A");
        m.lock(LockMode::Default);
        m.host_mut().caret(1);
        m.unlock();
        assert_eq!(m.current_image().unwrap().bookmarks().unwrap()[0].start_offset, 0);
    }

    #[test]
    fn default_lock_with_unsaved_edit_never_reconciles() {
        let mut m = saved("A");
        edit(&mut m, "B");
        m.lock(LockMode::Default);
        edit(&mut m, "C");
        m.unlock();
        assert_eq!(contents(&m), ["A"]);
    }

    #[test]
    fn dont_update_lock_ignores_changes() {
        let mut m = saved("A");
        m.with_lock(LockMode::DontUpdate, |m| edit(m, "B"));
        assert_eq!(contents(&m), ["A"]);
    }

    #[test]
    fn force_update_lock_always_updates() {
        let mut m = saved("A");
        m.with_lock(LockMode::ForceUpdate, |m| m.host_mut().caret(1));
        assert_eq!(m.current_image().unwrap().bookmarks().unwrap()[0].start_offset, 1);
    }

    #[test]
    fn nested_locks_follow_outermost_mode() {
        let mut m = saved("A");
        m.lock(LockMode::DontUpdate);
        m.lock(LockMode::ForceUpdate);
        assert_eq!(m.lock_depth(), 2);
        edit(&mut m, "B");
        m.unlock();
        assert!(m.is_locked());
        m.unlock();
        assert_eq!(m.lock_depth(), 0);
        assert_eq!(contents(&m), ["A"]);

        m.unlock();
        assert_eq!(m.lock_depth(), 0);
    }

    #[test]
    fn with_lock_returns_closure_value() {
        let mut m = saved("A");
        let saved_inside = m.with_lock(LockMode::Default, |m| {
            edit(m, "B");
            m.save()
        });
        assert!(!saved_inside);
        assert_eq!(contents(&m), ["B"]);
    }

    #[test]
    fn undo_inside_outer_lock_keeps_lock() {
        let mut m = saved("A");
        commit(&mut m, "B");
        m.lock(LockMode::DontUpdate);
        assert!(m.undo());
        assert_eq!(live(&m), "A");
        assert_eq!(m.lock_depth(), 1);
        m.unlock();
        assert!(!m.is_locked());
    }

    // =====================================================================
    // Typing
    // =====================================================================

    #[test]
    fn typing_run_below_threshold_does_not_push() {
        let mut m = saved("");
        for c in "abcdefghijklmnopqrstuvwx".chars() {
            keystroke(&mut m, KeyCode::Char(c));
        }
        assert_eq!(m.len(), 1);
        assert!(m.undoable());
        assert_eq!(m.typing_state().strokes(KeyGroup::Type), 24);
    }

    #[test]
    fn threshold_keystroke_saves_post_edit_state() {
        let mut m = saved("");
        let text: String = ('a'..='y').collect();
        for c in text.chars() {
            keystroke(&mut m, KeyCode::Char(c));
        }
        assert_eq!(contents(&m), ["", text.as_str()]);
        assert!(m.typing_state().is_typing());
        assert_eq!(m.typing_state().strokes(KeyGroup::Type), 0);
    }

    #[test]
    fn group_switch_saves_pre_edit_image() {
        let mut m = saved("A");
        keystroke(&mut m, KeyCode::Char('b'));
        keystroke(&mut m, KeyCode::Char('c'));
        keystroke(&mut m, KeyCode::Backspace);
        assert_eq!(contents(&m), ["A", "Abc"]);
        assert_eq!(live(&m), "Ab");

        assert!(m.undo());
        assert_eq!(live(&m), "Abc");
        assert!(m.undo());
        assert_eq!(live(&m), "A");
    }

    #[test]
    fn typing_start_notifies_then_every_key_changes_content() {
        let mut m = saved("A");
        m.capture_keydown_image();
        edit(&mut m, "Ab");
        let (log, _sub) = record(&m);
        m.type_key(KeyCode::Char('b'));
        m.type_key(KeyCode::Char('c'));
        assert_eq!(
            *log.borrow(),
            vec![
                Notification::HistoryChanged {
                    undoable: true,
                    redoable: false
                },
                Notification::ContentChanged,
                Notification::ContentChanged,
            ]
        );
    }

    #[test]
    fn undo_after_typing_restores_pre_typing_state() {
        let mut m = saved("A");
        keystroke(&mut m, KeyCode::Char('b'));
        keystroke(&mut m, KeyCode::Char('c'));
        assert!(m.undo());
        assert_eq!(live(&m), "A");
        assert!(m.redo());
        assert_eq!(live(&m), "Abc");
    }

    #[test]
    fn commit_typing_run_saves_keydown_image() {
        let mut m = saved("A");
        keystroke(&mut m, KeyCode::Char('b'));
        m.capture_keydown_image();
        assert!(m.commit_typing_run());
        assert_eq!(contents(&m), ["A", "Ab"]);
        assert!(!m.typing_state().has_strokes());
        assert!(!m.commit_typing_run());
    }

    #[test]
    fn keydown_image_comparison() {
        let mut m = saved("A");
        assert!(!m.keydown_matches_live_content());
        m.capture_keydown_image();
        assert!(m.keydown_matches_live_content());
        edit(&mut m, "AB");
        assert!(!m.keydown_matches_live_content());
    }

    // =====================================================================
    // Navigation
    // =====================================================================

    #[test]
    fn navigation_amends_selection_without_growing() {
        let mut m = saved("ABC");
        m.host_mut().caret(2);
        m.on_navigation_key(false);
        assert_eq!(m.len(), 1);
        assert_eq!(m.current_image().unwrap().bookmarks().unwrap()[0].start_offset, 2);
        assert_current_matches_index(&m);
    }

    #[test]
    fn navigation_saves_changed_content() {
        let mut m = saved("A");
        edit(&mut m, "AB");
        m.on_navigation_key(false);
        assert_eq!(contents(&m), ["A", "AB"]);
        assert!(m.undoable());
    }

    #[test]
    fn navigation_amends_entry_under_cursor() {
        let mut m = saved("A");
        commit(&mut m, "B");
        assert!(m.undo());
        m.host_mut().caret(1);
        m.on_navigation_key(false);
        assert_eq!(contents(&m), ["A", "B"]);
        assert_eq!(m.snapshots().next().unwrap().bookmarks().unwrap()[0].start_offset, 1);
        assert!(m.redoable());
    }

    #[test]
    fn amend_selection_rejects_content_change() {
        let mut m = saved("A");
        assert!(!m.amend_selection(Snapshot::content_only("B")));
        let same = m.current_image().cloned().unwrap();
        assert!(!m.amend_selection(same));
    }

    // =====================================================================
    // Lifecycle
    // =====================================================================

    #[test]
    fn reset_and_reset_undo() {
        let mut m = saved("A");
        commit(&mut m, "B");
        m.lock(LockMode::Default);
        m.reset();
        assert!(m.is_empty());
        assert_eq!(m.index(), None);
        assert!(m.current_image().is_none());
        assert!(!m.undoable());
        assert!(!m.is_locked());

        assert!(m.reset_undo());
        assert_eq!(contents(&m), ["B"]);
    }

    #[test]
    fn record_command_respects_opt_out() {
        let mut m = saved("A");
        edit(&mut m, "B");
        assert!(!m.record_command(false));
        assert!(m.record_command(true));
        assert_eq!(contents(&m), ["A", "B"]);
    }

    #[test]
    fn before_mode_unload_saves_content() {
        let mut m = saved("A");
        edit(&mut m, "B");
        assert!(m.before_mode_unload());
        assert_eq!(contents(&m), ["A", "B"]);
        edit(&mut m, "C");
        m.host_mut().ready = false;
        assert!(!m.before_mode_unload());
    }

    #[test]
    fn debug_output_summarizes_state() {
        let m = saved("A");
        let s = format!("{m:?}");
        assert!(s.contains("UndoManager"));
        assert!(s.contains("len: 1"));
    }

    // =====================================================================
    // Tracing
    // =====================================================================

    mod tracing_capture {
        use super::*;
        use std::sync::{Arc, Mutex};
        use tracing_subscriber::layer::SubscriberExt;

        #[derive(Debug, Clone)]
        struct Captured {
            name: String,
            target: String,
            level: tracing::Level,
            fields: Vec<String>,
        }

        struct Recorder {
            spans: Arc<Mutex<Vec<Captured>>>,
            events: Arc<Mutex<Vec<Captured>>>,
        }

        impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Recorder {
            fn on_new_span(
                &self,
                attrs: &tracing::span::Attributes<'_>,
                _id: &tracing::span::Id,
                _ctx: tracing_subscriber::layer::Context<'_, S>,
            ) {
                let meta = attrs.metadata();
                self.spans.lock().unwrap().push(Captured {
                    name: meta.name().to_string(),
                    target: meta.target().to_string(),
                    level: *meta.level(),
                    fields: meta.fields().iter().map(|f| f.name().to_string()).collect(),
                });
            }

            fn on_event(
                &self,
                event: &tracing::Event<'_>,
                _ctx: tracing_subscriber::layer::Context<'_, S>,
            ) {
                let meta = event.metadata();
                self.events.lock().unwrap().push(Captured {
                    name: meta.name().to_string(),
                    target: meta.target().to_string(),
                    level: *meta.level(),
                    fields: meta.fields().iter().map(|f| f.name().to_string()).collect(),
                });
            }
        }

        fn capture(f: impl FnOnce()) -> (Vec<Captured>, Vec<Captured>) {
            let spans = Arc::new(Mutex::new(Vec::new()));
            let events = Arc::new(Mutex::new(Vec::new()));
            let subscriber = tracing_subscriber::registry().with(Recorder {
                spans: Arc::clone(&spans),
                events: Arc::clone(&events),
            });
            tracing::subscriber::with_default(subscriber, f);
            let spans = spans.lock().unwrap().clone();
            let events = events.lock().unwrap().clone();
            (spans, events)
        }

        #[test]
        fn restore_runs_in_span_with_duration() {
            let (spans, events) = capture(|| {
                let mut m = saved("A");
                commit(&mut m, "B");
                assert!(m.undo());
            });
            let restore = spans
                .iter()
                .find(|s| s.name == "undo.restore")
                .expect("undo.restore span");
            for field in ["direction", "from", "to", "duration_us"] {
                assert!(restore.fields.iter().any(|f| f == field), "missing {field}");
            }
            assert!(
                events
                    .iter()
                    .any(|e| e.target == "rewind.undo" && e.fields.iter().any(|f| f == "duration_us"))
            );
        }

        #[test]
        fn host_failure_logs_warning() {
            let (_, events) = capture(|| {
                let mut m = manager("A");
                m.host_mut().fail_next = Some(HostError::new("detached"));
                assert!(!m.save());
            });
            assert!(events.iter().any(|e| {
                e.target == "rewind.undo"
                    && e.level == tracing::Level::WARN
                    && e.fields.iter().any(|f| f == "error")
            }));
        }
    }
}
