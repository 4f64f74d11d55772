#![forbid(unsafe_code)]

//! Test rig bundling a manager, an input classifier and a notification log.
//!
//! The rig plays the host's part of the event protocol: for each simulated
//! keystroke it delivers key-down, applies the edit to the
//! [`MemoryDocument`], reports text input if the text changed, then
//! delivers key-up. Tests and the replay CLI drive the engine through it the
//! same way a real editing surface would.

use std::cell::RefCell;
use std::rc::Rc;

use rewind_core::{InputEvent, KeyCode, KeyStroke, Modifiers};
use rewind_runtime::undo::Snapshot;
use rewind_runtime::{
    EngineConfig, InputHandler, KeyDisposition, Notification, Subscription, UndoManager,
};

use crate::document::MemoryDocument;

/// Manager + classifier + recorded notifications for one document.
pub struct Rig {
    manager: UndoManager<MemoryDocument>,
    input: InputHandler,
    log: Rc<RefCell<Vec<Notification>>>,
    _subscription: Subscription,
}

impl std::fmt::Debug for Rig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rig")
            .field("manager", &self.manager)
            .field("input", &self.input)
            .field("notifications", &self.log.borrow().len())
            .finish()
    }
}

impl Rig {
    /// Rig over `doc` with the given configuration. History starts empty.
    #[must_use]
    pub fn new(doc: MemoryDocument, config: &EngineConfig) -> Self {
        let manager = UndoManager::with_config(doc, config);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let subscription = manager.subscribe(move |n| sink.borrow_mut().push(*n));
        Self {
            manager,
            input: InputHandler::new(config.input.clone()),
            log,
            _subscription: subscription,
        }
    }

    /// Rig over `text` with default configuration and the initial state saved.
    #[must_use]
    pub fn with_text(text: &str) -> Self {
        let mut rig = Self::new(MemoryDocument::new(text), &EngineConfig::default());
        rig.manager.save();
        rig
    }

    /// The undo manager.
    #[must_use]
    pub fn manager(&self) -> &UndoManager<MemoryDocument> {
        &self.manager
    }

    /// Mutable access to the undo manager.
    pub fn manager_mut(&mut self) -> &mut UndoManager<MemoryDocument> {
        &mut self.manager
    }

    /// The input classifier.
    #[must_use]
    pub fn input(&self) -> &InputHandler {
        &self.input
    }

    /// The document.
    #[must_use]
    pub fn doc(&self) -> &MemoryDocument {
        self.manager.host()
    }

    /// Mutable access to the document, bypassing the input protocol.
    pub fn doc_mut(&mut self) -> &mut MemoryDocument {
        self.manager.host_mut()
    }

    /// Current document text.
    #[must_use]
    pub fn text(&self) -> &str {
        self.doc().text()
    }

    /// Content of every history entry, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.manager
            .snapshots()
            .map(|s| s.content().to_string())
            .collect()
    }

    /// The entry under the history cursor.
    #[must_use]
    pub fn current(&self) -> Option<&Snapshot> {
        self.manager.current_image()
    }

    /// Notifications received so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.log.borrow().clone()
    }

    /// Forget recorded notifications.
    pub fn clear_notifications(&mut self) {
        self.log.borrow_mut().clear();
    }

    /// Deliver a raw event.
    pub fn event(&mut self, event: &InputEvent) -> KeyDisposition {
        self.input.handle(&mut self.manager, event)
    }

    /// Press and release a key, applying its edit to the document.
    pub fn key(&mut self, stroke: impl Into<KeyStroke>) -> KeyDisposition {
        let stroke = stroke.into();
        let disposition = self.event(&InputEvent::KeyDown(stroke));
        let edits = disposition == KeyDisposition::Pass
            && !stroke
                .modifiers
                .intersects(Modifiers::CTRL | Modifiers::ALT | Modifiers::SUPER);
        if edits && self.apply(stroke.code) {
            self.event(&InputEvent::Input);
        }
        self.event(&InputEvent::key_up(stroke.code));
        disposition
    }

    /// Type every character of `text` as its own keystroke.
    pub fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.key(KeyCode::Char(c));
        }
    }

    /// Press a key `n` times.
    pub fn repeat(&mut self, code: KeyCode, n: usize) {
        for _ in 0..n {
            self.key(code);
        }
    }

    /// Paste `text` with Ctrl+V.
    ///
    /// Like a clipboard integration, the rig saves before and after the
    /// insertion so the paste becomes its own step.
    pub fn paste(&mut self, text: &str) {
        let v = KeyStroke::ctrl(KeyCode::Char('v'));
        self.event(&InputEvent::KeyDown(v));
        self.event(&InputEvent::Paste);
        self.manager.save();
        self.doc_mut().insert(text);
        self.event(&InputEvent::Input);
        self.manager.save();
        self.event(&InputEvent::key_up(v.code));
    }

    /// Drop `text` at `offset` with the pointer, saved as its own step.
    pub fn drop_text(&mut self, text: &str, offset: usize) {
        self.event(&InputEvent::Drop);
        self.manager.save();
        self.doc_mut().set_cursor(offset);
        self.doc_mut().insert(text);
        self.event(&InputEvent::Input);
        self.manager.save();
    }

    /// Click at `offset`.
    pub fn click(&mut self, offset: usize) {
        self.doc_mut().set_cursor(offset);
        self.event(&InputEvent::Click);
    }

    /// Ctrl+Z.
    pub fn undo_key(&mut self) -> KeyDisposition {
        self.key(KeyStroke::ctrl(KeyCode::Char('z')))
    }

    /// Ctrl+Y.
    pub fn redo_key(&mut self) -> KeyDisposition {
        self.key(KeyStroke::ctrl(KeyCode::Char('y')))
    }

    fn apply(&mut self, code: KeyCode) -> bool {
        let doc = self.manager.host_mut();
        match code {
            KeyCode::Char(c) => {
                doc.insert(c.encode_utf8(&mut [0; 4]));
                true
            }
            KeyCode::Enter => {
                doc.insert("\n");
                true
            }
            KeyCode::Tab => {
                doc.insert("\t");
                true
            }
            KeyCode::Backspace => doc.backspace(),
            KeyCode::Delete => doc.delete_forward(),
            KeyCode::Left => {
                doc.move_left();
                false
            }
            KeyCode::Right => {
                doc.move_right();
                false
            }
            KeyCode::Home | KeyCode::Up | KeyCode::PageUp => {
                doc.home();
                false
            }
            KeyCode::End | KeyCode::Down | KeyCode::PageDown => {
                doc.end();
                false
            }
            _ => false,
        }
    }
}
