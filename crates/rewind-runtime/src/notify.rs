#![forbid(unsafe_code)]

//! Notification fan-out from the undo engine to host observers.
//!
//! # Design
//!
//! [`Notifier`] keeps an ordered subscriber list. Each subscriber is held as
//! a `Weak` reference; the strong `Rc` lives in the [`Subscription`] guard
//! handed back to the caller. Dropping the guard unsubscribes, and dead
//! entries are pruned lazily on the next [`emit`](Notifier::emit).
//!
//! Emission is synchronous and runs in registration order on the thread that
//! triggered the engine operation, so observers see notifications in exactly
//! the order the engine produced them.
//!
//! # Failure Modes
//!
//! - **Re-entrant engine call**: subscribers only receive `&Notification`;
//!   they cannot reach the manager, which is mutably borrowed for the whole
//!   operation. Hosts that want to react by saving must queue the request
//!   and run it after the current operation returns.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::undo::stack::Direction;

/// Something the engine wants the host to know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// A snapshot is about to be captured; flush pending document state.
    BeforeCapture,
    /// Snapshot capture finished (successfully or not).
    AfterCapture,
    /// The document content changed (generic signal, may over-fire).
    ContentChanged,
    /// Undo/redo availability may have changed.
    HistoryChanged {
        /// Current value of `undoable()`.
        undoable: bool,
        /// Current value of `redoable()`.
        redoable: bool,
    },
    /// A snapshot was restored by undo or redo.
    Restored(Direction),
}

type CallbackRc = Rc<dyn Fn(&Notification)>;
type CallbackWeak = Weak<dyn Fn(&Notification)>;

/// Ordered list of notification subscribers.
#[derive(Default)]
pub struct Notifier {
    subscribers: RefCell<Vec<CallbackWeak>>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

impl Notifier {
    /// Create a notifier with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. Keep the returned guard alive for as long as the
    /// callback should receive notifications.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&Notification) + 'static) -> Subscription {
        let strong: CallbackRc = Rc::new(callback);
        self.subscribers.borrow_mut().push(Rc::downgrade(&strong));
        Subscription { _guard: strong }
    }

    /// Deliver a notification to every live subscriber.
    pub fn emit(&self, notification: &Notification) {
        // Collect first so callbacks may subscribe without a borrow conflict.
        let callbacks: Vec<CallbackRc> = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|w| w.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };

        tracing::trace!(
            target: "rewind.notify",
            ?notification,
            subscribers = callbacks.len(),
            "emit"
        );

        for cb in &callbacks {
            cb(notification);
        }
    }

    /// Number of registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping the `Subscription` drops the only strong reference to the
/// callback, so the notifier's `Weak` fails to upgrade from then on.
pub struct Subscription {
    _guard: CallbackRc,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
