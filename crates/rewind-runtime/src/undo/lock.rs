#![forbid(unsafe_code)]

//! Reentrant suppression of automatic snapshots.
//!
//! While locked, `save` and `update` do nothing. The outermost `lock` decides
//! how the single reconciliation on the final `unlock` behaves; nested locks
//! only bump the depth.

use super::snapshot::Snapshot;

/// How the outermost lock reconciles the current history entry on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LockMode {
    /// Update the current entry only if content changed while locked.
    #[default]
    Default,
    /// Never update on release.
    DontUpdate,
    /// Always update on release.
    ForceUpdate,
}

impl LockMode {
    /// Build a mode from the two boolean flags. `dont_update` wins when both
    /// are set.
    #[must_use]
    pub fn from_flags(dont_update: bool, force_update: bool) -> Self {
        if dont_update {
            Self::DontUpdate
        } else if force_update {
            Self::ForceUpdate
        } else {
            Self::Default
        }
    }
}

/// What to do on the final unlock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconcile {
    /// Leave the current entry alone.
    Never,
    /// Replace the current entry with a fresh capture.
    Always,
    /// Replace the current entry if the live content no longer equals this
    /// content-only capture taken at lock time.
    IfChanged(Snapshot),
}

/// Lock depth plus the reconciliation decided by the outermost lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LockState {
    /// Snapshots are taken normally.
    #[default]
    Unlocked,
    /// Snapshots are suppressed.
    Locked {
        /// Number of outstanding `lock` calls, at least 1.
        depth: u32,
        /// Decided when depth went from 0 to 1.
        reconcile: Reconcile,
    },
}

impl LockState {
    /// Outstanding lock count.
    #[must_use]
    pub fn depth(&self) -> u32 {
        match self {
            Self::Unlocked => 0,
            Self::Locked { depth, .. } => *depth,
        }
    }

    /// Whether any lock is outstanding.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }

    /// Acquire one level. `reconcile` is only evaluated for the outermost
    /// lock.
    pub fn acquire(&mut self, reconcile: impl FnOnce() -> Reconcile) {
        match self {
            Self::Unlocked => {
                *self = Self::Locked {
                    depth: 1,
                    reconcile: reconcile(),
                };
            }
            Self::Locked { depth, .. } => *depth = depth.saturating_add(1),
        }
    }

    /// Release one level. Returns the reconciliation when the last level is
    /// released, `None` otherwise (including when not locked at all).
    pub fn release(&mut self) -> Option<Reconcile> {
        match self {
            Self::Unlocked => None,
            Self::Locked { depth, .. } if *depth > 1 => {
                *depth -= 1;
                None
            }
            Self::Locked { .. } => match std::mem::take(self) {
                Self::Locked { reconcile, .. } => Some(reconcile),
                Self::Unlocked => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_flags_precedence() {
        assert_eq!(LockMode::from_flags(false, false), LockMode::Default);
        assert_eq!(LockMode::from_flags(true, false), LockMode::DontUpdate);
        assert_eq!(LockMode::from_flags(false, true), LockMode::ForceUpdate);
        assert_eq!(LockMode::from_flags(true, true), LockMode::DontUpdate);
    }

    #[test]
    fn nested_locks_release_once() {
        let mut state = LockState::default();
        state.acquire(|| Reconcile::Always);
        state.acquire(|| panic!("inner lock must not decide reconciliation"));
        assert_eq!(state.depth(), 2);

        assert_eq!(state.release(), None);
        assert!(state.is_locked());
        assert_eq!(state.release(), Some(Reconcile::Always));
        assert!(!state.is_locked());
        assert_eq!(state.depth(), 0);
    }

    #[test]
    fn release_when_unlocked_is_noop() {
        let mut state = LockState::Unlocked;
        assert_eq!(state.release(), None);
        assert_eq!(state, LockState::Unlocked);
    }

    #[test]
    fn outermost_reconcile_is_kept() {
        let mut state = LockState::default();
        let snap = Snapshot::content_only("locked");
        state.acquire(|| Reconcile::IfChanged(snap.clone()));
        state.acquire(|| Reconcile::Never);
        state.release();
        assert_eq!(state.release(), Some(Reconcile::IfChanged(snap)));
    }
}
