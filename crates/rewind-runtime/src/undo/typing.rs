#![forbid(unsafe_code)]

//! Keystroke counters that coalesce typing runs into one history entry.

/// Default keystrokes per typing run before a forced snapshot.
pub const DEFAULT_THRESHOLD: u32 = 25;

/// Keystroke group tracked by the coalescer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyGroup {
    /// Character-producing keys.
    Type,
    /// Deletion keys.
    Functional,
}

impl KeyGroup {
    const fn slot(self) -> usize {
        match self {
            Self::Type => 0,
            Self::Functional => 1,
        }
    }

    const fn other(self) -> Self {
        match self {
            Self::Type => Self::Functional,
            Self::Functional => Self::Type,
        }
    }
}

/// Typing coalescer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TypingConfig {
    /// Keystrokes in one group after which a snapshot is forced.
    pub threshold: u32,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Why a keystroke closes the running entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// The key belongs to a different group than the previous one.
    GroupChanged,
    /// The group's counter reached the threshold.
    Threshold,
}

/// Result of [`TypingState::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    /// Snapshot boundary the keystroke triggers, if any.
    pub boundary: Option<Boundary>,
    /// Counter value to store once the keystroke is handled.
    pub count: u32,
}

/// Per-group keystroke counters plus the typing flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypingState {
    strokes: [u32; 2],
    typing: bool,
    last_group: Option<KeyGroup>,
}

impl TypingState {
    /// Classify the next keystroke of `group`.
    ///
    /// A group change zeroes the other group's counter. Reaching the
    /// threshold zeroes the returned count. The first keystroke ever is
    /// never a group change.
    pub fn begin(&mut self, group: KeyGroup, threshold: u32) -> Stroke {
        let mut count = self.strokes[group.slot()].saturating_add(1);
        let changed = self.last_group.is_some_and(|last| last != group);
        let boundary = if changed {
            self.strokes[group.other().slot()] = 0;
            Some(Boundary::GroupChanged)
        } else if count >= threshold {
            count = 0;
            Some(Boundary::Threshold)
        } else {
            None
        };
        Stroke { boundary, count }
    }

    /// Store the counter for `group` and remember it as the last group.
    pub fn commit(&mut self, group: KeyGroup, count: u32) {
        self.strokes[group.slot()] = count;
        self.last_group = Some(group);
    }

    /// Clear counters, the typing flag and the last group. The keystroke
    /// after a reset never counts as a group change.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Mark a typing run as started.
    pub fn start(&mut self) {
        self.typing = true;
    }

    /// Whether a typing run is in progress.
    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Whether any keystroke has been counted since the last reset.
    #[must_use]
    pub fn has_strokes(&self) -> bool {
        self.strokes.iter().any(|&n| n > 0)
    }

    /// Counter for `group`.
    #[must_use]
    pub fn strokes(&self, group: KeyGroup) -> u32 {
        self.strokes[group.slot()]
    }

    /// Group of the most recent keystroke.
    #[must_use]
    pub fn last_group(&self) -> Option<KeyGroup> {
        self.last_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(state: &mut TypingState, group: KeyGroup, threshold: u32) -> Stroke {
        let stroke = state.begin(group, threshold);
        state.commit(group, stroke.count);
        stroke
    }

    #[test]
    fn first_keystroke_has_no_boundary() {
        let mut state = TypingState::default();
        let s = press(&mut state, KeyGroup::Type, 25);
        assert_eq!(s, Stroke { boundary: None, count: 1 });
        assert!(state.has_strokes());
    }

    #[test]
    fn threshold_resets_counter() {
        let mut state = TypingState::default();
        for i in 1..25 {
            assert_eq!(press(&mut state, KeyGroup::Type, 25).count, i);
        }
        let s = press(&mut state, KeyGroup::Type, 25);
        assert_eq!(s.boundary, Some(Boundary::Threshold));
        assert_eq!(state.strokes(KeyGroup::Type), 0);
        assert_eq!(press(&mut state, KeyGroup::Type, 25).count, 1);
    }

    #[test]
    fn group_change_zeroes_other_counter() {
        let mut state = TypingState::default();
        press(&mut state, KeyGroup::Type, 25);
        press(&mut state, KeyGroup::Type, 25);
        let s = press(&mut state, KeyGroup::Functional, 25);
        assert_eq!(s.boundary, Some(Boundary::GroupChanged));
        assert_eq!(s.count, 1);
        assert_eq!(state.strokes(KeyGroup::Type), 0);
        assert_eq!(state.last_group(), Some(KeyGroup::Functional));
    }

    #[test]
    fn group_change_wins_over_threshold() {
        let mut state = TypingState::default();
        press(&mut state, KeyGroup::Type, 2);
        let s = press(&mut state, KeyGroup::Functional, 1);
        assert_eq!(s.boundary, Some(Boundary::GroupChanged));
        assert_eq!(s.count, 1);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut state = TypingState::default();
        press(&mut state, KeyGroup::Type, 25);
        state.start();
        state.reset();
        assert_eq!(state, TypingState::default());

        let s = press(&mut state, KeyGroup::Functional, 25);
        assert_eq!(s.boundary, None);
    }
}
