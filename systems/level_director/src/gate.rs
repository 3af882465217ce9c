use std::time::Duration;

/// Delay between the last spawn of a wave and the first live-enemy poll.
pub const CLEAR_GRACE: Duration = Duration::from_secs(3);
/// Delay between consecutive live-enemy polls.
pub const CLEAR_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Consecutive empty polls required before the next wave may start.
pub const CLEAR_POLLS_REQUIRED: u32 = 3;
/// Delay between the gate opening and the next wave starting.
pub const CLEAR_SETTLE: Duration = Duration::from_secs(1);

/// Counts consecutive empty live-enemy polls.
///
/// A single stray enemy resets the count, so a wave only counts as cleared
/// once the field stays empty across several polls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClearGate {
    consecutive_empty: u32,
}

impl ClearGate {
    /// Creates a gate that has observed nothing yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            consecutive_empty: 0,
        }
    }

    /// Records one poll of the live-enemy count and reports whether the gate opened.
    pub fn observe(&mut self, live_enemies: usize) -> bool {
        if live_enemies == 0 {
            self.consecutive_empty = self.consecutive_empty.saturating_add(1);
        } else {
            self.consecutive_empty = 0;
        }
        self.consecutive_empty >= CLEAR_POLLS_REQUIRED
    }

    /// Number of consecutive empty polls observed so far.
    #[must_use]
    pub const fn consecutive_empty(&self) -> u32 {
        self.consecutive_empty
    }
}
