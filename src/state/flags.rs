//! Lifecycle flag bitmask of one asynchronous computation.

use std::fmt;
use std::ops::BitOr;

/// Several bits may be set at once (e.g. `STARTED | RUNNING | PAUSED`).
/// Once `FINISHED` or `CANCELED` is set the state is terminal and no further
/// reports are accepted.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct FutureState(u32);

impl FutureState {
    pub const NO_STATE: FutureState = FutureState(0x00);
    pub const RUNNING: FutureState = FutureState(0x01);
    pub const STARTED: FutureState = FutureState(0x02);
    pub const FINISHED: FutureState = FutureState(0x04);
    pub const CANCELED: FutureState = FutureState(0x08);
    pub const PAUSED: FutureState = FutureState(0x10);
    pub const THROTTLED: FutureState = FutureState(0x20);

    pub fn contains(self, other: FutureState) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: FutureState) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: FutureState) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: FutureState) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: FutureState, on: bool) {
        if on {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    /// Finished or canceled.
    pub fn is_terminal(self) -> bool {
        self.intersects(FutureState::FINISHED | FutureState::CANCELED)
    }
}

impl BitOr for FutureState {
    type Output = FutureState;

    fn bitor(self, rhs: FutureState) -> FutureState {
        FutureState(self.0 | rhs.0)
    }
}

impl fmt::Debug for FutureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(FutureState, &str); 6] = [
            (FutureState::RUNNING, "RUNNING"),
            (FutureState::STARTED, "STARTED"),
            (FutureState::FINISHED, "FINISHED"),
            (FutureState::CANCELED, "CANCELED"),
            (FutureState::PAUSED, "PAUSED"),
            (FutureState::THROTTLED, "THROTTLED"),
        ];
        let set: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if set.is_empty() {
            write!(f, "NO_STATE")
        } else {
            write!(f, "{}", set.join("|"))
        }
    }
}
