//! State machinery that drives the multi-tau cascade.
//!
//! Each integration level above level 0 is fed one input whenever the level
//! below it receives a frame. After `fan_in` inputs, the level "promotes":
//! it sums the `fan_in` most recent frames of the level below into a new
//! frame of its own. With the usual `fan_in = 2`, the level alternates
//! between [`LevelTrigger::Idle`] and [`LevelTrigger::Armed`], promoting on
//! every 2nd input and never on the 1st, 3rd, 5th, ...
//!
//! Frames live in fixed-capacity ring buffers (one per level). The buffers
//! themselves are owned by the std crate; [`RingCursor`] only tracks which
//! slot is newest.

/// The per-level trigger state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LevelTrigger {
    /// no inputs have arrived since the last promotion
    #[default]
    Idle,
    /// `pending` inputs have arrived since the last promotion (always less
    /// than the fan-in)
    Armed { pending: usize },
}

/// What the caller should do after feeding an input to a [`LevelTrigger`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerAction {
    /// keep waiting for more inputs
    Hold,
    /// synthesize a frame for this level from the level below
    Promote,
}

impl LevelTrigger {
    /// Feed one input to the trigger and return the next state along with
    /// the action that the transition calls for.
    ///
    /// `fan_in` is the number of lower-level frames that are summed into a
    /// single frame of this level. Values smaller than 2 promote on every
    /// input.
    #[must_use]
    pub fn next(self, fan_in: usize) -> (LevelTrigger, TriggerAction) {
        let pending = match self {
            LevelTrigger::Idle => 1,
            LevelTrigger::Armed { pending } => pending + 1,
        };
        if pending >= fan_in {
            (LevelTrigger::Idle, TriggerAction::Promote)
        } else {
            (LevelTrigger::Armed { pending }, TriggerAction::Hold)
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, LevelTrigger::Armed { .. })
    }
}

/// Tracks the newest slot of a ring buffer with `capacity` slots.
///
/// The first call to [`RingCursor::advance`] selects slot 0; afterwards the
/// cursor walks the slots cyclically, so after `capacity` writes the oldest
/// slot gets overwritten.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingCursor {
    capacity: usize,
    newest: Option<usize>,
    n_written: usize,
}

impl RingCursor {
    pub fn new(capacity: usize) -> Result<Self, &'static str> {
        if capacity == 0 {
            Err("ring buffer capacity must be positive")
        } else {
            Ok(RingCursor {
                capacity,
                newest: None,
                n_written: 0,
            })
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// move to the next slot and return its index. The returned slot becomes
    /// the newest one.
    pub fn advance(&mut self) -> usize {
        let slot = match self.newest {
            None => 0,
            Some(cur) => (cur + 1) % self.capacity,
        };
        self.newest = Some(slot);
        self.n_written = self.n_written.saturating_add(1);
        slot
    }

    pub fn newest(&self) -> Option<usize> {
        self.newest
    }

    /// the number of slots that currently hold data
    pub fn n_filled(&self) -> usize {
        self.n_written.min(self.capacity)
    }

    /// iterate over the slots holding the (up to) `n` most recent entries,
    /// newest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = usize> + use<> {
        let capacity = self.capacity;
        let newest = self.newest.unwrap_or(0);
        let n = n.min(self.n_filled());
        (0..n).map(move |back| (newest + capacity - back) % capacity)
    }
}
