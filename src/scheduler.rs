//! Virtual-time timer queue owned by a single game session.
//!
//! Nothing here sleeps: the owner advances the clock explicitly and drains
//! due timers one at a time, so handling one timer may cancel or schedule
//! others before the next one is popped.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Named deferred operations a session can have outstanding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum TimerKind {
    /// One step of a selected target's disappearance countdown
    CountdownTick { value: u32 },
    /// One step of the elapsed session clock
    ClockTick,
    /// Simulated selection of the currently expected target
    AutoplayTrigger { value: u32 },
    /// Deferred transition to `Won` after the final correct selection
    WinGrace,
}

impl TimerKind {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    // Timers due at the same instant fire ticks first, so a countdown that
    // ends together with the win grace expires before the session resolves.
    fn rank(&self) -> u8 {
        match self {
            TimerKind::CountdownTick { .. } => 0,
            TimerKind::ClockTick => 1,
            TimerKind::AutoplayTrigger { .. } => 2,
            TimerKind::WinGrace => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fired {
    pub handle: TimerHandle,
    pub kind: TimerKind,
    pub at: Duration,
}

type QueueKey = (Duration, u8, u64);

#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<QueueKey, TimerKind>,
    keys: HashMap<TimerHandle, QueueKey>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, kind: TimerKind) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;

        let key = (self.now + delay, kind.rank(), id);
        let handle = TimerHandle(id);
        self.queue.insert(key, kind);
        self.keys.insert(handle, key);
        handle
    }

    /// Returns false when the timer already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.keys.remove(&handle) {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    /// Drops every outstanding timer, returning what was cancelled in due order.
    pub fn cancel_all(&mut self) -> Vec<TimerKind> {
        self.keys.clear();
        std::mem::take(&mut self.queue).into_values().collect()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.keys.contains_key(&handle)
    }

    pub fn pending(&self) -> impl Iterator<Item = &TimerKind> {
        self.queue.values()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pops the earliest timer due at or before `until`, moving the clock to
    /// its due time.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired> {
        let (&key, _) = self.queue.first_key_value()?;
        if key.0 > until {
            return None;
        }

        let kind = self.queue.remove(&key)?;
        let handle = TimerHandle(key.2);
        self.keys.remove(&handle);
        self.now = self.now.max(key.0);

        Some(Fired {
            handle,
            kind,
            at: key.0,
        })
    }

    /// Moves the clock forward to `until` once everything due has been drained.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}
