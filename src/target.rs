use std::time::Duration;

use crate::layout::{Placement, Position, Size};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum TargetState {
    Active,
    Selected,
    Expired,
}

/// One numbered target. The value doubles as its label and its click order.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    value: u32,
    position: Position,
    state: TargetState,
    remaining: Duration,
}

impl Target {
    pub fn new(value: u32, position: Position, countdown: Duration) -> Self {
        Self {
            value,
            position,
            state: TargetState::Active,
            remaining: countdown,
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn state(&self) -> TargetState {
        self.state
    }

    /// Time left before a selected target disappears
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.state == TargetState::Active
    }

    /// Expired targets are hidden and drop out of hit-testing.
    pub fn is_visible(&self) -> bool {
        self.state != TargetState::Expired
    }

    pub fn contains(&self, point: Position, size: Size) -> bool {
        self.is_visible()
            && point.x >= self.position.x
            && point.x < self.position.x + size.width
            && point.y >= self.position.y
            && point.y < self.position.y + size.height
    }

    /// Active -> Selected. Returns false for any other state.
    pub fn select(&mut self) -> bool {
        if self.state != TargetState::Active {
            return false;
        }
        self.state = TargetState::Selected;
        true
    }

    /// Length of the next countdown step, never past zero
    pub fn next_step(&self, tick: Duration) -> Duration {
        self.remaining.min(tick)
    }

    /// Counts a selected target down by `step`. Returns true when this step
    /// expired it.
    pub fn tick(&mut self, step: Duration) -> bool {
        if self.state != TargetState::Selected {
            return false;
        }

        self.remaining = self.remaining.saturating_sub(step);
        if self.remaining.is_zero() {
            self.state = TargetState::Expired;
            return true;
        }
        false
    }
}

/// Session-scoped store of every target, keyed by value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetSet {
    // index = value - 1
    targets: Vec<Target>,
}

impl TargetSet {
    pub fn from_layout(layout: Vec<Placement>, countdown: Duration) -> Self {
        Self {
            targets: layout
                .into_iter()
                .map(|p| Target::new(p.value, p.position, countdown))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get(&self, value: u32) -> Option<&Target> {
        let idx = usize::try_from(value).ok()?.checked_sub(1)?;
        self.targets.get(idx)
    }

    pub fn get_mut(&mut self, value: u32) -> Option<&mut Target> {
        let idx = usize::try_from(value).ok()?.checked_sub(1)?;
        self.targets.get_mut(idx)
    }

    /// Targets in ascending value order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Target> {
        self.targets.iter()
    }

    pub fn count_in(&self, state: TargetState) -> usize {
        self.targets.iter().filter(|t| t.state == state).count()
    }

    /// Topmost visible target under `point`. Lower values sit on top.
    pub fn hit(&self, point: Position, size: Size) -> Option<&Target> {
        self.targets.iter().find(|t| t.contains(point, size))
    }
}
