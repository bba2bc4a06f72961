/// Outcome of matching one selection against the expected value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Correct pick; `next` is now expected
    Advanced { next: u32 },
    /// Correct pick of the last target
    Completed,
    /// Wrong pick; the session is lost
    Mismatch { expected: u32, got: u32 },
}

/// Tracks which target value must be selected next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sequencer {
    target_count: u32,
    next: u32,
    finished: bool,
    accepted: Vec<u32>,
}

impl Sequencer {
    pub fn new(target_count: u32) -> Self {
        Self {
            target_count,
            next: 1,
            finished: false,
            accepted: Vec::with_capacity(target_count as usize),
        }
    }

    pub fn target_count(&self) -> u32 {
        self.target_count
    }

    /// The value to select next, or None once the session has resolved
    pub fn expected(&self) -> Option<u32> {
        (!self.finished).then_some(self.next)
    }

    /// Last expected value, kept after the session resolves. After a win it
    /// stays on the final value.
    pub fn cursor(&self) -> u32 {
        self.next
    }

    /// Correct selections, in the order they were accepted
    pub fn accepted(&self) -> &[u32] {
        &self.accepted
    }

    pub fn is_complete(&self) -> bool {
        self.accepted.len() as u32 == self.target_count
    }

    /// Returns None when there is nothing left to resolve.
    pub fn resolve(&mut self, value: u32) -> Option<Resolution> {
        let expected = self.expected()?;
        if self.is_complete() {
            return None;
        }

        if value != expected {
            return Some(Resolution::Mismatch {
                expected,
                got: value,
            });
        }

        self.accepted.push(value);
        if expected == self.target_count {
            Some(Resolution::Completed)
        } else {
            self.next += 1;
            Some(Resolution::Advanced { next: self.next })
        }
    }

    pub fn finish(&mut self) {
        self.finished = true;
    }
}
