//! Scripted stand-in for the player.
//!
//! The driver owns at most one outstanding `AutoplayTrigger` timer, always
//! for the value whose trigger window is currently open. The session calls
//! [`AutoplayDriver::sync`] after every state change and the driver arms,
//! keeps or cancels its timer to match.

use std::time::Duration;

use tracing::debug;

use crate::scheduler::{Scheduler, TimerHandle, TimerKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Pending {
    value: u32,
    handle: TimerHandle,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutoplayDriver {
    enabled: bool,
    delay: Duration,
    pending: Option<Pending>,
}

impl AutoplayDriver {
    pub fn new(delay: Duration) -> Self {
        Self {
            enabled: false,
            delay,
            pending: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Value the outstanding trigger will select, if any
    pub fn pending_value(&self) -> Option<u32> {
        self.pending.map(|p| p.value)
    }

    /// Forgets the outstanding trigger without touching a scheduler. Used when
    /// the scheduler that held it has been discarded.
    pub fn reset(&mut self) {
        self.enabled = false;
        self.pending = None;
    }

    /// Reconciles the outstanding trigger with `window`, the value whose
    /// target is currently expected and still active.
    pub fn sync(&mut self, window: Option<u32>, timers: &mut Scheduler) {
        let wanted = window.filter(|_| self.enabled);

        if let Some(pending) = self.pending {
            if Some(pending.value) == wanted && timers.is_pending(pending.handle) {
                return;
            }
            timers.cancel(pending.handle);
            self.pending = None;
            debug!(value = pending.value, "autoplay trigger cancelled");
        }

        if let Some(value) = wanted {
            let handle = timers.schedule(self.delay, TimerKind::AutoplayTrigger { value });
            self.pending = Some(Pending { value, handle });
            debug!(value, delay_ms = self.delay.as_millis() as u64, "autoplay trigger armed");
        }
    }

    /// Claims a fired trigger. Returns the value to select when `handle` is
    /// the trigger this driver armed.
    pub fn take_fired(&mut self, handle: TimerHandle) -> Option<u32> {
        match self.pending {
            Some(p) if p.handle == handle => {
                self.pending = None;
                Some(p.value)
            }
            _ => None,
        }
    }

    /// While enabled, only the expected target accepts manual clicks.
    pub fn allows_manual(&self, value: u32, expected: Option<u32>) -> bool {
        !self.enabled || expected == Some(value)
    }
}
