//! Session controller: status, start/restart and win/loss resolution.
//!
//! A [`Game`] holds at most one [`Session`]. Starting replaces the session
//! wholesale, and with it the scheduler that owns every countdown, clock,
//! autoplay and win-grace timer, so nothing from a superseded round can fire.

use std::time::Duration;

use itertools::Itertools;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::autoplay::AutoplayDriver;
use crate::error::GameError;
use crate::layout::{LayoutGenerator, Position, Size};
use crate::scheduler::{Fired, Scheduler, TimerHandle, TimerKind};
use crate::sequencer::{Resolution, Sequencer};
use crate::target::{Target, TargetSet};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Idle,
    Playing,
    Won,
    Lost,
}

impl Status {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Status::Won | Status::Lost)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Step of every countdown and of the elapsed clock
    pub tick: Duration,
    /// How long a selected target stays visible
    pub countdown: Duration,
    /// Delay between the final correct selection and `Won`
    pub win_grace: Duration,
    /// Simulated reaction time of the autoplay driver
    pub autoplay_delay: Duration,
    pub target_size: Size,
    pub margin: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
            countdown: Duration::from_secs(3),
            win_grace: Duration::from_secs(3),
            autoplay_delay: Duration::from_secs(1),
            target_size: Size::new(50.0, 50.0),
            margin: 5.0,
        }
    }
}

/// Who asked for a selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Manual,
    Autoplay,
}

/// Why a selection attempt changed nothing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ignored {
    NotPlaying,
    UnknownTarget,
    /// Target already selected or expired
    Inactive,
    /// Autoplay is on and this is not the expected target
    AutoplayGate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attempt {
    Ignored(Ignored),
    Resolved(Resolution),
}

pub trait StatusListener {
    fn on_status_change(&mut self, status: Status);
}

impl<F: FnMut(Status)> StatusListener for F {
    fn on_status_change(&mut self, status: Status) {
        self(status)
    }
}

/// State of one round, from start until it is replaced.
#[derive(Debug)]
pub struct Session {
    status: Status,
    targets: TargetSet,
    sequencer: Sequencer,
    timers: Scheduler,
    elapsed: Duration,
    win_grace: Option<TimerHandle>,
}

impl Session {
    fn new(target_count: u32, targets: TargetSet) -> Self {
        Self {
            status: Status::Playing,
            targets,
            sequencer: Sequencer::new(target_count),
            timers: Scheduler::new(),
            elapsed: Duration::ZERO,
            win_grace: None,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn target_count(&self) -> u32 {
        self.sequencer.target_count()
    }

    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Virtual time since the session started
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn pending_timers(&self) -> impl Iterator<Item = &TimerKind> {
        self.timers.pending()
    }

    pub fn is_win_pending(&self) -> bool {
        self.win_grace
            .is_some_and(|handle| self.timers.is_pending(handle))
    }

    fn is_playing(&self) -> bool {
        self.status == Status::Playing
    }

    /// The expected value while its target is still active and the session
    /// is live
    fn autoplay_window(&self) -> Option<u32> {
        if !self.is_playing() {
            return None;
        }
        let value = self.sequencer.expected()?;
        self.targets
            .get(value)
            .filter(|t| t.is_active())
            .map(|_| value)
    }

    fn select_target(&mut self, value: u32, tick: Duration) {
        let Some(target) = self.targets.get_mut(value) else {
            return;
        };
        if target.select() {
            self.timers
                .schedule(target.next_step(tick), TimerKind::CountdownTick { value });
        }
    }

    fn countdown_tick(&mut self, value: u32, tick: Duration) {
        let playing = self.is_playing();
        let Some(target) = self.targets.get_mut(value) else {
            return;
        };

        // Frozen countdowns keep their remaining time and poll once per tick.
        let delay = if playing {
            if target.tick(target.next_step(tick)) {
                debug!(value, "target expired");
                return;
            }
            target.next_step(tick)
        } else {
            tick
        };
        self.timers
            .schedule(delay, TimerKind::CountdownTick { value });
    }

    fn clock_tick(&mut self, tick: Duration) {
        if self.is_playing() {
            self.elapsed += tick;
        }
        self.timers.schedule(tick, TimerKind::ClockTick);
    }
}

/// Game engine facade driven by the shell: start/restart, selections,
/// autoplay and time.
pub struct Game {
    config: GameConfig,
    area: Size,
    rng: StdRng,
    autoplay: AutoplayDriver,
    session: Option<Session>,
    listeners: Vec<Box<dyn StatusListener>>,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Reproducible layouts, mostly for tests
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut config: GameConfig, rng: StdRng) -> Self {
        // a zero tick would reschedule forever at the same instant
        config.tick = config.tick.max(Duration::from_millis(1));
        Self {
            autoplay: AutoplayDriver::new(config.autoplay_delay),
            area: Size::new(800.0, 600.0),
            config,
            rng,
            session: None,
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Bounds used by the next layout
    pub fn set_play_area(&mut self, area: Size) {
        self.area = area;
    }

    pub fn play_area(&self) -> Size {
        self.area
    }

    pub fn subscribe(&mut self, listener: impl StatusListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn status(&self) -> Status {
        self.session
            .as_ref()
            .map_or(Status::Idle, |s| s.status)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn expected_value(&self) -> Option<u32> {
        self.session.as_ref()?.sequencer.expected()
    }

    pub fn accepted(&self) -> &[u32] {
        self.session
            .as_ref()
            .map_or(&[], |s| s.sequencer.accepted())
    }

    pub fn elapsed(&self) -> Duration {
        self.session
            .as_ref()
            .map_or(Duration::ZERO, |s| s.elapsed)
    }

    pub fn target(&self, value: u32) -> Option<&Target> {
        self.session.as_ref()?.targets.get(value)
    }

    /// Every target of the current session in ascending value order
    pub fn targets(&self) -> impl DoubleEndedIterator<Item = &Target> {
        self.session.iter().flat_map(|s| s.targets.iter())
    }

    /// Visible targets no further than `window` values past the expected one
    pub fn visible_targets(&self, window: u32) -> impl DoubleEndedIterator<Item = &Target> {
        let limit = self
            .session
            .as_ref()
            .map_or(0, |s| s.sequencer.cursor().saturating_add(window));
        self.targets()
            .filter(move |t| t.is_visible() && t.value() <= limit)
    }

    /// Value of the topmost visible target under `point`
    pub fn target_at(&self, point: Position) -> Option<u32> {
        let session = self.session.as_ref()?;
        session
            .targets
            .hit(point, self.config.target_size)
            .map(Target::value)
    }

    pub fn autoplay_enabled(&self) -> bool {
        self.autoplay.is_enabled()
    }

    pub fn autoplay_pending(&self) -> Option<u32> {
        self.autoplay.pending_value()
    }

    /// Begins a fresh session, discarding the previous one with all of its
    /// timers. Autoplay is switched off.
    pub fn start(&mut self, target_count: i64) -> Result<(), GameError> {
        let count = u32::try_from(target_count)
            .ok()
            .filter(|c| *c > 0)
            .ok_or(GameError::InvalidTargetCount(target_count))?;

        if let Some(mut previous) = self.session.take() {
            let cancelled = previous.timers.cancel_all();
            debug!(
                status = %previous.status,
                timers = %cancelled.iter().map(TimerKind::name).join(","),
                "previous session discarded"
            );
        }
        self.autoplay.reset();

        let layout = LayoutGenerator::new(self.area, self.config.target_size, self.config.margin)
            .generate(count, &mut self.rng);
        let mut session = Session::new(count, TargetSet::from_layout(layout, self.config.countdown));
        session
            .timers
            .schedule(self.config.tick, TimerKind::ClockTick);
        self.session = Some(session);

        info!(target_count = count, "session started");
        self.notify(Status::Playing);
        Ok(())
    }

    /// Enabling is refused (returns false) unless a session is playing.
    pub fn set_autoplay(&mut self, enabled: bool) -> bool {
        if enabled && self.status() != Status::Playing {
            debug!(status = %self.status(), "autoplay ignored outside a live session");
            return false;
        }
        if self.autoplay.is_enabled() != enabled {
            info!(enabled, "autoplay toggled");
        }
        self.autoplay.set_enabled(enabled);
        self.sync_autoplay();
        true
    }

    pub fn toggle_autoplay(&mut self) -> bool {
        self.set_autoplay(!self.autoplay.is_enabled())
    }

    /// Manual selection of the target labelled `value`
    pub fn attempt_select(&mut self, value: u32) -> Attempt {
        self.select(value, Source::Manual)
    }

    /// Runs every timer due within the next `dt`, in order.
    pub fn advance(&mut self, dt: Duration) {
        let Some(until) = self.session.as_ref().map(|s| s.timers.now() + dt) else {
            return;
        };

        while let Some(fired) = self
            .session
            .as_mut()
            .and_then(|s| s.timers.pop_due(until))
        {
            self.on_timer(fired);
        }

        if let Some(session) = self.session.as_mut() {
            session.timers.settle(until);
        }
    }

    fn select(&mut self, value: u32, source: Source) -> Attempt {
        let Some(session) = self.session.as_mut() else {
            return Attempt::Ignored(Ignored::NotPlaying);
        };
        if !session.is_playing() {
            return Attempt::Ignored(Ignored::NotPlaying);
        }
        match session.targets.get(value) {
            None => return Attempt::Ignored(Ignored::UnknownTarget),
            Some(target) if !target.is_active() => return Attempt::Ignored(Ignored::Inactive),
            Some(_) => {}
        }
        if source == Source::Manual
            && !self
                .autoplay
                .allows_manual(value, session.sequencer.expected())
        {
            return Attempt::Ignored(Ignored::AutoplayGate);
        }

        let Some(resolution) = session.sequencer.resolve(value) else {
            return Attempt::Ignored(Ignored::NotPlaying);
        };
        session.select_target(value, self.config.tick);
        debug!(value, ?source, ?resolution, "selection resolved");

        match resolution {
            Resolution::Advanced { .. } => {}
            Resolution::Completed => self.resolve_win(),
            Resolution::Mismatch { .. } => self.resolve_loss(),
        }
        self.sync_autoplay();
        Attempt::Resolved(resolution)
    }

    fn on_timer(&mut self, fired: Fired) {
        let tick = self.config.tick;
        match fired.kind {
            TimerKind::CountdownTick { value } => {
                if let Some(session) = self.session.as_mut() {
                    session.countdown_tick(value, tick);
                }
            }
            TimerKind::ClockTick => {
                if let Some(session) = self.session.as_mut() {
                    session.clock_tick(tick);
                }
            }
            TimerKind::AutoplayTrigger { value } => {
                if self.autoplay.take_fired(fired.handle) == Some(value) {
                    debug!(value, "autoplay trigger fired");
                    self.select(value, Source::Autoplay);
                }
            }
            TimerKind::WinGrace => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                session.win_grace = None;
                if session.is_playing() {
                    self.transition(Status::Won);
                }
            }
        }
    }

    fn resolve_win(&mut self) {
        let grace = self.config.win_grace;
        if let Some(session) = self.session.as_mut() {
            session.win_grace = Some(session.timers.schedule(grace, TimerKind::WinGrace));
            info!(
                grace_ms = grace.as_millis() as u64,
                "final target selected, win pending"
            );
        }
    }

    fn resolve_loss(&mut self) {
        self.transition(Status::Lost);
    }

    fn transition(&mut self, status: Status) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.status == status {
            return;
        }

        let from = session.status;
        session.status = status;
        if status != Status::Playing {
            session.sequencer.finish();
        }
        info!(
            %from,
            to = %status,
            elapsed_ms = session.elapsed.as_millis() as u64,
            accepted = session.sequencer.accepted().len(),
            "session status changed"
        );

        self.sync_autoplay();
        self.notify(status);
    }

    fn notify(&mut self, status: Status) {
        for listener in self.listeners.iter_mut() {
            listener.on_status_change(status);
        }
    }

    fn sync_autoplay(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let window = session.autoplay_window();
        self.autoplay.sync(window, &mut session.timers);
    }
}
