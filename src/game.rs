//! Lifecycle controller
//!
//! Owns the run phase machine and the contract exposed to the hosting page:
//! start, fire, resize, frame, destroy. This is the only place phase
//! transitions are applied; the simulation merely reports outcomes. The
//! controller is platform-free so the whole lifecycle tests without a
//! browser; `platform::web` maps it onto requestAnimationFrame and real DOM
//! listeners.

use std::cell::{Cell, RefCell};
use std::error::Error;
use std::fmt;

use crate::config::GameConfig;
use crate::sim::{FrameOutcome, GameEvent, GameState, RunPhase, tick};
use crate::viewport::{self, Viewport};

/// Host-supplied observers, invoked synchronously as state changes
pub struct Callbacks {
    pub on_score_changed: Box<dyn FnMut(u32)>,
    pub on_ammo_changed: Box<dyn FnMut(u32)>,
    /// Final score and whether it beat the `previous_best` passed to `start`
    pub on_run_resolved: Box<dyn FnMut(u32, bool)>,
    /// Fired when the player tries to shoot with an empty quiver; hosts with
    /// a reward flow can offer a refill here. Optional: the core is fully
    /// functional without it.
    pub on_bonus_requested: Option<Box<dyn FnMut()>>,
}

impl Callbacks {
    /// No-op callbacks, for headless runs and tests
    pub fn silent() -> Self {
        Self {
            on_score_changed: Box::new(|_| {}),
            on_ammo_changed: Box::new(|_| {}),
            on_run_resolved: Box::new(|_, _| {}),
            on_bonus_requested: None,
        }
    }
}

/// Why `start()` refused to begin a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    /// The drawable surface is missing or has zero area
    SurfaceUnavailable,
    /// A run is already loading or running. Double-start is rejected rather
    /// than treated as an implicit restart; call `destroy()` first.
    AlreadyRunning,
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::SurfaceUnavailable => {
                write!(f, "drawable surface is missing or zero-sized")
            }
            StartError::AlreadyRunning => write!(f, "a run is already in progress"),
        }
    }
}

impl Error for StartError {}

/// The game core: simulation state, viewport, and host callbacks under a
/// single caller-owned instance. No ambient globals; external systems (ads,
/// persistence) interact only through the callback contract.
pub struct Controller {
    config: GameConfig,
    state: GameState,
    viewport: Viewport,
    callbacks: Callbacks,
}

impl Controller {
    pub fn new(config: GameConfig, callbacks: Callbacks) -> Self {
        let state = GameState::new(&config);
        Self {
            config,
            state,
            viewport: Viewport::default(),
            callbacks,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.state.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Adopt new surface dimensions and re-derive entity geometry. Score and
    /// arrows survive; a zero-area surface defers the recomputation.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::new(width, height);
        viewport::layout(&mut self.state, self.viewport, &self.config);
    }

    /// Begin a run. Requires a usable surface; rejects a start while a run is
    /// loading or in progress. Starting from Resolved performs the
    /// Resolved -> Idle reset implicitly (the replay path).
    ///
    /// On success the phase is Loading; the embedding drives asset loading
    /// and calls [`Controller::assets_ready`] once every asset has settled.
    /// Returns the initial HUD sync events, already dispatched.
    pub fn start(&mut self, previous_best: u32, seed: u64) -> Result<Vec<GameEvent>, StartError> {
        match self.state.phase {
            RunPhase::Loading | RunPhase::Running => return Err(StartError::AlreadyRunning),
            RunPhase::Idle | RunPhase::Resolved => {}
        }
        if !self.viewport.is_usable() {
            return Err(StartError::SurfaceUnavailable);
        }

        self.state.reset_run(previous_best, seed, &self.config);
        viewport::layout(&mut self.state, self.viewport, &self.config);
        self.state.place_entities(self.viewport, &self.config);
        self.state.phase = RunPhase::Loading;
        log::info!("run started (seed {seed}, previous best {previous_best})");

        // Initial HUD sync
        self.state.events.push(GameEvent::ScoreChanged(0));
        let arrows = self.state.arrows;
        self.state.events.push(GameEvent::AmmoChanged(arrows));
        Ok(self.dispatch())
    }

    /// Asset batch settled (loaded or failed); the loop may begin.
    pub fn assets_ready(&mut self) {
        if self.state.phase == RunPhase::Loading {
            self.state.phase = RunPhase::Running;
        }
    }

    /// One fire intent from the input dispatcher (or the host directly).
    /// Returns the events it produced, after dispatching callbacks.
    pub fn fire(&mut self) -> Vec<GameEvent> {
        self.state.try_fire();
        self.dispatch()
    }

    /// External reward signal: grant extra arrows mid-run. Ignored outside
    /// Running, so a stray ad callback after the run ends cannot corrupt
    /// anything.
    pub fn grant_bonus_arrows(&mut self, count: u32) -> Vec<GameEvent> {
        if self.state.phase == RunPhase::Running && count > 0 {
            self.state.arrows += count;
            let arrows = self.state.arrows;
            self.state.events.push(GameEvent::AmmoChanged(arrows));
        }
        self.dispatch()
    }

    /// Advance one frame and dispatch the resulting events. Outside Running
    /// this is a no-op returning no events, which is what guarantees that a
    /// destroyed or resolved instance never reaches a callback again.
    pub fn frame(&mut self) -> Vec<GameEvent> {
        if self.state.phase != RunPhase::Running {
            return Vec::new();
        }
        if tick(&mut self.state, self.viewport, &self.config) == FrameOutcome::Resolved {
            self.state.phase = RunPhase::Resolved;
            let score = self.state.score;
            let new_best = score > self.state.previous_best;
            self.state.events.push(GameEvent::RunResolved { score, new_best });
            log::info!("run resolved: score {score}, new best: {new_best}");
        }
        self.dispatch()
    }

    pub fn is_running(&self) -> bool {
        self.state.phase == RunPhase::Running
    }

    /// Explicit Resolved -> Idle transition for hosts that want to return to
    /// the idle screen without starting a new run.
    pub fn reset(&mut self) {
        if self.state.phase == RunPhase::Resolved {
            self.state.phase = RunPhase::Idle;
        }
    }

    /// Tear down the run from any phase. Pending events are discarded, so no
    /// callback fires after this returns. Idempotent.
    pub fn destroy(&mut self) {
        self.state.events.clear();
        self.state.arrow.in_flight = false;
        self.state.phase = RunPhase::Idle;
    }

    fn dispatch(&mut self) -> Vec<GameEvent> {
        let events = self.state.drain_events();
        for event in &events {
            match *event {
                GameEvent::ScoreChanged(score) => (self.callbacks.on_score_changed)(score),
                GameEvent::AmmoChanged(arrows) => (self.callbacks.on_ammo_changed)(arrows),
                GameEvent::RunResolved { score, new_best } => {
                    (self.callbacks.on_run_resolved)(score, new_best)
                }
                GameEvent::BonusRequested => {
                    if let Some(cb) = self.callbacks.on_bonus_requested.as_mut() {
                        cb()
                    }
                }
                GameEvent::ArrowFired
                | GameEvent::Hit { .. }
                | GameEvent::Miss
                | GameEvent::Escalated => {}
            }
        }
        events
    }
}

/// Reentrancy-safe bridge from drained [`GameEvent`]s to host [`Callbacks`],
/// for embeddings that keep the game behind a shared cell. A handler may call
/// straight back into the game (replay from `on_run_resolved`, a refill from
/// `on_bonus_requested`); a dispatch started from inside a handler queues
/// behind the one in flight instead of double-borrowing.
pub struct Dispatcher {
    callbacks: RefCell<Callbacks>,
    pending: RefCell<Vec<GameEvent>>,
    muted: Cell<bool>,
    epoch: Cell<u64>,
}

impl Dispatcher {
    pub fn new(callbacks: Callbacks) -> Self {
        Self {
            callbacks: RefCell::new(callbacks),
            pending: RefCell::new(Vec::new()),
            muted: Cell::new(false),
            epoch: Cell::new(0),
        }
    }

    /// Deliver events to the host, in order. Only the outermost call drains
    /// the queue; nested calls enqueue and return.
    pub fn dispatch(&self, events: Vec<GameEvent>) {
        if self.muted.get() {
            return;
        }
        self.pending.borrow_mut().extend(events);
        let Ok(mut callbacks) = self.callbacks.try_borrow_mut() else {
            return;
        };
        loop {
            let batch = std::mem::take(&mut *self.pending.borrow_mut());
            if batch.is_empty() {
                return;
            }
            let epoch = self.epoch.get();
            for event in batch {
                // A handler tearing the game down abandons the rest of the
                // batch; anything a restart queued is picked up next round
                if self.epoch.get() != epoch {
                    break;
                }
                match event {
                    GameEvent::ScoreChanged(score) => (callbacks.on_score_changed)(score),
                    GameEvent::AmmoChanged(arrows) => (callbacks.on_ammo_changed)(arrows),
                    GameEvent::RunResolved { score, new_best } => {
                        (callbacks.on_run_resolved)(score, new_best)
                    }
                    GameEvent::BonusRequested => {
                        if let Some(cb) = callbacks.on_bonus_requested.as_mut() {
                            cb()
                        }
                    }
                    GameEvent::ArrowFired
                    | GameEvent::Hit { .. }
                    | GameEvent::Miss
                    | GameEvent::Escalated => {}
                }
            }
        }
    }

    /// Drop everything pending and stop delivering until [`Dispatcher::resume`].
    /// Part of teardown: after this returns no handler runs again.
    pub fn silence(&self) {
        self.muted.set(true);
        self.epoch.set(self.epoch.get() + 1);
        self.pending.borrow_mut().clear();
    }

    /// Re-enable delivery for a fresh run
    pub fn resume(&self) {
        self.muted.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts every callback invocation and records the last resolution
    #[derive(Default)]
    struct Probe {
        calls: Cell<u32>,
        last_score: Cell<u32>,
        last_ammo: Cell<u32>,
        resolved: Cell<Option<(u32, bool)>>,
        bonus_requests: Cell<u32>,
    }

    fn probed_controller(config: GameConfig) -> (Controller, Rc<Probe>) {
        let probe = Rc::new(Probe::default());
        let (p1, p2, p3, p4) = (probe.clone(), probe.clone(), probe.clone(), probe.clone());
        let callbacks = Callbacks {
            on_score_changed: Box::new(move |s| {
                p1.calls.set(p1.calls.get() + 1);
                p1.last_score.set(s);
            }),
            on_ammo_changed: Box::new(move |n| {
                p2.calls.set(p2.calls.get() + 1);
                p2.last_ammo.set(n);
            }),
            on_run_resolved: Box::new(move |score, best| {
                p3.calls.set(p3.calls.get() + 1);
                p3.resolved.set(Some((score, best)));
            }),
            on_bonus_requested: Some(Box::new(move || {
                p4.calls.set(p4.calls.get() + 1);
                p4.bonus_requests.set(p4.bonus_requests.get() + 1);
            })),
        };
        (Controller::new(config, callbacks), probe)
    }

    fn started(config: GameConfig) -> (Controller, Rc<Probe>) {
        let (mut controller, probe) = probed_controller(config);
        controller.resize(800.0, 600.0);
        controller.start(0, 1).unwrap();
        controller.assets_ready();
        (controller, probe)
    }

    #[test]
    fn test_start_requires_surface() {
        let (mut controller, _probe) = probed_controller(GameConfig::default());
        assert_eq!(controller.start(0, 1), Err(StartError::SurfaceUnavailable));
        assert_eq!(controller.phase(), RunPhase::Idle);

        controller.resize(800.0, 600.0);
        assert!(controller.start(0, 1).is_ok());
        assert_eq!(controller.phase(), RunPhase::Loading);
    }

    #[test]
    fn test_double_start_rejected() {
        let (mut controller, _probe) = probed_controller(GameConfig::default());
        controller.resize(800.0, 600.0);
        controller.start(0, 1).unwrap();
        assert_eq!(controller.start(0, 2), Err(StartError::AlreadyRunning));

        controller.assets_ready();
        assert_eq!(controller.phase(), RunPhase::Running);
        assert_eq!(controller.start(0, 3), Err(StartError::AlreadyRunning));
    }

    #[test]
    fn test_loop_unreachable_before_assets_ready() {
        let (mut controller, probe) = probed_controller(GameConfig::default());
        controller.resize(800.0, 600.0);
        controller.start(0, 1).unwrap();
        let calls = probe.calls.get();

        // Frames and fire intents during Loading do nothing
        for _ in 0..10 {
            assert!(controller.frame().is_empty());
        }
        assert!(controller.fire().is_empty());
        assert_eq!(probe.calls.get(), calls);
        assert_eq!(controller.phase(), RunPhase::Loading);
    }

    #[test]
    fn test_start_syncs_hud() {
        let config = GameConfig::default();
        let start_arrows = config.start_arrows;
        let (controller, probe) = started(config);
        assert_eq!(probe.last_score.get(), 0);
        assert_eq!(probe.last_ammo.get(), start_arrows);
        assert!(controller.is_running());
    }

    #[test]
    fn test_fire_reports_ammo() {
        let config = GameConfig::default();
        let start_arrows = config.start_arrows;
        let (mut controller, probe) = started(config);

        let events = controller.fire();
        assert!(events.contains(&GameEvent::ArrowFired));
        assert_eq!(probe.last_ammo.get(), start_arrows - 1);
    }

    #[test]
    fn test_empty_quiver_fire_requests_bonus() {
        let mut config = GameConfig::default();
        config.start_arrows = 0;
        let (mut controller, probe) = started(config);

        controller.fire();
        assert_eq!(probe.bonus_requests.get(), 1);
    }

    #[test]
    fn test_bonus_grant_only_while_running() {
        let mut config = GameConfig::default();
        config.start_arrows = 5;
        let (mut controller, probe) = started(config);

        controller.grant_bonus_arrows(5);
        assert_eq!(probe.last_ammo.get(), 10);

        controller.destroy();
        let events = controller.grant_bonus_arrows(5);
        assert!(events.is_empty());
    }

    #[test]
    fn test_run_resolves_after_last_arrow() {
        let mut config = GameConfig::default();
        config.start_arrows = 1;
        // A zero-height target scores nothing, so the single arrow cannot
        // earn a refill and the run must end when it lands
        config.target_height_ratio = 0.0;
        let (mut controller, probe) = probed_controller(config);
        controller.resize(800.0, 600.0);
        controller.start(0, 1).unwrap();
        controller.assets_ready();
        controller.fire();

        for _ in 0..10_000 {
            controller.frame();
            if !controller.is_running() {
                break;
            }
        }

        assert_eq!(controller.phase(), RunPhase::Resolved);
        let (score, new_best) = probe.resolved.get().expect("run never resolved");
        assert_eq!(score, 0);
        assert!(!new_best);
    }

    #[test]
    fn test_new_best_compares_against_previous() {
        let (mut controller, probe) = started(GameConfig::default());
        controller.state.previous_best = 50;
        controller.state.score = 60;
        controller.state.arrows = 0;

        controller.frame();
        assert_eq!(probe.resolved.get(), Some((60, true)));

        // Ties do not count as a new best
        let (mut controller, probe) = started(GameConfig::default());
        controller.state.previous_best = 60;
        controller.state.score = 60;
        controller.state.arrows = 0;
        controller.frame();
        assert_eq!(probe.resolved.get(), Some((60, false)));
    }

    #[test]
    fn test_destroy_silences_all_callbacks() {
        let config = GameConfig::default();
        let (mut controller, probe) = started(config);
        controller.fire();
        controller.frame();

        controller.destroy();
        let calls = probe.calls.get();

        // Any number of scheduler ticks after destroy: zero invocations
        for _ in 0..1_000 {
            assert!(controller.frame().is_empty());
        }
        assert!(controller.fire().is_empty());
        assert!(controller.grant_bonus_arrows(5).is_empty());
        assert_eq!(probe.calls.get(), calls);
    }

    #[test]
    fn test_destroy_is_idempotent_and_restartable() {
        let (mut controller, _probe) = started(GameConfig::default());
        controller.destroy();
        controller.destroy();
        assert_eq!(controller.phase(), RunPhase::Idle);

        // Startable again after teardown
        assert!(controller.start(0, 9).is_ok());
        controller.assets_ready();
        assert!(controller.is_running());
    }

    #[test]
    fn test_reset_leaves_resolved_only() {
        let (mut controller, _probe) = started(GameConfig::default());
        // Reset outside Resolved is a no-op
        controller.reset();
        assert!(controller.is_running());

        controller.state.phase = RunPhase::Resolved;
        controller.reset();
        assert_eq!(controller.phase(), RunPhase::Idle);
    }

    #[test]
    fn test_dispatcher_queues_reentrant_dispatch() {
        let order: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let slot: Rc<RefCell<Option<Rc<Dispatcher>>>> = Rc::new(RefCell::new(None));

        let mut callbacks = Callbacks::silent();
        let (o, s) = (order.clone(), slot.clone());
        callbacks.on_run_resolved = Box::new(move |score, _| {
            o.borrow_mut().push(format!("resolved {score}"));
            // A handler reaching back into the game mid-batch must not
            // interleave its events with the batch in flight
            if let Some(dispatcher) = s.borrow().as_ref() {
                dispatcher.dispatch(vec![GameEvent::ScoreChanged(99)]);
            }
        });
        let o = order.clone();
        callbacks.on_score_changed = Box::new(move |score| {
            o.borrow_mut().push(format!("score {score}"));
        });
        let o = order.clone();
        callbacks.on_ammo_changed = Box::new(move |arrows| {
            o.borrow_mut().push(format!("arrows {arrows}"));
        });

        let dispatcher = Rc::new(Dispatcher::new(callbacks));
        *slot.borrow_mut() = Some(dispatcher.clone());

        dispatcher.dispatch(vec![
            GameEvent::RunResolved {
                score: 5,
                new_best: false,
            },
            GameEvent::AmmoChanged(3),
        ]);

        assert_eq!(
            *order.borrow(),
            vec![
                "resolved 5".to_string(),
                "arrows 3".to_string(),
                "score 99".to_string(),
            ]
        );
    }

    #[test]
    fn test_dispatcher_silence_from_handler_stops_delivery() {
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
        let slot: Rc<RefCell<Option<Rc<Dispatcher>>>> = Rc::new(RefCell::new(None));

        let mut callbacks = Callbacks::silent();
        let (o, s) = (order.clone(), slot.clone());
        callbacks.on_run_resolved = Box::new(move |_, _| {
            o.borrow_mut().push("resolved");
            // Teardown from inside a handler: nothing after this may land
            if let Some(dispatcher) = s.borrow().as_ref() {
                dispatcher.silence();
            }
        });
        let o = order.clone();
        callbacks.on_score_changed = Box::new(move |_| o.borrow_mut().push("score"));

        let dispatcher = Rc::new(Dispatcher::new(callbacks));
        *slot.borrow_mut() = Some(dispatcher.clone());

        dispatcher.dispatch(vec![
            GameEvent::RunResolved {
                score: 1,
                new_best: false,
            },
            GameEvent::ScoreChanged(7),
        ]);
        assert_eq!(*order.borrow(), vec!["resolved"]);

        // Still muted afterwards
        dispatcher.dispatch(vec![GameEvent::ScoreChanged(8)]);
        assert_eq!(*order.borrow(), vec!["resolved"]);

        // A fresh start resumes delivery
        dispatcher.resume();
        dispatcher.dispatch(vec![GameEvent::ScoreChanged(9)]);
        assert_eq!(*order.borrow(), vec!["resolved", "score"]);
    }

    #[test]
    fn test_resize_mid_run_preserves_progress() {
        let (mut controller, _probe) = started(GameConfig::default());
        controller.fire();
        controller.frame();
        let arrows = controller.state().arrows;
        let score = controller.state().score;

        controller.resize(1024.0, 768.0);
        assert_eq!(controller.state().arrows, arrows);
        assert_eq!(controller.state().score, score);
        assert!(controller.is_running());
        assert_eq!(controller.viewport(), Viewport::new(1024.0, 768.0));
    }
}
