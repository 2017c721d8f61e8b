//! Entity model and run state
//!
//! Pure data plus per-frame update rules. Nothing here touches rendering or
//! the platform; the browser glue observes this state through [`GameEvent`]s.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::GameConfig;
use crate::viewport::Viewport;

/// Lifecycle phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Entities exist but nothing advances; input is ignored
    Idle,
    /// `start()` accepted, assets still in flight
    Loading,
    /// Loop advancing, input accepted
    Running,
    /// Run over, final score fixed
    Resolved,
}

/// Observable state changes, drained once per frame (or per accepted input)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    ScoreChanged(u32),
    AmmoChanged(u32),
    /// An arrow left the bow
    ArrowFired,
    /// An in-flight arrow intersected the target
    Hit { points: u32 },
    /// An in-flight arrow left the surface
    Miss,
    /// The one-time bow speed-up kicked in
    Escalated,
    /// Fire attempted with no arrows left; the host may offer a refill
    BonusRequested,
    RunResolved { score: u32, new_best: bool },
}

/// Closed vertical band an oscillating entity may occupy
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Band {
    pub min: f32,
    pub max: f32,
}

impl Band {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, y: f32) -> f32 {
        y.clamp(self.min, self.max)
    }

    pub fn contains(&self, y: f32) -> bool {
        y >= self.min && y <= self.max
    }

    pub fn center(&self) -> f32 {
        (self.min + self.max) / 2.0
    }
}

/// Advance y by dy inside a band, reflecting (and clamping) at the bounds.
/// The clamp guarantees the band invariant holds even when a speed change
/// would carry the entity past an edge in a single step.
fn reflect_step(y: f32, dy: f32, band: Band) -> (f32, f32) {
    let next = y + dy;
    if next >= band.max {
        (band.max, -dy.abs())
    } else if next <= band.min {
        (band.min, dy.abs())
    } else {
        (next, dy)
    }
}

/// Axis-aligned box used for the arrow/target intersection test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, width: f32, height: f32) -> Self {
        let half = Vec2::new(width / 2.0, height / 2.0);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Overlap on both axes
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

/// The player's bow: x fixed near the left edge, y oscillating
#[derive(Debug, Clone)]
pub struct Bow {
    pub pos: Vec2,
    /// Signed vertical speed in pixels per frame
    pub dy: f32,
    pub width: f32,
    pub height: f32,
    pub band: Band,
    /// One-shot difficulty flag; set once the speed-up has been applied
    pub escalated: bool,
}

impl Bow {
    pub fn advance(&mut self) {
        let (y, dy) = reflect_step(self.pos.y, self.dy, self.band);
        self.pos.y = y;
        self.dy = dy;
    }

    /// Where a nocked arrow rests
    pub fn nock_point(&self) -> Vec2 {
        Vec2::new(self.pos.x + self.width / 2.0, self.pos.y)
    }
}

/// The target: x fixed near the right edge, independent oscillation
#[derive(Debug, Clone)]
pub struct Target {
    pub pos: Vec2,
    pub dy: f32,
    pub width: f32,
    pub height: f32,
    pub band: Band,
}

impl Target {
    pub fn advance(&mut self) {
        let (y, dy) = reflect_step(self.pos.y, self.dy, self.band);
        self.pos.y = y;
        self.dy = dy;
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.pos, self.width, self.height)
    }
}

/// The arrow: nocked to the bow until fired, then straight flight rightward
#[derive(Debug, Clone)]
pub struct Arrow {
    pub pos: Vec2,
    /// Horizontal speed in pixels per frame while in flight
    pub dx: f32,
    pub length: f32,
    pub thickness: f32,
    pub in_flight: bool,
}

impl Arrow {
    /// Return to the nocked state, tracking the bow
    pub fn nock_to(&mut self, bow: &Bow) {
        self.in_flight = false;
        self.pos = bow.nock_point();
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.pos, self.length, self.thickness)
    }
}

/// Complete simulation state for one game instance
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed (target phase variation)
    pub seed: u64,
    pub score: u32,
    pub arrows: u32,
    /// Best score carried in from the host; read-only, reported against at
    /// resolution but never mutated here
    pub previous_best: u32,
    pub phase: RunPhase,
    pub bow: Bow,
    pub target: Target,
    pub arrow: Arrow,
    /// Pending observable changes, drained by the lifecycle controller
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Idle state with zero geometry; a layout pass sizes the entities
    pub fn new(config: &GameConfig) -> Self {
        Self {
            seed: 0,
            score: 0,
            arrows: config.start_arrows,
            previous_best: 0,
            phase: RunPhase::Idle,
            bow: Bow {
                pos: Vec2::ZERO,
                dy: config.bow_speed,
                width: 0.0,
                height: 0.0,
                band: Band::default(),
                escalated: false,
            },
            target: Target {
                pos: Vec2::ZERO,
                dy: config.target_speed,
                width: 0.0,
                height: 0.0,
                band: Band::default(),
            },
            arrow: Arrow {
                pos: Vec2::ZERO,
                dx: config.arrow_speed,
                length: 0.0,
                thickness: 0.0,
                in_flight: false,
            },
            events: Vec::new(),
        }
    }

    /// Reset score, arrows, speeds, and flags for a fresh run
    pub fn reset_run(&mut self, previous_best: u32, seed: u64, config: &GameConfig) {
        self.seed = seed;
        self.score = 0;
        self.arrows = config.start_arrows;
        self.previous_best = previous_best;
        self.bow.dy = config.bow_speed;
        self.bow.escalated = false;
        self.target.dy = config.target_speed;
        self.arrow.dx = config.arrow_speed;
        self.arrow.in_flight = false;
        self.events.clear();
    }

    /// Position entities for the start of a run. The bow starts at its band
    /// center; the target starts centered or, when `randomize_target` is on,
    /// at a seeded height and direction.
    pub fn place_entities(&mut self, viewport: Viewport, config: &GameConfig) {
        if !viewport.is_usable() {
            return;
        }
        self.bow.pos.y = self.bow.band.center();

        if config.randomize_target {
            let mut rng = Pcg32::seed_from_u64(self.seed);
            let band = self.target.band;
            if band.max > band.min {
                self.target.pos.y = rng.random_range(band.min..=band.max);
            } else {
                self.target.pos.y = band.center();
            }
            if rng.random_bool(0.5) {
                self.target.dy = -self.target.dy.abs();
            }
        } else {
            self.target.pos.y = self.target.band.center();
        }

        self.arrow.nock_to(&self.bow);
    }

    /// Attempt to launch the arrow. Accepted only while Running, with the
    /// arrow nocked and at least one arrow left; an empty quiver surfaces a
    /// bonus request instead.
    pub fn try_fire(&mut self) -> bool {
        if self.phase != RunPhase::Running || self.arrow.in_flight {
            return false;
        }
        if self.arrows == 0 {
            self.events.push(GameEvent::BonusRequested);
            return false;
        }
        self.arrows -= 1;
        self.arrow.in_flight = true;
        self.events.push(GameEvent::ArrowFired);
        self.events.push(GameEvent::AmmoChanged(self.arrows));
        true
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
