//! Per-frame simulation step
//!
//! One call per display frame: advance the oscillators, fly the arrow,
//! resolve hits and misses, and report whether the run ended naturally.
//! Scoring is frame-count based and independent of real elapsed time.

use crate::config::GameConfig;
use crate::viewport::Viewport;

use super::state::{GameEvent, GameState, RunPhase};

/// What the loop driver should do after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Request the next frame
    Continue,
    /// Out of arrows with nothing in flight; the controller resolves the run
    Resolved,
}

/// Advance the simulation by one frame.
///
/// Frame order: bow, target, arrow, collision, resolution check. Never
/// panics; a non-running phase or unusable surface short-circuits the frame.
pub fn tick(state: &mut GameState, viewport: Viewport, config: &GameConfig) -> FrameOutcome {
    if state.phase != RunPhase::Running || !viewport.is_usable() {
        return FrameOutcome::Continue;
    }

    state.bow.advance();
    state.target.advance();

    if state.arrow.in_flight {
        state.arrow.pos.x += state.arrow.dx;
        if state.arrow.aabb().intersects(&state.target.aabb()) {
            resolve_hit(state, config);
        } else if state.arrow.pos.x > viewport.width {
            state.events.push(GameEvent::Miss);
            state.arrow.nock_to(&state.bow);
        }
    } else {
        state.arrow.nock_to(&state.bow);
    }

    // End-of-run is only ever detected with the arrow nocked, never mid-flight
    if state.arrows == 0 && !state.arrow.in_flight {
        return FrameOutcome::Resolved;
    }
    FrameOutcome::Continue
}

/// Points for a hit at vertical distance `offset` from the target center:
/// a linear falloff from `max_points` at dead center to 0 at the outer edge,
/// in `score_rings` discrete steps.
pub fn score_hit(offset: f32, target_height: f32, config: &GameConfig) -> u32 {
    if target_height <= 0.0 || config.score_rings == 0 {
        return 0;
    }
    let ring = target_height / config.score_rings as f32;
    let steps = (offset / ring).floor() as i64;
    (config.max_points as i64 - steps).clamp(0, config.max_points as i64) as u32
}

fn resolve_hit(state: &mut GameState, config: &GameConfig) {
    let offset = (state.arrow.pos.y - state.target.pos.y).abs();
    let points = score_hit(offset, state.target.height, config);

    state.events.push(GameEvent::Hit { points });
    if points > 0 {
        state.score += points;
        state.events.push(GameEvent::ScoreChanged(state.score));
    }
    if points >= config.bullseye_points {
        state.arrows += config.bonus_arrows;
        state.events.push(GameEvent::AmmoChanged(state.arrows));
    }

    state.arrow.nock_to(&state.bow);
    escalate(state, config);
}

/// One-time difficulty bump: the first time the score passes the threshold,
/// the bow's speed magnitude is multiplied, exactly once per run.
fn escalate(state: &mut GameState, config: &GameConfig) {
    if state.score > config.escalation_threshold && !state.bow.escalated {
        state.bow.dy *= config.escalation_factor;
        state.bow.escalated = true;
        state.events.push(GameEvent::Escalated);
    }
}
