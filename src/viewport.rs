//! Viewport management
//!
//! Tracks the drawable surface's logical size and re-derives every
//! size-dependent entity field when it changes. The simulation never caches
//! dimensions across frames; it is always handed the current [`Viewport`].

use crate::config::GameConfig;
use crate::sim::state::{Band, GameState};

/// Logical size of the drawable surface
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A zero-area surface cannot host a run; layout defers until it grows
    pub fn is_usable(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Re-derive anchors, extents, and oscillation bands from the current
/// dimensions, clamping current positions into the new bands. Score and
/// arrows are untouched; calling this with an unchanged size is a no-op
/// beyond the redundant recomputation.
pub fn layout(state: &mut GameState, viewport: Viewport, config: &GameConfig) {
    if !viewport.is_usable() {
        return;
    }
    let w = viewport.width;
    let h = viewport.height;

    state.bow.height = h * config.bow_height_ratio;
    state.bow.width = state.bow.height * config.bow_aspect;
    state.bow.pos.x = w * config.bow_margin;
    state.bow.band = Band::new(h * config.bow_band_inset, h * (1.0 - config.bow_band_inset));
    state.bow.pos.y = state.bow.band.clamp(state.bow.pos.y);

    state.target.height = h * config.target_height_ratio;
    state.target.width = state.target.height * config.target_aspect;
    state.target.pos.x = w * (1.0 - config.target_margin);
    state.target.band = Band::new(
        h * config.target_band_inset,
        h * (1.0 - config.target_band_inset),
    );
    state.target.pos.y = state.target.band.clamp(state.target.pos.y);

    state.arrow.length = w * config.arrow_length_ratio;
    state.arrow.thickness = h * config.arrow_thickness_ratio;
    if !state.arrow.in_flight {
        state.arrow.nock_to(&state.bow);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_derives_geometry() {
        let config = GameConfig::default();
        let mut state = GameState::new(&config);
        layout(&mut state, Viewport::new(800.0, 600.0), &config);

        assert_eq!(state.bow.height, 180.0);
        assert_eq!(state.bow.band.min, 90.0);
        assert_eq!(state.bow.band.max, 510.0);
        assert!(state.target.pos.x > 600.0);
        assert!(state.target.band.min < state.bow.band.min);
    }

    #[test]
    fn test_zero_sized_surface_defers() {
        let config = GameConfig::default();
        let mut state = GameState::new(&config);
        layout(&mut state, Viewport::new(0.0, 0.0), &config);

        assert_eq!(state.bow.height, 0.0);
        assert_eq!(state.bow.band, Band::default());
    }

    #[test]
    fn test_layout_is_idempotent() {
        let config = GameConfig::default();
        let mut state = GameState::new(&config);
        let viewport = Viewport::new(640.0, 480.0);

        layout(&mut state, viewport, &config);
        let snapshot = state.clone();
        layout(&mut state, viewport, &config);

        assert_eq!(state.bow.pos, snapshot.bow.pos);
        assert_eq!(state.target.band, snapshot.target.band);
        assert_eq!(state.arrow.length, snapshot.arrow.length);
    }

    #[test]
    fn test_resize_preserves_run_progress() {
        let config = GameConfig::default();
        let mut state = GameState::new(&config);
        layout(&mut state, Viewport::new(800.0, 600.0), &config);
        state.score = 17;
        state.arrows = 4;
        state.bow.pos.y = 500.0;

        layout(&mut state, Viewport::new(400.0, 300.0), &config);

        assert_eq!(state.score, 17);
        assert_eq!(state.arrows, 4);
        // Position clamped into the new, smaller band
        assert!(state.bow.band.contains(state.bow.pos.y));
        assert_eq!(state.bow.pos.y, state.bow.band.max);
    }

    #[test]
    fn test_layout_keeps_nocked_arrow_on_bow() {
        let config = GameConfig::default();
        let mut state = GameState::new(&config);
        layout(&mut state, Viewport::new(800.0, 600.0), &config);
        assert_eq!(state.arrow.pos, state.bow.nock_point());

        // An in-flight arrow is left alone
        state.arrow.in_flight = true;
        state.arrow.pos.x = 400.0;
        layout(&mut state, Viewport::new(900.0, 700.0), &config);
        assert_eq!(state.arrow.pos.x, 400.0);
    }
}
