//! Pure simulation module
//!
//! All gameplay logic lives here. This module must stay platform-free:
//! - Frame-count timestep only (scoring never depends on wall time)
//! - Seeded RNG only
//! - No rendering or browser dependencies

pub mod state;
pub mod tick;

pub use state::{Aabb, Arrow, Band, Bow, GameEvent, GameState, RunPhase, Target};
pub use tick::{FrameOutcome, score_hit, tick};
