//! Arrow Rush - a canvas archery mini-game engine
//!
//! Core modules:
//! - `sim`: Pure simulation (entities, per-frame step, scoring)
//! - `game`: Lifecycle controller and host callback contract
//! - `viewport`: Logical surface size and entity layout
//! - `input`: Pointer/touch/keyboard normalization into one fire intent
//! - `assets`: Named-URI manifest and settle-all concurrent loader
//! - `config`: Named tunables with LocalStorage persistence
//! - `platform`: Browser embedding (rAF loop, listeners, ResizeObserver)
//! - `render` / `audio`: Canvas 2D drawing and sound cues (web only)

pub mod assets;
pub mod config;
pub mod game;
pub mod input;
pub mod platform;
pub mod sim;
pub mod viewport;

#[cfg(target_arch = "wasm32")]
pub mod audio;
#[cfg(target_arch = "wasm32")]
pub mod render;

pub use config::GameConfig;
pub use game::{Callbacks, Controller, Dispatcher, StartError};
pub use sim::{GameEvent, RunPhase};
pub use viewport::Viewport;
