//! Platform embedding
//!
//! Maps the platform-free controller onto a real host: on the web that means
//! requestAnimationFrame scheduling, DOM event listeners, a ResizeObserver,
//! and asynchronous asset loading. Native builds drive the controller
//! directly (see the headless demo in `main.rs`).

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::WebGame;
