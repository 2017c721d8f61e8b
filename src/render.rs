//! Canvas 2D rendering
//!
//! Draws the current simulation state once per frame. Rendering is pure
//! output: it never mutates the simulation, and a missing sprite degrades to
//! a flat-color fallback shape instead of stalling or panicking the frame.

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::assets::{AssetKey, AssetStore};
use crate::sim::GameState;
use crate::viewport::Viewport;

/// Fallback fills used when a sprite failed to load
mod fallback {
    pub const SKY: &str = "#87ceeb";
    pub const BOW: &str = "#8b5a2b";
    pub const TARGET: &str = "#e23b3b";
    pub const ARROW: &str = "#2f2f2f";
}

pub struct Renderer {
    ctx: CanvasRenderingContext2d,
}

impl Renderer {
    /// Grab the canvas's 2D context. `None` (logged) if the context is
    /// unavailable; the game then runs without visuals rather than crashing.
    pub fn new(canvas: &HtmlCanvasElement) -> Option<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|obj| obj.dyn_into::<CanvasRenderingContext2d>().ok());
        if ctx.is_none() {
            log::error!("2d canvas context unavailable; rendering disabled");
        }
        ctx.map(|ctx| Self { ctx })
    }

    /// Draw one frame. `assets` may be `None` while the batch is still
    /// loading; everything falls back.
    pub fn draw(&self, state: &GameState, viewport: Viewport, assets: Option<&AssetStore>) {
        if !viewport.is_usable() {
            return;
        }
        let (w, h) = (viewport.width as f64, viewport.height as f64);
        self.ctx.clear_rect(0.0, 0.0, w, h);

        match assets.and_then(|store| store.image(AssetKey::Background)) {
            Some(image) => self.blit(image, 0.0, 0.0, w, h),
            None => self.fill_rect(fallback::SKY, 0.0, 0.0, w, h),
        }

        let bow = &state.bow;
        let (bw, bh) = (bow.width as f64, bow.height as f64);
        // The bow sprite anchors at its left edge, vertically centered
        let (bx, by) = (bow.pos.x as f64, bow.pos.y as f64 - bh / 2.0);
        match assets.and_then(|store| store.image(AssetKey::BowSprite)) {
            Some(image) => self.blit(image, bx, by, bw, bh),
            None => self.fill_rect(fallback::BOW, bx, by, bw, bh),
        }

        let target = &state.target;
        let (tw, th) = (target.width as f64, target.height as f64);
        let (tx, ty) = (target.pos.x as f64 - tw / 2.0, target.pos.y as f64 - th / 2.0);
        match assets.and_then(|store| store.image(AssetKey::TargetSprite)) {
            Some(image) => self.blit(image, tx, ty, tw, th),
            None => self.fill_rect(fallback::TARGET, tx, ty, tw, th),
        }

        if state.arrow.in_flight {
            let arrow = &state.arrow;
            let (al, at) = (arrow.length as f64, arrow.thickness as f64);
            let (ax, ay) = (arrow.pos.x as f64 - al / 2.0, arrow.pos.y as f64 - at / 2.0);
            match assets.and_then(|store| store.image(AssetKey::ArrowSprite)) {
                Some(image) => self.blit(image, ax, ay, al, at),
                None => self.fill_rect(fallback::ARROW, ax, ay, al, at),
            }
        }
    }

    fn blit(&self, image: &HtmlImageElement, x: f64, y: f64, w: f64, h: f64) {
        // A draw failure is a lost frame, never a lost run
        let _ = self
            .ctx
            .draw_image_with_html_image_element_and_dw_and_dh(image, x, y, w, h);
    }

    fn fill_rect(&self, style: &str, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.set_fill_style_str(style);
        self.ctx.fill_rect(x, y, w, h);
    }
}
