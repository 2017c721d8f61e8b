//! Browser embedding
//!
//! Wraps the [`Controller`] in the single-threaded `Rc<RefCell<_>>` shape the
//! wasm event model wants, and wires it to the real page: canvas sizing, a
//! ResizeObserver, pointer/touch/keyboard listeners, the rAF loop, and the
//! asset batch. Teardown is all-or-nothing: `destroy()` cancels the pending
//! frame, detaches every listener, disconnects the observer, and drops the
//! assets in one synchronous call, so no callback can fire afterwards.
//!
//! Host callbacks are delivered through a [`Dispatcher`] after the instance
//! borrow is released, so a handler may synchronously destroy or restart the
//! game (replay from `on_run_resolved`, a refill from `on_bonus_requested`)
//! without tripping a double borrow.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{EventTarget, HtmlCanvasElement, ResizeObserver};

use crate::assets::{AssetManifest, AssetStore, load_all};
use crate::audio;
use crate::config::GameConfig;
use crate::game::{Callbacks, Controller, Dispatcher, StartError};
use crate::input::{RawInput, is_fire, wants_default_suppressed};
use crate::render::Renderer;
use crate::sim::GameEvent;

type LoopHandle = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// An attached DOM listener that can be detached as a unit
struct ListenerHandle {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl ListenerHandle {
    fn attach(
        target: &EventTarget,
        event: &'static str,
        f: impl FnMut(web_sys::Event) + 'static,
    ) -> Self {
        let closure = Closure::wrap(Box::new(f) as Box<dyn FnMut(web_sys::Event)>);
        let _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        Self {
            target: target.clone(),
            event,
            closure,
        }
    }

    fn detach(&self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref());
    }
}

struct Inner {
    controller: Controller,
    canvas: HtmlCanvasElement,
    renderer: Option<Renderer>,
    manifest: AssetManifest,
    assets: Option<AssetStore>,
    listeners: Vec<ListenerHandle>,
    observer: Option<(ResizeObserver, Closure<dyn FnMut(js_sys::Array)>)>,
    loop_handle: LoopHandle,
    raf_id: Option<i32>,
    /// Bumped on every start and destroy; stale async completions (an asset
    /// batch finishing after teardown) compare against it and bail out
    generation: u64,
}

impl Inner {
    fn play_cues(&self, events: &[GameEvent]) {
        if let Some(store) = self.assets.as_ref() {
            let volume = self.controller.config().sfx_volume;
            for event in events {
                audio::cue_for_event(store, event, volume);
            }
        }
    }

    fn render(&self) {
        if let Some(renderer) = self.renderer.as_ref() {
            renderer.draw(
                self.controller.state(),
                self.controller.viewport(),
                self.assets.as_ref(),
            );
        }
    }

    /// Match the canvas buffer to its CSS size and hand the new logical
    /// dimensions to the controller
    fn sync_canvas_size(&mut self) {
        let width = self.canvas.offset_width().max(0) as u32;
        let height = self.canvas.offset_height().max(0) as u32;
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.controller.resize(width as f32, height as f32);
    }
}

/// A fully wired game instance, cloneable into event closures
#[derive(Clone)]
pub struct WebGame {
    inner: Rc<RefCell<Inner>>,
    /// Host callback delivery, kept outside `inner` so a handler can call
    /// straight back into the game without re-borrowing it
    dispatcher: Rc<Dispatcher>,
}

impl WebGame {
    pub fn new(canvas: HtmlCanvasElement, config: GameConfig, callbacks: Callbacks) -> Self {
        let renderer = Renderer::new(&canvas);
        Self {
            inner: Rc::new(RefCell::new(Inner {
                // The controller's own callback slots stay silent here;
                // events reach the host through the dispatcher once the
                // instance borrow is gone
                controller: Controller::new(config, Callbacks::silent()),
                canvas,
                renderer,
                manifest: AssetManifest::default(),
                assets: None,
                listeners: Vec::new(),
                observer: None,
                loop_handle: Rc::new(RefCell::new(None)),
                raf_id: None,
                generation: 0,
            })),
            dispatcher: Rc::new(Dispatcher::new(callbacks)),
        }
    }

    /// Replace the default asset URIs before the first `start()`
    pub fn with_manifest(self, manifest: AssetManifest) -> Self {
        self.inner.borrow_mut().manifest = manifest;
        self
    }

    /// Begin a run. Sizes the canvas, validates the surface, then loads the
    /// asset batch; the loop starts once every asset has settled. Callable
    /// again after `destroy()`.
    pub fn start(&self, previous_best: u32) -> Result<(), StartError> {
        let generation;
        let hud_events;
        {
            let mut inner = self.inner.borrow_mut();
            inner.sync_canvas_size();
            let seed = js_sys::Date::now() as u64;
            hud_events = inner.controller.start(previous_best, seed)?;
            inner.generation += 1;
            generation = inner.generation;
        }
        self.dispatcher.resume();
        self.attach_resize_observer();
        self.render_once();

        let game = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let manifest = game.inner.borrow().manifest.clone();
            let store = load_all(&manifest).await;
            {
                let mut inner = game.inner.borrow_mut();
                if inner.generation != generation {
                    // Torn down (or restarted) while loading; drop the batch
                    return;
                }
                inner.assets = Some(store);
                inner.controller.assets_ready();
            }
            game.attach_input();
            game.start_loop();
        });
        self.dispatcher.dispatch(hud_events);
        Ok(())
    }

    /// Host-driven fire (a UI button); the listeners funnel here too
    pub fn fire(&self) {
        let events = {
            let mut inner = self.inner.borrow_mut();
            let events = inner.controller.fire();
            inner.play_cues(&events);
            events
        };
        self.dispatcher.dispatch(events);
    }

    /// External reward signal: extra arrows mid-run
    pub fn grant_bonus_arrows(&self, count: u32) {
        let events = self.inner.borrow_mut().controller.grant_bonus_arrows(count);
        self.dispatcher.dispatch(events);
    }

    /// Full teardown: cancel the pending frame, drop the loop closure,
    /// detach listeners, disconnect the observer, release assets. Idempotent,
    /// and guaranteed to leave no scheduled work behind.
    pub fn destroy(&self) {
        self.dispatcher.silence();
        let mut inner = self.inner.borrow_mut();
        inner.generation += 1;

        if let Some(id) = inner.raf_id.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
        inner.loop_handle.borrow_mut().take();

        for listener in inner.listeners.drain(..) {
            listener.detach();
        }
        if let Some((observer, _closure)) = inner.observer.take() {
            observer.disconnect();
        }
        inner.assets = None;
        inner.controller.destroy();
        log::info!("game instance destroyed");
    }

    fn render_once(&self) {
        self.inner.borrow().render();
    }

    fn attach_resize_observer(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.observer.is_some() {
            return;
        }
        let game = self.clone();
        let closure = Closure::wrap(Box::new(move |_entries: js_sys::Array| {
            // try_borrow: a resize notification may land while a frame holds
            // the borrow; the next frame reads fresh dimensions anyway
            if let Ok(mut inner) = game.inner.try_borrow_mut() {
                inner.sync_canvas_size();
                inner.render();
            }
        }) as Box<dyn FnMut(js_sys::Array)>);

        match ResizeObserver::new(closure.as_ref().unchecked_ref()) {
            Ok(observer) => {
                observer.observe(&inner.canvas);
                inner.observer = Some((observer, closure));
            }
            Err(err) => log::warn!("ResizeObserver unavailable: {err:?}"),
        }
    }

    fn attach_input(&self) {
        let mut inner = self.inner.borrow_mut();
        if !inner.listeners.is_empty() {
            return;
        }
        let canvas_target: &EventTarget = inner.canvas.as_ref();

        let game = self.clone();
        let click = ListenerHandle::attach(canvas_target, "click", move |event| {
            game.handle_raw_input(RawInput::PointerDown, &event);
        });

        let game = self.clone();
        let touch = ListenerHandle::attach(canvas_target, "touchstart", move |event| {
            game.handle_raw_input(RawInput::TouchStart, &event);
        });

        let mut listeners = vec![click, touch];

        if let Some(window) = web_sys::window() {
            let game = self.clone();
            let keydown = ListenerHandle::attach(window.as_ref(), "keydown", move |event| {
                let code = event
                    .dyn_ref::<web_sys::KeyboardEvent>()
                    .map(|e| e.code())
                    .unwrap_or_default();
                game.handle_raw_input(RawInput::Key(code), &event);
            });
            listeners.push(keydown);
        }

        inner.listeners = listeners;
    }

    fn handle_raw_input(&self, raw: RawInput, event: &web_sys::Event) {
        let fire_key = self.inner.borrow().controller.config().fire_key.clone();
        if !is_fire(&raw, &fire_key) {
            return;
        }
        if wants_default_suppressed(&raw) {
            // Stops scroll/zoom and the synthetic click that would
            // double-trigger after a touch
            event.prevent_default();
        }
        self.fire();
    }

    /// Install the frame closure and schedule the first frame. The closure
    /// lives in `loop_handle` so destroy can drop it; each invocation
    /// re-schedules itself only while the run is still going.
    fn start_loop(&self) {
        let handle = self.inner.borrow().loop_handle.clone();
        let game = self.clone();
        let reschedule = handle.clone();
        *handle.borrow_mut() = Some(Closure::wrap(Box::new(move |_timestamp: f64| {
            let events = {
                let mut inner = game.inner.borrow_mut();
                if inner.raf_id.is_none() {
                    // Destroyed between scheduling and delivery
                    return;
                }
                inner.raf_id = None;
                let events = inner.controller.frame();
                inner.play_cues(&events);
                inner.render();
                events
            };
            // Borrow released: a handler may destroy or restart from here
            game.dispatcher.dispatch(events);
            let keep_going = game.inner.borrow().controller.is_running();
            if keep_going {
                let id = reschedule
                    .borrow()
                    .as_ref()
                    .and_then(|closure| request_frame(closure));
                game.inner.borrow_mut().raf_id = id;
            } else {
                // Run over: release the closure so nothing stays scheduled
                reschedule.borrow_mut().take();
            }
        }) as Box<dyn FnMut(f64)>));

        let id = handle
            .borrow()
            .as_ref()
            .and_then(|closure| request_frame(closure));
        self.inner.borrow_mut().raf_id = id;
    }
}

fn request_frame(closure: &Closure<dyn FnMut(f64)>) -> Option<i32> {
    web_sys::window()?
        .request_animation_frame(closure.as_ref().unchecked_ref())
        .ok()
}
