//! Arrow Rush entry point
//!
//! On the web this wires the game to the page: HUD elements, the best-score
//! slot in LocalStorage, and the replay button. Natively it runs a scripted
//! headless demo of the simulation.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_page {
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;

    use arrow_rush::config::GameConfig;
    use arrow_rush::game::Callbacks;
    use arrow_rush::platform::WebGame;

    const BEST_SCORE_KEY: &str = "arrow_rush_best";

    fn set_text(id: &str, text: &str) {
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            if let Some(el) = document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn set_hidden(id: &str, hidden: bool) {
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            if let Some(el) = document.get_element_by_id(id) {
                let _ = el.set_attribute("class", if hidden { "hidden" } else { "" });
            }
        }
    }

    fn load_best_score() -> u32 {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .and_then(|storage| storage.get_item(BEST_SCORE_KEY).ok().flatten())
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0)
    }

    fn store_best_score(score: u32) {
        if let Some(storage) = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
        {
            let _ = storage.set_item(BEST_SCORE_KEY, &score.to_string());
        }
    }

    fn page_callbacks() -> Callbacks {
        Callbacks {
            on_score_changed: Box::new(|score| {
                set_text("hud-score", &score.to_string());
            }),
            on_ammo_changed: Box::new(|arrows| {
                set_text("hud-arrows", &arrows.to_string());
            }),
            on_run_resolved: Box::new(|score, new_best| {
                set_text("final-score", &score.to_string());
                set_hidden("new-best", !new_best);
                set_hidden("game-over", false);
                if new_best {
                    store_best_score(score);
                }
            }),
            on_bonus_requested: Some(Box::new(|| {
                // Out of arrows; surface the refill offer if the page has one
                set_hidden("bonus-offer", false);
            })),
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Arrow Rush starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: web_sys::HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let game = WebGame::new(canvas, GameConfig::load(), page_callbacks());

        if let Err(err) = game.start(load_best_score()) {
            log::error!("could not start: {err}");
        }

        // Replay button: tear down fully, then start a fresh run
        if let Some(btn) = document.get_element_by_id("replay-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                set_hidden("game-over", true);
                game.destroy();
                if let Err(err) = game.start(load_best_score()) {
                    log::error!("could not restart: {err}");
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Optional refill button (the ad-reward hook)
        if let Some(btn) = document.get_element_by_id("bonus-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                set_hidden("bonus-offer", true);
                game.grant_bonus_arrows(5);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        log::info!("Arrow Rush running!");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_page::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::time::{SystemTime, UNIX_EPOCH};

    use arrow_rush::config::GameConfig;
    use arrow_rush::game::{Callbacks, Controller};

    env_logger::init();
    log::info!("Arrow Rush (native) starting headless demo...");

    let callbacks = Callbacks {
        on_score_changed: Box::new(|score| println!("score: {score}")),
        on_ammo_changed: Box::new(|arrows| println!("arrows: {arrows}")),
        on_run_resolved: Box::new(|score, new_best| {
            println!("run over: {score} points{}", if new_best { " - new best!" } else { "" })
        }),
        on_bonus_requested: None,
    };

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let mut controller = Controller::new(GameConfig::default(), callbacks);
    controller.resize(800.0, 600.0);
    if let Err(err) = controller.start(25, seed) {
        eprintln!("could not start: {err}");
        return;
    }
    controller.assets_ready();

    // Scripted run: loose an arrow every 30 frames until the quiver empties
    let mut frame = 0u64;
    while controller.is_running() && frame < 100_000 {
        if frame % 30 == 0 {
            controller.fire();
        }
        controller.frame();
        frame += 1;
    }
    println!("demo finished after {frame} frames");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
