//! Ingredient Rush entry point
//!
//! On the web this wires the DOM (canvas, HUD, buttons, focus events) to a
//! `Game`. Natively it runs a seeded headless autoplay session and logs the
//! result, which is handy for balancing and for smoke-testing the loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};

    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, MouseEvent, TouchEvent, Window};

    use ingredient_rush::audio::WebAudio;
    use ingredient_rush::input::{CanvasMetrics, PointerInput};
    use ingredient_rush::persistence::LocalStorageStore;
    use ingredient_rush::platform::AnimationFrameScheduler;
    use ingredient_rush::renderer::dom::DomHud;
    use ingredient_rush::sim::Phase;
    use ingredient_rush::{Game, GameConfig, Settings};

    type Shared = Rc<RefCell<Game>>;

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if let Err(err) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("logger init failed: {err}").into());
        }

        log::info!("Ingredient Rush starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        fit_canvas(&canvas);

        let config = GameConfig {
            canvas_width: canvas.width() as f32,
            canvas_height: canvas.height() as f32,
            ..GameConfig::default()
        };
        let seed = js_sys::Date::now() as u64;

        let scheduler = AnimationFrameScheduler::new(window.clone());
        let slot = scheduler.callback_slot();
        let game = Game::new(config, seed)
            .map_err(|err| JsValue::from_str(&err.to_string()))?
            .with_scheduler(Box::new(scheduler))
            .with_renderer(Box::new(DomHud::new(document.clone(), canvas.clone().into())))
            .with_audio(Box::new(WebAudio::new()))
            .with_store(Box::new(LocalStorageStore::new()))
            .with_settings(Settings::load());
        let game: Shared = Rc::new(RefCell::new(game));
        game.borrow_mut().set_canvas_metrics(metrics(&canvas));

        log::info!("Game initialized with seed: {}", seed);

        // The scheduler holds the frame callback; a weak handle avoids a cycle
        let weak: Weak<RefCell<Game>> = Rc::downgrade(&game);
        *slot.borrow_mut() = Some(Box::new(move |time: f64| {
            if let Some(game) = weak.upgrade() {
                game.borrow_mut().frame(time);
            }
        }));

        setup_input_handlers(&canvas, game.clone());
        setup_resize(&window, &canvas, game.clone());
        setup_buttons(&document, game.clone());
        setup_keyboard(&document, game.clone());
        setup_auto_pause(&window, &document, game.clone());

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        game.borrow_mut().start();
        log::info!("Ingredient Rush running!");
        Ok(())
    }

    /// Match the backing store to the displayed size
    fn fit_canvas(canvas: &HtmlCanvasElement) {
        let w = canvas.client_width().max(1) as u32;
        let h = canvas.client_height().max(1) as u32;
        canvas.set_width(w);
        canvas.set_height(h);
    }

    fn metrics(canvas: &HtmlCanvasElement) -> CanvasMetrics {
        let rect = canvas.get_bounding_client_rect();
        CanvasMetrics {
            left: rect.left() as f32,
            top: rect.top() as f32,
            css_width: rect.width() as f32,
            css_height: rect.height() as f32,
            logical_width: canvas.width() as f32,
            logical_height: canvas.height() as f32,
        }
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Shared) {
        // Mouse down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                game.borrow_mut().pointer_down(PointerInput::mouse(
                    event.client_x() as f32,
                    event.client_y() as f32,
                ));
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse move
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                game.borrow_mut().pointer_move(PointerInput::mouse(
                    event.client_x() as f32,
                    event.client_y() as f32,
                ));
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start - every new finger is a tap
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let touches = event.changed_touches();
                let mut g = game.borrow_mut();
                for i in 0..touches.length() {
                    if let Some(touch) = touches.get(i) {
                        g.pointer_down(PointerInput::touch(
                            touch.client_x() as f32,
                            touch.client_y() as f32,
                        ));
                    }
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    game.borrow_mut().pointer_move(PointerInput::touch(
                        touch.client_x() as f32,
                        touch.client_y() as f32,
                    ));
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(window: &Window, canvas: &HtmlCanvasElement, game: Shared) {
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            fit_canvas(&canvas);
            game.borrow_mut().set_canvas_metrics(metrics(&canvas));
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(document: &Document, game: Shared) {
        let buttons: [(&str, fn(&mut Game)); 3] = [
            ("restart-btn", |g| g.start()),
            ("resume-btn", |g| {
                g.resume();
            }),
            ("pause-btn", |g| {
                g.toggle_pause();
            }),
        ];
        for (id, action) in buttons {
            let Some(btn) = document.get_element_by_id(id) else {
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                action(&mut game.borrow_mut());
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_keyboard(document: &Document, game: Shared) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            let mut g = game.borrow_mut();
            match event.key().as_str() {
                "Escape" | "p" | "P" => {
                    g.toggle_pause();
                }
                " " | "Enter" if g.phase() == Phase::Ended => {
                    event.prevent_default();
                    g.start();
                }
                _ => {}
            }
        });
        let _ = document.add_event_listener_with_callback(
            "keydown",
            closure.as_ref().unchecked_ref(),
        );
        closure.forget();
    }

    fn setup_auto_pause(window: &Window, document: &Document, game: Shared) {
        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().focus_lost();
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().focus_lost();
            });
            let _ = window.add_event_listener_with_callback(
                "blur",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Ingredient Rush (native) starting...");
    log::info!(
        "Native mode runs a headless autoplay session - use `trunk serve` for the web version"
    );

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0x1E6_2E5A);
    if let Err(err) = autoplay::run(seed) {
        log::error!("Autoplay failed: {err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod autoplay {
    use ingredient_rush::audio::CueLog;
    use ingredient_rush::consts::REFERENCE_FRAME_MS;
    use ingredient_rush::input::PointerInput;
    use ingredient_rush::persistence::MemoryStore;
    use ingredient_rush::sim::Phase;
    use ingredient_rush::{Game, GameConfig, Result, Settings};

    /// Five minutes of play at 60 FPS
    const MAX_FRAMES: u32 = 60 * 60 * 5;

    pub fn run(seed: u64) -> Result<()> {
        let mut game = Game::new(GameConfig::default(), seed)?
            .with_audio(Box::new(CueLog::default()))
            .with_store(Box::new(MemoryStore::new()))
            .with_settings(Settings::default());
        game.start();

        let mut t = 0.0_f64;
        let mut frames = 0;
        while frames < MAX_FRAMES && game.phase() != Phase::Ended {
            // Canvas sits at the page origin, so client space is game space
            if let Some(target) = game.sim().autoplay_target() {
                game.pointer_down(PointerInput::mouse(target.x, target.y));
            }
            t += REFERENCE_FRAME_MS as f64;
            game.frame(t);
            frames += 1;
        }

        let ui = game.ui_state();
        let snapshot = game.sim().state.debug_snapshot();
        log::info!(
            "Seed {seed}: {frames} frames, score {}, level {}, lives {}, best combo {}",
            ui.score,
            ui.level,
            ui.lives,
            ui.stats.best_combo
        );
        log::info!(
            "Orders completed {}, expired {}, ingredients caught {}, wrong {}",
            ui.stats.orders_completed,
            ui.stats.orders_expired,
            ui.stats.ingredients_caught,
            ui.stats.wrong_catches
        );
        let (ingredients, particles) = game.sim().pool_stats();
        log::info!(
            "Pools: ingredients reuse {:.0}%, particles reuse {:.0}%",
            ingredients.reuse_ratio() * 100.0,
            particles.reuse_ratio() * 100.0
        );
        let perf = game.perf_stats();
        log::info!(
            "Perf: {:.0} fps average, {} dropped, level {}",
            perf.average_fps,
            perf.dropped_frames,
            perf.level.as_str()
        );
        if !snapshot.violations.is_empty() {
            log::warn!("Invariant violations: {:?}", snapshot.violations);
        }
        match serde_json::to_string(&snapshot) {
            Ok(json) => log::debug!("Final state: {json}"),
            Err(err) => log::warn!("Snapshot serialization failed: {err}"),
        }
        game.stop();
        Ok(())
    }
}
