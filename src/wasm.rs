//! Browser host glue
//!
//! The page owns rendering, audio and the animation-frame loop. It feeds
//! pointer/keyboard state in, calls `frame` once per animation callback and
//! reads the HUD and effect events back out as JSON.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use glam::Vec2;
use wasm_bindgen::prelude::*;

use crate::host::{InputProvider, MoveInput};
use crate::sim::{Game, GameEvent, TickInput};
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialised".into());
    }
}

/// Latest pointer/keyboard state reported by the page
#[derive(Debug, Default)]
struct PageInput {
    movement: MoveInput,
    aim: Option<Vec2>,
}

impl InputProvider for PageInput {
    fn move_direction(&self) -> MoveInput {
        self.movement
    }

    fn aim_world_point(&self) -> Option<Vec2> {
        self.aim
    }
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// A game instance driven from JavaScript
#[wasm_bindgen]
pub struct WebGame {
    game: Game,
    page: PageInput,
    fire: bool,
    autopilot: bool,
    /// One-shot buttons, cleared after the next frame
    pending: TickInput,
    last_time: Option<f64>,
    visible: Rc<Cell<bool>>,
    _on_visibility: Option<Closure<dyn FnMut(web_sys::Event)>>,
}

#[wasm_bindgen]
impl WebGame {
    /// Create a game. `tuning_json` overrides the built-in balance when given.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: f64, tuning_json: Option<String>) -> Result<WebGame, JsValue> {
        let tuning = match tuning_json {
            Some(json) => Tuning::from_json(&json).map_err(js_error)?,
            None => Tuning::default(),
        };
        let game = Game::new(seed as u64, Arc::new(tuning)).map_err(js_error)?;

        let visible = Rc::new(Cell::new(true));
        let on_visibility = watch_visibility(Rc::clone(&visible));

        Ok(WebGame {
            game,
            page: PageInput::default(),
            fire: false,
            autopilot: false,
            pending: TickInput::default(),
            last_time: None,
            visible,
            _on_visibility: on_visibility,
        })
    }

    pub fn finish_loading(&mut self) -> Result<(), JsValue> {
        self.game.finish_loading().map_err(js_error)
    }

    /// Movement from keys or the virtual stick, already normalized
    pub fn set_move(&mut self, x: f32, z: f32, moving: bool) {
        self.page.movement = MoveInput { x, z, moving };
    }

    /// Ground point under the cursor
    pub fn set_aim(&mut self, x: f32, z: f32) {
        self.page.aim = Some(Vec2::new(x, z));
    }

    pub fn clear_aim(&mut self) {
        self.page.aim = None;
    }

    pub fn set_fire(&mut self, held: bool) {
        self.fire = held;
    }

    pub fn set_autopilot(&mut self, enabled: bool) {
        self.autopilot = enabled;
    }

    pub fn press_pause(&mut self) {
        self.pending.pause = true;
    }

    pub fn press_advance(&mut self) {
        self.pending.advance = true;
    }

    pub fn press_restart(&mut self) {
        self.pending.restart = true;
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.game.set_time_scale(scale);
    }

    /// Advance from a `requestAnimationFrame` timestamp (milliseconds)
    pub fn frame(&mut self, time_ms: f64) -> Result<(), JsValue> {
        let dt = self.last_time.map_or(0.0, |last| ((time_ms - last) / 1000.0) as f32);
        self.last_time = Some(time_ms);
        self.game.set_visible(self.visible.get());

        let buttons = std::mem::take(&mut self.pending);
        let input = TickInput {
            fire: self.fire,
            pause: buttons.pause,
            advance: buttons.advance,
            restart: buttons.restart,
            autopilot: self.autopilot,
            ..TickInput::from_provider(&self.page)
        };
        self.game.tick(dt, &input).map_err(js_error)
    }

    pub fn phase(&self) -> String {
        format!("{:?}", self.game.phase())
    }

    pub fn hud_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.game.hud()).map_err(js_error)
    }

    pub fn stats_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.game.stats()).map_err(js_error)
    }

    /// Pending effect events as a JSON array
    pub fn drain_events_json(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.game.drain_events()).map_err(js_error)
    }

    /// Call `callback` with each pending event as a JSON string
    pub fn flush_events(&mut self, callback: &js_sys::Function) {
        let mut sink = |event: &GameEvent| match serde_json::to_string(event) {
            Ok(json) => {
                if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                    log::warn!("Effect callback failed: {:?}", err);
                }
            }
            Err(err) => log::warn!("Could not encode {:?}: {}", event, err),
        };
        self.game.flush_to(&mut sink);
    }
}

/// Track `document.visibilityState` so hidden tabs get the larger delta cap
fn watch_visibility(visible: Rc<Cell<bool>>) -> Option<Closure<dyn FnMut(web_sys::Event)>> {
    let document = web_sys::window()?.document()?;
    visible.set(document.visibility_state() == web_sys::VisibilityState::Visible);

    let watched = document.clone();
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
        let now_visible = watched.visibility_state() == web_sys::VisibilityState::Visible;
        if now_visible != visible.get() {
            log::info!("Page {}", if now_visible { "visible" } else { "hidden" });
        }
        visible.set(now_visible);
    });
    if let Err(err) = document.add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref()) {
        log::warn!("Could not watch page visibility: {:?}", err);
        return None;
    }
    Some(closure)
}
