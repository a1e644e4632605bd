//! Browser bindings
//!
//! JavaScript owns the display loop and the canvas; it forwards key events
//! and frame deltas here and draws from the JSON snapshot.

use wasm_bindgen::prelude::*;

use crate::input::InputState;
use crate::level::Level;
use crate::settings::Settings;
use crate::sim::{FrameClock, PlaySession, RapierWorld};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let level = Settings::load()
        .log_level_filter()
        .to_level()
        .unwrap_or(log::Level::Info);
    if console_log::init_with_level(level).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Flipper Table starting...");
}

/// One play session on one physics world
#[wasm_bindgen]
pub struct WebTable {
    session: PlaySession<RapierWorld>,
    input: InputState,
    clock: FrameClock,
}

#[wasm_bindgen]
impl WebTable {
    /// Build a table from level JSON; an empty string plays the built-in table
    #[wasm_bindgen(constructor)]
    pub fn new(level_json: &str) -> Result<WebTable, JsValue> {
        let level = if level_json.is_empty() {
            Level::classic()
        } else {
            Level::from_json(level_json).map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        let settings = Settings::load();
        let fresh_seed = (js_sys::Math::random() * u32::MAX as f64) as u64;
        Ok(WebTable {
            session: PlaySession::new(RapierWorld::default(), &level, settings.session_options(fresh_seed)),
            input: InputState::new(settings.bindings),
            clock: FrameClock::default(),
        })
    }

    pub fn key_down(&mut self, key: &str) {
        self.input.key_down(key);
    }

    pub fn key_up(&mut self, key: &str) {
        self.input.key_up(key);
    }

    pub fn blur(&mut self) {
        self.input.blur();
        self.clock.reset();
    }

    /// Run the fixed ticks owed for `dt` seconds; returns how many ran
    pub fn frame(&mut self, dt: f32) -> u32 {
        let steps = self.clock.advance(dt);
        for _ in 0..steps {
            self.session.tick(&self.input.tick_input());
        }
        steps
    }

    /// Current state as JSON. `events` holds everything raised since the
    /// previous call, across however many frames and ticks that spans.
    pub fn snapshot_json(&mut self) -> Result<String, JsValue> {
        self.session
            .take_snapshot()
            .to_json()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// "Play Again" after game over
    pub fn replay(&mut self) {
        self.session.replay();
        self.clock.reset();
    }
}
