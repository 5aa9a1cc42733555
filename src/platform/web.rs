//! Browser entry point
//!
//! The page drives the loop from `requestAnimationFrame`, forwards keyboard
//! events by `KeyboardEvent.code` and renders from the JSON view.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::game::{Game, Key, MenuScreen, Mode, STORY};
use crate::levels::LevelCatalog;

#[wasm_bindgen(start)]
pub fn start() {
    super::init_logging();
    log::info!("NetGuardian (web) starting");
}

/// Mode summary handed to the page
#[derive(Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
enum ModeView<'a> {
    Menu { screen: &'static str, name: Option<&'a str> },
    Playing,
    Transitioning,
    Quit,
}

impl<'a> From<&'a Mode> for ModeView<'a> {
    fn from(mode: &'a Mode) -> Self {
        match mode {
            Mode::Menu(MenuScreen::Main) => ModeView::Menu { screen: "main", name: None },
            Mode::Menu(MenuScreen::Story) => ModeView::Menu { screen: "story", name: None },
            Mode::Menu(MenuScreen::NameEntry { name }) => ModeView::Menu {
                screen: "name_entry",
                name: Some(name),
            },
            Mode::Menu(MenuScreen::History) => ModeView::Menu { screen: "history", name: None },
            Mode::Playing => ModeView::Playing,
            Mode::Transitioning => ModeView::Transitioning,
            Mode::Quit => ModeView::Quit,
        }
    }
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct WebGame {
    game: Game,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebGame {
        WebGame {
            game: Game::for_platform(LevelCatalog::builtin()),
        }
    }

    /// Returns false for keys the game does not use
    pub fn key_down(&mut self, code: &str) -> Result<bool, JsValue> {
        let Some(key) = Key::from_code(code) else {
            return Ok(false);
        };
        self.game.key_down(key).map_err(to_js)?;
        Ok(true)
    }

    pub fn key_up(&mut self, code: &str) {
        if let Some(key) = Key::from_code(code) {
            self.game.key_up(key);
        }
    }

    /// Advance one animation frame (`now` from `performance.now()` or `Date.now()`)
    pub fn frame(&mut self, now: f64) -> Result<(), JsValue> {
        self.game.frame(now).map_err(to_js)
    }

    pub fn mode_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&ModeView::from(self.game.mode())).map_err(to_js)
    }

    /// `FrameView` of the running session, or `null` in the menu
    pub fn view_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.game.view()).map_err(to_js)
    }

    /// Spark and particle requests of the last frame
    pub fn effects_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.game.effects()).map_err(to_js)
    }

    pub fn history_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.game.history().records).map_err(to_js)
    }

    pub fn story_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(STORY).map_err(to_js)
    }

    pub fn settings_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.game.settings()).map_err(to_js)
    }

    /// Replace the settings from JSON and persist them
    pub fn set_settings_json(&mut self, json: &str) -> Result<(), JsValue> {
        let settings = serde_json::from_str(json).map_err(to_js)?;
        self.game.update_settings(settings);
        Ok(())
    }
}

impl Default for WebGame {
    fn default() -> Self {
        Self::new()
    }
}
