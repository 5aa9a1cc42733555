//! Top-level mode machine
//!
//! `Game` owns everything outside the frame simulation: the menu screens,
//! the level catalogue, session history, settings, audio and the frame
//! clock. Platform shells feed it keys and timestamps and read back a
//! `FrameView` plus the decorative effect events of the last frame.

use crate::audio::AudioManager;
use crate::consts::NAME_MAX_LEN;
use crate::error::LevelError;
use crate::history::SessionHistory;
use crate::levels::{LevelCatalog, LevelId};
use crate::platform::storage::{KeyValueStore, MemoryStore};
use crate::platform::time::FrameClock;
use crate::settings::Settings;
use crate::sim::{FirewallRule, FrameView, GameEvent, GameState, Reload, TextKey, TickInput, tick};

/// Intro text shown before the name entry
pub const STORY: &[&str] = &[
    "ANO 2084 - CRISIS GLOBAL DE SEGURIDAD",
    "",
    "Una amenaza desconocida ha comprometido",
    "la infraestructura digital mundial.",
    "",
    "Tu eres el ultimo Guardian de Red,",
    "un agente especializado en neutralizar",
    "amenazas ciberneticas.",
    "",
    "TU MISION: Restaurar la seguridad de",
    "4 sectores criticos de la red global.",
    "",
    "HERRAMIENTAS:",
    "- FIREWALLS: Recursos computacionales",
    "- SONDA REMOTA: Explora areas peligrosas",
    "- TERMINALES: Resuelve desafios",
    "",
    "[Presiona ESPACIO para comenzar]",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuScreen {
    Main,
    Story,
    /// Player name typed so far
    NameEntry { name: String },
    History,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Menu(MenuScreen),
    Playing,
    /// Screen fade between level loads
    Transitioning,
    Quit,
}

/// Physical key, independent of the platform's event type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    Enter,
    Escape,
    Backspace,
    /// Letter (uppercase) or digit
    Char(char),
}

impl Key {
    /// Map a DOM `KeyboardEvent.code` value
    pub fn from_code(code: &str) -> Option<Key> {
        let key = match code {
            "ArrowLeft" => Key::Left,
            "ArrowRight" => Key::Right,
            "ArrowUp" => Key::Up,
            "ArrowDown" => Key::Down,
            "Space" => Key::Space,
            "Enter" | "NumpadEnter" => Key::Enter,
            "Escape" => Key::Escape,
            "Backspace" => Key::Backspace,
            _ => {
                let rest = code
                    .strip_prefix("Key")
                    .or_else(|| code.strip_prefix("Digit"))
                    .or_else(|| code.strip_prefix("Numpad"))?;
                let mut chars = rest.chars();
                let c = chars.next()?;
                if chars.next().is_some() || !c.is_ascii_alphanumeric() {
                    return None;
                }
                Key::Char(c.to_ascii_uppercase())
            }
        };
        Some(key)
    }

    fn text(self) -> Option<TextKey> {
        match self {
            Key::Char(c) => Some(TextKey::Char(c)),
            Key::Space => Some(TextKey::Char(' ')),
            Key::Enter => Some(TextKey::Enter),
            Key::Backspace => Some(TextKey::Backspace),
            Key::Escape => Some(TextKey::Escape),
            _ => None,
        }
    }
}

/// Directions currently held down
#[derive(Debug, Clone, Copy, Default)]
struct Held {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

pub struct Game {
    mode: Mode,
    catalog: LevelCatalog,
    settings: Settings,
    history: SessionHistory,
    store: Box<dyn KeyValueStore>,
    audio: AudioManager,
    clock: FrameClock,
    session: Option<GameState>,
    held: Held,
    /// One-shot input collected since the last frame
    pending: TickInput,
    autopilot: bool,
    /// Decorative events of the last frame, for the renderer
    effects: Vec<GameEvent>,
}

impl Game {
    pub fn new(
        catalog: LevelCatalog,
        settings: Settings,
        store: Box<dyn KeyValueStore>,
        audio: AudioManager,
    ) -> Self {
        let history = SessionHistory::load(store.as_ref());
        let mut game = Self {
            mode: Mode::Menu(MenuScreen::Main),
            catalog,
            settings: Settings::default(),
            history,
            store,
            audio,
            clock: FrameClock::default(),
            session: None,
            held: Held::default(),
            pending: TickInput::default(),
            autopilot: false,
            effects: Vec::new(),
        };
        game.apply_settings(settings);
        game
    }

    /// Built-in levels, in-memory storage and no audio
    pub fn headless() -> Self {
        Self::new(
            LevelCatalog::builtin(),
            Settings::default(),
            Box::new(MemoryStore::new()),
            AudioManager::silent(),
        )
    }

    /// Platform storage, stored settings and the platform audio backend
    pub fn for_platform(catalog: LevelCatalog) -> Self {
        let store = crate::platform::storage::platform_store();
        let settings = Settings::load(store.as_ref());
        Self::new(catalog, settings, store, AudioManager::for_platform())
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn session(&self) -> Option<&GameState> {
        self.session.as_ref()
    }

    pub fn set_autopilot(&mut self, on: bool) {
        self.autopilot = on;
    }

    /// Replace and persist the settings
    pub fn update_settings(&mut self, settings: Settings) {
        self.apply_settings(settings);
        self.settings.save(self.store.as_ref());
    }

    fn apply_settings(&mut self, settings: Settings) {
        let settings = settings.sanitized();
        self.audio.set_master_volume(settings.master_volume);
        self.audio.set_sfx_volume(settings.sfx_volume);
        self.audio.set_music_volume(settings.music_volume);
        self.audio.set_muted(settings.muted);
        self.clock.set_max_delta(settings.max_frame_delta);
        self.settings = settings;
    }

    /// Start a session on the first sector
    pub fn start_session(&mut self, player_name: &str) -> Result<(), LevelError> {
        let (blueprint, grid) = self.catalog.load(LevelId::Sector1)?;
        let seed = self.settings.seed.unwrap_or_else(rand::random);
        self.history.start_session(player_name);
        self.session = Some(GameState::new(blueprint, grid, seed));
        self.held = Held::default();
        self.pending = TickInput::default();
        self.clock.reset();
        self.mode = Mode::Playing;
        self.dispatch_events();
        Ok(())
    }

    /// Close the running session, persist history and return to the menu
    pub fn end_session(&mut self) {
        if let Some(state) = self.session.take() {
            self.history.end_session(state.level.id());
            self.history.save(self.store.as_ref());
        }
        self.effects.clear();
        self.mode = Mode::Menu(MenuScreen::Main);
    }

    /// Finish the current level at once
    pub fn skip_level(&mut self) {
        self.pending.skip_level = true;
    }

    pub fn key_down(&mut self, key: Key) -> Result<(), LevelError> {
        match &mut self.mode {
            Mode::Menu(screen) => {
                if let Some(next) = menu_key(screen, key) {
                    self.enter(next)?;
                }
            }
            Mode::Playing | Mode::Transitioning => self.play_key_down(key),
            Mode::Quit => {}
        }
        Ok(())
    }

    pub fn key_up(&mut self, key: Key) {
        match key {
            Key::Left => self.held.left = false,
            Key::Right => self.held.right = false,
            Key::Up => self.held.up = false,
            Key::Down => self.held.down = false,
            _ => {}
        }
    }

    fn enter(&mut self, next: MenuAction) -> Result<(), LevelError> {
        match next {
            MenuAction::Show(screen) => self.mode = Mode::Menu(screen),
            MenuAction::Start(name) => self.start_session(&name)?,
            MenuAction::Quit => self.mode = Mode::Quit,
        }
        Ok(())
    }

    fn play_key_down(&mut self, key: Key) {
        let Some(state) = &self.session else {
            return;
        };
        let answering = state.level.interactions.answer.is_open();
        let probe_out = state.level.probe.is_active();

        if key == Key::Escape && !answering {
            self.end_session();
            return;
        }
        if let Some(text) = key.text() {
            self.pending.text.push(text);
        }

        let input = &mut self.pending;
        match key {
            Key::Left => self.held.left = true,
            Key::Right => self.held.right = true,
            Key::Up => {
                self.held.up = true;
                input.jump = true;
            }
            Key::Down => {
                self.held.down = true;
                input.probe |= !probe_out;
            }
            Key::Space => input.dismiss = true,
            Key::Char('E') => input.interact = true,
            Key::Char('F') => input.flag_threat = true,
            Key::Char('G') => input.flag_safe = true,
            Key::Char('U') => input.pop_rule = true,
            Key::Char('R') => input.probe = true,
            Key::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                input.push_rule = FirewallRule::ALL.get(index).copied();
            }
            _ => {}
        }
    }

    /// Advance by wall-clock time
    pub fn frame(&mut self, now_ms: f64) -> Result<(), LevelError> {
        let dt = self.clock.tick(now_ms);
        self.advance(dt)
    }

    /// Advance by a frame delta multiplier
    pub fn advance(&mut self, dt: f32) -> Result<(), LevelError> {
        self.effects.clear();
        let Some(state) = &mut self.session else {
            return Ok(());
        };

        let mut input = std::mem::take(&mut self.pending);
        input.left = self.held.left;
        input.right = self.held.right;
        input.up = self.held.up;
        input.down = self.held.down;
        input.autopilot = self.autopilot;

        let outcome = tick(state, &input, dt);
        if let Some(reload) = outcome.reload {
            self.reload(reload)?;
        }
        self.dispatch_events();

        if let Some(state) = &self.session {
            self.mode = if state.is_transitioning() {
                Mode::Transitioning
            } else {
                Mode::Playing
            };
        }
        Ok(())
    }

    fn reload(&mut self, reload: Reload) -> Result<(), LevelError> {
        let Some(state) = &mut self.session else {
            return Ok(());
        };
        let current = state.level.id();
        let target = if reload.advance { current.next() } else { Some(current) };

        let Some(target) = target else {
            log::info!("All sectors secured");
            // Count the final level before closing the record
            self.dispatch_events();
            if let Some(state) = self.session.take() {
                self.history.end_session(state.level.id());
                self.history.save(self.store.as_ref());
            }
            self.mode = Mode::Menu(MenuScreen::History);
            return Ok(());
        };

        let (blueprint, grid) = self.catalog.load(target)?;
        state.load_level(blueprint, grid, reload.advance);
        Ok(())
    }

    /// Route simulation events to history, audio and the renderer queue
    fn dispatch_events(&mut self) {
        let Some(state) = &mut self.session else {
            return;
        };
        let scale = self.settings.effect_scale();
        for event in state.drain_events() {
            match event {
                GameEvent::Sound(cue) => self.audio.play(cue),
                GameEvent::Music(cue) => self.audio.music(cue),
                GameEvent::ThreatsNeutralized(n) => self.history.add_threats_neutralized(n),
                GameEvent::ResourceCollected => self.history.add_firewall_collected(),
                GameEvent::Breach => self.history.add_breach(),
                GameEvent::LevelCompleted(id) => self.history.add_level_completed(id),
                GameEvent::Particles(burst) if scale > 0.0 => {
                    self.effects.push(GameEvent::Particles(burst.scaled(scale)));
                }
                GameEvent::Sparks(burst) if scale > 0.0 => self.effects.push(GameEvent::Sparks(burst)),
                GameEvent::Particles(_) | GameEvent::Sparks(_) => {}
            }
        }
    }

    pub fn view(&self) -> Option<FrameView> {
        let mut view = FrameView::capture(self.session.as_ref()?);
        view.fps = self.settings.show_fps.then(|| self.clock.fps());
        Some(view)
    }

    /// Decorative events produced by the last frame
    pub fn effects(&self) -> &[GameEvent] {
        &self.effects
    }
}

/// Menu transition requested by a key
#[derive(Debug, Clone, PartialEq, Eq)]
enum MenuAction {
    Show(MenuScreen),
    Start(String),
    Quit,
}

fn menu_key(screen: &mut MenuScreen, key: Key) -> Option<MenuAction> {
    match screen {
        MenuScreen::Main => match key {
            Key::Enter | Key::Space => Some(MenuAction::Show(MenuScreen::Story)),
            Key::Char('H') => Some(MenuAction::Show(MenuScreen::History)),
            Key::Escape => Some(MenuAction::Quit),
            _ => None,
        },
        MenuScreen::Story => match key {
            Key::Space | Key::Enter => Some(MenuAction::Show(MenuScreen::NameEntry { name: String::new() })),
            Key::Escape => Some(MenuAction::Show(MenuScreen::Main)),
            _ => None,
        },
        MenuScreen::NameEntry { name } => {
            match key {
                Key::Char(c) if name.chars().count() < NAME_MAX_LEN => name.push(c),
                Key::Space if !name.is_empty() && name.chars().count() < NAME_MAX_LEN => name.push(' '),
                Key::Backspace => {
                    name.pop();
                }
                Key::Enter if !name.trim().is_empty() => {
                    return Some(MenuAction::Start(name.trim().to_string()));
                }
                Key::Escape => return Some(MenuAction::Show(MenuScreen::Main)),
                _ => {}
            }
            None
        }
        MenuScreen::History => match key {
            Key::Escape | Key::Enter | Key::Space => Some(MenuAction::Show(MenuScreen::Main)),
            _ => None,
        },
    }
}
