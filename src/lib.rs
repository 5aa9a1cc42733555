//! NetGuardian - The Last Firewall
//!
//! A cybersecurity-themed 2D side-scroller. The player defends four network
//! sectors, dodging malicious packets, collecting firewall charges and
//! unlocking terminals.
//!
//! Core modules:
//! - `sim`: Frame simulation (physics, probe mode, scripted timelines, hazards, minigames)
//! - `levels`: Level blueprints (maps, NPCs, puzzles, event scripts)
//! - `game`: Top-level mode machine (menu, playing, transitioning)
//! - `history`: Session history log
//! - `settings`: Player preferences
//! - `audio`: Sound cue dispatch
//! - `platform`: Browser/native platform abstraction

pub mod audio;
pub mod error;
pub mod game;
pub mod history;
pub mod levels;
pub mod platform;
pub mod settings;
pub mod sim;

pub use error::LevelError;
pub use game::{Game, Key, MenuScreen, Mode};
pub use history::{SessionHistory, SessionRecord};
pub use settings::{QualityPreset, Settings};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Game configuration constants
///
/// Rates are expressed per nominal 60 Hz tick; the frame delta multiplier
/// scales them for the actual frame time.
pub mod consts {
    /// Tile edge length in world pixels
    pub const TILE_SIZE: f32 = 12.0;
    /// Logical display size (world pixels visible at zoom 1)
    pub const VIEW_WIDTH: f32 = 300.0;
    pub const VIEW_HEIGHT: f32 = 200.0;
    /// Ticks per second the per-tick rates are tuned for
    pub const TICKS_PER_SECOND: f32 = 60.0;
    /// Default clamp for the frame delta multiplier
    pub const MAX_FRAME_DELTA: f32 = 3.0;

    /// Avatar hitbox (width, height)
    pub const PLAYER_WIDTH: f32 = 7.0;
    pub const PLAYER_HEIGHT: f32 = 13.0;
    /// Downward acceleration per tick
    pub const GRAVITY: f32 = 0.23;
    pub const TERMINAL_VELOCITY: f32 = 5.0;
    /// Largest vertical displacement in one frame
    pub const MAX_FALL_STEP: f32 = 8.0;
    /// Horizontal displacement per tick while a direction is held
    pub const RUN_IMPULSE: f32 = 1.5;
    pub const JUMP_VELOCITY: f32 = -5.2;
    /// Jumps are accepted while air time is below this (coyote time)
    pub const COYOTE_TICKS: f32 = 5.0;

    /// Death animation
    pub const DEATH_DRIFT: f32 = 1.0;
    pub const DEATH_SPIN_DEGREES: f32 = 10.0;
    pub const DEATH_HOP_VELOCITY: f32 = -7.0;
    /// Ticks spent dying before the screen transition starts
    pub const DEATH_TICKS: u32 = 70;

    /// Level transition: reload at the midpoint, done at the end
    pub const TRANSITION_MIDPOINT: f32 = 60.0;
    pub const TRANSITION_END: f32 = 120.0;

    /// Probe movement per tick in each held direction
    pub const PROBE_SPEED: f32 = 0.75;
    /// Probe lifetime on auto-return levels
    pub const PROBE_AUTO_RETURN_TICKS: f32 = 240.0;
    /// Probe timer advances at least this much per frame
    pub const PROBE_MIN_STEP: f32 = 0.3;
    /// Primary avatar opacity while the probe is out
    pub const PROBE_GHOST_OPACITY: u8 = 120;
    pub const STARTING_RESOURCES: u32 = 1;

    /// Projectile displacement = velocity * scale * delta
    pub const PROJECTILE_SPEED_SCALE: f32 = 0.2;
    /// Projectiles further than this outside the viewport are removed
    pub const OFFSCREEN_MARGIN: f32 = 50.0;
    pub const PROJECTILE_CAP: usize = 300;
    pub const BOSS_PROJECTILE_CAP: usize = 500;

    /// Interaction radii
    pub const NPC_RADIUS: f32 = 20.0;
    pub const PUZZLE_RADIUS: f32 = 25.0;
    pub const FILTER_RADIUS: f32 = 30.0;
    pub const DOOR_REACH: f32 = 5.0;

    /// Packet filter minigame
    pub const FILTER_QUEUE_SIZE: usize = 5;
    pub const FILTER_REQUIRED_SCORE: u32 = 10;
    pub const FILTER_SPAWN_INTERVAL: f32 = 60.0;
    pub const FILTER_THREAT_CHANCE: f64 = 0.4;

    /// Firewall rule stack
    pub const RULE_STACK_SIZE: usize = 20;
    /// Ticks a stack feedback message stays visible
    pub const RULE_FEEDBACK_TICKS: f32 = 60.0;

    /// Longest puzzle answer accepted
    pub const ANSWER_MAX_LEN: usize = 20;
    /// Longest player name accepted
    pub const NAME_MAX_LEN: usize = 15;
}

/// Effect palette; the renderer maps these to concrete colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Palette {
    PrimaryGreen,
    PrimaryCyan,
    Safe,
    Warning,
    Danger,
}

impl Palette {
    pub fn rgb(self) -> [u8; 3] {
        match self {
            Palette::PrimaryGreen => [0, 255, 65],
            Palette::PrimaryCyan => [0, 255, 255],
            Palette::Safe => [0, 255, 100],
            Palette::Warning => [255, 165, 0],
            Palette::Danger => [255, 50, 50],
        }
    }
}

/// Point `amount` pixels along `angle` (radians) from `pos`
#[inline]
pub fn advance(pos: Vec2, angle: f32, amount: f32) -> Vec2 {
    pos + Vec2::new(angle.cos(), angle.sin()) * amount
}

/// Angle (radians) of the direction from `from` toward `to`
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_advance() {
        let p = advance(Vec2::new(1.0, 1.0), FRAC_PI_2, 2.0);
        assert!((p.x - 1.0).abs() < 1e-5);
        assert!((p.y - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_angle_to() {
        assert!((angle_to(Vec2::ZERO, Vec2::new(0.0, 5.0)) - FRAC_PI_2).abs() < 1e-5);
        assert!(angle_to(Vec2::ZERO, Vec2::new(3.0, 0.0)).abs() < 1e-5);
    }
}
