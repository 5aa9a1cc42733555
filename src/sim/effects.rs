//! Decorative effect requests
//!
//! The simulation does not own particles or sparks. It emits burst requests
//! and the renderer spawns, animates and culls the actual effects.

use glam::Vec2;
use serde::Serialize;

use crate::Palette;

/// Short bright streaks flying out from a point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SparkBurst {
    pub pos: Vec2,
    /// Base direction (radians)
    pub angle: f32,
    /// Random deviation either side of `angle` (radians)
    pub spread: f32,
    pub count: u32,
    /// Initial speed; sparks decelerate 0.2 per tick and vanish at zero
    pub speed: f32,
    pub scale: f32,
    pub palette: Palette,
}

impl SparkBurst {
    /// Sparks scattered around the full circle
    pub fn ring(pos: Vec2, count: u32, speed: f32, scale: f32, palette: Palette) -> Self {
        Self {
            pos,
            angle: 0.0,
            spread: std::f32::consts::PI,
            count,
            speed,
            scale,
            palette,
        }
    }

    /// Sparks trailing along a direction (about +/-40 degrees)
    pub fn trail(pos: Vec2, angle: f32, count: u32, speed: f32, scale: f32, palette: Palette) -> Self {
        Self {
            pos,
            angle,
            spread: 40f32.to_radians(),
            count,
            speed,
            scale,
            palette,
        }
    }
}

/// Soft glow particle flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParticleStyle {
    Light,
    RedLight,
}

/// Cloud of drifting glow particles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleBurst {
    pub pos: Vec2,
    pub count: u32,
    pub style: ParticleStyle,
    pub palette: Palette,
    /// Initial speed range (pixels per tick, scaled by the renderer)
    pub speed: (f32, f32),
}

impl ParticleBurst {
    pub fn new(pos: Vec2, count: u32, palette: Palette) -> Self {
        Self {
            pos,
            count,
            style: ParticleStyle::Light,
            palette,
            speed: (2.0, 8.0),
        }
    }

    /// Faster burst used for deaths and the boss defeat
    pub fn explosive(mut self) -> Self {
        self.speed = (7.0, 25.0);
        self
    }

    pub fn styled(mut self, style: ParticleStyle) -> Self {
        self.style = style;
        self
    }

    /// Scale the particle count (quality presets)
    pub fn scaled(mut self, factor: f32) -> Self {
        self.count = ((self.count as f32) * factor).round() as u32;
        self
    }
}
