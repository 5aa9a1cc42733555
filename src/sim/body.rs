//! Physics bodies
//!
//! A body is an axis-aligned box with a velocity. Gravity is applied by the
//! caller before `integrate`, which resolves the requested displacement one
//! axis at a time against the blocking tiles.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Collisions, Rect, sweep_axis};
use crate::consts::*;

/// Direction the sprite faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    Right,
    Left,
}

/// Animation pose derived from movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pose {
    Idle,
    Run,
    Jump,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsBody {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Only the vertical component is integrated; horizontal motion is input driven
    pub vel: Vec2,
    pub facing: Facing,
    /// Degrees, only used by the death spin
    pub rotation: f32,
    pub opacity: u8,
    /// Ticks since the last ground contact
    pub air_ticks: f32,
    /// Displacement requested on the last integrate
    pub last_move: Vec2,
}

impl PhysicsBody {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            size,
            vel: Vec2::ZERO,
            facing: Facing::Right,
            rotation: 0.0,
            opacity: 255,
            air_ticks: 0.0,
            last_move: Vec2::ZERO,
        }
    }

    /// Player-sized body
    pub fn avatar(pos: Vec2) -> Self {
        Self::new(pos, Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT))
    }

    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Accelerate downward, clamped at terminal velocity
    pub fn apply_gravity(&mut self, dt: f32) {
        self.vel.y = (self.vel.y + GRAVITY * dt).min(TERMINAL_VELOCITY);
    }

    /// Whether a jump would be accepted right now (grounded or within coyote time)
    pub fn can_jump(&self) -> bool {
        self.air_ticks < COYOTE_TICKS
    }

    /// Move by `delta`, x first then y, snapping flush against blocking rects
    pub fn integrate(&mut self, delta: Vec2, blocking: &[Rect]) -> Collisions {
        self.last_move = delta;

        let (x, horizontal) = sweep_axis(self.rect(), delta.x, true, blocking);
        self.pos.x = x;
        let (y, vertical) = sweep_axis(self.rect(), delta.y, false, blocking);
        self.pos.y = y;

        Collisions {
            top: vertical.top,
            bottom: vertical.bottom,
            left: horizontal.left,
            right: horizontal.right,
        }
    }

    /// Flip facing to follow horizontal movement
    pub fn face_toward(&mut self, dx: f32) {
        if dx > 0.0 {
            self.facing = Facing::Right;
        } else if dx < 0.0 {
            self.facing = Facing::Left;
        }
    }

    pub fn pose(&self) -> Pose {
        if self.air_ticks > 3.0 {
            Pose::Jump
        } else if self.last_move.x != 0.0 {
            Pose::Run
        } else {
            Pose::Idle
        }
    }
}
