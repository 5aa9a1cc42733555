//! Axis-aligned collision primitives
//!
//! Rects use a half-open convention: a point on the right or bottom edge is
//! outside, and rects that merely touch do not intersect.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in world pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Grow the rect by `margin` on every side
    pub fn inflate(&self, margin: f32) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.w + margin * 2.0,
            self.h + margin * 2.0,
        )
    }

    /// Clamp a point into the closed rect
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.x, self.right()),
            p.y.clamp(self.y, self.bottom()),
        )
    }
}

/// Sides touched while integrating a move
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Collisions {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl Collisions {
    pub fn any(&self) -> bool {
        self.top || self.bottom || self.left || self.right
    }

    /// Vertical contact (landing or head bump)
    pub fn vertical(&self) -> bool {
        self.top || self.bottom
    }
}

/// Move `rect` by `delta` along one axis and snap it flush against the
/// first blocking rect in the direction of travel.
///
/// Returns the corrected origin coordinate on that axis and which sides hit.
pub fn sweep_axis(rect: Rect, delta: f32, horizontal: bool, blocking: &[Rect]) -> (f32, Collisions) {
    let mut hits = Collisions::default();
    let mut moved = rect;
    if horizontal {
        moved.x += delta;
    } else {
        moved.y += delta;
    }

    for tile in blocking {
        if !moved.intersects(tile) {
            continue;
        }
        match (horizontal, delta > 0.0, delta < 0.0) {
            (true, true, _) => {
                moved.x = tile.left() - moved.w;
                hits.right = true;
            }
            (true, _, true) => {
                moved.x = tile.right();
                hits.left = true;
            }
            (false, true, _) => {
                moved.y = tile.top() - moved.h;
                hits.bottom = true;
            }
            (false, _, true) => {
                moved.y = tile.bottom();
                hits.top = true;
            }
            // Zero-length move into an overlapping tile: leave it where it is
            _ => {}
        }
    }

    let coord = if horizontal { moved.x } else { moved.y };
    (coord, hits)
}
