//! Follow camera with zoom easing and optional clamping to the map bounds

use glam::Vec2;

use super::collision::Rect;
use super::grid::GridBounds;
use crate::consts::*;

/// Zoom a freshly loaded level starts from
pub const LOAD_ZOOM: f32 = 10.0;
/// Zoom eased toward while fading out
const TRANSITION_ZOOM: f32 = 5.0;

#[derive(Debug, Clone)]
pub struct Camera {
    /// Smoothed scroll before clamping
    true_scroll: Vec2,
    /// Integer scroll used for the viewport this frame
    scroll: Vec2,
    pub zoom: f32,
    /// Clamp to these map bounds, if set
    bounds: Option<GridBounds>,
}

impl Camera {
    /// Camera centred on `target` (the player's top-left)
    pub fn new(target: Vec2, bounds: Option<GridBounds>) -> Self {
        let true_scroll = Self::desired(target);
        let mut camera = Self {
            true_scroll,
            scroll: true_scroll,
            zoom: LOAD_ZOOM,
            bounds,
        };
        camera.scroll = camera.clamped(true_scroll.trunc());
        camera
    }

    fn desired(target: Vec2) -> Vec2 {
        Vec2::new(
            target.x.trunc() - VIEW_WIDTH / 2.0 - 3.0,
            target.y.trunc() - VIEW_HEIGHT / 2.0 - 5.0,
        )
    }

    /// Ease scroll toward `target` and zoom toward its resting value
    pub fn update(&mut self, target: Vec2, dt: f32, fading_out: bool) {
        if fading_out {
            self.zoom += (TRANSITION_ZOOM - self.zoom) / 50.0;
        } else {
            self.zoom += (1.0 - self.zoom) / 7.0;
            if (1.0 - self.zoom).abs() < 0.005 {
                self.zoom = 1.0;
            }
        }

        let desired = Self::desired(target);
        let dx = desired.x - self.true_scroll.x;
        if dx.abs() < 0.5 {
            self.true_scroll.x = desired.x;
        } else {
            self.true_scroll.x += dx / 20.0 * dt;
        }
        let dy = desired.y - self.true_scroll.y;
        if dy.abs() <= 1.0 {
            self.true_scroll.y = desired.y;
        } else {
            self.true_scroll.y += dy / 20.0 * dt;
        }

        self.scroll = self.clamped(self.true_scroll.trunc());
    }

    /// Clamp a scroll position to the map, accounting for the zoomed view
    fn clamped(&self, scroll: Vec2) -> Vec2 {
        let Some(b) = self.bounds else {
            return scroll;
        };
        let zoom = self.zoom.max(1.0);
        let size = Vec2::new((VIEW_WIDTH / zoom).trunc(), (VIEW_HEIGHT / zoom).trunc());
        let zoff = ((Vec2::new(VIEW_WIDTH, VIEW_HEIGHT) - size) / 2.0).floor();

        let min_x = b.left as f32 * TILE_SIZE + 3.0 * TILE_SIZE - zoff.x;
        let max_x = b.right as f32 * TILE_SIZE - VIEW_WIDTH - 2.0 * TILE_SIZE + zoff.x;
        let min_y = b.top as f32 * TILE_SIZE + 3.0 * TILE_SIZE - zoff.y;
        let max_y = b.bottom as f32 * TILE_SIZE - VIEW_HEIGHT - 4.0 * TILE_SIZE + zoff.y;

        // Lower bound wins when the map is narrower than the view
        Vec2::new(scroll.x.min(max_x).max(min_x), scroll.y.min(max_y).max(min_y))
    }

    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    /// World rect visible at zoom 1
    pub fn viewport(&self) -> Rect {
        Rect::new(self.scroll.x, self.scroll.y, VIEW_WIDTH, VIEW_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follows_target_smoothly() {
        let mut cam = Camera::new(Vec2::new(180.0, 50.0), None);
        let start = cam.scroll();
        assert_eq!(start, Vec2::new(180.0 - 153.0, 50.0 - 105.0));
        cam.update(Vec2::new(380.0, 50.0), 1.0, false);
        // 1/20 of the 200px gap
        assert_eq!(cam.scroll().x, start.x + 10.0);
        assert_eq!(cam.scroll().y, start.y);
    }

    #[test]
    fn test_snaps_when_close() {
        let mut cam = Camera::new(Vec2::new(100.0, 100.0), None);
        cam.update(Vec2::new(100.4, 100.9), 1.0, false);
        assert_eq!(cam.scroll(), Vec2::new(100.0 - 153.0, 100.0 - 105.0));
    }

    #[test]
    fn test_zoom_settles_and_fades() {
        let mut cam = Camera::new(Vec2::ZERO, None);
        assert_eq!(cam.zoom, LOAD_ZOOM);
        for _ in 0..80 {
            cam.update(Vec2::ZERO, 1.0, false);
        }
        assert_eq!(cam.zoom, 1.0);
        cam.update(Vec2::ZERO, 1.0, true);
        assert!(cam.zoom > 1.0);
    }

    #[test]
    fn test_bounded_clamps_to_map() {
        let bounds = GridBounds {
            left: 0,
            right: 69,
            top: 0,
            bottom: 17,
        };
        let mut cam = Camera::new(Vec2::new(20.0, 20.0), Some(bounds));
        for _ in 0..80 {
            cam.update(Vec2::new(20.0, 20.0), 1.0, false);
        }
        assert_eq!(cam.scroll().x, 36.0);
        assert_eq!(cam.scroll().y, 36.0);
        let view = cam.viewport();
        assert_eq!((view.w, view.h), (VIEW_WIDTH, VIEW_HEIGHT));
    }
}
