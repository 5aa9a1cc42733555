//! Hazard projectiles
//!
//! Malicious packets fired by level scripts. They travel in straight lines,
//! kill on contact with the active hitbox and are removed once they leave
//! the viewport by more than `OFFSCREEN_MARGIN`.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Hostile packet; counts as neutralized when it leaves the screen
    Enemy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: ProjectileKind,
    /// Flicker phase for rendering, assigned on the first step
    pub phase: f32,
    pub born: bool,
}

/// Ordered projectile collection with a size cap
#[derive(Debug, Clone)]
pub struct ProjectileSet {
    items: Vec<Projectile>,
    cap: usize,
}

impl ProjectileSet {
    pub fn new(cap: usize) -> Self {
        Self {
            items: Vec::new(),
            cap,
        }
    }

    pub fn spawn(&mut self, pos: Vec2, vel: Vec2) {
        self.items.push(Projectile {
            pos,
            vel,
            kind: ProjectileKind::Enemy,
            phase: 0.0,
            born: false,
        });
    }

    /// Move every projectile and drop those outside `viewport` plus margin.
    ///
    /// Returns how many enemy projectiles left the screen.
    pub fn step(&mut self, dt: f32, viewport: &Rect, rng: &mut impl Rng) -> u32 {
        for p in &mut self.items {
            if !p.born {
                p.phase = rng.random_range(1.0..2.0);
                p.born = true;
            }
            p.pos += p.vel * PROJECTILE_SPEED_SCALE * dt;
        }

        let area = viewport.inflate(OFFSCREEN_MARGIN);
        let mut neutralized = 0;
        self.items.retain(|p| {
            let inside = p.pos.x >= area.left()
                && p.pos.x <= area.right()
                && p.pos.y >= area.top()
                && p.pos.y <= area.bottom();
            if !inside && p.kind == ProjectileKind::Enemy {
                neutralized += 1;
            }
            inside
        });
        neutralized
    }

    /// Whether any hostile projectile is inside the hitbox
    pub fn check_hit(&self, hitbox: &Rect) -> bool {
        self.items
            .iter()
            .any(|p| p.kind == ProjectileKind::Enemy && hitbox.contains_point(p.pos))
    }

    /// Keep only the newest `cap` projectiles
    pub fn enforce_cap(&mut self) {
        if self.items.len() > self.cap {
            let overflow = self.items.len() - self.cap;
            self.items.drain(..overflow);
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn view() -> Rect {
        Rect::new(0.0, 0.0, VIEW_WIDTH, VIEW_HEIGHT)
    }

    #[test]
    fn test_step_scales_velocity() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut set = ProjectileSet::new(PROJECTILE_CAP);
        set.spawn(Vec2::new(100.0, 100.0), Vec2::new(-4.0, 0.0));
        set.step(2.0, &view(), &mut rng);
        let p = set.iter().next().unwrap();
        assert!((p.pos.x - (100.0 - 4.0 * 0.2 * 2.0)).abs() < 1e-4);
        assert!(p.born);
        assert!((1.0..2.0).contains(&p.phase));
    }

    #[test]
    fn test_offscreen_removed_and_counted_once() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut set = ProjectileSet::new(PROJECTILE_CAP);
        set.spawn(Vec2::new(-49.0, 100.0), Vec2::new(-10.0, 0.0));
        set.spawn(Vec2::new(150.0, 100.0), Vec2::new(0.0, 0.0));
        assert_eq!(set.step(1.0, &view(), &mut rng), 1);
        assert_eq!(set.len(), 1);
        assert_eq!(set.step(1.0, &view(), &mut rng), 0);
    }

    #[test]
    fn test_margin_keeps_nearby_projectiles() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut set = ProjectileSet::new(PROJECTILE_CAP);
        set.spawn(Vec2::new(VIEW_WIDTH + 40.0, -40.0), Vec2::ZERO);
        assert_eq!(set.step(1.0, &view(), &mut rng), 0);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_check_hit_point_in_rect() {
        let mut set = ProjectileSet::new(PROJECTILE_CAP);
        set.spawn(Vec2::new(13.0, 20.0), Vec2::ZERO);
        assert!(set.check_hit(&Rect::new(10.0, 10.0, 7.0, 13.0)));
        assert!(!set.check_hit(&Rect::new(20.0, 10.0, 7.0, 13.0)));
    }

    #[test]
    fn test_cap_keeps_newest() {
        let mut set = ProjectileSet::new(3);
        for i in 0..5 {
            set.spawn(Vec2::new(i as f32, 0.0), Vec2::ZERO);
        }
        set.enforce_cap();
        let xs: Vec<f32> = set.iter().map(|p| p.pos.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }
}
