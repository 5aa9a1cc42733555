//! The sector 3 overseer: a watching eye that fires from a fixed point

use glam::Vec2;
use rand::Rng;

/// Chance denominator for a random blink each frame
const BLINK_ODDS: u32 = 180;
const BLINK_INTENSITY: f32 = 2.0;

#[derive(Debug, Clone)]
pub struct Boss {
    pub base: Vec2,
    /// Shake offset for this frame
    pub jitter: Vec2,
    /// Eye opening, eased toward `target_intensity`
    pub intensity: f32,
    pub target_intensity: f32,
    pub visible: bool,
}

impl Boss {
    pub fn new(base: Vec2) -> Self {
        Self {
            base,
            jitter: Vec2::ZERO,
            intensity: 30.0,
            target_intensity: 30.0,
            visible: true,
        }
    }

    /// Where projectiles spawn from
    pub fn position(&self) -> Vec2 {
        self.base + self.jitter
    }

    pub fn begin_frame(&mut self) {
        self.jitter = Vec2::ZERO;
    }

    pub fn shake(&mut self, amplitude: f32, rng: &mut impl Rng) {
        let a = amplitude.max(0.0).round() as i32;
        self.jitter = Vec2::new(
            rng.random_range(-a..=a) as f32,
            rng.random_range(-a..=a) as f32,
        );
    }

    /// Random blink plus easing toward the target intensity
    pub fn update(&mut self, rng: &mut impl Rng) {
        if !self.visible {
            return;
        }
        if rng.random_range(0..=BLINK_ODDS) == 0 {
            self.intensity = BLINK_INTENSITY;
        }
        self.intensity += (self.target_intensity - self.intensity) / 20.0;
    }

    pub fn defeat(&mut self) {
        self.visible = false;
        self.jitter = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_intensity_eases_toward_target() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut boss = Boss::new(Vec2::new(386.0, 220.0));
        boss.target_intensity = 4.0;
        for _ in 0..400 {
            boss.update(&mut rng);
        }
        assert!(boss.intensity < 10.0);
    }

    #[test]
    fn test_shake_bounded() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut boss = Boss::new(Vec2::new(386.0, 220.0));
        for _ in 0..100 {
            boss.shake(4.0, &mut rng);
            assert!(boss.jitter.x.abs() <= 4.0 && boss.jitter.y.abs() <= 4.0);
        }
        boss.begin_frame();
        assert_eq!(boss.position(), boss.base);
    }

    #[test]
    fn test_defeated_boss_stops_updating() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut boss = Boss::new(Vec2::ZERO);
        boss.defeat();
        let before = boss.intensity;
        boss.target_intensity = 0.0;
        boss.update(&mut rng);
        assert_eq!(boss.intensity, before);
    }
}
