//! Probe mode
//!
//! The player can send out a remote scanning probe by spending one firewall
//! charge. While the probe is out the primary body is frozen and translucent;
//! the probe flies freely (no gravity, no tile collision) but stays inside
//! the camera viewport. Returning moves the primary body to the probe.

use glam::Vec2;

use super::body::PhysicsBody;
use super::collision::Rect;
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeState {
    Grounded,
    Active {
        /// Ticks since deployment (never less than `PROBE_MIN_STEP` per frame)
        elapsed: f32,
    },
}

/// Result of pressing the probe toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeToggle {
    Entered,
    Exited,
    /// No firewall charge to spend
    NoResources,
    /// The level does not allow the probe yet
    Locked,
}

#[derive(Debug, Clone)]
pub struct Probe {
    pub body: PhysicsBody,
    pub state: ProbeState,
}

impl Probe {
    pub fn new(pos: Vec2) -> Self {
        Self {
            body: PhysicsBody::avatar(pos),
            state: ProbeState::Grounded,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ProbeState::Active { .. })
    }

    pub fn elapsed(&self) -> Option<f32> {
        match self.state {
            ProbeState::Active { elapsed } => Some(elapsed),
            ProbeState::Grounded => None,
        }
    }

    /// Smaller hitbox around the probe's core
    pub fn hitbox(&self) -> Rect {
        let c = self.body.center();
        Rect::new(c.x - 3.0, c.y - 7.0, 7.0, 7.0)
    }

    /// Enter probe mode (spending a charge) or return early
    pub fn toggle(&mut self, player: &mut PhysicsBody, resources: &mut u32, unlocked: bool) -> ProbeToggle {
        if self.is_active() {
            self.recall(player);
            return ProbeToggle::Exited;
        }
        if !unlocked {
            return ProbeToggle::Locked;
        }
        if *resources == 0 {
            return ProbeToggle::NoResources;
        }

        *resources -= 1;
        self.body.pos = player.pos;
        self.body.vel = Vec2::ZERO;
        self.state = ProbeState::Active { elapsed: 0.0 };
        player.opacity = PROBE_GHOST_OPACITY;
        log::debug!("Probe deployed at ({:.0}, {:.0})", player.pos.x, player.pos.y);
        ProbeToggle::Entered
    }

    /// Return control to the primary body at the probe's position.
    ///
    /// Returns false when the probe was not out.
    pub fn recall(&mut self, player: &mut PhysicsBody) -> bool {
        if !self.is_active() {
            return false;
        }
        player.pos = self.body.pos;
        player.vel.y = 0.0;
        player.opacity = 255;
        self.state = ProbeState::Grounded;
        log::debug!("Probe recalled to ({:.0}, {:.0})", player.pos.x, player.pos.y);
        true
    }

    /// Drop probe mode without moving the primary body
    pub fn cancel(&mut self, player: &mut PhysicsBody) {
        self.state = ProbeState::Grounded;
        player.opacity = 255;
    }

    /// Advance one frame.
    ///
    /// `dir` is the held direction (each axis -1, 0 or 1). Returns true when
    /// the probe timed out and control went back to the primary body.
    pub fn step(
        &mut self,
        dir: Vec2,
        dt: f32,
        viewport: &Rect,
        auto_return: bool,
        player: &mut PhysicsBody,
    ) -> bool {
        let ProbeState::Active { elapsed } = &mut self.state else {
            return false;
        };

        *elapsed += dt.max(PROBE_MIN_STEP);
        if auto_return && *elapsed >= PROBE_AUTO_RETURN_TICKS {
            return self.recall(player);
        }

        let delta = dir * PROBE_SPEED * dt;
        self.body.last_move = delta;
        self.body.face_toward(delta.x);
        self.body.pos = viewport.clamp_point(self.body.pos + delta);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> Rect {
        Rect::new(0.0, 0.0, VIEW_WIDTH, VIEW_HEIGHT)
    }

    #[test]
    fn test_enter_consumes_resource() {
        let mut player = PhysicsBody::avatar(Vec2::new(40.0, 50.0));
        let mut probe = Probe::new(Vec2::ZERO);
        let mut resources = 1;
        assert_eq!(probe.toggle(&mut player, &mut resources, true), ProbeToggle::Entered);
        assert_eq!(resources, 0);
        assert_eq!(probe.body.pos, player.pos);
        assert_eq!(player.opacity, PROBE_GHOST_OPACITY);
    }

    #[test]
    fn test_enter_requires_resource_and_unlock() {
        let mut player = PhysicsBody::avatar(Vec2::ZERO);
        let mut probe = Probe::new(Vec2::ZERO);
        let mut resources = 0;
        assert_eq!(probe.toggle(&mut player, &mut resources, true), ProbeToggle::NoResources);
        resources = 2;
        assert_eq!(probe.toggle(&mut player, &mut resources, false), ProbeToggle::Locked);
        assert_eq!(resources, 2);
        assert!(!probe.is_active());
    }

    #[test]
    fn test_manual_exit_teleports() {
        let mut player = PhysicsBody::avatar(Vec2::new(10.0, 10.0));
        player.vel.y = 3.0;
        let mut probe = Probe::new(Vec2::ZERO);
        let mut resources = 1;
        probe.toggle(&mut player, &mut resources, true);
        probe.step(Vec2::new(1.0, 0.0), 1.0, &view(), false, &mut player);
        let probe_pos = probe.body.pos;
        assert_eq!(probe.toggle(&mut player, &mut resources, true), ProbeToggle::Exited);
        assert_eq!(player.pos, probe_pos);
        assert_eq!(player.vel.y, 0.0);
        assert_eq!(player.opacity, 255);
        assert_eq!(resources, 0);
    }

    #[test]
    fn test_auto_return_exactly_once() {
        let mut player = PhysicsBody::avatar(Vec2::new(100.0, 100.0));
        let mut probe = Probe::new(Vec2::ZERO);
        let mut resources = 1;
        probe.toggle(&mut player, &mut resources, true);

        let mut returns = 0;
        let mut last_probe_pos = probe.body.pos;
        for tick in 1..=300 {
            if probe.is_active() {
                last_probe_pos = probe.body.pos;
            }
            if probe.step(Vec2::new(1.0, -1.0), 1.0, &view(), true, &mut player) {
                returns += 1;
                assert_eq!(tick, 240);
                assert_eq!(player.pos, last_probe_pos);
            }
        }
        assert_eq!(returns, 1);
        assert!(!probe.is_active());
    }

    #[test]
    fn test_no_auto_return_when_disabled() {
        let mut player = PhysicsBody::avatar(Vec2::new(100.0, 100.0));
        let mut probe = Probe::new(Vec2::ZERO);
        let mut resources = 1;
        probe.toggle(&mut player, &mut resources, true);
        for _ in 0..500 {
            assert!(!probe.step(Vec2::ZERO, 1.0, &view(), false, &mut player));
        }
        assert!(probe.is_active());
        assert_eq!(probe.elapsed(), Some(500.0));
    }

    #[test]
    fn test_probe_clamped_to_viewport_and_ignores_gravity() {
        let mut player = PhysicsBody::avatar(Vec2::new(290.0, 100.0));
        let mut probe = Probe::new(Vec2::ZERO);
        let mut resources = 1;
        probe.toggle(&mut player, &mut resources, true);
        for _ in 0..100 {
            probe.step(Vec2::new(1.0, 0.0), 1.0, &view(), false, &mut player);
        }
        assert_eq!(probe.body.pos.x, VIEW_WIDTH);
        assert_eq!(probe.body.pos.y, 100.0);
        // Primary body stays put
        assert_eq!(player.pos, Vec2::new(290.0, 100.0));
    }

    #[test]
    fn test_small_delta_still_advances_timer() {
        let mut player = PhysicsBody::avatar(Vec2::ZERO);
        let mut probe = Probe::new(Vec2::ZERO);
        let mut resources = 1;
        probe.toggle(&mut player, &mut resources, true);
        probe.step(Vec2::ZERO, 0.0, &view(), true, &mut player);
        assert_eq!(probe.elapsed(), Some(PROBE_MIN_STEP));
    }
}
