//! Packet filter minigame
//!
//! A terminal streams packets into a small queue; the player flags the head
//! packet as a threat or lets it through. Ten correct verdicts complete the
//! filter for good.

use glam::Vec2;
use rand::Rng;

use super::queue::{Packet, PacketQueue};
use crate::consts::*;

/// Outcome of one verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Correct,
    Incorrect,
    /// Correct, and the required score was reached
    Completed,
}

#[derive(Debug, Clone)]
pub struct PacketFilterGame {
    pub pos: Vec2,
    queue: PacketQueue,
    active: bool,
    completed: bool,
    score: u32,
    required: u32,
    spawn_timer: f32,
}

impl PacketFilterGame {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            queue: PacketQueue::new(FILTER_QUEUE_SIZE),
            active: false,
            completed: false,
            score: 0,
            required: FILTER_REQUIRED_SCORE,
            spawn_timer: 0.0,
        }
    }

    pub fn can_activate(&self, player_pos: Vec2) -> bool {
        !self.completed && player_pos.distance(self.pos) < FILTER_RADIUS
    }

    /// Flip the active flag; a completed filter stays off
    pub fn toggle(&mut self) -> bool {
        if self.active {
            self.deactivate();
        } else {
            self.activate();
        }
        self.active
    }

    pub fn activate(&mut self) {
        if !self.completed {
            self.active = true;
        }
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Feed a packet directly; false when the queue is full
    pub fn feed(&mut self, packet: Packet) -> bool {
        self.queue.enqueue(packet)
    }

    /// Accumulate spawn time and enqueue a random packet every interval
    pub fn step(&mut self, dt: f32, rng: &mut impl Rng) {
        if !self.active {
            return;
        }
        self.spawn_timer += dt;
        if self.spawn_timer >= FILTER_SPAWN_INTERVAL && !self.queue.is_full() {
            let packet = Packet {
                id: rng.random_range(1000..=9999),
                is_threat: rng.random_bool(FILTER_THREAT_CHANCE),
            };
            self.queue.enqueue(packet);
            self.spawn_timer = 0.0;
        }
    }

    /// Judge the head packet. None while inactive or already completed.
    pub fn classify(&mut self, as_threat: bool) -> Option<Classification> {
        if !self.active || self.completed {
            return None;
        }

        if self.queue.process(as_threat) {
            self.score += 1;
            if self.score >= self.required {
                self.completed = true;
                self.active = false;
                log::info!("Packet filter completed");
                return Some(Classification::Completed);
            }
            Some(Classification::Correct)
        } else {
            self.score = self.score.saturating_sub(1);
            Some(Classification::Incorrect)
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn required(&self) -> u32 {
        self.required
    }

    pub fn queue(&self) -> &PacketQueue {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn active_game() -> PacketFilterGame {
        let mut game = PacketFilterGame::new(Vec2::ZERO);
        game.activate();
        game
    }

    #[test]
    fn test_completes_exactly_on_tenth() {
        let mut game = active_game();
        for i in 0..10u16 {
            let threat = i % 3 == 0;
            assert!(game.feed(Packet { id: i, is_threat: threat }));
            let result = game.classify(threat);
            if i < 9 {
                assert_eq!(result, Some(Classification::Correct));
                assert!(!game.is_completed());
            } else {
                assert_eq!(result, Some(Classification::Completed));
            }
        }
        assert!(game.is_completed());
        assert!(!game.is_active());

        // Eleventh call is a no-op
        game.feed(Packet { id: 11, is_threat: true });
        assert_eq!(game.classify(true), None);
        assert_eq!(game.score(), 10);
        assert_eq!(game.queue().len(), 1);
    }

    #[test]
    fn test_incorrect_removes_packet_and_floors_score() {
        let mut game = active_game();
        game.feed(Packet { id: 1, is_threat: true });
        game.feed(Packet { id: 2, is_threat: false });
        assert_eq!(game.classify(false), Some(Classification::Incorrect));
        assert_eq!(game.score(), 0);
        assert_eq!(game.queue().len(), 1);
        assert_eq!(game.classify(false), Some(Classification::Correct));
        assert_eq!(game.score(), 1);
        // Empty queue judges as wrong
        assert_eq!(game.classify(true), Some(Classification::Incorrect));
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_spawns_on_interval_until_full() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut game = active_game();
        for _ in 0..59 {
            game.step(1.0, &mut rng);
        }
        assert!(game.queue().is_empty());
        game.step(1.0, &mut rng);
        assert_eq!(game.queue().len(), 1);
        for _ in 0..1000 {
            game.step(1.0, &mut rng);
        }
        assert_eq!(game.queue().len(), FILTER_QUEUE_SIZE);
        assert!(game.queue().iter().all(|p| (1000..=9999).contains(&p.id)));
    }

    #[test]
    fn test_inactive_does_nothing() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut game = PacketFilterGame::new(Vec2::ZERO);
        for _ in 0..200 {
            game.step(1.0, &mut rng);
        }
        assert!(game.queue().is_empty());
        assert_eq!(game.classify(true), None);
    }

    #[test]
    fn test_activation_radius() {
        let game = PacketFilterGame::new(Vec2::new(500.0, 165.0));
        assert!(game.can_activate(Vec2::new(480.0, 160.0)));
        assert!(!game.can_activate(Vec2::new(450.0, 165.0)));
    }

    #[test]
    fn test_toggle() {
        let mut game = PacketFilterGame::new(Vec2::ZERO);
        assert!(game.toggle());
        assert!(!game.toggle());
    }
}
