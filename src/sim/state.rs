//! Game state aggregate
//!
//! `GameState` is split in two: session-scoped pieces (counters, the network
//! console, RNG, the screen transition) survive level reloads, while
//! `LevelState` is rebuilt from the level blueprint every time a level is
//! entered or re-entered after a breach.

use std::sync::Arc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::body::PhysicsBody;
use super::boss::Boss;
use super::camera::Camera;
use super::collision::Rect;
use super::effects::{ParticleBurst, SparkBurst};
use super::grid::TileGrid;
use super::ids::{IntrusionDetection, TrafficMonitor};
use super::interaction::InteractionRegistry;
use super::message::{HintTracker, SpeechBubble, Tutorial, TutorialHint};
use super::probe::Probe;
use super::projectile::ProjectileSet;
use super::queue::RuleStack;
use super::timeline::{Timeline, crossed};
use crate::audio::{MusicCue, SoundCue};
use crate::consts::*;
use crate::levels::{LevelBlueprint, LevelId, ProbeGate};

/// Render/audio/history requests emitted during a tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    Sound(SoundCue),
    Music(MusicCue),
    Sparks(SparkBurst),
    Particles(ParticleBurst),
    /// Enemy projectiles that left the screen this frame
    ThreatsNeutralized(u32),
    ResourceCollected,
    Breach,
    LevelCompleted(LevelId),
}

/// Dying animation counter (ticks since the hit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Death {
    pub ticks: u32,
}

/// Result of advancing a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStep {
    Fading,
    /// The level must be reloaded now
    Midpoint,
    Done,
}

/// Fade-out/fade-in between level loads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub ticks: f32,
    /// Advance to the next level at the midpoint instead of reloading
    pub completes_level: bool,
}

impl Transition {
    pub fn new(completes_level: bool) -> Self {
        Self {
            ticks: 1.0,
            completes_level,
        }
    }

    pub fn advance(&mut self, dt: f32) -> TransitionStep {
        let previous = self.ticks;
        self.ticks += dt;
        // The reload is never skipped; a frame that also passes the end
        // finishes on the next call
        if crossed(previous, self.ticks, TRANSITION_MIDPOINT) {
            TransitionStep::Midpoint
        } else if self.ticks >= TRANSITION_END {
            TransitionStep::Done
        } else {
            TransitionStep::Fading
        }
    }

    /// Still fading out toward the reload
    pub fn fading_out(&self) -> bool {
        self.ticks < TRANSITION_MIDPOINT
    }

    /// Screen cover, 0 (clear) to 1 (opaque)
    pub fn cover(&self) -> f32 {
        let t = if self.fading_out() {
            self.ticks / TRANSITION_MIDPOINT
        } else {
            1.0 - (self.ticks - TRANSITION_MIDPOINT) / (TRANSITION_END - TRANSITION_MIDPOINT)
        };
        t.clamp(0.0, 1.0)
    }
}

/// Session-wide console: rule stack and monitors
#[derive(Debug, Clone, Default)]
pub struct NetworkConsole {
    pub rules: RuleStack,
    pub ids: IntrusionDetection,
    pub traffic: TrafficMonitor,
}

/// Game ticks between traffic samples
const TRAFFIC_SAMPLE_TICKS: u64 = 120;

impl NetworkConsole {
    pub fn tick(&mut self, dt: f32, game_time: u64, rng: &mut impl Rng) {
        self.rules.tick(dt);
        self.ids.update(dt);
        self.traffic.update(dt);

        if game_time % TRAFFIC_SAMPLE_TICKS == 0 && rng.random_bool(0.3) {
            let malicious = rng.random_bool(0.4);
            self.traffic.add_packet(malicious, rng);
            if malicious {
                let severity = rng.random_range(10..=40) as f32;
                self.ids.add_threat("Trafico Malicioso", severity);
            }
        }
    }
}

/// Running totals for the HUD
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub threats_neutralized: u32,
    pub firewalls_collected: u32,
    pub breaches: u32,
    pub levels_completed: u32,
}

/// Everything that is rebuilt when a level (re)loads
#[derive(Debug, Clone)]
pub struct LevelState {
    pub blueprint: Arc<LevelBlueprint>,
    pub grid: TileGrid,
    pub player: PhysicsBody,
    pub probe: Probe,
    pub projectiles: ProjectileSet,
    pub timeline: Option<Timeline>,
    pub interactions: InteractionRegistry,
    pub camera: Camera,
    pub boss: Option<Boss>,
    /// Exit door (top-left), once placed
    pub door: Option<Vec2>,
    /// Script finished; the probe can no longer be deployed
    pub ready_to_exit: bool,
    /// Firewall charges held
    pub resources: u32,
    pub level_time: u64,
    pub death: Option<Death>,
    pub bubble: SpeechBubble,
    pub hints: HintTracker,
    pub tutorial: Tutorial,
    pub objectives_visible: bool,
    /// World time multiplier set by the script
    pub world_scale: f32,
}

impl LevelState {
    pub fn new(blueprint: Arc<LevelBlueprint>, grid: TileGrid) -> Self {
        let bounds = if blueprint.bounded { grid.bounds() } else { None };
        let mut tutorial = Tutorial::default();
        if blueprint.tutorial {
            tutorial.show(TutorialHint::Navigate);
        }

        Self {
            player: PhysicsBody::avatar(blueprint.spawn),
            probe: Probe::new(blueprint.spawn),
            projectiles: ProjectileSet::new(blueprint.projectile_cap),
            timeline: blueprint.script.clone().map(Timeline::new),
            interactions: InteractionRegistry::new(
                &blueprint.npcs,
                blueprint.puzzle.as_ref(),
                blueprint.filter,
            ),
            camera: Camera::new(blueprint.spawn, bounds),
            boss: blueprint.boss.map(Boss::new),
            door: blueprint.door,
            ready_to_exit: false,
            resources: STARTING_RESOURCES,
            level_time: 0,
            death: None,
            bubble: SpeechBubble::default(),
            hints: HintTracker::new(blueprint.hints.len()),
            tutorial,
            objectives_visible: true,
            world_scale: 1.0,
            grid,
            blueprint,
        }
    }

    pub fn id(&self) -> LevelId {
        self.blueprint.id
    }

    pub fn viewport(&self) -> Rect {
        self.camera.viewport()
    }

    /// Hitbox projectiles are tested against
    pub fn hitbox(&self) -> Rect {
        if self.probe.is_active() {
            self.probe.hitbox()
        } else {
            self.player.rect()
        }
    }

    /// Centre of whichever avatar the player controls
    pub fn avatar_center(&self) -> Vec2 {
        if self.probe.is_active() {
            self.probe.body.center()
        } else {
            self.player.center()
        }
    }

    pub fn is_dying(&self) -> bool {
        self.death.is_some()
    }

    /// Enter the dying state. False (and no change) if already dying.
    pub fn trigger_death(&mut self) -> bool {
        if self.death.is_some() {
            return false;
        }
        self.death = Some(Death { ticks: 1 });
        self.probe.cancel(&mut self.player);
        true
    }

    /// Whether the level currently allows deploying the probe
    pub fn probe_unlocked(&self) -> bool {
        match self.blueprint.probe_gate {
            ProbeGate::Always => true,
            ProbeGate::AfterScriptStart => self.timeline.as_ref().is_some_and(Timeline::has_started),
        }
    }
}

/// Complete game state for one play session
#[derive(Debug, Clone)]
pub struct GameState {
    pub seed: u64,
    pub rng: Pcg32,
    /// Ticks since the session started
    pub game_time: u64,
    pub stats: SessionStats,
    pub console: NetworkConsole,
    pub transition: Option<Transition>,
    pub level: LevelState,
    /// Pending events, drained by the shell every frame
    pub events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(blueprint: Arc<LevelBlueprint>, grid: TileGrid, seed: u64) -> Self {
        log::info!("Session started in {} (seed {seed})", blueprint.id.as_str());
        let music = blueprint.music;
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            game_time: 0,
            stats: SessionStats::default(),
            console: NetworkConsole::default(),
            transition: None,
            level: LevelState::new(blueprint, grid),
            events: vec![GameEvent::Music(MusicCue::Play(music))],
        }
    }

    /// Replace the level-scoped state from a blueprint.
    ///
    /// `restart_music` is set when entering a new level rather than retrying.
    pub fn load_level(&mut self, blueprint: Arc<LevelBlueprint>, grid: TileGrid, restart_music: bool) {
        log::info!("Loading {}", blueprint.id.as_str());
        if restart_music {
            self.events.push(GameEvent::Music(MusicCue::Play(blueprint.music)));
        }
        self.level = LevelState::new(blueprint, grid);
    }

    /// Start a screen transition unless one is already running
    pub fn begin_transition(&mut self, completes_level: bool) -> bool {
        if self.transition.is_some() {
            return false;
        }
        self.transition = Some(Transition::new(completes_level));
        true
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_midpoint_once() {
        let mut t = Transition::new(false);
        let mut midpoints = 0;
        let mut steps = 0;
        loop {
            steps += 1;
            match t.advance(0.5) {
                TransitionStep::Midpoint => midpoints += 1,
                TransitionStep::Done => break,
                TransitionStep::Fading => {}
            }
        }
        assert_eq!(midpoints, 1);
        // Counter starts at 1
        assert_eq!(steps, ((TRANSITION_END - 1.0) / 0.5).ceil() as i32);
    }

    #[test]
    fn test_transition_cover_curve() {
        let mut t = Transition::new(true);
        assert!(t.cover() < 0.02);
        t.ticks = 30.0;
        assert!((t.cover() - 0.5).abs() < 1e-6);
        t.ticks = 60.0;
        assert_eq!(t.cover(), 1.0);
        t.ticks = 90.0;
        assert!((t.cover() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_large_delta_still_hits_midpoint() {
        let mut t = Transition::new(false);
        assert_eq!(t.advance(58.0), TransitionStep::Fading);
        assert_eq!(t.advance(3.0), TransitionStep::Midpoint);
        assert_eq!(t.advance(3.0), TransitionStep::Fading);
        assert_eq!(t.advance(100.0), TransitionStep::Done);
    }

    #[test]
    fn test_delta_past_the_end_still_reloads() {
        let mut t = Transition::new(false);
        t.ticks = 2.0;
        assert_eq!(t.advance(130.0), TransitionStep::Midpoint);
        assert_eq!(t.advance(1.0), TransitionStep::Done);
    }
}
