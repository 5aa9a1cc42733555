//! Serializable per-frame snapshot for renderers
//!
//! The simulation owns no drawing state; a shell captures a `FrameView`
//! after each tick and draws from it (or ships it to JS as JSON).

use glam::Vec2;
use serde::Serialize;

use super::body::{Facing, PhysicsBody, Pose};
use super::interaction::NpcKind;
use super::message::TutorialHint;
use super::queue::FirewallRule;
use super::state::{GameState, SessionStats};
use crate::Palette;
use crate::levels::Objectives;

#[derive(Debug, Clone, Serialize)]
pub struct BodyView {
    pub pos: Vec2,
    pub facing: Facing,
    pub pose: Pose,
    pub rotation: f32,
    pub opacity: u8,
}

impl BodyView {
    fn of(body: &PhysicsBody) -> Self {
        Self {
            pos: body.pos,
            facing: body.facing,
            pose: body.pose(),
            rotation: body.rotation,
            opacity: body.opacity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileView {
    pub pos: Vec2,
    pub vel: Vec2,
    pub phase: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BossView {
    pub pos: Vec2,
    pub intensity: f32,
    /// Angle from the eye toward the controlled avatar
    pub gaze: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct NpcView {
    pub pos: Vec2,
    pub name: String,
    pub kind: NpcKind,
    /// Player is in range and has not talked yet
    pub prompt: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TerminalView {
    pub pos: Vec2,
    pub solved: bool,
    pub prompt: bool,
    pub feedback: Option<String>,
    /// Answer typed so far, while the field is open
    pub input: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterView {
    pub pos: Vec2,
    pub active: bool,
    pub completed: bool,
    pub prompt: bool,
    pub score: u32,
    pub required: u32,
    /// Head first
    pub queue: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsoleView {
    /// Top of the stack first
    pub rules: Vec<FirewallRule>,
    pub rule_feedback: Option<String>,
    pub threat_level: f32,
    pub threat_band: Palette,
    pub alerts: Vec<String>,
    pub bandwidth: f32,
    pub packets_total: u32,
    pub packets_malicious: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BubbleView {
    pub text: String,
    pub scale: f32,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameView {
    pub level: &'static str,
    pub game_time: u64,
    pub level_time: u64,
    pub scroll: Vec2,
    pub zoom: f32,
    /// Screen cover from transitions, 0..1
    pub fade: f32,
    pub player: BodyView,
    pub probe: Option<BodyView>,
    pub projectiles: Vec<ProjectileView>,
    pub boss: Option<BossView>,
    pub door: Option<Vec2>,
    pub door_unlocked: bool,
    pub npcs: Vec<NpcView>,
    pub terminal: Option<TerminalView>,
    pub filter: Option<FilterView>,
    pub console: ConsoleView,
    pub bubble: Option<BubbleView>,
    pub resources: u32,
    pub stats: SessionStats,
    pub tutorial: Vec<TutorialHint>,
    pub objectives: Option<Objectives>,
    pub banner: Option<String>,
    /// Frame rate counter, filled in by the shell when enabled
    pub fps: Option<f32>,
}

impl FrameView {
    pub fn capture(state: &GameState) -> Self {
        let level = &state.level;
        let player_pos = level.player.pos;
        let interactions = &level.interactions;

        let npcs = interactions
            .npcs
            .iter()
            .map(|n| NpcView {
                pos: n.pos,
                name: n.name.clone(),
                kind: n.kind,
                prompt: n.can_interact(player_pos) && !n.talked(),
            })
            .collect();

        let terminal = interactions.puzzle.as_ref().map(|p| TerminalView {
            pos: p.pos,
            solved: p.is_solved(),
            prompt: p.can_activate(player_pos),
            feedback: p.feedback().map(str::to_string),
            input: interactions
                .answer
                .is_open()
                .then(|| interactions.answer.text().to_string()),
        });

        let filter = interactions.filter.as_ref().map(|f| FilterView {
            pos: f.pos,
            active: f.is_active(),
            completed: f.is_completed(),
            prompt: f.can_activate(player_pos),
            score: f.score(),
            required: f.required(),
            queue: f.queue().iter().map(|p| format!("#{} {}", p.id, p.label())).collect(),
        });

        let console = &state.console;
        let traffic = console.traffic.stats();
        let console = ConsoleView {
            rules: console.rules.iter_top_down().copied().collect(),
            rule_feedback: console.rules.feedback().map(str::to_string),
            threat_level: console.ids.threat_level(),
            threat_band: console.ids.band(),
            alerts: console.ids.alerts().map(|a| a.text.clone()).collect(),
            bandwidth: traffic.bandwidth,
            packets_total: traffic.total,
            packets_malicious: traffic.malicious,
        };

        let target = level.avatar_center();
        let boss = level.boss.as_ref().filter(|b| b.visible).map(|b| BossView {
            pos: b.position(),
            intensity: b.intensity,
            gaze: crate::angle_to(b.position(), target),
        });

        let bubble = (!level.bubble.is_hidden() && !level.is_dying()).then(|| BubbleView {
            text: level.bubble.revealed().to_string(),
            scale: level.bubble.scale(),
        });

        Self {
            level: level.id().as_str(),
            game_time: state.game_time,
            level_time: level.level_time,
            scroll: level.camera.scroll(),
            zoom: level.camera.zoom,
            fade: state.transition.map_or(0.0, |t| t.cover()),
            player: BodyView::of(&level.player),
            probe: level.probe.is_active().then(|| BodyView::of(&level.probe.body)),
            projectiles: level
                .projectiles
                .iter()
                .map(|p| ProjectileView {
                    pos: p.pos,
                    vel: p.vel,
                    phase: p.phase,
                })
                .collect(),
            boss,
            door: level.door,
            door_unlocked: interactions.exit_unlocked(),
            npcs,
            terminal,
            filter,
            console,
            bubble,
            resources: level.resources,
            stats: state.stats,
            tutorial: level.tutorial.showing(),
            objectives: level
                .objectives_visible
                .then(|| level.blueprint.objectives.clone()),
            banner: level.blueprint.banner.clone(),
            fps: None,
        }
    }

    /// Centre of the camera view in world space
    pub fn view_center(&self) -> Vec2 {
        self.scroll + Vec2::new(crate::consts::VIEW_WIDTH, crate::consts::VIEW_HEIGHT) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::{LevelCatalog, LevelId};

    #[test]
    fn test_capture_serializes() {
        let catalog = LevelCatalog::builtin();
        let (bp, grid) = catalog.load(LevelId::Sector1).unwrap();
        let state = GameState::new(bp, grid, 3);
        let view = FrameView::capture(&state);
        assert_eq!(view.level, "level_1");
        assert!(view.objectives.is_some());
        assert_eq!(view.npcs.len(), 2);
        assert_eq!(view.tutorial, vec![TutorialHint::Navigate]);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["resources"], 1);
        assert_eq!(json["console"]["threat_band"], "Safe");
    }

    #[test]
    fn test_boss_hidden_after_defeat() {
        let catalog = LevelCatalog::builtin();
        let (bp, grid) = catalog.load(LevelId::Sector3).unwrap();
        let mut state = GameState::new(bp, grid, 3);
        assert!(FrameView::capture(&state).boss.is_some());
        if let Some(boss) = &mut state.level.boss {
            boss.defeat();
        }
        assert!(FrameView::capture(&state).boss.is_none());
    }
}
