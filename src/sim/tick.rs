//! Variable timestep simulation tick
//!
//! Core game loop: one call advances the whole level by one frame. `dt` is
//! the frame delta multiplier (1.0 at a steady 60 Hz).

use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;

use super::collision::Rect;
use super::effects::{ParticleBurst, ParticleStyle, SparkBurst};
use super::interaction::{AnswerOutcome, Interaction, TextKey};
use super::message::{HintContext, TutorialHint};
use super::minigame::Classification;
use super::probe::ProbeToggle;
use super::queue::FirewallRule;
use super::state::{GameEvent, GameState, TransitionStep};
use super::timeline::{Action, SpawnPattern, StepContext, VolleyContext};
use crate::Palette;
use crate::audio::{MusicCue, SoundCue};
use crate::consts::*;

/// Bubble lines shown by the core loop
pub mod lines {
    pub const NEED_FIREWALL: &str = "Necesito mas poder de procesamiento!";
    pub const MOVE_ON: &str = "Debo seguir adelante...";
    pub const DOOR_LOCKED: &str = "Terminal de acceso bloqueada!";
    pub const FILTER_ON: &str = "Mini-juego: Filtrado de Paquetes activado!";
    pub const FILTER_DONE: &str = "Sistema de filtrado completado!";
    pub const TERMINAL_OK: &str = "Terminal desbloqueada!";
    pub const TERMINAL_DENIED: &str = "Acceso denegado. Intenta de nuevo.";
}

/// Where volleys originate when a level has no boss
const DEFAULT_EYE: Vec2 = Vec2::new(386.0, 220.0);
const PROBE_BURST: u32 = 50;

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Held directions
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// One-shot presses
    pub jump: bool,
    /// Deploy the probe, or recall it when already out
    pub probe: bool,
    pub interact: bool,
    /// Packet filter verdicts
    pub flag_threat: bool,
    pub flag_safe: bool,
    pub push_rule: Option<FirewallRule>,
    pub pop_rule: bool,
    /// Dismiss the objectives card
    pub dismiss: bool,
    /// Keys for the answer field, in order
    pub text: Vec<TextKey>,
    /// Finish the level immediately (debug/testing)
    pub skip_level: bool,
    /// Autopilot plays the level
    pub autopilot: bool,
}

/// A reload the shell must perform this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reload {
    /// Load the next level instead of the current one
    pub advance: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub reload: Option<Reload>,
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> TickOutcome {
    let mut outcome = TickOutcome::default();

    state.game_time += 1;
    state.level.level_time += 1;

    // World delta uses the time scale chosen by the script last frame
    let world_dt = dt * state.level.world_scale;

    let dying_out = state.level.death.as_mut().is_some_and(|death| {
        death.ticks += 1;
        death.ticks > DEATH_TICKS
    });
    if dying_out {
        state.begin_transition(false);
    }

    if let Some(transition) = &mut state.transition {
        let completes_level = transition.completes_level;
        match transition.advance(dt) {
            TransitionStep::Midpoint => {
                if completes_level {
                    let finished = state.level.id();
                    state.stats.levels_completed += 1;
                    state.events.push(GameEvent::LevelCompleted(finished));
                    log::info!("Sector {} cleared", finished.as_str());
                }
                outcome.reload = Some(Reload {
                    advance: completes_level,
                });
                return outcome;
            }
            TransitionStep::Done => state.transition = None,
            TransitionStep::Fading => {}
        }
    }

    let fading_out = state.transition.is_some_and(|t| t.fading_out());
    state.level.camera.update(state.level.player.pos, world_dt, fading_out);

    let mut input = input.clone();
    if input.autopilot {
        autopilot(state, &mut input);
    }

    if input.skip_level && state.begin_transition(true) {
        log::info!("Skipping {}", state.level.id().as_str());
    }

    check_door(state);
    handle_input(state, &input);

    state.level.interactions.tick(world_dt, &mut state.rng);
    state.console.tick(world_dt, state.game_time, &mut state.rng);

    move_player(state, &input, world_dt);
    step_probe(state, &input, world_dt);
    collect_resources(state);

    if let Some(boss) = &mut state.level.boss {
        boss.begin_frame();
    }
    let reset = run_timeline(state, dt);
    poll_hints(state);
    if reset {
        recall_probe(state);
    }

    let projectile_dt = dt * state.level.world_scale;
    step_projectiles(state, projectile_dt);
    spawn_rain(state);

    if let Some(boss) = &mut state.level.boss {
        boss.update(&mut state.rng);
    }

    let dying = state.level.is_dying();
    if state.level.bubble.tick(dying) {
        state.events.push(GameEvent::Sound(SoundCue::Thought));
    }

    outcome
}

/// Minimal level-playing AI for the headless shell and soak tests
fn autopilot(state: &GameState, input: &mut TickInput) {
    let level = &state.level;
    input.right = true;
    input.left = false;

    let ahead = level.player.rect();
    let probe_box = Rect::new(ahead.right(), ahead.y, TILE_SIZE, ahead.h - 1.0);
    let blocked = level
        .grid
        .blocking_rects(&level.viewport())
        .iter()
        .any(|r| r.intersects(&probe_box));
    input.jump |= blocked && level.player.can_jump();

    input.interact |= state.game_time % 45 == 0;
    input.dismiss = true;

    // Wait out the level 1 freeze with the probe, then come back
    if level.tutorial.showing().contains(&TutorialHint::DeployProbe) {
        input.probe = !level.probe.is_active();
    } else if level.probe.elapsed().is_some_and(|e| e > 60.0) {
        input.probe = true;
    }
}

fn say(state: &mut GameState, text: &str, ticks: u32) {
    state.level.bubble.say(text, ticks);
}

fn sound(state: &mut GameState, cue: SoundCue) {
    state.events.push(GameEvent::Sound(cue));
}

fn check_door(state: &mut GameState) {
    let Some(door) = state.level.door else {
        return;
    };
    let door_center = door + Vec2::new(6.0, 9.0);
    if state.level.player.center().distance(door_center) >= DOOR_REACH {
        return;
    }

    if state.level.interactions.exit_unlocked() {
        if state.begin_transition(true) {
            state.events.push(GameEvent::Music(MusicCue::FadeOut { millis: 500 }));
            sound(state, SoundCue::Door);
        }
    } else if state.level.bubble.is_idle() {
        say(state, lines::DOOR_LOCKED, 120);
    }
}

fn handle_input(state: &mut GameState, input: &TickInput) {
    if input.dismiss {
        state.level.objectives_visible = false;
    }

    // An open answer field captures every key
    if state.level.interactions.answer.is_open() {
        for key in &input.text {
            match state.level.interactions.answer_key(*key) {
                Some(AnswerOutcome::Accepted) => {
                    sound(state, SoundCue::ResourceChime);
                    say(state, lines::TERMINAL_OK, 180);
                }
                Some(AnswerOutcome::Rejected) => {
                    sound(state, SoundCue::Death);
                    say(state, lines::TERMINAL_DENIED, 180);
                }
                Some(AnswerOutcome::Cancelled) | None => {}
            }
        }
        return;
    }

    if input.interact {
        let pos = state.level.player.pos;
        for interaction in state.level.interactions.interact(pos) {
            match interaction {
                Interaction::Dialogue { name, line } => {
                    log::debug!("{name}: {line}");
                    say(state, &line, 300);
                    sound(state, SoundCue::Thought);
                }
                Interaction::TerminalOpened { question } => {
                    say(state, &question, 400);
                    sound(state, SoundCue::Thought);
                }
                Interaction::FilterToggled { active: true } => {
                    say(state, lines::FILTER_ON, 300);
                    sound(state, SoundCue::Thought);
                }
                Interaction::FilterToggled { active: false } => {}
            }
        }
    }

    for as_threat in [true, false] {
        let pressed = if as_threat { input.flag_threat } else { input.flag_safe };
        if !pressed {
            continue;
        }
        let Some(filter) = &mut state.level.interactions.filter else {
            continue;
        };
        match filter.classify(as_threat) {
            Some(Classification::Completed) => {
                state.level.resources += 1;
                say(state, lines::FILTER_DONE, 200);
                sound(state, SoundCue::ResourceChime);
            }
            Some(Classification::Correct) => sound(state, SoundCue::ResourceSparkle),
            Some(Classification::Incorrect) => sound(state, SoundCue::Death),
            None => {}
        }
    }

    if let Some(rule) = input.push_rule
        && state.console.rules.push(rule)
    {
        sound(state, SoundCue::ResourceSparkle);
    }
    if input.pop_rule && state.console.rules.pop().is_some() {
        sound(state, SoundCue::Death);
    }

    if input.right {
        state.level.tutorial.dismiss(TutorialHint::Navigate);
    }

    if input.probe {
        toggle_probe(state);
    }

    if input.jump {
        jump(state);
    }
}

fn toggle_probe(state: &mut GameState) {
    let level = &mut state.level;
    if level.ready_to_exit && !level.probe.is_active() {
        level.bubble.say(lines::MOVE_ON, 300);
        return;
    }
    if state.transition.is_some() || level.is_dying() {
        return;
    }

    let unlocked = level.probe_unlocked();
    match level.probe.toggle(&mut level.player, &mut level.resources, unlocked) {
        ProbeToggle::Entered => {
            level.tutorial.dismiss(TutorialHint::DeployProbe);
            let center = level.player.center();
            state.events.push(GameEvent::Sound(SoundCue::EnterProbe));
            state
                .events
                .push(GameEvent::Particles(ParticleBurst::new(center, PROBE_BURST, Palette::PrimaryCyan)));
        }
        ProbeToggle::Exited => probe_exit_effects(state),
        ProbeToggle::NoResources => level.bubble.say(lines::NEED_FIREWALL, 200),
        ProbeToggle::Locked => {}
    }
}

fn jump(state: &mut GameState) {
    let level = &mut state.level;
    if level.is_dying() || level.probe.is_active() || state.transition.is_some() || !level.player.can_jump() {
        return;
    }
    level.player.vel.y = JUMP_VELOCITY;

    let rect = level.player.rect();
    for (corner, angle) in [
        (Vec2::new(rect.left(), rect.bottom()), PI * 0.9),
        (Vec2::new(rect.right(), rect.bottom()), PI * 0.1),
    ] {
        let speed = 2.0 + state.rng.random_range(0..=10) as f32 / 10.0;
        state.events.push(GameEvent::Sparks(SparkBurst {
            pos: corner,
            angle,
            spread: 0.0,
            count: 1,
            speed,
            scale: 5.0,
            palette: Palette::PrimaryCyan,
        }));
    }
    state.events.push(GameEvent::Sound(SoundCue::Jump));
}

fn move_player(state: &mut GameState, input: &TickInput, dt: f32) {
    let transitioning = state.transition.is_some();
    let level = &mut state.level;
    let player = &mut level.player;

    player.air_ticks += 1.0;
    if !transitioning {
        player.apply_gravity(dt);
    }

    let mut movement = player.vel;
    let dying = level.death.map(|d| d.ticks);
    if dying.is_none() && !level.probe.is_active() && !transitioning {
        if input.right {
            movement.x += RUN_IMPULSE;
        }
        if input.left {
            movement.x -= RUN_IMPULSE;
        }
    }

    let mut blocking = Vec::new();
    if dying.is_some() {
        movement.x = DEATH_DRIFT;
        player.rotation -= DEATH_SPIN_DEGREES;
    } else {
        blocking = level.grid.blocking_rects(&level.camera.viewport());
    }
    if dying == Some(2) {
        player.vel.y = DEATH_HOP_VELOCITY;
        state.stats.breaches += 1;
        state.events.push(GameEvent::Breach);
    }

    movement.x *= dt.min(MAX_FRAME_DELTA);
    movement.y = (movement.y * dt).min(MAX_FALL_STEP);

    if transitioning {
        player.last_move = Vec2::ZERO;
        return;
    }
    let collisions = player.integrate(movement, &blocking);
    if collisions.vertical() {
        player.vel.y = 0.0;
    }
    if collisions.bottom {
        player.air_ticks = 0.0;
    }
    player.face_toward(movement.x);
}

fn step_probe(state: &mut GameState, input: &TickInput, dt: f32) {
    let level = &mut state.level;
    if !level.probe.is_active() {
        return;
    }

    let axis = |neg: bool, pos: bool| (pos as i32 - neg as i32) as f32;
    let dir = Vec2::new(axis(input.left, input.right), axis(input.up, input.down));
    let viewport = level.camera.viewport();
    let auto_return = level.blueprint.auto_return;
    if level.probe.step(dir, dt, &viewport, auto_return, &mut level.player) {
        log::debug!("Probe timed out");
        probe_exit_effects(state);
    }
}

/// Force the player out of probe mode at a scripted checkpoint
fn recall_probe(state: &mut GameState) {
    let level = &mut state.level;
    if level.probe.recall(&mut level.player) {
        probe_exit_effects(state);
    }
}

fn probe_exit_effects(state: &mut GameState) {
    let center = state.level.player.center();
    state.events.push(GameEvent::Sound(SoundCue::ExitProbe));
    for _ in 0..2 {
        state
            .events
            .push(GameEvent::Particles(ParticleBurst::new(center, PROBE_BURST, Palette::PrimaryCyan)));
    }
}

fn collect_resources(state: &mut GameState) {
    let center = state.level.player.center();
    let Some(tile_center) = state.level.grid.take_resource(center) else {
        return;
    };

    state.level.resources += 1;
    state.stats.firewalls_collected += 1;
    state.events.push(GameEvent::ResourceCollected);
    sound(state, SoundCue::ResourceChime);
    sound(state, SoundCue::ResourceSparkle);
    for i in 0..2 {
        let i = i as f32;
        for (angle, speed, scale, palette) in [
            (PI / 2.0 + PI * i, 10.0, 6.0, Palette::PrimaryGreen),
            (PI * i, 6.0, 3.0, Palette::PrimaryCyan),
        ] {
            state.events.push(GameEvent::Sparks(SparkBurst {
                pos: tile_center,
                angle,
                spread: 0.0,
                count: 1,
                speed,
                scale,
                palette,
            }));
        }
    }
    state
        .events
        .push(GameEvent::Particles(ParticleBurst::new(tile_center, 20, Palette::PrimaryGreen)));
}

/// Step the level script and apply its actions. Returns true on a probe reset.
fn run_timeline(state: &mut GameState, dt: f32) -> bool {
    state.level.world_scale = 1.0;
    let Some(timeline) = &mut state.level.timeline else {
        return false;
    };

    let ctx = StepContext {
        player_x: state.level.player.pos.x,
        probe_elapsed: state.level.probe.elapsed(),
        game_time: state.game_time,
    };
    let step = timeline.step(dt, &ctx, &mut state.rng);

    let mut reset = false;
    for action in step.crossings.into_iter().chain(step.active) {
        apply_action(state, action, &mut reset);
    }
    reset
}

fn apply_action(state: &mut GameState, action: Action, reset: &mut bool) {
    match action {
        Action::Spawn(pattern) => spawn_volley(state, &pattern),
        Action::Intensity(target) => {
            if let Some(boss) = &mut state.level.boss {
                boss.target_intensity = target;
            }
        }
        Action::BossShake { amplitude } => {
            if let Some(boss) = &mut state.level.boss {
                boss.shake(amplitude, &mut state.rng);
            }
        }
        Action::BossDefeated => {
            if let Some(boss) = &mut state.level.boss {
                let pos = boss.position();
                boss.defeat();
                log::info!("Boss defeated");
                state
                    .events
                    .push(GameEvent::Sparks(SparkBurst::ring(pos, 35, 7.0, 8.0, Palette::PrimaryGreen)));
                state.events.push(GameEvent::Particles(
                    ParticleBurst::new(pos, 300, Palette::PrimaryGreen).explosive(),
                ));
            }
        }
        Action::OpenExit { door } => {
            state.level.door = Some(door);
            state.level.ready_to_exit = true;
        }
        Action::ResetProbe => *reset = true,
        Action::Say { text, ticks } => state.level.bubble.say(text, ticks),
        Action::Sound(cue) => sound(state, cue),
        Action::Hint(hint) => state.level.tutorial.show(hint),
        Action::TimeScale { normal, probing } => {
            state.level.world_scale = if state.level.probe.is_active() { probing } else { normal };
        }
    }
}

fn volley_context(state: &GameState) -> VolleyContext {
    VolleyContext {
        viewport: state.level.viewport(),
        boss: state.level.boss.as_ref().map_or(DEFAULT_EYE, |b| b.position()),
        target: state.level.avatar_center(),
        game_time: state.game_time,
    }
}

fn spawn_volley(state: &mut GameState, pattern: &SpawnPattern) {
    let ctx = volley_context(state);
    let shots = pattern.volley(&ctx, &mut state.rng);
    let trail = pattern.trail();

    let from_boss = matches!(
        pattern,
        SpawnPattern::AimedFan { .. } | SpawnPattern::Ring { .. } | SpawnPattern::Spiral { .. }
    );
    for shot in &shots {
        let angle = shot.vel.y.atan2(shot.vel.x);
        state.level.projectiles.spawn(shot.pos, shot.vel);
        state.events.push(GameEvent::Sparks(SparkBurst::trail(
            shot.pos,
            angle,
            trail.count,
            trail.speed,
            trail.scale,
            Palette::Danger,
        )));
    }
    if from_boss && !shots.is_empty() {
        state.events.push(GameEvent::Particles(
            ParticleBurst::new(ctx.boss, shots.len() as u32, Palette::PrimaryGreen)
                .styled(ParticleStyle::RedLight),
        ));
    }
}

fn poll_hints(state: &mut GameState) {
    let blueprint = state.level.blueprint.clone();
    if blueprint.hints.is_empty() {
        return;
    }
    let level = &mut state.level;
    let ctx = HintContext {
        player_x: level.player.pos.x,
        level_time: level.level_time,
        resources: level.resources,
        bubble_quiet: level.bubble.is_idle() && level.bubble.is_hidden(),
    };
    if let Some(i) = level.hints.poll(&blueprint.hints, &ctx) {
        let hint = &blueprint.hints[i];
        level.bubble.say(hint.text.clone(), hint.ticks);
    }
}

fn step_projectiles(state: &mut GameState, dt: f32) {
    let viewport = state.level.viewport();
    let removed = state.level.projectiles.step(dt, &viewport, &mut state.rng);
    if removed > 0 {
        state.stats.threats_neutralized += removed;
        state.events.push(GameEvent::ThreatsNeutralized(removed));
    }

    if state.transition.is_none() && !state.level.is_dying() {
        let hitbox = state.level.hitbox();
        if state.level.projectiles.check_hit(&hitbox) && state.level.trigger_death() {
            let center = hitbox.center();
            log::info!("Breach at ({:.0}, {:.0})", center.x, center.y);
            sound(state, SoundCue::Death);
            state
                .events
                .push(GameEvent::Sparks(SparkBurst::ring(center, 30, 5.0, 4.0, Palette::Danger)));
            state
                .events
                .push(GameEvent::Particles(ParticleBurst::new(center, 120, Palette::Danger).explosive()));
        }
    }

    state.level.projectiles.enforce_cap();
}

fn spawn_rain(state: &mut GameState) {
    if state.transition.is_some() {
        return;
    }
    let Some(rate) = state.level.timeline.as_ref().and_then(|t| t.rain_rate()) else {
        return;
    };
    if state.rng.random_range(0..=rate) == 0 {
        spawn_volley(state, &SpawnPattern::Rain { speed: 4.0 });
        sound(state, SoundCue::Shoot);
    }
}
