//! Complete level scripts driven through the public frame loop

use glam::Vec2;
use netguardian::audio::SoundCue;
use netguardian::levels::{LevelCatalog, LevelId};
use netguardian::sim::timeline::TimerPhase;
use netguardian::sim::{GameEvent, GameState, ProjectileSet, TickInput, tick};
use netguardian::{Game, Key, Mode};

fn session(id: LevelId, seed: u64) -> GameState {
    let (blueprint, grid) = LevelCatalog::builtin().load(id).unwrap();
    GameState::new(blueprint, grid, seed)
}

/// Run with hazards removed each frame so the script plays out undisturbed
fn run_untouched(state: &mut GameState, input: &TickInput, frames: usize) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..frames {
        state.level.projectiles = ProjectileSet::new(state.level.projectiles.cap());
        let outcome = tick(state, input, 1.0);
        assert!(outcome.reload.is_none(), "unexpected reload at t={}", state.level.level_time);
        events.extend(state.drain_events());
    }
    events
}

#[test]
fn test_sector2_script_opens_exit() {
    let mut state = session(LevelId::Sector2, 11);
    let events = run_untouched(&mut state, &TickInput::default(), 3699);
    assert_eq!(state.level.door, None);

    let events_end = run_untouched(&mut state, &TickInput::default(), 2);
    assert_eq!(state.level.door, Some(Vec2::new(330.0, 369.0)));
    assert!(state.level.ready_to_exit);
    assert!(events_end.contains(&GameEvent::Sound(SoundCue::EndLevel)));

    // Side sweeps fired inside their window
    assert!(events.contains(&GameEvent::Sound(SoundCue::ShootLarge)));
}

#[test]
fn test_sector3_boss_defeated() {
    let mut state = session(LevelId::Sector3, 5);
    let events = run_untouched(&mut state, &TickInput::default(), 6801);

    let boss = state.level.boss.as_ref().unwrap();
    assert!(!boss.visible);
    assert_eq!(state.level.door, Some(Vec2::new(360.0, 378.0)));
    assert!(events.contains(&GameEvent::Sound(SoundCue::Shake)));
    assert!(events.contains(&GameEvent::Sound(SoundCue::Shoot)));
    // Rain stops before the finale
    assert_eq!(
        state.level.timeline.as_ref().and_then(|t| t.rain_rate()),
        None
    );
}

#[test]
fn test_sector1_autopilot_learns_probe() {
    let mut state = session(LevelId::Sector1, 3);
    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };
    let events = run_untouched(&mut state, &input, 1500);

    let timeline = state.level.timeline.as_ref().unwrap();
    assert_eq!(timeline.phase(), TimerPhase::Finished);
    assert!(state.level.player.pos.x > 446.0);
    assert!(events.contains(&GameEvent::Sound(SoundCue::EnterProbe)));
    assert!(events.contains(&GameEvent::Sound(SoundCue::ShootLarge)));
}

#[test]
fn test_breach_reloads_same_sector() {
    let mut state = session(LevelId::Sector4, 9);
    for _ in 0..30 {
        tick(&mut state, &TickInput::default(), 1.0);
    }
    let center = state.level.player.center();
    state.level.projectiles.spawn(center, Vec2::ZERO);

    let mut reloads = 0;
    for _ in 0..300 {
        if let Some(reload) = tick(&mut state, &TickInput::default(), 1.0).reload {
            assert!(!reload.advance);
            reloads += 1;
            let (blueprint, grid) = LevelCatalog::builtin().load(LevelId::Sector4).unwrap();
            state.load_level(blueprint, grid, false);
        }
    }
    assert_eq!(reloads, 1);
    assert_eq!(state.stats.breaches, 1);
    // Hit on frame 1, transition from frame 71, reload at its midpoint (frame 129)
    assert_eq!(state.level.level_time, 171);
    assert!(!state.level.is_dying());
}

#[test]
fn test_headless_game_records_session() {
    let mut game = Game::headless();
    for key in [Key::Enter, Key::Space, Key::Char('Z'), Key::Enter] {
        game.key_down(key).unwrap();
    }
    assert_eq!(game.mode(), &Mode::Playing);
    game.set_autopilot(true);
    for _ in 0..600 {
        game.advance(1.0).unwrap();
    }
    game.end_session();

    let record = game.history().records.last().unwrap();
    assert_eq!(record.player_name, "Z");
    assert_eq!(record.duration_formatted.chars().last(), Some('s'));
}
