//! Authored level timelines and hint tables

use glam::Vec2;

use crate::audio::SoundCue;
use crate::sim::message::{HintRule, HintTrigger, TutorialHint};
use crate::sim::tick::lines;
use crate::sim::timeline::{
    Action, BOSS_FAN, Gate, RainSchedule, Rule, Script, ScriptEnd, ScriptStart, SpawnPattern, Surge,
};

pub const EXIT_UP: &str = "El nodo seguro esta arriba...";
pub const REMOTE_SCAN: &str = "Puedo escanear con mi sonda.";
pub const CLEAR: &str = "Red estabilizada.";
pub const THREAT: &str = "Amenaza critica detectada...";
pub const MORE_ATTACKS: &str = "Mas patrones de ataque?";
pub const SILENCE: &str = "...";

const SECTOR2_DOOR: Vec2 = Vec2::new(330.0, 369.0);
const SECTOR3_DOOR: Vec2 = Vec2::new(360.0, 378.0);

fn say(text: &str, ticks: u32) -> Action {
    Action::Say {
        text: text.to_string(),
        ticks,
    }
}

/// Training sector: a scripted freeze that teaches the probe
pub fn sector1() -> Script {
    Script {
        timer: "level_1".to_string(),
        start: ScriptStart::PlayerPastX(446.0),
        // Deploy frame counts as the first held tick
        end: ScriptEnd::ProbeHeldFor(19.0),
        on_start: vec![
            Action::Spawn(SpawnPattern::Wall {
                count: 17,
                divisions: 15.0,
                speed: 4.0,
            }),
            Action::Sound(SoundCue::ShootLarge),
        ],
        rules: vec![
            Rule::at(32.0, vec![Action::Hint(TutorialHint::DeployProbe)]),
            Rule::during(
                32.0,
                f32::MAX,
                Gate::Always,
                vec![Action::TimeScale {
                    normal: 0.0,
                    probing: 0.5,
                }],
            ),
        ],
        rain: Some(RainSchedule::steady(25)),
        resting_intensity: None,
    }
}

pub fn sector1_hints() -> Vec<HintRule> {
    vec![
        HintRule {
            trigger: HintTrigger::PlayerPastX(530.0),
            after: None,
            needs_resource: false,
            wait_quiet: false,
            text: lines::NEED_FIREWALL.to_string(),
            ticks: 320,
        },
        HintRule {
            trigger: HintTrigger::LevelTimeAfter(1500),
            after: Some(0),
            needs_resource: true,
            wait_quiet: true,
            text: EXIT_UP.to_string(),
            ticks: 320,
        },
        HintRule {
            trigger: HintTrigger::LevelTimeAfter(2500),
            after: Some(1),
            needs_resource: true,
            wait_quiet: true,
            text: REMOTE_SCAN.to_string(),
            ticks: 500,
        },
    ]
}

/// Waves of malicious packets with probe checkpoints
pub fn sector2() -> Script {
    let surge = |start, end| Surge {
        start,
        end,
        rate: 12,
    };
    Script {
        timer: "level_2".to_string(),
        start: ScriptStart::Immediately,
        end: ScriptEnd::Never,
        on_start: vec![say("Preparate para el desafio...", 420)],
        rules: vec![
            Rule::at(
                920.0,
                vec![Action::ResetProbe, say("Esquiva los paquetes maliciosos!", 420)],
            ),
            Rule::at(1840.0, vec![Action::ResetProbe]),
            Rule::at(2750.0, vec![Action::ResetProbe]),
            Rule::during(
                3200.0,
                3500.0,
                Gate::Periods(vec![350.0, 180.0]),
                vec![
                    Action::Spawn(SpawnPattern::Sweep {
                        count: 6,
                        divisions: 5.0,
                        speed: 3.5,
                    }),
                    Action::Sound(SoundCue::ShootLarge),
                ],
            ),
            Rule::at(
                3700.0,
                vec![
                    Action::ResetProbe,
                    say(CLEAR, 420),
                    Action::OpenExit { door: SECTOR2_DOOR },
                    Action::Sound(SoundCue::EndLevel),
                ],
            ),
        ],
        rain: Some(RainSchedule {
            rate: 25,
            until: None,
            surges: vec![
                surge(240.0, 840.0),
                surge(1200.0, 1760.0),
                surge(2000.0, 2600.0),
            ],
        }),
        resting_intensity: None,
    }
}

/// Compromised server boss fight
pub fn sector3() -> Script {
    let intensity = |start, end, level| Rule::during(start, end, Gate::Always, vec![Action::Intensity(level)]);
    let volley = |start, end, gate, pattern, cue| {
        Rule::during(start, end, gate, vec![Action::Spawn(pattern), Action::Sound(cue)])
    };
    let spiral = |count, mirrored| SpawnPattern::Spiral {
        count,
        speed: 3.5,
        mirrored,
    };

    Script {
        timer: "level_3".to_string(),
        start: ScriptStart::Immediately,
        end: ScriptEnd::Never,
        on_start: vec![say(THREAT, 200)],
        rules: vec![
            intensity(200.0, 800.0, 30.0),
            intensity(1300.0, 1800.0, 30.0),
            intensity(2500.0, 3100.0, 38.0),
            intensity(3600.0, 4500.0, 38.0),
            intensity(5200.0, 5800.0, 30.0),
            volley(200.0, 800.0, Gate::Chance(70), BOSS_FAN, SoundCue::ShootLarge),
            volley(
                1300.0,
                1800.0,
                Gate::Chance(90),
                SpawnPattern::Ring {
                    count: 36,
                    speed: 3.5,
                },
                SoundCue::ShootLarge,
            ),
            volley(2500.0, 3100.0, Gate::EveryTicks(10), spiral(6, false), SoundCue::Shoot),
            volley(3600.0, 4500.0, Gate::EveryTicks(17), spiral(6, true), SoundCue::Shoot),
            volley(5200.0, 5800.0, Gate::EveryTicks(3), spiral(3, false), SoundCue::Shoot),
            Rule::at(1150.0, vec![Action::ResetProbe]),
            Rule::at(1200.0, vec![say(MORE_ATTACKS, 200)]),
            Rule::at(2300.0, vec![Action::ResetProbe]),
            Rule::at(3400.0, vec![Action::ResetProbe]),
            Rule::at(4800.0, vec![Action::ResetProbe]),
            Rule::at(6200.0, vec![Action::Sound(SoundCue::Shake)]),
            Rule::during(
                6200.0,
                6600.0,
                Gate::Always,
                vec![Action::Intensity(24.0), Action::BossShake { amplitude: 4.0 }],
            ),
            Rule::at(
                6800.0,
                vec![
                    Action::ResetProbe,
                    say(SILENCE, 200),
                    Action::OpenExit { door: SECTOR3_DOOR },
                    Action::Sound(SoundCue::EndLevel),
                    Action::Sound(SoundCue::Death),
                    Action::BossDefeated,
                ],
            ),
        ],
        rain: Some(RainSchedule {
            rate: 25,
            until: Some(6300.0),
            surges: Vec::new(),
        }),
        resting_intensity: Some(4.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::timeline::{StepContext, Timeline, TimerPhase};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn run(script: Script, frames: usize) -> (Timeline, Vec<Action>) {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut timeline = Timeline::new(script);
        let mut crossings = Vec::new();
        for frame in 0..frames {
            let ctx = StepContext {
                player_x: 0.0,
                probe_elapsed: None,
                game_time: frame as u64,
            };
            crossings.extend(timeline.step(1.0, &ctx, &mut rng).crossings);
        }
        (timeline, crossings)
    }

    #[test]
    fn test_sector1_waits_for_player() {
        let (timeline, crossings) = run(sector1(), 100);
        assert_eq!(timeline.phase(), TimerPhase::Waiting);
        assert!(crossings.is_empty());
        assert_eq!(timeline.rain_rate(), None);
    }

    #[test]
    fn test_sector2_opens_exit_at_the_end() {
        let (timeline, crossings) = run(sector2(), 3700);
        let resets = crossings.iter().filter(|a| **a == Action::ResetProbe).count();
        assert_eq!(resets, 4);
        assert!(crossings.contains(&Action::OpenExit { door: SECTOR2_DOOR }));
        assert_eq!(timeline.rain_rate(), Some(25));
    }

    #[test]
    fn test_sector3_ends_with_boss_defeat() {
        let (timeline, crossings) = run(sector3(), 6799);
        assert!(!crossings.contains(&Action::BossDefeated));
        assert_eq!(timeline.rain_rate(), None);

        let (_, crossings) = run(sector3(), 6800);
        assert_eq!(crossings.last(), Some(&Action::BossDefeated));
    }

    #[test]
    fn test_sector1_freeze_ends_after_twenty_held_ticks() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut timeline = Timeline::new(sector1());
        let mut ctx = StepContext {
            player_x: 447.0,
            probe_elapsed: None,
            game_time: 0,
        };
        timeline.step(1.0, &ctx, &mut rng);
        assert_eq!(timeline.phase(), TimerPhase::Running);

        // Elapsed 19 is the twentieth held tick counting the deploy frame
        ctx.probe_elapsed = Some(19.0);
        timeline.step(1.0, &ctx, &mut rng);
        assert_eq!(timeline.phase(), TimerPhase::Running);
        ctx.probe_elapsed = Some(19.5);
        timeline.step(1.0, &ctx, &mut rng);
        assert_eq!(timeline.phase(), TimerPhase::Finished);
    }

    #[test]
    fn test_sector3_eye_rises_while_shaking() {
        let (mut timeline, _) = run(sector3(), 6300);
        let mut rng = Pcg32::seed_from_u64(1);
        let ctx = StepContext {
            player_x: 0.0,
            probe_elapsed: None,
            game_time: 6300,
        };
        let step = timeline.step(1.0, &ctx, &mut rng);
        assert!(step.active.contains(&Action::Intensity(24.0)));
        assert!(!step.active.contains(&Action::Intensity(4.0)));
        assert!(step.active.contains(&Action::BossShake { amplitude: 4.0 }));
    }

    #[test]
    fn test_hints_chain_in_order() {
        let hints = sector1_hints();
        assert_eq!(hints[1].after, Some(0));
        assert_eq!(hints[2].after, Some(1));
        assert!(hints[1..].iter().all(|h| h.needs_resource && h.wait_quiet));
    }
}
