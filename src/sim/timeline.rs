//! Scripted level timelines
//!
//! Each level runs one timer advanced by the frame delta. A script is a table
//! of rules: `At` rules fire once when the timer crosses their threshold
//! (`previous < T <= current`), `During` rules fire on every frame inside an
//! open window that their gate lets through. Levels are data; the stepper
//! below is the only place crossings are detected.

use std::f32::consts::{FRAC_PI_4, TAU};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::message::TutorialHint;
use crate::audio::SoundCue;
use crate::consts::*;

/// One-shot crossing test
#[inline]
pub fn crossed(previous: f32, current: f32, threshold: f32) -> bool {
    previous < threshold && threshold <= current
}

/// Per-frame filter for `During` rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    Always,
    /// Fires when `random(0..=n) == 0`
    Chance(u32),
    /// Fires on game ticks divisible by `n`
    EveryTicks(u64),
    /// Fires when the timer wraps past a multiple of any period
    Periods(Vec<f32>),
}

impl Gate {
    fn open(&self, previous: f32, current: f32, game_time: u64, rng: &mut impl Rng) -> bool {
        match self {
            Gate::Always => true,
            Gate::Chance(n) => rng.random_range(0..=*n) == 0,
            Gate::EveryTicks(n) => *n > 0 && game_time % n == 0,
            Gate::Periods(periods) => periods
                .iter()
                .any(|p| *p > 0.0 && current % p < previous % p),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Trigger {
    At(f32),
    /// Open interval `start < t < end`
    During { start: f32, end: f32, gate: Gate },
}

/// Projectile volley shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpawnPattern {
    /// Column entering from the right edge, rows at `height * i / divisions`
    Wall { count: u32, divisions: f32, speed: f32 },
    /// Rows sweeping in from a random side with a jittered row offset
    Sweep { count: u32, divisions: f32, speed: f32 },
    /// Fan from the boss aimed at the active avatar
    AimedFan { count: u32, spread: f32, min_speed: f32, max_speed: f32 },
    /// Evenly spaced ring from the boss with a random rotation
    Ring { count: u32, speed: f32 },
    /// Ring rotating with game time; `mirrored` adds a counter-rotating copy
    Spiral { count: u32, speed: f32, mirrored: bool },
    /// Single drop from the top edge
    Rain { speed: f32 },
}

/// Where a volley originates
#[derive(Debug, Clone, Copy)]
pub struct VolleyContext {
    pub viewport: Rect,
    pub boss: Vec2,
    pub target: Vec2,
    pub game_time: u64,
}

/// One projectile to spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub pos: Vec2,
    pub vel: Vec2,
}

/// Spark trail emitted behind each spawned projectile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailStyle {
    pub count: u32,
    pub speed: f32,
    pub scale: f32,
}

impl SpawnPattern {
    pub fn volley(&self, ctx: &VolleyContext, rng: &mut impl Rng) -> Vec<Shot> {
        let vp = ctx.viewport;
        match *self {
            SpawnPattern::Wall { count, divisions, speed } => (0..count)
                .map(|i| Shot {
                    pos: Vec2::new(vp.right(), vp.top() + vp.h * i as f32 / divisions),
                    vel: Vec2::new(-speed, 0.0),
                })
                .collect(),
            SpawnPattern::Sweep { count, divisions, speed } => {
                let dir = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
                let offset = rng.random_range(0..=20) as f32 / 20.0;
                let x = if dir < 0.0 { vp.right() } else { vp.left() };
                (0..count)
                    .map(|i| Shot {
                        pos: Vec2::new(x, vp.top() + vp.h * (i as f32 - offset) / divisions),
                        vel: Vec2::new(speed * dir, 0.0),
                    })
                    .collect()
            }
            SpawnPattern::AimedFan { count, spread, min_speed, max_speed } => {
                let aim = crate::angle_to(ctx.boss, ctx.target);
                (0..count)
                    .map(|_| {
                        let angle = aim + rng.random::<f32>() * spread - spread / 2.0;
                        let speed = rng.random_range(min_speed..=max_speed);
                        Shot {
                            pos: ctx.boss,
                            vel: Vec2::from_angle(angle) * speed,
                        }
                    })
                    .collect()
            }
            SpawnPattern::Ring { count, speed } => {
                let offset = rng.random::<f32>() * TAU;
                ring(ctx.boss, count, speed, offset)
            }
            SpawnPattern::Spiral { count, speed, mirrored } => {
                let offset = ctx.game_time as f32 / 600.0 * TAU;
                let mut shots = ring(ctx.boss, count, speed, offset);
                if mirrored {
                    shots.extend(ring(ctx.boss, count, speed, -offset));
                }
                shots
            }
            SpawnPattern::Rain { speed } => {
                let drift = rng.random_range(0..=20) as f32 / 10.0 - 1.0;
                vec![Shot {
                    pos: Vec2::new(vp.left() + vp.w * rng.random::<f32>(), vp.top()),
                    vel: Vec2::new(drift, speed),
                }]
            }
        }
    }

    pub fn trail(&self) -> TrailStyle {
        match self {
            SpawnPattern::Wall { .. } | SpawnPattern::Sweep { .. } => TrailStyle {
                count: 5,
                speed: 4.0,
                scale: 10.0,
            },
            SpawnPattern::AimedFan { .. } | SpawnPattern::Ring { .. } => TrailStyle {
                count: 3,
                speed: 4.0,
                scale: 10.0,
            },
            SpawnPattern::Spiral { .. } => TrailStyle {
                count: 3,
                speed: 7.0,
                scale: 5.0,
            },
            SpawnPattern::Rain { .. } => TrailStyle {
                count: 5,
                speed: 4.0,
                scale: 6.0,
            },
        }
    }
}

fn ring(origin: Vec2, count: u32, speed: f32, offset: f32) -> Vec<Shot> {
    (0..count)
        .map(|i| {
            let angle = TAU * i as f32 / count as f32 + offset;
            Shot {
                pos: origin,
                vel: Vec2::from_angle(angle) * speed,
            }
        })
        .collect()
}

/// Default aimed fan used by the boss
pub const BOSS_FAN: SpawnPattern = SpawnPattern::AimedFan {
    count: 5,
    spread: FRAC_PI_4,
    min_speed: 3.0,
    max_speed: 4.0,
};

/// Effect of a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Spawn(SpawnPattern),
    /// Boss eye target intensity
    Intensity(f32),
    BossShake { amplitude: f32 },
    BossDefeated,
    /// Place the exit door and mark the level clearable
    OpenExit { door: Vec2 },
    /// Force the player out of probe mode
    ResetProbe,
    Say { text: String, ticks: u32 },
    Sound(SoundCue),
    Hint(TutorialHint),
    /// World time multiplier this frame, with a separate value while probing
    TimeScale { normal: f32, probing: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub trigger: Trigger,
    pub actions: Vec<Action>,
}

impl Rule {
    pub fn at(threshold: f32, actions: Vec<Action>) -> Self {
        Self {
            trigger: Trigger::At(threshold),
            actions,
        }
    }

    pub fn during(start: f32, end: f32, gate: Gate, actions: Vec<Action>) -> Self {
        Self {
            trigger: Trigger::During { start, end, gate },
            actions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScriptStart {
    Immediately,
    /// When the player's x passes this coordinate
    PlayerPastX(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScriptEnd {
    Never,
    /// Stop once the probe has been out this long
    ProbeHeldFor(f32),
}

/// Window with a faster rain rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surge {
    pub start: f32,
    pub end: f32,
    pub rate: u32,
}

/// Ambient projectile drizzle once the script has started
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainSchedule {
    /// Chance denominator per frame
    pub rate: u32,
    /// No rain from this timer value on
    pub until: Option<f32>,
    pub surges: Vec<Surge>,
}

impl RainSchedule {
    pub fn steady(rate: u32) -> Self {
        Self {
            rate,
            until: None,
            surges: Vec::new(),
        }
    }

    pub fn rate_at(&self, t: f32) -> Option<u32> {
        if self.until.is_some_and(|u| t >= u) {
            return None;
        }
        let rate = self
            .surges
            .iter()
            .find(|s| s.start < t && t < s.end)
            .map_or(self.rate, |s| s.rate);
        Some(rate)
    }
}

/// Authored level script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Timer name, for logs
    pub timer: String,
    pub start: ScriptStart,
    pub end: ScriptEnd,
    pub on_start: Vec<Action>,
    pub rules: Vec<Rule>,
    pub rain: Option<RainSchedule>,
    /// Intensity target when no intensity window is open
    pub resting_intensity: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Waiting,
    Running,
    Finished,
}

/// What the timeline can see this frame
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    pub player_x: f32,
    pub probe_elapsed: Option<f32>,
    pub game_time: u64,
}

/// Actions produced by one step
#[derive(Debug, Default)]
pub struct TimelineStep {
    /// Start actions and threshold crossings
    pub crossings: Vec<Action>,
    /// Window actions for this frame
    pub active: Vec<Action>,
}

impl TimelineStep {
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.crossings.iter().chain(self.active.iter())
    }
}

/// Running instance of a script
#[derive(Debug, Clone)]
pub struct Timeline {
    script: Script,
    elapsed: f32,
    phase: TimerPhase,
}

impl Timeline {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            elapsed: 0.0,
            phase: TimerPhase::Waiting,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn has_started(&self) -> bool {
        self.phase != TimerPhase::Waiting
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Advance the timer by `dt` and collect the actions that fire
    pub fn step(&mut self, dt: f32, ctx: &StepContext, rng: &mut impl Rng) -> TimelineStep {
        let mut out = TimelineStep::default();

        if self.phase == TimerPhase::Waiting {
            let go = match self.script.start {
                ScriptStart::Immediately => true,
                ScriptStart::PlayerPastX(x) => ctx.player_x > x,
            };
            if !go {
                return out;
            }
            self.phase = TimerPhase::Running;
            log::debug!("Timeline {} started", self.script.timer);
            out.crossings.extend(self.script.on_start.iter().cloned());
        }

        if self.phase == TimerPhase::Finished {
            return out;
        }
        if let ScriptEnd::ProbeHeldFor(limit) = self.script.end
            && ctx.probe_elapsed.is_some_and(|e| e > limit)
        {
            self.phase = TimerPhase::Finished;
            log::debug!("Timeline {} finished at {:.1}", self.script.timer, self.elapsed);
            return out;
        }

        let previous = self.elapsed;
        self.elapsed += dt;
        let current = self.elapsed;

        let mut intensity_window = false;
        for rule in &self.script.rules {
            match &rule.trigger {
                Trigger::At(t) => {
                    if crossed(previous, current, *t) {
                        log::debug!("Timeline {} crossed {t}", self.script.timer);
                        out.crossings.extend(rule.actions.iter().cloned());
                    }
                }
                Trigger::During { start, end, gate } => {
                    if !(*start < current && current < *end) {
                        continue;
                    }
                    if rule.actions.iter().any(|a| matches!(a, Action::Intensity(_))) {
                        intensity_window = true;
                    }
                    if gate.open(previous, current, ctx.game_time, rng) {
                        out.active.extend(rule.actions.iter().cloned());
                    }
                }
            }
        }

        if !intensity_window && let Some(rest) = self.script.resting_intensity {
            out.active.push(Action::Intensity(rest));
        }
        out
    }

    /// Rain chance denominator for this frame, if it is raining
    pub fn rain_rate(&self) -> Option<u32> {
        if !self.has_started() {
            return None;
        }
        self.script.rain.as_ref()?.rate_at(self.elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn ctx(game_time: u64) -> StepContext {
        StepContext {
            player_x: 0.0,
            probe_elapsed: None,
            game_time,
        }
    }

    fn say(text: &str) -> Action {
        Action::Say {
            text: text.into(),
            ticks: 10,
        }
    }

    fn checkpoint_script() -> Script {
        Script {
            timer: "test".into(),
            start: ScriptStart::Immediately,
            end: ScriptEnd::Never,
            on_start: vec![say("start")],
            rules: vec![
                Rule::at(6.0, vec![say("a")]),
                Rule::at(20.5, vec![Action::ResetProbe]),
                Rule::at(21.0, vec![say("b"), Action::Sound(SoundCue::EndLevel)]),
                Rule::at(100.0, vec![Action::OpenExit { door: Vec2::new(1.0, 2.0) }]),
                Rule::during(10.0, 30.0, Gate::Always, vec![Action::Intensity(30.0)]),
            ],
            rain: None,
            resting_intensity: Some(4.0),
        }
    }

    fn run_crossings(deltas: impl Iterator<Item = f32>, until: f32) -> Vec<Action> {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut timeline = Timeline::new(checkpoint_script());
        let mut fired = Vec::new();
        let mut deltas = deltas.peekable();
        while timeline.elapsed() < until {
            let dt = deltas.next().unwrap_or(1.0);
            fired.extend(timeline.step(dt, &ctx(0), &mut rng).crossings);
        }
        fired
    }

    #[test]
    fn test_crossings_identical_across_deltas() {
        let baseline = run_crossings(std::iter::repeat(1.0), 120.0);
        assert_eq!(baseline.len(), 6);
        for dt in [0.3, 7.0] {
            assert_eq!(run_crossings(std::iter::repeat(dt), 120.0), baseline);
        }
    }

    #[test]
    fn test_exact_hit_fires_once() {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut timeline = Timeline::new(checkpoint_script());
        let mut count = 0;
        for _ in 0..12 {
            let step = timeline.step(0.5, &ctx(0), &mut rng);
            count += step.crossings.iter().filter(|a| **a == say("a")).count();
        }
        // 6.0 is reached exactly on the 12th step
        assert_eq!(timeline.elapsed(), 6.0);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_window_and_resting_intensity() {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut timeline = Timeline::new(checkpoint_script());
        let first = timeline.step(1.0, &ctx(0), &mut rng);
        assert_eq!(first.active, vec![Action::Intensity(4.0)]);
        for _ in 0..10 {
            timeline.step(1.0, &ctx(0), &mut rng);
        }
        let inside = timeline.step(1.0, &ctx(0), &mut rng);
        assert_eq!(inside.active, vec![Action::Intensity(30.0)]);
    }

    #[test]
    fn test_gates() {
        let mut rng = Pcg32::seed_from_u64(3);
        assert!(Gate::EveryTicks(10).open(0.0, 1.0, 20, &mut rng));
        assert!(!Gate::EveryTicks(10).open(0.0, 1.0, 21, &mut rng));
        let wrap = Gate::Periods(vec![350.0, 180.0]);
        assert!(wrap.open(3499.5, 3500.5, 0, &mut rng));
        assert!(wrap.open(3239.0, 3241.0, 0, &mut rng));
        assert!(!wrap.open(3300.0, 3301.0, 0, &mut rng));
        let hits = (0..10_000)
            .filter(|_| Gate::Chance(70).open(0.0, 1.0, 0, &mut rng))
            .count();
        // Expected roughly 1 in 71
        assert!((80..200).contains(&hits));
    }

    #[test]
    fn test_waits_for_player() {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut script = checkpoint_script();
        script.start = ScriptStart::PlayerPastX(446.0);
        script.rain = Some(RainSchedule::steady(25));
        let mut timeline = Timeline::new(script);
        let mut c = ctx(0);
        c.player_x = 400.0;
        assert!(timeline.step(1.0, &c, &mut rng).crossings.is_empty());
        assert_eq!(timeline.rain_rate(), None);
        assert_eq!(timeline.elapsed(), 0.0);
        c.player_x = 447.0;
        let step = timeline.step(1.0, &c, &mut rng);
        assert_eq!(step.crossings, vec![say("start")]);
        assert_eq!(timeline.rain_rate(), Some(25));
    }

    #[test]
    fn test_probe_hold_finishes_script() {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut script = checkpoint_script();
        script.end = ScriptEnd::ProbeHeldFor(20.0);
        let mut timeline = Timeline::new(script);
        let mut c = ctx(0);
        timeline.step(1.0, &c, &mut rng);
        c.probe_elapsed = Some(20.5);
        timeline.step(1.0, &c, &mut rng);
        assert_eq!(timeline.phase(), TimerPhase::Finished);
        let frozen = timeline.elapsed();
        c.probe_elapsed = None;
        let step = timeline.step(50.0, &c, &mut rng);
        assert!(step.crossings.is_empty() && step.active.is_empty());
        assert_eq!(timeline.elapsed(), frozen);
    }

    #[test]
    fn test_rain_schedule() {
        let rain = RainSchedule {
            rate: 25,
            until: Some(6300.0),
            surges: vec![Surge {
                start: 240.0,
                end: 840.0,
                rate: 12,
            }],
        };
        assert_eq!(rain.rate_at(100.0), Some(25));
        assert_eq!(rain.rate_at(500.0), Some(12));
        assert_eq!(rain.rate_at(6300.0), None);
    }

    #[test]
    fn test_volley_shapes() {
        let mut rng = Pcg32::seed_from_u64(11);
        let vctx = VolleyContext {
            viewport: Rect::new(100.0, 0.0, VIEW_WIDTH, VIEW_HEIGHT),
            boss: Vec2::new(386.0, 220.0),
            target: Vec2::new(386.0, 320.0),
            game_time: 150,
        };
        let wall = SpawnPattern::Wall { count: 17, divisions: 15.0, speed: 4.0 }.volley(&vctx, &mut rng);
        assert_eq!(wall.len(), 17);
        assert!(wall.iter().all(|s| s.pos.x == 400.0 && s.vel == Vec2::new(-4.0, 0.0)));

        let ring = SpawnPattern::Ring { count: 36, speed: 3.5 }.volley(&vctx, &mut rng);
        assert_eq!(ring.len(), 36);
        assert!(ring.iter().all(|s| (s.vel.length() - 3.5).abs() < 1e-4));

        let spiral = SpawnPattern::Spiral { count: 6, speed: 3.5, mirrored: true }.volley(&vctx, &mut rng);
        assert_eq!(spiral.len(), 12);

        let fan = BOSS_FAN.volley(&vctx, &mut rng);
        assert_eq!(fan.len(), 5);
        // Aimed downward at the target, within +/- 22.5 degrees
        assert!(fan.iter().all(|s| s.vel.y > 0.0 && s.vel.x.abs() < s.vel.y));

        let rain = SpawnPattern::Rain { speed: 4.0 }.volley(&vctx, &mut rng);
        assert_eq!(rain[0].pos.y, 0.0);
        assert!((100.0..=400.0).contains(&rain[0].pos.x));
        assert!(rain[0].vel.x.abs() <= 1.0);
    }

    proptest! {
        #[test]
        fn prop_crossings_independent_of_frame_rate(
            deltas in prop::collection::vec(0.05f32..9.0, 1..400),
        ) {
            let baseline = run_crossings(std::iter::repeat(1.0), 120.0);
            let varied = run_crossings(deltas.into_iter(), 120.0);
            prop_assert_eq!(varied, baseline);
        }
    }
}
