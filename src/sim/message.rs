//! Player speech bubble, positional hints and tutorial prompts

use serde::{Deserialize, Serialize};

/// Ticks between revealed characters
const REVEAL_INTERVAL: u32 = 3;

/// One message at a time, revealed typewriter style
#[derive(Debug, Clone, Default)]
pub struct SpeechBubble {
    ticks: u32,
    text: String,
    revealed: usize,
    scale: f32,
}

impl SpeechBubble {
    /// Replace the current message
    pub fn say(&mut self, text: impl Into<String>, ticks: u32) {
        self.text = text.into();
        self.ticks = ticks;
        self.revealed = 0;
    }

    /// No message counting down
    pub fn is_idle(&self) -> bool {
        self.ticks == 0
    }

    /// Fully shrunk away
    pub fn is_hidden(&self) -> bool {
        self.scale < 0.05
    }

    /// Advance one frame. While `frozen` (dying) the countdown holds.
    ///
    /// Returns true when a new character was revealed.
    pub fn tick(&mut self, frozen: bool) -> bool {
        let mut revealed_char = false;
        if self.ticks > 0 && !frozen {
            self.ticks -= 1;
            let total = self.text.chars().count();
            if self.ticks % REVEAL_INTERVAL == 0 && self.revealed < total {
                self.revealed += 1;
                revealed_char = true;
            }
            self.scale += (1.0 - self.scale) / 5.0;
        } else if self.ticks == 0 {
            self.scale += (0.0 - self.scale) / 5.0;
            self.revealed = self.revealed.saturating_sub(1);
        }
        revealed_char
    }

    /// The part of the message typed so far
    pub fn revealed(&self) -> &str {
        match self.text.char_indices().nth(self.revealed) {
            Some((end, _)) => &self.text[..end],
            None => &self.text,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }
}

/// When a positional hint becomes eligible
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HintTrigger {
    /// Player x passes this coordinate
    PlayerPastX(f32),
    /// Level has run for more than this many ticks
    LevelTimeAfter(u64),
}

/// One-shot hint message authored per level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintRule {
    pub trigger: HintTrigger,
    /// Index of a hint that must have fired first
    pub after: Option<usize>,
    /// Only while the player holds a firewall charge
    pub needs_resource: bool,
    /// Wait until the bubble is idle and shrunk away
    pub wait_quiet: bool,
    pub text: String,
    pub ticks: u32,
}

/// What the hint tracker can see this frame
#[derive(Debug, Clone, Copy)]
pub struct HintContext {
    pub player_x: f32,
    pub level_time: u64,
    pub resources: u32,
    pub bubble_quiet: bool,
}

/// Which hints have fired
#[derive(Debug, Clone, Default)]
pub struct HintTracker {
    fired: Vec<bool>,
}

impl HintTracker {
    pub fn new(count: usize) -> Self {
        Self {
            fired: vec![false; count],
        }
    }

    /// Index of the first rule that fires this frame, marking it fired
    pub fn poll(&mut self, rules: &[HintRule], ctx: &HintContext) -> Option<usize> {
        for (i, rule) in rules.iter().enumerate() {
            if self.fired.get(i).copied().unwrap_or(true) {
                continue;
            }
            let triggered = match rule.trigger {
                HintTrigger::PlayerPastX(x) => ctx.player_x > x,
                HintTrigger::LevelTimeAfter(t) => ctx.level_time > t,
            };
            let prior = rule
                .after
                .is_none_or(|p| self.fired.get(p).copied().unwrap_or(false));
            let resource_ok = !rule.needs_resource || ctx.resources > 0;
            let quiet_ok = !rule.wait_quiet || ctx.bubble_quiet;
            if triggered && prior && resource_ok && quiet_ok {
                self.fired[i] = true;
                return Some(i);
            }
        }
        None
    }

    pub fn has_fired(&self, index: usize) -> bool {
        self.fired.get(index).copied().unwrap_or(false)
    }
}

/// On-screen tutorial prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TutorialHint {
    /// Arrow keys to move
    Navigate,
    /// Down arrow to deploy the probe
    DeployProbe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptState {
    #[default]
    Hidden,
    Showing,
    Dismissed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Tutorial {
    pub navigate: PromptState,
    pub deploy_probe: PromptState,
}

impl Tutorial {
    pub fn show(&mut self, hint: TutorialHint) {
        let slot = self.slot(hint);
        if *slot == PromptState::Hidden {
            *slot = PromptState::Showing;
        }
    }

    pub fn dismiss(&mut self, hint: TutorialHint) {
        let slot = self.slot(hint);
        if *slot == PromptState::Showing {
            *slot = PromptState::Dismissed;
        }
    }

    pub fn showing(&self) -> Vec<TutorialHint> {
        let mut out = Vec::new();
        if self.navigate == PromptState::Showing {
            out.push(TutorialHint::Navigate);
        }
        if self.deploy_probe == PromptState::Showing {
            out.push(TutorialHint::DeployProbe);
        }
        out
    }

    fn slot(&mut self, hint: TutorialHint) -> &mut PromptState {
        match hint {
            TutorialHint::Navigate => &mut self.navigate,
            TutorialHint::DeployProbe => &mut self.deploy_probe,
        }
    }
}
