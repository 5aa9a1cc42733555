//! Bounded packet queue (FIFO) and firewall rule stack (LIFO)
//!
//! Both containers refuse work at capacity instead of growing or failing the
//! frame: `enqueue`/`push` return false, `dequeue`/`pop` on empty return None.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Transient feedback text with a countdown
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feedback {
    text: String,
    ticks: f32,
}

impl Feedback {
    pub fn set(&mut self, text: impl Into<String>, ticks: f32) {
        self.text = text.into();
        self.ticks = ticks;
    }

    pub fn tick(&mut self, dt: f32) {
        if self.ticks > 0.0 {
            self.ticks = (self.ticks - dt).max(0.0);
        }
    }

    pub fn is_visible(&self) -> bool {
        self.ticks > 0.0
    }

    /// Current text while the countdown runs
    pub fn text(&self) -> Option<&str> {
        self.is_visible().then_some(self.text.as_str())
    }
}

/// Packet travelling through the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub id: u16,
    pub is_threat: bool,
}

impl Packet {
    pub fn label(&self) -> &'static str {
        if self.is_threat { "MALWARE" } else { "NORMAL" }
    }
}

/// Bounded FIFO of packets with processing counters
#[derive(Debug, Clone)]
pub struct PacketQueue {
    items: VecDeque<Packet>,
    max_size: usize,
    processed: u32,
    threats_blocked: u32,
}

impl PacketQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(max_size),
            max_size,
            processed: 0,
            threats_blocked: 0,
        }
    }

    /// Append at the tail; false when full
    pub fn enqueue(&mut self, packet: Packet) -> bool {
        if self.is_full() {
            return false;
        }
        self.items.push_back(packet);
        true
    }

    pub fn dequeue(&mut self) -> Option<Packet> {
        self.items.pop_front()
    }

    pub fn peek(&self) -> Option<&Packet> {
        self.items.front()
    }

    /// Judge the head packet.
    ///
    /// The packet is removed whether or not the verdict was right. Returns
    /// true only for a correct verdict; an empty queue counts as wrong.
    pub fn process(&mut self, flagged_as_threat: bool) -> bool {
        let Some(packet) = self.dequeue() else {
            return false;
        };
        self.processed += 1;
        if packet.is_threat != flagged_as_threat {
            return false;
        }
        if packet.is_threat {
            self.threats_blocked += 1;
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.max_size
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn processed(&self) -> u32 {
        self.processed
    }

    pub fn threats_blocked(&self) -> u32 {
        self.threats_blocked
    }

    /// Head first
    pub fn iter(&self) -> impl Iterator<Item = &Packet> {
        self.items.iter()
    }
}

/// Fixed vocabulary of firewall rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FirewallRule {
    BlockIp,
    AllowTcp,
    DenyUdp,
    Filter,
    Inspect,
}

impl FirewallRule {
    pub const ALL: [FirewallRule; 5] = [
        FirewallRule::BlockIp,
        FirewallRule::AllowTcp,
        FirewallRule::DenyUdp,
        FirewallRule::Filter,
        FirewallRule::Inspect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FirewallRule::BlockIp => "BLOCK_IP",
            FirewallRule::AllowTcp => "ALLOW_TCP",
            FirewallRule::DenyUdp => "DENY_UDP",
            FirewallRule::Filter => "FILTER",
            FirewallRule::Inspect => "INSPECT",
        }
    }

    /// Rule bound to number key `slot` (1-5)
    pub fn from_slot(slot: u8) -> Option<Self> {
        let index = usize::from(slot).checked_sub(1)?;
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for FirewallRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded LIFO of firewall rules with user feedback
#[derive(Debug, Clone)]
pub struct RuleStack {
    items: Vec<FirewallRule>,
    max_size: usize,
    feedback: Feedback,
}

impl Default for RuleStack {
    fn default() -> Self {
        Self::new(RULE_STACK_SIZE)
    }
}

impl RuleStack {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: Vec::with_capacity(max_size),
            max_size,
            feedback: Feedback::default(),
        }
    }

    pub fn push(&mut self, rule: FirewallRule) -> bool {
        if self.is_full() {
            self.feedback.set("Stack lleno!", RULE_FEEDBACK_TICKS);
            return false;
        }
        self.items.push(rule);
        self.feedback
            .set(format!("Regla {rule} agregada al Stack"), RULE_FEEDBACK_TICKS);
        true
    }

    pub fn pop(&mut self) -> Option<FirewallRule> {
        match self.items.pop() {
            Some(rule) => {
                self.feedback
                    .set(format!("UNDO: Regla {rule} removida"), RULE_FEEDBACK_TICKS);
                Some(rule)
            }
            None => {
                self.feedback
                    .set("Stack vacio - sin reglas para deshacer", RULE_FEEDBACK_TICKS);
                None
            }
        }
    }

    pub fn peek(&self) -> Option<FirewallRule> {
        self.items.last().copied()
    }

    pub fn tick(&mut self, dt: f32) {
        self.feedback.tick(dt);
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.text()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.max_size
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Top of the stack first
    pub fn iter_top_down(&self) -> impl Iterator<Item = &FirewallRule> {
        self.items.iter().rev()
    }
}
