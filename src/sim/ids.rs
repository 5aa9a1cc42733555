//! Network console monitors: intrusion detection and a traffic ticker
//!
//! Both run for the whole session and only feed the HUD.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use crate::Palette;
use crate::consts::VIEW_WIDTH;

const MAX_THREAT_LEVEL: f32 = 100.0;
const THREAT_DECAY: f32 = 0.1;
const THREAT_TICKS: f32 = 180.0;
const MAX_ALERTS: usize = 5;
const ALERT_TICKS: f32 = 120.0;

/// Ticker alert line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub text: String,
    pub ticks: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveThreat {
    pub label: String,
    pub severity: f32,
    pub ticks: f32,
}

#[derive(Debug, Clone, Default)]
pub struct IntrusionDetection {
    threat_level: f32,
    threats: Vec<ActiveThreat>,
    alerts: VecDeque<Alert>,
}

impl IntrusionDetection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the threat level and post an alert
    pub fn add_threat(&mut self, label: &str, severity: f32) {
        self.threat_level = (self.threat_level + severity).min(MAX_THREAT_LEVEL);
        self.threats.push(ActiveThreat {
            label: label.to_string(),
            severity,
            ticks: THREAT_TICKS,
        });
        self.alerts.push_back(Alert {
            text: format!("IDS: {label} detectado!"),
            ticks: ALERT_TICKS,
        });
        while self.alerts.len() > MAX_ALERTS {
            self.alerts.pop_front();
        }
        log::debug!("IDS threat {label} (+{severity:.0}), level {:.0}", self.threat_level);
    }

    pub fn update(&mut self, dt: f32) {
        self.threat_level = (self.threat_level - THREAT_DECAY * dt).max(0.0);
        for t in &mut self.threats {
            t.ticks -= dt;
        }
        self.threats.retain(|t| t.ticks > 0.0);
        for a in &mut self.alerts {
            a.ticks -= dt;
        }
        self.alerts.retain(|a| a.ticks > 0.0);
    }

    pub fn threat_level(&self) -> f32 {
        self.threat_level
    }

    pub fn band(&self) -> Palette {
        if self.threat_level > 70.0 {
            Palette::Danger
        } else if self.threat_level > 30.0 {
            Palette::Warning
        } else {
            Palette::Safe
        }
    }

    pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    pub fn active_threats(&self) -> &[ActiveThreat] {
        &self.threats
    }
}

/// Packet drifting across the traffic ticker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficPacket {
    pub pos: Vec2,
    pub speed: f32,
    pub malicious: bool,
    pub size: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TrafficStats {
    pub total: u32,
    pub malicious: u32,
    pub bandwidth: f32,
}

#[derive(Debug, Clone, Default)]
pub struct TrafficMonitor {
    packets: Vec<TrafficPacket>,
    stats: TrafficStats,
}

impl TrafficMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_packet(&mut self, malicious: bool, rng: &mut impl Rng) {
        self.packets.push(TrafficPacket {
            pos: Vec2::new(0.0, rng.random_range(50.0..=150.0)),
            speed: rng.random_range(1.0..=3.0),
            malicious,
            size: rng.random_range(3..=8),
        });
        self.stats.total += 1;
        if malicious {
            self.stats.malicious += 1;
        }
        self.stats.bandwidth = (self.packets.len() as f32 * 10.0).min(100.0);
    }

    pub fn update(&mut self, dt: f32) {
        for p in &mut self.packets {
            p.pos.x += p.speed * dt;
        }
        self.packets.retain(|p| p.pos.x <= VIEW_WIDTH);
        self.stats.bandwidth = (self.stats.bandwidth - 0.5 * dt).max(0.0);
    }

    pub fn packets(&self) -> &[TrafficPacket] {
        &self.packets
    }

    pub fn stats(&self) -> TrafficStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_threat_level_caps_and_decays() {
        let mut ids = IntrusionDetection::new();
        ids.add_threat("Malware", 80.0);
        ids.add_threat("Malware", 80.0);
        assert_eq!(ids.threat_level(), 100.0);
        assert_eq!(ids.band(), Palette::Danger);
        ids.update(100.0);
        assert!((ids.threat_level() - 90.0).abs() < 1e-4);
        ids.update(1000.0);
        assert_eq!(ids.threat_level(), 0.0);
        assert_eq!(ids.band(), Palette::Safe);
        assert!(ids.active_threats().is_empty());
    }

    #[test]
    fn test_alerts_bounded_and_expire() {
        let mut ids = IntrusionDetection::new();
        for i in 0..8 {
            ids.add_threat(&format!("T{i}"), 1.0);
        }
        let texts: Vec<&str> = ids.alerts().map(|a| a.text.as_str()).collect();
        assert_eq!(texts.len(), 5);
        assert_eq!(texts[0], "IDS: T3 detectado!");
        ids.update(120.0);
        assert_eq!(ids.alerts().count(), 0);
    }

    #[test]
    fn test_traffic_moves_and_leaves() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut traffic = TrafficMonitor::new();
        traffic.add_packet(true, &mut rng);
        traffic.add_packet(false, &mut rng);
        assert_eq!(traffic.stats().bandwidth, 20.0);
        assert_eq!(traffic.stats().malicious, 1);
        traffic.update(1.0);
        assert!(traffic.packets().iter().all(|p| p.pos.x > 0.0));
        for _ in 0..400 {
            traffic.update(1.0);
        }
        assert!(traffic.packets().is_empty());
        assert_eq!(traffic.stats().bandwidth, 0.0);
        assert_eq!(traffic.stats().total, 2);
    }
}
