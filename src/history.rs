//! Session history log
//!
//! One record per play session, appended when the session ends and
//! persisted through the platform key/value store.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::levels::LevelId;
use crate::platform::storage::KeyValueStore;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub player_name: String,
    /// Local end time, `YYYY-MM-DD HH:MM:SS`
    pub date: String,
    pub duration_seconds: u64,
    pub duration_formatted: String,
    pub threats_neutralized: u32,
    pub firewalls_collected: u32,
    pub breaches: u32,
    pub final_level: LevelId,
    /// In completion order, no duplicates
    pub levels_completed: Vec<LevelId>,
}

/// Counters for the session in progress
#[derive(Debug, Clone)]
struct ActiveSession {
    player_name: String,
    started: DateTime<Local>,
    threats_neutralized: u32,
    firewalls_collected: u32,
    breaches: u32,
    levels_completed: Vec<LevelId>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    pub records: Vec<SessionRecord>,
    current: Option<ActiveSession>,
}

impl SessionHistory {
    const STORAGE_KEY: &'static str = "game_history";

    pub fn new() -> Self {
        Self::default()
    }

    /// Load stored records; missing or malformed data yields an empty history
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let Some(json) = store.get(Self::STORAGE_KEY) else {
            log::info!("No session history found, starting fresh");
            return Self::new();
        };
        match serde_json::from_str::<Vec<SessionRecord>>(&json) {
            Ok(records) => {
                log::info!("Loaded {} session records", records.len());
                Self {
                    records,
                    current: None,
                }
            }
            Err(e) => {
                log::warn!("Ignoring malformed session history: {e}");
                Self::new()
            }
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> bool {
        match serde_json::to_string_pretty(&self.records) {
            Ok(json) => {
                let saved = store.set(Self::STORAGE_KEY, &json);
                if saved {
                    log::info!("Session history saved ({} records)", self.records.len());
                }
                saved
            }
            Err(e) => {
                log::warn!("Could not serialize session history: {e}");
                false
            }
        }
    }

    pub fn start_session(&mut self, player_name: &str) {
        self.start_session_at(player_name, Local::now());
    }

    pub fn start_session_at(&mut self, player_name: &str, now: DateTime<Local>) {
        log::info!("Session started for {player_name}");
        self.current = Some(ActiveSession {
            player_name: player_name.to_string(),
            started: now,
            threats_neutralized: 0,
            firewalls_collected: 0,
            breaches: 0,
            levels_completed: Vec::new(),
        });
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn add_threats_neutralized(&mut self, count: u32) {
        if let Some(s) = &mut self.current {
            s.threats_neutralized += count;
        }
    }

    pub fn add_firewall_collected(&mut self) {
        if let Some(s) = &mut self.current {
            s.firewalls_collected += 1;
        }
    }

    pub fn add_breach(&mut self) {
        if let Some(s) = &mut self.current {
            s.breaches += 1;
        }
    }

    pub fn add_level_completed(&mut self, level: LevelId) {
        if let Some(s) = &mut self.current
            && !s.levels_completed.contains(&level)
        {
            s.levels_completed.push(level);
        }
    }

    /// Close the running session and append its record
    pub fn end_session(&mut self, final_level: LevelId) -> Option<&SessionRecord> {
        self.end_session_at(final_level, Local::now())
    }

    pub fn end_session_at(&mut self, final_level: LevelId, now: DateTime<Local>) -> Option<&SessionRecord> {
        let session = self.current.take()?;
        let duration_seconds = (now - session.started).num_seconds().max(0) as u64;
        let record = SessionRecord {
            player_name: session.player_name,
            date: now.format(DATE_FORMAT).to_string(),
            duration_seconds,
            duration_formatted: format_duration(duration_seconds),
            threats_neutralized: session.threats_neutralized,
            firewalls_collected: session.firewalls_collected,
            breaches: session.breaches,
            final_level,
            levels_completed: session.levels_completed,
        };
        log::info!(
            "Session ended for {} after {} in {final_level}",
            record.player_name,
            record.duration_formatted
        );
        self.records.push(record);
        self.records.last()
    }

    /// Most recent first
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &SessionRecord> {
        self.records.iter().rev().take(count)
    }
}

/// `1h 2m 3s`, `2m 3s` or `3s`
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = seconds % 3600 / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::storage::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, h, m, s).unwrap()
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(3), "3s");
        assert_eq!(format_duration(123), "2m 3s");
        assert_eq!(format_duration(3723), "1h 2m 3s");
        assert_eq!(format_duration(3600), "1h 0m 0s");
    }

    #[test]
    fn test_session_record() {
        let mut history = SessionHistory::new();
        let start = at(10, 0, 0);
        history.start_session_at("ADA", start);
        history.add_threats_neutralized(3);
        history.add_firewall_collected();
        history.add_breach();
        history.add_breach();
        history.add_level_completed(LevelId::Sector1);
        history.add_level_completed(LevelId::Sector1);
        history.add_level_completed(LevelId::Sector2);

        let record = history
            .end_session_at(LevelId::Sector3, start + Duration::seconds(125))
            .unwrap()
            .clone();
        assert_eq!(record.player_name, "ADA");
        assert_eq!(record.date, "2024-03-09 10:02:05");
        assert_eq!(record.duration_seconds, 125);
        assert_eq!(record.duration_formatted, "2m 5s");
        assert_eq!(record.threats_neutralized, 3);
        assert_eq!(record.firewalls_collected, 1);
        assert_eq!(record.breaches, 2);
        assert_eq!(record.levels_completed, vec![LevelId::Sector1, LevelId::Sector2]);
        assert!(!history.is_active());
        assert!(history.end_session(LevelId::Sector3).is_none());
    }

    #[test]
    fn test_counters_ignored_without_session() {
        let mut history = SessionHistory::new();
        history.add_breach();
        history.add_level_completed(LevelId::Sector2);
        assert!(history.records.is_empty());
        assert!(!history.is_active());
    }

    #[test]
    fn test_persist_and_reload() {
        let store = MemoryStore::new();
        let mut history = SessionHistory::new();
        history.start_session_at("BOB", at(9, 0, 0));
        history.end_session_at(LevelId::Sector4, at(9, 0, 42));
        assert!(history.save(&store));

        let loaded = SessionHistory::load(&store);
        assert_eq!(loaded.records, history.records);
        let json = store.get("game_history").unwrap();
        assert!(json.contains("\"final_level\": \"level_4\""));
    }

    #[test]
    fn test_malformed_history_loads_empty() {
        let store = MemoryStore::new();
        store.set("game_history", "{ not a list");
        assert!(SessionHistory::load(&store).records.is_empty());
    }
}
