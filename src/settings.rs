//! Game settings and preferences
//!
//! Persisted separately from the session history.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_FRAME_DELTA;
use crate::platform::storage::KeyValueStore;

/// Largest accepted `max_frame_delta`
const FRAME_DELTA_CEILING: f32 = 10.0;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Multiplier on decorative particle burst sizes
    pub fn burst_scale(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.25,
            QualityPreset::Medium => 0.6,
            QualityPreset::High => 1.0,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Particle and spark effects
    pub particles: bool,
    /// Add the frame rate to the render view
    pub show_fps: bool,

    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,

    /// Clamp for the wall-clock frame delta multiplier
    pub max_frame_delta: f32,
    /// Fixed RNG seed; a fresh one per session when unset
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            show_fps: false,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.5,
            muted: false,
            max_frame_delta: MAX_FRAME_DELTA,
            seed: None,
        }
    }
}

impl Settings {
    const STORAGE_KEY: &'static str = "netguardian_settings";

    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Factor applied to decorative burst sizes; 0 with particles off
    pub fn effect_scale(&self) -> f32 {
        if self.particles {
            self.quality.burst_scale()
        } else {
            0.0
        }
    }

    /// Clamp volumes and the delta limit into their valid ranges
    pub fn sanitized(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        if !self.max_frame_delta.is_finite() || self.max_frame_delta < 1.0 {
            self.max_frame_delta = MAX_FRAME_DELTA;
        }
        self.max_frame_delta = self.max_frame_delta.min(FRAME_DELTA_CEILING);
        self
    }

    pub fn load(store: &dyn KeyValueStore) -> Self {
        let Some(json) = store.get(Self::STORAGE_KEY) else {
            log::info!("Using default settings");
            return Self::default();
        };
        match serde_json::from_str::<Settings>(&json) {
            Ok(settings) => {
                log::info!("Loaded settings");
                settings.sanitized()
            }
            Err(e) => {
                log::warn!("Ignoring malformed settings: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> bool {
        match serde_json::to_string(self) {
            Ok(json) => store.set(Self::STORAGE_KEY, &json),
            Err(e) => {
                log::warn!("Could not serialize settings: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::storage::MemoryStore;

    #[test]
    fn test_effect_scale_follows_quality() {
        assert_eq!(Settings::from_preset(QualityPreset::Low).effect_scale(), 0.25);
        assert_eq!(Settings::from_preset(QualityPreset::High).effect_scale(), 1.0);

        let off = Settings {
            particles: false,
            ..Settings::default()
        };
        assert_eq!(off.effect_scale(), 0.0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let store = MemoryStore::new();
        store.set("netguardian_settings", r#"{"quality":"High","master_volume":4.0}"#);
        let settings = Settings::load(&store);
        assert_eq!(settings.quality, QualityPreset::High);
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.max_frame_delta, MAX_FRAME_DELTA);
    }

    #[test]
    fn test_frame_delta_limit_is_bounded() {
        let wild = Settings {
            max_frame_delta: 500.0,
            ..Settings::default()
        };
        assert_eq!(wild.sanitized().max_frame_delta, FRAME_DELTA_CEILING);

        let broken = Settings {
            max_frame_delta: f32::NAN,
            ..Settings::default()
        };
        assert_eq!(broken.sanitized().max_frame_delta, MAX_FRAME_DELTA);
    }

    #[test]
    fn test_round_trip_and_malformed() {
        let store = MemoryStore::new();
        let settings = Settings {
            seed: Some(42),
            muted: true,
            ..Settings::default()
        };
        assert!(settings.save(&store));
        assert_eq!(Settings::load(&store), settings);

        store.set("netguardian_settings", "[1, 2");
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!(QualityPreset::parse("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse("ultra"), None);
    }
}
