//! Sound cue dispatch
//!
//! The simulation only names cues. `AudioManager` applies volumes and mute
//! and hands them to a backend; a missing device degrades to silence.

use serde::{Deserialize, Serialize};

/// Sound effect cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    Jump,
    Death,
    Door,
    /// Firewall pickup chime
    ResourceChime,
    /// Firewall pickup sparkle, also confirms correct verdicts
    ResourceSparkle,
    /// Typewriter tick while a message is revealed
    Thought,
    EnterProbe,
    ExitProbe,
    Shoot,
    ShootLarge,
    EndLevel,
    Shake,
}

impl SoundCue {
    /// Asset name of the cue
    pub fn name(&self) -> &'static str {
        match self {
            SoundCue::Jump => "jump",
            SoundCue::Death => "death",
            SoundCue::Door => "door",
            SoundCue::ResourceChime => "mana_1",
            SoundCue::ResourceSparkle => "mana_2",
            SoundCue::Thought => "thought",
            SoundCue::EnterProbe => "enter_soul",
            SoundCue::ExitProbe => "exit_soul",
            SoundCue::Shoot => "eye_shoot",
            SoundCue::ShootLarge => "eye_shoot_large",
            SoundCue::EndLevel => "end_level",
            SoundCue::Shake => "shake",
        }
    }

    /// Per-cue mix level
    pub fn base_volume(&self) -> f32 {
        match self {
            SoundCue::Shoot => 0.7,
            SoundCue::Jump => 0.3,
            _ => 1.0,
        }
    }
}

/// Background music tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MusicTrack {
    Main,
    Boss,
}

impl MusicTrack {
    pub fn name(&self) -> &'static str {
        match self {
            MusicTrack::Main => "music_1",
            MusicTrack::Boss => "music_2",
        }
    }
}

/// Music requests from the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MusicCue {
    Play(MusicTrack),
    FadeOut { millis: u32 },
}

/// Output device
pub trait AudioBackend {
    /// Play a one-shot cue at `volume` (0-1, already mixed)
    fn play(&mut self, cue: SoundCue, volume: f32);
    /// Start a looping track at `volume`
    fn play_music(&mut self, track: MusicTrack, volume: f32);
    fn fade_out_music(&mut self, millis: u32);
}

/// Backend used when no audio device is available
#[derive(Debug, Default)]
pub struct SilentBackend;

impl AudioBackend for SilentBackend {
    fn play(&mut self, cue: SoundCue, volume: f32) {
        log::trace!("sound {} at {volume:.2}", cue.name());
    }

    fn play_music(&mut self, track: MusicTrack, volume: f32) {
        log::trace!("music {} at {volume:.2}", track.name());
    }

    fn fade_out_music(&mut self, millis: u32) {
        log::trace!("music fade out over {millis}ms");
    }
}

/// Audio manager for the game
pub struct AudioManager {
    backend: Box<dyn AudioBackend>,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::silent()
    }
}

impl AudioManager {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.5,
            muted: false,
        }
    }

    pub fn silent() -> Self {
        Self::new(Box::new(SilentBackend))
    }

    /// Best backend for the current platform
    pub fn for_platform() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            Self::new(Box::new(web::WebAudioBackend::new()))
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            Self::silent()
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    fn effective_volume(&self, channel: f32) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * channel
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, cue: SoundCue) {
        let vol = self.effective_volume(self.sfx_volume) * cue.base_volume();
        if vol <= 0.0 {
            return;
        }
        self.backend.play(cue, vol);
    }

    pub fn music(&mut self, cue: MusicCue) {
        match cue {
            MusicCue::Play(track) => {
                let vol = self.effective_volume(self.music_volume);
                self.backend.play_music(track, vol);
            }
            MusicCue::FadeOut { millis } => self.backend.fade_out_music(millis),
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    //! Procedural cues through the Web Audio API

    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioBackend, MusicTrack, SoundCue};

    pub struct WebAudioBackend {
        ctx: Option<AudioContext>,
    }

    impl WebAudioBackend {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx }
        }

        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Single enveloped tone sweeping from `from` to `to` Hz
        fn tone(&self, ctx: &AudioContext, from: f32, to: f32, osc_type: OscillatorType, vol: f32, secs: f64) {
            let Some((osc, gain)) = self.create_osc(ctx, from, osc_type) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + secs)
                .ok();
            osc.frequency().set_value_at_time(from, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(to, t + secs)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + secs + 0.05).ok();
        }
    }

    impl AudioBackend for WebAudioBackend {
        fn play(&mut self, cue: SoundCue, vol: f32) {
            let Some(ctx) = self.ctx.clone() else { return };

            // Browsers keep the context suspended until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match cue {
                SoundCue::Jump => self.tone(&ctx, 300.0, 600.0, OscillatorType::Square, vol * 0.3, 0.12),
                SoundCue::Death => self.tone(&ctx, 400.0, 40.0, OscillatorType::Sawtooth, vol * 0.5, 0.6),
                SoundCue::Door => self.tone(&ctx, 200.0, 800.0, OscillatorType::Triangle, vol * 0.5, 0.5),
                SoundCue::ResourceChime => self.tone(&ctx, 880.0, 1760.0, OscillatorType::Sine, vol * 0.4, 0.2),
                SoundCue::ResourceSparkle => self.tone(&ctx, 1320.0, 2640.0, OscillatorType::Sine, vol * 0.25, 0.15),
                SoundCue::Thought => self.tone(&ctx, 660.0, 640.0, OscillatorType::Square, vol * 0.05, 0.03),
                SoundCue::EnterProbe => self.tone(&ctx, 220.0, 880.0, OscillatorType::Sine, vol * 0.4, 0.4),
                SoundCue::ExitProbe => self.tone(&ctx, 880.0, 220.0, OscillatorType::Sine, vol * 0.4, 0.4),
                SoundCue::Shoot => self.tone(&ctx, 500.0, 150.0, OscillatorType::Square, vol * 0.2, 0.1),
                SoundCue::ShootLarge => self.tone(&ctx, 300.0, 60.0, OscillatorType::Sawtooth, vol * 0.4, 0.35),
                SoundCue::EndLevel => self.tone(&ctx, 440.0, 1760.0, OscillatorType::Triangle, vol * 0.5, 1.0),
                SoundCue::Shake => self.tone(&ctx, 60.0, 30.0, OscillatorType::Sawtooth, vol * 0.6, 1.5),
            }
        }

        fn play_music(&mut self, track: MusicTrack, _volume: f32) {
            // Streamed tracks are loaded by the page, not synthesised here
            log::info!("Music track requested: {}", track.name());
        }

        fn fade_out_music(&mut self, millis: u32) {
            log::debug!("Music fade out over {millis}ms");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        played: Rc<RefCell<Vec<(SoundCue, f32)>>>,
    }

    impl AudioBackend for Recorder {
        fn play(&mut self, cue: SoundCue, volume: f32) {
            self.played.borrow_mut().push((cue, volume));
        }
        fn play_music(&mut self, _track: MusicTrack, _volume: f32) {}
        fn fade_out_music(&mut self, _millis: u32) {}
    }

    #[test]
    fn test_volume_mixing_and_mute() {
        let played = Rc::new(RefCell::new(Vec::new()));
        let mut audio = AudioManager::new(Box::new(Recorder {
            played: Rc::clone(&played),
        }));
        audio.set_master_volume(0.5);
        audio.play(SoundCue::Jump);
        audio.set_muted(true);
        audio.play(SoundCue::Death);
        audio.set_muted(false);
        audio.set_sfx_volume(0.0);
        audio.play(SoundCue::Door);

        let played = played.borrow();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0].0, SoundCue::Jump);
        assert!((played[0].1 - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_volume_clamped() {
        let mut audio = AudioManager::silent();
        audio.set_master_volume(3.0);
        assert_eq!(audio.master_volume(), 1.0);
        audio.set_master_volume(-1.0);
        assert_eq!(audio.master_volume(), 0.0);
    }

    #[test]
    fn test_cue_names() {
        assert_eq!(SoundCue::ResourceChime.name(), "mana_1");
        assert_eq!(SoundCue::EnterProbe.name(), "enter_soul");
        assert_eq!(MusicTrack::Boss.name(), "music_2");
    }
}
