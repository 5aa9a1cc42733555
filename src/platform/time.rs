//! Frame timing
//!
//! Converts wall-clock timestamps into the frame delta multiplier the
//! simulation runs on (1.0 = one nominal 60 Hz tick).

use crate::consts::{MAX_FRAME_DELTA, TICKS_PER_SECOND};

/// Milliseconds since an arbitrary epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64() * 1000.0)
}

const FPS_SMOOTHING: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<f64>,
    max_delta: f32,
    /// Smoothed frames per second
    fps: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(MAX_FRAME_DELTA)
    }
}

impl FrameClock {
    pub fn new(max_delta: f32) -> Self {
        Self {
            last: None,
            max_delta: max_delta.max(1.0),
            fps: TICKS_PER_SECOND,
        }
    }

    pub fn set_max_delta(&mut self, max_delta: f32) {
        self.max_delta = max_delta.max(1.0);
    }

    /// Delta multiplier since the previous call; the first frame counts as 1
    pub fn tick(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last {
            Some(last) => ((now_ms - last) * TICKS_PER_SECOND as f64 / 1000.0) as f32,
            None => 1.0,
        };
        if dt > 0.0 {
            self.fps += (TICKS_PER_SECOND / dt - self.fps) * FPS_SMOOTHING;
        }
        self.last = Some(now_ms);
        dt.clamp(0.0, self.max_delta)
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Forget the previous timestamp (after a pause)
    pub fn reset(&mut self) {
        self.last = None;
    }
}
