//! How a roll gets triggered and how the die tumbles on screen.
//!
//! Motion permission decides between shake and tap; the detector turns raw
//! accelerometer samples into at most one roll per cooldown window. The
//! tumble is pure timing so the render loop only asks "where is it now".

use log::{debug, warn};

use crate::config::QuestConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MotionAccess {
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl MotionAccess {
    /// Map a permission answer (`"granted"`, `"denied"`, anything else).
    pub fn from_permission(answer: &str) -> Self {
        match answer {
            "granted" => MotionAccess::Granted,
            other => {
                warn!("motion permission not granted ({}), falling back to tap", other);
                MotionAccess::Denied
            }
        }
    }

    pub fn roll_input(self) -> RollInput {
        match self {
            MotionAccess::Granted => RollInput::Shake,
            MotionAccess::Unknown | MotionAccess::Denied => RollInput::Tap,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollInput {
    Shake,
    Tap,
}

impl RollInput {
    pub fn prompt(self) -> &'static str {
        match self {
            RollInput::Shake => "Shake to roll",
            RollInput::Tap => "Tap to roll",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ShakeDetector {
    threshold: f64,
    cooldown_ms: f64,
    last_trigger: Option<f64>,
}

impl ShakeDetector {
    pub fn new(threshold: f64, cooldown_ms: f64) -> Self {
        Self { threshold, cooldown_ms, last_trigger: None }
    }

    pub fn from_config(config: &QuestConfig) -> Self {
        Self::new(config.shake_threshold, config.shake_cooldown_ms)
    }

    /// Feed one acceleration sample. True when it counts as a shake.
    pub fn observe(&mut self, x: f64, y: f64, z: f64, now_ms: f64) -> bool {
        let magnitude = (x * x + y * y + z * z).sqrt();
        if !magnitude.is_finite() || magnitude < self.threshold {
            return false;
        }
        if let Some(last) = self.last_trigger {
            if now_ms - last < self.cooldown_ms {
                return false;
            }
        }
        self.last_trigger = Some(now_ms);
        debug!("shake detected ({:.1} m/s²)", magnitude);
        true
    }
}

/// Ease-out cubic on `t` clamped to [0, 1].
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// One on-screen die tumble toward a known result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiceTumble {
    pub result: u8,
    start_ms: f64,
    duration_ms: f64,
    turns: f64,
}

impl DiceTumble {
    pub fn new(result: u8, start_ms: f64, duration_ms: f64) -> Self {
        Self { result, start_ms, duration_ms: duration_ms.max(1.0), turns: 3.0 }
    }

    pub fn progress(&self, now_ms: f64) -> f64 {
        ease_out_cubic((now_ms - self.start_ms) / self.duration_ms)
    }

    pub fn is_done(&self, now_ms: f64) -> bool {
        now_ms - self.start_ms >= self.duration_ms
    }

    /// Rotation in radians.
    pub fn angle(&self, now_ms: f64) -> f64 {
        self.progress(now_ms) * self.turns * std::f64::consts::TAU
    }

    /// Face to draw: flickers through values, settles on `result`.
    pub fn face(&self, now_ms: f64) -> u8 {
        if self.is_done(now_ms) {
            return self.result;
        }
        let flicker = (self.angle(now_ms) * 3.0) as u32;
        ((self.result as u32 + flicker) % 20 + 1) as u8
    }
}
