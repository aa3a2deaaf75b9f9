//! Playback speed
//!
//! The speed control is a slider in milliseconds-per-symbol. Smaller values
//! play faster: timed steps wait `value` ms and clips play at
//! `BASE_MS / value` times their natural rate.

use serde::Serialize;
use std::time::Duration;

use crate::config::PlaybackConfig;

/// Slider value that corresponds to 1x speed
pub const BASE_MS: u32 = 1000;

/// Speed derived from a slider value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedFactor {
    value: u32,
}

impl SpeedFactor {
    /// Zero is bumped to 1 ms.
    pub fn new(value: u32) -> Self {
        Self {
            value: value.max(1),
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// Playback-rate multiplier for clip-driven steps
    pub fn rate(&self) -> f64 {
        f64::from(BASE_MS) / f64::from(self.value)
    }

    /// Delay for timer-driven steps
    pub fn delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.value))
    }

    /// Human-readable label, e.g. "2.0x Speed".
    ///
    /// Rounds half up to one decimal place.
    pub fn label(&self) -> String {
        let value = u64::from(self.value);
        let tenths = (20 * u64::from(BASE_MS) + value) / (2 * value);
        format!("{}.{}x Speed", tenths / 10, tenths % 10)
    }

    pub fn summary(&self) -> SpeedSummary {
        SpeedSummary {
            value: self.value,
            rate: self.rate(),
            delay_ms: self.value,
            label: self.label(),
        }
    }
}

impl Default for SpeedFactor {
    fn default() -> Self {
        Self::new(BASE_MS)
    }
}

/// Serializable view of a speed setting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedSummary {
    pub value: u32,
    pub rate: f64,
    pub delay_ms: u32,
    pub label: String,
}

/// Bounds of the speed slider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedRange {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl SpeedRange {
    pub fn from_config(config: &PlaybackConfig) -> Self {
        let min = config.min_speed_ms.max(1);
        let max = config.max_speed_ms.max(min);
        Self {
            min,
            max,
            default: config.default_speed_ms.clamp(min, max),
        }
    }

    pub fn clamp(&self, value: u32) -> SpeedFactor {
        SpeedFactor::new(value.clamp(self.min, self.max))
    }

    pub fn initial(&self) -> SpeedFactor {
        SpeedFactor::new(self.default)
    }
}

impl Default for SpeedRange {
    fn default() -> Self {
        Self::from_config(&PlaybackConfig::default())
    }
}
