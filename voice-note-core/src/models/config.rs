use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::SessionError;
use super::state::SessionTimer;

/// Configuration for an audio session.
///
/// All durations are expressed in seconds so the struct maps cleanly onto
/// JSON. Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfiguration {
    /// Encoder bit rate hint in bits per second (default: 192000).
    pub bit_rate: u32,

    /// Capture sample rate in Hz (default: 44100).
    pub sample_rate: u32,

    /// Number of captured channels (default: 1). Valid values: 1, 2.
    pub channels: u16,

    /// Sample the signal level once per frame while recording (default: true).
    pub metering: bool,

    /// Recording is force-stopped once elapsed capture time exceeds this.
    pub max_duration_secs: f64,

    /// Shortest take that is handed off as a voice note.
    pub min_duration_secs: f64,

    /// Period of the elapsed-capture-time timer.
    pub record_tick_secs: f64,

    /// Period of the playback position timer.
    pub playback_tick_secs: f64,

    /// Period of the level sampling tick (one rendered frame).
    pub frame_interval_secs: f64,

    /// Subtracted from the container duration to compensate encoder padding.
    pub duration_trim_secs: f64,
}

impl SessionConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.bit_rate == 0 {
            return Err("bit rate must be positive".into());
        }
        if ![1, 2].contains(&self.channels) {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        for (name, period) in [
            ("record tick", self.record_tick_secs),
            ("playback tick", self.playback_tick_secs),
            ("frame interval", self.frame_interval_secs),
            ("max duration", self.max_duration_secs),
        ] {
            if !(period.is_finite() && period > 0.0) {
                return Err(format!("{} must be positive", name));
            }
        }
        if !(self.min_duration_secs >= 0.0 && self.duration_trim_secs >= 0.0) {
            return Err("min duration and duration trim must not be negative".into());
        }
        if self.min_duration_secs > self.max_duration_secs {
            return Err(format!(
                "min duration {}s exceeds max duration {}s",
                self.min_duration_secs, self.max_duration_secs
            ));
        }
        Ok(())
    }

    /// Parse a JSON document and validate the result.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SessionError::InvalidConfiguration(e.to_string()))?;
        config.validate().map_err(SessionError::InvalidConfiguration)?;
        Ok(config)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs_f64(self.max_duration_secs)
    }

    pub fn min_duration(&self) -> Duration {
        Duration::from_secs_f64(self.min_duration_secs)
    }

    pub fn duration_trim(&self) -> Duration {
        Duration::from_secs_f64(self.duration_trim_secs)
    }

    /// Firing period of the given session timer.
    pub fn timer_period(&self, timer: SessionTimer) -> Duration {
        let secs = match timer {
            SessionTimer::RecordClock => self.record_tick_secs,
            SessionTimer::PlaybackClock => self.playback_tick_secs,
            SessionTimer::LevelFrame => self.frame_interval_secs,
        };
        Duration::from_secs_f64(secs)
    }
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self {
            bit_rate: 192_000,
            sample_rate: 44_100,
            channels: 1,
            metering: true,
            max_duration_secs: 300.0,
            min_duration_secs: 1.0,
            record_tick_secs: 1.0,
            playback_tick_secs: 0.1,
            frame_interval_secs: 1.0 / 60.0,
            duration_trim_secs: 0.33,
        }
    }
}

/// Geometry and normalization constants for the waveform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformStyle {
    /// Width of one bar in px.
    pub bar_width: f32,
    /// Gap between bars in px.
    pub bar_spacing: f32,
    /// Smallest bar half-height in px.
    pub min_height: f32,
    /// Sign-adjusted level treated as total silence.
    pub silence_level: f32,
}

impl Default for WaveformStyle {
    fn default() -> Self {
        Self {
            bar_width: 2.0,
            bar_spacing: 1.0,
            min_height: 1.0,
            silence_level: 35.0,
        }
    }
}
