use std::fmt;

/// Observable state of an audio session.
///
/// State transitions:
/// ```text
/// idle → recording → idle
/// idle → playing ↔ paused
///          ↓        ↓
///         idle     idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Recording,
    Playing,
    Paused,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    /// Whether a playback engine is alive (playing or paused).
    pub fn has_playback(&self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Playing => "playing",
            Self::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Periodic timers a session arms while it is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionTimer {
    /// Reports elapsed capture time, once per record tick.
    RecordClock,
    /// Reports playback position at a finer grain than the record clock.
    PlaybackClock,
    /// Samples the capture level once per rendered frame.
    LevelFrame,
}

impl SessionTimer {
    pub const ALL: [SessionTimer; 3] = [Self::RecordClock, Self::PlaybackClock, Self::LevelFrame];
}
