use std::path::Path;
use std::time::Duration;

use crate::models::config::SessionConfiguration;
use crate::models::error::SessionError;

/// Output routing requested before an engine starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioRoute {
    /// Simultaneous record and playback, optionally forced to the loud speaker.
    PlayAndRecord { speaker_override: bool },
    Playback,
}

/// What a capture engine reports once its file is finalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinishedCapture {
    pub checksum: Option<String>,
}

/// Engine that records the input signal into the session's output file.
pub trait CaptureEngine: Send + 'static {
    fn start(&mut self) -> Result<(), SessionError>;

    /// Stop capturing and finalize the file.
    fn stop(&mut self) -> Result<FinishedCapture, SessionError>;

    /// Elapsed capture time.
    fn current_time(&self) -> Duration;

    /// Refresh the meters and return the running peak of `channel` in dBFS.
    fn peak_power(&mut self, channel: usize) -> f32;
}

/// Engine that plays the session's output file back.
pub trait PlaybackEngine: Send + 'static {
    fn play(&mut self) -> Result<(), SessionError>;

    fn pause(&mut self);

    fn stop(&mut self);

    /// Current position. Resets to zero once the end of file is reached.
    fn current_time(&self) -> Duration;

    fn set_current_time(&mut self, position: Duration);

    /// Untrimmed container duration.
    fn duration(&self) -> Duration;
}

/// Factory for the engines bound to one output location.
///
/// Implemented by:
/// - `WavBackend` (PCM WAV over a `CaptureProvider` / `OutputProvider` pair)
pub trait AudioBackend: Send + Sync + 'static {
    type Capture: CaptureEngine;
    type Playback: PlaybackEngine;

    /// Create the output file and an engine ready to record into it.
    fn prepare_capture(
        &self,
        path: &Path,
        config: &SessionConfiguration,
    ) -> Result<Self::Capture, SessionError>;

    /// Open the file at `path` for playback.
    fn open_playback(&self, path: &Path) -> Result<Self::Playback, SessionError>;

    fn configure_route(&self, route: AudioRoute) -> Result<(), SessionError>;

    /// Untrimmed duration of the media at `path`.
    fn file_duration(&self, path: &Path) -> Result<Duration, SessionError>;
}
