//! Scripted engines and devices for unit tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::config::SessionConfiguration;
use crate::models::error::SessionError;
use crate::models::state::SessionState;
use crate::traits::capture_provider::{AudioBufferCallback, CaptureProvider};
use crate::traits::engine::{AudioBackend, AudioRoute, CaptureEngine, FinishedCapture, PlaybackEngine};
use crate::traits::output_provider::{OutputProvider, RenderCallback};
use crate::traits::session_observer::{SessionEvent, SessionObserver};

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub capture_time: Duration,
    pub peak_db: f32,
    pub playback_time: Duration,
    pub playback_duration: Duration,
    pub fail_prepare: Option<SessionError>,
    pub fail_start: Option<SessionError>,
    pub fail_open: Option<SessionError>,
    pub fail_route: Option<SessionError>,
    pub routes: Vec<AudioRoute>,
    pub captures_prepared: usize,
    pub captures_stopped: usize,
    pub playbacks_opened: usize,
    pub playback_plays: usize,
    pub playback_pauses: usize,
    pub playbacks_stopped: usize,
    pub live_captures: usize,
    pub live_playbacks: usize,
    pub prepared_paths: Vec<PathBuf>,
}

/// Backend whose engine clocks and levels are set directly by the test.
#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.state.lock().playback_duration = Duration::from_secs(10);
        backend
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock())
    }

    pub fn set_capture_time(&self, t: Duration) {
        self.state.lock().capture_time = t;
    }

    pub fn set_peak_db(&self, db: f32) {
        self.state.lock().peak_db = db;
    }

    pub fn set_playback_time(&self, t: Duration) {
        self.state.lock().playback_time = t;
    }

    pub fn playback_time(&self) -> Duration {
        self.state.lock().playback_time
    }

    pub fn live_engines(&self) -> (usize, usize) {
        let s = self.state.lock();
        (s.live_captures, s.live_playbacks)
    }
}

pub(crate) struct FakeCapture {
    state: Arc<Mutex<FakeState>>,
}

impl CaptureEngine for FakeCapture {
    fn start(&mut self) -> Result<(), SessionError> {
        match self.state.lock().fail_start.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn stop(&mut self) -> Result<FinishedCapture, SessionError> {
        self.state.lock().captures_stopped += 1;
        Ok(FinishedCapture {
            checksum: Some("fake-checksum".into()),
        })
    }

    fn current_time(&self) -> Duration {
        self.state.lock().capture_time
    }

    fn peak_power(&mut self, _channel: usize) -> f32 {
        self.state.lock().peak_db
    }
}

impl Drop for FakeCapture {
    fn drop(&mut self) {
        self.state.lock().live_captures -= 1;
    }
}

pub(crate) struct FakePlayback {
    state: Arc<Mutex<FakeState>>,
}

impl PlaybackEngine for FakePlayback {
    fn play(&mut self) -> Result<(), SessionError> {
        self.state.lock().playback_plays += 1;
        Ok(())
    }

    fn pause(&mut self) {
        self.state.lock().playback_pauses += 1;
    }

    fn stop(&mut self) {
        self.state.lock().playbacks_stopped += 1;
    }

    fn current_time(&self) -> Duration {
        self.state.lock().playback_time
    }

    fn set_current_time(&mut self, position: Duration) {
        self.state.lock().playback_time = position;
    }

    fn duration(&self) -> Duration {
        self.state.lock().playback_duration
    }
}

impl Drop for FakePlayback {
    fn drop(&mut self) {
        self.state.lock().live_playbacks -= 1;
    }
}

impl AudioBackend for FakeBackend {
    type Capture = FakeCapture;
    type Playback = FakePlayback;

    fn prepare_capture(&self, path: &Path, _config: &SessionConfiguration) -> Result<FakeCapture, SessionError> {
        let mut s = self.state.lock();
        if let Some(err) = s.fail_prepare.clone() {
            return Err(err);
        }
        s.captures_prepared += 1;
        s.live_captures += 1;
        s.capture_time = Duration::ZERO;
        s.prepared_paths.push(path.to_path_buf());
        Ok(FakeCapture {
            state: Arc::clone(&self.state),
        })
    }

    fn open_playback(&self, _path: &Path) -> Result<FakePlayback, SessionError> {
        let mut s = self.state.lock();
        if let Some(err) = s.fail_open.clone() {
            return Err(err);
        }
        // A fresh engine always starts at the beginning of the file.
        s.playback_time = Duration::ZERO;
        s.playbacks_opened += 1;
        s.live_playbacks += 1;
        Ok(FakePlayback {
            state: Arc::clone(&self.state),
        })
    }

    fn configure_route(&self, route: AudioRoute) -> Result<(), SessionError> {
        let mut s = self.state.lock();
        if let Some(err) = s.fail_route.clone() {
            return Err(err);
        }
        s.routes.push(route);
        Ok(())
    }

    fn file_duration(&self, _path: &Path) -> Result<Duration, SessionError> {
        Ok(self.state.lock().playback_duration)
    }
}

/// Observer collecting every notification in order.
#[derive(Default)]
pub(crate) struct RecordingObserver {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, event: &SessionEvent) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl SessionObserver for RecordingObserver {
    fn on_state_changed(&self, state: SessionState) {
        self.events.lock().push(SessionEvent::StateChanged(state));
    }

    fn on_level_sample(&self, db: f32) {
        self.events.lock().push(SessionEvent::LevelSample(db));
    }

    fn on_record_position(&self, elapsed: Duration) {
        self.events.lock().push(SessionEvent::RecordPosition(elapsed));
    }

    fn on_play_position(&self, position: Duration) {
        self.events.lock().push(SessionEvent::PlayPosition(position));
    }

    fn on_recording_stopped(&self) {
        self.events.lock().push(SessionEvent::RecordingStopped);
    }

    fn on_playback_stopped(&self) {
        self.events.lock().push(SessionEvent::PlaybackStopped);
    }
}

/// Input device that delivers a fixed list of buffers synchronously from `start`.
#[derive(Clone)]
pub(crate) struct ScriptedInput {
    pub buffers: Vec<(Vec<f32>, f64, u16)>,
    pub available: bool,
    pub running: Arc<Mutex<bool>>,
}

impl ScriptedInput {
    pub fn new(buffers: Vec<(Vec<f32>, f64, u16)>) -> Self {
        Self {
            buffers,
            available: true,
            running: Arc::new(Mutex::new(false)),
        }
    }
}

impl CaptureProvider for ScriptedInput {
    fn is_available(&self) -> bool {
        self.available
    }

    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), SessionError> {
        if !self.available {
            return Err(SessionError::EngineUnavailable("scripted input unavailable".into()));
        }
        *self.running.lock() = true;
        for (samples, rate, channels) in &self.buffers {
            callback(samples, *rate, *channels);
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SessionError> {
        *self.running.lock() = false;
        Ok(())
    }
}

/// Output device that only renders when the test pulls frames.
#[derive(Clone)]
pub(crate) struct ManualOutput {
    render: Arc<Mutex<Option<(RenderCallback, u16)>>>,
    pub available: bool,
}

impl ManualOutput {
    pub fn new() -> Self {
        Self {
            render: Arc::new(Mutex::new(None)),
            available: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.render.lock().is_some()
    }

    /// Pull `frames` frames; returns the number actually rendered.
    pub fn pull(&self, frames: usize) -> usize {
        let guard = self.render.lock();
        let Some((render, channels)) = guard.as_ref() else {
            return 0;
        };
        let mut buffer = vec![0.0f32; frames * *channels as usize];
        render(&mut buffer)
    }
}

impl OutputProvider for ManualOutput {
    fn is_available(&self) -> bool {
        self.available
    }

    fn start(&mut self, render: RenderCallback, _sample_rate: u32, channels: u16) -> Result<(), SessionError> {
        if !self.available {
            return Err(SessionError::EngineUnavailable("manual output unavailable".into()));
        }
        *self.render.lock() = Some((render, channels));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SessionError> {
        *self.render.lock() = None;
        Ok(())
    }
}

pub(crate) fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("voice_note_test_{}_{}", uuid::Uuid::new_v4(), name))
}
