use std::fs;
use std::io;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::config::SessionConfiguration;
use crate::models::error::SessionError;
use crate::models::levels::LevelTrace;
use crate::models::state::{SessionState, SessionTimer};
use crate::models::voice_note::VoiceNote;
use crate::session::level_sampler::LevelSampler;
use crate::traits::engine::{AudioBackend, AudioRoute, CaptureEngine, PlaybackEngine};
use crate::traits::session_observer::SessionObserver;

struct Capture<C> {
    engine: C,
    sampler: Option<LevelSampler>,
}

struct Playback<P> {
    engine: P,
    /// Trimmed container duration, the denominator for every progress value.
    total: Duration,
}

/// The engine a session owns. At most one engine exists at any time.
enum Phase<C, P> {
    Idle,
    Recording(Capture<C>),
    Playing(Playback<P>),
    Paused(Playback<P>),
}

impl<C, P> Phase<C, P> {
    fn state(&self) -> SessionState {
        match self {
            Self::Idle => SessionState::Idle,
            Self::Recording(_) => SessionState::Recording,
            Self::Playing(_) => SessionState::Playing,
            Self::Paused(_) => SessionState::Paused,
        }
    }
}

/// Outcome of the most recent recording.
#[derive(Debug, Clone)]
struct Take {
    elapsed: Duration,
    checksum: Option<String>,
}

/// A capture engine prepared ahead of `record`.
pub struct PreparedCapture<C> {
    engine: C,
    path: PathBuf,
}

/// A capture engine being prepared on a background thread.
pub struct PendingCapture<C> {
    handle: Option<thread::JoinHandle<Result<PreparedCapture<C>, SessionError>>>,
    spawn_error: Option<SessionError>,
}

impl<C> PendingCapture<C> {
    /// Block until preparation finishes.
    pub fn wait(mut self) -> Result<PreparedCapture<C>, SessionError> {
        if let Some(err) = self.spawn_error.take() {
            return Err(err);
        }
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| SessionError::EngineUnavailable("capture preparation panicked".into()))?,
            None => Err(SessionError::EngineUnavailable("capture preparation not started".into())),
        }
    }
}

/// Record/playback state machine bound to one output file.
///
/// Timers are not owned here: whoever drives the session (a UI event loop,
/// or [`SessionDriver`](crate::session::driver::SessionDriver)) calls
/// [`AudioSession::fire`] for each timer reported by [`AudioSession::is_armed`].
/// A timer that is not armed for the current state is ignored, so nothing
/// fires into a session after `stop()` returns.
pub struct AudioSession<B: AudioBackend> {
    backend: Arc<B>,
    path: PathBuf,
    config: SessionConfiguration,
    phase: Phase<B::Capture, B::Playback>,
    observer: Option<Arc<dyn SessionObserver>>,
    level_trace: Option<Arc<Mutex<LevelTrace>>>,
    last_take: Option<Take>,
}

impl<B: AudioBackend> AudioSession<B> {
    pub fn new(backend: B, path: impl Into<PathBuf>, config: SessionConfiguration) -> Result<Self, SessionError> {
        config.validate().map_err(SessionError::InvalidConfiguration)?;
        Ok(Self {
            backend: Arc::new(backend),
            path: path.into(),
            config,
            phase: Phase::Idle,
            observer: None,
            level_trace: None,
            last_take: None,
        })
    }

    /// Session writing to a fresh `voice_note_<uuid>.wav` inside `directory`.
    pub fn in_directory(backend: B, directory: &Path, config: SessionConfiguration) -> Result<Self, SessionError> {
        let file_name = format!("voice_note_{}.wav", uuid::Uuid::new_v4());
        Self::new(backend, directory.join(file_name), config)
    }

    pub fn set_observer(&mut self, observer: Arc<dyn SessionObserver>) {
        self.observer = Some(observer);
    }

    /// Attach the caller-owned sequence the level sampler appends to.
    ///
    /// Takes effect from the next `record`.
    pub fn attach_level_trace(&mut self, trace: Arc<Mutex<LevelTrace>>) {
        self.level_trace = Some(trace);
    }

    pub fn state(&self) -> SessionState {
        self.phase.state()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &SessionConfiguration {
        &self.config
    }

    pub fn has_capture_engine(&self) -> bool {
        matches!(self.phase, Phase::Recording(_))
    }

    pub fn has_playback_engine(&self) -> bool {
        matches!(self.phase, Phase::Playing(_) | Phase::Paused(_))
    }

    /// Elapsed time of whichever engine is active.
    pub fn elapsed(&self) -> Option<Duration> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Recording(capture) => Some(capture.engine.current_time()),
            Phase::Playing(playback) | Phase::Paused(playback) => Some(playback.engine.current_time()),
        }
    }

    /// Trimmed media duration, cached when playback started.
    pub fn total_duration(&self) -> Option<Duration> {
        match &self.phase {
            Phase::Playing(playback) | Phase::Paused(playback) => Some(playback.total),
            _ => None,
        }
    }

    /// Playback position as a fraction of the trimmed duration.
    pub fn progress(&self) -> Option<f64> {
        match &self.phase {
            Phase::Playing(playback) | Phase::Paused(playback) if !playback.total.is_zero() => {
                Some(playback.engine.current_time().as_secs_f64() / playback.total.as_secs_f64())
            }
            _ => None,
        }
    }

    /// Capture time of the last finished recording.
    pub fn last_recording_duration(&self) -> Option<Duration> {
        self.last_take.as_ref().map(|take| take.elapsed)
    }

    // --- Recording ---

    /// Create the capture engine without changing state.
    pub fn prepare(&self) -> Result<PreparedCapture<B::Capture>, SessionError> {
        let engine = self.backend.prepare_capture(&self.path, &self.config)?;
        Ok(PreparedCapture {
            engine,
            path: self.path.clone(),
        })
    }

    /// Prepare the capture engine on a background thread.
    pub fn prepare_detached(&self) -> PendingCapture<B::Capture> {
        let backend = Arc::clone(&self.backend);
        let path = self.path.clone();
        let config = self.config.clone();

        let spawned = thread::Builder::new().name("capture-prepare".into()).spawn(move || {
            let engine = backend.prepare_capture(&path, &config)?;
            Ok(PreparedCapture { engine, path })
        });

        match spawned {
            Ok(handle) => PendingCapture {
                handle: Some(handle),
                spawn_error: None,
            },
            Err(e) => PendingCapture {
                handle: None,
                spawn_error: Some(SessionError::EngineUnavailable(format!(
                    "failed to spawn preparation thread: {}",
                    e
                ))),
            },
        }
    }

    /// Start recording. Transitions: idle → recording.
    ///
    /// Prepares the capture engine first.
    pub fn record(&mut self) -> Result<(), SessionError> {
        self.ensure_idle("record")?;
        let prepared = self.prepare()?;
        self.record_prepared(prepared)
    }

    /// Start recording with an engine from [`AudioSession::prepare`].
    pub fn record_prepared(&mut self, prepared: PreparedCapture<B::Capture>) -> Result<(), SessionError> {
        self.ensure_idle("record")?;
        if prepared.path != self.path {
            return Err(SessionError::InvalidConfiguration(format!(
                "capture prepared for {} but session records to {}",
                prepared.path.display(),
                self.path.display()
            )));
        }

        self.backend.configure_route(AudioRoute::PlayAndRecord {
            speaker_override: true,
        })?;

        let mut engine = prepared.engine;
        engine.start()?;

        let sampler = self
            .config
            .metering
            .then(|| LevelSampler::new(0, self.level_trace.clone()));
        log::debug!(
            "record clock armed every {:?}, level sampling {}",
            self.config.timer_period(SessionTimer::RecordClock),
            if sampler.is_some() { "on" } else { "off" }
        );

        self.last_take = None;
        self.phase = Phase::Recording(Capture { engine, sampler });
        self.state_changed();
        Ok(())
    }

    // --- Playback ---

    /// Start or resume playback. Transitions: idle → playing, paused → playing.
    ///
    /// From idle a fresh engine is opened at the start of the file; from
    /// paused the same engine resumes where it stopped.
    pub fn play(&mut self) -> Result<(), SessionError> {
        match &mut self.phase {
            Phase::Playing(_) => return Ok(()),
            Phase::Recording(_) => {
                return Err(SessionError::InvalidTransition {
                    from: SessionState::Recording,
                    action: "play",
                })
            }
            Phase::Paused(playback) => {
                self.backend.configure_route(AudioRoute::Playback)?;
                playback.engine.play()?;
                self.phase = match mem::replace(&mut self.phase, Phase::Idle) {
                    Phase::Paused(playback) => Phase::Playing(playback),
                    other => other,
                };
            }
            Phase::Idle => {
                self.backend.configure_route(AudioRoute::Playback)?;
                let mut engine = self.backend.open_playback(&self.path)?;
                let total = engine.duration().saturating_sub(self.config.duration_trim());
                engine.play()?;
                self.phase = Phase::Playing(Playback { engine, total });
            }
        }

        log::debug!(
            "playback clock armed every {:?}",
            self.config.timer_period(SessionTimer::PlaybackClock)
        );
        self.state_changed();
        Ok(())
    }

    /// Pause playback. Transitions: playing → paused. No-op otherwise.
    pub fn pause(&mut self) {
        let Phase::Playing(playback) = &mut self.phase else {
            return;
        };
        playback.engine.pause();
        self.phase = match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Playing(playback) => Phase::Paused(playback),
            other => other,
        };
        log::debug!("playback clock disarmed");
        self.state_changed();
    }

    /// Stop whatever is active and release its engine. Transitions: any → idle.
    ///
    /// Calling it on an idle session does nothing and notifies nobody.
    pub fn stop(&mut self) {
        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => {}
            Phase::Recording(mut capture) => {
                let elapsed = capture.engine.current_time();
                let checksum = match capture.engine.stop() {
                    Ok(finished) => finished.checksum,
                    Err(e) => {
                        log::warn!("capture engine failed to stop cleanly: {}", e);
                        None
                    }
                };
                drop(capture);
                self.last_take = Some(Take { elapsed, checksum });

                log::info!("recording stopped after {:.2}s", elapsed.as_secs_f64());
                self.state_changed();
                if let Some(observer) = &self.observer {
                    observer.on_recording_stopped();
                }
            }
            Phase::Playing(mut playback) | Phase::Paused(mut playback) => {
                playback.engine.stop();
                drop(playback);

                log::info!("playback stopped");
                self.state_changed();
                if let Some(observer) = &self.observer {
                    observer.on_playback_stopped();
                }
            }
        }
    }

    /// Seek to `progress` of the trimmed duration and report the new position.
    ///
    /// Ignored unless a playback engine exists and has advanced past zero.
    pub fn set_progress(&mut self, progress: f64) {
        let (Phase::Playing(playback) | Phase::Paused(playback)) = &mut self.phase else {
            return;
        };
        if playback.engine.current_time().is_zero() || !progress.is_finite() {
            return;
        }

        let target = playback.total.mul_f64(progress.clamp(0.0, 1.0));
        playback.engine.set_current_time(target);
        let position = playback.engine.current_time();

        if let Some(observer) = &self.observer {
            observer.on_play_position(position);
        }
    }

    // --- Timers ---

    /// Whether `timer` should currently be firing.
    pub fn is_armed(&self, timer: SessionTimer) -> bool {
        match (&self.phase, timer) {
            (Phase::Recording(_), SessionTimer::RecordClock) => true,
            (Phase::Recording(capture), SessionTimer::LevelFrame) => capture.sampler.is_some(),
            (Phase::Playing(_), SessionTimer::PlaybackClock) => true,
            _ => false,
        }
    }

    /// Handle one tick of `timer`. Ticks of disarmed timers are ignored.
    pub fn fire(&mut self, timer: SessionTimer) {
        match timer {
            SessionTimer::RecordClock => self.tick_record_clock(),
            SessionTimer::PlaybackClock => self.tick_playback_clock(),
            SessionTimer::LevelFrame => self.tick_level_frame(),
        }
    }

    fn tick_record_clock(&mut self) {
        let Phase::Recording(capture) = &self.phase else {
            return;
        };
        let elapsed = capture.engine.current_time();

        if elapsed > self.config.max_duration() {
            log::info!(
                "recording reached the {:.0}s limit",
                self.config.max_duration_secs
            );
            self.stop();
            return;
        }

        if let Some(observer) = &self.observer {
            observer.on_record_position(elapsed);
        }
    }

    fn tick_playback_clock(&mut self) {
        let Phase::Playing(playback) = &self.phase else {
            return;
        };
        let position = playback.engine.current_time();

        // The engine rewinds to zero once it reaches the end of the file.
        if position.is_zero() {
            self.stop();
            return;
        }

        if let Some(observer) = &self.observer {
            observer.on_play_position(position);
        }
    }

    fn tick_level_frame(&mut self) {
        let Phase::Recording(Capture {
            engine,
            sampler: Some(sampler),
        }) = &mut self.phase
        else {
            return;
        };
        let db = sampler.tick(engine);

        if let Some(observer) = &self.observer {
            observer.on_level_sample(db);
        }
    }

    // --- Hand-off ---

    /// Stop the session and package the last recording for the caller.
    ///
    /// Returns `None` when nothing was recorded or the take was shorter than
    /// the configured minimum.
    pub fn finish(&mut self, levels: &LevelTrace) -> Result<Option<VoiceNote>, SessionError> {
        self.stop();

        let Some(take) = self.last_take.clone() else {
            return Ok(None);
        };
        if take.elapsed < self.config.min_duration() {
            log::info!(
                "discarding {:.2}s take, shorter than {:.2}s",
                take.elapsed.as_secs_f64(),
                self.config.min_duration_secs
            );
            return Ok(None);
        }

        let duration = self
            .backend
            .file_duration(&self.path)?
            .saturating_sub(self.config.duration_trim());

        Ok(Some(VoiceNote::new(
            self.path.clone(),
            duration,
            levels.samples().to_vec(),
            take.checksum.unwrap_or_default(),
        )))
    }

    /// Stop the session and delete the output file.
    pub fn discard(&mut self) -> Result<(), SessionError> {
        self.stop();
        self.last_take = None;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::StorageUnavailable(format!(
                "failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    // --- Internal helpers ---

    fn ensure_idle(&self, action: &'static str) -> Result<(), SessionError> {
        match self.state() {
            SessionState::Idle => Ok(()),
            from => Err(SessionError::InvalidTransition { from, action }),
        }
    }

    fn state_changed(&self) {
        let state = self.state();
        log::info!("audio session {} ({})", state, self.path.display());
        if let Some(observer) = &self.observer {
            observer.on_state_changed(state);
        }
    }
}

impl<B: AudioBackend> Drop for AudioSession<B> {
    fn drop(&mut self) {
        self.stop();
    }
}
