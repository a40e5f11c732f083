//! PCM WAV backend.
//!
//! Data flow while recording:
//! ```text
//! [CaptureProvider] → remix → resample → [PeakMeter] ─┐
//!                                                     └→ [pending] → (drain thread) → [WavFileWriter]
//! ```
//! Playback decodes the whole file and hands frames to an `OutputProvider`
//! through a render callback.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::config::SessionConfiguration;
use crate::models::error::SessionError;
use crate::processing::level_meter::{PeakMeter, SILENCE_DB};
use crate::processing::pcm;
use crate::storage::wav_reader::{self, DecodedWav};
use crate::storage::wav_writer::WavFileWriter;
use crate::traits::capture_provider::{AudioBufferCallback, CaptureProvider};
use crate::traits::engine::{AudioBackend, AudioRoute, CaptureEngine, FinishedCapture, PlaybackEngine};
use crate::traits::output_provider::{OutputProvider, RenderCallback};

const DRAIN_INTERVAL: Duration = Duration::from_millis(100);
const METER_DECAY: f32 = 0.5;

/// Backend recording to and playing from 16-bit PCM WAV files.
pub struct WavBackend<I: CaptureProvider, O: OutputProvider> {
    input: Arc<Mutex<I>>,
    output: Arc<Mutex<O>>,
}

impl<I: CaptureProvider, O: OutputProvider> WavBackend<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self {
            input: Arc::new(Mutex::new(input)),
            output: Arc::new(Mutex::new(output)),
        }
    }
}

impl<I, O> AudioBackend for WavBackend<I, O>
where
    I: CaptureProvider + 'static,
    O: OutputProvider + 'static,
{
    type Capture = WavCaptureEngine<I>;
    type Playback = WavPlaybackEngine<O>;

    fn prepare_capture(&self, path: &Path, config: &SessionConfiguration) -> Result<Self::Capture, SessionError> {
        if !self.input.lock().is_available() {
            return Err(SessionError::EngineUnavailable("no input device".into()));
        }
        let mut writer = WavFileWriter::new(path.to_path_buf(), config.sample_rate, config.channels);
        writer.open()?;
        Ok(WavCaptureEngine::new(
            Arc::clone(&self.input),
            writer,
            config.sample_rate,
            config.channels,
        ))
    }

    fn open_playback(&self, path: &Path) -> Result<Self::Playback, SessionError> {
        let wav = wav_reader::read_wav(path)?;
        if !self.output.lock().is_available() {
            return Err(SessionError::EngineUnavailable("no output device".into()));
        }
        Ok(WavPlaybackEngine::new(Arc::clone(&self.output), wav))
    }

    fn configure_route(&self, route: AudioRoute) -> Result<(), SessionError> {
        let available = match route {
            AudioRoute::PlayAndRecord { .. } => self.input.lock().is_available(),
            AudioRoute::Playback => self.output.lock().is_available(),
        };
        if !available {
            return Err(SessionError::EngineUnavailable(format!("route {:?} has no device", route)));
        }
        log::debug!("audio route set to {:?}", route);
        Ok(())
    }

    fn file_duration(&self, path: &Path) -> Result<Duration, SessionError> {
        wav_reader::wav_duration(path)
    }
}

/// State shared between the input callback and the engine.
struct CaptureShared {
    pending: Vec<f32>,
    meters: Vec<PeakMeter>,
    frames_captured: u64,
}

/// Move queued samples into the file.
fn drain_pending(shared: &Mutex<CaptureShared>, writer: &Mutex<WavFileWriter>) {
    let samples = std::mem::take(&mut shared.lock().pending);
    if samples.is_empty() {
        return;
    }
    if let Err(e) = writer.lock().write(&pcm::to_i16_le_bytes(&samples)) {
        log::error!("Failed to write audio data: {}", e);
    }
}

/// Capture engine writing one WAV file from a `CaptureProvider`.
pub struct WavCaptureEngine<I: CaptureProvider> {
    input: Arc<Mutex<I>>,
    writer: Arc<Mutex<WavFileWriter>>,
    shared: Arc<Mutex<CaptureShared>>,
    sample_rate: u32,
    channels: u16,
    drain_running: Arc<AtomicBool>,
    drain_handle: Option<thread::JoinHandle<()>>,
    started: bool,
    finished: bool,
}

impl<I: CaptureProvider> WavCaptureEngine<I> {
    fn new(input: Arc<Mutex<I>>, writer: WavFileWriter, sample_rate: u32, channels: u16) -> Self {
        Self {
            input,
            writer: Arc::new(Mutex::new(writer)),
            shared: Arc::new(Mutex::new(CaptureShared {
                pending: Vec::new(),
                meters: vec![PeakMeter::new(METER_DECAY); channels as usize],
                frames_captured: 0,
            })),
            sample_rate,
            channels,
            drain_running: Arc::new(AtomicBool::new(false)),
            drain_handle: None,
            started: false,
            finished: false,
        }
    }

    fn stop_drain_thread(&mut self) {
        self.drain_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.drain_handle.take() {
            let _ = handle.join();
        }
    }
}

impl<I: CaptureProvider + 'static> CaptureEngine for WavCaptureEngine<I> {
    fn start(&mut self) -> Result<(), SessionError> {
        if self.started {
            return Err(SessionError::EngineUnavailable("capture engine already started".into()));
        }

        let shared = Arc::clone(&self.shared);
        let target_rate = self.sample_rate as f64;
        let target_channels = self.channels as usize;
        let callback: AudioBufferCallback = Arc::new(move |samples: &[f32], sample_rate: f64, channels: u16| {
            let mixed = pcm::remix(samples, channels as usize, target_channels);
            let resampled = pcm::resample_linear(&mixed, target_channels, sample_rate, target_rate);

            let mut s = shared.lock();
            let s = &mut *s;
            for (channel, meter) in s.meters.iter_mut().enumerate() {
                meter.accumulate(resampled.iter().skip(channel).step_by(target_channels).copied());
            }
            s.frames_captured += (resampled.len() / target_channels) as u64;
            s.pending.extend_from_slice(&resampled);
        });

        self.drain_running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.drain_running);
        let shared = Arc::clone(&self.shared);
        let writer = Arc::clone(&self.writer);
        let handle = thread::Builder::new()
            .name("wav-capture-drain".into())
            .spawn(move || {
                while running.load(Ordering::SeqCst) {
                    thread::sleep(DRAIN_INTERVAL);
                    drain_pending(&shared, &writer);
                }
            })
            .map_err(|e| SessionError::EngineUnavailable(format!("failed to spawn drain thread: {}", e)))?;
        self.drain_handle = Some(handle);

        let started = self.input.lock().start(callback);
        if let Err(e) = started {
            self.stop_drain_thread();
            return Err(e);
        }

        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<FinishedCapture, SessionError> {
        if self.finished {
            return Ok(FinishedCapture::default());
        }
        self.finished = true;

        if self.started {
            if let Err(e) = self.input.lock().stop() {
                log::warn!("input device failed to stop: {}", e);
            }
        }
        self.stop_drain_thread();
        drain_pending(&self.shared, &self.writer);

        let checksum = self.writer.lock().close()?;
        Ok(FinishedCapture {
            checksum: Some(checksum),
        })
    }

    fn current_time(&self) -> Duration {
        let frames = self.shared.lock().frames_captured;
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }

    fn peak_power(&mut self, channel: usize) -> f32 {
        self.shared
            .lock()
            .meters
            .get_mut(channel)
            .map(PeakMeter::read_db)
            .unwrap_or(SILENCE_DB)
    }
}

impl<I: CaptureProvider> Drop for WavCaptureEngine<I> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // Finalize the header so the file stays playable.
        if self.started {
            let _ = self.input.lock().stop();
        }
        self.stop_drain_thread();
        drain_pending(&self.shared, &self.writer);
        if let Err(e) = self.writer.lock().close() {
            log::warn!("failed to finalize abandoned recording: {}", e);
        }
    }
}

/// Read cursor shared with the render callback.
struct PlaybackCursor {
    samples: Vec<f32>,
    channels: usize,
    frame: usize,
    /// Set when the end of file was rendered; cleared by `play`.
    exhausted: bool,
}

impl PlaybackCursor {
    fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    fn render(&mut self, buffer: &mut [f32]) -> usize {
        if self.exhausted {
            buffer.fill(0.0);
            return 0;
        }
        let wanted = buffer.len() / self.channels;
        let count = wanted.min(self.frames() - self.frame);
        let start = self.frame * self.channels;
        let len = count * self.channels;

        buffer[..len].copy_from_slice(&self.samples[start..start + len]);
        buffer[len..].fill(0.0);
        self.frame += count;

        if self.frame >= self.frames() {
            self.frame = 0;
            self.exhausted = true;
        }
        count
    }
}

/// Playback engine for a decoded WAV file.
pub struct WavPlaybackEngine<O: OutputProvider> {
    output: Arc<Mutex<O>>,
    cursor: Arc<Mutex<PlaybackCursor>>,
    sample_rate: u32,
    channels: u16,
    output_running: bool,
}

impl<O: OutputProvider> WavPlaybackEngine<O> {
    fn new(output: Arc<Mutex<O>>, wav: DecodedWav) -> Self {
        let channels = wav.channels;
        Self {
            output,
            cursor: Arc::new(Mutex::new(PlaybackCursor {
                samples: wav.samples,
                channels: channels as usize,
                frame: 0,
                exhausted: false,
            })),
            sample_rate: wav.sample_rate,
            channels,
            output_running: false,
        }
    }

    fn frames_to_duration(&self, frames: usize) -> Duration {
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }

    fn stop_output(&mut self) {
        if !self.output_running {
            return;
        }
        self.output_running = false;
        if let Err(e) = self.output.lock().stop() {
            log::warn!("output device failed to stop: {}", e);
        }
    }
}

impl<O: OutputProvider + 'static> PlaybackEngine for WavPlaybackEngine<O> {
    fn play(&mut self) -> Result<(), SessionError> {
        self.cursor.lock().exhausted = false;
        if self.output_running {
            return Ok(());
        }

        let cursor = Arc::clone(&self.cursor);
        let render: RenderCallback = Arc::new(move |buffer: &mut [f32]| cursor.lock().render(buffer));
        self.output.lock().start(render, self.sample_rate, self.channels)?;
        self.output_running = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.stop_output();
    }

    fn stop(&mut self) {
        self.stop_output();
        let mut cursor = self.cursor.lock();
        cursor.frame = 0;
        cursor.exhausted = false;
    }

    fn current_time(&self) -> Duration {
        let frame = self.cursor.lock().frame;
        self.frames_to_duration(frame)
    }

    fn set_current_time(&mut self, position: Duration) {
        let mut cursor = self.cursor.lock();
        let frame = (position.as_secs_f64() * self.sample_rate as f64) as usize;
        cursor.frame = frame.min(cursor.frames());
        cursor.exhausted = false;
    }

    fn duration(&self) -> Duration {
        let frames = self.cursor.lock().frames();
        self.frames_to_duration(frames)
    }
}

impl<O: OutputProvider> Drop for WavPlaybackEngine<O> {
    fn drop(&mut self) {
        self.stop_output();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::levels::LevelTrace;
    use crate::models::state::{SessionState, SessionTimer};
    use crate::session::audio_session::AudioSession;
    use crate::storage::wav_reader::read_wav;
    use crate::testing::{temp_path, ManualOutput, RecordingObserver, ScriptedInput};
    use crate::traits::session_observer::SessionEvent;
    use std::fs;

    fn tone(frames: usize, amplitude: f32) -> Vec<f32> {
        (0..frames)
            .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
            .collect()
    }

    fn config() -> SessionConfiguration {
        SessionConfiguration {
            sample_rate: 16000,
            bit_rate: 16000,
            duration_trim_secs: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn records_resampled_mono_file() {
        let path = temp_path("capture.wav");
        // One second of stereo 48 kHz input.
        let input = ScriptedInput::new(vec![(tone(96000, 0.5), 48000.0, 2)]);
        let backend = WavBackend::new(input, ManualOutput::new());

        let mut engine = backend.prepare_capture(&path, &config()).unwrap();
        engine.start().unwrap();
        assert_eq!(engine.current_time(), Duration::from_secs(1));

        let finished = engine.stop().unwrap();
        assert_eq!(finished.checksum.map(|c| c.len()), Some(64));

        let wav = read_wav(&path).unwrap();
        assert_eq!(wav.sample_rate, 16000);
        assert_eq!(wav.channels, 1);
        assert_eq!(wav.frame_count(), 16000);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn peak_power_reads_meter_then_decays() {
        let path = temp_path("meter.wav");
        let input = ScriptedInput::new(vec![(tone(1600, 1.0), 16000.0, 1)]);
        let backend = WavBackend::new(input, ManualOutput::new());

        let mut engine = backend.prepare_capture(&path, &config()).unwrap();
        engine.start().unwrap();
        assert!(engine.peak_power(0).abs() < 1e-3);
        assert!(engine.peak_power(0) < -5.0);
        assert_eq!(engine.peak_power(3), SILENCE_DB);
        engine.stop().unwrap();

        fs::remove_file(&path).ok();
    }

    #[test]
    fn unavailable_input_fails_prepare() {
        let mut input = ScriptedInput::new(vec![]);
        input.available = false;
        let backend = WavBackend::new(input, ManualOutput::new());
        let result = backend.prepare_capture(&temp_path("none.wav"), &config());
        assert!(matches!(result, Err(SessionError::EngineUnavailable(_))));
        assert!(backend.configure_route(AudioRoute::PlayAndRecord { speaker_override: true }).is_err());
        assert!(backend.configure_route(AudioRoute::Playback).is_ok());
    }

    /// Input that reports itself available but refuses to start.
    struct BusyInput;

    impl CaptureProvider for BusyInput {
        fn is_available(&self) -> bool {
            true
        }

        fn start(&mut self, _callback: AudioBufferCallback) -> Result<(), SessionError> {
            Err(SessionError::EngineUnavailable("device busy".into()))
        }

        fn stop(&mut self) -> Result<(), SessionError> {
            Ok(())
        }
    }

    #[test]
    fn failed_input_start_stops_drain_thread() {
        let path = temp_path("busy.wav");
        let backend = WavBackend::new(BusyInput, ManualOutput::new());
        let mut engine = backend.prepare_capture(&path, &config()).unwrap();

        assert_eq!(
            engine.start(),
            Err(SessionError::EngineUnavailable("device busy".into()))
        );
        assert!(engine.drain_handle.is_none());
        assert!(!engine.drain_running.load(Ordering::SeqCst));

        // The file is still finalized as an empty recording.
        engine.stop().unwrap();
        assert_eq!(read_wav(&path).unwrap().frame_count(), 0);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn zero_rate_input_is_written_unresampled() {
        let path = temp_path("zero_rate.wav");
        let input = ScriptedInput::new(vec![(tone(160, 0.3), 0.0, 1)]);
        let backend = WavBackend::new(input, ManualOutput::new());
        let mut engine = backend.prepare_capture(&path, &config()).unwrap();
        engine.start().unwrap();
        engine.stop().unwrap();

        assert_eq!(read_wav(&path).unwrap().frame_count(), 160);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn unwritable_location_is_storage_error() {
        let blocker = temp_path("blocker");
        fs::write(&blocker, b"x").unwrap();
        let backend = WavBackend::new(ScriptedInput::new(vec![]), ManualOutput::new());
        let result = backend.prepare_capture(&blocker.join("note.wav"), &config());
        assert!(matches!(result, Err(SessionError::StorageUnavailable(_))));
        fs::remove_file(&blocker).ok();
    }

    #[test]
    fn open_playback_classifies_bad_sources() {
        let backend = WavBackend::new(ScriptedInput::new(vec![]), ManualOutput::new());
        assert!(matches!(
            backend.open_playback(&temp_path("missing.wav")),
            Err(SessionError::FileUnreadable(_))
        ));

        let garbage = temp_path("garbage.wav");
        fs::write(&garbage, b"RIFF....WAVEnope").unwrap();
        assert!(matches!(
            backend.open_playback(&garbage),
            Err(SessionError::MalformedMedia(_))
        ));
        fs::remove_file(&garbage).ok();
    }

    #[test]
    fn dropping_unstopped_engine_finalizes_file() {
        let path = temp_path("abandoned.wav");
        let backend = WavBackend::new(ScriptedInput::new(vec![(tone(800, 0.2), 16000.0, 1)]), ManualOutput::new());
        let mut engine = backend.prepare_capture(&path, &config()).unwrap();
        engine.start().unwrap();
        drop(engine);

        assert_eq!(read_wav(&path).unwrap().frame_count(), 800);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn full_session_round_trip() {
        let path = temp_path("session.wav");
        let output = ManualOutput::new();
        // Two seconds of mono input at the capture rate.
        let input = ScriptedInput::new(vec![
            (tone(16000, 0.8), 16000.0, 1),
            (tone(16000, 0.1), 16000.0, 1),
        ]);
        let backend = WavBackend::new(input, output.clone());
        let mut session = AudioSession::new(backend, path.clone(), config()).unwrap();
        let observer = Arc::new(RecordingObserver::default());
        session.set_observer(observer.clone());
        let trace = Arc::new(Mutex::new(LevelTrace::new()));
        session.attach_level_trace(Arc::clone(&trace));

        session.record().unwrap();
        session.fire(SessionTimer::LevelFrame);
        session.fire(SessionTimer::RecordClock);
        assert_eq!(observer.count(&SessionEvent::RecordPosition(Duration::from_secs(2))), 1);
        session.stop();
        assert_eq!(trace.lock().len(), 1);

        session.play().unwrap();
        assert!(output.is_running());
        assert_eq!(session.total_duration(), Some(Duration::from_secs(2)));

        assert_eq!(output.pull(8000), 8000);
        session.fire(SessionTimer::PlaybackClock);
        assert_eq!(observer.count(&SessionEvent::PlayPosition(Duration::from_millis(500))), 1);

        session.pause();
        assert!(!output.is_running());
        assert_eq!(output.pull(8000), 0);
        session.play().unwrap();
        assert_eq!(session.elapsed(), Some(Duration::from_millis(500)));

        session.set_progress(0.75);
        assert_eq!(session.elapsed(), Some(Duration::from_millis(1500)));

        // Render past the end: the engine rewinds and the next tick stops.
        assert_eq!(output.pull(16000), 8000);
        assert_eq!(session.elapsed(), Some(Duration::ZERO));
        session.fire(SessionTimer::PlaybackClock);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(observer.count(&SessionEvent::PlaybackStopped), 1);
        assert!(!output.is_running());

        let note = session.finish(&trace.lock()).unwrap().unwrap();
        assert_eq!(note.duration_secs, 2);
        assert_eq!(note.peaks.len(), 1);
        assert_eq!(note.checksum.len(), 64);

        session.discard().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn exhausted_cursor_renders_silence() {
        let mut cursor = PlaybackCursor {
            samples: vec![0.5, 0.5, 0.5],
            channels: 1,
            frame: 0,
            exhausted: false,
        };
        let mut buffer = [1.0f32; 4];
        assert_eq!(cursor.render(&mut buffer), 3);
        assert_eq!(buffer, [0.5, 0.5, 0.5, 0.0]);
        assert_eq!(cursor.frame, 0);
        assert_eq!(cursor.render(&mut buffer), 0);
        assert_eq!(buffer, [0.0; 4]);
    }
}
