//! # voice-note-core
//!
//! Voice note capture, playback, and waveform library.
//!
//! An `AudioSession` records one WAV file, plays it back with pause and
//! seek, and samples input level while recording. The level trace is
//! reduced to display bars for the waveform, and a scrub controller maps
//! pointer drags over that waveform onto playback position. Device access
//! plugs in through `CaptureProvider` / `OutputProvider`.
//!
//! ## Architecture
//!
//! ```text
//! voice-note-core (this crate)
//! ├── traits/       ← CaptureProvider, OutputProvider, AudioBackend, SessionObserver
//! ├── models/       ← SessionError, SessionState, SessionConfiguration, LevelTrace, VoiceNote
//! ├── processing/   ← PeakMeter, remix/resample, WAV header generation
//! ├── backend/      ← WavBackend (engines over the device providers)
//! ├── session/      ← AudioSession state machine, LevelSampler, SessionDriver
//! ├── storage/      ← WavFileWriter, hound-based WAV reader
//! └── waveform/     ← reducer, WaveformView, ScrubController
//! ```

pub mod backend;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;
pub mod waveform;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types at crate root for convenience.
pub use backend::wav::{WavBackend, WavCaptureEngine, WavPlaybackEngine};
pub use models::config::{SessionConfiguration, WaveformStyle};
pub use models::error::SessionError;
pub use models::levels::LevelTrace;
pub use models::state::{SessionState, SessionTimer};
pub use models::voice_note::{clock_label, VoiceNote};
pub use processing::level_meter::PeakMeter;
pub use session::audio_session::{AudioSession, PendingCapture, PreparedCapture};
pub use session::driver::{SessionDriver, SharedSession};
pub use session::level_sampler::LevelSampler;
pub use storage::wav_writer::WavFileWriter;
pub use traits::capture_provider::{AudioBufferCallback, CaptureProvider};
pub use traits::engine::{AudioBackend, AudioRoute, CaptureEngine, FinishedCapture, PlaybackEngine};
pub use traits::output_provider::{OutputProvider, RenderCallback};
pub use traits::session_observer::{ChannelObserver, SessionEvent, SessionObserver};
pub use waveform::render::{BarShape, Canvas, WaveformPalette, WaveformView};
pub use waveform::scrub::{ScrubController, ScrubDelegate, ScrubGesture, ScrubPhase, ScrubTarget};
