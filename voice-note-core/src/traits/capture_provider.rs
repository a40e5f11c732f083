use std::sync::Arc;

use crate::models::error::SessionError;

/// Callback invoked when an input buffer is available.
///
/// Parameters:
/// - `samples`: Interleaved f32 samples.
/// - `sample_rate`: The actual sample rate of the delivered audio.
/// - `channels`: Number of interleaved channels.
pub type AudioBufferCallback = Arc<dyn Fn(&[f32], f64, u16) + Send + Sync + 'static>;

/// Input device feeding a capture engine.
pub trait CaptureProvider: Send {
    /// Whether the device can currently be opened.
    fn is_available(&self) -> bool;

    /// Start delivering buffers via `callback`.
    ///
    /// The callback may fire on a dedicated audio thread; keep work minimal.
    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), SessionError>;

    /// Stop delivering buffers. No callback fires after this returns.
    fn stop(&mut self) -> Result<(), SessionError>;
}
