use std::sync::Arc;

use crate::models::error::SessionError;

/// Render callback pulled by an output device.
///
/// Fills `buffer` with interleaved f32 samples and returns the number of
/// frames written. Returning fewer frames than requested means the source
/// is exhausted; the remainder of the buffer is left silent.
pub type RenderCallback = Arc<dyn Fn(&mut [f32]) -> usize + Send + Sync + 'static>;

/// Output device driven by a playback engine.
pub trait OutputProvider: Send {
    fn is_available(&self) -> bool;

    /// Start pulling audio from `render` in the given format.
    fn start(&mut self, render: RenderCallback, sample_rate: u32, channels: u16) -> Result<(), SessionError>;

    /// Stop pulling audio. The render callback is not invoked after this returns.
    fn stop(&mut self) -> Result<(), SessionError>;
}
