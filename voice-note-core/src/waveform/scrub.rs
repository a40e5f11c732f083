//! Pointer-drag seeking over the waveform.

use crate::models::error::SessionError;
use crate::models::state::SessionState;
use crate::session::audio_session::AudioSession;
use crate::traits::engine::AudioBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrubPhase {
    Begin,
    Move,
    End,
}

/// One event of a drag over the waveform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrubGesture {
    pub phase: ScrubPhase,
    /// Horizontal pointer position in view coordinates.
    pub pointer_x: f32,
}

impl ScrubGesture {
    pub fn new(phase: ScrubPhase, pointer_x: f32) -> Self {
        Self { phase, pointer_x }
    }
}

/// Normalized position of `pointer_x` across a view `width` wide.
pub fn scrub_progress(pointer_x: f32, width: f32) -> f64 {
    if !(width.is_finite() && width > 0.0) {
        return 0.0;
    }
    let progress = f64::from(pointer_x) / f64::from(width);
    if progress.is_nan() {
        return 0.0;
    }
    progress.clamp(0.0, 1.0)
}

/// The session operations a scrub needs.
pub trait ScrubTarget {
    fn state(&self) -> SessionState;

    fn pause(&mut self);

    fn resume(&mut self) -> Result<(), SessionError>;

    fn set_progress(&mut self, progress: f64);
}

impl<B: AudioBackend> ScrubTarget for AudioSession<B> {
    fn state(&self) -> SessionState {
        AudioSession::state(self)
    }

    fn pause(&mut self) {
        AudioSession::pause(self)
    }

    fn resume(&mut self) -> Result<(), SessionError> {
        self.play()
    }

    fn set_progress(&mut self, progress: f64) {
        AudioSession::set_progress(self, progress)
    }
}

/// Receives the seek results of a drag.
pub trait ScrubDelegate {
    fn on_scrub_move(&mut self, _progress: f64) {}

    fn on_scrub_end(&mut self, progress: f64);
}

/// Turns a gesture stream into pause, seek and resume calls.
pub struct ScrubController<D: ScrubDelegate> {
    view_width: f32,
    delegate: D,
    /// Set on `Begin` when the session had a playback engine to resume.
    resume_on_end: bool,
}

impl<D: ScrubDelegate> ScrubController<D> {
    pub fn new(view_width: f32, delegate: D) -> Self {
        Self {
            view_width,
            delegate,
            resume_on_end: false,
        }
    }

    pub fn set_view_width(&mut self, width: f32) {
        self.view_width = width;
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    /// Handle one gesture event and return the seek target, if any.
    ///
    /// Gestures over a session without a playback engine (idle or
    /// recording) are ignored and the delegate is not notified.
    pub fn handle<T: ScrubTarget + ?Sized>(&mut self, gesture: ScrubGesture, target: &mut T) -> Option<f64> {
        if !target.state().has_playback() {
            if gesture.phase == ScrubPhase::End {
                self.resume_on_end = false;
            }
            return None;
        }

        match gesture.phase {
            ScrubPhase::Begin => {
                self.resume_on_end = true;
                target.pause();
                None
            }
            ScrubPhase::Move => {
                let progress = scrub_progress(gesture.pointer_x, self.view_width);
                target.set_progress(progress);
                self.delegate.on_scrub_move(progress);
                Some(progress)
            }
            ScrubPhase::End => {
                let progress = scrub_progress(gesture.pointer_x, self.view_width);
                target.set_progress(progress);
                self.delegate.on_scrub_end(progress);

                if std::mem::take(&mut self.resume_on_end) {
                    if let Err(e) = target.resume() {
                        log::warn!("could not resume after scrub: {}", e);
                    }
                }
                Some(progress)
            }
        }
    }
}
