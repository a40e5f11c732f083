use std::time::Duration;

use crossbeam_channel::Sender;

use crate::models::state::SessionState;

/// Receiver of session notifications.
///
/// All methods default to no-ops so owners implement only what they show.
/// Methods are called from whichever thread drives the session, while the
/// session is borrowed; implementations must not call back into it.
pub trait SessionObserver: Send + Sync {
    /// Called after every state transition.
    fn on_state_changed(&self, _state: SessionState) {}

    /// One level reading in dBFS, once per frame while recording.
    fn on_level_sample(&self, _db: f32) {}

    /// Elapsed capture time, once per record tick.
    fn on_record_position(&self, _elapsed: Duration) {}

    /// Current playback position, once per playback tick and after seeks.
    fn on_play_position(&self, _position: Duration) {}

    fn on_recording_stopped(&self) {}

    fn on_playback_stopped(&self) {}
}

/// Session notifications as values, for channel-based consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(SessionState),
    LevelSample(f32),
    RecordPosition(Duration),
    PlayPosition(Duration),
    RecordingStopped,
    PlaybackStopped,
}

/// Observer that forwards every notification into a channel.
///
/// Send errors (receiver dropped) are ignored.
pub struct ChannelObserver {
    tx: Sender<SessionEvent>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<SessionEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }
}

impl SessionObserver for ChannelObserver {
    fn on_state_changed(&self, state: SessionState) {
        self.send(SessionEvent::StateChanged(state));
    }

    fn on_level_sample(&self, db: f32) {
        self.send(SessionEvent::LevelSample(db));
    }

    fn on_record_position(&self, elapsed: Duration) {
        self.send(SessionEvent::RecordPosition(elapsed));
    }

    fn on_play_position(&self, position: Duration) {
        self.send(SessionEvent::PlayPosition(position));
    }

    fn on_recording_stopped(&self) {
        self.send(SessionEvent::RecordingStopped);
    }

    fn on_playback_stopped(&self) {
        self.send(SessionEvent::PlaybackStopped);
    }
}
