use thiserror::Error;

use super::state::SessionState;

/// Errors surfaced by session, engine and storage operations.
///
/// Only construction, preparation, `record` and `play` report errors;
/// `pause`, `stop`, ticks and seeks never fail.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    /// Capture or playback device busy, missing, or permission denied.
    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The output file could not be created or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("file unreadable: {0}")]
    FileUnreadable(String),

    #[error("malformed media: {0}")]
    MalformedMedia(String),

    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: SessionState,
        action: &'static str,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
