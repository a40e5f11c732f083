use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A finished recording handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceNote {
    pub id: String,
    pub path: PathBuf,
    /// Whole seconds of the trimmed media duration.
    pub duration_secs: u64,
    /// Sign-adjusted level samples in capture order.
    pub peaks: Vec<f32>,
    /// SHA-256 of the output file, empty if the engine does not compute one.
    pub checksum: String,
    pub created_at: String,
}

impl VoiceNote {
    pub fn new(path: PathBuf, duration: Duration, peaks: Vec<f32>, checksum: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            path,
            duration_secs: duration.as_secs(),
            peaks,
            checksum,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Format a duration as `m:ss`, truncating fractional seconds.
pub fn clock_label(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}
