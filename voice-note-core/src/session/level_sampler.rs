use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::levels::LevelTrace;
use crate::traits::engine::CaptureEngine;

/// Per-frame level sampling while capture is active.
///
/// Each tick reads the running peak of one channel from the capture engine
/// and, when a trace is attached, appends the sign-adjusted value to it.
#[derive(Debug)]
pub struct LevelSampler {
    channel: usize,
    trace: Option<Arc<Mutex<LevelTrace>>>,
    ticks: u64,
}

impl LevelSampler {
    pub fn new(channel: usize, trace: Option<Arc<Mutex<LevelTrace>>>) -> Self {
        Self {
            channel,
            trace,
            ticks: 0,
        }
    }

    /// Sample `engine` once and return the level in dBFS.
    pub fn tick<C: CaptureEngine + ?Sized>(&mut self, engine: &mut C) -> f32 {
        let db = engine.peak_power(self.channel);
        if let Some(trace) = &self.trace {
            trace.lock().record(db);
        }
        self.ticks += 1;
        db
    }

    /// Number of samples taken since the sampler started.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
