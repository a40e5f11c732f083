/// Floor reported for digital silence, in dBFS.
pub const SILENCE_DB: f32 = -160.0;

/// Peak level meter with linear decay between reads.
///
/// Buffers feed [`PeakMeter::accumulate`] from the audio thread; the level
/// sampler calls [`PeakMeter::read_db`] once per frame. Each read returns
/// the running peak, which then decays so that quiet passages fall back
/// toward silence instead of holding the last loud sample forever.
#[derive(Debug, Clone)]
pub struct PeakMeter {
    peak: f32,
    decay: f32,
}

impl PeakMeter {
    /// `decay` is the fraction of the peak kept after each read, in `[0, 1]`.
    pub fn new(decay: f32) -> Self {
        Self {
            peak: 0.0,
            decay: decay.clamp(0.0, 1.0),
        }
    }

    /// Fold absolute sample values of one channel into the running peak.
    pub fn accumulate(&mut self, samples: impl IntoIterator<Item = f32>) {
        for sample in samples {
            self.peak = self.peak.max(sample.abs());
        }
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    /// Current peak in dBFS, then apply decay.
    pub fn read_db(&mut self) -> f32 {
        let db = amplitude_to_db(self.peak);
        self.peak *= self.decay;
        db
    }

    pub fn reset(&mut self) {
        self.peak = 0.0;
    }
}

impl Default for PeakMeter {
    fn default() -> Self {
        Self::new(0.5)
    }
}

/// Convert a linear amplitude (1.0 = full scale) to dBFS.
pub fn amplitude_to_db(amplitude: f32) -> f32 {
    if amplitude <= 0.0 {
        return SILENCE_DB;
    }
    (20.0 * amplitude.log10()).clamp(SILENCE_DB, 0.0)
}
