/// Append-only sequence of sign-adjusted level samples.
///
/// Owned by the caller, fed from `SessionObserver::on_level_sample`.
/// Samples are stored negated so that silence is a large positive number
/// and louder input is smaller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelTrace {
    samples: Vec<f32>,
}

impl LevelTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one level reading given in dBFS.
    pub fn record(&mut self, db: f32) {
        self.samples.push(-db);
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

impl From<Vec<f32>> for LevelTrace {
    fn from(samples: Vec<f32>) -> Self {
        Self { samples }
    }
}
