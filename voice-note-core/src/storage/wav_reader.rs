use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use hound::{SampleFormat, WavReader};

use crate::models::error::SessionError;

/// A WAV file fully decoded into memory.
#[derive(Debug, Clone)]
pub struct DecodedWav {
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved f32 samples.
    pub samples: Vec<f32>,
}

impl DecodedWav {
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }
}

fn malformed(path: &Path, reason: impl std::fmt::Display) -> SessionError {
    SessionError::MalformedMedia(format!("{}: {}", path.display(), reason))
}

/// Open `path` and validate its format.
///
/// A file that cannot be opened is unreadable; anything `hound` rejects,
/// or a layout other than mono/stereo, is malformed.
fn open(path: &Path) -> Result<WavReader<BufReader<File>>, SessionError> {
    let file = File::open(path).map_err(|e| SessionError::FileUnreadable(format!("{}: {}", path.display(), e)))?;
    let reader = WavReader::new(BufReader::new(file)).map_err(|e| malformed(path, e))?;

    let spec = reader.spec();
    if !(1..=2).contains(&spec.channels) {
        return Err(malformed(path, format!("unsupported channel count: {}", spec.channels)));
    }
    if spec.sample_rate == 0 {
        return Err(malformed(path, "zero sample rate"));
    }
    Ok(reader)
}

/// Read and decode the WAV file at `path`.
pub fn read_wav(path: &Path) -> Result<DecodedWav, SessionError> {
    let mut reader = open(path)?;
    let spec = reader.spec();

    let samples: Result<Vec<f32>, hound::Error> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader.samples::<f32>().collect(),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
            .collect(),
        (SampleFormat::Int, bits @ 8..=32) => {
            let max_value = ((1i64 << (bits - 1)) - 1) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_value))
                .collect()
        }
        (format, bits) => {
            return Err(malformed(path, format!("unsupported sample format {:?} at {} bits", format, bits)));
        }
    };

    let samples = samples.map_err(|e| malformed(path, e))?;
    Ok(DecodedWav {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        samples,
    })
}

/// Duration of the WAV file at `path`, from its header.
pub fn wav_duration(path: &Path) -> Result<Duration, SessionError> {
    let reader = open(path)?;
    let frames = reader.duration();
    Ok(Duration::from_secs_f64(frames as f64 / reader.spec().sample_rate as f64))
}
