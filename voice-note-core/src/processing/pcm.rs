//! Sample-format helpers for the capture path.

/// Fold interleaved multi-channel audio down to `target` channels.
///
/// Mono targets average every channel of a frame. Stereo targets from
/// mono input duplicate the sample; any other combination keeps the
/// first `target` channels.
pub fn remix(samples: &[f32], channels: usize, target: usize) -> Vec<f32> {
    if channels == target || channels == 0 {
        return samples.to_vec();
    }
    let frames = samples.chunks_exact(channels);
    match (channels, target) {
        (_, 1) => {
            let scale = 1.0 / channels as f32;
            frames.map(|f| f.iter().sum::<f32>() * scale).collect()
        }
        (1, 2) => samples.iter().flat_map(|&s| [s, s]).collect(),
        _ => frames.flat_map(|f| f.iter().copied().take(target)).collect(),
    }
}

/// Linear-interpolation resampler for interleaved audio.
///
/// Returns the input unchanged when the rates already match or either
/// rate is not a positive finite number.
pub fn resample_linear(samples: &[f32], channels: usize, from_rate: f64, to_rate: f64) -> Vec<f32> {
    let valid = |rate: f64| rate.is_finite() && rate > 0.0;
    if !(valid(from_rate) && valid(to_rate)) {
        return samples.to_vec();
    }
    if (from_rate - to_rate).abs() < 0.01 || samples.is_empty() || channels == 0 {
        return samples.to_vec();
    }

    let frames = samples.len() / channels;
    let ratio = to_rate / from_rate;
    let out_frames = (frames as f64 * to_rate / from_rate) as usize;

    let mut out = Vec::with_capacity(out_frames * channels);
    for i in 0..out_frames {
        let source = i as f64 / ratio;
        let index = source as usize;
        let fraction = (source - index as f64) as f32;
        for ch in 0..channels {
            let a = samples[index * channels + ch];
            let b = if index + 1 < frames {
                samples[(index + 1) * channels + ch]
            } else {
                a
            };
            out.push(a + (b - a) * fraction);
        }
    }
    out
}

/// Convert f32 samples in `[-1.0, 1.0]` to little-endian 16-bit PCM.
pub fn to_i16_le_bytes(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|s| ((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16).to_le_bytes())
        .collect()
}
