//! Level-trace to bar-height reduction.
//!
//! Samples are sign-adjusted levels (larger = louder, 0 = full scale), so a
//! bucket close to zero draws a tall bar and a bucket at or beyond the
//! silence level draws a minimum-height bar.

use crate::models::config::WaveformStyle;

/// Number of bars that fit in `width`.
pub fn bar_count(width: f32, style: &WaveformStyle) -> usize {
    let pitch = style.bar_width + style.bar_spacing;
    if !(width.is_finite() && width > 0.0 && pitch > 0.0) {
        return 0;
    }
    (width / pitch).floor() as usize
}

/// Average `samples` into at most `bar_count` equal buckets.
///
/// With fewer samples than bars every sample becomes its own bar. Samples
/// past the last full bucket are dropped.
pub fn bucket_averages(samples: &[f32], bar_count: usize) -> Vec<f32> {
    let bars = bar_count.min(samples.len());
    if bars == 0 {
        return Vec::new();
    }
    let bucket = samples.len() / bars;
    samples
        .chunks_exact(bucket)
        .take(bars)
        .map(|chunk| chunk.iter().sum::<f32>() / bucket as f32)
        .collect()
}

/// Half-height of one bar for a bucket average.
pub fn bar_half_height(average: f32, half_height: f32, style: &WaveformStyle) -> f32 {
    let min = style.min_height;
    let span = (half_height - min).max(0.0);
    let norm = if style.silence_level > 0.0 && !average.is_nan() {
        (average / style.silence_level).clamp(0.0, 1.0)
    } else {
        1.0
    };
    (1.0 - norm) * span + min
}

/// Reduce `samples` to full bar heights for a view `view_height` tall.
///
/// Returns `min(bar_count, samples.len())` heights, each in
/// `[2 * min_height, max(view_height, 2 * min_height)]`.
pub fn reduce(samples: &[f32], bar_count: usize, view_height: f32, style: &WaveformStyle) -> Vec<f32> {
    let half_height = view_height.max(0.0) / 2.0;
    bucket_averages(samples, bar_count)
        .into_iter()
        .map(|average| 2.0 * bar_half_height(average, half_height, style))
        .collect()
}
